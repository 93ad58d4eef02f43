use alloc::boxed::Box;
use core::fmt::{Debug, Formatter};

use enumset::enum_set;
use log::{debug, error, info, trace, warn};

use crate::access_validator::{AccessValidator, ReadValue, WriteOutcome};
use crate::att_error::AttError;
use crate::attribute_table::AttributeTable;
use crate::config::RelayServiceConfig;
use crate::descriptors::{
  AttributeHandle, GattCharacteristic, GattCharacteristicProperty, GattDescriptor, GattService,
  UUID,
};
use crate::gatt_connection::{ConnectionHandle, GattConnection, GattResponder, Notifier, Response};
use crate::gatt_server_cb::{GattServerCallback, GattServerEvent};
use crate::notification_dispatcher::{DeliveryObserver, DispatchReport, NotificationDispatcher};
use crate::peripheral::{Peripheral, Registration};
use crate::service_error::ServiceError;
use crate::subscription_table::{SubscriptionTable, DEFAULT_MAX_CONNECTIONS};
use crate::value_store::ValueStore;

pub const RELAY_SERVICE_UUID: UUID = UUID::vendor(0x2F00);
pub const RELAY_STATE_UUID: UUID = UUID::vendor(0x2F01);
pub const RELAY_STATE_DESCRIPTION: &str = "Relay State";

static RELAY_STATE_DESCRIPTORS: [GattDescriptor; 1] =
  [GattDescriptor::user_description(RELAY_STATE_DESCRIPTION)];

/// Parameters reachable through [RelayService::set_parameter] and
/// [RelayService::get_parameter].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum RelayParam {
  /// Relay state, one byte.
  State = 0x00,
}

impl TryFrom<u8> for RelayParam {
  type Error = u8;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0x00 => Ok(RelayParam::State),
      other => Err(other),
    }
  }
}

/// Application hook invoked once for every distinct state change written by a peer.
pub trait StateChangeListener {
  fn on_state_change(&mut self);
}

impl<F: FnMut()> StateChangeListener for F {
  fn on_state_change(&mut self) {
    (self)()
  }
}

type NotifyError<P> = <<P as Peripheral>::Notifier as Notifier>::SystemError;

/// The relay state service.  Created by [RelayService::add_service] and driven by the runtime
/// through [GattServerCallback] or the [RelayService::read] / [RelayService::write] entry
/// points.
///
/// All mutation goes through `&mut self`, so the compare-and-set of a write and the
/// notifications it triggers form one indivisible step.  A host that shares the service
/// between threads must hold it behind a single lock.
pub struct RelayService<P: Peripheral, const N: usize = DEFAULT_MAX_CONNECTIONS> {
  config: RelayServiceConfig,
  attributes: AttributeTable,
  store: ValueStore,
  subscriptions: SubscriptionTable<N>,
  dispatcher: NotificationDispatcher<P::Notifier>,
  listener: Option<Box<dyn StateChangeListener + Send>>,
}

impl<P: Peripheral, const N: usize> RelayService<P, N> {
  /// Build the attribute table and register it with `peripheral`.  Subscription storage for
  /// every connection the runtime supports is obtained first; if that fails nothing is
  /// registered.  A registration whose handles cannot hold the table is withdrawn again.
  pub fn add_service(
    peripheral: &mut P,
    config: RelayServiceConfig,
  ) -> Result<Self, ServiceError<P::SystemError>> {
    let capacity = peripheral.max_connections();
    let subscriptions = SubscriptionTable::try_new(capacity).map_err(|e| {
      error!("Cannot allocate subscriptions: {e}");
      ServiceError::MemoryAllocation(e)
    })?;

    let characteristics = [GattCharacteristic {
      uuid: RELAY_STATE_UUID,
      properties: enum_set!(
        GattCharacteristicProperty::Read
          | GattCharacteristicProperty::Write
          | GattCharacteristicProperty::Notify
      ),
      permissions: config.value_permissions(),
      descriptors: &RELAY_STATE_DESCRIPTORS,
    }];
    let service = GattService {
      uuid: RELAY_SERVICE_UUID,
      characteristics: &characteristics,
      ..Default::default()
    };
    let mut attributes = AttributeTable::build(&service)?;

    let Registration { notifier, first_handle } =
      peripheral.register_service(&attributes).map_err(|e| {
        error!("Registration rejected: {e:?}");
        ServiceError::Registration(e)
      })?;
    if let Err(e) = attributes.bind(first_handle) {
      error!("Assigned handles cannot hold the table: first_handle={first_handle}: {e}");
      if let Err(e) = peripheral.unregister_service(first_handle) {
        warn!("Failed to withdraw registration at {first_handle}: {e:?}");
      }
      return Err(e.into());
    }
    info!(
      "Relay service registered: first_handle={first_handle}, attributes={}, subscription_slots={capacity}",
      attributes.len()
    );

    Ok(Self {
      store: ValueStore::new(config.initial_state),
      dispatcher: NotificationDispatcher::new(notifier, config.authenticated),
      attributes,
      subscriptions,
      listener: None,
      config,
    })
  }

  pub fn config(&self) -> &RelayServiceConfig {
    &self.config
  }

  pub fn attributes(&self) -> &AttributeTable {
    &self.attributes
  }

  /// Handle of the relay state value attribute.
  pub fn value_handle(&self) -> Option<AttributeHandle> {
    self.attributes.handle_of(RELAY_STATE_UUID)
  }

  /// Handle of the client characteristic configuration of the relay state.
  pub fn cccd_handle(&self) -> Option<AttributeHandle> {
    self.attributes.handle_of(UUID::CLIENT_CHARACTERISTIC_CONFIGURATION)
  }

  pub fn state(&self) -> bool {
    self.store.state()
  }

  pub fn is_subscribed(&self, connection: ConnectionHandle) -> bool {
    self.subscriptions.is_subscribed(connection)
  }

  /// Install the hook called after each distinct state change caused by a peer write.  Local
  /// [RelayService::set_parameter] calls do not trigger it.
  pub fn set_state_change_callback(&mut self, listener: impl StateChangeListener + Send + 'static) {
    self.listener = Some(Box::new(listener));
  }

  /// Install the hook told about notifications the transport failed to deliver.
  pub fn set_delivery_observer(
    &mut self,
    observer: impl DeliveryObserver<NotifyError<P>> + Send + 'static,
  ) {
    self.dispatcher.set_observer(observer);
  }

  pub fn set_parameter(&mut self, param: u8, value: &[u8]) -> Result<(), ServiceError<P::SystemError>> {
    match RelayParam::try_from(param).map_err(ServiceError::InvalidParameter)? {
      RelayParam::State => {
        let &[raw] = value else {
          return Err(ServiceError::InvalidRange { expected: 1, actual: value.len() });
        };
        if self.store.set(raw) {
          debug!("Relay state set locally: {}", self.store.state());
          self.notify_subscribers();
        }
        Ok(())
      }
    }
  }

  pub fn get_parameter(&self, param: u8) -> Result<u8, ServiceError<P::SystemError>> {
    match RelayParam::try_from(param).map_err(ServiceError::InvalidParameter)? {
      RelayParam::State => Ok(self.store.get()),
    }
  }

  fn validator(&mut self) -> AccessValidator<'_, N> {
    AccessValidator {
      attributes: &self.attributes,
      value_uuid: RELAY_STATE_UUID,
      store: &mut self.store,
      subscriptions: &mut self.subscriptions,
    }
  }

  /// Read callback for the dynamic attributes of the table.
  pub fn read(
    &mut self,
    connection: ConnectionHandle,
    handle: AttributeHandle,
    offset: u16,
    max_len: u16,
  ) -> Result<ReadValue, AttError> {
    self.validator().read(connection, handle, offset, max_len)
  }

  /// Write callback for the dynamic attributes of the table.  Succeeds regardless of whether
  /// the resulting notifications could be delivered.
  pub fn write(
    &mut self,
    connection: ConnectionHandle,
    handle: AttributeHandle,
    offset: u16,
    value: &[u8],
  ) -> Result<(), AttError> {
    let outcome = self
      .validator()
      .write(connection, handle, offset, value, P::requires_authorized_write)?;

    if outcome == (WriteOutcome::Stored { changed: true }) {
      info!("Relay state changed by {connection}: {}", self.store.state());
      if let Some(listener) = self.listener.as_mut() {
        listener.on_state_change();
      }
      self.notify_subscribers();
    }
    Ok(())
  }

  fn notify_subscribers(&mut self) -> DispatchReport {
    let Some(handle) = self.value_handle() else {
      error!("Relay state attribute has no handle");
      return DispatchReport::default();
    };
    let value = [self.store.get()];
    self.dispatcher.broadcast(&self.subscriptions, handle, &value)
  }
}

impl<P: Peripheral, const N: usize> GattServerCallback<P> for RelayService<P, N> {
  fn on_event(&mut self, event: GattServerEvent<'_, P>) {
    trace!("event: {event:?}");
    match event {
      GattServerEvent::Connected { connection } => {
        info!("Accepted incoming connection: {}", connection.handle());
      }
      GattServerEvent::Disconnected { connection } => {
        let connection = connection.handle();
        info!("Disconnection from {connection}");
        self.subscriptions.release(connection);
      }
      GattServerEvent::ReadRequest { connection, handle, offset, max_len, responder } => {
        let result = self.read(connection.handle(), handle, offset, max_len);
        let response = match &result {
          Ok(value) => Ok(Response::complete(value)),
          Err(e) => {
            debug!("Read refused: handle={handle}: {e}");
            Err(*e)
          }
        };
        if let Err(e) = responder.respond(response) {
          error!("Responder failed: {e:?}");
        }
      }
      GattServerEvent::WriteRequest { connection, handle, responder, offset, value } => {
        let result = self.write(connection.handle(), handle, offset, value);
        match responder {
          Some(responder) => {
            if let Err(e) = responder.respond(result.map(|()| Response::complete(&[]))) {
              error!("Responder failed: {e:?}");
            }
          }
          None => {
            if let Err(e) = result {
              warn!("Dropped write command: handle={handle}: {e}");
            }
          }
        }
      }
    }
  }
}

impl<P: Peripheral, const N: usize> Debug for RelayService<P, N> {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RelayService")
      .field("config", &self.config)
      .field("attributes", &self.attributes)
      .field("store", &self.store)
      .field("subscriptions", &self.subscriptions)
      .field("dispatcher", &self.dispatcher)
      .field("has_listener", &self.listener.is_some())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  extern crate std;

  use core::sync::atomic::{AtomicU32, Ordering};
  use std::sync::{Arc, Mutex};
  use std::vec::Vec;

  use super::*;
  use crate::attribute_table::TableError;
  use crate::descriptors::GattCharacteristicPermission;
  use crate::subscription_table::CapacityError;
  use crate::testing::{MockConnection, MockPeripheral, MockResponder, NotifyError, SystemError};

  type Service = RelayService<MockPeripheral>;

  const A: ConnectionHandle = ConnectionHandle(0x0001);
  const B: ConnectionHandle = ConnectionHandle(0x0002);
  const ENABLE: [u8; 2] = [0x01, 0x00];
  const STATE: u8 = RelayParam::State as u8;

  fn plain() -> RelayServiceConfig {
    RelayServiceConfig { authenticated: false, ..Default::default() }
  }

  fn started(config: RelayServiceConfig) -> (MockPeripheral, Service) {
    let mut peripheral = MockPeripheral::default();
    let service = Service::add_service(&mut peripheral, config).unwrap();
    (peripheral, service)
  }

  #[derive(Clone, Default)]
  struct Calls(Arc<AtomicU32>);

  impl Calls {
    fn get(&self) -> u32 {
      self.0.load(Ordering::SeqCst)
    }
  }

  fn counting_listener(service: &mut Service) -> Calls {
    let calls = Calls::default();
    let counter = calls.clone();
    service.set_state_change_callback(move || {
      counter.0.fetch_add(1, Ordering::SeqCst);
    });
    calls
  }

  fn assert_send<T: Send>() {}

  fn subscribe(service: &mut Service, connection: ConnectionHandle) {
    let cccd = service.cccd_handle().unwrap();
    service.write(connection, cccd, 0, &ENABLE).unwrap();
  }

  #[test]
  pub fn test_registered_layout() {
    let (peripheral, service) = started(plain());
    let first = AttributeHandle::new(0x20).unwrap();
    assert_eq!(peripheral.registered, [(first, 5)]);

    let attributes = service.attributes();
    assert_eq!(service.value_handle(), AttributeHandle::new(0x22));
    assert_eq!(service.cccd_handle(), AttributeHandle::new(0x23));
    assert_eq!(
      &*attributes.static_value(AttributeHandle::new(0x24).unwrap()).unwrap(),
      b"Relay State"
    );
    let declaration = attributes.static_value(AttributeHandle::new(0x21).unwrap()).unwrap();
    assert_eq!(declaration[..3], [0x1A, 0x22, 0x00]);
    assert_eq!(attributes.find(first).unwrap().uuid, UUID::PRIMARY_SERVICE);
  }

  #[test]
  pub fn test_value_permissions_follow_config() {
    let (_, service) = started(RelayServiceConfig { authenticated: true, ..Default::default() });
    let value = service.attributes().find(service.value_handle().unwrap()).unwrap();
    assert_eq!(
      value.permissions,
      GattCharacteristicPermission::ReadAuthenticated | GattCharacteristicPermission::WriteAuthenticated
    );
  }

  #[test]
  pub fn test_allocation_failure_registers_nothing() {
    let mut peripheral = MockPeripheral { max_connections: DEFAULT_MAX_CONNECTIONS + 1, ..Default::default() };
    let result = Service::add_service(&mut peripheral, plain());
    assert_eq!(
      result.err(),
      Some(ServiceError::MemoryAllocation(CapacityError {
        requested: DEFAULT_MAX_CONNECTIONS + 1,
        available: DEFAULT_MAX_CONNECTIONS,
      }))
    );
    assert!(peripheral.registered.is_empty());
  }

  #[test]
  pub fn test_registration_status_propagated() {
    let mut peripheral = MockPeripheral { reject: true, ..Default::default() };
    let result = Service::add_service(&mut peripheral, plain());
    assert_eq!(result.err(), Some(ServiceError::Registration(SystemError::Rejected)));
  }

  #[test]
  pub fn test_handle_space_exhausted() {
    let mut peripheral = MockPeripheral { first_handle: 0xFFFD, ..Default::default() };
    let result = Service::add_service(&mut peripheral, plain());
    assert_eq!(result.err(), Some(ServiceError::AttributeTable(TableError::HandleOverflow)));
    assert!(peripheral.registered.is_empty());
  }

  #[test]
  pub fn test_service_is_send() {
    assert_send::<MockPeripheral>();
    assert_send::<Service>();
    assert_send::<std::sync::Mutex<Service>>();
  }

  #[test]
  pub fn test_custom_config() {
    let config = RelayServiceConfig {
      authenticated: false,
      authorized_writes: true,
      initial_state: true,
      ..Default::default()
    };
    let (_, service) = started(config.clone());
    assert_eq!(service.config(), &config);
    assert!(service.state());
  }

  #[test]
  pub fn test_remote_write_scenario() {
    let (peripheral, mut service) = started(plain());
    let calls = counting_listener(&mut service);
    let value = service.value_handle().unwrap();
    subscribe(&mut service, A);

    service.write(B, value, 0, &[0x05]).unwrap();
    assert_eq!(service.get_parameter(STATE), Ok(1));
    assert_eq!(calls.get(), 1);
    assert_eq!(peripheral.notifier.sent(), [(A, value, Vec::from([0x01]))]);

    service.write(B, value, 0, &[0x01]).unwrap();
    assert_eq!(service.get_parameter(STATE), Ok(1));
    assert_eq!(calls.get(), 1);
    assert_eq!(peripheral.notifier.sent().len(), 1);
  }

  #[test]
  pub fn test_subscribing_sends_nothing() {
    let (peripheral, mut service) = started(plain());
    let calls = counting_listener(&mut service);
    subscribe(&mut service, A);
    assert!(service.is_subscribed(A));
    assert_eq!(calls.get(), 0);
    assert!(peripheral.notifier.sent().is_empty());
  }

  #[test]
  pub fn test_unsubscribed_connection_not_notified() {
    let (peripheral, mut service) = started(plain());
    let value = service.value_handle().unwrap();

    service.write(A, value, 0, &[0x01]).unwrap();
    assert!(peripheral.notifier.sent().is_empty());

    subscribe(&mut service, A);
    service.write(A, value, 0, &[0x00]).unwrap();
    assert_eq!(peripheral.notifier.sent(), [(A, value, Vec::from([0x00]))]);
  }

  #[test]
  pub fn test_rejected_write_changes_nothing() {
    let (peripheral, mut service) = started(plain());
    let calls = counting_listener(&mut service);
    let value = service.value_handle().unwrap();
    subscribe(&mut service, A);

    assert_eq!(service.write(A, value, 0, &[0x01, 0x00]), Err(AttError::InvalidValueSize));
    assert_eq!(service.write(A, value, 1, &[0x01]), Err(AttError::NotLong));
    assert_eq!(service.get_parameter(STATE), Ok(0));
    assert_eq!(calls.get(), 0);
    assert!(peripheral.notifier.sent().is_empty());
  }

  #[test]
  pub fn test_authorized_writes_refused() {
    let (_, mut service) = started(RelayServiceConfig { authorized_writes: true, ..plain() });
    let value = service.value_handle().unwrap();
    assert_eq!(service.write(A, value, 0, &[0x01]), Err(AttError::InsufficientAuthorization));
    assert!(!service.state());
  }

  #[test]
  pub fn test_delivery_failure_does_not_fail_write() {
    let (peripheral, mut service) = started(plain());
    let failures = Arc::new(Mutex::new(Vec::new()));
    let seen = failures.clone();
    service.set_delivery_observer(move |connection: ConnectionHandle, error: &NotifyError| {
      seen.lock().unwrap().push((connection, *error));
    });
    let calls = counting_listener(&mut service);
    subscribe(&mut service, A);
    subscribe(&mut service, B);
    peripheral.notifier.congest(A);

    let value = service.value_handle().unwrap();
    assert_eq!(service.write(B, value, 0, &[0x01]), Ok(()));
    assert_eq!(calls.get(), 1);
    assert_eq!(*failures.lock().unwrap(), [(A, NotifyError::Congested)]);
    assert_eq!(peripheral.notifier.sent(), [(B, value, Vec::from([0x01]))]);
  }

  #[test]
  pub fn test_authenticated_notifications() {
    let (peripheral, mut service) = started(RelayServiceConfig { authenticated: true, ..plain() });
    subscribe(&mut service, A);
    subscribe(&mut service, B);
    peripheral.notifier.authenticate(B);

    service.set_parameter(STATE, &[0x01]).unwrap();
    let sent = peripheral.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, B);
  }

  #[test]
  pub fn test_set_parameter_round_trip() {
    let (_, mut service) = started(plain());
    for raw in [0x00, 0x01, 0x02, 0x7F, 0xFF, 0x00] {
      service.set_parameter(STATE, &[raw]).unwrap();
      assert_eq!(service.get_parameter(STATE), Ok(u8::from(raw != 0)));
    }
  }

  #[test]
  pub fn test_set_parameter_notifies_without_callback() {
    let (peripheral, mut service) = started(plain());
    let calls = counting_listener(&mut service);
    subscribe(&mut service, A);

    service.set_parameter(STATE, &[0x01]).unwrap();
    service.set_parameter(STATE, &[0x09]).unwrap();
    assert_eq!(calls.get(), 0);
    assert_eq!(peripheral.notifier.sent().len(), 1);
  }

  #[test]
  pub fn test_parameter_misuse() {
    let (_, mut service) = started(plain());
    assert_eq!(service.set_parameter(0x07, &[0x01]), Err(ServiceError::InvalidParameter(0x07)));
    assert_eq!(service.get_parameter(0x07), Err(ServiceError::InvalidParameter(0x07)));
    assert_eq!(
      service.set_parameter(STATE, &[0x01, 0x00]),
      Err(ServiceError::InvalidRange { expected: 1, actual: 2 })
    );
    assert_eq!(
      service.set_parameter(STATE, &[]),
      Err(ServiceError::InvalidRange { expected: 1, actual: 0 })
    );
    assert_eq!(service.get_parameter(STATE), Ok(0));
  }

  #[test]
  pub fn test_initial_state() {
    let (_, service) = started(RelayServiceConfig { initial_state: true, ..plain() });
    assert_eq!(service.get_parameter(STATE), Ok(1));
  }

  #[test]
  pub fn test_read_event() {
    let (_, mut service) = started(plain());
    let value = service.value_handle().unwrap();
    service.set_parameter(STATE, &[0x80]).unwrap();

    let mut responder = MockResponder::default();
    service.on_event(GattServerEvent::ReadRequest {
      connection: &MockConnection(A),
      handle: value,
      offset: 0,
      max_len: 22,
      responder: &mut responder,
    });
    assert_eq!(responder.response, Some(Ok(Vec::from([0x01]))));

    let mut responder = MockResponder::default();
    service.on_event(GattServerEvent::ReadRequest {
      connection: &MockConnection(A),
      handle: value,
      offset: 1,
      max_len: 22,
      responder: &mut responder,
    });
    assert_eq!(responder.response, Some(Err(AttError::NotLong)));
  }

  #[test]
  pub fn test_write_event() {
    let (_, mut service) = started(plain());
    let calls = counting_listener(&mut service);
    let value = service.value_handle().unwrap();

    let mut responder = MockResponder::default();
    service.on_event(GattServerEvent::WriteRequest {
      connection: &MockConnection(A),
      handle: value,
      responder: Some(&mut responder),
      offset: 0,
      value: &[0x01],
    });
    assert_eq!(responder.response, Some(Ok(Vec::new())));
    assert_eq!(calls.get(), 1);

    service.on_event(GattServerEvent::WriteRequest {
      connection: &MockConnection(A),
      handle: value,
      responder: None,
      offset: 0,
      value: &[0x00],
    });
    assert_eq!(calls.get(), 2);
    assert!(!service.state());
  }

  #[test]
  pub fn test_failed_responder_keeps_write() {
    let (_, mut service) = started(plain());
    let value = service.value_handle().unwrap();
    let mut responder = MockResponder { gone: true, ..Default::default() };
    service.on_event(GattServerEvent::WriteRequest {
      connection: &MockConnection(A),
      handle: value,
      responder: Some(&mut responder),
      offset: 0,
      value: &[0x01],
    });
    assert!(service.state());
  }

  #[test]
  pub fn test_disconnect_releases_subscription() {
    let (peripheral, mut service) = started(plain());
    subscribe(&mut service, A);
    service.on_event(GattServerEvent::Connected { connection: &MockConnection(B) });
    service.on_event(GattServerEvent::Disconnected { connection: &MockConnection(A) });
    assert!(!service.is_subscribed(A));

    service.set_parameter(STATE, &[0x01]).unwrap();
    assert!(peripheral.notifier.sent().is_empty());

    let cccd = service.cccd_handle().unwrap();
    assert_eq!(service.read(A, cccd, 0, 22).unwrap(), [0x00, 0x00]);
  }
}
