//! In-memory runtime used by the unit tests.

extern crate std;

use alloc::vec::Vec;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::att_error::AttError;
use crate::attribute_table::AttributeTable;
use crate::descriptors::AttributeHandle;
use crate::gatt_connection::{ConnectionHandle, GattConnection, GattResponder, Notifier, Response};
use crate::peripheral::{Peripheral, Registration};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NotifyError {
  Congested,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SystemError {
  Rejected,
  ResponderGone,
}

pub type Sent = (ConnectionHandle, AttributeHandle, Vec<u8>);

#[derive(Debug, Default)]
struct Links {
  authenticated: BTreeSet<ConnectionHandle>,
  congested: BTreeSet<ConnectionHandle>,
  sent: Vec<Sent>,
}

/// Notification transport that records what it was asked to send.  Clones share the record,
/// and the whole thing is `Send` like a real transport handle.
#[derive(Debug, Default, Clone)]
pub struct MockNotifier {
  links: Arc<Mutex<Links>>,
}

impl MockNotifier {
  fn links(&self) -> MutexGuard<'_, Links> {
    self.links.lock().unwrap()
  }

  pub fn authenticate(&self, connection: ConnectionHandle) {
    self.links().authenticated.insert(connection);
  }

  pub fn congest(&self, connection: ConnectionHandle) {
    self.links().congested.insert(connection);
  }

  pub fn sent(&self) -> Vec<Sent> {
    self.links().sent.clone()
  }
}

impl Notifier for MockNotifier {
  type SystemError = NotifyError;

  fn notify(
    &mut self,
    connection: ConnectionHandle,
    handle: AttributeHandle,
    value: &[u8],
  ) -> Result<(), Self::SystemError> {
    let mut links = self.links();
    if links.congested.contains(&connection) {
      return Err(NotifyError::Congested);
    }
    links.sent.push((connection, handle, value.to_vec()));
    Ok(())
  }

  fn is_authenticated(&self, connection: ConnectionHandle) -> bool {
    self.links().authenticated.contains(&connection)
  }
}

#[derive(Debug)]
pub struct MockPeripheral {
  pub max_connections: usize,
  pub first_handle: u16,
  pub reject: bool,
  pub notifier: MockNotifier,

  /// First handle and size of every table currently registered.
  pub registered: Vec<(AttributeHandle, usize)>,
}

impl Default for MockPeripheral {
  fn default() -> Self {
    Self {
      max_connections: 4,
      first_handle: 0x20,
      reject: false,
      notifier: MockNotifier::default(),
      registered: Vec::new(),
    }
  }
}

impl Peripheral for MockPeripheral {
  type SystemError = SystemError;
  type Connection = MockConnection;
  type Notifier = MockNotifier;

  fn max_connections(&self) -> usize {
    self.max_connections
  }

  fn register_service(
    &mut self,
    attributes: &AttributeTable,
  ) -> Result<Registration<Self::Notifier>, Self::SystemError> {
    if self.reject {
      return Err(SystemError::Rejected);
    }
    let first_handle = AttributeHandle::new(self.first_handle).ok_or(SystemError::Rejected)?;
    self.registered.push((first_handle, attributes.len()));
    Ok(Registration { notifier: self.notifier.clone(), first_handle })
  }

  fn unregister_service(&mut self, first_handle: AttributeHandle) -> Result<(), Self::SystemError> {
    let index = self
      .registered
      .iter()
      .position(|(handle, _)| *handle == first_handle)
      .ok_or(SystemError::Rejected)?;
    self.registered.remove(index);
    Ok(())
  }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MockConnection(pub ConnectionHandle);

impl GattConnection for MockConnection {
  type Responder = MockResponder;

  fn handle(&self) -> ConnectionHandle {
    self.0
  }
}

/// Captures the response the service sent.
#[derive(Debug, Default)]
pub struct MockResponder {
  pub gone: bool,
  pub response: Option<Result<Vec<u8>, AttError>>,
}

impl GattResponder for MockResponder {
  type SystemError = SystemError;

  fn respond(&mut self, response: Result<Response<'_>, AttError>) -> Result<(), Self::SystemError> {
    if self.gone {
      return Err(SystemError::ResponderGone);
    }
    self.response = Some(response.map(|r| r.value.to_vec()));
    Ok(())
  }
}
