use core::fmt::Debug;
use enumset::EnumSet;
use crate::attribute_table::AttributeTable;
use crate::descriptors::{AttributeHandle, GattCharacteristicPermission};
use crate::gatt_connection::{GattConnection, Notifier};

/// Attribute dispatch runtime that a service plugs into.  The runtime owns the link layer,
/// assigns attribute handles, serves declarations straight out of the registered
/// [AttributeTable] and forwards reads and writes of dynamic attributes to the service through
/// [crate::prelude::GattServerCallback].
///
/// Events are expected to be delivered one at a time, each running to completion before the
/// next one is dispatched.
pub trait Peripheral {
  type SystemError: Debug;

  type Connection: GattConnection + Debug;
  type Notifier: Notifier + Debug;

  /// Maximum number of concurrent connections the link layer supports.  Per-connection state
  /// is sized from this at registration time.
  fn max_connections(&self) -> usize;

  /// Register the attribute table.  On success the runtime hands back the notification
  /// transport and the first of the contiguous handles it assigned to `attributes`.
  fn register_service(
    &mut self,
    attributes: &AttributeTable,
  ) -> Result<Registration<Self::Notifier>, Self::SystemError>;

  /// Withdraw a table previously registered at `first_handle`.  Used when the handles handed
  /// back cannot hold the whole table, so the runtime never keeps a table no service answers.
  fn unregister_service(&mut self, first_handle: AttributeHandle) -> Result<(), Self::SystemError>;

  /// Authorization predicate consulted before a write is applied.  Returns true when the write
  /// must be refused because authorization is required and has not been granted.
  fn requires_authorized_write(permissions: EnumSet<GattCharacteristicPermission>) -> bool {
    GattCharacteristicPermission::requires_authorized_write(permissions)
  }
}

#[derive(Debug)]
pub struct Registration<N> {
  pub notifier: N,
  pub first_handle: AttributeHandle,
}
