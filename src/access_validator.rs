use enumset::EnumSet;
use log::trace;

use crate::att_error::AttError;
use crate::attribute_table::AttributeTable;
use crate::descriptors::{AttributeHandle, GattCharacteristicPermission, UUID};
use crate::gatt_connection::ConnectionHandle;
use crate::subscription_table::{SubscriptionTable, CCCD_LEN};
use crate::value_store::ValueStore;

/// Bytes returned for a read of a dynamic attribute.
pub type ReadValue = heapless::Vec<u8, CCCD_LEN>;

/// Authorization predicate supplied by the runtime.
pub type AuthorizationPredicate = fn(EnumSet<GattCharacteristicPermission>) -> bool;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
  /// The value attribute was written; `changed` is set when the logical value flipped.
  Stored { changed: bool },

  /// A connection updated its notification configuration.
  Configured,
}

/// Attributes the read and write callbacks answer for, identified by UUID alias.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Target {
  Value,
  ClientConfig,
  Other,
}

/// Checks remote accesses against offset, length and authorization rules before anything is
/// read from or written to the value store or the subscription table.
#[derive(Debug)]
pub struct AccessValidator<'a, const N: usize> {
  pub attributes: &'a AttributeTable,
  pub value_uuid: UUID,
  pub store: &'a mut ValueStore,
  pub subscriptions: &'a mut SubscriptionTable<N>,
}

impl<'a, const N: usize> AccessValidator<'a, N> {
  fn target(&self, uuid: UUID) -> Target {
    match uuid.alias() {
      alias if alias == self.value_uuid.alias() => Target::Value,
      alias if alias == UUID::CLIENT_CHARACTERISTIC_CONFIGURATION.alias() => Target::ClientConfig,
      _ => Target::Other,
    }
  }

  pub fn read(
    &self,
    connection: ConnectionHandle,
    handle: AttributeHandle,
    offset: u16,
    max_len: u16,
  ) -> Result<ReadValue, AttError> {
    // No attribute of this service is long.
    if offset > 0 {
      return Err(AttError::NotLong);
    }
    let attribute = self.attributes.find(handle).ok_or(AttError::InvalidHandle)?;

    let mut value = match self.target(attribute.uuid) {
      Target::Value => ReadValue::from_slice(&[self.store.get()]),
      Target::ClientConfig => ReadValue::from_slice(&self.subscriptions.read(connection)),
      Target::Other => return Err(AttError::AttributeNotFound),
    }
    .map_err(|_| AttError::Unlikely)?;
    value.truncate(max_len.into());
    trace!("read handle={handle} from {connection}: {value:?}");
    Ok(value)
  }

  pub fn write(
    &mut self,
    connection: ConnectionHandle,
    handle: AttributeHandle,
    offset: u16,
    value: &[u8],
    requires_authorized_write: AuthorizationPredicate,
  ) -> Result<WriteOutcome, AttError> {
    let attribute = self.attributes.find(handle).ok_or(AttError::InvalidHandle)?;
    let authorization_required = requires_authorized_write(attribute.permissions);

    let target = self.target(attribute.uuid);
    if target == Target::ClientConfig {
      self
        .subscriptions
        .write(connection, value, offset, authorization_required)?;
      return Ok(WriteOutcome::Configured);
    }

    if authorization_required {
      return Err(AttError::InsufficientAuthorization);
    }
    if offset > 0 {
      return Err(AttError::NotLong);
    }
    match target {
      Target::Value => {
        let &[raw] = value else {
          return Err(AttError::InvalidValueSize);
        };
        let changed = self.store.set(raw);
        trace!("write handle={handle} from {connection}: {raw:#04x} changed={changed}");
        Ok(WriteOutcome::Stored { changed })
      }
      Target::ClientConfig | Target::Other => Err(AttError::AttributeNotFound),
    }
  }
}
