use log::{debug, warn};

use crate::att_error::AttError;
use crate::gatt_connection::ConnectionHandle;

/// Slot count of the subscription pool when the service does not choose one.
pub const DEFAULT_MAX_CONNECTIONS: usize = 8;

/// Client characteristic configuration bits ([Vol 3] Part G, Section 3.3.3.3).
const CCCD_NOTIFY: u16 = 0x0001;

/// Wire size of a client characteristic configuration value.
pub const CCCD_LEN: usize = 2;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct SubscriptionEntry {
  pub connection: Option<ConnectionHandle>,
  pub subscribed: bool,
}

impl SubscriptionEntry {
  fn is_free(&self) -> bool {
    self.connection.is_none()
  }
}

/// The pool cannot hold as many slots as the runtime supports connections.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{requested} subscription slots requested, {available} available")]
pub struct CapacityError {
  pub requested: usize,
  pub available: usize,
}

/// Per-connection notification subscriptions for the value attribute, backed by a fixed pool of
/// `N` slots of which `capacity` are in use.
#[derive(Debug, Clone)]
pub struct SubscriptionTable<const N: usize = DEFAULT_MAX_CONNECTIONS> {
  entries: heapless::Vec<SubscriptionEntry, N>,
}

impl<const N: usize> SubscriptionTable<N> {
  /// Allocate `capacity` slots, all unsubscribed with no connection.
  pub fn try_new(capacity: usize) -> Result<Self, CapacityError> {
    if capacity > N {
      return Err(CapacityError { requested: capacity, available: N });
    }
    let mut entries = heapless::Vec::new();
    entries
      .resize_default(capacity)
      .map_err(|_| CapacityError { requested: capacity, available: N })?;
    Ok(Self { entries })
  }

  pub fn capacity(&self) -> usize {
    self.entries.len()
  }

  fn entry(&self, connection: ConnectionHandle) -> Option<&SubscriptionEntry> {
    self.entries.iter().find(|e| e.connection == Some(connection))
  }

  pub fn is_subscribed(&self, connection: ConnectionHandle) -> bool {
    self.entry(connection).map_or(false, |e| e.subscribed)
  }

  /// Connections currently subscribed.
  pub fn subscribers(&self) -> impl Iterator<Item = ConnectionHandle> + '_ {
    self
      .entries
      .iter()
      .filter(|e| e.subscribed)
      .filter_map(|e| e.connection)
  }

  /// Raw configuration value for `connection`; connections without a slot read as not
  /// subscribed.
  pub fn read(&self, connection: ConnectionHandle) -> [u8; CCCD_LEN] {
    let value = if self.is_subscribed(connection) { CCCD_NOTIFY } else { 0 };
    value.to_le_bytes()
  }

  /// Apply a configuration write from `connection`.  Subscribing claims a free slot if the
  /// connection does not hold one yet.  No notification is sent as a result.
  pub fn write(
    &mut self,
    connection: ConnectionHandle,
    value: &[u8],
    offset: u16,
    authorization_required: bool,
  ) -> Result<(), AttError> {
    if authorization_required {
      return Err(AttError::InsufficientAuthorization);
    }
    if offset > 0 {
      return Err(AttError::NotLong);
    }
    let raw: [u8; CCCD_LEN] = value.try_into().map_err(|_| AttError::InvalidValueSize)?;
    let subscribe = match u16::from_le_bytes(raw) {
      0 => false,
      CCCD_NOTIFY => true,
      other => {
        debug!("Rejecting configuration {other:#06x} from {connection}");
        return Err(AttError::CccdImproperlyConfigured);
      }
    };

    let existing = self.entries.iter().position(|e| e.connection == Some(connection));
    let index = match existing {
      Some(index) => index,
      None if !subscribe => return Ok(()),
      None => match self.entries.iter().position(SubscriptionEntry::is_free) {
        Some(index) => index,
        None => {
          warn!("No subscription slot left for {connection}");
          return Err(AttError::InsufficientResources);
        }
      },
    };

    let entry = &mut self.entries[index];
    entry.connection = Some(connection);
    entry.subscribed = subscribe;
    debug!("{connection} subscribed={subscribe}");
    Ok(())
  }

  /// Reset the slot held by `connection` once its link is gone.
  pub fn release(&mut self, connection: ConnectionHandle) {
    for entry in self.entries.iter_mut().filter(|e| e.connection == Some(connection)) {
      *entry = SubscriptionEntry::default();
    }
  }
}
