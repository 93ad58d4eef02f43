use crate::att_error::AttError;
use crate::descriptors::AttributeHandle;
use core::fmt::{Debug, Display, Formatter};

/// Link identifier assigned by the connection manager.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionHandle(pub u16);

impl Display for ConnectionHandle {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    write!(f, "{:#06x}", self.0)
  }
}

/// Represents a GATT connection from the peripheral perspective, specifically used as the API
/// to allow the BLE peripheral device to respond to connected clients.
pub trait GattConnection {
  type Responder: GattResponder + Debug;

  /// Link identifier used to key per-connection state such as subscriptions.
  fn handle(&self) -> ConnectionHandle;
}

/// Contextually aware type that manages how requests are mapped to responses internal to the
/// BLE implementation.
pub trait GattResponder {
  type SystemError: Debug;

  /// Send response to read or write request.
  fn respond(&mut self, response: Result<Response<'_>, AttError>) -> Result<(), Self::SystemError>;
}

#[derive(Debug)]
pub struct Response<'a> {
  pub offset: u16,
  pub value: &'a [u8],
}

impl<'a> Response<'a> {
  pub fn new(offset: u16, value: &'a [u8]) -> Self {
    Self { offset, value }
  }

  pub fn complete(value: &'a [u8]) -> Self {
    Self::new(0, value)
  }
}

/// Server-initiated transport for handle value notifications.
pub trait Notifier {
  type SystemError: Debug;

  /// Send a notification carrying `value` for the attribute at `handle` to one connection.
  /// Failures (congestion, a link that went away) are reported back but never retried here.
  fn notify(
    &mut self,
    connection: ConnectionHandle,
    handle: AttributeHandle,
    value: &[u8],
  ) -> Result<(), Self::SystemError>;

  /// Whether the link is encrypted with an authenticated (MITM protected) key.
  fn is_authenticated(&self, connection: ConnectionHandle) -> bool;
}
