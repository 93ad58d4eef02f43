use crate::descriptors::AttributeHandle;
use crate::gatt_connection::GattConnection;
use crate::peripheral::Peripheral;
use core::fmt::Debug;

pub trait GattServerCallback<P: Peripheral + ?Sized> {
  fn on_event(&mut self, event: GattServerEvent<'_, P>);
}

impl<P, F> GattServerCallback<P> for F
where
  F: FnMut(GattServerEvent<P>),
  P: Peripheral,
{
  fn on_event(&mut self, event: GattServerEvent<'_, P>) {
    (self)(event)
  }
}

pub enum GattServerEvent<'a, P: Peripheral + ?Sized> {
  /// Peer connected.
  Connected { connection: &'a P::Connection },

  /// Peer disconnected.  Any per-connection state held for this link is released.
  Disconnected { connection: &'a P::Connection },

  /// Issue a read request for an attribute of the registered table.
  ReadRequest {
    connection: &'a P::Connection,
    handle: AttributeHandle,

    /// Offset of the first octet to be read.
    offset: u16,

    /// Maximum number of octets the peer can accept in the response.
    max_len: u16,

    /// Reference to a responder that is used to issue a response to the peer.
    responder: &'a mut <P::Connection as GattConnection>::Responder,
  },

  /// Issue a write request for an attribute of the registered table.
  WriteRequest {
    connection: &'a P::Connection,
    handle: AttributeHandle,

    /// Reference to a responder that is used to issue a response to the peer.  Optional
    /// in this case since writes can be issued in a way that does not request (or warrant) a
    /// response.
    responder: Option<&'a mut <P::Connection as GattConnection>::Responder>,

    /// Offset within the intended record to apply the written data.
    offset: u16,

    /// Actual value that the client is writing.
    value: &'a [u8],
  },
}

impl<'a, P: Peripheral + ?Sized> GattServerEvent<'a, P> {
  pub fn connection(&self) -> &'a P::Connection {
    match self {
      GattServerEvent::Connected { connection }
      | GattServerEvent::Disconnected { connection }
      | GattServerEvent::ReadRequest { connection, .. }
      | GattServerEvent::WriteRequest { connection, .. } => *connection,
    }
  }
}

impl<'a, P: Peripheral + ?Sized> Debug for GattServerEvent<'a, P> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    let connection = self.connection().handle();
    match self {
      GattServerEvent::Connected { .. } => {
        f.debug_struct("Connected").field("connection", &connection).finish()
      }
      GattServerEvent::Disconnected { .. } => {
        f.debug_struct("Disconnected").field("connection", &connection).finish()
      }
      GattServerEvent::ReadRequest { handle, offset, max_len, .. } => f
        .debug_struct("ReadRequest")
        .field("connection", &connection)
        .field("handle", handle)
        .field("offset", offset)
        .field("max_len", max_len)
        .finish(),
      GattServerEvent::WriteRequest { handle, responder, offset, value, .. } => f
        .debug_struct("WriteRequest")
        .field("connection", &connection)
        .field("handle", handle)
        .field("with_response", &responder.is_some())
        .field("offset", offset)
        .field("value", value)
        .finish(),
    }
  }
}
