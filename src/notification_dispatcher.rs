use alloc::boxed::Box;
use core::fmt::{Debug, Formatter};

use log::{debug, warn};

use crate::descriptors::AttributeHandle;
use crate::gatt_connection::{ConnectionHandle, Notifier};
use crate::subscription_table::SubscriptionTable;

/// Observability hook for notifications the transport failed to deliver.  Failures never
/// reach the writer that caused the state change; this is where they surface instead.
pub trait DeliveryObserver<E> {
  fn on_delivery_failure(&mut self, connection: ConnectionHandle, error: &E);
}

impl<E, F> DeliveryObserver<E> for F
where
  F: FnMut(ConnectionHandle, &E),
{
  fn on_delivery_failure(&mut self, connection: ConnectionHandle, error: &E) {
    (self)(connection, error)
  }
}

/// Tally of one broadcast.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DispatchReport {
  pub delivered: usize,

  /// Subscribers passed over because their link is not authenticated.
  pub skipped: usize,
  pub failed: usize,
}

/// Fans a changed value out to every subscribed connection, at most once per connection.
pub struct NotificationDispatcher<N: Notifier> {
  notifier: N,

  /// Only notify over authenticated links.
  authenticated: bool,
  observer: Option<Box<dyn DeliveryObserver<N::SystemError> + Send>>,
}

impl<N: Notifier> NotificationDispatcher<N> {
  pub fn new(notifier: N, authenticated: bool) -> Self {
    Self { notifier, authenticated, observer: None }
  }

  pub fn set_observer(&mut self, observer: impl DeliveryObserver<N::SystemError> + Send + 'static) {
    self.observer = Some(Box::new(observer));
  }

  pub fn broadcast<const C: usize>(
    &mut self,
    subscriptions: &SubscriptionTable<C>,
    handle: AttributeHandle,
    value: &[u8],
  ) -> DispatchReport {
    let mut report = DispatchReport::default();

    for connection in subscriptions.subscribers() {
      if self.authenticated && !self.notifier.is_authenticated(connection) {
        debug!("Skipping notification to unauthenticated {connection}");
        report.skipped += 1;
        continue;
      }

      match self.notifier.notify(connection, handle, value) {
        Ok(()) => report.delivered += 1,
        Err(e) => {
          warn!("Notification to {connection} failed: {e:?}");
          report.failed += 1;
          if let Some(observer) = self.observer.as_mut() {
            observer.on_delivery_failure(connection, &e);
          }
        }
      }
    }

    debug!("Broadcast handle={handle} value={value:?}: {report:?}");
    report
  }
}

impl<N: Notifier + Debug> Debug for NotificationDispatcher<N> {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("NotificationDispatcher")
      .field("notifier", &self.notifier)
      .field("authenticated", &self.authenticated)
      .field("has_observer", &self.observer.is_some())
      .finish()
  }
}
