use crate::attribute_table::TableError;
use crate::subscription_table::CapacityError;

/// Failures reported to the application, as opposed to [crate::att_error::AttError] which is
/// returned to peers.  `E` is the runtime's system error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError<E> {
  /// Storage for per-connection subscriptions could not be obtained.  Nothing was registered.
  #[error("subscription table unavailable: {0}")]
  MemoryAllocation(CapacityError),

  #[error("unknown parameter {0:#04x}")]
  InvalidParameter(u8),

  #[error("parameter value must be {expected} byte(s), got {actual}")]
  InvalidRange { expected: usize, actual: usize },

  #[error(transparent)]
  AttributeTable(#[from] TableError),

  #[error("service registration rejected: {0:?}")]
  Registration(E),
}
