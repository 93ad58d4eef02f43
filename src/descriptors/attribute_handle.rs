use core::fmt::Display;
use core::fmt::Formatter;
use core::num::NonZeroU16;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttributeHandle(pub NonZeroU16);

impl AttributeHandle {
  pub const fn new(raw: u16) -> Option<Self> {
    match NonZeroU16::new(raw) {
      Some(h) => Some(Self(h)),
      None => None,
    }
  }

  pub const fn get(&self) -> u16 {
    self.0.get()
  }

  /// Handle `n` positions after this one, if it still fits the handle space.
  pub fn offset(&self, n: usize) -> Option<Self> {
    let n = u16::try_from(n).ok()?;
    self.0.checked_add(n).map(Self)
  }

  /// Position of `other` relative to this handle.
  pub fn distance_to(&self, other: AttributeHandle) -> Option<usize> {
    other.get().checked_sub(self.get()).map(usize::from)
  }
}

impl Display for AttributeHandle {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    write!(f, "{:?}", self.0)
  }
}
