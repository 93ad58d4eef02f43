/// Collapses a wire byte to the logical boolean it stands for.  Peers may set stray high bits;
/// only zero versus non-zero carries meaning.
pub const fn normalize(raw: u8) -> u8 {
  (raw != 0) as u8
}

/// Holds the relay state.  The stored value is always exactly 0 or 1.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ValueStore {
  state: bool,
}

impl ValueStore {
  pub const fn new(state: bool) -> Self {
    Self { state }
  }

  /// Wire form of the current value.
  pub fn get(&self) -> u8 {
    self.state as u8
  }

  pub fn state(&self) -> bool {
    self.state
  }

  /// Store the normalized form of `raw`, returning whether the logical value changed.
  pub fn set(&mut self, raw: u8) -> bool {
    let next = normalize(raw) == 1;
    let changed = next != self.state;
    self.state = next;
    changed
  }
}
