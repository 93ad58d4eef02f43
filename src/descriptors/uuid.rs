use core::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UUID {
  /// For use only with SIG defined services (i.e. registered and publicly well known services).
  Short(u16),

  /// All other BLE UUIDs must be 128-bit
  Long(u128),
}

/// Base of the vendor UUID space used by the relay profile: `F000xxxx-0451-4000-B000-000000000000`.
const VENDOR_BASE_UUID: u128 = 0xF000_0000_0451_4000_B000_0000_0000_0000;

impl UUID {
  pub const PRIMARY_SERVICE: UUID = UUID::Short(0x2800);
  pub const SECONDARY_SERVICE: UUID = UUID::Short(0x2801);
  pub const CHARACTERISTIC: UUID = UUID::Short(0x2803);
  pub const CHARACTERISTIC_USER_DESCRIPTION: UUID = UUID::Short(0x2901);
  pub const CLIENT_CHARACTERISTIC_CONFIGURATION: UUID = UUID::Short(0x2902);

  /// Builds a 128-bit UUID in the vendor space from its 16-bit alias.
  pub const fn vendor(alias: u16) -> Self {
    UUID::Long(VENDOR_BASE_UUID | ((alias as u128) << 96))
  }

  pub fn as_u128(&self) -> u128 {
    match *self {
      UUID::Short(u) => u.into(),
      UUID::Long(u) => u,
    }
  }

  /// The 16-bit alias used to identify an attribute: the UUID itself when short, otherwise
  /// bytes 12 and 13 of the little-endian 128-bit form.
  pub const fn alias(&self) -> u16 {
    match *self {
      UUID::Short(u) => u,
      UUID::Long(u) => (u >> 96) as u16,
    }
  }

  /// Size of the UUID on the wire.
  pub const fn wire_len(&self) -> usize {
    match self {
      UUID::Short(_) => 2,
      UUID::Long(_) => 16,
    }
  }

  /// Appends the little-endian wire form.
  pub fn push_into<const N: usize>(&self, buf: &mut heapless::Vec<u8, N>) -> Result<(), ()> {
    match *self {
      UUID::Short(u) => buf.extend_from_slice(&u.to_le_bytes()),
      UUID::Long(u) => buf.extend_from_slice(&u.to_le_bytes()),
    }
  }
}

impl Display for UUID {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    match *self {
      UUID::Short(u) => write!(f, "{u:#06x}"),
      UUID::Long(u) => write!(
        f,
        "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
        (u >> 96) as u32,
        (u >> 80) as u16,
        (u >> 64) as u16,
        (u >> 48) as u16,
        u & 0xFFFF_FFFF_FFFF,
      ),
    }
  }
}
