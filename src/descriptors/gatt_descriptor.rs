use enumset::{enum_set, EnumSet};
use crate::descriptors::uuid::UUID;
use crate::prelude::GattCharacteristicPermission;

/// Descriptor with a fixed value, such as a characteristic user description.  Client
/// characteristic configuration descriptors are not listed here; they are derived from the
/// characteristic properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattDescriptor {
  pub uuid: UUID,
  pub permissions: EnumSet<GattDescriptorPermission>,
  pub value: &'static [u8],
}

impl GattDescriptor {
  /// Read-only Characteristic User Description carrying `text` as UTF-8 without a terminator.
  pub const fn user_description(text: &'static str) -> Self {
    Self {
      uuid: UUID::CHARACTERISTIC_USER_DESCRIPTION,
      permissions: enum_set!(GattDescriptorPermission::Read),
      value: text.as_bytes(),
    }
  }
}

impl Default for GattDescriptor {
  fn default() -> Self {
    Self {
      uuid: UUID::Long(0),
      permissions: EnumSet::new(),
      value: &[],
    }
  }
}

pub type GattDescriptorPermission = GattCharacteristicPermission;
