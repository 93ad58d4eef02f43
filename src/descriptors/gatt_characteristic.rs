use crate::descriptors::gatt_descriptor::GattDescriptor;
use crate::descriptors::uuid::UUID;
use enumset::EnumSet;

#[derive(Debug, PartialEq)]
pub struct GattCharacteristic<'a> {
  pub uuid: UUID,
  pub properties: EnumSet<GattCharacteristicProperty>,
  pub permissions: EnumSet<GattCharacteristicPermission>,
  pub descriptors: &'a [GattDescriptor],
}

impl<'a> Default for GattCharacteristic<'a> {
  fn default() -> Self {
    Self {
      uuid: UUID::Long(0),
      properties: EnumSet::new(),
      permissions: EnumSet::new(),
      descriptors: &[],
    }
  }
}

impl<'a> GattCharacteristic<'a> {
  /// Whether a client characteristic configuration descriptor is attached to this
  /// characteristic.
  pub fn has_cccd(&self) -> bool {
    self
      .properties
      .contains(GattCharacteristicProperty::Notify)
      || self.properties.contains(GattCharacteristicProperty::Indicate)
  }
}

/// Declared in the order of their bits in the characteristic declaration
/// ([Vol 3] Part G, Section 3.3.1.1).
#[derive(Debug, enumset::EnumSetType)]
pub enum GattCharacteristicProperty {
  Broadcast,
  Read,
  WriteNoResponse,
  Write,

  /// Note that setting this property will cause a CCCD descriptor to automatically be added
  /// to the characteristic.
  Notify,

  /// Note that setting this property will cause a CCCD descriptor to automatically be added
  /// to the characteristic.
  Indicate,

  WriteSigned,
  ExtendedProps,
}

impl GattCharacteristicProperty {
  pub fn bit(self) -> u8 {
    match self {
      GattCharacteristicProperty::Broadcast => 0x01,
      GattCharacteristicProperty::Read => 0x02,
      GattCharacteristicProperty::WriteNoResponse => 0x04,
      GattCharacteristicProperty::Write => 0x08,
      GattCharacteristicProperty::Notify => 0x10,
      GattCharacteristicProperty::Indicate => 0x20,
      GattCharacteristicProperty::WriteSigned => 0x40,
      GattCharacteristicProperty::ExtendedProps => 0x80,
    }
  }

  /// Encodes a property set into the characteristic declaration byte.
  pub fn encode(properties: EnumSet<GattCharacteristicProperty>) -> u8 {
    properties.iter().fold(0, |acc, p| acc | p.bit())
  }
}

/// Access requirements of an attribute.  Authenticated variants imply an encrypted link with
/// MITM protection; authorized variants require an application level grant on top of that.
#[derive(Debug, enumset::EnumSetType)]
pub enum GattCharacteristicPermission {
  Read,
  ReadEncrypted,
  ReadAuthenticated,
  ReadAuthorized,
  Write,
  WriteEncrypted,
  WriteAuthenticated,
  WriteAuthorized,
  WriteSigned,
}

impl GattCharacteristicPermission {
  /// Whether `permissions` demand authorization before a write may be applied.
  pub fn requires_authorized_write(permissions: EnumSet<GattCharacteristicPermission>) -> bool {
    permissions.contains(GattCharacteristicPermission::WriteAuthorized)
  }
}
