use core::ops::Deref;

use enumset::{enum_set, EnumSet};

use crate::descriptors::{
  AttributeHandle, GattCharacteristicPermission, GattCharacteristicProperty, GattService, UUID,
};

/// Largest table a single service may register.
pub const MAX_ATTRIBUTES: usize = 16;

/// Service declaration (up to a 128-bit UUID) or characteristic declaration (properties, value
/// handle and up to a 128-bit UUID).
const MAX_DECLARATION_LEN: usize = 19;

/// One slot of the flattened attribute table handed to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
  /// Attribute type.
  pub uuid: UUID,
  pub permissions: EnumSet<GattCharacteristicPermission>,
  pub value: AttributeValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
  /// Service declaration carrying the service UUID.
  Service(UUID),

  /// Characteristic declaration.  The value attribute always follows at the next handle.
  Characteristic {
    properties: EnumSet<GattCharacteristicProperty>,
    uuid: UUID,
  },

  /// Characteristic value owned by the service and reached through its read/write callbacks.
  Dynamic,

  /// Client characteristic configuration, kept per connection by the service.
  ClientConfig,

  /// Fixed descriptor value served by the runtime.
  Static(&'static [u8]),
}

impl AttributeValue {
  /// Whether reads and writes of this attribute are forwarded to the service.
  pub fn is_dynamic(&self) -> bool {
    matches!(self, AttributeValue::Dynamic | AttributeValue::ClientConfig)
  }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
  #[error("service does not fit in {MAX_ATTRIBUTES} attributes")]
  CapacityExceeded,
  #[error("attribute handles exhausted")]
  HandleOverflow,
}

/// Ordered attribute set of one service: the service declaration followed, per characteristic,
/// by its declaration, its value, an automatic CCCD when it notifies or indicates, and its
/// fixed descriptors.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
  attributes: heapless::Vec<Attribute, MAX_ATTRIBUTES>,
  first_handle: Option<AttributeHandle>,
}

impl AttributeTable {
  pub fn build(service: &GattService<'_>) -> Result<Self, TableError> {
    let mut table = Self::default();
    let read_only = enum_set!(GattCharacteristicPermission::Read);

    table.push(Attribute {
      uuid: service.service_type.declaration_uuid(),
      permissions: read_only,
      value: AttributeValue::Service(service.uuid),
    })?;

    for characteristic in service.characteristics {
      table.push(Attribute {
        uuid: UUID::CHARACTERISTIC,
        permissions: read_only,
        value: AttributeValue::Characteristic {
          properties: characteristic.properties,
          uuid: characteristic.uuid,
        },
      })?;
      table.push(Attribute {
        uuid: characteristic.uuid,
        permissions: characteristic.permissions,
        value: AttributeValue::Dynamic,
      })?;
      if characteristic.has_cccd() {
        table.push(Attribute {
          uuid: UUID::CLIENT_CHARACTERISTIC_CONFIGURATION,
          permissions: GattCharacteristicPermission::Read | GattCharacteristicPermission::Write,
          value: AttributeValue::ClientConfig,
        })?;
      }
      for descriptor in characteristic.descriptors {
        table.push(Attribute {
          uuid: descriptor.uuid,
          permissions: descriptor.permissions,
          value: AttributeValue::Static(descriptor.value),
        })?;
      }
    }

    Ok(table)
  }

  fn push(&mut self, attribute: Attribute) -> Result<(), TableError> {
    self
      .attributes
      .push(attribute)
      .map_err(|_| TableError::CapacityExceeded)
  }

  /// Record the handles assigned by the runtime, which are contiguous from `first_handle`.
  pub fn bind(&mut self, first_handle: AttributeHandle) -> Result<(), TableError> {
    let last = self.attributes.len().saturating_sub(1);
    first_handle.offset(last).ok_or(TableError::HandleOverflow)?;
    self.first_handle = Some(first_handle);
    Ok(())
  }

  pub fn len(&self) -> usize {
    self.attributes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.attributes.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
    self.attributes.iter()
  }

  /// Handle of the attribute at `index`, once bound.
  pub fn handle_at(&self, index: usize) -> Option<AttributeHandle> {
    if index >= self.attributes.len() {
      return None;
    }
    self.first_handle?.offset(index)
  }

  /// Look up a bound attribute by handle.
  pub fn find(&self, handle: AttributeHandle) -> Option<&Attribute> {
    let index = self.first_handle?.distance_to(handle)?;
    self.attributes.get(index)
  }

  /// Handle of the first attribute of type `uuid`.
  pub fn handle_of(&self, uuid: UUID) -> Option<AttributeHandle> {
    let index = self.attributes.iter().position(|a| a.uuid == uuid)?;
    self.handle_at(index)
  }

  /// Value of an attribute that the runtime serves on its own (declarations and fixed
  /// descriptors).  Dynamic attributes yield `None`.
  pub fn static_value(&self, handle: AttributeHandle) -> Option<StaticValue> {
    match &self.find(handle)?.value {
      AttributeValue::Service(uuid) => {
        let mut raw = heapless::Vec::new();
        uuid.push_into(&mut raw).ok()?;
        Some(StaticValue::Encoded(raw))
      }
      AttributeValue::Characteristic { properties, uuid } => {
        let value_handle = handle.offset(1)?;
        let mut raw = heapless::Vec::new();
        raw.push(GattCharacteristicProperty::encode(*properties)).ok()?;
        raw.extend_from_slice(&value_handle.get().to_le_bytes()).ok()?;
        uuid.push_into(&mut raw).ok()?;
        Some(StaticValue::Encoded(raw))
      }
      AttributeValue::Static(value) => Some(StaticValue::Borrowed(*value)),
      AttributeValue::Dynamic | AttributeValue::ClientConfig => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticValue {
  Borrowed(&'static [u8]),
  Encoded(heapless::Vec<u8, MAX_DECLARATION_LEN>),
}

impl Deref for StaticValue {
  type Target = [u8];

  fn deref(&self) -> &Self::Target {
    match self {
      StaticValue::Borrowed(value) => value,
      StaticValue::Encoded(raw) => raw.as_slice(),
    }
  }
}
