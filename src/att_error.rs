/// ATT error codes returned to the peer ([Vol 3] Part F, Section 3.4.1.1).
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[repr(u8)]
pub enum AttError {
  #[error("invalid attribute handle")]
  InvalidHandle = 0x01,
  #[error("read not permitted")]
  ReadNotPermitted = 0x02,
  #[error("write not permitted")]
  WriteNotPermitted = 0x03,
  #[error("invalid PDU")]
  InvalidPdu = 0x04,
  #[error("insufficient authentication")]
  InsufficientAuthentication = 0x05,
  #[error("request not supported")]
  RequestNotSupported = 0x06,
  #[error("invalid offset")]
  InvalidOffset = 0x07,
  #[error("insufficient authorization")]
  InsufficientAuthorization = 0x08,
  #[error("prepare queue full")]
  PrepareQueueFull = 0x09,
  #[error("attribute not found")]
  AttributeNotFound = 0x0A,
  /// The attribute cannot be accessed with a non-zero offset.
  #[error("attribute not long")]
  NotLong = 0x0B,
  #[error("insufficient encryption key size")]
  InsufficientKeySize = 0x0C,
  #[error("invalid attribute value length")]
  InvalidValueSize = 0x0D,
  #[error("unlikely error")]
  Unlikely = 0x0E,
  #[error("insufficient encryption")]
  InsufficientEncryption = 0x0F,
  #[error("unsupported group type")]
  UnsupportedGroupType = 0x10,
  #[error("insufficient resources")]
  InsufficientResources = 0x11,
  /// Common profile error ([CSS] Part B, Section 1.2).
  #[error("client characteristic configuration descriptor improperly configured")]
  CccdImproperlyConfigured = 0xFD,
}

impl From<AttError> for u8 {
  fn from(value: AttError) -> Self {
    value as u8
  }
}
