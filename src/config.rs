use enumset::EnumSet;

use crate::descriptors::GattCharacteristicPermission;

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::manual_non_exhaustive)]
pub struct RelayServiceConfig {
  /// Require an authenticated link to read or write the relay state, and only notify
  /// subscribers whose link is authenticated.  Defaults to true unless the crate is built with
  /// the `disable-authentication` feature.
  pub authenticated: bool,

  /// Additionally require authorization for writes of the relay state.
  pub authorized_writes: bool,

  /// Relay state at registration.
  pub initial_state: bool,

  // Not using #[non_exhaustive] because it doesn't support construction using
  // `..Default::default()`.
  #[doc(hidden)]
  pub _non_exhaustive: (),
}

impl Default for RelayServiceConfig {
  fn default() -> Self {
    Self {
      authenticated: !cfg!(feature = "disable-authentication"),
      authorized_writes: false,
      initial_state: false,
      _non_exhaustive: (),
    }
  }
}

impl RelayServiceConfig {
  /// Permissions of the relay state value attribute.
  pub fn value_permissions(&self) -> EnumSet<GattCharacteristicPermission> {
    let mut permissions = if self.authenticated {
      GattCharacteristicPermission::ReadAuthenticated | GattCharacteristicPermission::WriteAuthenticated
    } else {
      GattCharacteristicPermission::Read | GattCharacteristicPermission::Write
    };
    if self.authorized_writes {
      permissions |= GattCharacteristicPermission::WriteAuthorized;
    }
    permissions
  }
}
