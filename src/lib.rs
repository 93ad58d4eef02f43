#![no_std]

extern crate alloc;

pub mod access_validator;
pub mod att_error;
pub mod attribute_table;
pub mod config;
pub mod descriptors;
pub mod gatt_connection;
pub mod gatt_server_cb;
pub mod notification_dispatcher;
pub mod peripheral;
pub mod relay_service;
pub mod service_error;
pub mod subscription_table;
pub mod value_store;

#[cfg(test)]
mod testing;

pub mod prelude {
  pub use crate::att_error::*;
  pub use crate::attribute_table::*;
  pub use crate::config::*;
  pub use crate::descriptors::*;
  pub use crate::gatt_connection::*;
  pub use crate::gatt_server_cb::*;
  pub use crate::notification_dispatcher::{DeliveryObserver, DispatchReport};
  pub use crate::peripheral::*;
  pub use crate::relay_service::*;
  pub use crate::service_error::*;
  pub use crate::subscription_table::CapacityError;
}
