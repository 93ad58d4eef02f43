//! Static shape of a service: its characteristics, their descriptors and the UUIDs and handles
//! naming them.  These are pure data types; [crate::attribute_table::AttributeTable] flattens
//! them into what the runtime registers.

pub mod attribute_handle;
pub mod gatt_characteristic;
pub mod gatt_descriptor;
pub mod gatt_service;
pub mod uuid;

pub use attribute_handle::*;
pub use gatt_characteristic::*;
pub use gatt_descriptor::*;
pub use gatt_service::*;
pub use uuid::*;
