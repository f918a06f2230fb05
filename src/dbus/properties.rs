//! # D-Bus interface proxy for: `org.freedesktop.DBus.Properties`
//!
//! Generic property access on BlueZ objects; the path is set per object.

use std::collections::HashMap;

use zbus::{
    proxy,
    zvariant::{OwnedValue, Value},
};

#[proxy(
    interface = "org.freedesktop.DBus.Properties",
    default_service = "org.bluez"
)]
pub trait Properties {
    /// Get method
    fn get(&self, interface_name: &str, property_name: &str) -> zbus::Result<OwnedValue>;

    /// GetAll method
    fn get_all(&self, interface_name: &str) -> zbus::Result<HashMap<String, OwnedValue>>;

    /// Set method
    fn set(&self, interface_name: &str, property_name: &str, value: &Value<'_>)
        -> zbus::Result<()>;
}
