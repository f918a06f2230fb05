//! # D-Bus interface proxy for: `org.freedesktop.DBus.ObjectManager`
//!
//! BlueZ exports its whole object tree through a single manager at `/`.

use std::collections::HashMap;

use zbus::{
    proxy,
    zvariant::{OwnedObjectPath, OwnedValue},
};

pub type ManagedObjects = HashMap<OwnedObjectPath, HashMap<String, HashMap<String, OwnedValue>>>;

#[proxy(
    interface = "org.freedesktop.DBus.ObjectManager",
    default_service = "org.bluez",
    default_path = "/"
)]
pub trait ObjectManager {
    /// GetManagedObjects method
    fn get_managed_objects(&self) -> zbus::Result<ManagedObjects>;
}
