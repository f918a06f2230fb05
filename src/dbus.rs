//! Everything that talks to BlueZ over the system bus.

use std::{collections::HashMap, collections::HashSet, fmt};

use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

pub mod bluez;
#[cfg(test)]
pub mod fake;
pub mod object_manager;
pub mod properties;

pub const BLUEZ_SERVICE: &str = "org.bluez";
pub const BLUEZ_ROOT_PATH: &str = "/org/bluez";
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// BlueZ interfaces this module cares about, as tagged by the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interface {
    Player,
    Transport,
    Device,
    /// `org.bluez.MediaControl1`, deprecated upstream
    Control,
    Unknown,
}
impl Interface {
    /// D-Bus name of the interface, or [`None`] for [`Interface::Unknown`].
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self {
            Self::Player => Some("org.bluez.MediaPlayer1"),
            Self::Transport => Some("org.bluez.MediaTransport1"),
            Self::Device => Some("org.bluez.Device1"),
            Self::Control => Some("org.bluez.MediaControl1"),
            Self::Unknown => None,
        }
    }
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        [Self::Player, Self::Transport, Self::Device, Self::Control]
            .into_iter()
            .find(|i| i.name() == Some(name))
            .unwrap_or(Self::Unknown)
    }
}
impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or("<unknown>"))
    }
}

/// An object exported by BlueZ, together with the interfaces it implements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusObject {
    pub path: OwnedObjectPath,
    pub interfaces: HashSet<String>,
}
impl BusObject {
    pub const fn new(path: OwnedObjectPath, interfaces: HashSet<String>) -> Self {
        Self { path, interfaces }
    }
    #[must_use]
    pub fn implements(&self, interface: Interface) -> bool {
        interface
            .name()
            .is_some_and(|name| self.interfaces.contains(name))
    }
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The object no longer exists or stopped answering for the interface
    #[error("{path} no longer answers on the bus: {source}")]
    Stale { path: String, source: zbus::Error },
    #[error("{path}: {source}")]
    Bus { path: String, source: zbus::Error },
}
impl BusError {
    const STALE_ERROR_NAMES: [&'static str; 3] = [
        "org.freedesktop.DBus.Error.UnknownObject",
        "org.freedesktop.DBus.Error.UnknownMethod",
        "org.freedesktop.DBus.Error.UnknownInterface",
    ];

    /// Classify a zbus error raised while talking to `path`.
    pub fn classify(path: &str, source: zbus::Error) -> Self {
        let path = path.to_owned();
        let stale = match &source {
            zbus::Error::MethodError(name, _, _) => {
                Self::STALE_ERROR_NAMES.contains(&name.as_str())
            }
            zbus::Error::FDO(e) => matches!(
                **e,
                zbus::fdo::Error::UnknownObject(_)
                    | zbus::fdo::Error::UnknownMethod(_)
                    | zbus::fdo::Error::UnknownInterface(_)
            ),
            _ => false,
        };
        if stale {
            Self::Stale { path, source }
        } else {
            Self::Bus { path, source }
        }
    }

    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

pub type Properties = HashMap<String, OwnedValue>;

/// Queries and method calls against BlueZ objects.
///
/// [`bluez::BluezBus`] implements this over a zbus connection; tests use an
/// in-memory catalog.
pub trait Bus {
    /// List every object currently implementing `interface`.
    async fn list_objects_implementing(
        &self,
        interface: Interface,
    ) -> Result<Vec<BusObject>, BusError>;

    /// Snapshot of all properties of `object` on `interface`.
    async fn get_all_properties(
        &self,
        object: &BusObject,
        interface: Interface,
    ) -> Result<Properties, BusError>;

    async fn get_property(
        &self,
        object: &BusObject,
        interface: Interface,
        key: &str,
    ) -> Result<OwnedValue, BusError>;

    async fn set_property(
        &self,
        object: &BusObject,
        interface: Interface,
        key: &str,
        value: Value<'_>,
    ) -> Result<(), BusError>;

    /// Call an argument-less method, e.g. `Play` on a media player.
    async fn invoke_method(
        &self,
        object: &BusObject,
        interface: Interface,
        method: &str,
    ) -> Result<(), BusError>;
}
