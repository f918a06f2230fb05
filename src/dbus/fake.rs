//! In-memory stand-in for BlueZ used by the tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

use super::{Bus, BusError, BusObject, Interface, Properties};

pub fn owned<'a>(v: impl Into<Value<'a>>) -> OwnedValue {
    OwnedValue::try_from(v.into()).unwrap()
}

pub fn object(path: &str, interfaces: &[Interface]) -> BusObject {
    BusObject::new(
        OwnedObjectPath::try_from(path).unwrap(),
        interfaces
            .iter()
            .filter_map(|i| i.name())
            .map(ToOwned::to_owned)
            .collect(),
    )
}

pub fn track(title: &str, artist: &str, album: &str) -> OwnedValue {
    owned(HashMap::from([
        ("Title", Value::from(title)),
        ("Artist", Value::from(artist)),
        ("Album", Value::from(album)),
    ]))
}

fn stale(path: &str) -> BusError {
    BusError::Stale {
        path: path.to_owned(),
        source: zbus::fdo::Error::UnknownObject(path.to_owned()).into(),
    }
}

#[derive(Default)]
struct Catalog {
    objects: Vec<BusObject>,
    properties: HashMap<(String, Interface), HashMap<String, OwnedValue>>,
    calls: Vec<String>,
    queries: usize,
}

/// A bus whose object tree and properties are set up by the test. Clones
/// share the same catalog.
#[derive(Default, Clone)]
pub struct FakeBus {
    catalog: Arc<Mutex<Catalog>>,
}

impl FakeBus {
    pub fn add_object(&self, path: &str, interfaces: &[Interface]) {
        self.catalog
            .lock()
            .unwrap()
            .objects
            .push(object(path, interfaces));
    }

    /// Drop an object and all of its properties, like BlueZ does on removal.
    pub fn remove_object(&self, path: &str) {
        let mut catalog = self.catalog.lock().unwrap();
        catalog.objects.retain(|o| o.path() != path);
        catalog.properties.retain(|(p, _), _| p != path);
    }

    pub fn set(&self, path: &str, interface: Interface, key: &str, value: OwnedValue) {
        self.catalog
            .lock()
            .unwrap()
            .properties
            .entry((path.to_owned(), interface))
            .or_default()
            .insert(key.to_owned(), value);
    }

    pub fn value(&self, path: &str, interface: Interface, key: &str) -> Option<OwnedValue> {
        self.catalog
            .lock()
            .unwrap()
            .properties
            .get(&(path.to_owned(), interface))?
            .get(key)
            .map(|v| v.try_clone().unwrap())
    }

    /// Method calls issued so far, as `path Interface.Method`.
    pub fn calls(&self) -> Vec<String> {
        self.catalog.lock().unwrap().calls.clone()
    }

    /// Number of catalog queries issued so far.
    pub fn queries(&self) -> usize {
        self.catalog.lock().unwrap().queries
    }

    fn known(&self, path: &str) -> Result<(), BusError> {
        let catalog = self.catalog.lock().unwrap();
        if catalog.objects.iter().any(|o| o.path() == path) {
            Ok(())
        } else {
            Err(stale(path))
        }
    }
}

impl Bus for FakeBus {
    async fn list_objects_implementing(
        &self,
        interface: Interface,
    ) -> Result<Vec<BusObject>, BusError> {
        let mut catalog = self.catalog.lock().unwrap();
        catalog.queries += 1;
        Ok(catalog
            .objects
            .iter()
            .filter(|o| o.implements(interface))
            .cloned()
            .collect())
    }

    async fn get_all_properties(
        &self,
        object: &BusObject,
        interface: Interface,
    ) -> Result<Properties, BusError> {
        self.known(object.path())?;
        let catalog = self.catalog.lock().unwrap();
        Ok(catalog
            .properties
            .get(&(object.path().to_owned(), interface))
            .map(|props| {
                props
                    .iter()
                    .map(|(k, v)| (k.clone(), v.try_clone().unwrap()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_property(
        &self,
        object: &BusObject,
        interface: Interface,
        key: &str,
    ) -> Result<OwnedValue, BusError> {
        self.known(object.path())?;
        self.value(object.path(), interface, key).ok_or_else(|| BusError::Bus {
            path: object.path().to_owned(),
            source: zbus::fdo::Error::InvalidArgs(format!("No such property '{key}'")).into(),
        })
    }

    async fn set_property(
        &self,
        object: &BusObject,
        interface: Interface,
        key: &str,
        value: Value<'_>,
    ) -> Result<(), BusError> {
        self.known(object.path())?;
        self.set(object.path(), interface, key, owned(value));
        Ok(())
    }

    async fn invoke_method(
        &self,
        object: &BusObject,
        interface: Interface,
        method: &str,
    ) -> Result<(), BusError> {
        self.known(object.path())?;
        self.catalog
            .lock()
            .unwrap()
            .calls
            .push(format!("{} {interface}.{method}", object.path()));
        Ok(())
    }
}

