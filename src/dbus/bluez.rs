use zbus::{
    proxy::CacheProperties,
    zvariant::{OwnedValue, Value},
    Connection, Proxy,
};

use super::{
    object_manager::ObjectManagerProxy, properties::PropertiesProxy, Bus, BusError, BusObject,
    Interface, Properties, BLUEZ_SERVICE,
};

/// [`Bus`] backed by the BlueZ daemon on a zbus connection.
#[derive(Clone)]
pub struct BluezBus {
    conn: Connection,
}

impl BluezBus {
    pub const fn new(conn: Connection) -> Self {
        Self { conn }
    }

    async fn properties(&self, object: &BusObject) -> Result<PropertiesProxy<'static>, BusError> {
        PropertiesProxy::builder(&self.conn)
            .destination(BLUEZ_SERVICE)
            .and_then(|b| b.path(object.path().to_owned()))
            .map(|b| b.cache_properties(CacheProperties::No))
            .map_err(|e| BusError::classify(object.path(), e))?
            .build()
            .await
            .map_err(|e| BusError::classify(object.path(), e))
    }
}

/// Name of a known interface. Querying [`Interface::Unknown`] is a caller bug,
/// so it maps to a name BlueZ will reject.
fn interface_name(interface: Interface) -> &'static str {
    interface.name().unwrap_or("org.bluez.Unknown")
}

impl Bus for BluezBus {
    async fn list_objects_implementing(
        &self,
        interface: Interface,
    ) -> Result<Vec<BusObject>, BusError> {
        let manager = ObjectManagerProxy::new(&self.conn)
            .await
            .map_err(|e| BusError::classify("/", e))?;
        let objects = manager
            .get_managed_objects()
            .await
            .map_err(|e| BusError::classify("/", e))?;
        tracing::trace!(count = objects.len(), "Listed BlueZ managed objects");

        let mut matching: Vec<_> = objects
            .into_iter()
            .map(|(path, interfaces)| BusObject::new(path, interfaces.into_keys().collect()))
            .filter(|object| object.implements(interface))
            .collect();
        // Managed objects arrive in hash order; keep resolution deterministic
        matching.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(matching)
    }

    async fn get_all_properties(
        &self,
        object: &BusObject,
        interface: Interface,
    ) -> Result<Properties, BusError> {
        self.properties(object)
            .await?
            .get_all(interface_name(interface))
            .await
            .map_err(|e| BusError::classify(object.path(), e))
    }

    async fn get_property(
        &self,
        object: &BusObject,
        interface: Interface,
        key: &str,
    ) -> Result<OwnedValue, BusError> {
        self.properties(object)
            .await?
            .get(interface_name(interface), key)
            .await
            .map_err(|e| BusError::classify(object.path(), e))
    }

    async fn set_property(
        &self,
        object: &BusObject,
        interface: Interface,
        key: &str,
        value: Value<'_>,
    ) -> Result<(), BusError> {
        self.properties(object)
            .await?
            .set(interface_name(interface), key, &value)
            .await
            .map_err(|e| BusError::classify(object.path(), e))
    }

    async fn invoke_method(
        &self,
        object: &BusObject,
        interface: Interface,
        method: &str,
    ) -> Result<(), BusError> {
        let proxy = Proxy::new(
            &self.conn,
            BLUEZ_SERVICE,
            object.path().to_owned(),
            interface_name(interface),
        )
        .await
        .map_err(|e| BusError::classify(object.path(), e))?;
        proxy
            .call_method(method, &())
            .await
            .map(drop)
            .map_err(|e| BusError::classify(object.path(), e))
    }
}
