//! Picks the one BlueZ object to bind to for a given interface.

use std::fmt;

use crate::dbus::{Bus, BusError, BusObject, Interface};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Nothing implements the interface yet. Expected while no device is connected.
    #[error("no object implements {0}")]
    NotFound(Interface),
    #[error("multiple objects implement {interface}: {}", .candidates.join(", "))]
    Ambiguous {
        interface: Interface,
        candidates: Vec<String>,
    },
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// A Bluetooth device address, `AA:BB:CC:DD:EE:FF`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress(String);
impl DeviceAddress {
    /// Path segment BlueZ uses for the device, e.g. `dev_AA_BB_CC_DD_EE_FF`.
    #[must_use]
    pub fn path_segment(&self) -> String {
        format!("dev_{}", self.0.replace(':', "_"))
    }
}
impl std::str::FromStr for DeviceAddress {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let octets: Vec<_> = s.split(':').collect();
        anyhow::ensure!(
            octets.len() == 6
                && octets
                    .iter()
                    .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit())),
            "Invalid Bluetooth address {s}"
        );
        Ok(Self(s.to_uppercase()))
    }
}
impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path prefix shared by every object belonging to the same device as `anchor`:
/// its path with the final segment removed, keeping the trailing slash.
fn anchor_prefix(anchor: &BusObject) -> &str {
    let path = anchor.path();
    path.rfind('/').map_or(path, |i| &path[..=i])
}

/// Narrow `candidates` down with `keep`; only a single survivor counts.
fn single<'a>(
    candidates: &'a [BusObject],
    keep: impl Fn(&BusObject) -> bool,
) -> Option<&'a BusObject> {
    let mut matching = candidates.iter().filter(|c| keep(c));
    let first = matching.next()?;
    matching.next().is_none().then_some(first)
}

/// The player this process controls, and its transport once one is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerBinding {
    pub player: BusObject,
    pub transport: Option<BusObject>,
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    preferred_device: Option<DeviceAddress>,
}

impl Resolver {
    pub const fn new(preferred_device: Option<DeviceAddress>) -> Self {
        Self { preferred_device }
    }

    /// Find the object implementing `interface`.
    ///
    /// A single candidate is always returned. Among several, a configured
    /// preferred device wins first; otherwise the candidate living under the
    /// same device as `anchor` (the bound player) is picked.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NotFound`] when nothing implements `interface`,
    /// [`ResolveError::Ambiguous`] when the candidates cannot be told apart,
    /// [`ResolveError::Bus`] when the catalog cannot be queried.
    pub async fn resolve<B: Bus>(
        &self,
        bus: &B,
        interface: Interface,
        anchor: Option<&BusObject>,
    ) -> Result<BusObject, ResolveError> {
        let candidates: Vec<_> = bus
            .list_objects_implementing(interface)
            .await?
            .into_iter()
            .filter(|o| o.implements(interface))
            .collect();

        match candidates.as_slice() {
            [] => return Err(ResolveError::NotFound(interface)),
            [only] => return Ok(only.clone()),
            _ => {}
        }

        if let Some(device) = &self.preferred_device {
            let segment = format!("/{}", device.path_segment());
            if let Some(found) = single(&candidates, |c| c.path().contains(&segment)) {
                tracing::debug!(%device, path = found.path(), %interface, "Picked object of preferred device");
                return Ok(found.clone());
            }
        }

        if let Some(anchor) = anchor {
            let prefix = anchor_prefix(anchor);
            if let Some(found) = single(&candidates, |c| c.path().contains(prefix)) {
                tracing::debug!(prefix, path = found.path(), %interface, "Picked object next to bound player");
                return Ok(found.clone());
            }
        }

        Err(ResolveError::Ambiguous {
            interface,
            candidates: candidates.iter().map(|c| c.path().to_owned()).collect(),
        })
    }

    /// Resolve the transport belonging to `player`, logging why none was found.
    pub async fn resolve_transport<B: Bus>(&self, bus: &B, player: &BusObject) -> Option<BusObject> {
        match self.resolve(bus, Interface::Transport, Some(player)).await {
            Ok(transport) => {
                tracing::info!(path = transport.path(), "Found a media transport");
                Some(transport)
            }
            Err(ResolveError::NotFound(_)) => {
                tracing::debug!(player = player.path(), "Player has no media transport yet");
                None
            }
            Err(e) => {
                tracing::warn!(%e, "Failed to resolve media transport");
                None
            }
        }
    }

    /// Resolve a player and, if already present, its transport.
    ///
    /// # Errors
    ///
    /// Fails as [`Resolver::resolve`] does for the player. A missing
    /// transport is not an error.
    pub async fn bind<B: Bus>(&self, bus: &B) -> Result<PlayerBinding, ResolveError> {
        let player = self.resolve(bus, Interface::Player, None).await?;
        tracing::info!(path = player.path(), "Found a media player");
        let transport = self.resolve_transport(bus, &player).await;
        Ok(PlayerBinding { player, transport })
    }
}
