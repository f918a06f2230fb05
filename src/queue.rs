//! Unbounded FIFO of property changes between the bus listener and the reconciler.

use tokio::sync::mpsc;
use zbus::zvariant::OwnedObjectPath;

use crate::dbus::{Interface, Properties};

/// A `PropertiesChanged` signal, tagged by the interface it originated from.
#[derive(Debug)]
pub struct ChangeNotification {
    pub interface: Interface,
    /// Interface name as received, kept for diagnostics
    pub interface_name: String,
    pub path: OwnedObjectPath,
    pub fields: Properties,
}
impl ChangeNotification {
    pub fn new(interface_name: String, path: OwnedObjectPath, fields: Properties) -> Self {
        Self {
            interface: Interface::from_name(&interface_name),
            interface_name,
            path,
            fields,
        }
    }
}

pub fn event_queue() -> (EventSender, EventReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (EventSender(sender), EventReceiver(receiver))
}

#[derive(Clone, Debug)]
pub struct EventSender(mpsc::UnboundedSender<ChangeNotification>);
impl EventSender {
    /// Enqueue a notification without waiting.
    ///
    /// Returns `false` once the receiving side has been dropped.
    pub fn push(&self, notification: ChangeNotification) -> bool {
        self.0.send(notification).is_ok()
    }
}

#[derive(Debug)]
pub struct EventReceiver(mpsc::UnboundedReceiver<ChangeNotification>);
impl EventReceiver {
    /// Number of notifications waiting to be processed.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take the oldest pending notification, if any.
    pub fn pop(&mut self) -> Option<ChangeNotification> {
        self.0.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::dbus::fake::owned;

    fn notification(interface: &str, status: &str) -> ChangeNotification {
        ChangeNotification::new(
            interface.to_owned(),
            OwnedObjectPath::try_from("/org/bluez/hci0/dev_00_11_22_33_44_55/player0").unwrap(),
            HashMap::from([("Status".to_owned(), owned(status))]),
        )
    }

    #[test]
    fn notifications_are_tagged() {
        assert_eq!(
            notification("org.bluez.MediaPlayer1", "playing").interface,
            Interface::Player
        );
        let unknown = notification("org.bluez.Battery1", "playing");
        assert_eq!(unknown.interface, Interface::Unknown);
        assert_eq!(unknown.interface_name, "org.bluez.Battery1");
    }

    #[test]
    fn drain_keeps_arrival_order() {
        let (sender, mut receiver) = event_queue();
        for status in ["playing", "paused", "stopped"] {
            assert!(sender.push(notification("org.bluez.MediaPlayer1", status)));
        }
        assert_eq!(receiver.len(), 3);
        let drained: Vec<_> = std::iter::from_fn(|| receiver.pop())
            .map(|n| crate::utils::extract_str(&n.fields["Status"]).unwrap().to_string())
            .collect();
        assert_eq!(drained, ["playing", "paused", "stopped"]);
        assert!(receiver.is_empty());
    }

    #[test]
    fn push_fails_without_receiver() {
        let (sender, receiver) = event_queue();
        drop(receiver);
        assert!(!sender.push(notification("org.bluez.Device1", "playing")));
    }
}
