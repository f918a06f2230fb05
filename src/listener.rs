use anyhow::{Context as _, Result};
use futures_lite::{Stream, StreamExt as _};
use tokio::task::{spawn, JoinHandle};
use tracing::instrument;
use zbus::{
    message::Type, zvariant::OwnedObjectPath, Connection, MatchRule, Message, MessageStream,
};

use crate::{
    dbus::{Properties, BLUEZ_ROOT_PATH, PROPERTIES_INTERFACE},
    queue::{ChangeNotification, EventSender},
};

/// Subscribe to every `PropertiesChanged` signal emitted under `/org/bluez`.
pub async fn subscribe(conn: &Connection) -> Result<MessageStream> {
    let rule = MatchRule::builder()
        .msg_type(Type::Signal)
        .interface(PROPERTIES_INTERFACE)?
        .member("PropertiesChanged")?
        .path_namespace(BLUEZ_ROOT_PATH)?
        .build();
    MessageStream::for_match_rule(rule, conn, None)
        .await
        .context("Failed to listen for PropertiesChanged signal on DBus")
}

/// Unpack a `PropertiesChanged(s interface, a{sv} changed, as invalidated)` signal.
fn parse_signal(msg: &Message) -> Result<ChangeNotification> {
    let header = msg.header();
    let path = header
        .path()
        .context("PropertiesChanged signal carries no object path")?;
    let (interface_name, changed, _invalidated): (String, Properties, Vec<String>) = msg
        .body()
        .deserialize()
        .context("Failed to parse PropertiesChanged arguments")?;
    Ok(ChangeNotification::new(
        interface_name,
        OwnedObjectPath::from(path.clone()),
        changed,
    ))
}

/// Forward every signal of `signals` onto the queue until either side closes.
#[instrument(skip_all)]
pub async fn listen<S>(mut signals: S, queue: EventSender)
where
    S: Stream<Item = zbus::Result<Message>> + Unpin,
{
    while let Some(msg) = signals.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(?e, "Failed to receive PropertiesChanged signal");
                continue;
            }
        };
        let Ok(notification) = parse_signal(&msg)
            .inspect_err(|e| tracing::warn!(?e, "Malformed PropertiesChanged signal"))
        else {
            continue;
        };
        tracing::trace!(
            path = %notification.path,
            interface = %notification.interface_name,
            "Property change queued"
        );
        if !queue.push(notification) {
            tracing::debug!("Notification queue closed, stopping listener");
            return;
        }
    }
    tracing::error!("DBus PropertiesChanged stream closed");
}

/// Run [`listen`] on its own task. The handle may be dropped to abandon it.
pub fn spawn_listener(signals: MessageStream, queue: EventSender) -> JoinHandle<()> {
    spawn(listen(signals, queue))
}
