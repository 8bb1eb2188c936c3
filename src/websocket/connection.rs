use axum::{
    body::Bytes,
    extract::ws::{Message as WsMessage, WebSocket},
};
use chrono::{DateTime, Utc};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::{fmt::Display, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{
    sync::mpsc,
    time::{Instant, MissedTickBehavior, interval_at, timeout, timeout_at},
};
use uuid::Uuid;

use crate::{
    models::{
        auth::Identity,
        chat::StoredMessage,
        message::{Envelope, InboundFrame, MessageKind},
    },
    store::MessageStore,
    websocket::hub::Hub,
};

const WRITE_WAIT: Duration = Duration::from_secs(10);
const PONG_WAIT: Duration = Duration::from_secs(60);
// Must stay below PONG_WAIT so the peer's pong lands before its read deadline.
const PING_PERIOD: Duration = Duration::from_secs(54);
const MAX_MESSAGE_SIZE: usize = 512 * 1024;
const SEND_QUEUE_CAPACITY: usize = 256;

pub type ConnectionId = Arc<str>;

/// Timing and size limits applied to every connection.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionLimits {
    pub write_wait: Duration,
    pub pong_wait: Duration,
    pub ping_period: Duration,
    pub max_message_size: usize,
    pub send_queue_capacity: usize,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            write_wait: WRITE_WAIT,
            pong_wait: PONG_WAIT,
            ping_period: PING_PERIOD,
            max_message_size: MAX_MESSAGE_SIZE,
            send_queue_capacity: SEND_QUEUE_CAPACITY,
        }
    }
}

/// The hub's view of a connection. The hub holds the only sender of the
/// connection's outbound queue, so dropping the handle closes the queue.
#[derive(Debug)]
pub struct ClientHandle {
    pub id: ConnectionId,
    pub user_id: Uuid,
    pub username: String,
    pub ip: Option<SocketAddr>,
    pub user_agent: Option<String>,
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<Arc<str>>,
}

impl ClientHandle {
    pub fn new(id: ConnectionId, identity: &Identity, sender: mpsc::Sender<Arc<str>>) -> Self {
        Self {
            id,
            user_id: identity.user_id,
            username: identity.username.clone(),
            ip: None,
            user_agent: None,
            connected_at: Utc::now(),
            sender,
        }
    }

    pub fn with_peer(mut self, ip: Option<SocketAddr>, user_agent: Option<String>) -> Self {
        self.ip = ip;
        self.user_agent = user_agent;
        self
    }

    pub(crate) fn try_send(
        &self,
        payload: Arc<str>,
    ) -> Result<(), mpsc::error::TrySendError<Arc<str>>> {
        self.sender.try_send(payload)
    }
}

/// What the inbound side of one connection acts with.
#[derive(Clone)]
pub struct Session {
    pub id: ConnectionId,
    pub identity: Identity,
    pub hub: Hub,
    pub store: Arc<dyn MessageStore>,
}

impl Session {
    pub fn new(
        id: ConnectionId,
        identity: Identity,
        hub: Hub,
        store: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            id,
            identity,
            hub,
            store,
        }
    }

    /// Decodes one peer frame and submits the resulting envelope to the hub.
    /// Frames that fail to decode are skipped.
    pub async fn handle_frame(&self, bytes: &[u8]) {
        let frame: InboundFrame = match serde_json::from_slice(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(
                    connection_id = %self.id,
                    error = %e,
                    "discarding undecodable frame"
                );
                return;
            }
        };

        let sender_id = self.identity.user_id;
        let envelope = match frame.kind {
            MessageKind::Typing | MessageKind::TypingStop => {
                let Some(receiver_id) = frame.receiver_id else {
                    tracing::debug!(connection_id = %self.id, "typing signal without receiver");
                    return;
                };
                Envelope::typing(
                    frame.kind,
                    sender_id,
                    receiver_id,
                    &self.identity.username,
                    Utc::now(),
                )
            }
            MessageKind::Chat => {
                let message = match self
                    .store
                    .append(sender_id, frame.receiver_id, &frame.content)
                    .await
                {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::warn!(
                            user_id = %sender_id,
                            error = %e,
                            "failed to persist chat message, delivering anyway"
                        );
                        StoredMessage::unsaved(sender_id, frame.receiver_id, frame.content)
                    }
                };
                Envelope::chat(&message, &self.identity.username)
            }
            MessageKind::OnlineUsers | MessageKind::Unknown => {
                tracing::debug!(connection_id = %self.id, kind = frame.kind.as_str(), "ignoring frame");
                return;
            }
        };

        self.hub.dispatch(envelope).await;
    }
}

/// Runs a freshly upgraded socket until either side of it stops, then
/// unregisters it from the hub. This is the only teardown path.
pub async fn serve(
    socket: WebSocket,
    session: Session,
    ip: Option<SocketAddr>,
    user_agent: Option<String>,
    limits: ConnectionLimits,
) {
    let (tx, rx) = mpsc::channel(limits.send_queue_capacity);
    let client = ClientHandle::new(session.id.clone(), &session.identity, tx).with_peer(ip, user_agent);

    let hub = session.hub.clone();
    let id = session.id.clone();
    let user_id = session.identity.user_id;
    hub.register(client).await;
    tracing::info!(connection_id = %id, user_id = %user_id, "websocket connected");

    let (ws_sender, ws_receiver) = socket.split();
    let mut send_task = tokio::spawn(write_pump(ws_sender, rx, limits));
    let mut recv_task = tokio::spawn(read_pump(ws_receiver, session, limits));

    // A finished reader leaves the writer running: it sends the close frame
    // once the hub drops the queue during unregister.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => {}
    }

    hub.unregister(id.clone()).await;
    tracing::info!(connection_id = %id, user_id = %user_id, "websocket disconnected");
}

/// Inbound procedure: reads frames until an error, a close, an oversized
/// frame, or the idle deadline. Each pong pushes the deadline out.
pub async fn read_pump<S, E>(mut stream: S, session: Session, limits: ConnectionLimits)
where
    S: Stream<Item = Result<WsMessage, E>> + Unpin,
    E: Display,
{
    let mut deadline = Instant::now() + limits.pong_wait;

    loop {
        let frame = match timeout_at(deadline, stream.next()).await {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(e))) => {
                tracing::warn!(connection_id = %session.id, error = %e, "websocket read error");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                tracing::debug!(connection_id = %session.id, "read deadline exceeded");
                break;
            }
        };

        let bytes: &[u8] = match &frame {
            WsMessage::Text(text) => text.as_str().as_bytes(),
            WsMessage::Binary(data) => data.as_ref(),
            WsMessage::Pong(_) => {
                deadline = Instant::now() + limits.pong_wait;
                continue;
            }
            WsMessage::Ping(_) => continue,
            WsMessage::Close(reason) => {
                tracing::debug!(connection_id = %session.id, ?reason, "peer closed");
                break;
            }
        };

        if bytes.len() > limits.max_message_size {
            tracing::warn!(
                connection_id = %session.id,
                size = bytes.len(),
                "frame exceeds maximum message size"
            );
            break;
        }

        session.handle_frame(bytes).await;
    }
}

/// Outbound procedure: drains the queue onto the socket, coalescing whatever
/// is already queued, and pings on a fixed period. Returns on a failed or
/// late write, or after sending a close frame once the hub closes the queue.
pub async fn write_pump<K>(mut sink: K, mut queue: mpsc::Receiver<Arc<str>>, limits: ConnectionLimits)
where
    K: Sink<WsMessage> + Unpin,
    K::Error: Display,
{
    let mut ping = interval_at(Instant::now() + limits.ping_period, limits.ping_period);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            payload = queue.recv() => {
                let Some(payload) = payload else {
                    let _ = send_frame(&mut sink, WsMessage::Close(None), limits.write_wait).await;
                    return;
                };

                let mut frame = String::from(&*payload);
                for _ in 0..queue.len() {
                    match queue.try_recv() {
                        Ok(next) => {
                            frame.push('\n');
                            frame.push_str(&next);
                        }
                        Err(_) => break,
                    }
                }

                if !send_frame(&mut sink, WsMessage::Text(frame.into()), limits.write_wait).await {
                    return;
                }
            }
            _ = ping.tick() => {
                if !send_frame(&mut sink, WsMessage::Ping(Bytes::new()), limits.write_wait).await {
                    return;
                }
            }
        }
    }
}

async fn send_frame<K>(sink: &mut K, frame: WsMessage, write_wait: Duration) -> bool
where
    K: Sink<WsMessage> + Unpin,
    K::Error: Display,
{
    match timeout(write_wait, sink.send(frame)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "websocket write failed");
            false
        }
        Err(_) => {
            tracing::debug!("write deadline exceeded");
            false
        }
    }
}
