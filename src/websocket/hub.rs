//! The hub owns connection membership and decides who receives what.
//!
//! Every register, unregister and dispatch is applied by one task, in the
//! order submitted, so fan-out never races a membership change.

use std::collections::{HashMap, hash_map::Entry};
use tokio::sync::{mpsc, oneshot};

use crate::{
    models::{
        client::{ClientStats, OnlineUser},
        message::Envelope,
    },
    websocket::{
        connection::{ClientHandle, ConnectionId},
        presence,
    },
};

pub const HUB_QUEUE_CAPACITY: usize = 256;

enum HubCommand {
    Register(ClientHandle),
    Unregister(ConnectionId),
    Dispatch(Envelope),
    Disconnect(ConnectionId, oneshot::Sender<bool>),
    OnlineUsers(oneshot::Sender<Vec<OnlineUser>>),
    Connections(oneshot::Sender<Vec<ClientStats>>),
}

/// Handle to the dispatch loop. Cloning it is cheap; the loop lives as long
/// as any handle does.
#[derive(Clone)]
pub struct Hub {
    commands: mpsc::Sender<HubCommand>,
}

impl Hub {
    /// Starts the dispatch loop. `capacity` bounds the submission queue, so
    /// submitters wait when the loop falls behind.
    pub fn spawn(capacity: usize) -> Self {
        let (commands, rx) = mpsc::channel(capacity);
        tokio::spawn(Registry::default().run(rx));
        Self { commands }
    }

    pub async fn register(&self, client: ClientHandle) {
        self.submit(HubCommand::Register(client)).await;
    }

    pub async fn unregister(&self, id: ConnectionId) {
        self.submit(HubCommand::Unregister(id)).await;
    }

    pub async fn dispatch(&self, envelope: Envelope) {
        self.submit(HubCommand::Dispatch(envelope)).await;
    }

    /// Evicts a connection on request. Returns whether it was registered.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let (tx, rx) = oneshot::channel();
        self.submit(HubCommand::Disconnect(id, tx)).await;
        rx.await.unwrap_or(false)
    }

    pub async fn online_users(&self) -> Vec<OnlineUser> {
        let (tx, rx) = oneshot::channel();
        self.submit(HubCommand::OnlineUsers(tx)).await;
        rx.await.unwrap_or_default()
    }

    pub async fn connections(&self) -> Vec<ClientStats> {
        let (tx, rx) = oneshot::channel();
        self.submit(HubCommand::Connections(tx)).await;
        rx.await.unwrap_or_default()
    }

    async fn submit(&self, command: HubCommand) {
        if self.commands.send(command).await.is_err() {
            tracing::error!("hub dispatch loop is not running");
        }
    }
}

/// Live connections keyed by connection id. Only the dispatch loop touches it.
#[derive(Default)]
struct Registry {
    clients: HashMap<ConnectionId, ClientHandle>,
}

impl Registry {
    async fn run(mut self, mut rx: mpsc::Receiver<HubCommand>) {
        tracing::info!("hub dispatch loop started");
        while let Some(command) = rx.recv().await {
            self.apply(command);
        }
        tracing::info!("hub dispatch loop stopped");
    }

    fn apply(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register(client) => {
                if self.register(client) {
                    self.broadcast_presence();
                }
            }
            HubCommand::Unregister(id) => {
                if self.unregister(&id) {
                    self.broadcast_presence();
                }
            }
            HubCommand::Dispatch(envelope) => {
                if self.dispatch(&envelope) > 0 {
                    self.broadcast_presence();
                }
            }
            HubCommand::Disconnect(id, reply) => {
                let removed = self.unregister(&id);
                if removed {
                    self.broadcast_presence();
                }
                let _ = reply.send(removed);
            }
            HubCommand::OnlineUsers(reply) => {
                let _ = reply.send(self.online_users());
            }
            HubCommand::Connections(reply) => {
                let _ = reply.send(self.connections());
            }
        }
    }

    fn register(&mut self, client: ClientHandle) -> bool {
        let total = self.clients.len() + 1;
        match self.clients.entry(client.id.clone()) {
            Entry::Occupied(_) => {
                tracing::debug!(connection_id = %client.id, "connection already registered");
                false
            }
            Entry::Vacant(slot) => {
                tracing::info!(
                    connection_id = %client.id,
                    user_id = %client.user_id,
                    username = %client.username,
                    total,
                    "client registered"
                );
                slot.insert(client);
                true
            }
        }
    }

    /// Dropping the removed handle closes the connection's outbound queue.
    fn unregister(&mut self, id: &ConnectionId) -> bool {
        match self.clients.remove(id) {
            Some(client) => {
                tracing::info!(
                    connection_id = %client.id,
                    user_id = %client.user_id,
                    total = self.clients.len(),
                    "client unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Queues the envelope on every target without waiting. Targets whose
    /// queue is full or closed are evicted; returns how many were.
    fn dispatch(&mut self, envelope: &Envelope) -> usize {
        if envelope.payload.is_empty() {
            tracing::warn!(kind = envelope.kind.as_str(), "dropping envelope without payload");
            return 0;
        }

        let mut dead = Vec::new();

        for client in self.clients.values() {
            if !is_target(client, envelope) {
                continue;
            }
            if let Err(e) = client.try_send(envelope.payload.clone()) {
                tracing::warn!(
                    connection_id = %client.id,
                    user_id = %client.user_id,
                    kind = envelope.kind.as_str(),
                    reason = %e,
                    "evicting connection that cannot take more messages"
                );
                dead.push(client.id.clone());
            }
        }

        for id in &dead {
            self.clients.remove(id);
        }
        dead.len()
    }

    /// Sends the current roster to everyone, repeating while the broadcast
    /// itself evicts connections so the last roster sent is accurate.
    fn broadcast_presence(&mut self) {
        loop {
            let envelope = Envelope::online_users(&self.online_users());
            if self.dispatch(&envelope) == 0 {
                break;
            }
        }
    }

    fn online_users(&self) -> Vec<OnlineUser> {
        presence::roster(self.clients.values())
    }

    fn connections(&self) -> Vec<ClientStats> {
        let mut stats: Vec<ClientStats> = self
            .clients
            .values()
            .map(|client| ClientStats {
                id: client.id.clone(),
                user_id: client.user_id,
                username: client.username.clone(),
                ip: client.ip,
                user_agent: client.user_agent.clone(),
                connected_at: client.connected_at,
            })
            .collect();
        stats.sort_by_key(|c| c.connected_at);
        stats
    }
}

/// Directed envelopes reach the receiver's and the sender's connections;
/// broadcasts reach everyone but the sender.
fn is_target(client: &ClientHandle, envelope: &Envelope) -> bool {
    let own = envelope.sender_id == Some(client.user_id);
    match envelope.receiver_id {
        Some(receiver_id) => client.user_id == receiver_id || own,
        None => !own,
    }
}
