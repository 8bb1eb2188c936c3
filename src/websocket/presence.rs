use std::collections::HashSet;

use crate::{models::client::OnlineUser, websocket::connection::ClientHandle};

/// Distinct users behind a set of connections, ordered by username then id.
/// A user with several open connections is listed once.
pub fn roster<'a>(clients: impl IntoIterator<Item = &'a ClientHandle>) -> Vec<OnlineUser> {
    let mut seen = HashSet::new();
    let mut users: Vec<OnlineUser> = clients
        .into_iter()
        .filter(|client| seen.insert(client.user_id))
        .map(|client| OnlineUser {
            id: client.user_id,
            username: client.username.clone(),
        })
        .collect();

    users.sort_by(|a, b| a.username.cmp(&b.username).then(a.id.cmp(&b.id)));
    users
}
