//! # Connection Registry
//!
//! Live connections, their principals and their channel memberships.
//!
//! Three maps are kept in step: connections by id, connection ids by user,
//! and connection ids by channel. Index updates go through the `DashMap`
//! entry API so a concurrent admit and remove on the same key serialize on
//! that entry and cannot lose each other's update.

use crate::channel::{channels_for, Channel};
use crate::errors::{DeliveryFailure, RegistryError};
use crate::message::Frame;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use shared_types::{ConnectionId, IdentityResolver, Principal, UserId};
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Default outbound queue length per connection.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Public view of one live connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub principal: Principal,
    pub channels: Vec<Channel>,
    pub connected_at: DateTime<Utc>,
}

/// Handed to the transport after a successful admit.
///
/// Dropping every sender for a connection (remove, force-disconnect) closes
/// `receiver`, which is how the transport learns it must hang up.
#[derive(Debug)]
pub struct Admission {
    pub info: ConnectionInfo,
    pub receiver: mpsc::Receiver<Frame>,
}

/// Registry operations used by the transport, the fan-out and admin routes.
pub trait ConnectionRegistry: Send + Sync {
    /// Record a connection for an already authenticated principal.
    fn admit(&self, principal: Principal, queue_capacity: usize) -> Admission;

    /// Drop a connection. Idempotent: only the first call returns `Some`.
    fn remove(&self, id: &ConnectionId) -> Option<ConnectionInfo>;

    fn connection(&self, id: &ConnectionId) -> Option<ConnectionInfo>;

    fn connections_for_user(&self, user_id: &UserId) -> Vec<ConnectionId>;

    fn channels_for(&self, id: &ConnectionId) -> Vec<Channel>;

    fn members_of(&self, channel: &Channel) -> Vec<ConnectionId>;

    fn all_connections(&self) -> Vec<ConnectionId>;

    /// Non-blocking hand-off into the connection's outbound queue.
    fn deliver(&self, id: &ConnectionId, frame: Frame) -> Result<(), DeliveryFailure>;

    fn is_online(&self, user_id: &UserId) -> bool {
        !self.connections_for_user(user_id).is_empty()
    }

    fn connection_count(&self) -> usize;

    /// Live connections per role name.
    fn count_by_role(&self) -> BTreeMap<String, usize>;

    /// Live verifier and admin connections per country code. Contributors
    /// are not counted.
    fn count_by_country(&self) -> BTreeMap<String, usize>;

    /// Remove every connection of a user; returns how many were closed.
    fn force_disconnect_user(&self, user_id: &UserId) -> usize {
        let ids = self.connections_for_user(user_id);
        let closed = ids.iter().filter(|id| self.remove(id).is_some()).count();
        if closed > 0 {
            info!(user_id = %user_id, closed, "Force-disconnected user");
        }
        closed
    }
}

/// Resolve `credential` and admit the principal it names.
///
/// Unknown or inactive users are refused before anything is recorded.
pub async fn authenticate_and_admit<R>(
    registry: &R,
    resolver: &dyn IdentityResolver,
    credential: &str,
    queue_capacity: usize,
) -> Result<Admission, RegistryError>
where
    R: ConnectionRegistry + ?Sized,
{
    let principal = resolver.authenticate(credential).await.map_err(|e| {
        warn!(error = %e, "Connection refused");
        RegistryError::from(e)
    })?;
    Ok(registry.admit(principal, queue_capacity))
}

struct Connection {
    info: ConnectionInfo,
    sender: mpsc::Sender<Frame>,
}

/// `DashMap`-backed registry for a single process.
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    connections: DashMap<ConnectionId, Connection>,
    by_user: DashMap<UserId, HashSet<ConnectionId>>,
    by_channel: DashMap<Channel, HashSet<ConnectionId>>,
}

fn index_insert<K: Eq + Hash>(map: &DashMap<K, HashSet<ConnectionId>>, key: K, id: ConnectionId) {
    map.entry(key).or_default().insert(id);
}

fn index_remove<K: Eq + Hash>(map: &DashMap<K, HashSet<ConnectionId>>, key: K, id: &ConnectionId) {
    if let Entry::Occupied(mut entry) = map.entry(key) {
        entry.get_mut().remove(id);
        if entry.get().is_empty() {
            entry.remove();
        }
    }
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn count_by<F>(&self, key: F) -> BTreeMap<String, usize>
    where
        F: Fn(&Principal) -> Option<String>,
    {
        let mut counts = BTreeMap::new();
        for conn in self.connections.iter() {
            if let Some(k) = key(&conn.info.principal) {
                *counts.entry(k).or_default() += 1;
            }
        }
        counts
    }
}

impl ConnectionRegistry for InMemoryConnectionRegistry {
    fn admit(&self, principal: Principal, queue_capacity: usize) -> Admission {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let id = ConnectionId::new();
        let channels = channels_for(&principal);
        let info = ConnectionInfo {
            id,
            principal,
            channels,
            connected_at: Utc::now(),
        };

        // Primary record first so a connection visible in an index always
        // resolves.
        self.connections.insert(
            id,
            Connection {
                info: info.clone(),
                sender,
            },
        );
        index_insert(&self.by_user, info.principal.user_id.clone(), id);
        for channel in &info.channels {
            index_insert(&self.by_channel, channel.clone(), id);
        }

        debug!(
            connection_id = %id,
            user_id = %info.principal.user_id,
            role = %info.principal.role,
            "Connection admitted"
        );
        Admission { info, receiver }
    }

    fn remove(&self, id: &ConnectionId) -> Option<ConnectionInfo> {
        let (_, conn) = self.connections.remove(id)?;
        index_remove(&self.by_user, conn.info.principal.user_id.clone(), id);
        for channel in &conn.info.channels {
            index_remove(&self.by_channel, channel.clone(), id);
        }
        debug!(connection_id = %id, user_id = %conn.info.principal.user_id, "Connection removed");
        Some(conn.info)
    }

    fn connection(&self, id: &ConnectionId) -> Option<ConnectionInfo> {
        self.connections.get(id).map(|c| c.info.clone())
    }

    fn connections_for_user(&self, user_id: &UserId) -> Vec<ConnectionId> {
        self.by_user
            .get(user_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    fn channels_for(&self, id: &ConnectionId) -> Vec<Channel> {
        self.connections
            .get(id)
            .map(|c| c.info.channels.clone())
            .unwrap_or_default()
    }

    fn members_of(&self, channel: &Channel) -> Vec<ConnectionId> {
        self.by_channel
            .get(channel)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    fn all_connections(&self) -> Vec<ConnectionId> {
        self.connections.iter().map(|c| *c.key()).collect()
    }

    fn deliver(&self, id: &ConnectionId, frame: Frame) -> Result<(), DeliveryFailure> {
        let conn = self
            .connections
            .get(id)
            .ok_or(DeliveryFailure::Unknown(*id))?;
        conn.sender.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryFailure::QueueFull(*id),
            mpsc::error::TrySendError::Closed(_) => DeliveryFailure::Closed(*id),
        })
    }

    fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn count_by_role(&self) -> BTreeMap<String, usize> {
        self.count_by(|p| Some(p.role.to_string()))
    }

    fn count_by_country(&self) -> BTreeMap<String, usize> {
        self.count_by(|p| p.role.is_country_scoped().then(|| p.country.to_string()))
    }
}
