//! Channel handle: the peer set, the orderer and the commit registry.

use crate::adapters::CommitEventHub;
use crate::ports::{OrderingClient, PeerClient};
use std::fmt;
use std::sync::Arc;

/// One logical ledger partition. Built once at startup and shared.
#[derive(Clone)]
pub struct ChannelHandle {
    name: String,
    peers: Vec<Arc<dyn PeerClient>>,
    orderer: Arc<dyn OrderingClient>,
    events: Arc<CommitEventHub>,
}

impl ChannelHandle {
    pub fn new(
        name: impl Into<String>,
        peers: Vec<Arc<dyn PeerClient>>,
        orderer: Arc<dyn OrderingClient>,
        events: Arc<CommitEventHub>,
    ) -> Self {
        Self {
            name: name.into(),
            peers,
            orderer,
            events,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Peers in configured order. The first one decides fast failure.
    pub fn peers(&self) -> &[Arc<dyn PeerClient>] {
        &self.peers
    }

    pub fn peer_names(&self) -> Vec<String> {
        self.peers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn orderer(&self) -> &Arc<dyn OrderingClient> {
        &self.orderer
    }

    pub fn events(&self) -> &Arc<CommitEventHub> {
        &self.events
    }
}

impl fmt::Debug for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelHandle")
            .field("name", &self.name)
            .field("peers", &self.peer_names())
            .field("active_listeners", &self.events.active_count())
            .finish()
    }
}
