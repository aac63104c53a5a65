//! # Adapters
//!
//! Implementations of the outbound ports plus the commit event registry.

pub mod deliver;
pub mod event_hub;
pub mod http;
pub mod identity_store;
pub mod mock;

pub use deliver::{CommitFeed, CommitFeedConfig};
pub use event_hub::{CommitEventHub, CommitNotification, CommitSubscription, HubStats};
pub use http::{HttpOrderingClient, HttpPeerClient};
pub use identity_store::FileIdentityStore;
pub use mock::{MockOrderer, MockPeer, OrdererScript, PeerScript};
