//! Remote object models of the Pureport provisioning API.
//!
//! These are the nested JSON shapes the API exchanges. The declarative,
//! flat view of the same objects lives in [`crate::resources`].

pub mod account;
pub mod connection;
pub mod link;
pub mod network;

pub use account::Account;
pub use connection::{
    Connection, ConnectionBase, ConnectionType, CustomerNetwork, NatConfig, NatMapping,
};
pub use link::Link;
pub use network::Network;
