//! # Reconcile Framework
//!
//! A generic engine for reconciling declared resources against a remote
//! provisioning API. A declarative engine hands each resource instance to a
//! [`ResourceDriver`], which runs the Create, Read, Update or Delete lifecycle
//! step against a [`RemoteClient`] and keeps the persisted [`ExternalId`].
//!
//! ## Architecture Overview
//!
//! ```text
//! engine ──▶ ResourceDriver ──expand──▶ RemoteClient ──▶ ApiResponse
//!                 ▲                                        │
//!                 │          identity::resolve (create) ◀──┤
//!                 │          normalize (failure)       ◀───┘
//!                 └──flatten── remote object
//! ```
//!
//! 1. **Records** ([`record`]) hold the flat declarative view of a resource:
//!    the user's configuration and the last-read state, validated against a
//!    [`Schema`].
//! 2. **Kinds** ([`ResourceKind`], [`ManagedKind`]) pair a schema with a
//!    remote model and the pure `expand`/`flatten` mappers between them.
//! 3. **Clients** ([`RemoteClient`], [`ManagedClient`]) are the transport
//!    seam: a real HTTP client, the actor-backed [`simulator`], or the
//!    [`mock`].
//! 4. **Drivers** ([`ResourceDriver`]) run the lifecycle and decide which
//!    failures become state transitions and which surface as errors.
//! 5. **Lists** ([`list()`]) back list data sources.
//!
//! ## Error Model
//!
//! Remote failures are reduced by [`normalize()`] to three kinds:
//! transport failure, not found, and rejected. A `NotFound` Read clears the
//! identifier, and any remote failure on Create leaves the record absent.
//! Everything else becomes a [`ReconcileError`] naming the resource kind and
//! operation.
//!
//! ## Concurrency Model
//!
//! - Every driver call awaits its remote calls one after another.
//! - A driver only touches the record it is given, so independent records may
//!   be driven from separate tasks.
//! - The simulator processes requests **sequentially** in its own Tokio task,
//!   so its store needs no locks.
//!
//! ## Testing
//!
//! [`mock::MockRemote`] scripts responses and records request bodies for
//! driver-level tests. [`simulator::SimulatedApi`] serves a real in-memory
//! collection for end-to-end lifecycles.

pub mod client;
pub mod driver;
pub mod error;
pub mod identity;
pub mod kind;
pub mod list;
pub mod mock;
pub mod normalize;
pub mod record;
pub mod response;
pub mod simulator;
pub mod tracing;

pub use client::{ManagedClient, RemoteClient};
pub use driver::ResourceDriver;
pub use error::{ErrorKind, MapError, NormalizedError, Operation, ReconcileError};
pub use identity::{ExternalId, IdentityDecodeError};
pub use kind::{ManagedKind, ResourceKind};
pub use list::{list, ListView, NamePattern};
pub use normalize::normalize;
pub use record::{Field, FieldError, FieldType, Fields, Lifecycle, ResourceData, Schema, Value};
pub use response::{ApiResponse, CallResult, Reply, StatusResult, TransportError};
