//! # Resource Driver
//!
//! The lifecycle state machine the declarative engine calls for each
//! resource instance. One generic driver serves every kind; the kind supplies
//! the mappers and the client supplies the transport.
//!
//! ```text
//!  Absent ──create──▶ Present ──update──▶ Present
//!    ▲                  │  │
//!    │◀──── delete ─────┘  │
//!    └──── read (404) ─────┘
//! ```
//!
//! Failure handling is asymmetric:
//!
//! - A remote failure on **Create** leaves the record `Absent` and is not an
//!   error; the engine simply sees nothing was created.
//! - **Read** treats `NotFound` as the object having been removed out of band.
//! - Every other remote failure on Read, Update or Delete propagates, and the
//!   identifier is never cleared by a failed Update.

use crate::client::{ManagedClient, RemoteClient};
use crate::error::{MapError, NormalizedError, Operation, ReconcileError};
use crate::identity::{self, ExternalId};
use crate::kind::{ManagedKind, ResourceKind};
use crate::normalize::{check, check_status};
use crate::record::ResourceData;
use std::marker::PhantomData;
use tracing::{debug, info, instrument, warn, Span};

pub struct ResourceDriver<K, C> {
    client: C,
    _kind: PhantomData<fn() -> K>,
}

impl<K, C: Clone> Clone for ResourceDriver<K, C> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone())
    }
}

impl<K, C> ResourceDriver<K, C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

fn remote_error<K: ResourceKind>(operation: Operation, source: NormalizedError) -> ReconcileError {
    warn!(
        status = ?source.status_code,
        code = ?source.remote_code,
        message = ?source.remote_message,
        error = %source,
        "{} failed",
        operation
    );
    ReconcileError::Remote {
        kind: K::KIND,
        operation,
        source,
    }
}

fn mapping_error<K: ResourceKind>(
    operation: Operation,
) -> impl FnOnce(MapError) -> ReconcileError {
    move |source| ReconcileError::Mapping {
        kind: K::KIND,
        operation,
        source,
    }
}

fn require_id<K: ResourceKind>(
    data: &ResourceData,
    operation: Operation,
) -> Result<ExternalId, ReconcileError> {
    let id = data
        .id()
        .cloned()
        .ok_or(ReconcileError::MissingIdentifier {
            kind: K::KIND,
            operation,
        })?;
    Span::current().record("id", id.as_str());
    Ok(id)
}

impl<K, C> ResourceDriver<K, C>
where
    K: ResourceKind,
    C: RemoteClient<K>,
{
    /// Refreshes the state layer from the remote object.
    ///
    /// The record is only modified once the whole object flattened cleanly.
    #[instrument(name = "read", skip_all, fields(kind = K::KIND, id = tracing::field::Empty))]
    pub async fn read(&self, data: &mut ResourceData) -> Result<(), ReconcileError> {
        let id = require_id::<K>(data, Operation::Read)?;

        let object = match check(self.client.get(id.as_str()).await) {
            Ok(Some(object)) => object,
            Ok(None) => {
                return Err(ReconcileError::EmptyResponse {
                    kind: K::KIND,
                    operation: Operation::Read,
                })
            }
            Err(err) if err.is_not_found() => {
                info!("Remote object is gone, clearing identifier");
                data.clear_id();
                return Ok(());
            }
            Err(err) => return Err(remote_error::<K>(Operation::Read, err)),
        };
        debug!(?object, "Fetched");

        let mut scratch = data.clone();
        K::flatten(&object, &mut scratch).map_err(mapping_error::<K>(Operation::Read))?;
        *data = scratch;
        Ok(())
    }
}

impl<K, C> ResourceDriver<K, C>
where
    K: ManagedKind,
    C: ManagedClient<K>,
{
    /// Creates the remote object and populates the record from it.
    ///
    /// Local mapping errors are returned. A rejected or failed `add` is logged
    /// and leaves the record absent.
    #[instrument(name = "create", skip_all, fields(kind = K::KIND, id = tracing::field::Empty))]
    pub async fn create(&self, data: &mut ResourceData) -> Result<(), ReconcileError> {
        if let Some(id) = data.id() {
            return Err(ReconcileError::AlreadyPresent {
                kind: K::KIND,
                operation: Operation::Create,
                id: id.to_string(),
            });
        }

        let parent_id = K::parent_id(data)
            .map_err(|e| mapping_error::<K>(Operation::Create)(e.into()))?;
        let body = K::expand(data).map_err(mapping_error::<K>(Operation::Create))?;
        debug!(%parent_id, ?body, "Adding");

        let response = match check_status(self.client.add(&parent_id, &body).await) {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    status = ?err.status_code,
                    code = ?err.remote_code,
                    message = ?err.remote_message,
                    error = %err,
                    "Create did not succeed, resource stays absent"
                );
                data.clear_id();
                return Ok(());
            }
        };

        let id = identity::resolve(&response).map_err(|source| ReconcileError::IdentityDecode {
            kind: K::KIND,
            source,
        })?;
        Span::current().record("id", id.as_str());
        info!("Created");
        data.set_id(id);

        self.read(data).await
    }

    /// Pushes changed mutable fields to the remote object.
    ///
    /// The request always carries the full field set from the merged record.
    /// A changed force-new field is refused before any remote call.
    #[instrument(name = "update", skip_all, fields(kind = K::KIND, id = tracing::field::Empty))]
    pub async fn update(&self, data: &mut ResourceData) -> Result<(), ReconcileError> {
        let id = require_id::<K>(data, Operation::Update)?;

        if let Some(field) = K::schema()
            .force_new_fields()
            .find(|f| data.state().contains_key(f.name) && data.has_change(f.name))
        {
            return Err(ReconcileError::RequiresReplacement {
                kind: K::KIND,
                field: field.name.to_string(),
            });
        }

        let changed: Vec<&str> = K::MUTABLE_FIELDS
            .iter()
            .copied()
            .filter(|f| data.has_change(f))
            .collect();
        if changed.is_empty() {
            debug!("No in-place changes");
            return self.read(data).await;
        }

        let body = K::expand(data).map_err(mapping_error::<K>(Operation::Update))?;
        debug!(?changed, ?body, "Updating");
        check(self.client.update(id.as_str(), &body).await)
            .map_err(|err| remote_error::<K>(Operation::Update, err))?;
        info!(?changed, "Updated");

        self.read(data).await
    }

    #[instrument(name = "delete", skip_all, fields(kind = K::KIND, id = tracing::field::Empty))]
    pub async fn delete(&self, data: &mut ResourceData) -> Result<(), ReconcileError> {
        let id = require_id::<K>(data, Operation::Delete)?;

        check_status(self.client.delete(id.as_str()).await)
            .map_err(|err| remote_error::<K>(Operation::Delete, err))?;
        info!("Deleted");
        data.clear_id();
        Ok(())
    }
}
