//! # Resource Kinds
//!
//! A resource kind ties together a declarative [`Schema`], the remote object
//! model, and the pure mappers between them. Kinds are zero-sized markers;
//! the driver is generic over them.
//!
//! - [`ResourceKind`] is enough for read-only kinds and data sources:
//!   the remote object can be flattened and listed.
//! - [`ManagedKind`] adds what Create and Update need: a request body built by
//!   `expand`, the parent scope for `add`, and the fields that may change in
//!   place.

use crate::error::MapError;
use crate::record::{FieldError, Fields, ResourceData, Schema};
use serde::Serialize;
use std::fmt::Debug;

pub trait ResourceKind: Send + Sync + 'static {
    /// Name used in logs and errors, e.g. `pureport_network`.
    const KIND: &'static str;

    /// The nested remote representation.
    type Object: Clone + Debug + Send + Sync + Serialize + 'static;

    fn schema() -> &'static Schema;

    /// Writes every declarative field of `object` into the state layer of
    /// `data`. Must not touch the identifier.
    fn flatten(object: &Self::Object, data: &mut ResourceData) -> Result<(), MapError>;

    fn object_id(object: &Self::Object) -> Option<&str>;

    fn object_name(object: &Self::Object) -> Option<&str>;

    /// Entry rendered for this object by a list data source.
    fn list_entry(object: &Self::Object) -> Fields;
}

pub trait ManagedKind: ResourceKind {
    /// Request body for `add` and `update`.
    type Body: Clone + Debug + Send + Sync + Serialize + 'static;

    /// Fields an Update may change without replacing the remote object.
    const MUTABLE_FIELDS: &'static [&'static str];

    /// Identifier of the scope the object is created under.
    fn parent_id(data: &ResourceData) -> Result<String, FieldError>;

    /// Builds a full request body from the record. Optional fields are read
    /// only when explicitly set.
    fn expand(data: &ResourceData) -> Result<Self::Body, MapError>;
}
