//! # Pureport Resource Kinds
//!
//! Each kind pairs a declarative schema with a remote model and the pure
//! mappers between them:
//!
//! | Kind | Remote object | Lifecycle |
//! |------|---------------|-----------|
//! | [`AccountResource`] | [`Account`](crate::model::Account) | read-only |
//! | [`AccountsDataSource`] | list of accounts | read-only |
//! | [`NetworkResource`] | [`Network`](crate::model::Network) | managed |
//! | [`GoogleCloudConnectionResource`] | [`Connection`](crate::model::Connection) | managed |
//! | [`AwsConnectionResource`] | [`Connection`](crate::model::Connection) | managed |
//! | [`AzureConnectionResource`] | [`Connection`](crate::model::Connection) | managed |
//!
//! Mappers read optional fields only when explicitly configured
//! ([`ResourceData::is_set`]), never by comparing against a zero value.

pub mod account;
pub mod accounts;
pub mod aws;
pub mod azure;
pub mod connection;
pub mod google_cloud;
pub mod network;

pub use account::AccountResource;
pub use accounts::AccountsDataSource;
pub use aws::AwsConnectionResource;
pub use azure::AzureConnectionResource;
pub use google_cloud::GoogleCloudConnectionResource;
pub use network::NetworkResource;

use reconcile_framework::record::{Field, FieldError, ResourceData, Value};

/// Sub-fields of a singleton `{id, href}` reference.
pub(crate) const LINK_FIELDS: &[Field] = &[
    Field::string("id").required(),
    Field::string("href").required(),
];

/// Writes `value` to the state layer, or removes the field when the remote
/// object does not carry it.
pub(crate) fn set_optional<V: Into<Value>>(
    data: &mut ResourceData,
    name: &str,
    value: Option<V>,
) -> Result<(), FieldError> {
    match value {
        Some(value) => data.set(name, value),
        None => {
            data.unset(name);
            Ok(())
        }
    }
}

/// A configured string, only when explicitly set.
pub(crate) fn configured_str(data: &ResourceData, name: &str) -> Option<String> {
    data.get_set(name)
        .and_then(Value::as_str)
        .map(str::to_string)
}
