//! # Identity Resolver
//!
//! Creation is asynchronous on the provisioning API: a successful `add`
//! returns no body, only a `location` header pointing at the new object.
//! [`resolve`] turns that pointer into the [`ExternalId`] the record keeps
//! for every later pass.

use crate::response::ApiResponse;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Base used to parse relative `location` values such as `/connections/abc`.
const RELATIVE_BASE: &str = "http://location.invalid/";

/// Opaque identifier of a remote object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalId(String);

impl ExternalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExternalId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ExternalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityDecodeError {
    #[error("response has no location header")]
    MissingLocation,
    #[error("location {location:?} is not a valid reference: {source}")]
    Unparseable {
        location: String,
        #[source]
        source: url::ParseError,
    },
    #[error("location {location:?} has no identifier segment")]
    EmptyIdentifier { location: String },
}

/// Extracts the identifier (last non-empty path segment) from the `location`
/// header of a successful creation response.
pub fn resolve(response: &ApiResponse) -> Result<ExternalId, IdentityDecodeError> {
    let location = response
        .location()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or(IdentityDecodeError::MissingLocation)?;

    let url = parse_reference(location).map_err(|source| IdentityDecodeError::Unparseable {
        location: location.to_string(),
        source,
    })?;

    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(ExternalId::from)
        .ok_or_else(|| IdentityDecodeError::EmptyIdentifier {
            location: location.to_string(),
        })
}

fn parse_reference(location: &str) -> Result<Url, url::ParseError> {
    match Url::parse(location) {
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_BASE)?.join(location),
        other => other,
    }
}
