//! Cloud interconnect connections.
//!
//! The API discriminates connection subtypes with a `type` tag. Every subtype
//! shares [`ConnectionBase`] and adds its own provider-specific fields.

use super::Link;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerNetwork {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatMapping {
    pub native_cidr: String,
    /// Assigned by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nat_cidr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<NatMapping>,
    /// Assigned by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnat_cidr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionBase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Mbps.
    pub speed: u32,
    pub billing_term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_availability: Option<bool>,
    pub location: Link,
    pub network: Link,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customer_networks: Vec<CustomerNetwork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nat: Option<NatConfig>,
    /// Provisioning state reported by the API, e.g. `ACTIVE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    GoogleCloudInterconnect,
    AwsDirectConnect,
    AzureExpressRoute,
}

impl ConnectionType {
    /// The wire value of the `type` tag.
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionType::GoogleCloudInterconnect => "GOOGLE_CLOUD_INTERCONNECT",
            ConnectionType::AwsDirectConnect => "AWS_DIRECT_CONNECT",
            ConnectionType::AzureExpressRoute => "AZURE_EXPRESS_ROUTE",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Connection {
    #[serde(rename_all = "camelCase")]
    GoogleCloudInterconnect {
        #[serde(flatten)]
        base: ConnectionBase,
        primary_pairing_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secondary_pairing_key: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    AwsDirectConnect {
        #[serde(flatten)]
        base: ConnectionBase,
        aws_account_id: String,
        aws_region: String,
    },
    #[serde(rename_all = "camelCase")]
    AzureExpressRoute {
        #[serde(flatten)]
        base: ConnectionBase,
        service_key: String,
    },
}

impl Connection {
    pub fn connection_type(&self) -> ConnectionType {
        match self {
            Connection::GoogleCloudInterconnect { .. } => ConnectionType::GoogleCloudInterconnect,
            Connection::AwsDirectConnect { .. } => ConnectionType::AwsDirectConnect,
            Connection::AzureExpressRoute { .. } => ConnectionType::AzureExpressRoute,
        }
    }

    pub fn base(&self) -> &ConnectionBase {
        match self {
            Connection::GoogleCloudInterconnect { base, .. }
            | Connection::AwsDirectConnect { base, .. }
            | Connection::AzureExpressRoute { base, .. } => base,
        }
    }

    pub fn base_mut(&mut self) -> &mut ConnectionBase {
        match self {
            Connection::GoogleCloudInterconnect { base, .. }
            | Connection::AwsDirectConnect { base, .. }
            | Connection::AzureExpressRoute { base, .. } => base,
        }
    }
}
