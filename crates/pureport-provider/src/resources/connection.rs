//! Shared base of the connection kinds.
//!
//! Every connection subtype declares the same base fields plus its own
//! provider-specific ones. [`connection_schema!`] builds the combined schema,
//! and [`expand_base`] / [`flatten_base`] map the shared part.

use super::{configured_str, set_optional, LINK_FIELDS};
use crate::model::{Connection, ConnectionBase, ConnectionType, CustomerNetwork, Link, NatConfig, NatMapping};
use reconcile_framework::record::{fields, nested_str, Field, FieldError, Fields, ResourceData, Value};
use reconcile_framework::MapError;

pub(crate) const CUSTOMER_NETWORK_FIELDS: &[Field] = &[
    Field::string("name").required(),
    Field::string("address").required(),
];

pub(crate) const NAT_MAPPING_FIELDS: &[Field] = &[
    Field::string("native_cidr").required(),
    Field::string("nat_cidr").computed(),
];

pub(crate) const NAT_CONFIG_FIELDS: &[Field] = &[
    Field::bool("enabled").required(),
    Field::list("mappings", NAT_MAPPING_FIELDS),
    Field::string("pnat_cidr").computed(),
];

/// Fields that can change without replacing the connection.
pub(crate) const MUTABLE_FIELDS: &[&str] = &[
    "name",
    "description",
    "speed",
    "billing_term",
    "high_availability",
    "customer_networks",
    "nat_config",
];

pub(crate) fn validate_speed(value: &Value) -> Result<(), String> {
    match value.as_int() {
        Some(speed) if speed > 0 && speed <= i64::from(u32::MAX) => Ok(()),
        _ => Err("speed must be a positive number of Mbps".to_string()),
    }
}

/// Declares a connection schema: the shared base fields followed by the
/// subtype's own.
macro_rules! connection_schema {
    ($name:expr, [$($extra:expr),* $(,)?]) => {
        ::reconcile_framework::record::Schema {
            name: $name,
            fields: &[
                ::reconcile_framework::record::Field::string("name").required(),
                ::reconcile_framework::record::Field::string("description"),
                ::reconcile_framework::record::Field::int("speed")
                    .required()
                    .validate($crate::resources::connection::validate_speed),
                ::reconcile_framework::record::Field::string("billing_term").required(),
                ::reconcile_framework::record::Field::bool("high_availability"),
                ::reconcile_framework::record::Field::string("location_href")
                    .required()
                    .force_new(),
                ::reconcile_framework::record::Field::list("network", $crate::resources::LINK_FIELDS)
                    .required()
                    .max_items(1)
                    .force_new(),
                ::reconcile_framework::record::Field::list(
                    "customer_networks",
                    $crate::resources::connection::CUSTOMER_NETWORK_FIELDS,
                ),
                ::reconcile_framework::record::Field::list(
                    "nat_config",
                    $crate::resources::connection::NAT_CONFIG_FIELDS,
                )
                .max_items(1),
                ::reconcile_framework::record::Field::string("href").computed(),
                ::reconcile_framework::record::Field::string("state").computed(),
                $($extra,)*
            ],
        }
    };
}
pub(crate) use connection_schema;

/// Builds the shared part of a request body.
pub(crate) fn expand_base(data: &ResourceData) -> Result<ConnectionBase, FieldError> {
    let network = data.require_single("network")?;
    let speed = u32::try_from(data.require_int("speed")?).map_err(|_| FieldError::Invalid {
        field: "speed".to_string(),
        reason: "out of range".to_string(),
    })?;

    Ok(ConnectionBase {
        name: data.require_str("name")?.to_string(),
        description: configured_str(data, "description"),
        speed,
        billing_term: data.require_str("billing_term")?.to_string(),
        high_availability: data.get_set("high_availability").and_then(Value::as_bool),
        location: Link::by_href(data.require_str("location_href")?),
        network: Link::new(
            nested_str(network, "network", "id")?,
            nested_str(network, "network", "href")?,
        ),
        customer_networks: expand_customer_networks(data)?,
        nat: expand_nat_config(data)?,
        ..ConnectionBase::default()
    })
}

fn expand_customer_networks(data: &ResourceData) -> Result<Vec<CustomerNetwork>, FieldError> {
    let Some(entries) = data.get_set("customer_networks").and_then(Value::as_list) else {
        return Ok(Vec::new());
    };
    entries
        .iter()
        .map(|entry| {
            Ok(CustomerNetwork {
                name: nested_str(entry, "customer_networks", "name")?.to_string(),
                address: nested_str(entry, "customer_networks", "address")?.to_string(),
            })
        })
        .collect()
}

fn expand_nat_config(data: &ResourceData) -> Result<Option<NatConfig>, FieldError> {
    let Some(config) = data
        .get_set("nat_config")
        .and_then(Value::as_list)
        .and_then(<[Fields]>::first)
    else {
        return Ok(None);
    };

    let enabled = config
        .get("enabled")
        .and_then(Value::as_bool)
        .ok_or_else(|| FieldError::MissingRequired("nat_config.enabled".to_string()))?;
    let mappings = config
        .get("mappings")
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .map(|mapping| {
            Ok(NatMapping {
                native_cidr: nested_str(mapping, "nat_config.mappings", "native_cidr")?.to_string(),
                nat_cidr: None,
            })
        })
        .collect::<Result<_, FieldError>>()?;

    Ok(Some(NatConfig {
        enabled,
        mappings,
        pnat_cidr: None,
    }))
}

/// Writes the shared part of a remote connection into the state layer.
pub(crate) fn flatten_base(base: &ConnectionBase, data: &mut ResourceData) -> Result<(), FieldError> {
    data.set("name", base.name.as_str())?;
    set_optional(data, "description", base.description.as_deref())?;
    data.set("speed", base.speed)?;
    data.set("billing_term", base.billing_term.as_str())?;
    set_optional(data, "high_availability", base.high_availability)?;
    set_optional(data, "location_href", base.location.href.as_deref())?;
    data.set("network", vec![base.network.to_fields()])?;
    set_optional(data, "href", base.href.as_deref())?;
    set_optional(data, "state", base.state.as_deref())?;

    if base.customer_networks.is_empty() {
        data.unset("customer_networks");
    } else {
        let entries: Vec<Fields> = base
            .customer_networks
            .iter()
            .map(|cn| {
                fields([
                    ("name", cn.name.as_str().into()),
                    ("address", cn.address.as_str().into()),
                ])
            })
            .collect();
        data.set("customer_networks", entries)?;
    }

    match &base.nat {
        Some(nat) => data.set("nat_config", vec![flatten_nat_config(nat)])?,
        None => data.unset("nat_config"),
    }
    Ok(())
}

fn flatten_nat_config(nat: &NatConfig) -> Fields {
    let mut out = fields([("enabled", nat.enabled.into())]);
    if !nat.mappings.is_empty() {
        let mappings: Vec<Fields> = nat
            .mappings
            .iter()
            .map(|m| {
                let mut entry = fields([("native_cidr", m.native_cidr.as_str().into())]);
                if let Some(nat_cidr) = &m.nat_cidr {
                    entry.insert("nat_cidr".to_string(), nat_cidr.as_str().into());
                }
                entry
            })
            .collect();
        out.insert("mappings".to_string(), mappings.into());
    }
    if let Some(pnat_cidr) = &nat.pnat_cidr {
        out.insert("pnat_cidr".to_string(), pnat_cidr.as_str().into());
    }
    out
}

/// Connections are created under their network.
pub(crate) fn network_id(data: &ResourceData) -> Result<String, FieldError> {
    let network = data.require_single("network")?;
    nested_str(network, "network", "id").map(str::to_string)
}

pub(crate) fn subtype_mismatch(expected: ConnectionType, found: &Connection) -> MapError {
    MapError::Subtype {
        expected: expected.as_str(),
        found: found.connection_type().as_str(),
    }
}

pub(crate) fn list_entry(connection: &Connection) -> Fields {
    let base = connection.base();
    fields([
        ("id", base.id.clone().unwrap_or_default().into()),
        ("href", base.href.clone().unwrap_or_default().into()),
        ("name", base.name.as_str().into()),
        ("type", connection.connection_type().as_str().into()),
    ])
}
