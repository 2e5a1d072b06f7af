//! In-memory collections of the provisioning API, served by
//! [`SimulatedApi`](reconcile_framework::simulator::SimulatedApi).
//!
//! Each collection fills in what the real API assigns on creation:
//! identifiers, hrefs, parent links and provisioning state.

use crate::model::{Account, Connection, ConnectionBase, Link, NatConfig, Network};
use reconcile_framework::simulator::Simulated;

/// `/accounts`. Accounts are managed elsewhere and can only be seeded.
pub struct AccountsApi;

impl Simulated for AccountsApi {
    const COLLECTION: &'static str = "accounts";
    const ID_PREFIX: &'static str = "ac";
    type Object = Account;
    type Payload = Account;

    fn object_id(account: &Account) -> Option<&str> {
        Some(&account.id)
    }

    fn materialize(_: &str, _: &str, _: &str, _: Account) -> Result<Account, String> {
        Err("accounts cannot be created through this API".to_string())
    }

    fn replace(_: &Account, _: Account) -> Result<Account, String> {
        Err("accounts cannot be modified through this API".to_string())
    }
}

/// `/accounts/{account}/networks`.
pub struct NetworksApi;

impl Simulated for NetworksApi {
    const COLLECTION: &'static str = "networks";
    const ID_PREFIX: &'static str = "network";
    type Object = Network;
    type Payload = Network;

    fn object_id(network: &Network) -> Option<&str> {
        network.id.as_deref()
    }

    fn materialize(id: &str, href: &str, account_id: &str, payload: Network) -> Result<Network, String> {
        if payload.name.is_empty() {
            return Err("network name must not be empty".to_string());
        }
        Ok(Network {
            id: Some(id.to_string()),
            href: Some(href.to_string()),
            account: Some(Link::new(account_id, format!("/accounts/{account_id}"))),
            ..payload
        })
    }

    fn replace(current: &Network, payload: Network) -> Result<Network, String> {
        if payload.name.is_empty() {
            return Err("network name must not be empty".to_string());
        }
        Ok(Network {
            name: payload.name,
            description: payload.description,
            ..current.clone()
        })
    }
}

/// `/networks/{network}/connections`, shared by every connection subtype.
pub struct ConnectionsApi;

const ACTIVE: &str = "ACTIVE";

fn last_segment(href: &str) -> Option<&str> {
    href.rsplit('/').find(|segment| !segment.is_empty())
}

/// Fills in the addresses the API allocates for an enabled NAT config.
fn allocate_nat(nat: Option<NatConfig>) -> Option<NatConfig> {
    nat.map(|mut nat| {
        if nat.enabled {
            nat.pnat_cidr = Some("100.64.0.0/30".to_string());
            for (i, mapping) in nat.mappings.iter_mut().enumerate() {
                mapping.nat_cidr = Some(format!("100.65.{i}.0/24"));
            }
        }
        nat
    })
}

fn validate_base(base: &ConnectionBase) -> Result<(), String> {
    if base.name.is_empty() {
        return Err("connection name must not be empty".to_string());
    }
    if base.speed == 0 {
        return Err("connection speed must be positive".to_string());
    }
    Ok(())
}

impl Simulated for ConnectionsApi {
    const COLLECTION: &'static str = "connections";
    const ID_PREFIX: &'static str = "conn";
    type Object = Connection;
    type Payload = Connection;

    fn object_id(connection: &Connection) -> Option<&str> {
        connection.base().id.as_deref()
    }

    fn materialize(
        id: &str,
        href: &str,
        network_id: &str,
        mut payload: Connection,
    ) -> Result<Connection, String> {
        let base = payload.base_mut();
        validate_base(base)?;

        let location_href = base
            .location
            .href
            .clone()
            .ok_or_else(|| "connection location must be given by href".to_string())?;
        base.location = Link::new(
            last_segment(&location_href).unwrap_or_default(),
            location_href.clone(),
        );
        base.id = Some(id.to_string());
        base.href = Some(href.to_string());
        let network_href = base
            .network
            .href
            .take()
            .unwrap_or_else(|| format!("/networks/{network_id}"));
        base.network = Link::new(network_id, network_href);
        base.nat = allocate_nat(base.nat.take());
        base.state = Some(ACTIVE.to_string());
        Ok(payload)
    }

    fn replace(current: &Connection, payload: Connection) -> Result<Connection, String> {
        if current.connection_type() != payload.connection_type() {
            return Err(format!(
                "connection type cannot change from {} to {}",
                current.connection_type(),
                payload.connection_type()
            ));
        }
        let incoming = payload.base();
        validate_base(incoming)?;

        let mut updated = current.clone();
        let base = updated.base_mut();
        base.name = incoming.name.clone();
        base.description = incoming.description.clone();
        base.speed = incoming.speed;
        base.billing_term = incoming.billing_term.clone();
        base.high_availability = incoming.high_availability;
        base.customer_networks = incoming.customer_networks.clone();
        base.nat = allocate_nat(incoming.nat.clone());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConnectionType, NatMapping};

    fn aws(name: &str) -> Connection {
        Connection::AwsDirectConnect {
            base: ConnectionBase {
                name: name.into(),
                speed: 100,
                billing_term: "HOURLY".into(),
                location: Link::by_href("/locations/us-ral"),
                network: Link::by_href("/networks/network-1"),
                ..ConnectionBase::default()
            },
            aws_account_id: "123456789012".into(),
            aws_region: "us-east-1".into(),
        }
    }

    #[test]
    fn materialized_connection_is_active_under_its_network() {
        let mut connection = aws("a");
        connection.base_mut().network = Link::by_id("network-1");
        let created =
            ConnectionsApi::materialize("conn-1", "https://api/connections/conn-1", "network-1", connection)
                .unwrap();
        let base = created.base();
        assert_eq!(base.id.as_deref(), Some("conn-1"));
        assert_eq!(base.state.as_deref(), Some("ACTIVE"));
        assert_eq!(base.network, Link::new("network-1", "/networks/network-1"));
        assert_eq!(base.location, Link::new("us-ral", "/locations/us-ral"));
    }

    #[test]
    fn enabled_nat_gets_allocated_addresses() {
        let mut connection = aws("a");
        connection.base_mut().nat = Some(NatConfig {
            enabled: true,
            mappings: vec![NatMapping {
                native_cidr: "10.0.0.0/24".into(),
                nat_cidr: None,
            }],
            pnat_cidr: None,
        });
        let created = ConnectionsApi::materialize("conn-1", "h", "network-1", connection).unwrap();
        let nat = created.base().nat.as_ref().unwrap();
        assert_eq!(nat.pnat_cidr.as_deref(), Some("100.64.0.0/30"));
        assert_eq!(nat.mappings[0].nat_cidr.as_deref(), Some("100.65.0.0/24"));
    }

    #[test]
    fn replace_keeps_identity_and_subtype_fields() {
        let current = ConnectionsApi::materialize("conn-1", "h", "network-1", aws("a")).unwrap();
        let mut payload = aws("b");
        payload.base_mut().description = Some("renamed".into());
        if let Connection::AwsDirectConnect { aws_region, .. } = &mut payload {
            *aws_region = "eu-west-1".into();
        }

        let updated = ConnectionsApi::replace(&current, payload).unwrap();
        assert_eq!(updated.base().name, "b");
        assert_eq!(updated.base().description.as_deref(), Some("renamed"));
        assert_eq!(updated.base().id.as_deref(), Some("conn-1"));
        match updated {
            Connection::AwsDirectConnect { aws_region, .. } => assert_eq!(aws_region, "us-east-1"),
            other => panic!("unexpected subtype {}", other.connection_type()),
        }
    }

    #[test]
    fn replace_rejects_a_different_subtype() {
        let current = ConnectionsApi::materialize("conn-1", "h", "network-1", aws("a")).unwrap();
        let payload = Connection::AzureExpressRoute {
            base: current.base().clone(),
            service_key: "skey".into(),
        };
        let err = ConnectionsApi::replace(&current, payload).unwrap_err();
        assert!(err.contains(ConnectionType::AwsDirectConnect.as_str()));
    }

    #[test]
    fn accounts_are_read_only() {
        assert!(AccountsApi::materialize("ac-1", "h", "", Account::new("ac-1", "a")).is_err());
    }
}
