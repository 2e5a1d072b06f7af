use super::connection::{
    connection_schema, expand_base, flatten_base, list_entry, network_id, subtype_mismatch,
    MUTABLE_FIELDS,
};
use crate::model::{Connection, ConnectionType};
use reconcile_framework::record::{Field, FieldError, Fields, ResourceData, Schema};
use reconcile_framework::{ManagedKind, MapError, ResourceKind};

/// An Azure ExpressRoute connection, paired by service key.
pub struct AzureConnectionResource;

static SCHEMA: Schema = connection_schema!(
    AzureConnectionResource::KIND,
    [Field::string("service_key").required().force_new()]
);

impl ResourceKind for AzureConnectionResource {
    const KIND: &'static str = "pureport_azure_connection";
    type Object = Connection;

    fn schema() -> &'static Schema {
        &SCHEMA
    }

    fn flatten(connection: &Connection, data: &mut ResourceData) -> Result<(), MapError> {
        let Connection::AzureExpressRoute { base, service_key } = connection else {
            return Err(subtype_mismatch(ConnectionType::AzureExpressRoute, connection));
        };
        flatten_base(base, data)?;
        data.set("service_key", service_key.as_str())?;
        Ok(())
    }

    fn object_id(connection: &Connection) -> Option<&str> {
        connection.base().id.as_deref()
    }

    fn object_name(connection: &Connection) -> Option<&str> {
        Some(&connection.base().name)
    }

    fn list_entry(connection: &Connection) -> Fields {
        list_entry(connection)
    }
}

impl ManagedKind for AzureConnectionResource {
    type Body = Connection;
    const MUTABLE_FIELDS: &'static [&'static str] = MUTABLE_FIELDS;

    fn parent_id(data: &ResourceData) -> Result<String, FieldError> {
        network_id(data)
    }

    fn expand(data: &ResourceData) -> Result<Connection, MapError> {
        Ok(Connection::AzureExpressRoute {
            base: expand_base(data)?,
            service_key: data.require_str("service_key")?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile_framework::record::fields;

    #[test]
    fn azure_fields_round_trip() {
        let data = ResourceData::from_config(
            &SCHEMA,
            fields([
                ("name", "azure-west".into()),
                ("description", "express route".into()),
                ("speed", 200i64.into()),
                ("billing_term", "HOURLY".into()),
                ("location_href", "/locations/us-sea".into()),
                (
                    "network",
                    vec![fields([
                        ("id", "network-1".into()),
                        ("href", "/networks/network-1".into()),
                    ])]
                    .into(),
                ),
                (
                    "customer_networks",
                    vec![
                        fields([("name", "lan".into()), ("address", "10.2.0.0/24".into())]),
                        fields([("name", "dmz".into()), ("address", "10.3.0.0/24".into())]),
                    ]
                    .into(),
                ),
                ("service_key", "skey-1".into()),
            ]),
        )
        .unwrap();

        let remote = AzureConnectionResource::expand(&data).unwrap();
        assert_eq!(remote.connection_type(), ConnectionType::AzureExpressRoute);
        assert_eq!(AzureConnectionResource::parent_id(&data).unwrap(), "network-1");

        let mut read = ResourceData::new(&SCHEMA);
        AzureConnectionResource::flatten(&remote, &mut read).unwrap();
        for name in data.config().keys() {
            assert_eq!(read.get(name), data.get(name), "{name}");
        }
    }

    #[test]
    fn flatten_rejects_another_subtype() {
        let google = Connection::GoogleCloudInterconnect {
            base: crate::model::ConnectionBase::default(),
            primary_pairing_key: "pk".into(),
            secondary_pairing_key: None,
        };
        let err = AzureConnectionResource::flatten(&google, &mut ResourceData::new(&SCHEMA))
            .unwrap_err();
        assert_eq!(
            err,
            MapError::Subtype {
                expected: "AZURE_EXPRESS_ROUTE",
                found: "GOOGLE_CLOUD_INTERCONNECT",
            }
        );
    }
}
