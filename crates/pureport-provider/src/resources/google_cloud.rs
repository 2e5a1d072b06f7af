use super::connection::{
    connection_schema, expand_base, flatten_base, list_entry, network_id, subtype_mismatch,
    MUTABLE_FIELDS,
};
use super::{configured_str, set_optional};
use crate::model::{Connection, ConnectionType};
use reconcile_framework::record::{Field, FieldError, Fields, ResourceData, Schema};
use reconcile_framework::{ManagedKind, MapError, ResourceKind};

/// A Google Cloud Interconnect connection, paired by key.
pub struct GoogleCloudConnectionResource;

static SCHEMA: Schema = connection_schema!(
    GoogleCloudConnectionResource::KIND,
    [
        Field::string("primary_pairing_key").required().force_new(),
        Field::string("secondary_pairing_key").force_new(),
    ]
);

impl ResourceKind for GoogleCloudConnectionResource {
    const KIND: &'static str = "pureport_google_cloud_connection";
    type Object = Connection;

    fn schema() -> &'static Schema {
        &SCHEMA
    }

    fn flatten(connection: &Connection, data: &mut ResourceData) -> Result<(), MapError> {
        let Connection::GoogleCloudInterconnect {
            base,
            primary_pairing_key,
            secondary_pairing_key,
        } = connection
        else {
            return Err(subtype_mismatch(ConnectionType::GoogleCloudInterconnect, connection));
        };
        flatten_base(base, data)?;
        data.set("primary_pairing_key", primary_pairing_key.as_str())?;
        set_optional(data, "secondary_pairing_key", secondary_pairing_key.as_deref())?;
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

impl ManagedKind for GoogleCloudConnectionResource {
    type Body = Connection;
    const MUTABLE_FIELDS: &'static [&'static str] = MUTABLE_FIELDS;

    fn parent_id(data: &ResourceData) -> Result<String, FieldError> {
        network_id(data)
    }

    fn expand(data: &ResourceData) -> Result<Connection, MapError> {
        Ok(Connection::GoogleCloudInterconnect {
            base: expand_base(data)?,
            primary_pairing_key: data.require_str("primary_pairing_key")?.to_string(),
            secondary_pairing_key: configured_str(data, "secondary_pairing_key"),
        })
    }
}
