use super::connection::{
    connection_schema, expand_base, flatten_base, list_entry, network_id, subtype_mismatch,
    MUTABLE_FIELDS,
};
use crate::model::{Connection, ConnectionType};
use reconcile_framework::record::{Field, FieldError, Fields, ResourceData, Schema};
use reconcile_framework::{ManagedKind, MapError, ResourceKind};

/// An AWS Direct Connect connection into a customer AWS account.
pub struct AwsConnectionResource;

static SCHEMA: Schema = connection_schema!(
    AwsConnectionResource::KIND,
    [
        Field::string("aws_account_id").required().force_new(),
        Field::string("aws_region").required().force_new(),
    ]
);

impl ResourceKind for AwsConnectionResource {
    const KIND: &'static str = "pureport_aws_connection";
    type Object = Connection;

    fn schema() -> &'static Schema {
        &SCHEMA
    }

    fn flatten(connection: &Connection, data: &mut ResourceData) -> Result<(), MapError> {
        let Connection::AwsDirectConnect {
            base,
            aws_account_id,
            aws_region,
        } = connection
        else {
            return Err(subtype_mismatch(ConnectionType::AwsDirectConnect, connection));
        };
        flatten_base(base, data)?;
        data.set("aws_account_id", aws_account_id.as_str())?;
        data.set("aws_region", aws_region.as_str())?;
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

impl ManagedKind for AwsConnectionResource {
    type Body = Connection;
    const MUTABLE_FIELDS: &'static [&'static str] = MUTABLE_FIELDS;

    fn parent_id(data: &ResourceData) -> Result<String, FieldError> {
        network_id(data)
    }

    fn expand(data: &ResourceData) -> Result<Connection, MapError> {
        Ok(Connection::AwsDirectConnect {
            base: expand_base(data)?,
            aws_account_id: data.require_str("aws_account_id")?.to_string(),
            aws_region: data.require_str("aws_region")?.to_string(),
        })
    }
}
