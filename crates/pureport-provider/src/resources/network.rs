use super::{configured_str, set_optional, LINK_FIELDS};
use crate::model::Network;
use reconcile_framework::record::{fields, Field, FieldError, Fields, ResourceData, Schema};
use reconcile_framework::{ManagedKind, MapError, ResourceKind};

/// A network, created under an account.
pub struct NetworkResource;

static SCHEMA: Schema = Schema {
    name: NetworkResource::KIND,
    fields: &[
        Field::string("name").required(),
        Field::string("description"),
        Field::string("account_id").required().force_new(),
        Field::list("account", LINK_FIELDS).computed().max_items(1),
        Field::string("href").computed(),
    ],
};

impl ResourceKind for NetworkResource {
    const KIND: &'static str = "pureport_network";
    type Object = Network;

    fn schema() -> &'static Schema {
        &SCHEMA
    }

    fn flatten(network: &Network, data: &mut ResourceData) -> Result<(), MapError> {
        data.set("name", network.name.as_str())?;
        set_optional(data, "description", network.description.as_deref())?;
        set_optional(data, "href", network.href.as_deref())?;
        match &network.account {
            Some(account) => {
                set_optional(data, "account_id", account.id.as_deref())?;
                data.set("account", vec![account.to_fields()])?;
            }
            None => {
                data.unset("account_id");
                data.unset("account");
            }
        }
        Ok(())
    }

    fn object_id(network: &Network) -> Option<&str> {
        network.id.as_deref()
    }

    fn object_name(network: &Network) -> Option<&str> {
        Some(&network.name)
    }

    fn list_entry(network: &Network) -> Fields {
        fields([
            ("id", network.id.clone().unwrap_or_default().into()),
            ("href", network.href.clone().unwrap_or_default().into()),
            ("name", network.name.as_str().into()),
            (
                "description",
                network.description.clone().unwrap_or_default().into(),
            ),
        ])
    }
}

impl ManagedKind for NetworkResource {
    type Body = Network;
    const MUTABLE_FIELDS: &'static [&'static str] = &["name", "description"];

    fn parent_id(data: &ResourceData) -> Result<String, FieldError> {
        data.require_str("account_id").map(str::to_string)
    }

    fn expand(data: &ResourceData) -> Result<Network, MapError> {
        Ok(Network {
            name: data.require_str("name")?.to_string(),
            description: configured_str(data, "description"),
            ..Network::default()
        })
    }
}
