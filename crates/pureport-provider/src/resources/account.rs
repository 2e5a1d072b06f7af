use crate::model::Account;
use reconcile_framework::record::{fields, Field, Fields, ResourceData, Schema};
use reconcile_framework::{MapError, ResourceKind};

use super::set_optional;

/// A single account, looked up by identifier.
pub struct AccountResource;

static SCHEMA: Schema = Schema {
    name: AccountResource::KIND,
    fields: &[
        Field::string("name").computed(),
        Field::string("description").computed(),
        Field::string("href").computed(),
    ],
};

impl ResourceKind for AccountResource {
    const KIND: &'static str = "pureport_account";
    type Object = Account;

    fn schema() -> &'static Schema {
        &SCHEMA
    }

    fn flatten(account: &Account, data: &mut ResourceData) -> Result<(), MapError> {
        data.set("name", account.name.as_str())?;
        data.set("href", account.href.as_str())?;
        set_optional(data, "description", account.description.as_deref())?;
        Ok(())
    }

    fn object_id(account: &Account) -> Option<&str> {
        Some(&account.id)
    }

    fn object_name(account: &Account) -> Option<&str> {
        Some(&account.name)
    }

    fn list_entry(account: &Account) -> Fields {
        fields([
            ("id", account.id.as_str().into()),
            ("href", account.href.as_str().into()),
            ("name", account.name.as_str().into()),
            (
                "description",
                account.description.clone().unwrap_or_default().into(),
            ),
        ])
    }
}
