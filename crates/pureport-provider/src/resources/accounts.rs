//! The `pureport_accounts` data source: every account visible to the
//! session, optionally filtered by a full-match name pattern.

use super::AccountResource;
use reconcile_framework::list::{list, validate_pattern, NamePattern};
use reconcile_framework::record::{Field, FieldError, ResourceData, Schema, Value};
use reconcile_framework::{ExternalId, Operation, ReconcileError, RemoteClient};
use tracing::{info, instrument};

const ACCOUNT_ENTRY_FIELDS: &[Field] = &[
    Field::string("id").required(),
    Field::string("href").required(),
    Field::string("name").required(),
    Field::string("description"),
];

pub struct AccountsDataSource;

static SCHEMA: Schema = Schema {
    name: AccountsDataSource::KIND,
    fields: &[
        Field::string("name_regex").validate(validate_pattern),
        Field::list("accounts", ACCOUNT_ENTRY_FIELDS).computed(),
    ],
};

impl AccountsDataSource {
    pub const KIND: &'static str = "pureport_accounts";

    pub fn schema() -> &'static Schema {
        &SCHEMA
    }

    /// Lists accounts into the `accounts` field.
    ///
    /// The record identifier is the view identifier of the fetched
    /// collection. A failed fetch clears it without an error.
    #[instrument(name = "read", skip_all, fields(kind = Self::KIND))]
    pub async fn read<C>(client: &C, data: &mut ResourceData) -> Result<(), ReconcileError>
    where
        C: RemoteClient<AccountResource>,
    {
        let pattern = match data.get_set("name_regex").and_then(Value::as_str) {
            Some(pattern) => Some(NamePattern::new(pattern).map_err(|e| {
                mapping_error(FieldError::Invalid {
                    field: "name_regex".to_string(),
                    reason: e.to_string(),
                })
            })?),
            None => None,
        };

        let view = list::<AccountResource, C>(client, pattern.as_ref()).await?;
        match view.view_id {
            Some(view_id) => {
                info!(count = view.entries.len(), %view_id, "Accounts listed");
                data.set("accounts", view.entries).map_err(mapping_error)?;
                data.set_id(ExternalId::from(view_id));
            }
            None => {
                data.unset("accounts");
                data.clear_id();
            }
        }
        Ok(())
    }
}

fn mapping_error(source: FieldError) -> ReconcileError {
    ReconcileError::Mapping {
        kind: AccountsDataSource::KIND,
        operation: Operation::List,
        source: source.into(),
    }
}
