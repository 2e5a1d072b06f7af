use serde::{Deserialize, Serialize};

/// A Pureport account. Accounts are managed outside this provider and are
/// only ever read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub href: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Account {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            href: format!("/accounts/{id}"),
            id,
            name: name.into(),
            description: None,
        }
    }
}
