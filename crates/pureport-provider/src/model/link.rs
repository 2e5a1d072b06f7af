use reconcile_framework::record::{fields, Fields};
use serde::{Deserialize, Serialize};

/// Reference to another API object.
///
/// In requests only one of `id` or `href` may be sent; responses carry both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Link {
    pub fn new(id: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            href: Some(href.into()),
        }
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            href: None,
        }
    }

    pub fn by_href(href: impl Into<String>) -> Self {
        Self {
            id: None,
            href: Some(href.into()),
        }
    }

    /// The `{id, href}` record used by singleton reference fields.
    pub fn to_fields(&self) -> Fields {
        fields([
            ("id", self.id.clone().unwrap_or_default().into()),
            ("href", self.href.clone().unwrap_or_default().into()),
        ])
    }
}
