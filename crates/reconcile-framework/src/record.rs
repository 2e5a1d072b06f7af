//! # Declarative Records
//!
//! A [`ResourceData`] is the flat, user-facing view of one resource instance.
//! It keeps two layers:
//!
//! - **config**: what the user wrote. Only fields present here are
//!   "explicitly set", which is how mappers tell an unset optional field apart
//!   from one set to `false`, `0` or `""`.
//! - **state**: what the last Read flattened from the remote object.
//!
//! [`ResourceData::get`] overlays config on state. Every write is checked
//! against the kind's [`Schema`].

use crate::identity::ExternalId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-field validation hook, run on configuration values.
pub type Validator = fn(&Value) -> Result<(), String>;

#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    String,
    Int,
    Bool,
    /// Ordered list of nested records.
    List {
        elem: &'static [Field],
        max_items: Option<usize>,
    },
}

impl FieldType {
    fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Bool => "bool",
            FieldType::List { .. } => "list",
        }
    }
}

/// One attribute of a resource schema.
///
/// A field that is neither `required` nor `computed` is optional.
/// `computed` fields are owned by the server and cannot be configured.
/// `force_new` fields cannot change without replacing the resource.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    pub computed: bool,
    pub force_new: bool,
    pub validator: Option<Validator>,
}

impl Field {
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: false,
            computed: false,
            force_new: false,
            validator: None,
        }
    }

    pub const fn string(name: &'static str) -> Self {
        Self::new(name, FieldType::String)
    }

    pub const fn int(name: &'static str) -> Self {
        Self::new(name, FieldType::Int)
    }

    pub const fn bool(name: &'static str) -> Self {
        Self::new(name, FieldType::Bool)
    }

    pub const fn list(name: &'static str, elem: &'static [Field]) -> Self {
        Self::new(
            name,
            FieldType::List {
                elem,
                max_items: None,
            },
        )
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub const fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub const fn max_items(mut self, max: usize) -> Self {
        if let FieldType::List { elem, .. } = self.ty {
            self.ty = FieldType::List {
                elem,
                max_items: Some(max),
            };
        }
        self
    }

    pub const fn validate(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }
}

/// The declared attributes of one resource kind or data source.
#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn force_new_fields(&self) -> impl Iterator<Item = &'static Field> {
        self.fields.iter().filter(|f| f.force_new)
    }
}

/// A typed declarative value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<Fields>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::String(_) => "string",
            Value::List(_) => "list",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Fields]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Fields>> for Value {
    fn from(items: Vec<Fields>) -> Self {
        Value::List(items)
    }
}

/// A flat record: field name to value.
pub type Fields = BTreeMap<String, Value>;

/// Builds a [`Fields`] map from name/value pairs.
pub fn fields<'a>(pairs: impl IntoIterator<Item = (&'a str, Value)>) -> Fields {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Schema violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("unknown field {0}")]
    Unknown(String),
    #[error("field {field} expects a {expected}, got a {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("field {field} allows at most {max} items, got {found}")]
    TooManyItems {
        field: String,
        max: usize,
        found: usize,
    },
    #[error("required field {0} is not set")]
    MissingRequired(String),
    #[error("field {0} is computed by the remote and cannot be configured")]
    Computed(String),
    #[error("field {field} is invalid: {reason}")]
    Invalid { field: String, reason: String },
}

fn check_value(field: &Field, value: &Value, path: &str) -> Result<(), FieldError> {
    match (&field.ty, value) {
        (FieldType::String, Value::String(_))
        | (FieldType::Int, Value::Int(_))
        | (FieldType::Bool, Value::Bool(_)) => {}
        (FieldType::List { elem, max_items }, Value::List(items)) => {
            if let Some(max) = max_items {
                if items.len() > *max {
                    return Err(FieldError::TooManyItems {
                        field: path.to_string(),
                        max: *max,
                        found: items.len(),
                    });
                }
            }
            for item in items {
                check_fields(elem, item, path)?;
            }
        }
        (ty, value) => {
            return Err(FieldError::TypeMismatch {
                field: path.to_string(),
                expected: ty.name(),
                found: value.type_name(),
            })
        }
    }
    if let Some(validator) = field.validator {
        validator(value).map_err(|reason| FieldError::Invalid {
            field: path.to_string(),
            reason,
        })?;
    }
    Ok(())
}

fn check_fields(schema: &[Field], record: &Fields, parent: &str) -> Result<(), FieldError> {
    let path = |name: &str| {
        if parent.is_empty() {
            name.to_string()
        } else {
            format!("{parent}.{name}")
        }
    };
    for (name, value) in record {
        let field = schema
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| FieldError::Unknown(path(name)))?;
        check_value(field, value, &path(name))?;
    }
    for field in schema.iter().filter(|f| f.required) {
        if !record.contains_key(field.name) {
            return Err(FieldError::MissingRequired(path(field.name)));
        }
    }
    Ok(())
}

/// Drops server-owned sub-fields so configured and read values compare equal.
fn configurable_projection(field: &Field, value: &Value) -> Value {
    match (&field.ty, value) {
        (FieldType::List { elem, .. }, Value::List(items)) => Value::List(
            items
                .iter()
                .map(|item| {
                    item.iter()
                        .filter_map(|(name, v)| {
                            let sub = elem.iter().find(|f| f.name == name)?;
                            (!sub.computed)
                                .then(|| (name.clone(), configurable_projection(sub, v)))
                        })
                        .collect()
                })
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Whether a record is backed by a remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Absent,
    Present,
}

/// The declarative record for one resource instance.
#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: &'static Schema,
    id: Option<ExternalId>,
    config: Fields,
    state: Fields,
}

impl ResourceData {
    /// An empty record: no configuration, no state, no identifier.
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            id: None,
            config: Fields::new(),
            state: Fields::new(),
        }
    }

    /// A record carrying the user's configuration, validated against `schema`.
    pub fn from_config(schema: &'static Schema, config: Fields) -> Result<Self, FieldError> {
        for name in config.keys() {
            if let Some(field) = schema.field(name) {
                if field.computed {
                    return Err(FieldError::Computed(name.clone()));
                }
            }
        }
        check_fields(schema.fields, &config, "")?;
        Ok(Self {
            config,
            ..Self::new(schema)
        })
    }

    pub fn with_id(mut self, id: impl Into<ExternalId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Seeds the state layer, as the engine does with the previous pass's result.
    pub fn with_state(mut self, state: Fields) -> Result<Self, FieldError> {
        for (name, value) in state {
            self.set(&name, value)?;
        }
        Ok(self)
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn id(&self) -> Option<&ExternalId> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: ExternalId) {
        self.id = Some(id);
    }

    /// Signals to the engine that the remote object no longer exists.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self.id {
            Some(_) => Lifecycle::Present,
            None => Lifecycle::Absent,
        }
    }

    pub fn config(&self) -> &Fields {
        &self.config
    }

    pub fn state(&self) -> &Fields {
        &self.state
    }

    /// Current value: configured if set, otherwise last read.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.config.get(name).or_else(|| self.state.get(name))
    }

    /// Whether the user explicitly configured `name`, regardless of its value.
    pub fn is_set(&self, name: &str) -> bool {
        self.config.contains_key(name)
    }

    /// The configured value, only if explicitly set.
    pub fn get_set(&self, name: &str) -> Option<&Value> {
        self.config.get(name)
    }

    /// Whether the configured value differs from the last read value.
    /// Computed sub-fields of nested lists are ignored.
    pub fn has_change(&self, name: &str) -> bool {
        let Some(field) = self.schema.field(name) else {
            return false;
        };
        let configured = self.config.get(name).map(|v| configurable_projection(field, v));
        let read = self.state.get(name).map(|v| configurable_projection(field, v));
        configured != read
    }

    /// Writes a read value into the state layer.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        let field = self
            .schema
            .field(name)
            .ok_or_else(|| FieldError::Unknown(name.to_string()))?;
        let value = value.into();
        check_value(field, &value, name)?;
        self.state.insert(name.to_string(), value);
        Ok(())
    }

    /// Removes a field from the state layer (the remote no longer reports it).
    pub fn unset(&mut self, name: &str) {
        self.state.remove(name);
    }

    /// Changes the desired value of a configurable field.
    pub fn set_config(&mut self, name: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        let field = self
            .schema
            .field(name)
            .ok_or_else(|| FieldError::Unknown(name.to_string()))?;
        if field.computed {
            return Err(FieldError::Computed(name.to_string()));
        }
        let value = value.into();
        check_value(field, &value, name)?;
        self.config.insert(name.to_string(), value);
        Ok(())
    }

    pub fn remove_config(&mut self, name: &str) {
        self.config.remove(name);
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_list(&self, name: &str) -> Option<&[Fields]> {
        self.get(name).and_then(Value::as_list)
    }

    pub fn require_str(&self, name: &str) -> Result<&str, FieldError> {
        self.get_str(name)
            .ok_or_else(|| FieldError::MissingRequired(name.to_string()))
    }

    pub fn require_int(&self, name: &str) -> Result<i64, FieldError> {
        self.get_int(name)
            .ok_or_else(|| FieldError::MissingRequired(name.to_string()))
    }

    /// First element of a singleton list field such as `network`.
    pub fn require_single(&self, name: &str) -> Result<&Fields, FieldError> {
        self.get_list(name)
            .and_then(<[Fields]>::first)
            .ok_or_else(|| FieldError::MissingRequired(name.to_string()))
    }
}

/// Reads a string sub-field out of a nested record.
pub fn nested_str<'a>(record: &'a Fields, parent: &str, name: &str) -> Result<&'a str, FieldError> {
    record
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| FieldError::MissingRequired(format!("{parent}.{name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchored(value: &Value) -> Result<(), String> {
        match value.as_str() {
            Some(p) if p.starts_with('^') => Ok(()),
            _ => Err("must be anchored".into()),
        }
    }

    const LINK: &[Field] = &[
        Field::string("id").required(),
        Field::string("href").required(),
    ];
    const ROUTE: &[Field] = &[
        Field::string("cidr").required(),
        Field::string("assigned").computed(),
    ];
    static SCHEMA: Schema = Schema {
        name: "test_resource",
        fields: &[
            Field::string("name").required(),
            Field::string("description"),
            Field::bool("enabled"),
            Field::int("speed"),
            Field::list("parent", LINK).max_items(1).force_new(),
            Field::list("routes", ROUTE),
            Field::string("href").computed(),
            Field::string("pattern").validate(anchored),
        ],
    };

    #[test]
    fn explicit_false_is_set_but_absent_is_not() {
        let data = ResourceData::from_config(
            &SCHEMA,
            fields([("name", "a".into()), ("enabled", false.into())]),
        )
        .unwrap();
        assert!(data.is_set("enabled"));
        assert_eq!(data.get_set("enabled"), Some(&Value::Bool(false)));
        assert!(!data.is_set("description"));
        assert_eq!(data.get_set("description"), None);
    }

    #[test]
    fn from_config_rejects_schema_violations() {
        let missing = ResourceData::from_config(&SCHEMA, Fields::new()).unwrap_err();
        assert_eq!(missing, FieldError::MissingRequired("name".into()));

        let wrong_type =
            ResourceData::from_config(&SCHEMA, fields([("name", 5i64.into())])).unwrap_err();
        assert!(matches!(wrong_type, FieldError::TypeMismatch { .. }));

        let computed = ResourceData::from_config(
            &SCHEMA,
            fields([("name", "a".into()), ("href", "/x".into())]),
        )
        .unwrap_err();
        assert_eq!(computed, FieldError::Computed("href".into()));

        let unknown = ResourceData::from_config(
            &SCHEMA,
            fields([("name", "a".into()), ("colour", "red".into())]),
        )
        .unwrap_err();
        assert_eq!(unknown, FieldError::Unknown("colour".into()));
    }

    #[test]
    fn nested_lists_are_bounded_and_checked() {
        let link = fields([("id", "p1".into()), ("href", "/p/p1".into())]);
        let too_many = ResourceData::from_config(
            &SCHEMA,
            fields([
                ("name", "a".into()),
                ("parent", vec![link.clone(), link].into()),
            ]),
        )
        .unwrap_err();
        assert!(matches!(too_many, FieldError::TooManyItems { max: 1, found: 2, .. }));

        let incomplete = ResourceData::from_config(
            &SCHEMA,
            fields([
                ("name", "a".into()),
                ("parent", vec![fields([("id", "p1".into())])].into()),
            ]),
        )
        .unwrap_err();
        assert_eq!(incomplete, FieldError::MissingRequired("parent.href".into()));
    }

    #[test]
    fn validators_run_on_configuration() {
        let err = ResourceData::from_config(
            &SCHEMA,
            fields([("name", "a".into()), ("pattern", "prod".into())]),
        )
        .unwrap_err();
        assert!(matches!(err, FieldError::Invalid { .. }));
    }

    #[test]
    fn has_change_compares_config_with_state() {
        let mut data = ResourceData::from_config(
            &SCHEMA,
            fields([("name", "new".into()), ("speed", 100i64.into())]),
        )
        .unwrap();
        data.set("name", "old").unwrap();
        data.set("speed", 100i64).unwrap();
        assert!(data.has_change("name"));
        assert!(!data.has_change("speed"));
        assert_eq!(data.get_str("name"), Some("new"));
    }

    #[test]
    fn has_change_ignores_computed_sub_fields() {
        let configured = vec![fields([("cidr", "10.0.0.0/24".into())])];
        let read = vec![fields([
            ("cidr", "10.0.0.0/24".into()),
            ("assigned", "100.64.0.0/24".into()),
        ])];
        let mut data = ResourceData::from_config(
            &SCHEMA,
            fields([("name", "a".into()), ("routes", configured.into())]),
        )
        .unwrap();
        data.set("routes", read).unwrap();
        assert!(!data.has_change("routes"));
    }

    #[test]
    fn removing_an_optional_field_is_a_change() {
        let mut data =
            ResourceData::from_config(&SCHEMA, fields([("name", "a".into())])).unwrap();
        data.set("description", "was here").unwrap();
        assert!(data.has_change("description"));
    }

    #[test]
    fn lifecycle_follows_identifier() {
        let mut data = ResourceData::new(&SCHEMA);
        assert_eq!(data.lifecycle(), Lifecycle::Absent);
        data.set_id(ExternalId::from("x1"));
        assert_eq!(data.lifecycle(), Lifecycle::Present);
        data.clear_id();
        assert_eq!(data.lifecycle(), Lifecycle::Absent);
    }
}
