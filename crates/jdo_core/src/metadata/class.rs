//! Class and field metadata.

use super::FetchPlan;
use crate::error::{LifecycleError, LifecycleResult};
use crate::types::FieldNumber;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// How instances of a class are identified in the datastore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityType {
    /// Identity is formed by primary key fields declared on the class.
    Application,
    /// Identity is generated and held by the datastore.
    Datastore,
    /// Instances have no durable identity; they cannot be reloaded once
    /// their fields are cleared.
    Nondurable,
}

impl fmt::Display for IdentityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Application => "application",
            Self::Datastore => "datastore",
            Self::Nondurable => "nondurable",
        })
    }
}

/// Metadata for one persistent field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Field name, unique within the class.
    pub name: String,
    /// Whether the field is part of the primary key.
    pub primary_key: bool,
    /// Whether the field belongs to the default fetch group.
    pub default_fetch_group: bool,
    /// Named fetch groups the field belongs to.
    pub fetch_groups: Vec<String>,
}

impl FieldMetadata {
    /// A regular field in the default fetch group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: false,
            default_fetch_group: true,
            fetch_groups: Vec::new(),
        }
    }

    /// A primary key field.
    pub fn primary_key(name: impl Into<String>) -> Self {
        Self {
            primary_key: true,
            ..Self::new(name)
        }
    }

    /// A field loaded lazily (outside the default fetch group).
    pub fn lazy(name: impl Into<String>) -> Self {
        Self {
            default_fetch_group: false,
            ..Self::new(name)
        }
    }

    /// Adds the field to a named fetch group.
    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.fetch_groups.push(group.into());
        self
    }

    /// Whether the field is selected by `plan`.
    #[must_use]
    pub fn in_plan(&self, plan: &FetchPlan) -> bool {
        self.primary_key
            || plan.contains(FetchPlan::ALL)
            || (self.default_fetch_group && plan.contains(FetchPlan::DEFAULT))
            || self.fetch_groups.iter().any(|g| plan.contains(g))
    }
}

/// Metadata for a persistence-capable class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMetadata {
    name: String,
    identity_type: IdentityType,
    fields: Vec<FieldMetadata>,
}

impl ClassMetadata {
    /// Starts building metadata for `name` with application identity.
    pub fn builder(name: impl Into<String>) -> ClassMetadataBuilder {
        ClassMetadataBuilder {
            name: name.into(),
            identity_type: IdentityType::Application,
            fields: Vec::new(),
        }
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the identity type.
    #[must_use]
    pub fn identity_type(&self) -> IdentityType {
        self.identity_type
    }

    /// Returns the declared fields in field-number order.
    #[must_use]
    pub fn fields(&self) -> &[FieldMetadata] {
        &self.fields
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns the metadata of field `number`.
    #[must_use]
    pub fn field(&self, number: FieldNumber) -> Option<&FieldMetadata> {
        self.fields.get(number)
    }

    /// Looks up a field number by name.
    #[must_use]
    pub fn field_number(&self, name: &str) -> Option<FieldNumber> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Looks up a field number by name, failing for unknown names.
    pub fn require_field(&self, name: &str) -> LifecycleResult<FieldNumber> {
        self.field_number(name)
            .ok_or_else(|| LifecycleError::unknown_field(&self.name, name))
    }

    /// Whether field `number` is part of the primary key.
    #[must_use]
    pub fn is_primary_key(&self, number: FieldNumber) -> bool {
        self.fields.get(number).is_some_and(|f| f.primary_key)
    }

    /// Field numbers of the primary key.
    #[must_use]
    pub fn primary_key_fields(&self) -> Vec<FieldNumber> {
        self.matching(|f| f.primary_key)
    }

    /// Field numbers selected by `plan`, primary key fields included.
    #[must_use]
    pub fn fetch_plan_fields(&self, plan: &FetchPlan) -> Vec<FieldNumber> {
        self.matching(|f| f.in_plan(plan))
    }

    fn matching(&self, predicate: impl Fn(&FieldMetadata) -> bool) -> Vec<FieldNumber> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| predicate(f))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Builder for [`ClassMetadata`].
#[derive(Debug, Clone)]
pub struct ClassMetadataBuilder {
    name: String,
    identity_type: IdentityType,
    fields: Vec<FieldMetadata>,
}

impl ClassMetadataBuilder {
    /// Sets the identity type.
    #[must_use]
    pub fn identity(mut self, identity_type: IdentityType) -> Self {
        self.identity_type = identity_type;
        self
    }

    /// Appends a field; field numbers follow declaration order.
    #[must_use]
    pub fn field(mut self, field: FieldMetadata) -> Self {
        self.fields.push(field);
        self
    }

    /// Validates and builds the metadata.
    ///
    /// # Errors
    ///
    /// Fails when the class declares no fields, declares a field name twice,
    /// or uses application identity without a primary key field.
    pub fn build(self) -> LifecycleResult<ClassMetadata> {
        if self.fields.is_empty() {
            return Err(LifecycleError::invalid_metadata(
                &self.name,
                "class declares no persistent fields",
            ));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(LifecycleError::invalid_metadata(
                    &self.name,
                    format!("field {} declared twice", field.name),
                ));
            }
        }

        if self.identity_type == IdentityType::Application
            && !self.fields.iter().any(|f| f.primary_key)
        {
            return Err(LifecycleError::invalid_metadata(
                &self.name,
                "application identity requires a primary key field",
            ));
        }

        Ok(ClassMetadata {
            name: self.name,
            identity_type: self.identity_type,
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> ClassMetadata {
        ClassMetadata::builder("Person")
            .field(FieldMetadata::primary_key("id"))
            .field(FieldMetadata::new("name"))
            .field(FieldMetadata::lazy("photo").in_group("media"))
            .field(FieldMetadata::lazy("notes"))
            .build()
            .unwrap()
    }

    #[test]
    fn field_lookup() {
        let class = person();
        assert_eq!(class.field_count(), 4);
        assert_eq!(class.field_number("photo"), Some(2));
        assert_eq!(class.field_number("missing"), None);
        assert!(class.is_primary_key(0));
        assert!(!class.is_primary_key(1));
        assert!(!class.is_primary_key(99));
        assert_eq!(class.primary_key_fields(), vec![0]);
    }

    #[test]
    fn require_field_reports_unknown_name() {
        let err = person().require_field("age").unwrap_err();
        assert!(matches!(err, LifecycleError::UnknownField { .. }));
    }

    #[test]
    fn default_plan_selects_default_group_and_key() {
        let class = person();
        assert_eq!(class.fetch_plan_fields(&FetchPlan::default()), vec![0, 1]);
    }

    #[test]
    fn named_group_and_all_plans() {
        let class = person();
        let media = FetchPlan::empty().with_group("media");
        assert_eq!(class.fetch_plan_fields(&media), vec![0, 2]);
        assert_eq!(class.fetch_plan_fields(&FetchPlan::all()), vec![0, 1, 2, 3]);
    }

    #[test]
    fn application_identity_requires_key() {
        let err = ClassMetadata::builder("Loose")
            .field(FieldMetadata::new("x"))
            .build()
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidMetadata { .. }));

        let ok = ClassMetadata::builder("Loose")
            .identity(IdentityType::Datastore)
            .field(FieldMetadata::new("x"))
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn duplicate_and_empty_fields_rejected() {
        assert!(ClassMetadata::builder("Empty").build().is_err());
        assert!(ClassMetadata::builder("Dup")
            .field(FieldMetadata::primary_key("id"))
            .field(FieldMetadata::new("id"))
            .build()
            .is_err());
    }
}
