//! Catalog of the numbered, named fields recognized in simulator input files.
//!
//! Field names form the single namespace of a registry. Ids are carried along
//! as a consistency check: a name is never allowed to change its id.

use crate::domain::{SimError, SimResult};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

pub const UNDEFINED_FIELD_NAME: &str = "UndefVarName";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    id: i32,
    name: String,
    description: Option<String>,
    default_value: Option<String>,
}

impl FieldDefinition {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.trim().is_empty() {
            UNDEFINED_FIELD_NAME.to_string()
        } else {
            name
        };
        Self {
            id,
            name,
            description: None,
            default_value: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `false` only for definitions created without a usable name.
    pub fn has_name(&self) -> bool {
        self.name != UNDEFINED_FIELD_NAME
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }
}

impl Display for FieldDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.id, self.name)?;
        if let Some(default_value) = &self.default_value {
            write!(f, " = {}", default_value)?;
        }
        if let Some(description) = &self.description {
            write!(f, " ({})", description)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    by_name: BTreeMap<String, FieldDefinition>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Inserts or replaces the definition stored under `definition.name()`.
    pub fn add_definition(&mut self, definition: FieldDefinition) -> SimResult<()> {
        if let Some(existing) = self.by_name.get(definition.name())
            && existing.id() != definition.id()
        {
            return Err(SimError::configuration(
                "CONFIG.FIELD_ID_CONFLICT",
                format!(
                    "field '{}' is already registered with id {}, cannot register id {}",
                    definition.name(),
                    existing.id(),
                    definition.id()
                ),
            ));
        }

        self.by_name
            .insert(definition.name().to_string(), definition);
        Ok(())
    }

    /// Resolves a field by name, by id, or both.
    ///
    /// An empty `name` searches by `id` alone. A known name must agree with a
    /// positive `id`. An unknown name with a positive `id` is registered on
    /// the fly.
    pub fn get_definition(&mut self, id: i32, name: &str) -> SimResult<FieldDefinition> {
        if name.is_empty() {
            if id <= 0 {
                return Err(SimError::configuration(
                    "CONFIG.FIELD_UNRESOLVED",
                    format!("cannot resolve field without a name from non-positive id {}", id),
                ));
            }
            return self.find_by_id(id).cloned().ok_or_else(|| {
                SimError::configuration(
                    "CONFIG.FIELD_UNRESOLVED",
                    format!("no field is registered with id {}", id),
                )
            });
        }

        if let Some(existing) = self.by_name.get(name) {
            if id > 0 && existing.id() != id {
                return Err(SimError::configuration(
                    "CONFIG.FIELD_ID_CONFLICT",
                    format!(
                        "field '{}' is registered with id {}, requested id {}",
                        name,
                        existing.id(),
                        id
                    ),
                ));
            }
            return Ok(existing.clone());
        }

        if id <= 0 {
            return Err(SimError::configuration(
                "CONFIG.FIELD_UNRESOLVED",
                format!(
                    "field '{}' is not registered and id {} cannot create it",
                    name, id
                ),
            ));
        }

        let definition = FieldDefinition::new(id, name);
        self.add_definition(definition.clone())?;
        Ok(definition)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&FieldDefinition> {
        self.by_name.get(name)
    }

    pub fn find_by_id(&self, id: i32) -> Option<&FieldDefinition> {
        self.by_name
            .values()
            .find(|definition| definition.id() == id)
    }

    /// Removes by name when given, otherwise by id. Missing fields are ignored.
    pub fn remove_definition(&mut self, id: i32, name: &str) -> Option<FieldDefinition> {
        if !name.is_empty() {
            return self.by_name.remove(name);
        }

        let key = self.find_by_id(id)?.name().to_string();
        self.by_name.remove(&key)
    }

    pub fn set_description(&mut self, name: &str, description: Option<String>) -> SimResult<()> {
        let definition = self.by_name.get_mut(name).ok_or_else(|| {
            SimError::configuration(
                "CONFIG.FIELD_UNRESOLVED",
                format!("field '{}' is not registered", name),
            )
        })?;
        definition.set_description(description);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.by_name.clear();
    }

    /// Definitions ordered by id, then name.
    pub fn definitions(&self) -> Vec<&FieldDefinition> {
        let mut definitions = self.by_name.values().collect::<Vec<_>>();
        definitions.sort_by(|a, b| a.id().cmp(&b.id()).then_with(|| a.name().cmp(b.name())));
        definitions
    }
}
