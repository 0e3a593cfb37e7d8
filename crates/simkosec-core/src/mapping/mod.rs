//! Mapping between optimizer parameter vectors and input-file fields.
//!
//! Writing a parameter vector runs three phases in a fixed order: literal
//! defaults, positional (automatic) mappings, then the variant's manual
//! mappings. Later phases win because lookups return the latest record.

use crate::document::InputDocument;
use crate::domain::{SimError, SimResult};
use crate::fields::{FieldDefinition, FieldRegistry};
use crate::variants::SimulatorVariant;
use tracing::debug;

pub const DEFAULTS_COMMENT: &str = "default input values";
pub const AUTOMATIC_COMMENT: &str = "automatic parameter mappings";
pub const MANUAL_COMMENT: &str = "manual parameter mappings";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTables {
    default_input_values: Vec<Option<FieldDefinition>>,
    optimization_parameter_definitions: Vec<Option<FieldDefinition>>,
}

impl MappingTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_input_values(&self) -> &[Option<FieldDefinition>] {
        &self.default_input_values
    }

    pub fn add_default_input_value(&mut self, definition: Option<FieldDefinition>) {
        self.default_input_values.push(definition);
    }

    pub fn clear_default_input_values(&mut self) {
        self.default_input_values.clear();
    }

    pub fn optimization_parameter_definitions(&self) -> &[Option<FieldDefinition>] {
        &self.optimization_parameter_definitions
    }

    pub fn add_parameter_mapping(&mut self, definition: Option<FieldDefinition>) {
        self.optimization_parameter_definitions.push(definition);
    }

    /// Maps parameter slot `index` to `definition`, growing the table with
    /// empty slots as needed.
    pub fn set_parameter_mapping(&mut self, index: usize, definition: Option<FieldDefinition>) {
        if index >= self.optimization_parameter_definitions.len() {
            self.optimization_parameter_definitions
                .resize(index + 1, None);
        }
        self.optimization_parameter_definitions[index] = definition;
    }

    pub fn parameter_definition(&self, index: usize) -> Option<&FieldDefinition> {
        self.optimization_parameter_definitions
            .get(index)
            .and_then(Option::as_ref)
    }

    pub fn clear_parameter_mappings(&mut self) {
        self.optimization_parameter_definitions.clear();
    }

    /// Number of parameter slots the automatic phase needs: one past the
    /// highest mapped slot.
    pub fn required_parameter_count(&self) -> usize {
        self.optimization_parameter_definitions
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |index| index + 1)
    }

    pub fn clear(&mut self) {
        self.clear_default_input_values();
        self.clear_parameter_mappings();
    }
}

/// Field-level view of the registry and the input document handed to
/// variant hooks.
pub struct FieldAccess<'a> {
    registry: &'a mut FieldRegistry,
    document: &'a mut InputDocument,
}

impl<'a> FieldAccess<'a> {
    pub fn new(registry: &'a mut FieldRegistry, document: &'a mut InputDocument) -> Self {
        Self { registry, document }
    }

    pub fn definition(&mut self, id: i32, name: &str) -> SimResult<FieldDefinition> {
        self.registry.get_definition(id, name)
    }

    pub fn set_value(&mut self, id: i32, name: &str, value: &str) -> SimResult<()> {
        let definition = self.definition(id, name)?;
        self.document.set_field_value(&definition, value)
    }

    pub fn set_f64(&mut self, id: i32, name: &str, value: f64) -> SimResult<()> {
        let definition = self.definition(id, name)?;
        self.document.set_field_f64(&definition, value)
    }

    pub fn get_value(&mut self, id: i32, name: &str) -> SimResult<Option<String>> {
        let definition = self.definition(id, name)?;
        self.document.get_field_value(&definition)
    }

    pub fn get_f64(&mut self, id: i32, name: &str) -> SimResult<Option<f64>> {
        let definition = self.definition(id, name)?;
        self.document.get_field_f64(&definition)
    }

    /// Like [`FieldAccess::get_f64`] but an unwritten field is an error.
    pub fn require_f64(&mut self, id: i32, name: &str) -> SimResult<f64> {
        self.get_f64(id, name)?.ok_or_else(|| {
            SimError::configuration(
                "CONFIG.FIELD_UNSET",
                format!("field {} '{}' has no value in the input document", id, name),
            )
        })
    }

    pub fn add_comment(&mut self, text: &str) {
        self.document.add_comment(text);
    }

    pub fn document(&mut self) -> &mut InputDocument {
        &mut *self.document
    }
}

/// Writes `parameters` into the document: defaults, automatic, manual.
pub fn write_input_parameters(
    tables: &MappingTables,
    variant: &dyn SimulatorVariant,
    access: &mut FieldAccess<'_>,
    parameters: &[f64],
) -> SimResult<()> {
    let required = tables.required_parameter_count();
    if required > parameters.len() {
        return Err(SimError::configuration(
            "CONFIG.INSUFFICIENT_PARAMETERS",
            format!(
                "insufficient parameters for defined mappings: {} mapped slots, {} parameters",
                required,
                parameters.len()
            ),
        ));
    }

    access.add_comment(DEFAULTS_COMMENT);
    let mut default_count = 0;
    for definition in tables.default_input_values().iter().flatten() {
        if let Some(value) = definition.default_value() {
            access.document().set_field_value(definition, value)?;
            default_count += 1;
        }
    }
    debug!(default_count, "wrote default input values");

    access.add_comment(AUTOMATIC_COMMENT);
    let mut automatic_count = 0;
    for (slot, value) in tables
        .optimization_parameter_definitions()
        .iter()
        .zip(parameters)
    {
        if let Some(definition) = slot {
            access.document().set_field_f64(definition, *value)?;
            automatic_count += 1;
        }
    }
    debug!(automatic_count, "wrote automatic parameter mappings");

    access.add_comment(MANUAL_COMMENT);
    variant.update_input_parameters(access, parameters)?;
    debug!(variant = variant.name(), "wrote manual parameter mappings");
    Ok(())
}

/// Recovers the parameter vector from the document: automatic slots first,
/// then the variant's manual extraction.
pub fn read_input_parameters(
    tables: &MappingTables,
    variant: &dyn SimulatorVariant,
    access: &mut FieldAccess<'_>,
) -> SimResult<Vec<f64>> {
    let mut slots = vec![None; tables.required_parameter_count()];
    for (index, slot) in tables
        .optimization_parameter_definitions()
        .iter()
        .enumerate()
    {
        let Some(definition) = slot else {
            continue;
        };
        let value = access.document().get_field_f64(definition)?;
        if value.is_none() {
            return Err(SimError::configuration(
                "CONFIG.FIELD_UNSET",
                format!(
                    "parameter slot {} maps to field '{}', which has no value",
                    index,
                    definition.name()
                ),
            ));
        }
        slots[index] = value;
    }

    variant.get_input_parameters(access, &mut slots)?;

    slots
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            value.ok_or_else(|| {
                SimError::configuration(
                    "CONFIG.PARAMETER_UNRESOLVED",
                    format!("parameter slot {} is not covered by any mapping", index),
                )
            })
        })
        .collect()
}
