//! Simulator configurations plugged into the adapter.
//!
//! A variant contributes its field catalog, its default/automatic mapping
//! tables, the manual mapping hooks and a parameter repair routine.

mod three_obstacle;
mod two_obstacle;

pub use three_obstacle::ThreeObstacleVariant;
pub use two_obstacle::{TwoObstacleSettings, TwoObstacleVariant};

use crate::domain::SimResult;
use crate::fields::{FieldDefinition, FieldRegistry};
use crate::mapping::{FieldAccess, MappingTables};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub const NUM_X0: (i32, &str) = (1, "NumX0");
pub const NUM_Y0: (i32, &str) = (2, "NumY0");

/// Field id and name of coordinate `coordinate` ("x0", "x1", "y0", "y1") of
/// obstacle `obstacle` (1-based).
pub fn obstacle_field(obstacle: usize, coordinate: &str) -> (i32, String) {
    let offset = match coordinate {
        "x0" => 1,
        "x1" => 2,
        "y0" => 3,
        _ => 4,
    };
    (
        10 * obstacle as i32 + offset,
        format!("Obstacle{}:{}", obstacle, coordinate),
    )
}

pub(crate) fn register_obstacle_fields(
    registry: &mut FieldRegistry,
    obstacle_count: usize,
) -> SimResult<()> {
    for obstacle in 1..=obstacle_count {
        for (coordinate, description) in [
            ("x0", "left edge"),
            ("x1", "right edge"),
            ("y0", "bottom edge"),
            ("y1", "top edge"),
        ] {
            let (id, name) = obstacle_field(obstacle, coordinate);
            registry.add_definition(
                FieldDefinition::new(id, name)
                    .with_description(format!("obstacle {} {}", obstacle, description)),
            )?;
        }
    }
    Ok(())
}

pub(crate) fn grid_definitions(cells_x: u32, cells_y: u32) -> [FieldDefinition; 2] {
    [
        FieldDefinition::new(NUM_X0.0, NUM_X0.1)
            .with_description("grid cells along x")
            .with_default(cells_x.to_string()),
        FieldDefinition::new(NUM_Y0.0, NUM_Y0.1)
            .with_description("grid cells along y")
            .with_default(cells_y.to_string()),
    ]
}

pub trait SimulatorVariant: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Adds the variant's fields to the registry at adapter construction.
    fn register_fields(&self, _registry: &mut FieldRegistry) -> SimResult<()> {
        Ok(())
    }

    /// Fills the default and automatic mapping tables.
    fn install_mappings(
        &self,
        _registry: &FieldRegistry,
        _tables: &mut MappingTables,
    ) -> SimResult<()> {
        Ok(())
    }

    /// Manual phase of writing a parameter vector. Runs after the automatic
    /// phase, so anything written here wins.
    fn update_input_parameters(
        &self,
        access: &mut FieldAccess<'_>,
        parameters: &[f64],
    ) -> SimResult<()>;

    /// Manual phase of reading a parameter vector back. `parameters` already
    /// holds the automatically mapped slots and may be extended.
    fn get_input_parameters(
        &self,
        access: &mut FieldAccess<'_>,
        parameters: &mut Vec<Option<f64>>,
    ) -> SimResult<()>;

    /// Adjusts `parameters` in place to satisfy simulator constraints.
    /// Returns `true` if anything changed.
    fn repair_parameters(&self, parameters: &mut [f64]) -> SimResult<bool>;
}

/// Table-driven simulator without manual mappings or repair rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainVariant;

impl SimulatorVariant for PlainVariant {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn update_input_parameters(
        &self,
        _access: &mut FieldAccess<'_>,
        _parameters: &[f64],
    ) -> SimResult<()> {
        Ok(())
    }

    fn get_input_parameters(
        &self,
        _access: &mut FieldAccess<'_>,
        _parameters: &mut Vec<Option<f64>>,
    ) -> SimResult<()> {
        Ok(())
    }

    fn repair_parameters(&self, _parameters: &mut [f64]) -> SimResult<bool> {
        Ok(false)
    }
}

/// Variant selection as it appears in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VariantKind {
    Plain,
    TwoObstacle(TwoObstacleSettings),
    ThreeObstacle,
}

impl Default for VariantKind {
    fn default() -> Self {
        Self::TwoObstacle(TwoObstacleSettings::default())
    }
}

impl VariantKind {
    pub fn build(&self) -> Box<dyn SimulatorVariant> {
        match self {
            Self::Plain => Box::new(PlainVariant),
            Self::TwoObstacle(settings) => Box::new(TwoObstacleVariant::new(*settings)),
            Self::ThreeObstacle => Box::new(ThreeObstacleVariant::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{VariantKind, obstacle_field, register_obstacle_fields};
    use crate::fields::FieldRegistry;

    #[test]
    fn obstacle_fields_use_stable_ids() {
        assert_eq!(obstacle_field(1, "x0"), (11, "Obstacle1:x0".to_string()));
        assert_eq!(obstacle_field(2, "x1"), (22, "Obstacle2:x1".to_string()));
        assert_eq!(obstacle_field(3, "y1"), (34, "Obstacle3:y1".to_string()));
    }

    #[test]
    fn registering_obstacles_twice_is_idempotent() {
        let mut registry = FieldRegistry::new();
        register_obstacle_fields(&mut registry, 2).expect("first registration");
        register_obstacle_fields(&mut registry, 2).expect("second registration");
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn variant_kinds_build_named_variants() {
        assert_eq!(VariantKind::Plain.build().name(), "plain");
        assert_eq!(VariantKind::default().build().name(), "two-obstacle");
        assert_eq!(VariantKind::ThreeObstacle.build().name(), "three-obstacle");

        let parsed: VariantKind =
            serde_json::from_str(r#"{ "kind": "threeObstacle" }"#).expect("tagged variant");
        assert_eq!(parsed, VariantKind::ThreeObstacle);
    }
}
