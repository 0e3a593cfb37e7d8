use super::{NUM_X0, NUM_Y0, SimulatorVariant, grid_definitions, register_obstacle_fields};
use crate::domain::{SimError, SimResult};
use crate::fields::FieldRegistry;
use crate::mapping::{FieldAccess, MappingTables};

/// Three-obstacle simulator. Only the field catalog and grid defaults are
/// known; the parameter-to-field formula is not, so every mapping and repair
/// hook reports the variant as unsupported.
#[derive(Debug, Clone, Copy)]
pub struct ThreeObstacleVariant {
    grid_cells_x: u32,
    grid_cells_y: u32,
}

impl Default for ThreeObstacleVariant {
    fn default() -> Self {
        Self {
            grid_cells_x: 50,
            grid_cells_y: 50,
        }
    }
}

fn unsupported(operation: &str) -> SimError {
    SimError::computation(
        "RUN.VARIANT_UNSUPPORTED",
        format!("three-obstacle simulator does not support {}", operation),
    )
}

impl SimulatorVariant for ThreeObstacleVariant {
    fn name(&self) -> &'static str {
        "three-obstacle"
    }

    fn register_fields(&self, registry: &mut FieldRegistry) -> SimResult<()> {
        for definition in grid_definitions(self.grid_cells_x, self.grid_cells_y) {
            registry.add_definition(definition)?;
        }
        register_obstacle_fields(registry, 3)
    }

    fn install_mappings(&self, registry: &FieldRegistry, tables: &mut MappingTables) -> SimResult<()> {
        for name in [NUM_X0.1, NUM_Y0.1] {
            tables.add_default_input_value(registry.get_by_name(name).cloned());
        }
        Ok(())
    }

    fn update_input_parameters(
        &self,
        _access: &mut FieldAccess<'_>,
        _parameters: &[f64],
    ) -> SimResult<()> {
        Err(unsupported("writing input parameters"))
    }

    fn get_input_parameters(
        &self,
        _access: &mut FieldAccess<'_>,
        _parameters: &mut Vec<Option<f64>>,
    ) -> SimResult<()> {
        Err(unsupported("reading input parameters"))
    }

    fn repair_parameters(&self, _parameters: &mut [f64]) -> SimResult<bool> {
        Err(unsupported("parameter repair"))
    }
}
