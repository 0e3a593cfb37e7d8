use super::{
    NUM_X0, NUM_Y0, SimulatorVariant, grid_definitions, obstacle_field, register_obstacle_fields,
};
use crate::domain::{SimError, SimResult};
use crate::fields::FieldRegistry;
use crate::mapping::{FieldAccess, MappingTables};
use serde::{Deserialize, Serialize};

const PARAMETER_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TwoObstacleSettings {
    pub grid_cells_x: u32,
    pub grid_cells_y: u32,
    pub domain_length: f64,
    pub obstacle_length: f64,
}

impl Default for TwoObstacleSettings {
    fn default() -> Self {
        Self {
            grid_cells_x: 50,
            grid_cells_y: 50,
            domain_length: 1.0,
            obstacle_length: 0.1,
        }
    }
}

impl TwoObstacleSettings {
    pub fn grid_step(&self) -> f64 {
        self.domain_length / f64::from(self.grid_cells_x.max(1))
    }
}

/// Two obstacles sliding along x.
///
/// Parameter 0 is the left edge of obstacle 1 (mapped automatically),
/// parameter 1 the left edge of obstacle 2. Right edges are derived by adding
/// the obstacle length.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoObstacleVariant {
    settings: TwoObstacleSettings,
}

impl TwoObstacleVariant {
    pub fn new(settings: TwoObstacleSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TwoObstacleSettings {
        &self.settings
    }

    fn check_length(parameters: usize) -> SimResult<()> {
        if parameters < PARAMETER_COUNT {
            return Err(SimError::configuration(
                "CONFIG.INSUFFICIENT_PARAMETERS",
                format!(
                    "two-obstacle simulator needs {} parameters, got {}",
                    PARAMETER_COUNT, parameters
                ),
            ));
        }
        Ok(())
    }

    /// Nearest admissible grid position for a left edge.
    fn aligned_position(&self, position: f64) -> f64 {
        let step = self.settings.grid_step();
        let last_start = self.settings.domain_length - self.settings.obstacle_length;
        let last_start = (last_start / step + 1.0e-9).floor() * step;
        ((position / step).round() * step).clamp(0.0, last_start.max(0.0))
    }
}

impl SimulatorVariant for TwoObstacleVariant {
    fn name(&self) -> &'static str {
        "two-obstacle"
    }

    fn register_fields(&self, registry: &mut FieldRegistry) -> SimResult<()> {
        for definition in grid_definitions(self.settings.grid_cells_x, self.settings.grid_cells_y) {
            registry.add_definition(definition)?;
        }
        register_obstacle_fields(registry, 2)
    }

    fn install_mappings(&self, registry: &FieldRegistry, tables: &mut MappingTables) -> SimResult<()> {
        for name in [NUM_X0.1, NUM_Y0.1] {
            tables.add_default_input_value(registry.get_by_name(name).cloned());
        }
        let (_, x0) = obstacle_field(1, "x0");
        tables.set_parameter_mapping(0, registry.get_by_name(&x0).cloned());
        Ok(())
    }

    fn update_input_parameters(
        &self,
        access: &mut FieldAccess<'_>,
        parameters: &[f64],
    ) -> SimResult<()> {
        Self::check_length(parameters.len())?;
        let length = self.settings.obstacle_length;

        let (id, name) = obstacle_field(1, "x1");
        access.set_f64(id, &name, parameters[0] + length)?;

        let (id, name) = obstacle_field(2, "x0");
        access.set_f64(id, &name, parameters[1])?;
        let (id, name) = obstacle_field(2, "x1");
        access.set_f64(id, &name, parameters[1] + length)
    }

    fn get_input_parameters(
        &self,
        access: &mut FieldAccess<'_>,
        parameters: &mut Vec<Option<f64>>,
    ) -> SimResult<()> {
        if parameters.len() < PARAMETER_COUNT {
            parameters.resize(PARAMETER_COUNT, None);
        }
        if parameters[0].is_none() {
            let (id, name) = obstacle_field(1, "x0");
            parameters[0] = Some(access.require_f64(id, &name)?);
        }
        let (id, name) = obstacle_field(2, "x0");
        parameters[1] = Some(access.require_f64(id, &name)?);
        Ok(())
    }

    fn repair_parameters(&self, parameters: &mut [f64]) -> SimResult<bool> {
        Self::check_length(parameters.len())?;
        let tolerance = self.settings.grid_step() * 1.0e-9;
        let mut corrected = false;
        for position in parameters.iter_mut().take(PARAMETER_COUNT) {
            let aligned = self.aligned_position(*position);
            if (aligned - *position).abs() > tolerance {
                *position = aligned;
                corrected = true;
            }
        }
        Ok(corrected)
    }
}

#[cfg(test)]
mod tests {
    use super::{TwoObstacleSettings, TwoObstacleVariant};
    use crate::document::InputDocument;
    use crate::fields::FieldRegistry;
    use crate::mapping::{FieldAccess, MappingTables, read_input_parameters, write_input_parameters};
    use crate::variants::SimulatorVariant;

    fn installed() -> (TwoObstacleVariant, FieldRegistry, MappingTables) {
        let variant = TwoObstacleVariant::default();
        let mut registry = FieldRegistry::new();
        let mut tables = MappingTables::new();
        variant.register_fields(&mut registry).expect("fields");
        variant
            .install_mappings(&registry, &mut tables)
            .expect("mappings");
        (variant, registry, tables)
    }

    #[test]
    fn catalog_contains_grid_and_obstacle_fields() {
        let (_, registry, tables) = installed();
        assert_eq!(registry.len(), 10);
        assert_eq!(
            registry.get_by_name("NumX0").and_then(|field| field.default_value()),
            Some("50")
        );
        assert_eq!(tables.default_input_values().len(), 2);
        assert_eq!(tables.required_parameter_count(), 1);
        assert_eq!(
            tables.parameter_definition(0).map(|field| field.name()),
            Some("Obstacle1:x0")
        );
    }

    #[test]
    fn manual_mapping_derives_right_edges() {
        let (variant, mut registry, tables) = installed();
        let mut document = InputDocument::new();
        let mut access = FieldAccess::new(&mut registry, &mut document);

        write_input_parameters(&tables, &variant, &mut access, &[0.25, 0.5])
            .expect("write should succeed");

        assert_eq!(access.get_f64(12, "Obstacle1:x1").expect("x1"), Some(0.25 + 0.1));
        assert_eq!(access.get_f64(21, "Obstacle2:x0").expect("x0"), Some(0.5));
        assert_eq!(access.get_f64(22, "Obstacle2:x1").expect("x1"), Some(0.5 + 0.1));

        let recovered = read_input_parameters(&tables, &variant, &mut access).expect("read back");
        assert_eq!(recovered, vec![0.25, 0.5]);
    }

    #[test]
    fn single_parameter_is_rejected_by_manual_phase() {
        let (variant, mut registry, tables) = installed();
        let mut document = InputDocument::new();
        let mut access = FieldAccess::new(&mut registry, &mut document);
        let error = write_input_parameters(&tables, &variant, &mut access, &[0.25])
            .expect_err("second parameter is required");
        assert_eq!(error.placeholder(), "CONFIG.INSUFFICIENT_PARAMETERS");
    }

    #[test]
    fn repairing_aligned_parameters_changes_nothing() {
        let variant = TwoObstacleVariant::default();
        let original = [0.2, 0.5];
        let mut parameters = original;

        let corrected = variant.repair_parameters(&mut parameters).expect("repair");

        assert!(!corrected);
        assert_eq!(parameters[0].to_bits(), original[0].to_bits());
        assert_eq!(parameters[1].to_bits(), original[1].to_bits());
    }

    #[test]
    fn repair_snaps_to_grid_and_keeps_obstacles_inside_domain() {
        let variant = TwoObstacleVariant::new(TwoObstacleSettings {
            grid_cells_x: 10,
            ..TwoObstacleSettings::default()
        });
        let mut parameters = [0.23, 0.97];

        assert!(variant.repair_parameters(&mut parameters).expect("repair"));
        assert!((parameters[0] - 0.2).abs() < 1.0e-12);
        assert!((parameters[1] - 0.9).abs() < 1.0e-12);

        let mut negative = [-0.3, 0.4];
        assert!(variant.repair_parameters(&mut negative).expect("repair"));
        assert_eq!(negative[0], 0.0);
    }

    #[test]
    fn repair_requires_both_positions() {
        let variant = TwoObstacleVariant::default();
        assert!(variant.repair_parameters(&mut [0.2]).is_err());
    }
}
