//! File-based simulator adapter.
//!
//! `SimulatorAdapter` turns an optimizer parameter vector into a simulator
//! input file, runs the simulator and returns the vector it writes to its CSV
//! output. Mutable state sits behind one lock, so calls on the same instance
//! are serialized.

use crate::common::config::AdapterConfig;
use crate::document::InputDocument;
use crate::domain::{DimensionLock, SimError, SimResult, VectorKind};
use crate::fields::{FieldDefinition, FieldRegistry};
use crate::mapping::{FieldAccess, MappingTables, read_input_parameters, write_input_parameters};
use crate::results::{OutputRead, ResultFile};
use crate::runner::{ProcessRunner, RunOutcome};
use crate::serialization::{read_text_artifact, write_text_artifact};
use crate::variants::SimulatorVariant;
use parking_lot::Mutex;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use tracing::{debug, info};

pub const OUTPUT_LEVEL_SUMMARY: u8 = 1;
pub const OUTPUT_LEVEL_VECTORS: u8 = 2;
pub const OUTPUT_LEVEL_DUMP: u8 = 3;

#[derive(Debug)]
struct AdapterState {
    registry: FieldRegistry,
    tables: MappingTables,
    template: Option<String>,
    document: InputDocument,
    input_dimension: DimensionLock,
    output_dimension: DimensionLock,
    output_level: u8,
    run_count: usize,
}

impl AdapterState {
    /// Reads the template the first time the document is needed.
    fn ensure_document(&mut self, config: &AdapterConfig) -> SimResult<()> {
        if self.template.is_none() {
            let template = read_text_artifact(&config.template_path(), "IO.TEMPLATE_READ")?;
            self.document.set_contents(template.clone());
            self.template = Some(template);
        }
        Ok(())
    }

    fn reset_document(&mut self, config: &AdapterConfig) -> SimResult<()> {
        self.ensure_document(config)?;
        let template = self.template.clone().unwrap_or_default();
        self.document.set_contents(template);
        Ok(())
    }
}

#[derive(Debug)]
pub struct SimulatorAdapter {
    config: AdapterConfig,
    variant: Box<dyn SimulatorVariant>,
    runner: ProcessRunner,
    results: ResultFile,
    state: Mutex<AdapterState>,
}

impl SimulatorAdapter {
    /// Builds an adapter for the variant named in `config`.
    pub fn new(config: AdapterConfig) -> SimResult<Self> {
        let variant = config.variant.build();
        Self::with_variant(config, variant)
    }

    /// Builds an adapter around an explicitly supplied variant.
    pub fn with_variant(config: AdapterConfig, variant: Box<dyn SimulatorVariant>) -> SimResult<Self> {
        config.validate()?;

        let mut registry = FieldRegistry::new();
        let mut tables = MappingTables::new();
        variant.register_fields(&mut registry)?;
        variant.install_mappings(&registry, &mut tables)?;

        let runner = ProcessRunner::new(&config.executable_path)
            .with_argument_style(config.input_argument)
            .with_stdout_redirect(config.stdout_file_path());
        let results = ResultFile::new(config.output_file_path(), config.separator_byte()?);

        debug!(
            variant = variant.name(),
            fields = registry.len(),
            "adapter constructed"
        );

        let state = AdapterState {
            registry,
            tables,
            template: None,
            document: InputDocument::new(),
            input_dimension: DimensionLock::new(VectorKind::InputParameters),
            output_dimension: DimensionLock::new(VectorKind::OutputValues),
            output_level: config.output_level,
            run_count: 0,
        };

        Ok(Self {
            config,
            variant,
            runner,
            results,
            state: Mutex::new(state),
        })
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn variant_name(&self) -> &'static str {
        self.variant.name()
    }

    pub fn input_file_path(&self) -> PathBuf {
        self.config.input_file_path()
    }

    pub fn output_file_path(&self) -> PathBuf {
        self.config.output_file_path()
    }

    pub fn output_level(&self) -> u8 {
        self.state.lock().output_level
    }

    pub fn set_output_level(&self, level: u8) {
        self.state.lock().output_level = level;
    }

    pub fn run_count(&self) -> usize {
        self.state.lock().run_count
    }

    pub fn num_input_parameters(&self) -> Option<usize> {
        self.state.lock().input_dimension.get()
    }

    pub fn set_num_input_parameters(&self, count: usize) -> SimResult<()> {
        self.state.lock().input_dimension.fix(count)
    }

    pub fn num_output_values(&self) -> Option<usize> {
        self.state.lock().output_dimension.get()
    }

    pub fn set_num_output_values(&self, count: usize) -> SimResult<()> {
        self.state.lock().output_dimension.fix(count)
    }

    // Field registry

    pub fn add_field_definition(&self, definition: FieldDefinition) -> SimResult<()> {
        self.state.lock().registry.add_definition(definition)
    }

    pub fn field_definition(&self, id: i32, name: &str) -> SimResult<FieldDefinition> {
        self.state.lock().registry.get_definition(id, name)
    }

    pub fn remove_field_definition(&self, id: i32, name: &str) -> Option<FieldDefinition> {
        self.state.lock().registry.remove_definition(id, name)
    }

    pub fn field_definitions(&self) -> Vec<FieldDefinition> {
        self.state
            .lock()
            .registry
            .definitions()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn clear_field_definitions(&self) {
        self.state.lock().registry.clear();
    }

    // Mapping tables

    /// Registers `definition` and appends it to the default input values.
    pub fn add_default_input_value(&self, definition: FieldDefinition) -> SimResult<()> {
        let mut state = self.state.lock();
        state.registry.add_definition(definition.clone())?;
        state.tables.add_default_input_value(Some(definition));
        Ok(())
    }

    pub fn default_input_values(&self) -> Vec<Option<FieldDefinition>> {
        self.state.lock().tables.default_input_values().to_vec()
    }

    pub fn clear_default_input_values(&self) {
        self.state.lock().tables.clear_default_input_values();
    }

    /// Maps parameter slot `index` to `definition` (registering it), or
    /// clears the slot when `definition` is `None`.
    pub fn set_parameter_mapping(
        &self,
        index: usize,
        definition: Option<FieldDefinition>,
    ) -> SimResult<()> {
        let mut state = self.state.lock();
        if let Some(definition) = &definition {
            state.registry.add_definition(definition.clone())?;
        }
        state.tables.set_parameter_mapping(index, definition);
        Ok(())
    }

    pub fn parameter_mappings(&self) -> Vec<Option<FieldDefinition>> {
        self.state
            .lock()
            .tables
            .optimization_parameter_definitions()
            .to_vec()
    }

    pub fn clear_parameter_mappings(&self) {
        self.state.lock().tables.clear_parameter_mappings();
    }

    // Input document

    pub fn input_file_contents(&self) -> SimResult<String> {
        let mut state = self.state.lock();
        state.ensure_document(&self.config)?;
        Ok(state.document.contents().to_string())
    }

    pub fn set_input_file_contents(&self, contents: impl Into<String>) -> SimResult<()> {
        let mut state = self.state.lock();
        state.ensure_document(&self.config)?;
        state.document.set_contents(contents);
        Ok(())
    }

    /// Discards everything written since the template was loaded.
    pub fn reset_input(&self) -> SimResult<()> {
        self.state.lock().reset_document(&self.config)
    }

    pub fn get_field_value(&self, id: i32, name: &str) -> SimResult<Option<String>> {
        let mut state = self.state.lock();
        state.ensure_document(&self.config)?;
        let AdapterState {
            registry, document, ..
        } = &mut *state;
        FieldAccess::new(registry, document).get_value(id, name)
    }

    pub fn set_field_value(&self, id: i32, name: &str, value: &str) -> SimResult<()> {
        let mut state = self.state.lock();
        state.ensure_document(&self.config)?;
        let AdapterState {
            registry, document, ..
        } = &mut *state;
        FieldAccess::new(registry, document).set_value(id, name, value)
    }

    pub fn add_comment(&self, text: &str) -> SimResult<()> {
        let mut state = self.state.lock();
        state.ensure_document(&self.config)?;
        state.document.add_comment(text);
        Ok(())
    }

    /// Writes `parameters` into the current document (defaults, automatic,
    /// manual) without resetting it first.
    pub fn update_input_parameters(&self, parameters: &[f64]) -> SimResult<()> {
        let mut state = self.state.lock();
        state.input_dimension.check(parameters.len())?;
        self.update_input_locked(&mut state, parameters)?;
        state.input_dimension.fix_or_check(parameters.len())
    }

    /// Recovers the parameter vector from the current document.
    pub fn read_input_parameters(&self) -> SimResult<Vec<f64>> {
        let mut state = self.state.lock();
        state.ensure_document(&self.config)?;
        let AdapterState {
            registry,
            document,
            tables,
            input_dimension,
            ..
        } = &mut *state;
        let mut access = FieldAccess::new(registry, document);
        let parameters = read_input_parameters(tables, self.variant.as_ref(), &mut access)?;
        input_dimension.fix_or_check(parameters.len())?;
        Ok(parameters)
    }

    /// Persists the document to the configured input file.
    pub fn save_input(&self) -> SimResult<PathBuf> {
        let mut state = self.state.lock();
        self.save_input_locked(&mut state)
    }

    /// Resets the document to the template, writes `parameters` and saves the
    /// input file. Does not run the simulator.
    pub fn prepare_input(&self, parameters: &[f64]) -> SimResult<PathBuf> {
        let mut state = self.state.lock();
        state.input_dimension.check(parameters.len())?;
        state.reset_document(&self.config)?;
        self.update_input_locked(&mut state, parameters)?;
        state.input_dimension.fix_or_check(parameters.len())?;
        self.save_input_locked(&mut state)
    }

    pub fn run_simulator(&self) -> SimResult<RunOutcome> {
        let mut state = self.state.lock();
        self.run_locked(&mut state)
    }

    // Results

    /// Output vector of the last run, or `None` if the output file is missing
    /// or cannot be parsed.
    pub fn read_output_values(&self) -> Option<Vec<f64>> {
        let _state = self.state.lock();
        self.results.read()
    }

    pub fn inspect_output_values(&self) -> OutputRead {
        let _state = self.state.lock();
        self.results.inspect()
    }

    pub fn write_output_values(&self, values: &[f64]) -> SimResult<()> {
        let mut state = self.state.lock();
        if values.is_empty() {
            return Err(SimError::configuration(
                "CONFIG.OUTPUT_EMPTY",
                "refusing to write an empty output vector",
            ));
        }
        state.output_dimension.check(values.len())?;
        self.results.write(values)?;
        state.output_dimension.fix_or_check(values.len())
    }

    pub fn repair_parameters(&self, parameters: &mut [f64]) -> SimResult<bool> {
        let _state = self.state.lock();
        let corrected = self.variant.repair_parameters(parameters)?;
        debug!(corrected, "parameter repair finished");
        Ok(corrected)
    }

    /// Runs one complete simulation for `parameters` and returns the
    /// simulator's output vector.
    pub fn calculate_vector_response(&self, parameters: &[f64]) -> SimResult<Vec<f64>> {
        let (values, output_level) = {
            let mut state = self.state.lock();
            let values = self.calculate_locked(&mut state, parameters)?;
            (values, state.output_level)
        };

        if output_level >= OUTPUT_LEVEL_DUMP {
            self.write_to_console();
        }
        Ok(values)
    }

    fn calculate_locked(&self, state: &mut AdapterState, parameters: &[f64]) -> SimResult<Vec<f64>> {
        state.input_dimension.fix_or_check(parameters.len())?;
        self.runner.validate()?;

        let output_level = state.output_level;
        if output_level >= OUTPUT_LEVEL_SUMMARY {
            println!(
                "Running {} simulator with {} input parameters...",
                self.variant.name(),
                parameters.len()
            );
        }
        if output_level >= OUTPUT_LEVEL_VECTORS {
            println!("  parameters: {}", join_vector(parameters));
        }

        if self.results.remove()? {
            debug!(path = %self.results.path().display(), "removed stale output file");
        }

        state.reset_document(&self.config)?;
        self.update_input_locked(state, parameters)?;
        self.save_input_locked(state)?;
        self.run_locked(state)?;

        let values = self.results.read().ok_or_else(|| {
            SimError::computation(
                "RUN.OUTPUT_NOT_PRODUCED",
                format!(
                    "simulator did not produce a readable output file at '{}'",
                    self.results.path().display()
                ),
            )
        })?;
        state.output_dimension.fix_or_check(values.len())?;

        if output_level >= OUTPUT_LEVEL_VECTORS {
            println!("  results: {}", join_vector(&values));
        }
        info!(
            run = state.run_count,
            outputs = values.len(),
            "simulation finished"
        );
        Ok(values)
    }

    fn update_input_locked(&self, state: &mut AdapterState, parameters: &[f64]) -> SimResult<()> {
        state.ensure_document(&self.config)?;
        let AdapterState {
            registry,
            document,
            tables,
            ..
        } = state;
        let mut access = FieldAccess::new(registry, document);
        write_input_parameters(tables, self.variant.as_ref(), &mut access, parameters)
    }

    fn save_input_locked(&self, state: &mut AdapterState) -> SimResult<PathBuf> {
        state.ensure_document(&self.config)?;
        let path = self.config.input_file_path();
        write_text_artifact(&path, state.document.contents(), "IO.INPUT_WRITE")?;
        debug!(path = %path.display(), "saved input file");
        Ok(path)
    }

    fn run_locked(&self, state: &mut AdapterState) -> SimResult<RunOutcome> {
        let outcome = self.runner.run(&self.config.input_file_path())?;
        state.run_count += 1;
        Ok(outcome)
    }

    pub fn write_to_console(&self) {
        println!("{}", self);
    }
}

fn join_vector(values: &[f64]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn describe_slot(slot: &Option<FieldDefinition>) -> String {
    slot.as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string)
}

impl Display for SimulatorAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        let dimension = |lock: &DimensionLock| {
            lock.get()
                .map_or_else(|| "unset".to_string(), |value| value.to_string())
        };

        writeln!(f, "SimulatorAdapter [{}]", self.variant.name())?;
        writeln!(f, "  template file: {}", self.config.template_path().display())?;
        writeln!(f, "  input file: {}", self.config.input_file_path().display())?;
        writeln!(f, "  output file: {}", self.results.path().display())?;
        writeln!(f, "  executable: {}", self.runner.executable().display())?;
        if let Some(stdout_path) = self.runner.stdout_path() {
            writeln!(f, "  stdout capture: {}", stdout_path.display())?;
        }
        writeln!(f, "  output level: {}", state.output_level)?;
        writeln!(f, "  runs: {}", state.run_count)?;
        writeln!(f, "  input parameters: {}", dimension(&state.input_dimension))?;
        writeln!(f, "  output values: {}", dimension(&state.output_dimension))?;

        writeln!(f, "  default input values:")?;
        for slot in state.tables.default_input_values() {
            writeln!(f, "    {}", describe_slot(slot))?;
        }
        writeln!(f, "  parameter mappings:")?;
        for (index, slot) in state
            .tables
            .optimization_parameter_definitions()
            .iter()
            .enumerate()
        {
            writeln!(f, "    [{}] {}", index, describe_slot(slot))?;
        }
        writeln!(f, "  fields:")?;
        for definition in state.registry.definitions() {
            writeln!(f, "    {}", definition)?;
        }
        Ok(())
    }
}
