//! In-memory simulator input file.
//!
//! The document is an append-only log of field records seeded from a
//! template. Looking a field up returns the most recent record for its id.

use crate::domain::{SimError, SimResult};
use crate::fields::FieldDefinition;
use std::collections::HashMap;

pub const COMMENT_PREFIX: &str = "// ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputTokenLine {
    pub source_line: usize,
    pub tokens: Vec<String>,
}

impl InputTokenLine {
    fn field_id(&self) -> Option<i32> {
        self.tokens.first()?.parse().ok()
    }

    fn field_name(&self) -> &str {
        &self.tokens[1]
    }

    fn field_value(&self) -> &str {
        &self.tokens[2]
    }
}

#[derive(Debug, Clone, Default)]
struct LineIndex {
    lines: Vec<InputTokenLine>,
    latest_by_id: HashMap<i32, usize>,
    line_count: usize,
}

impl LineIndex {
    fn build(contents: &str) -> Self {
        let mut index = Self::default();
        for line in contents.lines() {
            index.push_line(line);
        }
        index
    }

    fn push_line(&mut self, line: &str) {
        self.line_count += 1;
        let Some(token_line) = tokenize_record(self.line_count, line) else {
            return;
        };
        let Some(id) = token_line.field_id() else {
            return;
        };
        self.latest_by_id.insert(id, self.lines.len());
        self.lines.push(token_line);
    }

    fn latest(&self, id: i32) -> Option<&InputTokenLine> {
        self.latest_by_id.get(&id).map(|&position| &self.lines[position])
    }
}

/// Splits a line into tokens, dropping blank lines and lines too short to
/// hold an `<id> <name> <value>` record. Lines that do not start with an
/// integer id are skipped by the caller.
fn tokenize_record(source_line: usize, line: &str) -> Option<InputTokenLine> {
    let tokens = line
        .split_whitespace()
        .map(ToOwned::to_owned)
        .collect::<Vec<_>>();
    if tokens.len() < 3 {
        return None;
    }
    Some(InputTokenLine {
        source_line,
        tokens,
    })
}

#[derive(Debug, Clone, Default)]
pub struct InputDocument {
    contents: String,
    index: Option<LineIndex>,
}

impl InputDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_template(template: impl Into<String>) -> Self {
        Self {
            contents: template.into(),
            index: None,
        }
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Replaces the whole text and drops the line index.
    pub fn set_contents(&mut self, contents: impl Into<String>) {
        self.contents = contents.into();
        self.index = None;
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    /// Tokenized record lines, building the index if needed.
    pub fn lines(&mut self) -> &[InputTokenLine] {
        &self.ensure_index().lines
    }

    /// Value of the most recent record for `definition`, or `None` if the
    /// field has not been written.
    pub fn get_field_value(&mut self, definition: &FieldDefinition) -> SimResult<Option<String>> {
        let index = self.ensure_index();
        let Some(line) = index.latest(definition.id()) else {
            return Ok(None);
        };

        if definition.has_name() && line.field_name() != definition.name() {
            return Err(SimError::configuration(
                "CONFIG.FIELD_NAME_MISMATCH",
                format!(
                    "line {} stores field id {} as '{}', expected '{}'",
                    line.source_line,
                    definition.id(),
                    line.field_name(),
                    definition.name()
                ),
            ));
        }

        Ok(Some(line.field_value().to_string()))
    }

    pub fn get_field_f64(&mut self, definition: &FieldDefinition) -> SimResult<Option<f64>> {
        let Some(raw) = self.get_field_value(definition)? else {
            return Ok(None);
        };
        raw.parse::<f64>().map(Some).map_err(|_| {
            SimError::configuration(
                "CONFIG.FIELD_VALUE_NOT_NUMERIC",
                format!(
                    "field '{}' holds '{}', which is not a number",
                    definition.name(),
                    raw
                ),
            )
        })
    }

    /// Appends a new record. Earlier records for the same field stay in place.
    ///
    /// Names and values must be single non-empty tokens, otherwise the record
    /// could not be read back.
    pub fn set_field_value(&mut self, definition: &FieldDefinition, value: &str) -> SimResult<()> {
        check_record_token(definition, "name", definition.name())?;
        check_record_token(definition, "value", value)?;
        self.terminate_last_line();
        let record = format!("  {}  {}  {} ", definition.id(), definition.name(), value);
        self.append_line(&record);
        Ok(())
    }

    pub fn set_field_f64(&mut self, definition: &FieldDefinition, value: f64) -> SimResult<()> {
        self.set_field_value(definition, &format_field_value(value))
    }

    pub fn add_comment(&mut self, text: &str) {
        self.terminate_last_line();
        self.append_line("");
        self.append_line(&format!("{}{}", COMMENT_PREFIX, text));
        self.append_line("");
    }

    fn append_line(&mut self, line: &str) {
        self.contents.push_str(line);
        self.contents.push('\n');
        if let Some(index) = self.index.as_mut() {
            index.push_line(line);
        }
    }

    fn terminate_last_line(&mut self) {
        if !self.contents.is_empty() && !self.contents.ends_with('\n') {
            self.contents.push('\n');
        }
    }

    fn ensure_index(&mut self) -> &LineIndex {
        self.index
            .get_or_insert_with(|| LineIndex::build(&self.contents))
    }
}

fn check_record_token(definition: &FieldDefinition, role: &str, token: &str) -> SimResult<()> {
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(SimError::configuration(
            "CONFIG.FIELD_VALUE",
            format!(
                "{} '{}' for field {} must be a single non-empty token",
                role,
                token,
                definition.id()
            ),
        ));
    }
    Ok(())
}

/// Shortest representation that parses back to the same `f64`.
pub fn format_field_value(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::{COMMENT_PREFIX, InputDocument, format_field_value};
    use crate::domain::SimErrorCategory;
    use crate::fields::FieldDefinition;

    fn x0() -> FieldDefinition {
        FieldDefinition::new(11, "Obstacle1:x0")
    }

    #[test]
    fn written_value_reads_back_exactly() {
        let mut document = InputDocument::from_template("header line\n");
        document.set_field_value(&x0(), "0.25").expect("write should succeed");
        assert_eq!(
            document.get_field_value(&x0()).expect("lookup"),
            Some("0.25".to_string())
        );
    }

    #[test]
    fn record_layout_matches_simulator_format() {
        let mut document = InputDocument::new();
        document.set_field_value(&x0(), "0.2").expect("write should succeed");
        assert_eq!(document.contents(), "  11  Obstacle1:x0  0.2 \n");
    }

    #[test]
    fn last_write_wins_and_earlier_records_are_kept() {
        let mut document = InputDocument::new();
        document.set_field_value(&x0(), "A").expect("write should succeed");
        assert_eq!(document.get_field_value(&x0()).expect("lookup").as_deref(), Some("A"));
        document.set_field_value(&x0(), "B").expect("write should succeed");

        assert_eq!(document.get_field_value(&x0()).expect("lookup").as_deref(), Some("B"));
        assert!(document.contents().contains("  11  Obstacle1:x0  A \n"));
        assert!(document.contents().contains("  11  Obstacle1:x0  B \n"));
    }

    #[test]
    fn template_records_are_visible_and_overridable() {
        let mut document =
            InputDocument::from_template("title run\n 1 NumX0 40\n  11  Obstacle1:x0  0.4\n");
        let num_x0 = FieldDefinition::new(1, "NumX0");

        assert_eq!(document.get_field_value(&num_x0).expect("lookup").as_deref(), Some("40"));
        document.set_field_value(&num_x0, "50").expect("write should succeed");
        assert_eq!(document.get_field_value(&num_x0).expect("lookup").as_deref(), Some("50"));
    }

    #[test]
    fn unwritten_field_is_absent_not_an_error() {
        let mut document = InputDocument::from_template("nothing to see\n\n  \n");
        assert_eq!(document.get_field_value(&x0()).expect("lookup"), None);
    }

    #[test]
    fn name_disagreement_on_latest_record_fails() {
        let mut document = InputDocument::from_template("  11  Obstacle2:x0  0.5\n");
        let error = document
            .get_field_value(&x0())
            .expect_err("name mismatch should fail");
        assert_eq!(error.category(), SimErrorCategory::ConfigurationError);
        assert_eq!(error.placeholder(), "CONFIG.FIELD_NAME_MISMATCH");

        let unnamed = FieldDefinition::new(11, "");
        assert_eq!(
            document.get_field_value(&unnamed).expect("unnamed lookup").as_deref(),
            Some("0.5")
        );
    }

    #[test]
    fn setting_contents_invalidates_the_index() {
        let mut document = InputDocument::new();
        document.set_field_value(&x0(), "1").expect("write should succeed");
        let _ = document.get_field_value(&x0()).expect("lookup");
        assert!(document.is_indexed());

        document.set_contents("  11  Obstacle1:x0  2\n");
        assert!(!document.is_indexed());
        assert_eq!(document.get_field_value(&x0()).expect("lookup").as_deref(), Some("2"));
    }

    #[test]
    fn appends_after_indexing_update_the_index() {
        let mut document = InputDocument::from_template("  11  Obstacle1:x0  1");
        assert_eq!(document.lines().len(), 1);

        document.set_field_value(&x0(), "3").expect("write should succeed");
        assert_eq!(document.lines().len(), 2);
        assert_eq!(document.get_field_value(&x0()).expect("lookup").as_deref(), Some("3"));
        assert_eq!(
            document.contents(),
            "  11  Obstacle1:x0  1\n  11  Obstacle1:x0  3 \n"
        );
    }

    #[test]
    fn comments_are_framed_by_blank_lines_and_not_indexed() {
        let mut document = InputDocument::new();
        document.add_comment("11 defaults follow");
        assert_eq!(
            document.contents(),
            format!("\n{}11 defaults follow\n\n", COMMENT_PREFIX)
        );
        assert!(document.lines().is_empty());
    }

    #[test]
    fn values_that_would_not_read_back_are_rejected() {
        let mut document = InputDocument::new();
        document.set_field_value(&x0(), "A").expect("write should succeed");

        for value in ["", "two words", "tab\tseparated", "line\nbreak"] {
            let error = document
                .set_field_value(&x0(), value)
                .expect_err("untokenizable value should fail");
            assert_eq!(error.category(), SimErrorCategory::ConfigurationError);
            assert_eq!(error.placeholder(), "CONFIG.FIELD_VALUE");
        }

        let spaced = FieldDefinition::new(12, "Obstacle 1");
        assert!(document.set_field_value(&spaced, "0.3").is_err());

        assert_eq!(document.get_field_value(&x0()).expect("lookup").as_deref(), Some("A"));
        assert_eq!(document.contents(), "  11  Obstacle1:x0  A \n");
    }

    #[test]
    fn numeric_helpers_round_trip() {
        let mut document = InputDocument::new();
        document.set_field_f64(&x0(), 0.2).expect("write should succeed");
        assert_eq!(document.get_field_f64(&x0()).expect("lookup"), Some(0.2));
        assert_eq!(format_field_value(50.0), "50");

        document.set_field_value(&x0(), "wide").expect("write should succeed");
        assert!(document.get_field_f64(&x0()).is_err());
    }
}
