pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimErrorCategory {
    ConfigurationError,
    DimensionMismatch,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl SimErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::ConfigurationError => 2,
            Self::DimensionMismatch => 3,
            Self::IoSystemError => 4,
            Self::ComputationError => 5,
            Self::InternalError => 6,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigurationError => "ConfigurationError",
            Self::DimensionMismatch => "DimensionMismatch",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} [{}] {}", .category.as_str(), .placeholder, .message)]
pub struct SimError {
    category: SimErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl SimError {
    pub fn new(
        category: SimErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn configuration(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SimErrorCategory::ConfigurationError, placeholder, message)
    }

    pub fn dimension(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SimErrorCategory::DimensionMismatch, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SimErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SimErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SimErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> SimErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::{SimError, SimErrorCategory};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (SimErrorCategory::ConfigurationError, 2, "ConfigurationError"),
            (SimErrorCategory::DimensionMismatch, 3, "DimensionMismatch"),
            (SimErrorCategory::IoSystemError, 4, "IoSystemError"),
            (SimErrorCategory::ComputationError, 5, "ComputationError"),
            (SimErrorCategory::InternalError, 6, "InternalError"),
        ];

        for (category, exit_code, label) in cases {
            assert_eq!(category.exit_code(), exit_code);
            assert_eq!(category.as_str(), label);
        }
    }

    #[test]
    fn error_renders_diagnostic_and_display_lines() {
        let error = SimError::dimension(
            "DIM.INPUT_PARAMETERS",
            "expected 2 input parameters, got 3",
        );

        assert_eq!(error.exit_code(), 3);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [DIM.INPUT_PARAMETERS] expected 2 input parameters, got 3"
        );
        assert_eq!(
            error.to_string(),
            "DimensionMismatch [DIM.INPUT_PARAMETERS] expected 2 input parameters, got 3"
        );
    }
}
