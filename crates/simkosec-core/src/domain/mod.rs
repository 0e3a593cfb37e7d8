pub mod errors;

pub use errors::{SimError, SimErrorCategory, SimResult};

use std::fmt::{Display, Formatter};

/// Which parameter vector a [`DimensionLock`] guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorKind {
    InputParameters,
    OutputValues,
}

impl VectorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputParameters => "input parameters",
            Self::OutputValues => "output values",
        }
    }

    const fn placeholder(self) -> &'static str {
        match self {
            Self::InputParameters => "DIM.INPUT_PARAMETERS",
            Self::OutputValues => "DIM.OUTPUT_VALUES",
        }
    }
}

impl Display for VectorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Vector length that is unknown until first use and fixed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionLock {
    kind: VectorKind,
    fixed: Option<usize>,
}

impl DimensionLock {
    pub const fn new(kind: VectorKind) -> Self {
        Self { kind, fixed: None }
    }

    pub const fn kind(&self) -> VectorKind {
        self.kind
    }

    pub const fn get(&self) -> Option<usize> {
        self.fixed
    }

    pub const fn is_fixed(&self) -> bool {
        self.fixed.is_some()
    }

    /// Fixes the dimension explicitly. Re-fixing to the same value is allowed.
    pub fn fix(&mut self, length: usize) -> SimResult<()> {
        self.fix_or_check(length)
    }

    /// Accepts `length` if nothing is fixed yet (and fixes it) or if it equals
    /// the fixed value.
    pub fn fix_or_check(&mut self, length: usize) -> SimResult<()> {
        match self.fixed {
            None => {
                self.fixed = Some(length);
                Ok(())
            }
            Some(expected) if expected == length => Ok(()),
            Some(expected) => Err(SimError::dimension(
                self.kind.placeholder(),
                format!(
                    "expected {} {}, got {}",
                    expected, self.kind, length
                ),
            )),
        }
    }

    /// Check without fixing.
    pub fn check(&self, length: usize) -> SimResult<()> {
        match self.fixed {
            Some(expected) if expected != length => Err(SimError::dimension(
                self.kind.placeholder(),
                format!(
                    "expected {} {}, got {}",
                    expected, self.kind, length
                ),
            )),
            _ => Ok(()),
        }
    }
}
