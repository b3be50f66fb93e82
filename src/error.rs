use thiserror::Error;

use crate::anf::Variable;

/// Contract violations reported by the algebra, the simulator and the tagger.
///
/// The engine is pure; every error here is a caller configuration bug and is
/// returned instead of being recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnfError {
    #[error("malformed state: {0}")]
    MalformedState(String),

    #[error("variable {0} does not occur in the state")]
    UndefinedVariable(Variable),

    #[error("position (row {row}, column {column}) is outside a {rows}x{width} state")]
    PositionOutOfRange {
        row: usize,
        column: usize,
        rows: usize,
        width: usize,
    },

    #[error("index {index} is outside family `{family}` (width {width})")]
    IndexOutOfRange {
        family: char,
        index: usize,
        width: usize,
    },

    #[error("cannot parse `{input}`: {reason}")]
    Parse { input: String, reason: String },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, AnfError>;
