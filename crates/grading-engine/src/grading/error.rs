use serde::{Deserialize, Serialize};

/// Stable error vocabulary shared by authoring clients and the evaluation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidName,
    InvalidLeafBounds,
    ArityMismatch,
    EmptyBlock,
    DuplicatePath,
    MissingLeafValue,
    ValueOutOfRange,
    DivisionByZero,
    DegenerateRange,
    NotFound,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            ErrorKind::InvalidName => "InvalidName",
            ErrorKind::InvalidLeafBounds => "InvalidLeafBounds",
            ErrorKind::ArityMismatch => "ArityMismatch",
            ErrorKind::EmptyBlock => "EmptyBlock",
            ErrorKind::DuplicatePath => "DuplicatePath",
            ErrorKind::MissingLeafValue => "MissingLeafValue",
            ErrorKind::ValueOutOfRange => "ValueOutOfRange",
            ErrorKind::DivisionByZero => "DivisionByZero",
            ErrorKind::DegenerateRange => "DegenerateRange",
            ErrorKind::NotFound => "NotFound",
        }
    }
}

/// Raised while building a component tree that would break a structural invariant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComponentError {
    #[error("grade '{name}' needs min < max and a positive step (min {min}, max {max}, step {step})")]
    InvalidLeafBounds {
        name: String,
        min: f64,
        max: f64,
        step: f64,
    },
    #[error("block '{name}' has {children} children but {operators} operators")]
    ArityMismatch {
        name: String,
        children: usize,
        operators: usize,
    },
    #[error("block '{name}' has no children")]
    EmptyBlock { name: String },
}

impl ComponentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ComponentError::InvalidLeafBounds { .. } => ErrorKind::InvalidLeafBounds,
            ComponentError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            ComponentError::EmptyBlock { .. } => ErrorKind::EmptyBlock,
        }
    }

    /// Replace the bare component name with its full dot path.
    pub(crate) fn at_path(self, path: &str) -> Self {
        let name = path.to_string();
        match self {
            ComponentError::InvalidLeafBounds { min, max, step, .. } => {
                ComponentError::InvalidLeafBounds {
                    name,
                    min,
                    max,
                    step,
                }
            }
            ComponentError::ArityMismatch {
                children,
                operators,
                ..
            } => ComponentError::ArityMismatch {
                name,
                children,
                operators,
            },
            ComponentError::EmptyBlock { .. } => ComponentError::EmptyBlock { name },
        }
    }
}

/// Raised while materializing or evaluating a tree against submitted leaf values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("no value submitted for '{0}'")]
    MissingLeafValue(String),
    #[error("value {value} for '{path}' is not an allowed grade in [{min}, {max}]")]
    ValueOutOfRange {
        path: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("division by zero while folding '{0}'")]
    DivisionByZero(String),
    #[error("cannot normalize a degenerate range [{min}, {max}]")]
    DegenerateRange { min: f64, max: f64 },
    #[error(transparent)]
    Construction(#[from] ComponentError),
}

impl EvaluationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvaluationError::MissingLeafValue(_) => ErrorKind::MissingLeafValue,
            EvaluationError::ValueOutOfRange { .. } => ErrorKind::ValueOutOfRange,
            EvaluationError::DivisionByZero(_) => ErrorKind::DivisionByZero,
            EvaluationError::DegenerateRange { .. } => ErrorKind::DegenerateRange,
            EvaluationError::Construction(err) => err.kind(),
        }
    }

    /// Dot path of the offending node, when the failure is tied to one.
    pub fn path(&self) -> Option<&str> {
        match self {
            EvaluationError::MissingLeafValue(path)
            | EvaluationError::DivisionByZero(path)
            | EvaluationError::ValueOutOfRange { path, .. } => Some(path),
            EvaluationError::DegenerateRange { .. } => None,
            EvaluationError::Construction(ComponentError::InvalidLeafBounds { name, .. })
            | EvaluationError::Construction(ComponentError::ArityMismatch { name, .. })
            | EvaluationError::Construction(ComponentError::EmptyBlock { name }) => Some(name),
        }
    }
}
