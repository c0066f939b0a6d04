use std::fmt;

/// Errors raised while configuring or invoking a network head
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadError {
    /// The loss tag does not name one of the supported [`LossType`](crate::loss::LossType)s
    UnsupportedLossType(String),
    /// A discrete action space with no actions
    EmptyActionSpace,
    /// The batch axis does not exist on a head output
    InvalidBatchAxis(usize),
    /// A name from a loss input schema had no tensor bound to it
    MissingLossInput(String),
}

impl fmt::Display for HeadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedLossType(tag) => write!(
                f,
                "unsupported loss type `{tag}`, expected mean squared error or huber"
            ),
            Self::EmptyActionSpace => write!(f, "discrete action space must have at least one action"),
            Self::InvalidBatchAxis(axis) => {
                write!(f, "batch axis {axis} is out of range for a 2-dimensional head output")
            }
            Self::MissingLossInput(name) => write!(f, "no tensor provided for loss input `{name}`"),
        }
    }
}

impl std::error::Error for HeadError {}
