use serde::{Deserialize, Serialize};

/// The action space of an environment, as far as a network head needs to know it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionSpace {
    /// A box of real-valued actions
    ///
    /// Heads scoring state-action pairs in a continuous space take the action as an input,
    /// so they produce a single value.
    Continuous,
    /// A finite set of `num_actions` actions
    Discrete { num_actions: usize },
}

impl ActionSpace {
    /// Number of values a Q head emits per sample for this space
    pub fn num_outputs(&self) -> usize {
        match self {
            Self::Continuous => 1,
            Self::Discrete { num_actions } => *num_actions,
        }
    }
}
