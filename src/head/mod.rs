use std::collections::HashMap;

use burn::prelude::*;

use crate::error::HeadError;

mod q;

pub use q::{QHead, QHeadConfig, QHeadLoss, QHeadLossConfig};

/// What the values produced by a head represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum HeadOutputType {
    /// One value per (state, action) pair, Q(s, a)
    QActionStateValue,
}

/// Role of one entry returned by a [`HeadLoss`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LossOutputType {
    /// A term to be minimized
    Loss,
    /// A penalty on the parameters, minimized along with the loss terms
    Regularization,
    /// Reported for monitoring only, never backpropagated
    Diagnostic,
}

impl LossOutputType {
    /// Whether a trainer should add this entry to the objective
    pub fn is_optimized(self) -> bool {
        matches!(self, Self::Loss | Self::Regularization)
    }
}

/// A scalar loss tensor of shape `[1]` together with its role
pub type LossOutput<B> = (Tensor<B, 1>, LossOutputType);

/// Names of the tensors a [`HeadLoss`] consumes, grouped by where they come from
///
/// A training loop reads the schema before invoking the loss to bind tensors to arguments by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LossInputSchema {
    /// Outputs of the head's forward pass
    pub head_outputs: Vec<&'static str>,
    /// Extra values supplied by the agent, such as actions taken
    pub agent_inputs: Vec<&'static str>,
    /// Training targets
    pub targets: Vec<&'static str>,
}

/// Named tensors handed to [`HeadLoss::forward`]
#[derive(Debug, Clone)]
pub struct LossInputs<B: Backend> {
    pub head_outputs: HashMap<String, Tensor<B, 2>>,
    pub agent_inputs: HashMap<String, Tensor<B, 2>>,
    pub targets: HashMap<String, Tensor<B, 2>>,
}

impl<B: Backend> Default for LossInputs<B> {
    fn default() -> Self {
        Self {
            head_outputs: HashMap::new(),
            agent_inputs: HashMap::new(),
            targets: HashMap::new(),
        }
    }
}

impl<B: Backend> LossInputs<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_head_output(mut self, name: impl Into<String>, tensor: Tensor<B, 2>) -> Self {
        self.head_outputs.insert(name.into(), tensor);
        self
    }

    pub fn with_agent_input(mut self, name: impl Into<String>, tensor: Tensor<B, 2>) -> Self {
        self.agent_inputs.insert(name.into(), tensor);
        self
    }

    pub fn with_target(mut self, name: impl Into<String>, tensor: Tensor<B, 2>) -> Self {
        self.targets.insert(name.into(), tensor);
        self
    }
}

fn lookup<B: Backend>(
    tensors: &HashMap<String, Tensor<B, 2>>,
    name: &str,
) -> Result<Tensor<B, 2>, HeadError> {
    tensors
        .get(name)
        .cloned()
        .ok_or_else(|| HeadError::MissingLossInput(name.to_string()))
}

/// The loss paired with a [`Head`]
pub trait HeadLoss<B: Backend> {
    /// The named inputs this loss consumes
    fn input_schema(&self) -> LossInputSchema;

    /// Compute the loss from inputs ordered as in the schema: head outputs, agent inputs, then targets
    ///
    /// ### Returns
    /// - `Err(HeadError::MissingLossInput)` naming the first schema entry without an input
    fn loss_forward(&self, inputs: Vec<Tensor<B, 2>>) -> Result<Vec<LossOutput<B>>, HeadError>;

    /// Compute the loss from named inputs
    ///
    /// ### Returns
    /// - `Ok(outputs)` with every loss term and its role
    /// - `Err(HeadError::MissingLossInput)` if a name from the schema has no tensor
    fn forward(&self, inputs: &LossInputs<B>) -> Result<Vec<LossOutput<B>>, HeadError> {
        let schema = self.input_schema();
        let ordered = schema
            .head_outputs
            .iter()
            .map(|name| lookup(&inputs.head_outputs, name))
            .chain(
                schema
                    .agent_inputs
                    .iter()
                    .map(|name| lookup(&inputs.agent_inputs, name)),
            )
            .chain(schema.targets.iter().map(|name| lookup(&inputs.targets, name)))
            .collect::<Result<Vec<_>, _>>()?;
        self.loss_forward(ordered)
    }
}

/// The final trainable layers of a network, mapping a shared hidden representation to a task-specific output
pub trait Head<B: Backend> {
    type Loss: HeadLoss<B>;

    /// Forward pass from the middleware representation `[batch_size, features]`
    fn forward(&mut self, x: Tensor<B, 2>) -> Tensor<B, 2>;

    /// A fresh loss configured for this head
    fn loss(&self) -> Self::Loss;

    fn return_type(&self) -> HeadOutputType;

    /// Relative weight of this head's loss among the losses of a network
    fn loss_weight(&self) -> f64;
}

/// Sum every optimized entry of `outputs` into a single objective
///
/// **Returns** `None` if no entry is tagged [`LossOutputType::Loss`] or [`LossOutputType::Regularization`]
pub fn total_loss<B: Backend>(outputs: &[LossOutput<B>]) -> Option<Tensor<B, 1>> {
    outputs
        .iter()
        .filter(|(_, kind)| kind.is_optimized())
        .map(|(loss, _)| loss.clone())
        .reduce(|acc, loss| acc + loss)
}
