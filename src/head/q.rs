use burn::{prelude::*, tensor::Int};

use crate::{
    error::HeadError,
    loss::{ElementwiseLoss, LossType},
    nn::{LazyLinear, LazyLinearConfig},
    spaces::ActionSpace,
};

use super::{Head, HeadLoss, HeadOutputType, LossInputSchema, LossOutput, LossOutputType};

/// Configuration for a [`QHeadLoss`]
#[derive(Config, Debug)]
pub struct QHeadLossConfig {
    /// The elementwise loss between predicted and target Q values
    #[config(default = "LossType::MeanSquaredError")]
    pub loss_type: LossType,
    /// Scale of this loss relative to the other losses of a network
    #[config(default = 1.0)]
    pub weight: f64,
    /// Axis of the mini-batch, excluded from the per-sample reduction
    #[config(default = 0)]
    pub batch_axis: usize,
}

impl QHeadLossConfig {
    /// Initialize a [`QHeadLoss`]
    ///
    /// ### Returns
    /// - `Err(HeadError::InvalidBatchAxis)` if `batch_axis` is not an axis of a `[batch_size, num_actions]` output
    pub fn init(&self) -> Result<QHeadLoss, HeadError> {
        if self.batch_axis >= 2 {
            return Err(HeadError::InvalidBatchAxis(self.batch_axis));
        }
        Ok(QHeadLoss {
            weight: self.weight,
            batch_axis: self.batch_axis,
            loss_fn: self.loss_type.init(self.weight, self.batch_axis),
        })
    }
}

/// Loss for a [`QHead`], comparing predicted state-action values with their targets
///
/// Consumes the head output `pred` and the target `target`, both `[batch_size, num_actions]`.
#[derive(Debug, Clone, PartialEq)]
pub struct QHeadLoss {
    weight: f64,
    batch_axis: usize,
    loss_fn: ElementwiseLoss,
}

impl QHeadLoss {
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn batch_axis(&self) -> usize {
        self.batch_axis
    }

    pub fn loss_type(&self) -> LossType {
        self.loss_fn.loss_type()
    }

    /// Mean of the per-sample losses over the batch
    ///
    /// **Returns** a tensor of shape `[1]` tagged [`LossOutputType::Loss`]
    pub fn compute<B: Backend>(
        &self,
        pred: Tensor<B, 2>,
        target: Tensor<B, 2>,
    ) -> LossOutput<B> {
        log::trace!("q head loss over prediction of shape {:?}", pred.dims());
        let loss = self.loss_fn.forward(pred, target).mean();
        (loss, LossOutputType::Loss)
    }
}

impl<B: Backend> HeadLoss<B> for QHeadLoss {
    fn input_schema(&self) -> LossInputSchema {
        LossInputSchema {
            head_outputs: vec!["pred"],
            agent_inputs: vec![],
            targets: vec!["target"],
        }
    }

    fn loss_forward(&self, inputs: Vec<Tensor<B, 2>>) -> Result<Vec<LossOutput<B>>, HeadError> {
        let mut inputs = inputs.into_iter();
        let mut next_input = |name: &str| {
            inputs
                .next()
                .ok_or_else(|| HeadError::MissingLossInput(name.to_string()))
        };
        let pred = next_input("pred")?;
        let target = next_input("target")?;
        Ok(vec![self.compute(pred, target)])
    }
}

/// Configuration for a [`QHead`]
#[derive(Config, Debug)]
pub struct QHeadConfig {
    /// Action space of the agent, determines the number of outputs
    pub action_space: ActionSpace,
    /// Scale of this head's loss relative to the other losses of a network
    #[config(default = 1.0)]
    pub loss_weight: f64,
    /// The elementwise loss used to train the head
    #[config(default = "LossType::MeanSquaredError")]
    pub loss_type: LossType,
}

impl QHeadConfig {
    /// Initialize an unbound [`QHead`], its input width is taken from the first forward pass
    ///
    /// ### Returns
    /// - `Err(HeadError::EmptyActionSpace)` if the action space is discrete with no actions
    pub fn init<B: Backend>(&self) -> Result<QHead<B>, HeadError> {
        let num_actions = self.action_space.num_outputs();
        if num_actions == 0 {
            return Err(HeadError::EmptyActionSpace);
        }
        log::debug!(
            "q head with {num_actions} outputs, {:?} loss weighted {}",
            self.loss_type,
            self.loss_weight
        );
        Ok(QHead {
            dense: LazyLinearConfig::new(num_actions).init(),
            num_actions,
            loss_weight: self.loss_weight,
            loss_type: self.loss_type,
        })
    }
}

/// Head predicting state-action values, one per action
///
/// A single dense layer without activation maps the middleware representation
/// `[batch_size, features]` to Q values `[batch_size, num_actions]`. Continuous action
/// spaces get a single output.
#[derive(Debug, Clone)]
pub struct QHead<B: Backend> {
    dense: LazyLinear<B>,
    num_actions: usize,
    loss_weight: f64,
    loss_type: LossType,
}

impl<B: Backend> QHead<B> {
    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    pub fn loss_weight(&self) -> f64 {
        self.loss_weight
    }

    pub fn loss_type(&self) -> LossType {
        self.loss_type
    }

    /// The learnable layer of the head
    pub fn dense(&self) -> &LazyLinear<B> {
        &self.dense
    }

    /// Replace the learnable layer with `f` applied to it, e.g. an optimizer step
    ///
    /// ```ignore
    /// head = head.map_dense(|dense| {
    ///     let grads = GradientsParams::from_grads(grads, &dense);
    ///     optimizer.step(lr, dense, grads)
    /// });
    /// ```
    pub fn map_dense<F: FnOnce(LazyLinear<B>) -> LazyLinear<B>>(self, f: F) -> Self {
        Self {
            dense: f(self.dense),
            ..self
        }
    }

    /// Predicted Q values `[batch_size, num_actions]`
    ///
    /// **Panics** if the feature width differs from the one seen on the first call
    pub fn forward(&mut self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.dense.forward(x)
    }

    /// A fresh [`QHeadLoss`] with this head's loss type and weight
    pub fn make_loss(&self) -> QHeadLoss {
        QHeadLoss {
            weight: self.loss_weight,
            batch_axis: 0,
            loss_fn: self.loss_type.init(self.loss_weight, 0),
        }
    }

    /// Index of the highest valued action for each sample, `[batch_size]`
    pub fn greedy_actions(&mut self, x: Tensor<B, 2>) -> Tensor<B, 1, Int> {
        self.forward(x).argmax(1).squeeze(1)
    }

    /// Q value of the given action for each sample, `[batch_size]`
    ///
    /// `actions` holds one action index per sample, `[batch_size, 1]`
    pub fn action_values(&mut self, x: Tensor<B, 2>, actions: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        self.forward(x).gather(1, actions).squeeze(1)
    }

    /// Soft update the parameters of this head toward `other`
    ///
    /// θ′ ← τθ + (1 − τ)θ′
    ///
    /// ```ignore
    /// target_head = target_head.soft_update(&policy_head, tau);
    /// ```
    pub fn soft_update(self, other: &Self, tau: f32) -> Self {
        Self {
            dense: self.dense.soft_update(&other.dense, tau),
            ..self
        }
    }
}

impl<B: Backend> Head<B> for QHead<B> {
    type Loss = QHeadLoss;

    fn forward(&mut self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        QHead::forward(self, x)
    }

    fn loss(&self) -> QHeadLoss {
        self.make_loss()
    }

    fn return_type(&self) -> HeadOutputType {
        HeadOutputType::QActionStateValue
    }

    fn loss_weight(&self) -> f64 {
        self.loss_weight
    }
}
