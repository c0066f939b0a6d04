use burn::{nn::loss::HuberLossConfig, prelude::*};

use super::PointwiseLoss;

/// Smooth L1 error, quadratic below a threshold of 1 and linear above it
///
/// With d = |pred - target|:
/// - L = w * ½ * d<sup>2</sup> when d < 1
/// - L = w * (d - ½) otherwise
#[derive(Debug, Clone, PartialEq)]
pub struct HuberLoss {
    weight: f64,
    batch_axis: usize,
}

impl HuberLoss {
    /// Switching point between the quadratic and linear regimes
    pub const DELTA: f32 = 1.0;

    pub fn new(weight: f64, batch_axis: usize) -> Self {
        Self { weight, batch_axis }
    }
}

impl Default for HuberLoss {
    fn default() -> Self {
        Self::new(1.0, 0)
    }
}

impl PointwiseLoss for HuberLoss {
    fn pointwise<B: Backend, const D: usize>(
        &self,
        pred: Tensor<B, D>,
        target: Tensor<B, D>,
    ) -> Tensor<B, D> {
        HuberLossConfig::new(Self::DELTA)
            .init::<B>(&pred.device())
            .forward_no_reduction(pred, target)
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn batch_axis(&self) -> usize {
        self.batch_axis
    }
}
