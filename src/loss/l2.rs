use burn::{nn::loss::MseLoss, prelude::*};

use super::PointwiseLoss;

/// Halved squared error
///
/// L = w * ½ * (pred - target)<sup>2</sup>
///
/// The ½ keeps the gradient equal to the raw error, `w * (pred - target)`.
#[derive(Debug, Clone, PartialEq)]
pub struct L2Loss {
    weight: f64,
    batch_axis: usize,
}

impl L2Loss {
    pub fn new(weight: f64, batch_axis: usize) -> Self {
        Self { weight, batch_axis }
    }
}

impl Default for L2Loss {
    fn default() -> Self {
        Self::new(1.0, 0)
    }
}

impl PointwiseLoss for L2Loss {
    fn pointwise<B: Backend, const D: usize>(
        &self,
        pred: Tensor<B, D>,
        target: Tensor<B, D>,
    ) -> Tensor<B, D> {
        MseLoss::<B>::new().forward_no_reduction(pred, target) * 0.5
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn batch_axis(&self) -> usize {
        self.batch_axis
    }
}
