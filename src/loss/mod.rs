use std::str::FromStr;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::HeadError;

mod huber;
mod l2;

pub use huber::HuberLoss;
pub use l2::L2Loss;

/// The elementwise losses a value head can be trained with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossType {
    /// Halved squared error, see [`L2Loss`]
    #[default]
    #[serde(alias = "mse", alias = "l2")]
    MeanSquaredError,
    /// Smooth L1 error, see [`HuberLoss`]
    #[serde(alias = "huber")]
    Huber,
}

impl LossType {
    /// Build the elementwise loss named by this tag
    pub fn init(self, weight: f64, batch_axis: usize) -> ElementwiseLoss {
        match self {
            Self::MeanSquaredError => {
                ElementwiseLoss::MeanSquaredError(L2Loss::new(weight, batch_axis))
            }
            Self::Huber => ElementwiseLoss::Huber(HuberLoss::new(weight, batch_axis)),
        }
    }
}

impl FromStr for LossType {
    type Err = HeadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mse" | "l2" | "meansquarederror" | "mean_squared_error" => Ok(Self::MeanSquaredError),
            "huber" => Ok(Self::Huber),
            _ => Err(HeadError::UnsupportedLossType(s.to_string())),
        }
    }
}

/// A loss computed independently for every element of a prediction, then averaged per sample
pub trait PointwiseLoss {
    /// Unweighted loss for every element, same shape as the inputs
    fn pointwise<B: Backend, const D: usize>(
        &self,
        pred: Tensor<B, D>,
        target: Tensor<B, D>,
    ) -> Tensor<B, D>;

    /// Scale applied to every element
    fn weight(&self) -> f64;

    /// Axis indexing independent samples
    fn batch_axis(&self) -> usize;

    /// Weighted loss averaged over every axis except the batch axis
    ///
    /// **Returns** a tensor of shape `[batch_size]`
    fn forward<B: Backend, const D: usize>(
        &self,
        pred: Tensor<B, D>,
        target: Tensor<B, D>,
    ) -> Tensor<B, 1> {
        let loss = self.pointwise(pred, target) * self.weight();
        mean_per_sample(loss, self.batch_axis())
    }
}

/// Average a tensor over every axis except `batch_axis`
///
/// **Panics** if `batch_axis` is not an axis of the tensor
pub fn mean_per_sample<B: Backend, const D: usize>(
    tensor: Tensor<B, D>,
    batch_axis: usize,
) -> Tensor<B, 1> {
    assert!(
        batch_axis < D,
        "Invalid batch axis {batch_axis} for a tensor of dimension {D}."
    );
    (0..D)
        .filter(|&dim| dim != batch_axis)
        .fold(tensor, |acc, dim| acc.mean_dim(dim))
        .reshape([-1])
}

/// One of the supported elementwise losses, chosen at construction by a [`LossType`]
#[derive(Debug, Clone, PartialEq)]
pub enum ElementwiseLoss {
    MeanSquaredError(L2Loss),
    Huber(HuberLoss),
}

impl ElementwiseLoss {
    pub fn loss_type(&self) -> LossType {
        match self {
            Self::MeanSquaredError(_) => LossType::MeanSquaredError,
            Self::Huber(_) => LossType::Huber,
        }
    }

    /// Weighted per-sample loss, shape `[batch_size]`
    pub fn forward<B: Backend, const D: usize>(
        &self,
        pred: Tensor<B, D>,
        target: Tensor<B, D>,
    ) -> Tensor<B, 1> {
        match self {
            Self::MeanSquaredError(loss) => loss.forward(pred, target),
            Self::Huber(loss) => loss.forward(pred, target),
        }
    }
}

#[cfg(test)]
mod tests {
    use burn::{backend::NdArray, tensor::ElementConversion};

    use super::*;

    type B = NdArray;

    #[test]
    fn parse_loss_type() {
        assert_eq!("mse".parse::<LossType>(), Ok(LossType::MeanSquaredError));
        assert_eq!("L2".parse::<LossType>(), Ok(LossType::MeanSquaredError));
        assert_eq!("MeanSquaredError".parse::<LossType>(), Ok(LossType::MeanSquaredError));
        assert_eq!("Huber".parse::<LossType>(), Ok(LossType::Huber));
        assert_eq!(
            "l1".parse::<LossType>(),
            Err(HeadError::UnsupportedLossType("l1".to_string()))
        );
    }

    #[test]
    fn init_matches_tag() {
        for loss_type in [LossType::MeanSquaredError, LossType::Huber] {
            assert_eq!(loss_type.init(1.0, 0).loss_type(), loss_type);
        }
    }

    #[test]
    fn mean_per_sample_keeps_batch_axis() {
        let device = Default::default();
        let x = Tensor::<B, 2>::from_floats([[1.0, 3.0], [2.0, 6.0], [0.0, 0.0]], &device);

        let rows = mean_per_sample(x.clone(), 0);
        assert_eq!(rows.dims(), [3]);
        assert_eq!(rows.into_data().value, vec![2.0, 4.0, 0.0]);

        let cols = mean_per_sample(x, 1);
        assert_eq!(cols.dims(), [2]);
        assert_eq!(cols.into_data().value, vec![1.0, 3.0]);
    }

    #[test]
    fn mean_per_sample_higher_rank() {
        let device = Default::default();
        let x = Tensor::<B, 3>::from_floats([[[1.0, 1.0], [3.0, 3.0]], [[0.0, 4.0], [4.0, 0.0]]], &device);
        let per_sample = mean_per_sample(x, 0);
        assert_eq!(per_sample.dims(), [2]);
        assert_eq!(per_sample.into_data().value, vec![2.0, 2.0]);
    }

    #[test]
    #[should_panic]
    fn mean_per_sample_rejects_missing_axis() {
        let device = Default::default();
        let x = Tensor::<B, 2>::zeros([2, 2], &device);
        mean_per_sample(x, 2);
    }

    #[test]
    fn elementwise_loss_dispatch() {
        let device = Default::default();
        let pred = Tensor::<B, 2>::from_floats([[3.0]], &device);
        let target = Tensor::<B, 2>::from_floats([[0.0]], &device);

        let mse = LossType::MeanSquaredError.init(1.0, 0);
        let huber = LossType::Huber.init(1.0, 0);
        let mse: f32 = mse.forward(pred.clone(), target.clone()).into_scalar().elem();
        let huber: f32 = huber.forward(pred, target).into_scalar().elem();

        assert_eq!(mse, 4.5);
        assert_eq!(huber, 2.5);
    }
}
