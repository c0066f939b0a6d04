use burn::{
    module::Param,
    nn::{Linear, LinearConfig},
    prelude::*,
};

use crate::assert_interval;

/// Configuration to create a [`LazyLinear`] layer
#[derive(Config, Debug)]
pub struct LazyLinearConfig {
    /// The size of each output sample
    pub d_output: usize,
    /// Whether the layer learns an additive bias
    #[config(default = true)]
    pub bias: bool,
}

impl LazyLinearConfig {
    /// Create an unbound layer, its input width is taken from the first input it sees
    pub fn init<B: Backend>(&self) -> LazyLinear<B> {
        LazyLinear {
            linear: None,
            d_output: self.d_output,
            bias: self.bias,
        }
    }
}

/// A linear layer whose input width is inferred from its first input
///
/// The layer starts unbound, holding only its output width. The first call to
/// [`forward`](LazyLinear::forward) (or an explicit [`bind`](LazyLinear::bind)) allocates the
/// weight `[d_input, d_output]` on the input's device. Once bound, the input width never changes.
#[derive(Module, Debug)]
pub struct LazyLinear<B: Backend> {
    linear: Option<Linear<B>>,
    d_output: usize,
    bias: bool,
}

fn init_linear<B: Backend>(
    d_input: usize,
    d_output: usize,
    bias: bool,
    device: &B::Device,
) -> Linear<B> {
    log::debug!("binding linear layer to input width {d_input} ({d_output} outputs)");
    LinearConfig::new(d_input, d_output)
        .with_bias(bias)
        .init(device)
}

fn assert_width<B: Backend>(linear: &Linear<B>, d_input: usize) {
    let bound = linear.weight.val().dims()[0];
    assert_eq!(
        bound, d_input,
        "Linear layer is bound to input width {bound}, got an input of width {d_input}."
    );
}

impl<B: Backend> LazyLinear<B> {
    pub fn d_output(&self) -> usize {
        self.d_output
    }

    /// The input width, once bound
    pub fn d_input(&self) -> Option<usize> {
        self.linear
            .as_ref()
            .map(|linear| linear.weight.val().dims()[0])
    }

    pub fn is_bound(&self) -> bool {
        self.linear.is_some()
    }

    /// The underlying layer, once bound
    pub fn linear(&self) -> Option<&Linear<B>> {
        self.linear.as_ref()
    }

    /// Allocate the weights for inputs of width `d_input`
    ///
    /// **Panics** if the layer is already bound to a different width
    pub fn bind(self, d_input: usize, device: &B::Device) -> Self {
        match self.linear {
            Some(ref linear) => {
                assert_width(linear, d_input);
                self
            }
            None => Self {
                linear: Some(init_linear(d_input, self.d_output, self.bias, device)),
                ..self
            },
        }
    }

    /// Applies the affine transform to the last dimension of the input, binding the layer if needed
    ///
    /// # Shapes
    ///
    /// - input: `[..., d_input]`
    /// - output: `[..., d_output]`
    ///
    /// **Panics** if the layer is bound and `d_input` differs from the bound width
    pub fn forward<const D: usize>(&mut self, input: Tensor<B, D>) -> Tensor<B, D> {
        let d_input = input.dims()[D - 1];
        let (d_output, bias) = (self.d_output, self.bias);
        let device = input.device();
        let linear = self
            .linear
            .get_or_insert_with(|| init_linear(d_input, d_output, bias, &device));
        assert_width(linear, d_input);
        linear.forward(input)
    }

    /// Soft update the parameters toward those of `other`
    ///
    /// θ′ ← τθ + (1 − τ)θ′
    ///
    /// An unbound layer adopts `other`'s parameters outright; nothing changes when `other` is unbound.
    ///
    /// **Panics** if `tau` is not in the interval `[0, 1]`
    pub fn soft_update(self, other: &Self, tau: f32) -> Self {
        assert_interval!(tau, 0.0, 1.0);
        let linear = match (self.linear, &other.linear) {
            (Some(mut this), Some(that)) => {
                this.weight = polyak(this.weight, &that.weight, tau);
                this.bias = this
                    .bias
                    .zip(that.bias.as_ref())
                    .map(|(bias, source)| polyak(bias, source, tau));
                Some(this)
            }
            (None, Some(that)) => Some(that.clone()),
            (this, None) => this,
        };
        Self { linear, ..self }
    }
}

/// τ · source + (1 − τ) · target, keeping the target's parameter id
fn polyak<B: Backend, const D: usize>(
    target: Param<Tensor<B, D>>,
    source: &Param<Tensor<B, D>>,
    tau: f32,
) -> Param<Tensor<B, D>> {
    target.map(|tensor| tensor * (1.0 - tau) + source.val() * tau)
}

#[cfg(test)]
impl<B: Backend> LazyLinear<B> {
    /// Overwrite every weight with `weight` and every bias with `bias`
    pub(crate) fn fill(mut self, weight: f32, bias: f32) -> Self {
        self.linear = self.linear.map(|mut linear| {
            linear.weight = linear.weight.map(|w| w.zeros_like() + weight);
            linear.bias = linear.bias.map(|b| b.map(|b| b.zeros_like() + bias));
            linear
        });
        self
    }

    /// Overwrite the weight matrix, `[d_input, d_output]`
    pub(crate) fn with_weight(mut self, weight: Tensor<B, 2>) -> Self {
        self.linear = self.linear.map(|mut linear| {
            linear.weight = linear.weight.map(|_| weight.clone());
            linear
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    use super::*;

    type B = NdArray;

    #[test]
    fn binds_on_first_forward() {
        let device = Default::default();
        let mut layer = LazyLinearConfig::new(3).init::<B>();
        assert!(!layer.is_bound());
        assert_eq!(layer.d_input(), None);

        let x = Tensor::<B, 2>::zeros([2, 5], &device);
        assert_eq!(layer.forward(x).dims(), [2, 3]);
        assert!(layer.is_bound());
        assert_eq!(layer.d_input(), Some(5));

        // The batch dimension stays free after binding
        let x = Tensor::<B, 2>::zeros([7, 5], &device);
        assert_eq!(layer.forward(x).dims(), [7, 3]);
    }

    #[test]
    #[should_panic]
    fn rejects_width_change() {
        let device = Default::default();
        let mut layer = LazyLinearConfig::new(3).init::<B>();
        layer.forward(Tensor::<B, 2>::zeros([2, 5], &device));
        layer.forward(Tensor::<B, 2>::zeros([2, 4], &device));
    }

    #[test]
    fn explicit_bind() {
        let device = Default::default();
        let layer = LazyLinearConfig::new(2)
            .with_bias(false)
            .init::<B>()
            .bind(4, &device);
        assert_eq!(layer.d_input(), Some(4));
        assert!(layer.linear().is_some_and(|linear| linear.bias.is_none()));

        // Rebinding to the same width keeps the existing weights
        let mut layer = layer.fill(1.0, 0.0).bind(4, &device);
        let x = Tensor::<B, 2>::from_floats([[1.0, 2.0, 3.0, 4.0]], &device);
        assert_eq!(layer.forward(x).into_data().value, vec![10.0, 10.0]);
    }

    #[test]
    fn affine_output() {
        let device = Default::default();
        let mut layer = LazyLinearConfig::new(2)
            .init::<B>()
            .bind(3, &device)
            .fill(1.0, 0.5);
        let x = Tensor::<B, 2>::from_floats([[1.0, 2.0, 3.0], [-1.0, 0.0, 1.0]], &device);
        assert_eq!(
            layer.forward(x).into_data().value,
            vec![6.5, 6.5, 0.5, 0.5]
        );
    }

    #[test]
    fn soft_update() {
        let device = Default::default();
        let policy = LazyLinearConfig::new(2).init::<B>().bind(2, &device).fill(1.0, 1.0);
        let target = LazyLinearConfig::new(2).init::<B>().bind(2, &device).fill(0.0, 0.0);
        let x = Tensor::<B, 2>::from_floats([[1.0, 1.0]], &device);

        let mut half = target.soft_update(&policy, 0.5);
        assert_eq!(half.forward(x.clone()).into_data().value, vec![1.5, 1.5]);

        let mut full = half.soft_update(&policy, 1.0);
        assert_eq!(full.forward(x).into_data().value, vec![3.0, 3.0]);
    }

    #[test]
    fn soft_update_without_bias() {
        let device = Default::default();
        let config = LazyLinearConfig::new(2).with_bias(false);
        let policy = config.init::<B>().bind(2, &device).fill(1.0, 0.0);
        let target = config.init::<B>().bind(2, &device).fill(0.0, 0.0);
        let x = Tensor::<B, 2>::from_floats([[1.0, 1.0]], &device);

        let mut updated = target.soft_update(&policy, 0.25);
        assert!(updated.linear().is_some_and(|linear| linear.bias.is_none()));
        assert_eq!(updated.forward(x).into_data().value, vec![0.5, 0.5]);
    }

    #[test]
    fn soft_update_unbound_adopts_other() {
        let device = Default::default();
        let policy = LazyLinearConfig::new(2).init::<B>().bind(3, &device);
        let target = LazyLinearConfig::new(2).init::<B>().soft_update(&policy, 0.1);
        assert_eq!(target.d_input(), Some(3));
    }

    #[test]
    #[should_panic]
    fn soft_update_rejects_tau() {
        let layer = LazyLinearConfig::new(2).init::<B>();
        let other = layer.clone();
        layer.soft_update(&other, 1.5);
    }
}
