use ndarray::ArrayView1;

use super::Optimizer;
use crate::{
    Result,
    arch::{layers::Dense, ops},
    training::hyperparams::positive_rate,
};

/// Gradient descent optimization algorithm.
#[derive(Debug, Clone, Copy)]
pub struct GradientDescent {
    learning_rate: f32,
}

impl GradientDescent {
    /// Returns a new `GradientDescent`.
    ///
    /// # Arguments
    /// * `learning_rate` - The *length* of the steps taken on `update_params`.
    ///
    /// # Returns
    /// The optimizer or `InvalidHyperparameter` if the rate isn't a positive number.
    pub fn new(learning_rate: f32) -> Result<Self> {
        Ok(Self {
            learning_rate: positive_rate("learning_rate", learning_rate)?,
        })
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}

impl Optimizer for GradientDescent {
    /// Updates the parameters according to the algorithm's learning rule, that is, making a step in
    /// the opposite direction of the gradient, with a length of `learning_rate`:
    /// `b ← b − η·δ̄` and `W ← W − η·(ā ⊗ δ̄)ᵀ`.
    fn update_params(
        &mut self,
        dense: &mut Dense,
        delta: ArrayView1<f32>,
        input: ArrayView1<f32>,
    ) -> Result<()> {
        let lr = self.learning_rate;

        let dw = ops::transpose(ops::outer_product(input, delta).view()) * -lr;
        let db = delta.to_owned() * -lr;

        dense.modify_weights(dw.view())?;
        dense.modify_bias(db.view())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2};

    use super::*;
    use crate::arch::{activations::ActFn, layers::Init};

    #[test]
    fn steps_against_the_gradient() {
        let mut dense = Dense::new(2, ActFn::Identity, Init::Zeroes);
        dense.initialise(3, &mut rand::rng()).unwrap();

        let mut optimizer = GradientDescent::new(0.5).unwrap();
        optimizer
            .update_params(&mut dense, arr1(&[1., -2.]).view(), arr1(&[1., 0., 2.]).view())
            .unwrap();

        assert_eq!(
            dense.weights().unwrap(),
            arr2(&[[-0.5, 0., -1.], [1., 0., 2.]])
        );
        assert_eq!(dense.bias().unwrap(), arr1(&[-0.5, 1.]));
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let mut dense = Dense::new(2, ActFn::Identity, Init::Zeroes);
        dense.initialise(3, &mut rand::rng()).unwrap();

        let res = GradientDescent::new(0.1).unwrap().update_params(
            &mut dense,
            arr1(&[1., 1.]).view(),
            arr1(&[1., 1.]).view(),
        );
        assert!(res.is_err());
    }

    #[test]
    fn learning_rate_must_be_positive() {
        for lr in [0., -1., f32::NAN] {
            assert!(matches!(
                GradientDescent::new(lr),
                Err(crate::MlErr::InvalidHyperparameter { name: "learning_rate", .. })
            ));
        }
    }
}
