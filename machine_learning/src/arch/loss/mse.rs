use ndarray::{Array2, ArrayView2, Axis};

use super::{LossFn, loss_fn::check_shapes};
use crate::Result;

/// Mean squared error loss function, `½·Σ(y − ŷ)²` per sample.
#[derive(Default, Clone, Copy)]
pub struct Mse;

impl Mse {
    /// Returns a new `Mse`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Mse {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32> {
        check_shapes(&y_pred, &y)?;

        let per_sample = (&y - &y_pred).mapv(|x| x.powi(2)).sum_axis(Axis(0)) * 0.5;
        Ok(per_sample.mean().unwrap_or_default())
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>> {
        check_shapes(&y_pred, &y)?;
        Ok(&y_pred - &y)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;

    use super::*;

    #[test]
    fn halves_the_squared_error_and_averages_over_samples() {
        // two samples (columns): errors (1, 2) and (0, 2)
        let y_pred = arr2(&[[1., 0.], [2., 2.]]);
        let y = arr2(&[[0., 0.], [0., 0.]]);

        // (0.5 * 5 + 0.5 * 4) / 2
        assert_eq!(Mse.loss(y_pred.view(), y.view()).unwrap(), 2.25);
        assert_eq!(Mse.loss_prime(y_pred.view(), y.view()).unwrap(), y_pred);
    }

    #[test]
    fn rejects_mismatching_batches() {
        let y_pred = arr2(&[[1., 0.]]);
        let y = arr2(&[[1.], [0.]]);

        assert!(Mse.loss(y_pred.view(), y.view()).is_err());
        assert!(Mse.loss_prime(y_pred.view(), y.view()).is_err());
    }
}
