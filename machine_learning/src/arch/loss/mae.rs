use ndarray::{Array2, ArrayView2, Axis};

use super::{LossFn, loss_fn::check_shapes};
use crate::Result;

/// Mean absolute error loss function, `mean(|y − ŷ|)` per sample.
#[derive(Default, Clone, Copy)]
pub struct Mae;

impl Mae {
    /// Returns a new `Mae`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Mae {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32> {
        check_shapes(&y_pred, &y)?;

        let per_sample = (&y - &y_pred).mapv(f32::abs).mean_axis(Axis(0));
        Ok(per_sample.and_then(|c| c.mean()).unwrap_or_default())
    }

    /// The sign of `ŷ − y`, a tie yields `0`.
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>> {
        check_shapes(&y_pred, &y)?;

        let grad = (&y_pred - &y).mapv(|d| {
            if d > 0. {
                1.
            } else if d < 0. {
                -1.
            } else {
                0.
            }
        });

        Ok(grad)
    }
}
