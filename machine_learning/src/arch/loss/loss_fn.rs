use ndarray::{Array2, ArrayView2};

use crate::Result;

/// A cost function over batched predictions, one sample per column.
pub trait LossFn {
    /// The cost of `y_pred` against `y`, computed per sample and averaged over the batch.
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32>;

    /// The derivative of the cost with respect to each prediction, `∇ₐC`, with the same
    /// shape as `y_pred`.
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>>;
}

/// Fails with a `ShapeMismatch` unless both batches have the same shape.
pub(super) fn check_shapes(y_pred: &ArrayView2<f32>, y: &ArrayView2<f32>) -> Result<()> {
    if y_pred.shape() != y.shape() {
        return Err(crate::MlErr::shape("cost", y.shape(), y_pred.shape()));
    }

    Ok(())
}
