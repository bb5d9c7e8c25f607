use ndarray::ArrayView1;

use crate::{Result, arch::layers::Dense};

/// A parameter update rule.
pub trait Optimizer {
    /// Updates the parameters of a dense layer given its batch-averaged error and input.
    ///
    /// # Arguments
    /// * `dense` - The layer whose weights and biases are modified.
    /// * `delta` - The layer's error `δ̄`, one entry per unit.
    /// * `input` - The merged input `ā` consumed by the layer, one entry per weight column.
    fn update_params(
        &mut self,
        dense: &mut Dense,
        delta: ArrayView1<f32>,
        input: ArrayView1<f32>,
    ) -> Result<()>;
}
