use ndarray::{Array2, ArrayView2};

use crate::{MlErr, Result};

/// The entry point of a model: passes its input through untouched.
#[derive(Debug, Clone)]
pub struct Input {
    size: usize,

    // Forward metadata
    a: Array2<f32>,
}

impl Input {
    /// Creates a new `Input` layer.
    ///
    /// # Arguments
    /// * `size` - The amount of features of every sample fed to the model.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            a: Array2::zeros((size, 0)),
        }
    }

    /// Returns the amount of features this layer expects and outputs.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Caches `x` as this layer's output.
    ///
    /// # Returns
    /// A view of the cached output or a `ShapeMismatch` if `x` doesn't have `size` rows.
    pub fn forward(&mut self, x: ArrayView2<f32>) -> Result<ArrayView2<'_, f32>> {
        self.check(&x)?;
        self.a = x.to_owned();
        Ok(self.a.view())
    }

    /// The identity, shape-checked.
    pub fn weighted_output(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check(&x)?;
        Ok(x.to_owned())
    }

    /// The output cached by the last forward pass.
    pub fn output(&self) -> ArrayView2<'_, f32> {
        self.a.view()
    }

    fn check(&self, x: &ArrayView2<f32>) -> Result<()> {
        if x.nrows() != self.size {
            return Err(MlErr::shape("input layer", x.shape(), &[self.size, x.ncols()]));
        }

        Ok(())
    }
}
