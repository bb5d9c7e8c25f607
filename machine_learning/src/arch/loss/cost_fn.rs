use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::{LossFn, Mae, Mse};
use crate::Result;

/// Identifies the cost function a model is compiled with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostFn {
    #[default]
    Mse,
    Mae,
}

impl LossFn for CostFn {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32> {
        match self {
            CostFn::Mse => Mse.loss(y_pred, y),
            CostFn::Mae => Mae.loss(y_pred, y),
        }
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>> {
        match self {
            CostFn::Mse => Mse.loss_prime(y_pred, y),
            CostFn::Mae => Mae.loss_prime(y_pred, y),
        }
    }
}
