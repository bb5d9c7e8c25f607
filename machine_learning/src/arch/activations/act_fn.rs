use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::arch::ops;

/// The nonlinearity applied by a layer to its weighted output.
///
/// Every variant pairs the function with its derivative, which is only used while
/// backpropagating.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFn {
    Relu,
    Sigmoid,
    Tanh,
    Silu,
    /// No activation, the weighted output is passed through as is.
    #[default]
    Identity,
}
use ActFn::*;

impl ActFn {
    pub fn f(&self, z: f32) -> f32 {
        match self {
            Relu => super::Relu.f(z),
            Sigmoid => super::Sigmoid.f(z),
            Tanh => super::Tanh.f(z),
            Silu => super::Silu.f(z),
            Identity => z,
        }
    }

    pub fn df(&self, z: f32) -> f32 {
        match self {
            Relu => super::Relu.df(z),
            Sigmoid => super::Sigmoid.df(z),
            Tanh => super::Tanh.df(z),
            Silu => super::Silu.df(z),
            Identity => 1.,
        }
    }

    /// Applies the activation to every element of `z`.
    pub fn apply(&self, z: ArrayView2<f32>) -> Array2<f32> {
        let mut a = z.to_owned();
        ops::vectorise(&mut a, |z| self.f(z));
        a
    }

    /// Applies the derivative of the activation to every element of `z`.
    pub fn derivative(&self, z: ArrayView2<f32>) -> Array2<f32> {
        let mut d = z.to_owned();
        ops::vectorise(&mut d, |z| self.df(z));
        d
    }
}
