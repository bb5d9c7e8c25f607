use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::{Result, arch::activations::ActFn};

/// The kind of a `Layer`, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Input,
    Dense,
}

/// A node of a model's graph.
#[derive(Debug, Clone)]
pub enum Layer {
    Input(super::Input),
    Dense(super::Dense),
}
use Layer::*;

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self {
            Input(_) => LayerKind::Input,
            Dense(_) => LayerKind::Dense,
        }
    }

    /// Returns the amount of features this layer outputs per sample.
    pub fn output_size(&self) -> usize {
        match self {
            Input(l) => l.size(),
            Dense(l) => l.units(),
        }
    }

    /// Returns the activation applied by this layer, `Identity` for inputs.
    pub fn act_fn(&self) -> ActFn {
        match self {
            Input(_) => ActFn::Identity,
            Dense(l) => l.act_fn(),
        }
    }

    /// Makes a forward pass over a batch, overwriting the layer's caches.
    ///
    /// # Arguments
    /// * `x` - The input batch, one sample per column.
    ///
    /// # Returns
    /// A view of the activation output.
    pub fn forward(&mut self, x: ArrayView2<f32>) -> Result<ArrayView2<'_, f32>> {
        match self {
            Input(l) => l.forward(x),
            Dense(l) => l.forward(x),
        }
    }

    /// Makes a forward pass over the outputs of several predecessors.
    pub fn forward_merged(&mut self, inputs: &[ArrayView2<f32>]) -> Result<ArrayView2<'_, f32>> {
        match self {
            Input(l) => match inputs {
                [x] => l.forward(x.view()),
                _ => Err(crate::MlErr::shape("input layer", &[inputs.len()], &[1])),
            },
            Dense(l) => l.forward_merged(inputs),
        }
    }

    /// Makes a forward pass over a single sample.
    pub fn forward_sample(&mut self, x: ArrayView1<f32>) -> Result<Array1<f32>> {
        let a = self.forward(x.insert_axis(Axis(1)))?;
        Ok(a.column(0).to_owned())
    }

    /// Returns `W·x + b` for dense layers and `x` for inputs.
    pub fn weighted_output(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        match self {
            Input(l) => l.weighted_output(x),
            Dense(l) => l.weighted_output(x),
        }
    }

    /// The weighted output cached by the last forward pass.
    pub fn z(&self) -> ArrayView2<'_, f32> {
        match self {
            Input(l) => l.output(),
            Dense(l) => l.z(),
        }
    }

    /// The activation output cached by the last forward pass.
    pub fn a(&self) -> ArrayView2<'_, f32> {
        match self {
            Input(l) => l.output(),
            Dense(l) => l.a(),
        }
    }

    pub fn as_dense(&self) -> Option<&super::Dense> {
        match self {
            Dense(l) => Some(l),
            Input(_) => None,
        }
    }

    pub fn as_dense_mut(&mut self) -> Option<&mut super::Dense> {
        match self {
            Dense(l) => Some(l),
            Input(_) => None,
        }
    }
}

impl From<super::Input> for Layer {
    fn from(value: super::Input) -> Self {
        Self::Input(value)
    }
}

impl From<super::Dense> for Layer {
    fn from(value: super::Dense) -> Self {
        Self::Dense(value)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2};

    use super::{ActFn, Array2, Layer, LayerKind};
    use crate::{
        MlErr,
        arch::layers::{Dense as DenseLayer, Init, Input as InputLayer},
    };

    #[test]
    fn input_is_the_identity() {
        let mut input = Layer::from(InputLayer::new(2));
        let x = arr2(&[[1., 2.], [3., 4.]]);

        assert_eq!(input.kind(), LayerKind::Input);
        assert_eq!(input.act_fn(), ActFn::Identity);
        assert_eq!(input.weighted_output(x.view()).unwrap(), x);
        assert_eq!(input.forward(x.view()).unwrap(), x);
        assert_eq!(input.z(), input.a());
    }

    #[test]
    fn input_checks_the_feature_count() {
        let mut input = Layer::from(InputLayer::new(3));
        let x = Array2::zeros((2, 1));

        assert!(matches!(
            input.forward(x.view()),
            Err(MlErr::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn forward_sample_uses_a_single_column() {
        let input = Layer::from(InputLayer::new(2));
        let mut dense = Layer::from(
            DenseLayer::new(1, ActFn::Identity, Init::Ones)
                .connect(&input, &mut rand::rng())
                .unwrap(),
        );

        assert_eq!(dense.kind(), LayerKind::Dense);
        assert_eq!(dense.output_size(), 1);
        assert_eq!(dense.forward_sample(arr1(&[2., 3.]).view()).unwrap(), arr1(&[5.]));
        assert_eq!(dense.a().dim(), (1, 1));
    }
}
