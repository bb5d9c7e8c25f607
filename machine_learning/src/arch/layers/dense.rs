use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::Rng;

use super::{Init, Layer, Merge};
use crate::{
    MlErr, Result,
    arch::{activations::ActFn, ops},
};

/// A fully connected layer: `a = σ(W·x + b)`.
///
/// `W` is shaped `units × input_size`, so every column of a batch is a sample. The
/// parameters don't exist until the input size is known, which is either when the layer
/// is connected to a single predecessor or when the model owning it gets compiled.
///
/// Every forward pass overwrites the cached input, weighted output and activation output,
/// backpropagation reads them back, so a layer can't serve two forward passes at once.
#[derive(Debug, Clone)]
pub struct Dense {
    units: usize,
    act_fn: ActFn,
    weight_init: Init,
    bias_init: Init,
    merge: Option<Merge>,
    input_size: Option<usize>,
    params: Option<(Array2<f32>, Array1<f32>)>,

    // Forward metadata
    x: Array2<f32>,
    z: Array2<f32>,
    a: Array2<f32>,
}

impl Dense {
    /// Creates a new, still uninitialised, `Dense` layer. Biases start at zero unless
    /// `with_bias_init` says otherwise.
    ///
    /// # Arguments
    /// * `units` - The amount of neurons, that is, the output size.
    /// * `act_fn` - The activation applied to the weighted output.
    /// * `weight_init` - How the weights get filled once the input size is known.
    pub fn new(units: usize, act_fn: ActFn, weight_init: Init) -> Self {
        Self {
            units,
            act_fn,
            weight_init,
            bias_init: Init::Zeroes,
            merge: None,
            input_size: None,
            params: None,
            x: Array2::zeros((0, 0)),
            z: Array2::zeros((units, 0)),
            a: Array2::zeros((units, 0)),
        }
    }

    pub fn with_bias_init(mut self, bias_init: Init) -> Self {
        self.bias_init = bias_init;
        self
    }

    /// Tags the layer with the merge used when it has more than one predecessor. The input
    /// size is resolved when the model is compiled.
    pub fn with_merge(mut self, merge: Merge) -> Self {
        self.merge = Some(merge);
        self
    }

    /// Connects this layer after `prev`, initialising its parameters right away.
    ///
    /// # Arguments
    /// * `prev` - The single predecessor of this layer.
    /// * `rng` - The generator used by random initialisation policies.
    pub fn connect<R: Rng + ?Sized>(mut self, prev: &Layer, rng: &mut R) -> Result<Self> {
        self.initialise(prev.output_size(), rng)?;
        Ok(self)
    }

    /// Makes this layer merge the outputs of `prevs`, in the given order.
    ///
    /// # Returns
    /// The layer, with its input size resolved but its parameters still uninitialised, or
    /// `MergeShapeMismatch` if an `Add` merge gets predecessors of different sizes.
    pub fn merge(mut self, prevs: &[&Layer], merge: Merge) -> Result<Self> {
        let sizes: Vec<_> = prevs.iter().map(|l| l.output_size()).collect();
        self.input_size = Some(merge.input_size(&sizes)?);
        self.merge = Some(merge);
        Ok(self)
    }

    /// Fills the weights and biases following the layer's policies. This can only happen once.
    ///
    /// # Arguments
    /// * `input_size` - The amount of features this layer consumes.
    /// * `rng` - The generator used by random initialisation policies.
    pub fn initialise<R: Rng + ?Sized>(&mut self, input_size: usize, rng: &mut R) -> Result<()> {
        if self.params.is_some() {
            return Err(MlErr::AlreadyInitialised);
        }

        match self.input_size {
            Some(expected) if expected != input_size => {
                return Err(MlErr::shape("layer input", &[input_size], &[expected]));
            }
            _ => {}
        }

        let w = self.weight_init.matrix(self.units, input_size, rng)?;
        let b = self.bias_init.vector(self.units, input_size, rng)?;

        self.input_size = Some(input_size);
        self.params = Some((w, b));
        Ok(())
    }

    pub fn is_initialised(&self) -> bool {
        self.params.is_some()
    }

    pub fn units(&self) -> usize {
        self.units
    }

    pub fn act_fn(&self) -> ActFn {
        self.act_fn
    }

    pub fn merge_type(&self) -> Option<Merge> {
        self.merge
    }

    /// The amount of features this layer consumes, once it's known.
    pub fn input_size(&self) -> Option<usize> {
        self.input_size
    }

    pub fn weights(&self) -> Result<ArrayView2<'_, f32>> {
        let (w, _) = self.params.as_ref().ok_or(MlErr::NotInitialised)?;
        Ok(w.view())
    }

    pub fn bias(&self) -> Result<ArrayView1<'_, f32>> {
        let (_, b) = self.params.as_ref().ok_or(MlErr::NotInitialised)?;
        Ok(b.view())
    }

    /// Adds `delta` to the weights.
    pub fn modify_weights(&mut self, delta: ArrayView2<f32>) -> Result<()> {
        let (w, _) = self.params.as_mut().ok_or(MlErr::NotInitialised)?;
        *w = ops::add(w.view(), delta)?;
        Ok(())
    }

    /// Adds `delta` to the biases.
    pub fn modify_bias(&mut self, delta: ArrayView1<f32>) -> Result<()> {
        let (_, b) = self.params.as_mut().ok_or(MlErr::NotInitialised)?;
        *b = ops::add(b.view(), delta)?;
        Ok(())
    }

    /// Replaces the parameters, initialising the layer if it wasn't yet.
    ///
    /// # Returns
    /// `IncompatibleParameters` if the shapes don't match the ones this layer declares.
    pub fn set_params(&mut self, w: Array2<f32>, b: Array1<f32>) -> Result<()> {
        let expected = self.param_shape()?;
        let got = (w.nrows(), w.ncols(), b.len());

        if got != expected {
            return Err(MlErr::IncompatibleParameters { got, expected });
        }

        self.params = Some((w, b));
        Ok(())
    }

    /// The declared `(rows, columns, bias length)` of this layer's parameters.
    pub fn param_shape(&self) -> Result<(usize, usize, usize)> {
        let input_size = self.input_size.ok_or(MlErr::NotInitialised)?;
        Ok((self.units, input_size, self.units))
    }

    /// Computes `W·x + b` without activating it or touching the caches.
    pub fn weighted_output(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let (w, b) = self.params.as_ref().ok_or(MlErr::NotInitialised)?;
        let mut z = ops::multiply(w.view(), x)?;

        for mut col in z.columns_mut() {
            col += b;
        }

        Ok(z)
    }

    /// Computes `W·x + b` for a single sample.
    pub fn weighted_output_sample(&self, x: ArrayView1<f32>) -> Result<Array1<f32>> {
        let (w, b) = self.params.as_ref().ok_or(MlErr::NotInitialised)?;
        let z = ops::multiply_vec(w.view(), x)?;
        ops::add(z.view(), b.view())
    }

    /// Makes a forward pass over a batch, one sample per column.
    ///
    /// # Returns
    /// A view of the cached activation output.
    pub fn forward(&mut self, x: ArrayView2<f32>) -> Result<ArrayView2<'_, f32>> {
        self.z = self.weighted_output(x)?;
        self.a = self.act_fn.apply(self.z.view());
        self.x = x.to_owned();
        Ok(self.a.view())
    }

    /// Merges the outputs of every predecessor, in order, and makes a forward pass over
    /// the result.
    pub fn forward_merged(&mut self, inputs: &[ArrayView2<f32>]) -> Result<ArrayView2<'_, f32>> {
        if let [x] = inputs {
            return self.forward(x.view());
        }

        let Some(merge) = self.merge else {
            return Err(MlErr::shape("unmerged layer inputs", &[inputs.len()], &[1]));
        };

        let x = merge.apply(inputs)?;
        self.z = self.weighted_output(x.view())?;
        self.a = self.act_fn.apply(self.z.view());
        self.x = x;
        Ok(self.a.view())
    }

    /// The merged input consumed by the last forward pass.
    pub fn input(&self) -> ArrayView2<'_, f32> {
        self.x.view()
    }

    /// The weighted output cached by the last forward pass.
    pub fn z(&self) -> ArrayView2<'_, f32> {
        self.z.view()
    }

    /// The activation output cached by the last forward pass.
    pub fn a(&self) -> ArrayView2<'_, f32> {
        self.a.view()
    }
}
