use log::{debug, info, warn};
use ndarray::ArrayView2;

use crate::{
    MlErr, Result,
    arch::{Model, loss::LossFn},
    dataset::Dataset,
    optimization::{Optimizer, backprop},
    training::hyperparams::positive_count,
};

/// Drives a model's training with mini-batch gradient descent.
///
/// Besides running whole epochs through `train`, every batch can be driven by hand with
/// `step`, which lets callers stop between any two batches.
pub struct ModelTrainer<O: Optimizer> {
    optimizer: O,
    epochs: usize,
    batch_size: usize,
}

impl<O: Optimizer> ModelTrainer<O> {
    /// Returns a new `ModelTrainer`.
    ///
    /// # Arguments
    /// * `optimizer` - The rule used to update the parameters after every batch.
    /// * `epochs` - The amount of passes over the dataset per `train` call.
    /// * `batch_size` - The amount of samples per batch, the last one of an epoch may be shorter.
    ///
    /// # Returns
    /// The trainer or `InvalidHyperparameter` if `epochs` or `batch_size` is zero.
    pub fn new(optimizer: O, epochs: usize, batch_size: usize) -> Result<Self> {
        Ok(Self {
            optimizer,
            epochs: positive_count("epochs", epochs)?,
            batch_size: positive_count("batch_size", batch_size)?,
        })
    }

    /// Trains `model` for `epochs` epochs over `dataset`, rewinding it after every epoch.
    ///
    /// # Returns
    /// The mean batch cost of every epoch, or the first error found, which aborts the run.
    pub fn train<M: Model + ?Sized>(&mut self, model: &mut M, dataset: &mut Dataset) -> Result<Vec<f32>> {
        self.check_dataset(model, dataset)?;

        let mut losses = Vec::with_capacity(self.epochs);
        dataset.reset();

        for epoch in 0..self.epochs {
            let mut total = 0.;
            let mut batches = 0;

            while let Some((x, y)) = dataset.next_batch(self.batch_size)? {
                let loss = self.step(model, x.view(), y.view())?;
                debug!("epoch={epoch} batch={batches} width={} loss={loss}", x.ncols());

                total += loss;
                batches += 1;
            }

            dataset.reset();

            if batches == 0 {
                warn!("epoch {epoch} yielded no batches");
                losses.push(0.);
                continue;
            }

            let loss = total / batches as f32;
            info!("epoch {epoch}: loss={loss}");
            losses.push(loss);
        }

        Ok(losses)
    }

    /// Trains `model` over a single batch: forward pass, cost, backpropagation and update.
    ///
    /// # Arguments
    /// * `x` - The input batch, one sample per column.
    /// * `y` - The expected output batch.
    ///
    /// # Returns
    /// The batch cost, computed before the update.
    pub fn step<M: Model + ?Sized>(
        &mut self,
        model: &mut M,
        x: ArrayView2<f32>,
        y: ArrayView2<f32>,
    ) -> Result<f32> {
        let cost = model.cost_fn()?;

        let y_pred = model.forward_propagate(x)?;
        let loss = cost.loss(y_pred, y)?;

        let errors = backprop::layer_errors(model.graph(), &cost, y)?;
        backprop::apply(model.graph_mut(), &errors, &mut self.optimizer)?;

        Ok(loss)
    }

    fn check_dataset<M: Model + ?Sized>(&self, model: &M, dataset: &Dataset) -> Result<()> {
        let expected = [model.input_size()?, model.output_size()?];
        let got = [dataset.input_size(), dataset.output_size()];

        if !dataset.is_empty() && got != expected {
            return Err(MlErr::shape("dataset", &got, &expected));
        }

        Ok(())
    }
}
