use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rand::RngCore;

use super::{graph::Graph, loss::CostFn, ops};
use crate::{
    MlErr, Result,
    dataset::Dataset,
    optimization::GradientDescent,
    training::{Hyperparams, ModelTrainer},
};

/// The contract shared by every model front end.
///
/// A model is under construction until `compile` is called, after which its structure is
/// frozen and it can be used for inference and training.
pub trait Model {
    /// Freezes the model's structure, sorting its layers and initialising every parameter
    /// that still lacks one.
    ///
    /// # Arguments
    /// * `cost` - The cost function used for training.
    /// * `rng` - The generator used by random initialisation policies.
    fn compile(&mut self, cost: CostFn, rng: &mut dyn RngCore) -> Result<()>;

    /// Returns the cost function the model was compiled with.
    fn cost_fn(&self) -> Result<CostFn>;

    /// The underlying graph of the model. Empty until the model gets compiled for chains.
    fn graph(&self) -> &Graph;

    fn graph_mut(&mut self) -> &mut Graph;

    fn is_compiled(&self) -> bool {
        self.cost_fn().is_ok()
    }

    /// Makes a forward pass over a batch, one sample per column.
    ///
    /// # Returns
    /// A view of the output layer's activation.
    fn forward_propagate(&mut self, x: ArrayView2<f32>) -> Result<ArrayView2<'_, f32>> {
        self.cost_fn()?;
        self.graph_mut().forward(x)
    }

    /// Makes a forward pass over a single sample.
    fn forward_sample(&mut self, x: ArrayView1<f32>) -> Result<Array1<f32>> {
        let a = self.forward_propagate(x.insert_axis(Axis(1)))?;
        Ok(a.column(0).to_owned())
    }

    /// Runs a batch through the model and splits the output into one prediction per sample.
    fn predict(&mut self, x: ArrayView2<f32>) -> Result<Vec<Array1<f32>>> {
        let a = self.forward_propagate(x)?;
        Ok(ops::split_into_vectors(a))
    }

    /// The amount of features the model consumes per sample.
    fn input_size(&self) -> Result<usize> {
        let graph = self.graph();
        let input = graph.input_node().ok_or(MlErr::NotCompiled)?;
        Ok(graph.layer(input)?.output_size())
    }

    /// The amount of features the model outputs per sample.
    fn output_size(&self) -> Result<usize> {
        let graph = self.graph();
        Ok(graph.layer(graph.output_node()?)?.output_size())
    }

    /// Trains the model with mini-batch gradient descent.
    ///
    /// # Arguments
    /// * `dataset` - The training data, rewound after every epoch.
    /// * `hyperparams` - The epochs, batch size and learning rate.
    ///
    /// # Returns
    /// The mean cost of every epoch.
    fn train(&mut self, dataset: &mut Dataset, hyperparams: &Hyperparams) -> Result<Vec<f32>> {
        self.cost_fn()?;
        hyperparams.validate()?;

        let optimizer = GradientDescent::new(hyperparams.learning_rate)?;
        let mut trainer = ModelTrainer::new(optimizer, hyperparams.epochs, hyperparams.batch_size)?;
        trainer.train(self, dataset)
    }
}
