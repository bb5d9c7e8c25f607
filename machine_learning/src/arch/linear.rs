use log::info;
use ndarray::ArrayView2;
use rand::RngCore;

use super::{
    Model,
    graph::{Graph, NodeId},
    layers::{Layer, LayerKind},
    loss::CostFn,
};
use crate::{MlErr, Result};

/// A linear model: a chain of layers where each one feeds the next.
///
/// The layers are held apart until the model is compiled, when they are moved into a chain
/// shaped graph and the execution sequence gets fixed.
#[derive(Debug, Clone, Default)]
pub struct LinearModel {
    pending: Vec<Layer>,
    graph: Graph,
    sequence: Vec<NodeId>,
    cost: Option<CostFn>,
}

impl LinearModel {
    /// Creates a new `LinearModel`.
    ///
    /// # Arguments
    /// * `layers` - The layers of the chain, starting with its `Input` layer.
    ///
    /// # Returns
    /// A new `LinearModel` instance.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        Self {
            pending: layers.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Appends a layer at the end of the chain.
    pub fn push(&mut self, layer: impl Into<Layer>) -> Result<()> {
        if self.cost.is_some() {
            return Err(MlErr::AlreadyCompiled);
        }

        self.pending.push(layer.into());
        Ok(())
    }

    /// The execution sequence, empty until the model is compiled.
    pub fn sequence(&self) -> &[NodeId] {
        &self.sequence
    }
}

impl Model for LinearModel {
    fn compile(&mut self, cost: CostFn, rng: &mut dyn RngCore) -> Result<()> {
        if self.cost.is_some() {
            return Err(MlErr::AlreadyCompiled);
        }

        let mut layers = self.pending.iter().cloned();
        let first = layers.next().ok_or(MlErr::EmptyModel)?;

        if first.kind() != LayerKind::Input {
            return Err(MlErr::NotAnInputLayer);
        }

        let mut graph = Graph::new();
        let mut prev = graph.add_input_node(first)?;

        for layer in layers {
            if layer.kind() == LayerKind::Input {
                return Err(MlErr::NotAnInputLayer);
            }

            let node = graph.add_node(layer)?;
            graph.add_connection(prev, node)?;
            prev = node;
        }

        let sequence = graph.topological_sort()?.to_vec();
        graph.initialise_layers(rng)?;
        graph.freeze();

        info!("compiled linear model with {} layers", sequence.len());
        self.pending.clear();
        self.sequence = sequence;
        self.graph = graph;
        self.cost = Some(cost);
        Ok(())
    }

    fn cost_fn(&self) -> Result<CostFn> {
        self.cost.ok_or(MlErr::NotCompiled)
    }

    fn graph(&self) -> &Graph {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Replays the chain over `x`, each layer consuming the previous one's output.
    fn forward_propagate(&mut self, x: ArrayView2<f32>) -> Result<ArrayView2<'_, f32>> {
        self.cost_fn()?;

        let (&first, rest) = self.sequence.split_first().ok_or(MlErr::EmptyModel)?;
        let mut a = self.graph.layer_mut(first)?.forward(x)?.to_owned();

        for &node in rest {
            a = self.graph.layer_mut(node)?.forward(a.view())?.to_owned();
        }

        let last = rest.last().copied().unwrap_or(first);
        Ok(self.graph.layer(last)?.a())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2};

    use super::*;
    use crate::arch::{
        activations::ActFn,
        layers::{Dense, Init, Input},
    };

    #[test]
    fn compile_requires_a_leading_input() {
        let mut rng = rand::rng();

        let mut empty = LinearModel::default();
        assert!(matches!(
            empty.compile(CostFn::Mse, &mut rng),
            Err(MlErr::EmptyModel)
        ));

        let mut headless = LinearModel::new([Dense::new(2, ActFn::Relu, Init::Ones).into()]);
        assert!(matches!(
            headless.compile(CostFn::Mse, &mut rng),
            Err(MlErr::NotAnInputLayer)
        ));

        let mut two_inputs = LinearModel::new([Input::new(2).into(), Input::new(2).into()]);
        assert!(matches!(
            two_inputs.compile(CostFn::Mse, &mut rng),
            Err(MlErr::NotAnInputLayer)
        ));
    }

    #[test]
    fn compiled_models_are_frozen() {
        let mut model = LinearModel::new([Input::new(1).into()]);
        assert!(!model.is_compiled());
        assert!(matches!(
            model.forward_propagate(arr2(&[[1.]]).view()),
            Err(MlErr::NotCompiled)
        ));

        model.compile(CostFn::Mse, &mut rand::rng()).unwrap();
        assert!(model.is_compiled());
        assert!(matches!(
            model.push(Dense::new(1, ActFn::Relu, Init::Ones)),
            Err(MlErr::AlreadyCompiled)
        ));
        assert!(model.graph().is_frozen());
        assert!(matches!(
            model.graph_mut().add_node(Dense::new(1, ActFn::Relu, Init::Ones)),
            Err(MlErr::AlreadyCompiled)
        ));
    }

    #[test]
    fn zero_sized_layers_fail_to_compile() {
        let mut model = LinearModel::new([
            Input::new(2).into(),
            Dense::new(0, ActFn::Identity, Init::Ones).into(),
        ]);

        assert!(matches!(
            model.compile(CostFn::Mse, &mut rand::rng()),
            Err(MlErr::ShapeMismatch { .. })
        ));
        assert!(!model.is_compiled());

        let mut model = LinearModel::new([Input::new(0).into()]);
        assert!(model.compile(CostFn::Mse, &mut rand::rng()).is_err());
    }

    #[test]
    fn forward_replays_the_chain() {
        let mut model = LinearModel::new([
            Input::new(2).into(),
            Dense::new(3, ActFn::Identity, Init::Ones).into(),
            Dense::new(1, ActFn::Relu, Init::Ones)
                .with_bias_init(Init::Ones)
                .into(),
        ]);
        model.compile(CostFn::Mse, &mut rand::rng()).unwrap();

        assert_eq!(model.input_size().unwrap(), 2);
        assert_eq!(model.output_size().unwrap(), 1);
        assert_eq!(model.sequence().len(), 3);

        let x = arr2(&[[1., -2.], [2., -2.]]);
        for _ in 0..2 {
            let y = model.forward_propagate(x.view()).unwrap();
            assert_eq!(y, arr2(&[[10., 0.]]));
        }

        let predictions = model.predict(x.view()).unwrap();
        assert_eq!(predictions, vec![arr1(&[10.]), arr1(&[0.])]);
    }
}
