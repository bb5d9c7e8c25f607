use log::info;
use rand::RngCore;

use super::{
    Model,
    graph::{Graph, NodeId},
    layers::{Dense, Input, Merge},
    loss::CostFn,
};
use crate::{MlErr, Result};

/// A model whose layers form an arbitrary DAG with one input and one output.
#[derive(Debug, Clone, Default)]
pub struct ComplexModel {
    graph: Graph,
    cost: Option<CostFn>,
}

impl ComplexModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the input layer of the model.
    pub fn add_input_layer(&mut self, input: Input) -> Result<NodeId> {
        self.check_open()?;
        self.graph.add_input_node(input)
    }

    /// Adds `layer` fed by the single node `prev`.
    pub fn add_layer(&mut self, prev: NodeId, layer: Dense) -> Result<NodeId> {
        self.check_open()?;
        self.graph.add_node_after(&[prev], layer)
    }

    /// Adds `layer` merging the outputs of `prevs`, in the given order.
    ///
    /// # Returns
    /// The new node or `MergeShapeMismatch` if an `Add` merge is given branches of
    /// different sizes.
    pub fn add_merge(&mut self, prevs: &[NodeId], layer: Dense, merge: Merge) -> Result<NodeId> {
        self.check_open()?;

        let sizes = prevs
            .iter()
            .map(|&p| self.graph.layer(p).map(|l| l.output_size()))
            .collect::<Result<Vec<_>>>()?;
        merge.input_size(&sizes)?;

        self.graph.add_node_after(prevs, layer.with_merge(merge))
    }

    /// Adds an unconnected node.
    pub fn add_node(&mut self, layer: Dense) -> Result<NodeId> {
        self.check_open()?;
        self.graph.add_node(layer)
    }

    /// Adds an edge between two existing nodes.
    pub fn add_connection(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.check_open()?;
        self.graph.add_connection(from, to)
    }

    fn check_open(&self) -> Result<()> {
        if self.cost.is_some() {
            return Err(MlErr::AlreadyCompiled);
        }

        Ok(())
    }
}

impl Model for ComplexModel {
    fn compile(&mut self, cost: CostFn, rng: &mut dyn RngCore) -> Result<()> {
        self.check_open()?;

        let order = self.graph.topological_sort()?.len();
        self.graph.initialise_layers(rng)?;

        info!("compiled complex model with {order} layers");
        self.graph.freeze();
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
}
