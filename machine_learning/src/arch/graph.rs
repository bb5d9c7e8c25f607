use std::{collections::VecDeque, fmt};

use log::debug;
use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::layers::{Layer, LayerKind};
use crate::{MlErr, Result};

/// A handle to a layer owned by a `Graph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// The position of the node in the graph, in insertion order.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}", self.0)
    }
}

/// Where a `Graph` stands in its construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    Empty,
    HasInput,
    Sorted,
}

/// A directed acyclic graph of layers with a single input node and a single output node.
///
/// Edges are kept in both directions, in the order they were added. The incoming order of
/// a node is the order its predecessors' outputs are merged in.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    layers: Vec<Layer>,
    outgoing: Vec<Vec<NodeId>>,
    incoming: Vec<Vec<NodeId>>,
    input: Option<NodeId>,
    order: Vec<NodeId>,
    output: Option<NodeId>,
    frozen: bool,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the input node of the graph.
    ///
    /// # Arguments
    /// * `layer` - An `Input` layer.
    ///
    /// # Returns
    /// The handle of the new node, `DuplicateInputNode` if there already is one or
    /// `NotAnInputLayer` for any other kind of layer.
    pub fn add_input_node(&mut self, layer: impl Into<Layer>) -> Result<NodeId> {
        self.check_open()?;
        let layer = layer.into();

        if layer.kind() != LayerKind::Input {
            return Err(MlErr::NotAnInputLayer);
        }

        if self.input.is_some() {
            return Err(MlErr::DuplicateInputNode);
        }

        check_size(&layer)?;
        let id = self.push(layer);
        self.input = Some(id);
        Ok(id)
    }

    /// Adds a node without connecting it. Only the input node may be an `Input` layer.
    pub fn add_node(&mut self, layer: impl Into<Layer>) -> Result<NodeId> {
        self.check_open()?;
        let layer = layer.into();

        if layer.kind() == LayerKind::Input {
            return Err(MlErr::DuplicateInputNode);
        }

        check_size(&layer)?;
        Ok(self.push(layer))
    }

    /// Adds a node fed by `prevs`, in the given order. Every edge is validated before the
    /// node is inserted, so the graph is left untouched on error.
    pub fn add_node_after(&mut self, prevs: &[NodeId], layer: impl Into<Layer>) -> Result<NodeId> {
        self.check_open()?;
        let to = NodeId(self.len());

        for (i, &from) in prevs.iter().enumerate() {
            self.check(from)?;
            if prevs[..i].contains(&from) {
                return Err(MlErr::DuplicateEdge { from, to });
            }
        }

        let node = self.add_node(layer)?;
        for &from in prevs {
            self.outgoing[from.0].push(node);
            self.incoming[node.0].push(from);
        }

        Ok(node)
    }

    /// Adds a directed edge from `from` to `to`.
    ///
    /// # Returns
    /// `AlreadyCompiled` once the graph is frozen, `UnknownNode` for foreign handles,
    /// `GraphCycle` for self loops, `InvalidConnection` when `to` is the input node and
    /// `DuplicateEdge` if the edge already exists.
    pub fn add_connection(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.check_open()?;
        self.check(from)?;
        self.check(to)?;

        if from == to {
            return Err(MlErr::GraphCycle);
        }

        if self.layers[to.0].kind() == LayerKind::Input {
            return Err(MlErr::InvalidConnection { from, to });
        }

        if self.outgoing[from.0].contains(&to) {
            return Err(MlErr::DuplicateEdge { from, to });
        }

        self.outgoing[from.0].push(to);
        self.incoming[to.0].push(from);
        self.invalidate();
        Ok(())
    }

    pub fn incoming_nodes(&self, node: NodeId) -> Result<&[NodeId]> {
        self.check(node)?;
        Ok(&self.incoming[node.0])
    }

    pub fn outgoing_nodes(&self, node: NodeId) -> Result<&[NodeId]> {
        self.check(node)?;
        Ok(&self.outgoing[node.0])
    }

    pub fn layer(&self, node: NodeId) -> Result<&Layer> {
        self.layers.get(node.0).ok_or(MlErr::UnknownNode { node })
    }

    pub fn layer_mut(&mut self, node: NodeId) -> Result<&mut Layer> {
        self.layers.get_mut(node.0).ok_or(MlErr::UnknownNode { node })
    }

    /// Iterates over every node in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Layer)> {
        self.layers.iter().enumerate().map(|(i, l)| (NodeId(i), l))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn input_node(&self) -> Option<NodeId> {
        self.input
    }

    pub fn state(&self) -> GraphState {
        match (self.input, self.output) {
            (_, Some(_)) => GraphState::Sorted,
            (Some(_), None) => GraphState::HasInput,
            (None, None) => GraphState::Empty,
        }
    }

    /// Whether the structure is frozen, which happens when the owning model gets compiled.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Rejects any further structural change. Parameters can still be updated.
    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    /// The execution order computed by the last successful sort, empty if the graph
    /// changed since.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Sorts the graph topologically using Kahn's algorithm. Nodes that become ready at the
    /// same time are visited in the order they were discovered.
    ///
    /// # Returns
    /// The execution order or an error if the graph has no input, has a node other than the
    /// input without predecessors, has a cycle or doesn't end in a single output node.
    pub fn topological_sort(&mut self) -> Result<&[NodeId]> {
        let input = self.input.ok_or(MlErr::MissingInputNode)?;
        let mut in_degree: Vec<_> = self.incoming.iter().map(Vec::len).collect();

        if let Some(i) = (0..self.len()).find(|&i| in_degree[i] == 0 && i != input.0) {
            return Err(MlErr::DisconnectedGraph { node: NodeId(i) });
        }

        let mut order = Vec::with_capacity(self.len());
        let mut ready = VecDeque::from([input]);

        while let Some(node) = ready.pop_front() {
            order.push(node);

            for &next in &self.outgoing[node.0] {
                in_degree[next.0] -= 1;
                if in_degree[next.0] == 0 {
                    ready.push_back(next);
                }
            }
        }

        if order.len() != self.len() {
            return Err(MlErr::GraphCycle);
        }

        let output = self.sink()?;
        self.order = order;
        self.output = Some(output);
        Ok(&self.order)
    }

    /// The unique node without successors of a sorted graph.
    pub fn output_node(&self) -> Result<NodeId> {
        self.output.ok_or(MlErr::NotCompiled)
    }

    /// Resolves the input size of every dense layer from its predecessors and initialises
    /// the ones still lacking parameters. Layers already initialised are checked against
    /// the size they declare.
    pub fn initialise_layers<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        for &node in &self.order {
            let preds = &self.incoming[node.0];
            let sizes: Vec<_> = preds.iter().map(|p| self.layers[p.0].output_size()).collect();

            let Some(dense) = self.layers[node.0].as_dense_mut() else {
                continue;
            };

            let input_size = match sizes.as_slice() {
                [size] => *size,
                _ => dense
                    .merge_type()
                    .ok_or(MlErr::MergeRequired {
                        node,
                        predecessors: sizes.len(),
                    })?
                    .input_size(&sizes)?,
            };

            if dense.is_initialised() {
                if dense.input_size() != Some(input_size) {
                    let declared = dense.input_size().unwrap_or_default();
                    return Err(MlErr::shape("layer input", &[input_size], &[declared]));
                }
                continue;
            }

            debug!(node = node.index(), input_size = input_size; "initialising layer parameters");
            dense.initialise(input_size, rng)?;
        }

        Ok(())
    }

    /// Makes a forward pass through every layer in topological order. Each node is fed the
    /// cached outputs of its predecessors.
    ///
    /// # Returns
    /// A view of the output node's activation.
    pub fn forward(&mut self, x: ArrayView2<f32>) -> Result<ArrayView2<'_, f32>> {
        let output = self.output_node()?;

        for i in 0..self.order.len() {
            let node = self.order[i];

            if Some(node) == self.input {
                self.layers[node.0].forward(x)?;
                continue;
            }

            let inputs: Vec<Array2<f32>> = self.incoming[node.0]
                .iter()
                .map(|p| self.layers[p.0].a().to_owned())
                .collect();
            let views: Vec<_> = inputs.iter().map(|a| a.view()).collect();

            self.layers[node.0].forward_merged(&views)?;
        }

        Ok(self.layers[output.0].a())
    }

    fn push(&mut self, layer: Layer) -> NodeId {
        let id = NodeId(self.layers.len());
        self.layers.push(layer);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        self.invalidate();
        id
    }

    fn sink(&self) -> Result<NodeId> {
        let sinks: Vec<_> = (0..self.len())
            .filter(|&i| self.outgoing[i].is_empty())
            .map(NodeId)
            .collect();

        match sinks.as_slice() {
            [output] => Ok(*output),
            _ => Err(MlErr::MultipleOutputs { outputs: sinks }),
        }
    }

    fn check(&self, node: NodeId) -> Result<()> {
        if node.0 >= self.layers.len() {
            return Err(MlErr::UnknownNode { node });
        }

        Ok(())
    }

    fn check_open(&self) -> Result<()> {
        if self.frozen {
            return Err(MlErr::AlreadyCompiled);
        }

        Ok(())
    }

    fn invalidate(&mut self) {
        self.order.clear();
        self.output = None;
    }
}

fn check_size(layer: &Layer) -> Result<()> {
    if layer.output_size() == 0 {
        return Err(MlErr::shape("layer output size", &[0], &[1]));
    }

    Ok(())
}
