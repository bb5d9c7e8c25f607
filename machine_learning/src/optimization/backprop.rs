//! Error propagation over a model's graph.
//!
//! The error of a node is `δ = ∂C/∂z`. The output node takes it straight from the cost's
//! gradient, every other dense node sums the contributions of all of its successors, so
//! branching topologies get the full gradient and not just the one of their last edge.
use log::trace;
use ndarray::{Array2, ArrayView2, s};

use super::Optimizer;
use crate::{
    MlErr, Result,
    arch::{
        Graph, NodeId,
        layers::{Layer, Merge},
        loss::LossFn,
        ops,
    },
};

/// The errors of every dense node for one batch, indexed by node.
#[derive(Debug, Clone)]
pub struct LayerErrors {
    deltas: Vec<Option<Array2<f32>>>,
}

impl LayerErrors {
    /// The error of `node`, shaped `units × batch`, if it's a dense node.
    pub fn get(&self, node: NodeId) -> Option<ArrayView2<'_, f32>> {
        self.deltas.get(node.index())?.as_ref().map(|a| a.view())
    }

    fn iter(&self) -> impl Iterator<Item = (NodeId, &Array2<f32>)> {
        self.deltas
            .iter()
            .enumerate()
            .filter_map(|(i, d)| Some((NodeId::from_index(i), d.as_ref()?)))
    }
}

/// Computes the error of every dense node of `graph` after a forward pass.
///
/// # Arguments
/// * `graph` - A sorted graph holding the caches of the last forward pass.
/// * `cost` - The cost function the model is trained with.
/// * `y` - The expected output of the batch.
pub fn layer_errors<L: LossFn>(graph: &Graph, cost: &L, y: ArrayView2<f32>) -> Result<LayerErrors> {
    let output = graph.output_node()?;
    let mut deltas: Vec<Option<Array2<f32>>> = vec![None; graph.len()];

    for &node in graph.order().iter().rev() {
        let layer = graph.layer(node)?;
        if layer.as_dense().is_none() {
            continue;
        }

        let upstream = if node == output {
            cost.loss_prime(layer.a(), y)?
        } else {
            upstream_gradient(graph, &deltas, node)?
        };

        let delta = ops::hadamard(upstream.view(), layer.act_fn().derivative(layer.z()).view())?;
        trace!("{node}: δ shaped {:?}", delta.dim());
        deltas[node.index()] = Some(delta);
    }

    Ok(LayerErrors { deltas })
}

/// Updates every dense node with its averaged error and averaged merged input.
pub fn apply<O: Optimizer>(graph: &mut Graph, errors: &LayerErrors, optimizer: &mut O) -> Result<()> {
    for (node, delta) in errors.iter() {
        let Some(dense) = graph.layer_mut(node)?.as_dense_mut() else {
            continue;
        };

        let delta = ops::average_columns(delta.view())?;
        let input = ops::average_columns(dense.input())?;
        optimizer.update_params(dense, delta.view(), input.view())?;
    }

    Ok(())
}

/// `∂C/∂a` of `node`: the sum over its successors of `Wᵀ·δ`, restricted to the rows
/// that correspond to `node` when the successor concatenates its inputs.
fn upstream_gradient(graph: &Graph, deltas: &[Option<Array2<f32>>], node: NodeId) -> Result<Array2<f32>> {
    let size = graph.layer(node)?.output_size();
    let mut total: Option<Array2<f32>> = None;

    for &succ in graph.outgoing_nodes(node)? {
        let dense = graph
            .layer(succ)?
            .as_dense()
            .ok_or(MlErr::InvalidConnection { from: node, to: succ })?;
        let delta = deltas[succ.index()].as_ref().ok_or(MlErr::GraphCycle)?;

        let full = ops::multiply(ops::transpose(dense.weights()?).view(), delta.view())?;
        let preds = graph.incoming_nodes(succ)?;

        let contribution = match dense.merge_type() {
            Some(Merge::Concatenate) if preds.len() > 1 => {
                let offset = preds
                    .iter()
                    .take_while(|&&p| p != node)
                    .map(|&p| graph.layer(p).map(Layer::output_size))
                    .sum::<Result<usize>>()?;
                full.slice(s![offset..offset + size, ..]).to_owned()
            }
            _ => full,
        };

        total = Some(match total {
            Some(acc) => ops::add(acc.view(), contribution.view())?,
            None => contribution,
        });
    }

    total.ok_or(MlErr::MultipleOutputs { outputs: vec![node] })
}
