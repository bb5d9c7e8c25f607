use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use machine_learning::{
    MlErr,
    arch::{
        Graph, NodeId,
        activations::ActFn,
        layers::{Dense, Init, Input, Merge},
    },
};

fn dense() -> Dense {
    Dense::new(2, ActFn::Relu, Init::Xavier).with_merge(Merge::Add)
}

/// Builds a random DAG whose nodes are inserted in a different order than the one its
/// edges imply.
fn random_dag(rng: &mut StdRng, n: usize) -> (Graph, Vec<(NodeId, NodeId)>) {
    let mut graph = Graph::new();
    let input = graph.add_input_node(Input::new(2)).unwrap();

    let mut nodes: Vec<_> = (0..n).map(|_| graph.add_node(dense()).unwrap()).collect();
    nodes.shuffle(rng);
    nodes.insert(0, input);

    let mut edges = Vec::new();
    for to in 1..nodes.len() {
        let first = rng.random_range(0..to);
        edges.push((nodes[first], nodes[to]));

        for from in 0..to {
            if from != first && rng.random_bool(0.3) {
                edges.push((nodes[from], nodes[to]));
            }
        }
    }

    // a single sink
    let last = nodes[nodes.len() - 1];
    for &node in &nodes[..nodes.len() - 1] {
        if !edges.iter().any(|&(from, _)| from == node) {
            edges.push((node, last));
        }
    }

    edges.shuffle(rng);
    for &(from, to) in &edges {
        graph.add_connection(from, to).unwrap();
    }

    (graph, edges)
}

#[test]
fn order_respects_every_edge() {
    let mut rng = StdRng::seed_from_u64(1234);

    for n in [1, 2, 5, 12, 30] {
        let (mut graph, edges) = random_dag(&mut rng, n);
        let order = graph.topological_sort().unwrap().to_vec();
        assert_eq!(order.len(), n + 1);

        let position = |node: NodeId| order.iter().position(|&o| o == node).unwrap();
        for (from, to) in edges {
            assert!(position(from) < position(to), "{from} must come before {to}");
        }

        let input = graph.input_node().unwrap();
        assert_eq!(order[0], input);
        for &node in &order[1..] {
            assert!(!graph.incoming_nodes(node).unwrap().is_empty());
        }
    }
}

#[test]
fn sorting_is_deterministic() {
    let (mut a, _) = random_dag(&mut StdRng::seed_from_u64(9), 20);
    let (mut b, _) = random_dag(&mut StdRng::seed_from_u64(9), 20);

    assert_eq!(a.topological_sort().unwrap(), b.topological_sort().unwrap());
}

#[test]
fn three_node_cycle_is_rejected() {
    let mut graph = Graph::new();
    let input = graph.add_input_node(Input::new(2)).unwrap();
    let a = graph.add_node(dense()).unwrap();
    let b = graph.add_node(dense()).unwrap();
    let c = graph.add_node(dense()).unwrap();

    for (from, to) in [(input, a), (a, b), (b, c), (c, a)] {
        graph.add_connection(from, to).unwrap();
    }

    assert!(matches!(graph.topological_sort(), Err(MlErr::GraphCycle)));
}

#[test]
fn isolated_node_is_rejected() {
    let mut graph = Graph::new();
    let a = graph.add_input_node(Input::new(2)).unwrap();
    let b = graph.add_node(dense()).unwrap();
    let c = graph.add_node(dense()).unwrap();
    graph.add_connection(a, b).unwrap();

    assert!(matches!(
        graph.topological_sort(),
        Err(MlErr::DisconnectedGraph { node }) if node == c
    ));
}

#[test]
fn missing_input_is_rejected() {
    let mut graph = Graph::new();
    graph.add_node(dense()).unwrap();

    assert!(matches!(
        graph.topological_sort(),
        Err(MlErr::MissingInputNode)
    ));
}
