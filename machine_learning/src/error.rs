use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use rand_distr::uniform::Error as UniformError;

use crate::arch::NodeId;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    /// Two operands of a kernel or layer operation have incompatible dimensions.
    ShapeMismatch {
        what: &'static str,
        got: Vec<usize>,
        expected: Vec<usize>,
    },
    DuplicateInputNode,
    DuplicateEdge {
        from: NodeId,
        to: NodeId,
    },
    DisconnectedGraph {
        node: NodeId,
    },
    GraphCycle,
    MultipleOutputs {
        outputs: Vec<NodeId>,
    },
    AlreadyInitialised,
    NotInitialised,
    MergeShapeMismatch {
        sizes: Vec<usize>,
    },
    MergeRequired {
        node: NodeId,
        predecessors: usize,
    },
    NotCompiled,
    AlreadyCompiled,
    EmptyModel,
    UnknownNode {
        node: NodeId,
    },
    NotAnInputLayer,
    MissingInputNode,
    InvalidConnection {
        from: NodeId,
        to: NodeId,
    },
    IncompatibleParameters {
        got: (usize, usize, usize),
        expected: (usize, usize, usize),
    },
    InvalidHyperparameter {
        name: &'static str,
        value: String,
    },
    Parse {
        line: usize,
        msg: String,
    },
    UnknownLayer(String),
    DuplicateLayer(String),
    Distribution(String),
    Config(serde_json::Error),
    Io(io::Error),
}

impl MlErr {
    /// Shorthand for a `ShapeMismatch` between two array shapes.
    pub(crate) fn shape(what: &'static str, got: &[usize], expected: &[usize]) -> Self {
        Self::ShapeMismatch {
            what,
            got: got.to_vec(),
            expected: expected.to_vec(),
        }
    }
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a shape mismatch in {what}, got {got:?} and expected {expected:?}"
            ),
            MlErr::DuplicateInputNode => write!(f, "The graph already has an input node"),
            MlErr::DuplicateEdge { from, to } => write!(
                f,
                "A connection from {from} to {to} already exists, multiple edges are not supported"
            ),
            MlErr::DisconnectedGraph { node } => write!(
                f,
                "The graph has disconnected components, {node} has no incoming connections"
            ),
            MlErr::GraphCycle => write!(f, "The graph contains a cycle"),
            MlErr::MultipleOutputs { outputs } => write!(
                f,
                "The graph must have a single output node, found {}: {outputs:?}",
                outputs.len()
            ),
            MlErr::AlreadyInitialised => write!(f, "The layer's parameters are already initialised"),
            MlErr::NotInitialised => write!(f, "The layer's parameters are not initialised yet"),
            MlErr::MergeShapeMismatch { sizes } => write!(
                f,
                "Add merges require every branch to have the same output size, got {sizes:?}"
            ),
            MlErr::MergeRequired { node, predecessors } => write!(
                f,
                "{node} has {predecessors} predecessors but no merge type"
            ),
            MlErr::NotCompiled => write!(f, "The model must be compiled first"),
            MlErr::AlreadyCompiled => {
                write!(f, "The model is compiled, its structure can't be modified")
            }
            MlErr::EmptyModel => write!(f, "The model has no layers"),
            MlErr::UnknownNode { node } => write!(f, "{node} doesn't belong to this graph"),
            MlErr::NotAnInputLayer => write!(
                f,
                "Expected a single input layer at the start of the model"
            ),
            MlErr::MissingInputNode => write!(f, "The graph has no input node"),
            MlErr::InvalidConnection { from, to } => write!(
                f,
                "Can't connect {from} to {to}, input layers can't have predecessors"
            ),
            MlErr::IncompatibleParameters { got, expected } => write!(
                f,
                "Incompatible parameters (rows, columns, bias), got {got:?} and expected {expected:?}"
            ),
            MlErr::InvalidHyperparameter { name, value } => {
                write!(f, "Invalid value for {name}: {value}, it must be positive")
            }
            MlErr::Parse { line, msg } => write!(f, "Parse error at line {line}: {msg}"),
            MlErr::UnknownLayer(name) => write!(f, "No layer is named {name:?}"),
            MlErr::DuplicateLayer(name) => write!(f, "More than one layer is named {name:?}"),
            MlErr::Distribution(msg) => write!(f, "Invalid distribution: {msg}"),
            MlErr::Config(e) => write!(f, "Invalid configuration: {e}"),
            MlErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Config(e) => Some(e),
            MlErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for MlErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value)
    }
}

impl From<UniformError> for MlErr {
    fn from(value: UniformError) -> Self {
        Self::Distribution(value.to_string())
    }
}
