pub mod activations;
mod complex;
pub mod graph;
pub mod layers;
mod linear;
pub mod loss;
mod model;
pub mod ops;

pub use complex::ComplexModel;
pub use graph::{Graph, NodeId};
pub use linear::LinearModel;
pub use model::Model;
