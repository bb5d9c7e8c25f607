mod act_fn;
mod relu;
mod sigmoid;
mod tanh;

pub use act_fn::ActFn;
pub use relu::Relu;
pub use sigmoid::{Sigmoid, Silu};
pub use tanh::Tanh;
