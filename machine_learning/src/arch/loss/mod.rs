mod cost_fn;
mod loss_fn;
mod mae;
mod mse;

pub use cost_fn::CostFn;
pub use loss_fn::LossFn;
pub use mae::Mae;
pub use mse::Mse;
