pub mod backprop;
mod gradient_descent;
mod optimizer;

pub use gradient_descent::GradientDescent;
pub use optimizer::Optimizer;
