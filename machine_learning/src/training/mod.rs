mod builder;
mod config;
pub(crate) mod hyperparams;
mod model_trainer;

pub use builder::ModelBuilder;
pub use config::{Config, INPUT_NAME, LayerConfig, ModelConfig, NodeConfig, TrainingConfig};
pub use hyperparams::Hyperparams;
pub use model_trainer::ModelTrainer;
