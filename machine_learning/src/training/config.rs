use std::{fs, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};

use super::Hyperparams;
use crate::{
    Result,
    arch::{
        activations::ActFn,
        layers::{Init, Merge},
        loss::CostFn,
    },
};

/// The name the layers of a complex model use to refer to its input layer.
pub const INPUT_NAME: &str = "input";

/// The configuration of a dense layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    pub units: usize,
    #[serde(default)]
    pub act_fn: ActFn,
    #[serde(default = "default_weight_init")]
    pub weight_init: Init,
    #[serde(default)]
    pub bias_init: Init,
}

/// A dense layer of a complex model, fed by the layers named in `inputs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    pub inputs: Vec<String>,
    #[serde(default)]
    pub merge: Option<Merge>,
    #[serde(flatten)]
    pub layer: LayerConfig,
}

/// The configuration of a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelConfig {
    Linear {
        input: usize,
        layers: Vec<LayerConfig>,
    },
    Complex {
        input: usize,
        layers: Vec<NodeConfig>,
    },
}

/// The configuration of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(flatten)]
    pub hyperparams: Hyperparams,
    #[serde(default)]
    pub cost: CostFn,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Everything needed to build, train and save a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub dataset: PathBuf,
    #[serde(default)]
    pub save_to: Option<PathBuf>,
}

impl Config {
    /// Reads a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        raw.parse()
    }
}

impl std::str::FromStr for Config {
    type Err = crate::MlErr;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

fn default_weight_init() -> Init {
    Init::Xavier
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_complex_model() {
        let raw = r#"{
            "model": {
                "complex": {
                    "input": 2,
                    "layers": [
                        { "name": "a", "inputs": ["input"], "units": 4, "act_fn": "relu" },
                        { "name": "b", "inputs": ["input"], "units": 4, "act_fn": "tanh" },
                        {
                            "name": "out",
                            "inputs": ["a", "b"],
                            "merge": "concatenate",
                            "units": 1,
                            "weight_init": "random",
                            "bias_init": "ones"
                        }
                    ]
                }
            },
            "training": { "epochs": 10, "batch_size": 4, "learning_rate": 0.1, "seed": 7 },
            "dataset": "data/xor.txt"
        }"#;

        let config: Config = raw.parse().unwrap();

        let ModelConfig::Complex { input, layers } = config.model else {
            panic!("expected a complex model");
        };
        assert_eq!(input, 2);
        assert_eq!(layers[0].layer.weight_init, Init::Xavier);
        assert_eq!(layers[0].layer.bias_init, Init::Zeroes);
        assert_eq!(layers[2].merge, Some(Merge::Concatenate));
        assert_eq!(layers[2].layer.act_fn, ActFn::Identity);

        assert_eq!(config.training.hyperparams, Hyperparams::new(10, 4, 0.1));
        assert_eq!(config.training.cost, CostFn::Mse);
        assert_eq!(config.training.seed, Some(7));
        assert!(config.save_to.is_none());
    }

    #[test]
    fn rejects_unknown_variants() {
        let raw = r#"{
            "model": { "linear": { "input": 1, "layers": [{ "units": 1, "act_fn": "step" }] } },
            "training": { "epochs": 1, "batch_size": 1, "learning_rate": 0.1 },
            "dataset": "x.txt"
        }"#;

        assert!(matches!(raw.parse::<Config>(), Err(crate::MlErr::Config(_))));
    }
}
