use std::collections::HashMap;

use rand::{RngCore, SeedableRng, rngs::StdRng};

use super::config::{INPUT_NAME, LayerConfig, ModelConfig, NodeConfig};
use crate::{
    MlErr, Result,
    arch::{
        ComplexModel, LinearModel, Model, NodeId,
        layers::{Dense, Input, Layer},
        loss::CostFn,
    },
};

/// Builds compiled `Model`s given a configuration.
#[derive(Default)]
pub struct ModelBuilder;

impl ModelBuilder {
    /// Creates a new `ModelBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds and compiles a new model following a configuration.
    ///
    /// # Arguments
    /// * `config` - The configuration of the model.
    /// * `cost` - The cost function the model is compiled with.
    /// * `rng` - The generator used to initialise every layer.
    pub fn build(
        &self,
        config: &ModelConfig,
        cost: CostFn,
        rng: &mut dyn RngCore,
    ) -> Result<Box<dyn Model>> {
        let mut model = self.resolve_model(config)?;
        model.compile(cost, rng)?;
        Ok(model)
    }

    /// Returns a generator seeded with `seed`, or with OS entropy when there's none.
    pub fn generate_rng(&self, seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    fn resolve_model(&self, config: &ModelConfig) -> Result<Box<dyn Model>> {
        match config {
            ModelConfig::Linear { input, layers } => {
                let input = Layer::from(Input::new(*input));
                let layers = layers.iter().map(|lc| self.resolve_layer(lc).into());
                let model = LinearModel::new(std::iter::once(input).chain(layers));
                Ok(Box::new(model))
            }
            ModelConfig::Complex { input, layers } => {
                let model = self.resolve_graph(*input, layers)?;
                Ok(Box::new(model))
            }
        }
    }

    fn resolve_graph(&self, input: usize, layers: &[NodeConfig]) -> Result<ComplexModel> {
        let mut model = ComplexModel::new();
        let mut nodes = HashMap::with_capacity(layers.len() + 1);
        nodes.insert(INPUT_NAME, model.add_input_layer(Input::new(input))?);

        for nc in layers {
            let mut dense = self.resolve_layer(&nc.layer);
            if let Some(merge) = nc.merge {
                dense = dense.with_merge(merge);
            }

            let node = model.add_node(dense)?;
            if nodes.insert(nc.name.as_str(), node).is_some() {
                return Err(MlErr::DuplicateLayer(nc.name.clone()));
            }
        }

        for nc in layers {
            let to = self.resolve_name(&nodes, &nc.name)?;

            for from in &nc.inputs {
                model.add_connection(self.resolve_name(&nodes, from)?, to)?;
            }
        }

        Ok(model)
    }

    fn resolve_name(&self, nodes: &HashMap<&str, NodeId>, name: &str) -> Result<NodeId> {
        nodes
            .get(name)
            .copied()
            .ok_or_else(|| MlErr::UnknownLayer(name.to_string()))
    }

    fn resolve_layer(&self, config: &LayerConfig) -> Dense {
        Dense::new(config.units, config.act_fn, config.weight_init).with_bias_init(config.bias_init)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr1;

    use super::*;
    use crate::training::Config;

    fn complex(layers: &str) -> ModelConfig {
        let raw = format!(
            r#"{{
                "model": {{ "complex": {{ "input": 2, "layers": {layers} }} }},
                "training": {{ "epochs": 1, "batch_size": 1, "learning_rate": 0.1 }},
                "dataset": "x.txt"
            }}"#
        );
        raw.parse::<Config>().unwrap().model
    }

    #[test]
    fn builds_a_linear_model() {
        let config = ModelConfig::Linear {
            input: 3,
            layers: vec![
                LayerConfig {
                    units: 4,
                    act_fn: Default::default(),
                    weight_init: Default::default(),
                    bias_init: Default::default(),
                },
                LayerConfig {
                    units: 2,
                    act_fn: Default::default(),
                    weight_init: Default::default(),
                    bias_init: Default::default(),
                },
            ],
        };

        let builder = ModelBuilder::new();
        let mut rng = builder.generate_rng(Some(1));
        let mut model = builder.build(&config, CostFn::Mse, &mut rng).unwrap();

        assert_eq!(model.input_size().unwrap(), 3);
        assert_eq!(model.output_size().unwrap(), 2);
        assert_eq!(
            model.forward_sample(arr1(&[1., 2., 3.]).view()).unwrap(),
            arr1(&[0., 0.])
        );
    }

    #[test]
    fn builds_a_branching_model() {
        let config = complex(
            r#"[
                { "name": "out", "inputs": ["a", "b"], "merge": "add", "units": 1 },
                { "name": "a", "inputs": ["input"], "units": 3, "act_fn": "relu" },
                { "name": "b", "inputs": ["input"], "units": 3, "act_fn": "sigmoid" }
            ]"#,
        );

        let builder = ModelBuilder::new();
        let mut model = builder
            .build(&config, CostFn::Mse, &mut builder.generate_rng(Some(3)))
            .unwrap();

        assert_eq!(model.graph().len(), 4);
        assert_eq!(model.output_size().unwrap(), 1);
        assert!(model.forward_sample(arr1(&[0.5, -0.5]).view()).is_ok());
    }

    #[test]
    fn reports_bad_names_and_merges() {
        let builder = ModelBuilder::new();
        let mut rng = builder.generate_rng(Some(0));

        let unknown = complex(r#"[{ "name": "a", "inputs": ["nope"], "units": 1 }]"#);
        assert!(matches!(
            builder.build(&unknown, CostFn::Mse, &mut rng),
            Err(MlErr::UnknownLayer(name)) if name == "nope"
        ));

        let duplicate = complex(
            r#"[
                { "name": "a", "inputs": ["input"], "units": 1 },
                { "name": "a", "inputs": ["input"], "units": 1 }
            ]"#,
        );
        assert!(matches!(
            builder.build(&duplicate, CostFn::Mse, &mut rng),
            Err(MlErr::DuplicateLayer(_))
        ));

        let mismatch = complex(
            r#"[
                { "name": "a", "inputs": ["input"], "units": 2 },
                { "name": "b", "inputs": ["input"], "units": 3 },
                { "name": "out", "inputs": ["a", "b"], "merge": "add", "units": 1 }
            ]"#,
        );
        assert!(matches!(
            builder.build(&mismatch, CostFn::Mse, &mut rng),
            Err(MlErr::MergeShapeMismatch { .. })
        ));
    }
}
