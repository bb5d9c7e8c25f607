use std::{env, path::PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};

use machine_learning::{
    arch::Model,
    dataset::Dataset,
    persistence,
    training::{Config, ModelBuilder},
};

fn main() -> Result<()> {
    env_logger::init();

    let path: PathBuf = env::args()
        .nth(1)
        .context("usage: neural-graph <config.json>")?
        .into();

    let config = Config::load(&path)
        .with_context(|| format!("failed to read the configuration at {}", path.display()))?;

    let mut dataset = Dataset::load(&config.dataset)
        .with_context(|| format!("failed to read the dataset at {}", config.dataset.display()))?;
    info!(
        "loaded {} samples with {} inputs and {} outputs",
        dataset.len(),
        dataset.input_size(),
        dataset.output_size()
    );

    let training = &config.training;
    let builder = ModelBuilder::new();
    let mut rng = builder.generate_rng(training.seed);
    let mut model = builder.build(&config.model, training.cost, &mut rng)?;

    let losses = model.train(&mut dataset, &training.hyperparams)?;
    if let Some(loss) = losses.last() {
        info!("finished training after {} epochs, loss={loss}", losses.len());
    }

    dataset.reset();
    if let Some((x, y)) = dataset.next_batch(dataset.len())? {
        let predictions = model.predict(x.view())?;
        for (i, (prediction, expected)) in predictions.iter().zip(y.columns()).enumerate() {
            debug!("sample {i}: predicted {prediction}, expected {expected}");
        }
    }

    if let Some(dir) = &config.save_to {
        persistence::save_model(model.as_ref(), dir)?;
        info!("saved parameters to {}", dir.display());
    }

    Ok(())
}
