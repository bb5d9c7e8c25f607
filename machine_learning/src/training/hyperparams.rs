use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// The knobs of a training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparams {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
}

impl Hyperparams {
    pub fn new(epochs: usize, batch_size: usize, learning_rate: f32) -> Self {
        Self {
            epochs,
            batch_size,
            learning_rate,
        }
    }

    /// Fails with `InvalidHyperparameter` unless every value is positive.
    pub fn validate(&self) -> Result<()> {
        positive_count("epochs", self.epochs)?;
        positive_count("batch_size", self.batch_size)?;
        positive_rate("learning_rate", self.learning_rate)?;
        Ok(())
    }
}

pub(crate) fn positive_count(name: &'static str, value: usize) -> Result<usize> {
    if value == 0 {
        return Err(MlErr::InvalidHyperparameter {
            name,
            value: value.to_string(),
        });
    }

    Ok(value)
}

/// NaN is rejected along with zero and negative rates.
pub(crate) fn positive_rate(name: &'static str, value: f32) -> Result<f32> {
    if value.is_nan() || value <= 0. {
        return Err(MlErr::InvalidHyperparameter {
            name,
            value: value.to_string(),
        });
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_values() {
        assert!(Hyperparams::new(10, 4, 0.1).validate().is_ok());

        for (hp, field) in [
            (Hyperparams::new(0, 4, 0.1), "epochs"),
            (Hyperparams::new(10, 0, 0.1), "batch_size"),
            (Hyperparams::new(10, 4, 0.), "learning_rate"),
            (Hyperparams::new(10, 4, -1.), "learning_rate"),
            (Hyperparams::new(10, 4, f32::NAN), "learning_rate"),
        ] {
            assert!(matches!(
                hp.validate(),
                Err(MlErr::InvalidHyperparameter { name, .. }) if name == field
            ));
        }
    }
}
