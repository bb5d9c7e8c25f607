use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Policy used to fill a layer's weights or biases the one time they are initialised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Init {
    #[default]
    Zeroes,
    Ones,
    /// Uniform in `[0, 1)`.
    Random,
    /// Uniform in `[-1/√fan_in, 1/√fan_in]`.
    Xavier,
}

impl Init {
    /// Generates a `rows × cols` matrix, `cols` being the fan-in.
    pub fn matrix<R: Rng + ?Sized>(&self, rows: usize, cols: usize, rng: &mut R) -> Result<Array2<f32>> {
        let shape = (rows, cols);

        let m = match self {
            Init::Zeroes => Array2::zeros(shape),
            Init::Ones => Array2::ones(shape),
            Init::Random => Array2::random_using(shape, Uniform::new(0., 1.)?, rng),
            Init::Xavier => Array2::random_using(shape, Self::xavier(cols)?, rng),
        };

        Ok(m)
    }

    /// Generates a vector of length `len` given the layer's fan-in.
    pub fn vector<R: Rng + ?Sized>(&self, len: usize, fan_in: usize, rng: &mut R) -> Result<Array1<f32>> {
        let v = match self {
            Init::Zeroes => Array1::zeros(len),
            Init::Ones => Array1::ones(len),
            Init::Random => Array1::random_using(len, Uniform::new(0., 1.)?, rng),
            Init::Xavier => Array1::random_using(len, Self::xavier(fan_in)?, rng),
        };

        Ok(v)
    }

    fn xavier(fan_in: usize) -> Result<Uniform<f32>> {
        let range = 1. / (fan_in.max(1) as f32).sqrt();
        Ok(Uniform::new_inclusive(-range, range)?)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn constant_policies() {
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(Init::Zeroes.matrix(2, 3, &mut rng).unwrap(), Array2::<f32>::zeros((2, 3)));
        assert_eq!(Init::Ones.vector(4, 3, &mut rng).unwrap(), Array1::<f32>::ones(4));
    }

    #[test]
    fn random_stays_in_the_unit_interval() {
        let mut rng = StdRng::seed_from_u64(1);
        let m = Init::Random.matrix(8, 8, &mut rng).unwrap();

        assert!(m.iter().all(|&w| (0. ..1.).contains(&w)));
    }

    #[test]
    fn xavier_is_bounded_by_the_fan_in() {
        let mut rng = StdRng::seed_from_u64(2);
        let m = Init::Xavier.matrix(16, 25, &mut rng).unwrap();

        assert!(m.iter().all(|&w| w.abs() <= 0.2));
        assert!(m.iter().any(|&w| w != 0.));
    }

    #[test]
    fn same_seed_same_parameters() {
        let a = Init::Xavier.matrix(3, 3, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = Init::Xavier.matrix(3, 3, &mut StdRng::seed_from_u64(7)).unwrap();

        assert_eq!(a, b);
    }
}
