use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::{MlErr, Result, arch::ops};

/// How a layer with several predecessors combines their outputs into a single input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Merge {
    /// Elementwise sum, every branch must have the same output size.
    Add,
    /// Stacking along the feature axis, in predecessor order.
    Concatenate,
}

impl Merge {
    /// Computes the input size of a layer merging branches of the given output sizes.
    ///
    /// # Returns
    /// The merged size or `MergeShapeMismatch` if an `Add` merge gets unequal sizes.
    pub fn input_size(&self, sizes: &[usize]) -> Result<usize> {
        match self {
            Merge::Add => match sizes.split_first() {
                Some((&first, rest)) if rest.iter().all(|&s| s == first) => Ok(first),
                _ => Err(MlErr::MergeShapeMismatch {
                    sizes: sizes.to_vec(),
                }),
            },
            Merge::Concatenate => Ok(sizes.iter().sum()),
        }
    }

    /// Merges the batched outputs of every branch.
    pub fn apply(&self, inputs: &[ArrayView2<f32>]) -> Result<Array2<f32>> {
        match self {
            Merge::Add => {
                let Some((first, rest)) = inputs.split_first() else {
                    return Err(MlErr::MergeShapeMismatch { sizes: vec![] });
                };

                rest.iter()
                    .try_fold(first.to_owned(), |acc, x| ops::add(acc.view(), x.view()))
            }
            Merge::Concatenate => ops::row_concatenate(inputs),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;

    use super::*;

    #[test]
    fn add_requires_equal_sizes() {
        assert_eq!(Merge::Add.input_size(&[4, 4, 4]).unwrap(), 4);
        assert!(matches!(
            Merge::Add.input_size(&[5, 10]),
            Err(MlErr::MergeShapeMismatch { .. })
        ));
    }

    #[test]
    fn concatenate_sums_sizes() {
        assert_eq!(Merge::Concatenate.input_size(&[5, 10]).unwrap(), 15);
    }

    #[test]
    fn apply_merges_batches() {
        let a = arr2(&[[1., 2.]]);
        let b = arr2(&[[10., 20.]]);

        assert_eq!(
            Merge::Add.apply(&[a.view(), b.view()]).unwrap(),
            arr2(&[[11., 22.]])
        );
        assert_eq!(
            Merge::Concatenate.apply(&[a.view(), b.view()]).unwrap(),
            arr2(&[[1., 2.], [10., 20.]])
        );
    }
}
