use std::{fs, path::Path};

use ndarray::{Array2, ArrayView1};

use crate::{MlErr, Result, arch::ops};

/// An in-memory dataset of `(input, expected output)` pairs read through a cursor.
///
/// Samples are stored contiguously, `x_size` inputs and `y_size` outputs each. Batches are
/// packed with one sample per column.
#[derive(Debug, Clone)]
pub struct Dataset {
    x_size: usize,
    y_size: usize,
    len: usize,
    xs: Vec<f32>,
    ys: Vec<f32>,
    cursor: usize,
}

impl Dataset {
    /// Creates a new empty `Dataset`.
    ///
    /// # Arguments
    /// * `x_size` - The amount of input features per sample.
    /// * `y_size` - The amount of expected outputs per sample.
    pub fn new(x_size: usize, y_size: usize) -> Self {
        Self {
            x_size,
            y_size,
            len: 0,
            xs: Vec::new(),
            ys: Vec::new(),
            cursor: 0,
        }
    }

    /// Creates a dataset out of a list of pairs, sized after the first one.
    pub fn from_pairs<I, X, Y>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (X, Y)>,
        X: AsRef<[f32]>,
        Y: AsRef<[f32]>,
    {
        let mut pairs = pairs.into_iter().peekable();
        let (x_size, y_size) = pairs
            .peek()
            .map(|(x, y)| (x.as_ref().len(), y.as_ref().len()))
            .unwrap_or_default();

        let mut dataset = Self::new(x_size, y_size);
        for (x, y) in pairs {
            dataset.push(x.as_ref(), y.as_ref())?;
        }

        Ok(dataset)
    }

    /// Parses a dataset with one pair per line: comma separated inputs, a `|` and comma
    /// separated outputs, e.g. `0,1|1`. Blank lines are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut dataset: Option<Self> = None;

        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let parse_err = |msg: String| MlErr::Parse { line: i + 1, msg };

            let (x, y) = line
                .split_once('|')
                .ok_or_else(|| parse_err("expected `inputs|outputs`".into()))?;
            let x = parse_values(x).map_err(parse_err)?;
            let y = parse_values(y).map_err(parse_err)?;

            let dataset = dataset.get_or_insert_with(|| Self::new(x.len(), y.len()));
            dataset.push(&x, &y).map_err(|e| parse_err(e.to_string()))?;
        }

        dataset.ok_or(MlErr::Parse {
            line: 0,
            msg: "the dataset has no samples".into(),
        })
    }

    /// Reads a dataset file in the format accepted by `parse`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Appends a sample.
    pub fn push(&mut self, x: &[f32], y: &[f32]) -> Result<()> {
        if x.len() != self.x_size || y.len() != self.y_size {
            return Err(MlErr::shape(
                "dataset sample",
                &[x.len(), y.len()],
                &[self.x_size, self.y_size],
            ));
        }

        self.xs.extend_from_slice(x);
        self.ys.extend_from_slice(y);
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn input_size(&self) -> usize {
        self.x_size
    }

    pub fn output_size(&self) -> usize {
        self.y_size
    }

    /// Returns the `i`-th pair, if any.
    pub fn get(&self, i: usize) -> Option<(ArrayView1<'_, f32>, ArrayView1<'_, f32>)> {
        if i >= self.len() {
            return None;
        }

        let x = &self.xs[i * self.x_size..(i + 1) * self.x_size];
        let y = &self.ys[i * self.y_size..(i + 1) * self.y_size];
        Some((ArrayView1::from(x), ArrayView1::from(y)))
    }

    /// Rewinds the cursor to the first sample.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Packs the next `batch_size` pairs into two matrices, inputs and expected outputs, with
    /// one sample per column.
    ///
    /// # Returns
    /// The next batch, shorter than `batch_size` if the dataset is about to be exhausted, or
    /// `None` once it is.
    pub fn next_batch(&mut self, batch_size: usize) -> Result<Option<(Array2<f32>, Array2<f32>)>> {
        let len = self.len();
        if self.cursor >= len || batch_size == 0 {
            return Ok(None);
        }

        let start = self.cursor;
        let width = batch_size.min(len - start);

        let (xs, ys): (Vec<_>, Vec<_>) = (start..start + width).filter_map(|i| self.get(i)).unzip();
        let x = ops::columns_into_matrix(&xs)?;
        let y = ops::columns_into_matrix(&ys)?;

        self.cursor += width;
        Ok(Some((x, y)))
    }
}

fn parse_values(raw: &str) -> std::result::Result<Vec<f32>, String> {
    raw.split(',')
        .map(|v| {
            let v = v.trim();
            v.parse().map_err(|e| format!("invalid value {v:?}: {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2};

    use super::*;

    #[test]
    fn batches_respect_the_cursor() {
        let mut ds = Dataset::from_pairs([
            ([0f32, 0.], [0f32]),
            ([0., 1.], [1.]),
            ([1., 0.], [1.]),
        ])
        .unwrap();
        assert_eq!(ds.len(), 3);

        let (x, y) = ds.next_batch(2).unwrap().unwrap();
        assert_eq!(x, arr2(&[[0., 0.], [0., 1.]]));
        assert_eq!(y, arr2(&[[0., 1.]]));

        let (x, y) = ds.next_batch(2).unwrap().unwrap();
        assert_eq!(x, arr2(&[[1.], [0.]]));
        assert_eq!(y, arr2(&[[1.]]));

        assert!(ds.next_batch(2).unwrap().is_none());

        ds.reset();
        let (x, _) = ds.next_batch(10).unwrap().unwrap();
        assert_eq!(x.ncols(), 3);
    }

    #[test]
    fn parses_pipe_separated_pairs() {
        let ds = Dataset::parse("0,1|1\n\n1, 1 | 0\n").unwrap();

        assert_eq!(ds.input_size(), 2);
        assert_eq!(ds.output_size(), 1);
        assert_eq!(ds.get(1), Some((arr1(&[1., 1.]).view(), arr1(&[0.]).view())));
        assert!(ds.get(2).is_none());
    }

    #[test]
    fn reports_the_offending_line() {
        assert!(matches!(
            Dataset::parse("0,1|1\n0|1"),
            Err(MlErr::Parse { line: 2, .. })
        ));
        assert!(matches!(
            Dataset::parse("0,1|1\n0,x|1"),
            Err(MlErr::Parse { line: 2, .. })
        ));
        assert!(matches!(
            Dataset::parse("0,1,1"),
            Err(MlErr::Parse { line: 1, .. })
        ));
        assert!(matches!(Dataset::parse(""), Err(MlErr::Parse { line: 0, .. })));
    }
}
