//! Plain text storage for the parameters of dense layers.
//!
//! A layer is stored as its row count, column count and bias length, one per line, a blank
//! line, one `|` separated line per weight row, another blank line and a single `|`
//! separated line with the biases.
use std::{
    fs,
    io::{BufWriter, Write},
    iter::Enumerate,
    path::Path,
    str,
};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::{
    MlErr, Result,
    arch::{Model, layers::Dense},
};

/// Writes a weight matrix and a bias vector.
pub fn write_params<W: Write>(writer: &mut W, w: ArrayView2<f32>, b: ArrayView1<f32>) -> Result<()> {
    writeln!(writer, "{}\n{}\n{}\n", w.nrows(), w.ncols(), b.len())?;

    for row in w.rows() {
        writeln!(writer, "{}", join(row.iter()))?;
    }

    writeln!(writer)?;
    writeln!(writer, "{}", join(b.iter()))?;
    Ok(())
}

/// Reads a weight matrix and a bias vector.
///
/// # Arguments
/// * `text` - The stored parameters.
/// * `expected` - The `(rows, columns, bias length)` the parameters must have.
///
/// # Returns
/// The parameters, `IncompatibleParameters` if the declared shape isn't the expected one or
/// a `Parse` error if the text is malformed.
pub fn read_params(text: &str, expected: (usize, usize, usize)) -> Result<(Array2<f32>, Array1<f32>)> {
    let mut lines = Lines {
        inner: text.lines().enumerate(),
        last: 0,
    };

    let got = (lines.count()?, lines.count()?, lines.count()?);
    if got != expected {
        return Err(MlErr::IncompatibleParameters { got, expected });
    }

    let (rows, cols, len) = got;
    lines.blank()?;

    let mut w = Vec::with_capacity(rows * cols);
    for _ in 0..rows {
        w.extend(lines.values(cols)?);
    }

    lines.blank()?;
    let b = lines.values(len)?;

    let w = Array2::from_shape_vec((rows, cols), w).map_err(|e| lines.err(e.to_string()))?;
    Ok((w, Array1::from(b)))
}

impl Dense {
    /// Stores this layer's parameters at `path`.
    pub fn save_params<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(fs::File::create(path)?);
        write_params(&mut writer, self.weights()?, self.bias()?)?;
        writer.flush()?;
        Ok(())
    }

    /// Replaces this layer's parameters with the ones stored at `path`.
    pub fn load_params<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let text = fs::read_to_string(path)?;
        let (w, b) = read_params(&text, self.param_shape()?)?;
        self.set_params(w, b)
    }
}

/// Stores the parameters of every dense layer of a compiled model in `dir`, as
/// `<node index>.txt`.
pub fn save_model<M: Model + ?Sized>(model: &M, dir: impl AsRef<Path>) -> Result<()> {
    model.cost_fn()?;

    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    for (node, layer) in model.graph().nodes() {
        if let Some(dense) = layer.as_dense() {
            dense.save_params(dir.join(format!("{}.txt", node.index())))?;
        }
    }

    Ok(())
}

/// Loads the parameters stored by `save_model` into a compiled model of the same shape.
pub fn load_model<M: Model + ?Sized>(model: &mut M, dir: impl AsRef<Path>) -> Result<()> {
    model.cost_fn()?;

    let dir = dir.as_ref();
    let graph = model.graph_mut();
    let nodes: Vec<_> = graph.nodes().map(|(node, _)| node).collect();

    for node in nodes {
        if let Some(dense) = graph.layer_mut(node)?.as_dense_mut() {
            dense.load_params(dir.join(format!("{}.txt", node.index())))?;
        }
    }

    Ok(())
}

fn join<'a>(values: impl Iterator<Item = &'a f32>) -> String {
    values.map(f32::to_string).collect::<Vec<_>>().join("|")
}

struct Lines<'a> {
    inner: Enumerate<str::Lines<'a>>,
    last: usize,
}

impl<'a> Lines<'a> {
    fn next(&mut self) -> Result<&'a str> {
        let (i, line) = self
            .inner
            .next()
            .ok_or_else(|| self.err("unexpected end of file".into()))?;

        self.last = i + 1;
        Ok(line.trim())
    }

    fn count(&mut self) -> Result<usize> {
        let line = self.next()?;
        line.parse().map_err(|e| self.err(format!("invalid count {line:?}: {e}")))
    }

    fn blank(&mut self) -> Result<()> {
        match self.next()? {
            "" => Ok(()),
            line => Err(self.err(format!("expected a blank line, got {line:?}"))),
        }
    }

    fn values(&mut self, n: usize) -> Result<Vec<f32>> {
        let line = self.next()?;
        if n == 0 && line.is_empty() {
            return Ok(Vec::new());
        }

        let values = line
            .split('|')
            .map(|v| v.trim().parse::<f32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| self.err(format!("invalid value: {e}")))?;

        if values.len() != n {
            return Err(self.err(format!("expected {n} values, got {}", values.len())));
        }

        Ok(values)
    }

    fn err(&self, msg: String) -> MlErr {
        MlErr::Parse {
            line: self.last,
            msg,
        }
    }
}
