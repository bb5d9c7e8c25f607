//! Dense vector and matrix kernels.
//!
//! Every binary operation checks its operands' shapes and fails with
//! `MlErr::ShapeMismatch` instead of broadcasting. Batched data is laid out with
//! features on the rows and samples on the columns.
use ndarray::{Array, Array1, Array2, ArrayBase, ArrayView, ArrayView1, ArrayView2, Axis, DataMut, Dimension};

use crate::{MlErr, Result};

/// Matrix product `a · b`.
pub fn multiply(a: ArrayView2<f32>, b: ArrayView2<f32>) -> Result<Array2<f32>> {
    if a.ncols() != b.nrows() {
        return Err(MlErr::shape("matrix product", b.shape(), &[a.ncols(), b.ncols()]));
    }

    Ok(a.dot(&b))
}

/// Matrix-vector product `m · v`.
pub fn multiply_vec(m: ArrayView2<f32>, v: ArrayView1<f32>) -> Result<Array1<f32>> {
    if m.ncols() != v.len() {
        return Err(MlErr::shape("matrix-vector product", v.shape(), &[m.ncols()]));
    }

    Ok(m.dot(&v))
}

/// Elementwise sum of two vectors or matrices of the same shape.
pub fn add<D: Dimension>(a: ArrayView<f32, D>, b: ArrayView<f32, D>) -> Result<Array<f32, D>> {
    if a.shape() != b.shape() {
        return Err(MlErr::shape("elementwise addition", b.shape(), a.shape()));
    }

    Ok(&a + &b)
}

/// Elementwise (Hadamard) product of two vectors or matrices of the same shape.
pub fn hadamard<D: Dimension>(a: ArrayView<f32, D>, b: ArrayView<f32, D>) -> Result<Array<f32, D>> {
    if a.shape() != b.shape() {
        return Err(MlErr::shape("hadamard product", b.shape(), a.shape()));
    }

    Ok(&a * &b)
}

/// Returns an owned transpose of `m`.
pub fn transpose(m: ArrayView2<f32>) -> Array2<f32> {
    m.t().to_owned()
}

/// Outer product of a column vector and a row vector, shaped `col.len() × row.len()`.
pub fn outer_product(col: ArrayView1<f32>, row: ArrayView1<f32>) -> Array2<f32> {
    let col = col.insert_axis(Axis(1));
    let row = row.insert_axis(Axis(0));
    col.dot(&row)
}

/// Applies `f` to every element of `array`, in place.
pub fn vectorise<S, D, F>(array: &mut ArrayBase<S, D>, f: F)
where
    S: DataMut<Elem = f32>,
    D: Dimension,
    F: Fn(f32) -> f32,
{
    array.mapv_inplace(f);
}

/// Stacks matrices with the same amount of columns along the row axis, preserving the order
/// of `matrices`.
///
/// # Arguments
/// * `matrices` - The matrices to stack, a `(b × n)` and a `(c × n)` matrix yield a `((b + c) × n)` one.
///
/// # Returns
/// The stacked matrix or a `ShapeMismatch` if the list is empty or the column counts differ.
pub fn row_concatenate(matrices: &[ArrayView2<f32>]) -> Result<Array2<f32>> {
    let Some(first) = matrices.first() else {
        return Err(MlErr::shape("row concatenation", &[0], &[1]));
    };

    let ncols = first.ncols();
    if let Some(m) = matrices.iter().find(|m| m.ncols() != ncols) {
        return Err(MlErr::shape("row concatenation", m.shape(), &[m.nrows(), ncols]));
    }

    let nrows = matrices.iter().map(|m| m.nrows()).sum();
    let mut out = Array2::zeros((nrows, ncols));
    let mut offset = 0;

    for m in matrices {
        out.slice_mut(ndarray::s![offset..offset + m.nrows(), ..]).assign(m);
        offset += m.nrows();
    }

    Ok(out)
}

/// Packs equally sized vectors into the columns of a matrix, one column per vector.
pub fn columns_into_matrix(vectors: &[ArrayView1<f32>]) -> Result<Array2<f32>> {
    let Some(first) = vectors.first() else {
        return Err(MlErr::shape("column packing", &[0], &[1]));
    };

    if let Some(v) = vectors.iter().find(|v| v.len() != first.len()) {
        return Err(MlErr::shape("column packing", v.shape(), first.shape()));
    }

    let mut out = Array2::zeros((first.len(), vectors.len()));
    for (mut col, v) in out.columns_mut().into_iter().zip(vectors) {
        col.assign(v);
    }

    Ok(out)
}

/// Splits a batched matrix into its column vectors, one per sample.
pub fn split_into_vectors(m: ArrayView2<f32>) -> Vec<Array1<f32>> {
    m.columns().into_iter().map(|c| c.to_owned()).collect()
}

/// Averages the columns of `m`, reducing the batch dimension.
///
/// # Returns
/// A vector with one entry per row of `m`, or a `ShapeMismatch` if `m` has no columns.
pub fn average_columns(m: ArrayView2<f32>) -> Result<Array1<f32>> {
    m.mean_axis(Axis(1))
        .ok_or_else(|| MlErr::shape("column average", m.shape(), &[m.nrows(), 1]))
}
