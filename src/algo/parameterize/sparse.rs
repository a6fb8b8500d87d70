//! Compressed sparse row matrices and a preconditioned conjugate gradient solver.

use nalgebra::DVector;

use crate::error::{MeshError, Result};

/// Compressed Sparse Row (CSR) matrix.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// `row_ptr[i]..row_ptr[i + 1]` indexes the entries of row `i`.
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Build a matrix from `(row, col, value)` triplets.
    ///
    /// Duplicate entries at the same position are summed. Columns within a
    /// row end up sorted.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> Self {
        // Bucket entries by row
        let mut row_ptr = vec![0usize; rows + 1];
        for &(r, _, _) in triplets {
            row_ptr[r + 1] += 1;
        }
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        let mut fill = row_ptr.clone();
        let mut entries = vec![(0usize, 0.0f64); triplets.len()];
        for &(r, c, v) in triplets {
            entries[fill[r]] = (c, v);
            fill[r] += 1;
        }

        // Sort each row by column and merge duplicates
        let mut col_idx = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        let mut merged_ptr = vec![0usize; rows + 1];
        for r in 0..rows {
            let row = &mut entries[row_ptr[r]..row_ptr[r + 1]];
            row.sort_unstable_by_key(|&(c, _)| c);

            let row_start = col_idx.len();
            for &(c, v) in row.iter() {
                if col_idx.len() > row_start && col_idx.last() == Some(&c) {
                    if let Some(last) = values.last_mut() {
                        *last += v;
                    }
                } else {
                    col_idx.push(c);
                    values.push(v);
                }
            }
            merged_ptr[r + 1] = col_idx.len();
        }

        Self {
            rows,
            cols,
            row_ptr: merged_ptr,
            col_idx,
            values,
        }
    }

    /// Get the number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Get the number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        debug_assert_eq!(x.len(), self.cols, "vector dimension mismatch");
        DVector::from_iterator(
            self.rows,
            (0..self.rows).map(|i| self.row(i).map(|(c, v)| v * x[c]).sum::<f64>()),
        )
    }

    /// The main diagonal, zero where no entry is stored.
    pub fn diagonal(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.rows,
            (0..self.rows).map(|i| {
                self.row(i)
                    .filter(|&(c, _)| c == i)
                    .map(|(_, v)| v)
                    .sum::<f64>()
            }),
        )
    }
}

/// Solve `A x = b` with Jacobi-preconditioned conjugate gradient.
///
/// `A` must be symmetric positive (semi-)definite. Iterates until the
/// residual norm drops below `tolerance * |b|`. Returns the solution and the
/// number of iterations used. Zero diagonal entries are preconditioned with 1.
///
/// # Errors
///
/// [`MeshError::ConvergenceFailed`] if `max_iter` iterations are not enough.
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<f64>,
    max_iter: usize,
    tolerance: f64,
) -> Result<(DVector<f64>, usize)> {
    let n = b.len();
    debug_assert_eq!(a.nrows(), n, "matrix-vector dimension mismatch");
    debug_assert_eq!(a.ncols(), n, "matrix must be square");

    let mut x = DVector::zeros(n);
    let b_norm = b.norm();
    if b_norm == 0.0 {
        return Ok((x, 0));
    }
    let threshold = tolerance * b_norm;

    let inv_diag = a
        .diagonal()
        .map(|d| if d.abs() > f64::MIN_POSITIVE { 1.0 / d } else { 1.0 });

    let mut r = b.clone();
    let mut z = r.component_mul(&inv_diag);
    let mut p = z.clone();
    let mut rz = r.dot(&z);

    for iter in 1..=max_iter {
        let ap = a.mul_vec(&p);
        let p_ap = p.dot(&ap);
        if p_ap.abs() < f64::MIN_POSITIVE {
            // Search direction in the null space
            break;
        }
        let alpha = rz / p_ap;

        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        if r.norm() < threshold {
            return Ok((x, iter));
        }

        z = r.component_mul(&inv_diag);
        let rz_new = r.dot(&z);
        let beta = rz_new / rz;
        p = &z + beta * &p;
        rz = rz_new;
    }

    if r.norm() < threshold {
        return Ok((x, max_iter));
    }
    Err(MeshError::ConvergenceFailed {
        iterations: max_iter,
    })
}
