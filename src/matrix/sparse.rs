//! Matrix storage formats.
//!
//! Operators are assembled as coordinate triplets ([`CooMatrix`]) and then
//! compressed into the format a consumer asked for. Duplicate triplets at the
//! same position are summed on compression, which lets builders accumulate
//! per-edge contributions without bookkeeping.

use nalgebra::{DMatrix, DVector};

use crate::error::{MeshError, Result};

/// A `(row, col, value)` entry.
pub type Triplet = (usize, usize, f64);

fn check_bounds(rows: usize, cols: usize, row: usize, col: usize) -> Result<()> {
    if row >= rows {
        return Err(MeshError::invalid_param("row", row, "out of bounds"));
    }
    if col >= cols {
        return Err(MeshError::invalid_param("col", col, "out of bounds"));
    }
    Ok(())
}

fn check_len(expected: usize, x: &DVector<f64>) -> Result<()> {
    if x.len() != expected {
        return Err(MeshError::invalid_param(
            "x",
            x.len(),
            "vector length must match the number of columns",
        ));
    }
    Ok(())
}

/// Sort `(major, minor, value)` entries and merge duplicates into
/// compressed pointer, index and value arrays.
fn compress(major_len: usize, mut entries: Vec<Triplet>) -> (Vec<usize>, Vec<usize>, Vec<f64>) {
    entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut ptr = vec![0usize; major_len + 1];
    let mut idx = Vec::with_capacity(entries.len());
    let mut values: Vec<f64> = Vec::with_capacity(entries.len());
    let mut last = None;

    for (major, minor, value) in entries {
        if last == Some((major, minor)) {
            if let Some(v) = values.last_mut() {
                *v += value;
            }
            continue;
        }
        idx.push(minor);
        values.push(value);
        ptr[major + 1] += 1;
        last = Some((major, minor));
    }

    for i in 0..major_len {
        ptr[i + 1] += ptr[i];
    }
    (ptr, idx, values)
}

// ==================== COO ====================

/// Coordinate-list matrix: an unordered bag of triplets.
///
/// Duplicates are kept as pushed; they are summed when the matrix is read
/// or converted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CooMatrix {
    rows: usize,
    cols: usize,
    entries: Vec<Triplet>,
}

impl CooMatrix {
    /// Create an empty `rows x cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with_capacity(rows, cols, 0)
    }

    /// Create an empty matrix with room for `capacity` triplets.
    pub fn with_capacity(rows: usize, cols: usize, capacity: usize) -> Self {
        Self {
            rows,
            cols,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append an entry. Entries at an existing position add to it.
    pub fn push(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        check_bounds(self.rows, self.cols, row, col)?;
        self.entries.push((row, col, value));
        Ok(())
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

    /// Number of stored triplets, duplicates included.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// The stored triplets in push order.
    pub fn triplets(&self) -> &[Triplet] {
        &self.entries
    }

    /// The summed value at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.entries
            .iter()
            .filter(|&&(r, c, _)| r == row && c == col)
            .map(|&(_, _, v)| v)
            .sum()
    }

    /// Compress to CSR.
    pub fn to_csr(&self) -> CsrMatrix {
        let (row_ptr, col_idx, values) = compress(self.rows, self.entries.clone());
        CsrMatrix {
            rows: self.rows,
            cols: self.cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Compress to CSC.
    pub fn to_csc(&self) -> CscMatrix {
        let transposed = self.entries.iter().map(|&(r, c, v)| (c, r, v)).collect();
        let (col_ptr, row_idx, values) = compress(self.cols, transposed);
        CscMatrix {
            rows: self.rows,
            cols: self.cols,
            col_ptr,
            row_idx,
            values,
        }
    }

    /// Expand to a dense matrix.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(self.rows, self.cols);
        for &(r, c, v) in &self.entries {
            m[(r, c)] += v;
        }
        m
    }
}

// ==================== CSR ====================

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores a sparse matrix in CSR format for efficient row access and
/// matrix-vector multiplication.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// `row_ptr[i]..row_ptr[i + 1]` is the range of row `i` in `col_idx`/`values`.
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries at the same (row, col) are summed.
    pub fn from_triplets(rows: usize, cols: usize, triplets: Vec<Triplet>) -> Result<Self> {
        for &(r, c, _) in &triplets {
            check_bounds(rows, cols, r, c)?;
        }
        let (row_ptr, col_idx, values) = compress(rows, triplets);
        Ok(Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        })
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

    /// Row pointer array of length `nrows + 1`.
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// Column index of every stored entry.
    pub fn col_indices(&self) -> &[usize] {
        &self.col_idx
    }

    /// Value of every stored entry.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The stored `(col, value)` entries of a row, by increasing column.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = if row < self.rows {
            self.row_ptr[row]..self.row_ptr[row + 1]
        } else {
            0..0
        };
        range.map(move |k| (self.col_idx[k], self.values[k]))
    }

    /// The value at `(row, col)`, zero if not stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        if row >= self.rows {
            return 0.0;
        }
        let (start, end) = (self.row_ptr[row], self.row_ptr[row + 1]);
        match self.col_idx[start..end].binary_search(&col) {
            Ok(k) => self.values[start + k],
            Err(_) => 0.0,
        }
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        check_len(self.cols, x)?;
        Ok(DVector::from_fn(self.rows, |i, _| {
            self.row(i).map(|(j, v)| v * x[j]).sum()
        }))
    }

    /// The sum of every row.
    pub fn row_sums(&self) -> DVector<f64> {
        DVector::from_fn(self.rows, |i, _| self.row(i).map(|(_, v)| v).sum())
    }

    /// Expand to a dense matrix.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(self.rows, self.cols);
        for i in 0..self.rows {
            for (j, v) in self.row(i) {
                m[(i, j)] = v;
            }
        }
        m
    }
}

// ==================== CSC ====================

/// Compressed Sparse Column (CSC) matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix {
    rows: usize,
    cols: usize,
    /// `col_ptr[j]..col_ptr[j + 1]` is the range of column `j` in `row_idx`/`values`.
    col_ptr: Vec<usize>,
    row_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CscMatrix {
    /// Create a CSC matrix from triplets (row, col, value).
    ///
    /// Duplicate entries at the same (row, col) are summed.
    pub fn from_triplets(rows: usize, cols: usize, triplets: Vec<Triplet>) -> Result<Self> {
        for &(r, c, _) in &triplets {
            check_bounds(rows, cols, r, c)?;
        }
        let transposed = triplets.into_iter().map(|(r, c, v)| (c, r, v)).collect();
        let (col_ptr, row_idx, values) = compress(cols, transposed);
        Ok(Self {
            rows,
            cols,
            col_ptr,
            row_idx,
            values,
        })
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

    /// Column pointer array of length `ncols + 1`.
    pub fn col_ptr(&self) -> &[usize] {
        &self.col_ptr
    }

    /// Row index of every stored entry.
    pub fn row_indices(&self) -> &[usize] {
        &self.row_idx
    }

    /// Value of every stored entry.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The stored `(row, value)` entries of a column, by increasing row.
    pub fn col(&self, col: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = if col < self.cols {
            self.col_ptr[col]..self.col_ptr[col + 1]
        } else {
            0..0
        };
        range.map(move |k| (self.row_idx[k], self.values[k]))
    }

    /// The value at `(row, col)`, zero if not stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        if col >= self.cols {
            return 0.0;
        }
        let (start, end) = (self.col_ptr[col], self.col_ptr[col + 1]);
        match self.row_idx[start..end].binary_search(&row) {
            Ok(k) => self.values[start + k],
            Err(_) => 0.0,
        }
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        check_len(self.cols, x)?;
        let mut y = DVector::zeros(self.rows);
        for j in 0..self.cols {
            for (i, v) in self.col(j) {
                y[i] += v * x[j];
            }
        }
        Ok(y)
    }

    /// The sum of every row.
    pub fn row_sums(&self) -> DVector<f64> {
        let mut sums = DVector::zeros(self.rows);
        for (&i, &v) in self.row_idx.iter().zip(&self.values) {
            sums[i] += v;
        }
        sums
    }

    /// Expand to a dense matrix.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(self.rows, self.cols);
        for j in 0..self.cols {
            for (i, v) in self.col(j) {
                m[(i, j)] = v;
            }
        }
        m
    }
}

// ==================== Format selection ====================

/// The storage format an operator is returned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixFormat {
    /// Dense `nalgebra::DMatrix`.
    Dense,
    /// Compressed sparse row.
    #[default]
    Csr,
    /// Compressed sparse column.
    Csc,
    /// Coordinate list.
    Coo,
}

impl MatrixFormat {
    /// Convert assembled triplets into this format.
    pub fn assemble(self, coo: CooMatrix) -> Matrix {
        match self {
            MatrixFormat::Dense => Matrix::Dense(coo.to_dense()),
            MatrixFormat::Csr => Matrix::Csr(coo.to_csr()),
            MatrixFormat::Csc => Matrix::Csc(coo.to_csc()),
            MatrixFormat::Coo => Matrix::Coo(coo),
        }
    }
}

/// An operator in one of the supported storage formats.
#[derive(Debug, Clone, PartialEq)]
pub enum Matrix {
    /// Dense storage.
    Dense(DMatrix<f64>),
    /// Compressed sparse row storage.
    Csr(CsrMatrix),
    /// Compressed sparse column storage.
    Csc(CscMatrix),
    /// Coordinate list storage.
    Coo(CooMatrix),
}

impl Matrix {
    /// The storage format.
    pub fn format(&self) -> MatrixFormat {
        match self {
            Matrix::Dense(_) => MatrixFormat::Dense,
            Matrix::Csr(_) => MatrixFormat::Csr,
            Matrix::Csc(_) => MatrixFormat::Csc,
            Matrix::Coo(_) => MatrixFormat::Coo,
        }
    }

    /// Get the number of rows.
    pub fn nrows(&self) -> usize {
        match self {
            Matrix::Dense(m) => m.nrows(),
            Matrix::Csr(m) => m.nrows(),
            Matrix::Csc(m) => m.nrows(),
            Matrix::Coo(m) => m.nrows(),
        }
    }

    /// Get the number of columns.
    pub fn ncols(&self) -> usize {
        match self {
            Matrix::Dense(m) => m.ncols(),
            Matrix::Csr(m) => m.ncols(),
            Matrix::Csc(m) => m.ncols(),
            Matrix::Coo(m) => m.ncols(),
        }
    }

    /// The value at `(row, col)`. Out-of-range positions read as zero.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        match self {
            Matrix::Dense(m) => m.get((row, col)).copied().unwrap_or(0.0),
            Matrix::Csr(m) => m.get(row, col),
            Matrix::Csc(m) => m.get(row, col),
            Matrix::Coo(m) => m.get(row, col),
        }
    }

    /// Expand to a dense matrix.
    pub fn to_dense(&self) -> DMatrix<f64> {
        match self {
            Matrix::Dense(m) => m.clone(),
            Matrix::Csr(m) => m.to_dense(),
            Matrix::Csc(m) => m.to_dense(),
            Matrix::Coo(m) => m.to_dense(),
        }
    }

    /// Multiply by a vector.
    pub fn mul_vec(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        match self {
            Matrix::Dense(m) => {
                check_len(m.ncols(), x)?;
                Ok(m * x)
            }
            Matrix::Csr(m) => m.mul_vec(x),
            Matrix::Csc(m) => m.mul_vec(x),
            Matrix::Coo(m) => {
                check_len(m.ncols(), x)?;
                let mut y = DVector::zeros(m.nrows());
                for &(r, c, v) in m.triplets() {
                    y[r] += v * x[c];
                }
                Ok(y)
            }
        }
    }

    /// The sum of every row.
    pub fn row_sums(&self) -> DVector<f64> {
        match self {
            Matrix::Dense(m) => DVector::from_fn(m.nrows(), |i, _| m.row(i).sum()),
            Matrix::Csr(m) => m.row_sums(),
            Matrix::Csc(m) => m.row_sums(),
            Matrix::Coo(m) => {
                let mut sums = DVector::zeros(m.nrows());
                for &(r, _, v) in m.triplets() {
                    sums[r] += v;
                }
                sums
            }
        }
    }

    /// The CSR matrix, if stored as one.
    pub fn as_csr(&self) -> Option<&CsrMatrix> {
        match self {
            Matrix::Csr(m) => Some(m),
            _ => None,
        }
    }

    /// The CSC matrix, if stored as one.
    pub fn as_csc(&self) -> Option<&CscMatrix> {
        match self {
            Matrix::Csc(m) => Some(m),
            _ => None,
        }
    }

    /// The dense matrix, if stored as one.
    pub fn as_dense(&self) -> Option<&DMatrix<f64>> {
        match self {
            Matrix::Dense(m) => Some(m),
            _ => None,
        }
    }

    /// The triplets, if stored as a coordinate list.
    pub fn as_coo(&self) -> Option<&CooMatrix> {
        match self {
            Matrix::Coo(m) => Some(m),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CooMatrix {
        // [ 4  1  0 ]
        // [ 0  0  0 ]
        // [ 1  0  3 ]
        let mut coo = CooMatrix::new(3, 3);
        coo.push(0, 0, 2.0).unwrap();
        coo.push(2, 2, 3.0).unwrap();
        coo.push(0, 1, 1.0).unwrap();
        coo.push(2, 0, 1.0).unwrap();
        coo.push(0, 0, 2.0).unwrap(); // summed with the first entry
        coo
    }

    #[test]
    fn test_coo_push_out_of_bounds() {
        let mut coo = CooMatrix::new(2, 2);
        assert!(matches!(
            coo.push(2, 0, 1.0),
            Err(MeshError::InvalidParameter { name: "row", .. })
        ));
        assert!(coo.push(0, 5, 1.0).is_err());
        assert_eq!(coo.nnz(), 0);
    }

    #[test]
    fn test_csr_from_triplets_with_duplicates() {
        let csr = sample().to_csr();
        assert_eq!(csr.nnz(), 4);
        assert_eq!(csr.row_ptr(), &[0, 2, 2, 4]);
        assert_eq!(csr.col_indices(), &[0, 1, 0, 2]);
        assert!((csr.get(0, 0) - 4.0).abs() < 1e-12);
        assert_eq!(csr.get(1, 1), 0.0);
        assert_eq!(csr.get(7, 0), 0.0);
    }

    #[test]
    fn test_csc_layout() {
        let csc = sample().to_csc();
        assert_eq!(csc.nnz(), 4);
        assert_eq!(csc.col_ptr(), &[0, 2, 3, 4]);
        assert_eq!(csc.row_indices(), &[0, 2, 0, 2]);
        assert!((csc.get(2, 2) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_formats_agree() {
        let coo = sample();
        let dense = coo.to_dense();
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let expected = &dense * &x;

        for format in [
            MatrixFormat::Dense,
            MatrixFormat::Csr,
            MatrixFormat::Csc,
            MatrixFormat::Coo,
        ] {
            let m = format.assemble(coo.clone());
            assert_eq!(m.format(), format);
            assert_eq!(m.to_dense(), dense);
            assert!((m.mul_vec(&x).unwrap() - &expected).norm() < 1e-12);
            assert_eq!(m.row_sums(), DVector::from_vec(vec![5.0, 0.0, 4.0]));
            assert!((m.get(0, 0) - 4.0).abs() < 1e-12);
            assert_eq!(m.get(1, 2), 0.0);
        }
    }

    #[test]
    fn test_mul_vec_dimension_mismatch() {
        let m = MatrixFormat::Csr.assemble(sample());
        let x = DVector::from_vec(vec![1.0, 2.0]);
        assert!(matches!(m.mul_vec(&x), Err(MeshError::InvalidParameter { .. })));
    }

    #[test]
    fn test_empty_matrix() {
        let csr = CsrMatrix::from_triplets(3, 2, Vec::new()).unwrap();
        assert_eq!(csr.row_ptr(), &[0, 0, 0, 0]);
        assert_eq!(csr.to_dense(), DMatrix::zeros(3, 2));
        assert!(CscMatrix::from_triplets(1, 1, vec![(0, 1, 1.0)]).is_err());
    }
}
