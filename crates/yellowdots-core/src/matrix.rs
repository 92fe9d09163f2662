//! Rectangular dot grid with toroidal indexing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors produced while building or combining matrices.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("matrix must have at least one row and one column")]
    Empty,
    #[error("row {row} has {got} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("invalid cell character {ch:?} at row {row}, column {col}")]
    InvalidCell { row: usize, col: usize, ch: char },
    #[error("a {rows}x{cols} matrix needs {expected} cells, got {got}")]
    BadLength {
        rows: usize,
        cols: usize,
        expected: usize,
        got: usize,
    },
    #[error("dimension mismatch: {left:?} vs {right:?}")]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
}

/// Grid of detected dot positions, row-major, `true` = dot present.
///
/// Cell `(i, j)` is row `i`, column `j`. The `*_wrapped` accessors and the
/// geometric helpers treat the grid as one period of a page-wide pattern:
/// all index arithmetic is taken modulo the grid dimensions.
///
/// Serialises as a list of row strings made of `0`/`1`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct BinaryMatrix {
    rows: usize,
    cols: usize,
    bits: Vec<bool>,
}

impl BinaryMatrix {
    /// All-empty matrix.
    ///
    /// Panics if either dimension is zero.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        assert!(rows > 0 && cols > 0, "matrix dimensions must be non-zero");
        Self {
            rows,
            cols,
            bits: vec![false; rows * cols],
        }
    }

    /// Build from a row-major bit buffer.
    pub fn from_bits(rows: usize, cols: usize, bits: Vec<bool>) -> Result<Self, MatrixError> {
        if rows == 0 || cols == 0 {
            return Err(MatrixError::Empty);
        }
        let expected = rows * cols;
        if bits.len() != expected {
            return Err(MatrixError::BadLength {
                rows,
                cols,
                expected,
                got: bits.len(),
            });
        }
        Ok(Self { rows, cols, bits })
    }

    /// Parse one string per row.
    ///
    /// `1`, `x`, `X` and `#` mark a dot; `0` and `.` mark an empty cell.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, MatrixError> {
        let Some(first) = rows.first() else {
            return Err(MatrixError::Empty);
        };
        let cols = first.as_ref().chars().count();
        if cols == 0 {
            return Err(MatrixError::Empty);
        }

        let mut bits = Vec::with_capacity(rows.len() * cols);
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let got = line.chars().count();
            if got != cols {
                return Err(MatrixError::RaggedRow {
                    row,
                    expected: cols,
                    got,
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let bit = match ch {
                    '1' | 'x' | 'X' | '#' => true,
                    '0' | '.' => false,
                    _ => return Err(MatrixError::InvalidCell { row, col, ch }),
                };
                bits.push(bit);
            }
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            bits,
        })
    }

    /// Row strings of `0`/`1`, the inverse of [`BinaryMatrix::from_rows`].
    pub fn to_rows(&self) -> Vec<String> {
        (0..self.rows)
            .map(|i| {
                self.row_bits(i)
                    .iter()
                    .map(|&b| if b { '1' } else { '0' })
                    .collect()
            })
            .collect()
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Read cell `(i, j)`. Panics when out of bounds.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> bool {
        assert!(i < self.rows && j < self.cols, "cell ({i}, {j}) out of bounds");
        self.bits[i * self.cols + j]
    }

    /// Write cell `(i, j)`. Panics when out of bounds.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: bool) {
        assert!(i < self.rows && j < self.cols, "cell ({i}, {j}) out of bounds");
        self.bits[i * self.cols + j] = value;
    }

    /// Read with wrap-around indexing.
    #[inline]
    pub fn get_wrapped(&self, i: isize, j: isize) -> bool {
        let (i, j) = self.wrap(i, j);
        self.bits[i * self.cols + j]
    }

    /// Write with wrap-around indexing.
    #[inline]
    pub fn set_wrapped(&mut self, i: isize, j: isize, value: bool) {
        let (i, j) = self.wrap(i, j);
        self.bits[i * self.cols + j] = value;
    }

    #[inline]
    fn wrap(&self, i: isize, j: isize) -> (usize, usize) {
        (
            i.rem_euclid(self.rows as isize) as usize,
            j.rem_euclid(self.cols as isize) as usize,
        )
    }

    fn row_bits(&self, i: usize) -> &[bool] {
        &self.bits[i * self.cols..(i + 1) * self.cols]
    }

    /// Total number of dots.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// True when the grid holds no dot at all.
    pub fn is_blank(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }

    /// Number of dots in row `i`.
    pub fn row_count(&self, i: usize) -> usize {
        self.row_bits(i).iter().filter(|&&b| b).count()
    }

    /// Number of dots in column `j`.
    pub fn col_count(&self, j: usize) -> usize {
        (0..self.rows).filter(|&i| self.get(i, j)).count()
    }

    /// Coordinates of every dot in row-major order.
    pub fn ones(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let cols = self.cols;
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(move |(idx, _)| (idx / cols, idx % cols))
    }

    fn check_dims(&self, other: &BinaryMatrix) -> Result<(), MatrixError> {
        if self.dims() != other.dims() {
            return Err(MatrixError::DimensionMismatch {
                left: self.dims(),
                right: other.dims(),
            });
        }
        Ok(())
    }

    /// Cell-wise OR.
    pub fn union(&self, other: &BinaryMatrix) -> Result<BinaryMatrix, MatrixError> {
        self.check_dims(other)?;
        let bits = self
            .bits
            .iter()
            .zip(&other.bits)
            .map(|(&a, &b)| a || b)
            .collect();
        Ok(Self { bits, ..*self })
    }

    /// Cells set in `self` but not in `other`.
    pub fn difference(&self, other: &BinaryMatrix) -> Result<BinaryMatrix, MatrixError> {
        self.check_dims(other)?;
        let bits = self
            .bits
            .iter()
            .zip(&other.bits)
            .map(|(&a, &b)| a && !b)
            .collect();
        Ok(Self { bits, ..*self })
    }

    /// True when both grids share at least one dot.
    pub fn intersects(&self, other: &BinaryMatrix) -> Result<bool, MatrixError> {
        self.check_dims(other)?;
        Ok(self.bits.iter().zip(&other.bits).any(|(&a, &b)| a && b))
    }

    /// True when every dot of `self` is also set in `other`.
    pub fn is_subset_of(&self, other: &BinaryMatrix) -> Result<bool, MatrixError> {
        self.check_dims(other)?;
        Ok(self.bits.iter().zip(&other.bits).all(|(&a, &b)| !a || b))
    }

    /// Mirror left/right: column `j` moves to `cols - 1 - j`.
    pub fn flipped(&self) -> BinaryMatrix {
        let mut out = BinaryMatrix::zeros(self.rows, self.cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.set(i, j, self.get(i, self.cols - 1 - j));
            }
        }
        out
    }

    /// Rotate counter-clockwise by `quarter_turns × 90°`.
    ///
    /// Odd turns swap the dimensions.
    pub fn rotated(&self, quarter_turns: u8) -> BinaryMatrix {
        let mut out = self.clone();
        for _ in 0..(quarter_turns & 3) {
            out = out.rotated_once();
        }
        out
    }

    fn rotated_once(&self) -> BinaryMatrix {
        let (rows, cols) = (self.cols, self.rows);
        let mut out = BinaryMatrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                out.set(i, j, self.get(j, self.cols - 1 - i));
            }
        }
        out
    }

    /// Periodic shift: `out[i][j] = self[i - dy][j - dx]` (modulo dimensions).
    pub fn rolled(&self, dy: isize, dx: isize) -> BinaryMatrix {
        let mut out = BinaryMatrix::zeros(self.rows, self.cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                let v = self.get_wrapped(i as isize - dy, j as isize - dx);
                out.set(i, j, v);
            }
        }
        out
    }

    /// Copy a `rows × cols` window starting at `(i0, j0)`, wrapping at the edges.
    pub fn window_wrapped(&self, i0: usize, j0: usize, rows: usize, cols: usize) -> BinaryMatrix {
        let mut out = BinaryMatrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                out.set(i, j, self.get_wrapped((i0 + i) as isize, (j0 + j) as isize));
            }
        }
        out
    }

    /// Overwrite the cells under `block` placed at `(i0, j0)`, wrapping at the edges.
    pub fn paste_wrapped(&mut self, i0: usize, j0: usize, block: &BinaryMatrix) {
        for i in 0..block.rows {
            for j in 0..block.cols {
                self.set_wrapped((i0 + i) as isize, (j0 + j) as isize, block.get(i, j));
            }
        }
    }

    /// Repeat this grid periodically to fill a `rows × cols` grid.
    pub fn tiled(&self, rows: usize, cols: usize) -> BinaryMatrix {
        self.window_wrapped(0, 0, rows, cols)
    }
}

impl TryFrom<Vec<String>> for BinaryMatrix {
    type Error = MatrixError;

    fn try_from(rows: Vec<String>) -> Result<Self, Self::Error> {
        BinaryMatrix::from_rows(&rows)
    }
}

impl From<BinaryMatrix> for Vec<String> {
    fn from(m: BinaryMatrix) -> Self {
        m.to_rows()
    }
}

impl fmt::Display for BinaryMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            let line: String = self
                .row_bits(i)
                .iter()
                .map(|&b| if b { '#' } else { '.' })
                .collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for BinaryMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BinaryMatrix {}x{}", self.rows, self.cols)?;
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BinaryMatrix {
        BinaryMatrix::from_rows(&["100", "011"]).expect("matrix")
    }

    #[test]
    fn parses_and_prints_rows() {
        let m = BinaryMatrix::from_rows(&["x.#", "0.1"]).expect("matrix");
        assert_eq!(m.dims(), (2, 3));
        assert_eq!(m.to_rows(), vec!["101".to_string(), "001".to_string()]);
        assert_eq!(m.count_ones(), 3);
    }

    #[test]
    fn rejects_ragged_and_unknown_cells() {
        assert_eq!(
            BinaryMatrix::from_rows(&["10", "1"]),
            Err(MatrixError::RaggedRow {
                row: 1,
                expected: 2,
                got: 1
            })
        );
        assert!(matches!(
            BinaryMatrix::from_rows(&["1?"]),
            Err(MatrixError::InvalidCell { ch: '?', .. })
        ));
        let empty: [&str; 0] = [];
        assert_eq!(BinaryMatrix::from_rows(&empty), Err(MatrixError::Empty));
    }

    #[test]
    fn wrapped_access_is_toroidal() {
        let m = sample();
        assert!(m.get_wrapped(-2, 3));
        assert!(m.get_wrapped(3, -1));
        assert!(!m.get_wrapped(2, 1));
    }

    #[test]
    fn rotation_swaps_dims_and_four_turns_is_identity() {
        let m = sample();
        let r = m.rotated(1);
        assert_eq!(r.dims(), (3, 2));
        // counter-clockwise: the last column becomes the first row
        assert_eq!(r.to_rows(), vec!["01", "01", "10"]);
        assert_eq!(m.rotated(4), m);
        assert_eq!(r.rotated(3), m);
    }

    #[test]
    fn roll_moves_content_forward() {
        let m = sample();
        let r = m.rolled(1, 1);
        assert_eq!(r.to_rows(), vec!["101", "010"]);
        assert_eq!(r.rolled(-1, -1), m);
    }

    #[test]
    fn flip_mirrors_columns() {
        let m = sample();
        assert_eq!(m.flipped().to_rows(), vec!["001", "110"]);
        assert_eq!(m.flipped().flipped(), m);
    }

    #[test]
    fn set_operations_check_dimensions() {
        let a = sample();
        let b = BinaryMatrix::from_rows(&["001", "001"]).expect("matrix");
        let u = a.union(&b).expect("union");
        assert_eq!(u.to_rows(), vec!["101", "011"]);
        assert!(a.is_subset_of(&u).expect("subset"));
        assert!(a.intersects(&b).expect("intersects"));
        assert_eq!(u.difference(&a).expect("diff").to_rows(), vec!["001", "000"]);
        assert!(a.union(&a.rotated(1)).is_err());
    }

    #[test]
    fn tiling_and_windows_wrap() {
        let m = sample();
        let t = m.tiled(4, 6);
        assert_eq!(t.window_wrapped(2, 3, 2, 3), m);
        let mut canvas = BinaryMatrix::zeros(2, 3);
        canvas.paste_wrapped(1, 2, &m);
        assert_eq!(canvas, m.rolled(1, 2));
    }

    #[test]
    fn serde_uses_row_strings() {
        let m = sample();
        let json = serde_json::to_string(&m).expect("serialize");
        assert_eq!(json, r#"["100","011"]"#);
        let back: BinaryMatrix = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, m);
        assert!(serde_json::from_str::<BinaryMatrix>(r#"["10","1"]"#).is_err());
    }
}
