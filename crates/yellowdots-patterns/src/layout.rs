//! Cell groups and words inside a cropped pattern grid.
//!
//! All coordinates here are in the cropped frame produced by a pattern's
//! [`CropRule`](crate::CropRule).

use yellowdots_core::BinaryMatrix;

/// `(row, col)` cell coordinate.
pub type Cell = (usize, usize);

/// Reading direction of a [`Word`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Left to right along a row.
    Row,
    /// Top to bottom down a column.
    Col,
}

/// A run of cells read most significant bit first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Word {
    pub row: usize,
    pub col: usize,
    pub len: usize,
    pub axis: Axis,
}

impl Word {
    /// `len` cells of row `row`, starting at column `col`.
    pub const fn row(row: usize, col: usize, len: usize) -> Self {
        Self {
            row,
            col,
            len,
            axis: Axis::Row,
        }
    }

    /// `len` cells of column `col`, starting at row `row`.
    pub const fn col(row: usize, col: usize, len: usize) -> Self {
        Self {
            row,
            col,
            len,
            axis: Axis::Col,
        }
    }

    /// Cell of bit `k` (0 = most significant).
    #[inline]
    pub fn cell(&self, k: usize) -> Cell {
        match self.axis {
            Axis::Row => (self.row, self.col + k),
            Axis::Col => (self.row + k, self.col),
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.len).map(move |k| self.cell(k))
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells().any(|c| c == cell)
    }

    /// The row (for [`Axis::Row`]) or column (for [`Axis::Col`]) this word lies on.
    pub fn line(&self) -> usize {
        match self.axis {
            Axis::Row => self.row,
            Axis::Col => self.col,
        }
    }

    /// Positions covered along [`Word::line`].
    pub fn positions(&self) -> std::ops::Range<usize> {
        let start = match self.axis {
            Axis::Row => self.col,
            Axis::Col => self.row,
        };
        start..start + self.len
    }

    /// Unsigned value of the word.
    pub fn value(&self, m: &BinaryMatrix) -> u32 {
        self.cells()
            .fold(0u32, |acc, (i, j)| (acc << 1) | u32::from(m.get(i, j)))
    }

    /// Bits as a `0`/`1` string.
    pub fn bit_string(&self, m: &BinaryMatrix) -> String {
        self.cells()
            .map(|(i, j)| if m.get(i, j) { '1' } else { '0' })
            .collect()
    }

    /// Index of the single set bit, or `None` if the word is not one-hot.
    pub fn one_hot(&self, m: &BinaryMatrix) -> Option<usize> {
        let mut found = None;
        for (k, (i, j)) in self.cells().enumerate() {
            if m.get(i, j) {
                if found.is_some() {
                    return None;
                }
                found = Some(k);
            }
        }
        found
    }

    /// Write the low `len` bits of `value`.
    pub fn write_value(&self, m: &mut BinaryMatrix, value: u32) {
        for k in 0..self.len {
            let shift = self.len - 1 - k;
            let bit = shift < 32 && (value >> shift) & 1 == 1;
            let (i, j) = self.cell(k);
            m.set(i, j, bit);
        }
    }

    /// Clear the word and set bit `index`.
    pub fn write_one_hot(&self, m: &mut BinaryMatrix, index: usize) {
        for k in 0..self.len {
            let (i, j) = self.cell(k);
            m.set(i, j, k == index);
        }
    }

    /// Write a `0`/`1` string; extra characters are ignored.
    pub fn write_bits(&self, m: &mut BinaryMatrix, bits: &str) {
        for (k, ch) in bits.chars().take(self.len).enumerate() {
            let (i, j) = self.cell(k);
            m.set(i, j, ch == '1');
        }
    }
}

/// Structural rule a [`CellGroup`] must satisfy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupRule {
    /// Exactly one cell set.
    OneHot,
    /// Even number of cells set.
    EvenParity,
    /// Odd number of cells set.
    OddParity,
    AllSet,
    AllEmpty,
}

impl GroupRule {
    /// Rules whose cells carry payload or its checksums.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            GroupRule::OneHot | GroupRule::EvenParity | GroupRule::OddParity
        )
    }
}

/// Named set of cells checked by one rule.
#[derive(Clone, Debug)]
pub struct CellGroup {
    pub name: String,
    pub cells: Vec<Cell>,
    pub rule: GroupRule,
}

impl CellGroup {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>, rule: GroupRule) -> Self {
        Self {
            name: name.into(),
            cells,
            rule,
        }
    }

    /// Group covering the cells of `word`.
    pub fn from_word(name: impl Into<String>, word: &Word, rule: GroupRule) -> Self {
        Self::new(name, word.cells().collect(), rule)
    }

    pub fn count(&self, m: &BinaryMatrix) -> usize {
        self.cells.iter().filter(|&&(i, j)| m.get(i, j)).count()
    }

    /// Evaluate the rule on `m`. Cells outside `m` make the group fail.
    pub fn holds(&self, m: &BinaryMatrix) -> bool {
        if self
            .cells
            .iter()
            .any(|&(i, j)| i >= m.rows() || j >= m.cols())
        {
            return false;
        }
        let count = self.count(m);
        match self.rule {
            GroupRule::OneHot => count == 1,
            GroupRule::EvenParity => count % 2 == 0,
            GroupRule::OddParity => count % 2 == 1,
            GroupRule::AllSet => count == self.cells.len(),
            GroupRule::AllEmpty => count == 0,
        }
    }
}
