//! Pattern definitions: alignment, replication, crop and validation rules.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use yellowdots_core::BinaryMatrix;

use crate::codec::{CodecError, FieldSpec, RawFormat};
use crate::layout::{Axis, Cell, CellGroup};
use crate::PatternCatalog;

/// Identifier of a built-in encoding family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternId {
    Pattern1,
    Pattern2,
    Pattern3,
}

impl PatternId {
    pub const ALL: [PatternId; 3] = [PatternId::Pattern1, PatternId::Pattern2, PatternId::Pattern3];

    pub fn as_str(self) -> &'static str {
        match self {
            PatternId::Pattern1 => "pattern1",
            PatternId::Pattern2 => "pattern2",
            PatternId::Pattern3 => "pattern3",
        }
    }

    /// Definition from the built-in catalog.
    pub fn spec(self) -> &'static PatternSpec {
        PatternCatalog::builtin().get(self)
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatternId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CodecError::UnknownPattern(s.to_string()))
    }
}

/// Reference-cell predicates that pin down one orientation and offset.
///
/// Cells are in the aligned frame and are tested with wrap-around.
#[derive(Clone, Debug)]
pub struct AlignmentVariant {
    pub must_be_set: Vec<Cell>,
    pub must_be_empty: Vec<Cell>,
    pub allow_flip: bool,
    pub allow_upside_down: bool,
    pub base_rotation: u8,
}

impl AlignmentVariant {
    /// Quarter turns to try: the base rotation, plus a half turn if allowed.
    pub fn rotations(&self) -> Vec<u8> {
        let base = self.base_rotation % 4;
        if self.allow_upside_down {
            vec![base, (base + 2) % 4]
        } else {
            vec![base]
        }
    }

    pub fn flips(&self) -> &'static [bool] {
        if self.allow_flip {
            &[false, true]
        } else {
            &[false]
        }
    }

    /// True when every predicate holds with the pattern origin placed at
    /// `(ry, rx)` of `m`.
    #[inline]
    pub fn holds_at(&self, m: &BinaryMatrix, rx: usize, ry: usize) -> bool {
        let at = |(i, j): Cell| m.get_wrapped((i + ry) as isize, (j + rx) as isize);
        self.must_be_set.iter().all(|&c| at(c)) && !self.must_be_empty.iter().any(|&c| at(c))
    }
}

/// Copies an authoritative block to its redundant positions.
#[derive(Clone, Debug)]
pub struct Replication {
    pub origin: Cell,
    pub size: (usize, usize),
    /// Offsets of the copies relative to `origin`, wrapped to the grid.
    pub offsets: Vec<(usize, usize)>,
}

impl Replication {
    pub fn none() -> Self {
        Self {
            origin: (0, 0),
            size: (0, 0),
            offsets: Vec::new(),
        }
    }

    pub fn apply(&self, m: &mut BinaryMatrix) {
        if self.offsets.is_empty() || self.size.0 == 0 || self.size.1 == 0 {
            return;
        }
        let (oi, oj) = self.origin;
        let block = m.window_wrapped(oi, oj, self.size.0, self.size.1);
        for &(di, dj) in &self.offsets {
            m.paste_wrapped(oi + di, oj + dj, &block);
        }
    }
}

/// A row or column of the cropped grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Line {
    Row(usize),
    Col(usize),
}

/// A line whose dot count is fixed for the pattern.
#[derive(Clone, Copy, Debug)]
pub struct FixedCount {
    pub line: Line,
    pub count: usize,
}

/// Selects the canonical cells out of an aligned grid.
#[derive(Clone, Debug)]
pub struct CropRule {
    /// Aligned rows kept, in cropped order.
    pub rows: Vec<usize>,
    /// Aligned columns kept.
    pub cols: Range<usize>,
    pub fixed_counts: Vec<FixedCount>,
}

impl CropRule {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    /// Aligned coordinate of cropped cell `(i, j)`.
    pub fn to_aligned(&self, (i, j): Cell) -> Cell {
        (self.rows[i], self.cols.start + j)
    }

    /// Crop `aligned`; `None` when a fixed-count line disagrees.
    pub fn apply(&self, aligned: &BinaryMatrix) -> Option<BinaryMatrix> {
        let (rows, cols) = self.shape();
        if rows == 0 || cols == 0 {
            return None;
        }
        if self.rows.iter().any(|&r| r >= aligned.rows()) || self.cols.end > aligned.cols() {
            return None;
        }
        let mut out = BinaryMatrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                let (ai, aj) = self.to_aligned((i, j));
                out.set(i, j, aligned.get(ai, aj));
            }
        }
        let counts_match = self.fixed_counts.iter().all(|fc| {
            let got = match fc.line {
                Line::Row(i) if i < rows => out.row_count(i),
                Line::Col(j) if j < cols => out.col_count(j),
                _ => return false,
            };
            got == fc.count
        });
        counts_match.then_some(out)
    }

    /// Write a cropped grid back into its aligned positions.
    pub fn place(&self, cropped: &BinaryMatrix, aligned: &mut BinaryMatrix) {
        for i in 0..cropped.rows() {
            for j in 0..cropped.cols() {
                let (ai, aj) = self.to_aligned((i, j));
                aligned.set(ai, aj, cropped.get(i, j));
            }
        }
    }
}

/// Strategy used by the strategic mask policy.
#[derive(Clone, Debug)]
pub enum MaskScheme {
    /// Every one-hot word gets a different set bit.
    OneHotSlots,
    /// Data words on `lines` gain free cells forming cycles between lines
    /// and `positions`, so every line and position keeps its parity.
    ParityCycles {
        axis: Axis,
        lines: Range<usize>,
        positions: Range<usize>,
    },
}

/// Immutable definition of one tracking-dot encoding.
#[derive(Clone, Debug)]
pub struct PatternSpec {
    pub id: PatternId,
    /// Human readable description.
    pub name: &'static str,
    /// Printers known to emit this pattern.
    pub printer: &'static str,
    /// Manufacturer when the pattern itself does not encode one.
    pub manufacturer: Option<&'static str>,
    pub rows: usize,
    pub cols: usize,
    /// Smaller periodic tile also accepted as input.
    pub prototype: Option<(usize, usize)>,
    pub variants: Vec<AlignmentVariant>,
    /// Cheap necessary condition on an oriented, unrolled grid.
    pub prefilter: fn(&BinaryMatrix) -> bool,
    pub replication: Replication,
    pub crop: CropRule,
    pub groups: Vec<CellGroup>,
    pub fields: Vec<FieldSpec>,
    pub raw: RawFormat,
    pub mask: MaskScheme,
    /// Writes fixed marks and check bits into an aligned grid whose data
    /// cells are already filled.
    pub seal: fn(&mut BinaryMatrix),
}

impl PatternSpec {
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// True when a grid of `dims` can be searched against this pattern.
    pub fn accepts(&self, dims: (usize, usize)) -> bool {
        dims == self.dims() || self.prototype == Some(dims)
    }

    /// Bring an accepted input to full pattern dimensions.
    pub fn expand_window(&self, raw: &BinaryMatrix) -> Option<BinaryMatrix> {
        if raw.dims() == self.dims() {
            Some(raw.clone())
        } else if self.prototype == Some(raw.dims()) {
            Some(raw.tiled(self.rows, self.cols))
        } else {
            None
        }
    }

    #[inline]
    pub fn passes_prefilter(&self, m: &BinaryMatrix) -> bool {
        (self.prefilter)(m)
    }

    /// Copy the authoritative block into its redundant positions.
    pub fn replicate(&self, aligned: &mut BinaryMatrix) {
        self.replication.apply(aligned);
    }

    pub fn crop(&self, aligned: &BinaryMatrix) -> Option<BinaryMatrix> {
        self.crop.apply(aligned)
    }

    /// Structural checks on a cropped grid.
    pub fn validate(&self, cropped: &BinaryMatrix) -> bool {
        cropped.dims() == self.crop.shape() && self.groups.iter().all(|g| g.holds(cropped))
    }

    /// Aligned cells that belong to a one-hot or parity group.
    pub fn structural_cells(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self
            .groups
            .iter()
            .filter(|g| g.rule.is_structural())
            .flat_map(|g| g.cells.iter().map(|&c| self.crop.to_aligned(c)))
            .collect();
        cells.sort_unstable();
        cells.dedup();
        cells
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Build an aligned grid carrying `values`, one per field.
    ///
    /// The manufacturer field accepts either a code or a vendor name.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<BinaryMatrix, CodecError> {
        let (rows, cols) = self.crop.shape();
        let mut cropped = BinaryMatrix::zeros(rows, cols);
        for field in &self.fields {
            let value = values
                .iter()
                .find(|(name, _)| *name == field.name)
                .map(|(_, v)| *v)
                .ok_or_else(|| CodecError::MissingField {
                    field: field.name.to_string(),
                })?;
            field.encode(&mut cropped, value)?;
        }

        let mut aligned = BinaryMatrix::zeros(self.rows, self.cols);
        self.crop.place(&cropped, &mut aligned);
        (self.seal)(&mut aligned);
        self.replicate(&mut aligned);
        Ok(aligned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_ids_parse_and_print() {
        for id in PatternId::ALL {
            assert_eq!(id.as_str().parse::<PatternId>().expect("parse"), id);
            assert_eq!(id.to_string(), id.as_str());
        }
        assert_eq!(
            "Pattern2".parse::<PatternId>().expect("case-insensitive"),
            PatternId::Pattern2
        );
        assert!(matches!(
            "pattern9".parse::<PatternId>(),
            Err(CodecError::UnknownPattern(_))
        ));
        let json = serde_json::to_string(&PatternId::Pattern3).expect("json");
        assert_eq!(json, "\"pattern3\"");
    }

    #[test]
    fn variant_orientations() {
        let v = AlignmentVariant {
            must_be_set: vec![(0, 0)],
            must_be_empty: vec![(0, 1)],
            allow_flip: false,
            allow_upside_down: true,
            base_rotation: 3,
        };
        assert_eq!(v.rotations(), vec![3, 1]);
        assert_eq!(v.flips(), &[false]);

        let m = BinaryMatrix::from_rows(&["001", "000"]).expect("matrix");
        assert!(v.holds_at(&m, 2, 0));
        assert!(!v.holds_at(&m, 1, 0));
        assert!(!v.holds_at(&m, 2, 1));
    }

    #[test]
    fn replication_wraps_copies() {
        let mut m = BinaryMatrix::from_rows(&["1000", "0000"]).expect("matrix");
        let rep = Replication {
            origin: (0, 0),
            size: (1, 2),
            offsets: vec![(1, 3)],
        };
        rep.apply(&mut m);
        assert_eq!(m.to_rows(), vec!["1000", "0001"]);
    }

    #[test]
    fn crop_checks_fixed_counts() {
        let m = BinaryMatrix::from_rows(&["1100", "0110", "1111"]).expect("matrix");
        let crop = CropRule {
            rows: vec![2, 0],
            cols: 1..3,
            fixed_counts: vec![FixedCount {
                line: Line::Row(1),
                count: 1,
            }],
        };
        let out = crop.apply(&m).expect("crop");
        assert_eq!(out.to_rows(), vec!["11", "10"]);
        assert_eq!(crop.to_aligned((1, 1)), (0, 2));

        let strict = CropRule {
            fixed_counts: vec![FixedCount {
                line: Line::Col(0),
                count: 0,
            }],
            ..crop
        };
        assert!(strict.apply(&m).is_none());
    }
}
