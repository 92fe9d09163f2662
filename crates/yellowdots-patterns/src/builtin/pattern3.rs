//! 16×32 tile: an 8×16 block and one staggered copy at offset (8, 16).
//!
//! Block layout (aligned frame): columns 1..=13 each hold a 7-bit word in
//! rows 1..=7, most significant bit on row 1. Column 0 makes every row odd
//! over columns 0..=13, row 0 makes every data column odd over rows 0..=7.
//! Column 14 rows 1..=7 is a solid separator; `(0, 0)`, `(0, 14)` and
//! column 15 stay empty.

use std::ops::RangeInclusive;

use yellowdots_core::BinaryMatrix;

use crate::codec::{FieldCodec, FieldSpec, RawFormat};
use crate::layout::{Axis, Cell, CellGroup, GroupRule, Word};
use crate::pattern::{
    AlignmentVariant, CropRule, FixedCount, Line, MaskScheme, PatternId, PatternSpec, Replication,
};

const BLOCK_ROWS: usize = 8;
const BLOCK_COLS: usize = 16;
const SEPARATOR: usize = 14;
const DATA_COLS: RangeInclusive<usize> = 1..=13;

fn data(c: usize) -> Word {
    Word::col(1, c, 7)
}

fn separator() -> Vec<Cell> {
    (1..BLOCK_ROWS).map(|i| (i, SEPARATOR)).collect()
}

fn blanks() -> Vec<Cell> {
    let mut cells = vec![(0, 0), (0, SEPARATOR)];
    cells.extend((0..BLOCK_ROWS).map(|i| (i, BLOCK_COLS - 1)));
    cells
}

fn prefilter(m: &BinaryMatrix) -> bool {
    let odd_cols = (0..m.cols()).filter(|&j| m.col_count(j) % 2 == 1).count();
    odd_cols >= 26 && (0..m.cols()).any(|j| m.col_count(j) == 7)
}

fn seal(m: &mut BinaryMatrix) {
    for (i, j) in blanks() {
        m.set(i, j, false);
    }
    for (i, j) in separator() {
        m.set(i, j, true);
    }
    for i in 1..BLOCK_ROWS {
        let even = DATA_COLS.filter(|&j| m.get(i, j)).count() % 2 == 0;
        m.set(i, 0, even);
    }
    for j in DATA_COLS {
        let even = (1..BLOCK_ROWS).filter(|&i| m.get(i, j)).count() % 2 == 0;
        m.set(0, j, even);
    }
}

fn binary(
    name: &'static str,
    c: usize,
    offset: u32,
    pad: usize,
    range: Option<RangeInclusive<u32>>,
) -> FieldSpec {
    FieldSpec::new(name, vec![data(c)], FieldCodec::Binary { offset, pad, range })
}

pub(crate) fn spec() -> PatternSpec {
    let mut groups = Vec::new();
    for i in 1..BLOCK_ROWS {
        let cells = (0..SEPARATOR).map(|j| (i, j)).collect();
        groups.push(CellGroup::new(format!("row_parity[{i}]"), cells, GroupRule::OddParity));
    }
    for j in DATA_COLS {
        let cells = (0..BLOCK_ROWS).map(|i| (i, j)).collect();
        groups.push(CellGroup::new(format!("col_parity[{j}]"), cells, GroupRule::OddParity));
    }
    groups.push(CellGroup::new("separator", separator(), GroupRule::AllSet));
    groups.push(CellGroup::new(
        "corners",
        vec![(0, 0), (0, SEPARATOR)],
        GroupRule::AllEmpty,
    ));

    let fields = vec![
        binary("minute", 1, 0, 2, Some(0..=59)),
        binary("hour", 4, 0, 2, Some(0..=23)),
        binary("day", 5, 0, 2, Some(1..=31)),
        binary("month", 6, 0, 2, Some(1..=12)),
        binary("year", 7, 2000, 4, None),
        FieldSpec::new(
            "serial",
            [10, 11, 12, 13, 2, 3, 8, 9].into_iter().map(data).collect(),
            FieldCodec::DualSerial { decimal_words: 4 },
        ),
    ];

    PatternSpec {
        id: PatternId::Pattern3,
        name: "16x32 tile, 8x16 block of 7-bit column words with odd parity",
        printer: "Xerox DocuColor",
        manufacturer: Some("Xerox"),
        rows: 2 * BLOCK_ROWS,
        cols: 2 * BLOCK_COLS,
        prototype: None,
        variants: vec![AlignmentVariant {
            must_be_set: separator(),
            must_be_empty: blanks(),
            allow_flip: false,
            allow_upside_down: true,
            base_rotation: 0,
        }],
        prefilter,
        replication: Replication {
            origin: (0, 0),
            size: (BLOCK_ROWS, BLOCK_COLS),
            offsets: vec![(BLOCK_ROWS, BLOCK_COLS)],
        },
        crop: CropRule {
            rows: (0..BLOCK_ROWS).collect(),
            cols: 0..BLOCK_COLS - 1,
            fixed_counts: vec![FixedCount {
                line: Line::Col(SEPARATOR),
                count: 7,
            }],
        },
        groups,
        fields,
        raw: RawFormat::LineHex((0..BLOCK_COLS - 1).map(|c| Word::col(0, c, 8)).collect()),
        mask: MaskScheme::ParityCycles {
            axis: Axis::Col,
            lines: 1..SEPARATOR,
            positions: 1..BLOCK_ROWS,
        },
        seal,
    }
}
