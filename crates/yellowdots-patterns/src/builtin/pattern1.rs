//! Square 16×16 tile made of four copies of an 8×8 block.
//!
//! Block layout (aligned frame):
//!
//! ```text
//!   col 0 1 2 3 4 5 6 7
//! row 0   # # . . . . . .    sync
//!     1   . d d d d d d p    serial (bits 23..18)
//!     2   # d d d d d d p    serial
//!     3   . d d d d d d p    serial
//!     4   . d d d d d d p    serial (bits 5..0)
//!     5   . d d d d d d p    year - 2000
//!     6   . m m m m u u p    month, unknown1
//!     7   . p p p p p p p    column parity
//! ```
//!
//! Row and column parity are even over columns/rows 1..=7.

use yellowdots_core::BinaryMatrix;

use crate::codec::{FieldCodec, FieldSpec, RawFormat};
use crate::layout::{Axis, Cell, CellGroup, GroupRule, Word};
use crate::pattern::{
    AlignmentVariant, CropRule, FixedCount, Line, MaskScheme, PatternId, PatternSpec, Replication,
};

const BLOCK: usize = 8;
const SYNC: [Cell; 3] = [(0, 0), (0, 1), (2, 0)];

fn margin() -> Vec<Cell> {
    let row = (2..BLOCK).map(|j| (0, j));
    let col = (1..BLOCK).filter(|&i| i != 2).map(|i| (i, 0));
    row.chain(col).collect()
}

fn prefilter(m: &BinaryMatrix) -> bool {
    (0..m.rows()).any(|i| m.row_count(i) == 4) && (0..m.cols()).any(|j| m.col_count(j) == 4)
}

fn seal(m: &mut BinaryMatrix) {
    for &(i, j) in &SYNC {
        m.set(i, j, true);
    }
    for (i, j) in margin() {
        m.set(i, j, false);
    }
    for i in 1..BLOCK - 1 {
        let odd = (1..BLOCK - 1).filter(|&j| m.get(i, j)).count() % 2 == 1;
        m.set(i, BLOCK - 1, odd);
    }
    for j in 1..BLOCK {
        let odd = (1..BLOCK - 1).filter(|&i| m.get(i, j)).count() % 2 == 1;
        m.set(BLOCK - 1, j, odd);
    }
}

pub(crate) fn spec() -> PatternSpec {
    let variant = |base_rotation| AlignmentVariant {
        must_be_set: SYNC.to_vec(),
        must_be_empty: margin(),
        allow_flip: true,
        allow_upside_down: true,
        base_rotation,
    };

    let mut groups = vec![
        CellGroup::new("sync", SYNC.to_vec(), GroupRule::AllSet),
        CellGroup::new("margin", margin(), GroupRule::AllEmpty),
    ];
    for i in 1..BLOCK {
        let cells = (1..BLOCK).map(|j| (i, j)).collect();
        groups.push(CellGroup::new(format!("row_parity[{i}]"), cells, GroupRule::EvenParity));
    }
    for j in 1..BLOCK {
        let cells = (1..BLOCK).map(|i| (i, j)).collect();
        groups.push(CellGroup::new(format!("col_parity[{j}]"), cells, GroupRule::EvenParity));
    }

    let fields = vec![
        FieldSpec::new(
            "serial",
            (1..=4).map(|r| Word::row(r, 1, 6)).collect(),
            FieldCodec::Binary {
                offset: 0,
                pad: 8,
                range: None,
            },
        ),
        FieldSpec::new(
            "year",
            vec![Word::row(5, 1, 6)],
            FieldCodec::Binary {
                offset: 2000,
                pad: 4,
                range: None,
            },
        ),
        FieldSpec::new(
            "month",
            vec![Word::row(6, 1, 4)],
            FieldCodec::Binary {
                offset: 0,
                pad: 2,
                range: Some(1..=12),
            },
        ),
        FieldSpec::new(
            "unknown1",
            vec![Word::row(6, 5, 2)],
            FieldCodec::Binary {
                offset: 0,
                pad: 1,
                range: None,
            },
        )
        .opaque(),
    ];

    PatternSpec {
        id: PatternId::Pattern1,
        name: "16x16 square lattice, 8x8 block with row and column parity",
        printer: "Canon",
        manufacturer: Some("Canon"),
        rows: 2 * BLOCK,
        cols: 2 * BLOCK,
        prototype: Some((BLOCK, BLOCK)),
        variants: vec![variant(0), variant(1)],
        prefilter,
        replication: Replication {
            origin: (0, 0),
            size: (BLOCK, BLOCK),
            offsets: vec![(0, BLOCK), (BLOCK, 0), (BLOCK, BLOCK)],
        },
        crop: CropRule {
            rows: (0..BLOCK).collect(),
            cols: 0..BLOCK,
            fixed_counts: vec![
                FixedCount {
                    line: Line::Row(0),
                    count: 2,
                },
                FixedCount {
                    line: Line::Col(0),
                    count: 2,
                },
            ],
        },
        groups,
        fields,
        raw: RawFormat::LineHex((1..BLOCK).map(|r| Word::row(r, 1, 7)).collect()),
        mask: MaskScheme::ParityCycles {
            axis: Axis::Row,
            lines: 1..BLOCK - 1,
            positions: 1..BLOCK - 1,
        },
        seal,
    }
}
