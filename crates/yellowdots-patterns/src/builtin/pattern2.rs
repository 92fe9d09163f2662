//! 18×23 grid of 4-bit one-hot words.
//!
//! Row 0 is a full header (columns 1..=22), column 0 is always empty. Rows
//! 1..=4 and 5..=8 hold one one-hot word per column, rows 9..=16 repeat them,
//! and row 17 closes every column with even parity over rows 1..=8.

use yellowdots_core::BinaryMatrix;

use crate::codec::{FieldCodec, FieldSpec, LetterPrefix, RawFormat};
use crate::layout::{CellGroup, GroupRule, Word};
use crate::pattern::{AlignmentVariant, CropRule, MaskScheme, PatternId, PatternSpec, Replication};
use crate::tables::{MANUFACTURER_CODES, ONE_HOT_PAIR_DIGITS, SERIAL_LETTERS};

const ROWS: usize = 18;
const COLS: usize = 23;
const WORDS: usize = COLS - 1;
const PARITY_ROW: usize = 17;

/// Word `c` of band `b` in the cropped frame.
fn word(band: usize, c: usize) -> Word {
    Word::col(4 * band, c, 4)
}

fn band(band: usize, range: std::ops::Range<usize>) -> Vec<Word> {
    range.map(|c| word(band, c)).collect()
}

fn prefilter(m: &BinaryMatrix) -> bool {
    (0..m.rows()).any(|i| m.row_count(i) == WORDS) && (0..m.cols()).any(|j| m.col_count(j) == 0)
}

fn seal(m: &mut BinaryMatrix) {
    for i in 0..ROWS {
        m.set(i, 0, false);
    }
    for j in 1..COLS {
        m.set(0, j, true);
        let odd = (1..=8).filter(|&i| m.get(i, j)).count() % 2 == 1;
        m.set(PARITY_ROW, j, odd);
    }
}

fn digits(name: &'static str, words: Vec<Word>, prefix: &'static str) -> FieldSpec {
    FieldSpec::new(
        name,
        words,
        FieldCodec::DigitTable {
            table: ONE_HOT_PAIR_DIGITS,
            prefix,
            letters: None,
        },
    )
}

pub(crate) fn spec() -> PatternSpec {
    let mut groups = Vec::with_capacity(3 * WORDS);
    for b in 0..2 {
        for c in 0..WORDS {
            groups.push(CellGroup::from_word(
                format!("band{b}[{c}]"),
                &word(b, c),
                GroupRule::OneHot,
            ));
        }
    }
    for c in 0..WORDS {
        let cells = (0..=8).map(|i| (i, c)).collect();
        groups.push(CellGroup::new(format!("parity[{c}]"), cells, GroupRule::EvenParity));
    }

    let fields = vec![
        FieldSpec::new(
            "manufacturer",
            band(0, 0..4),
            FieldCodec::Manufacturer {
                table: MANUFACTURER_CODES,
            },
        )
        .opaque(),
        FieldSpec::new(
            "serial",
            band(0, 4..16),
            FieldCodec::DigitTable {
                table: ONE_HOT_PAIR_DIGITS,
                prefix: "",
                letters: Some(LetterPrefix {
                    digits: 2,
                    table: SERIAL_LETTERS,
                }),
            },
        ),
        digits("unknown1", band(0, 16..22), "").opaque(),
        digits("year", band(1, 0..4), "20"),
        digits("month", band(1, 4..8), ""),
        digits("day", band(1, 8..12), ""),
        digits("hour", band(1, 12..16), ""),
        digits("minute", band(1, 16..20), ""),
        FieldSpec::new("unknown2", band(1, 20..22), FieldCodec::OneHotDigits).opaque(),
    ];

    PatternSpec {
        id: PatternId::Pattern2,
        name: "18x23 one-hot digit grid with manufacturer code",
        printer: "Dell / Epson / Konica Minolta / Kyocera / Lexmark / Okidata / Xerox",
        manufacturer: None,
        rows: ROWS,
        cols: COLS,
        prototype: None,
        variants: vec![AlignmentVariant {
            must_be_set: (1..COLS).map(|j| (0, j)).collect(),
            must_be_empty: (0..ROWS).map(|i| (i, 0)).collect(),
            allow_flip: false,
            allow_upside_down: true,
            base_rotation: 0,
        }],
        prefilter,
        replication: Replication {
            origin: (1, 0),
            size: (8, COLS),
            offsets: vec![(8, 0)],
        },
        crop: CropRule {
            rows: (1..=8).chain([PARITY_ROW]).collect(),
            cols: 1..COLS,
            fixed_counts: Vec::new(),
        },
        groups,
        fields,
        raw: RawFormat::OneHotDigits(vec![band(0, 0..WORDS), band(1, 0..WORDS)]),
        mask: MaskScheme::OneHotSlots,
        seal,
    }
}
