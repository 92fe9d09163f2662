//! Printer tracking-dot encodings.
//!
//! Each encoding family is a [`PatternSpec`]: grid dimensions, the reference
//! cells that pin down its orientation and offset, how redundant copies are
//! laid out, which cells are kept after cropping, the structural groups that
//! must hold, and a declarative description of its payload fields.
//!
//! The [`PatternCatalog::builtin`] catalog carries three families:
//! - [`PatternId::Pattern1`]: 16×16 square lattice with row/column parity,
//! - [`PatternId::Pattern2`]: 18×23 one-hot digit grid with a manufacturer code,
//! - [`PatternId::Pattern3`]: 16×32 tile of 7-bit column words with odd parity.
//!
//! Nothing here searches raw grids; see the `yellowdots` crate for that.

mod builtin;
mod catalog;
mod codec;
mod layout;
mod pattern;
pub mod tables;

pub use catalog::PatternCatalog;
pub use codec::{
    CodecError, DigitTable, FieldCodec, FieldSpec, LetterPrefix, RawFormat, VendorTable,
};
pub use layout::{Axis, Cell, CellGroup, GroupRule, Word};
pub use pattern::{
    AlignmentVariant, CropRule, FixedCount, Line, MaskScheme, PatternId, PatternSpec, Replication,
};
