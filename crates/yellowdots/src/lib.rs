//! Recognise, decode and anonymise printer tracking-dot patterns.
//!
//! A dot detector hands over a [`BinaryMatrix`](core::BinaryMatrix): one
//! repetition tile of yellow dots, in unknown orientation and at an unknown
//! toroidal offset. This crate finds every transform that aligns the tile with
//! a catalog pattern, validates the aligned grid against the pattern's
//! structure, decodes its payload and builds masks that hide it.
//!
//! ## Quickstart
//!
//! ```
//! use yellowdots::patterns::PatternId;
//! use yellowdots::{MaskGenerator, MaskParams, Scanner, ScanParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tile = PatternId::Pattern3.spec().render(&[
//!     ("minute", "10"),
//!     ("hour", "08"),
//!     ("day", "21"),
//!     ("month", "12"),
//!     ("year", "2016"),
//!     ("serial", "00471193"),
//! ])?;
//!
//! let report = Scanner::new(ScanParams::default()).scan(&tile)?;
//! let finding = report.findings().next().ok_or("no match")?;
//! assert_eq!(finding.payload.get("year"), Some("2016"));
//!
//! let mask = MaskGenerator::new(MaskParams::strategic(1)).generate(&finding.tdm)?;
//! let overlay = mask.in_raw_frame(&finding.tdm);
//! assert_eq!(overlay.dims(), tile.dims());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `yellowdots::core`: binary grids, transforms, logger setup.
//! - `yellowdots::patterns`: pattern definitions and the built-in catalog.
//! - [`align_candidates`], [`assemble`], [`decode`]: the per-pattern pipeline.
//! - [`Scanner`]: the pipeline over the whole catalog, with a deadline.
//! - [`MaskGenerator`]: full and strategic anonymising masks.
//! - [`ScanConfig`]: JSON front-end.
//!
//! ## Features
//! - `rayon`: scan catalog patterns in parallel.
//! - `tracing`: emit `tracing` spans from the hot entry points.

pub use yellowdots_core as core;
pub use yellowdots_patterns as patterns;

mod decode;
mod error;
mod io;
mod mask;
mod scan;
mod search;
mod tdm;

pub use decode::{decode, Payload, PayloadField};
pub use error::ScanError;
pub use io::{MaskReport, ScanConfig, ScanSummary};
pub use mask::{Mask, MaskError, MaskGenerator, MaskParams, MaskPolicy};
pub use scan::{scan, Finding, PatternOutcome, PatternReport, ScanParams, ScanReport, Scanner};
pub use search::align_candidates;
pub use tdm::{assemble, assemble_all, TrackingDotMatrix};
