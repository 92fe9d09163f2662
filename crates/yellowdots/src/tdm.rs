//! Validated tracking-dot matrices and the assembler that builds them.

use std::hash::{Hash, Hasher};

use log::debug;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::core::{BinaryMatrix, Transform};
use crate::patterns::{PatternId, PatternSpec};
use crate::search::align_candidates;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A grid that passed every structural check of its pattern.
///
/// Only [`assemble`] and [`TrackingDotMatrix::from_aligned`] create values of
/// this type. Two matrices are equal when their cropped cells are equal,
/// regardless of the transform that produced them.
#[derive(Clone, Debug)]
pub struct TrackingDotMatrix<'a> {
    spec: &'a PatternSpec,
    transform: Transform,
    raw_dims: (usize, usize),
    aligned: BinaryMatrix,
    cropped: BinaryMatrix,
}

impl<'a> TrackingDotMatrix<'a> {
    /// Validate a grid that is already in the aligned frame.
    pub fn from_aligned(spec: &'a PatternSpec, aligned: &BinaryMatrix) -> Option<Self> {
        let dims = aligned.dims();
        let full = spec.expand_window(aligned)?;
        let mut tdm = assemble(&full, spec, Transform::IDENTITY)?;
        tdm.raw_dims = dims;
        Some(tdm)
    }

    pub fn spec(&self) -> &'a PatternSpec {
        self.spec
    }

    pub fn pattern(&self) -> PatternId {
        self.spec.id
    }

    /// Transform from the (expanded) raw grid to the aligned frame.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Dimensions of the grid the caller supplied.
    pub fn raw_dims(&self) -> (usize, usize) {
        self.raw_dims
    }

    /// Raw grid after the transform, before redundant copies are rewritten.
    pub fn aligned(&self) -> &BinaryMatrix {
        &self.aligned
    }

    /// Canonical cells the payload is read from.
    pub fn cropped(&self) -> &BinaryMatrix {
        &self.cropped
    }

    /// Aligned grid with every redundant copy rewritten from the
    /// authoritative block.
    pub fn replicated(&self) -> BinaryMatrix {
        let mut out = self.aligned.clone();
        self.spec.replicate(&mut out);
        out
    }

    /// Map an aligned-frame grid back onto the caller's raw grid.
    pub fn to_raw_frame(&self, aligned: &BinaryMatrix) -> BinaryMatrix {
        let full = self.transform.apply_inverse(aligned);
        if full.dims() == self.raw_dims {
            full
        } else {
            full.window_wrapped(0, 0, self.raw_dims.0, self.raw_dims.1)
        }
    }
}

impl PartialEq for TrackingDotMatrix<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cropped == other.cropped
    }
}

impl Eq for TrackingDotMatrix<'_> {}

impl Hash for TrackingDotMatrix<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cropped.hash(state);
    }
}

impl Serialize for TrackingDotMatrix<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("TrackingDotMatrix", 4)?;
        s.serialize_field("pattern", &self.spec.id)?;
        s.serialize_field("transform", &self.transform)?;
        s.serialize_field("aligned", &self.aligned)?;
        s.serialize_field("cropped", &self.cropped)?;
        s.end()
    }
}

/// Apply `transform`, rewrite redundant copies, crop and validate.
///
/// `raw` must have the pattern's full dimensions. Returns `None` when the
/// transform changes the grid shape, the crop's fixed counts disagree or a
/// structural group fails.
pub fn assemble<'a>(
    raw: &BinaryMatrix,
    spec: &'a PatternSpec,
    transform: Transform,
) -> Option<TrackingDotMatrix<'a>> {
    if raw.dims() != spec.dims() || !transform.preserves_dims(raw.dims()) {
        return None;
    }
    let aligned = transform.apply(raw);
    let mut replicated = aligned.clone();
    spec.replicate(&mut replicated);

    let Some(cropped) = spec.crop(&replicated) else {
        debug!("{}: {:?} fails the crop counts", spec.id, transform);
        return None;
    };
    if !spec.validate(&cropped) {
        debug!("{}: {:?} fails validation", spec.id, transform);
        return None;
    }

    Some(TrackingDotMatrix {
        spec,
        transform,
        raw_dims: raw.dims(),
        aligned,
        cropped,
    })
}

/// Search, assemble and deduplicate every validated matrix for `spec`.
///
/// Accepts prototype-sized windows as well as full tiles. Matrices with
/// identical cropped cells collapse to the first one found.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(raw, spec), fields(pattern = %spec.id))
)]
pub fn assemble_all<'a>(raw: &BinaryMatrix, spec: &'a PatternSpec) -> Vec<TrackingDotMatrix<'a>> {
    let Some(full) = spec.expand_window(raw) else {
        return Vec::new();
    };
    let candidates = align_candidates(&full, spec);
    assemble_candidates(raw.dims(), &full, spec, &candidates)
}

/// Assemble each candidate on an expanded grid, keeping the first matrix of
/// every distinct cropped content.
pub(crate) fn assemble_candidates<'a>(
    raw_dims: (usize, usize),
    full: &BinaryMatrix,
    spec: &'a PatternSpec,
    candidates: &[Transform],
) -> Vec<TrackingDotMatrix<'a>> {
    let mut out: Vec<TrackingDotMatrix<'a>> = Vec::new();
    for &t in candidates {
        let Some(mut tdm) = assemble(full, spec, t) else {
            continue;
        };
        if out.contains(&tdm) {
            continue;
        }
        tdm.raw_dims = raw_dims;
        out.push(tdm);
    }
    debug!("{}: {} validated matrix(es)", spec.id, out.len());
    out
}
