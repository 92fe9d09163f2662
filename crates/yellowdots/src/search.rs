//! Alignment search: every orientation and toroidal offset that places a
//! pattern's reference cells correctly.

use log::{debug, trace};

use crate::core::{BinaryMatrix, Transform};
use crate::patterns::PatternSpec;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Candidate transforms mapping `raw` onto `spec`'s aligned frame.
///
/// `raw` must already have the pattern's full dimensions (see
/// [`PatternSpec::expand_window`]). Each returned transform `t` satisfies the
/// reference-cell predicates of one alignment variant on `t.apply(raw)`.
/// Orientations rejected by the pattern's pre-filter are never rolled.
/// The result keeps discovery order and holds no duplicates; it may be empty,
/// or hold several entries when the grid is ambiguous.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(raw, spec), fields(pattern = %spec.id))
)]
pub fn align_candidates(raw: &BinaryMatrix, spec: &PatternSpec) -> Vec<Transform> {
    let mut out: Vec<Transform> = Vec::new();
    if raw.dims() != spec.dims() {
        debug!(
            "{}: grid {:?} does not match pattern dims {:?}",
            spec.id,
            raw.dims(),
            spec.dims()
        );
        return out;
    }

    for variant in &spec.variants {
        for rotation in variant.rotations() {
            if rotation % 2 == 1 && !raw.is_square() {
                continue;
            }
            for &flip in variant.flips() {
                let oriented = Transform::new(rotation, flip, 0, 0).apply(raw);
                if !spec.passes_prefilter(&oriented) {
                    debug!(
                        "{}: rotation {} flip {} rejected by pre-filter",
                        spec.id, rotation, flip
                    );
                    continue;
                }
                for ry in 0..oriented.rows() {
                    for rx in 0..oriented.cols() {
                        if !variant.holds_at(&oriented, rx, ry) {
                            continue;
                        }
                        let t = Transform::new(rotation, flip, -(rx as isize), -(ry as isize));
                        if !out.contains(&t) {
                            trace!("{}: candidate {:?}", spec.id, t);
                            out.push(t);
                        }
                    }
                }
            }
        }
    }

    debug!("{}: {} candidate transform(s)", spec.id, out.len());
    out
}
