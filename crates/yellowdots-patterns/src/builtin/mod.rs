//! Built-in encoding families.

mod pattern1;
mod pattern2;
mod pattern3;

use crate::PatternSpec;

/// Fresh definitions of every built-in pattern, in identifier order.
pub fn all() -> Vec<PatternSpec> {
    vec![pattern1::spec(), pattern2::spec(), pattern3::spec()]
}
