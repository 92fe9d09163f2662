//! Grid transforms: mirror, quarter-turn rotation and toroidal roll.

use serde::{Deserialize, Serialize};

use crate::BinaryMatrix;

/// A rigid transform of a periodic dot grid.
///
/// Application order is fixed: flip, then rotate counter-clockwise by
/// `rotation` quarter turns, then roll by `(roll_y, roll_x)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transform {
    /// Counter-clockwise quarter turns, always in `0..4`.
    pub rotation: u8,
    /// Mirror columns before rotating.
    pub flip: bool,
    /// Column shift applied last.
    pub roll_x: isize,
    /// Row shift applied last.
    pub roll_y: isize,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        rotation: 0,
        flip: false,
        roll_x: 0,
        roll_y: 0,
    };

    pub fn new(rotation: u8, flip: bool, roll_x: isize, roll_y: isize) -> Self {
        Self {
            rotation: rotation % 4,
            flip,
            roll_x,
            roll_y,
        }
    }

    /// Dimensions of `apply(m)` for an input of `dims`.
    pub fn output_dims(&self, dims: (usize, usize)) -> (usize, usize) {
        if self.rotation % 2 == 1 {
            (dims.1, dims.0)
        } else {
            dims
        }
    }

    /// True when the transform keeps a grid of `dims` at the same shape.
    pub fn preserves_dims(&self, dims: (usize, usize)) -> bool {
        self.output_dims(dims) == dims
    }

    /// Forward application: flip, rotate, roll.
    pub fn apply(&self, m: &BinaryMatrix) -> BinaryMatrix {
        let oriented = if self.flip { m.flipped() } else { m.clone() };
        oriented
            .rotated(self.rotation)
            .rolled(self.roll_y, self.roll_x)
    }

    /// Undo [`Transform::apply`]: roll back, rotate the rest of the way, un-flip.
    pub fn apply_inverse(&self, m: &BinaryMatrix) -> BinaryMatrix {
        let unrolled = m
            .rolled(-self.roll_y, -self.roll_x)
            .rotated((4 - self.rotation % 4) % 4);
        if self.flip {
            unrolled.flipped()
        } else {
            unrolled
        }
    }

    /// Same transform with the roll reduced into `0..rows` / `0..cols` of the
    /// output grid of an input of `dims`.
    pub fn normalized(&self, dims: (usize, usize)) -> Self {
        let (rows, cols) = self.output_dims(dims);
        Self {
            rotation: self.rotation % 4,
            flip: self.flip,
            roll_x: self.roll_x.rem_euclid(cols as isize),
            roll_y: self.roll_y.rem_euclid(rows as isize),
        }
    }
}
