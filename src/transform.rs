//! Signed axis permutations between image, display and anatomy space.
//!
//! A [`CoordinateTransform`] only reorders and flips axes. It is stored as three
//! 1-based signed axis indices: entry `i` names the source axis (and its
//! direction) that target axis `i` is read from. For example `[-2, 1, 3]` maps
//! `(x, y, z)` to `(-y, x, z)`.

use std::fmt;

/// A signed permutation of the three coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateTransform {
    mapping: [i32; 3],
    matrix: [[i32; 3]; 3],
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl CoordinateTransform {
    /// Create a transform from 1-based signed axis indices.
    ///
    /// # Panics
    ///
    /// Panics if an entry is zero, has magnitude above 3, or if two entries
    /// name the same source axis.
    pub fn new(map_x: i32, map_y: i32, map_z: i32) -> Self {
        let mapping = [map_x, map_y, map_z];
        for value in mapping {
            assert!(
                value != 0 && value.abs() <= 3,
                "invalid axis mapping {value} in {mapping:?}"
            );
        }
        assert!(
            mapping[0].abs() != mapping[1].abs()
                && mapping[0].abs() != mapping[2].abs()
                && mapping[1].abs() != mapping[2].abs(),
            "axis mapping {mapping:?} is not a permutation"
        );

        let mut matrix = [[0; 3]; 3];
        for (row, &value) in mapping.iter().enumerate() {
            matrix[row][(value.abs() - 1) as usize] = value.signum();
        }

        Self { mapping, matrix }
    }

    /// Create a transform from a mapping array, see [`CoordinateTransform::new`].
    pub fn from_mapping(mapping: [i32; 3]) -> Self {
        Self::new(mapping[0], mapping[1], mapping[2])
    }

    pub fn identity() -> Self {
        Self::new(1, 2, 3)
    }

    /// The signed 1-based mapping this transform was built from.
    pub fn mapping(&self) -> [i32; 3] {
        self.mapping
    }

    /// The signed permutation matrix, one `±1` entry per row.
    pub fn matrix(&self) -> [[i32; 3]; 3] {
        self.matrix
    }

    /// The transform `T⁻¹` with `T.apply(T⁻¹.apply(v)) == v`.
    pub fn inverse(&self) -> Self {
        let mut mapping = [0; 3];
        for (target, &value) in self.mapping.iter().enumerate() {
            let source = (value.abs() - 1) as usize;
            mapping[source] = value.signum() * (target as i32 + 1);
        }
        Self::from_mapping(mapping)
    }

    /// The composition `self ∘ other`: apply `other` first, then `self`.
    pub fn product(&self, other: &CoordinateTransform) -> Self {
        let mut mapping = [0; 3];
        for (target, &value) in self.mapping.iter().enumerate() {
            let source = (value.abs() - 1) as usize;
            mapping[target] = value.signum() * other.mapping[source];
        }
        Self::from_mapping(mapping)
    }

    /// Apply to an integer vector. Exact, since the transform maps integers to integers.
    pub fn apply(&self, v: [i32; 3]) -> [i32; 3] {
        let mut out = [0; 3];
        for (target, row) in self.matrix.iter().enumerate() {
            out[target] = row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
        }
        out
    }

    pub fn apply_f32(&self, v: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0; 3];
        for (target, &value) in self.mapping.iter().enumerate() {
            let component = v[(value.abs() - 1) as usize];
            out[target] = if value < 0 { -component } else { component };
        }
        out
    }

    /// Zero-based source axis that target axis `c` is read from.
    pub fn coordinate_index_zero_based(&self, c: usize) -> usize {
        (self.mapping[c].abs() - 1) as usize
    }

    /// Direction of target axis `c` relative to its source axis: `1` or `-1`.
    pub fn coordinate_orientation(&self, c: usize) -> i32 {
        if self.mapping[c] < 0 { -1 } else { 1 }
    }
}

impl fmt::Display for CoordinateTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.mapping[0], self.mapping[1], self.mapping[2]
        )
    }
}
