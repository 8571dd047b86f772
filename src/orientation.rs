//! Three-letter anatomical orientation codes and the image geometry built from them.
//!
//! A code such as `"RAI"` names, for each of the three axes of a frame, the
//! anatomical direction the axis runs towards: Right/Left, Anterior/Posterior,
//! Inferior/Superior. Codes are user input, so parsing is fallible; the
//! resulting [`CoordinateTransform`]s are always valid.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::transform::CoordinateTransform;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrientationError {
    #[error("Orientation code {0:?} must have exactly three letters")]
    InvalidLength(String),

    #[error("Orientation code {code:?} has unknown letter {letter:?}")]
    UnknownLetter { code: String, letter: char },

    #[error("Orientation code {code:?} uses the {axis} axis more than once")]
    RepeatedAxis { code: String, axis: &'static str },
}

/// A validated orientation code, stored upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrientationCode {
    letters: [char; 3],
    mapping: [i32; 3],
}

impl OrientationCode {
    pub fn parse(code: &str) -> Result<Self, OrientationError> {
        let letters: Vec<char> = code.trim().chars().map(|c| c.to_ascii_uppercase()).collect();
        if letters.len() != 3 {
            return Err(OrientationError::InvalidLength(code.to_string()));
        }

        let mut mapping = [0i32; 3];
        let mut seen = [false; 3];
        for (i, &letter) in letters.iter().enumerate() {
            let signed_axis: i32 = match letter {
                'R' => 1,
                'L' => -1,
                'A' => 2,
                'P' => -2,
                'I' => 3,
                'S' => -3,
                _ => {
                    return Err(OrientationError::UnknownLetter {
                        code: code.to_string(),
                        letter,
                    });
                }
            };
            let axis = signed_axis.unsigned_abs() as usize - 1;
            if seen[axis] {
                return Err(OrientationError::RepeatedAxis {
                    code: code.to_string(),
                    axis: ["R-L", "A-P", "I-S"][axis],
                });
            }
            seen[axis] = true;
            mapping[i] = signed_axis;
        }

        Ok(Self {
            letters: [letters[0], letters[1], letters[2]],
            mapping,
        })
    }

    /// Signed anatomical axis (1 = R/L, 2 = A/P, 3 = I/S) of each frame axis.
    pub fn mapping(&self) -> [i32; 3] {
        self.mapping
    }

    /// The transform whose mapping is this code's signed anatomical axes,
    /// i.e. `RAI` gives `(1, 2, 3)` and `LPS` gives `(-1, -2, -3)`.
    ///
    /// Each entry names the anatomy axis a frame axis is read from, so the
    /// result maps anatomy coordinates into the frame described by the code.
    pub fn to_transform(&self) -> CoordinateTransform {
        CoordinateTransform::from_mapping(self.mapping)
    }
}

impl FromStr for OrientationCode {
    type Err = OrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OrientationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for letter in self.letters {
            write!(f, "{letter}")?;
        }
        Ok(())
    }
}

/// How image space relates to anatomy, and how each of the three display
/// frames relates to anatomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageGeometry {
    image_code: OrientationCode,
    display_codes: [OrientationCode; 3],
    image_to_anatomy: CoordinateTransform,
    display_to_anatomy: [CoordinateTransform; 3],
    image_to_display: [CoordinateTransform; 3],
}

/// Display codes giving upright views: each slice has R-L or A-P across its
/// width and I-S down its height (axial: R-L across, A-P down).
pub const DEFAULT_DISPLAY_CODES: [&str; 3] = ["RAI", "IAR", "RAI"];

const RAI: OrientationCode = OrientationCode {
    letters: ['R', 'A', 'I'],
    mapping: [1, 2, 3],
};

const IAR: OrientationCode = OrientationCode {
    letters: ['I', 'A', 'R'],
    mapping: [3, 2, 1],
};

impl Default for ImageGeometry {
    /// An `RAI` image shown through [`DEFAULT_DISPLAY_CODES`].
    fn default() -> Self {
        Self::new(RAI, [RAI, IAR, RAI])
    }
}

impl ImageGeometry {
    pub fn new(image_code: OrientationCode, display_codes: [OrientationCode; 3]) -> Self {
        let image_to_anatomy = image_code.to_transform().inverse();
        let display_to_anatomy = display_codes.map(|code| code.to_transform().inverse());
        let image_to_display =
            display_to_anatomy.map(|display| display.inverse().product(&image_to_anatomy));

        Self {
            image_code,
            display_codes,
            image_to_anatomy,
            display_to_anatomy,
            image_to_display,
        }
    }

    /// Parse an image code and three display codes.
    pub fn from_codes(image_code: &str, display_codes: [&str; 3]) -> Result<Self, OrientationError> {
        let image_code = OrientationCode::parse(image_code)?;
        let display_codes = [
            OrientationCode::parse(display_codes[0])?,
            OrientationCode::parse(display_codes[1])?,
            OrientationCode::parse(display_codes[2])?,
        ];
        Ok(Self::new(image_code, display_codes))
    }

    /// Geometry with one display frame shared by all three display axes.
    pub fn with_shared_display(
        image_code: OrientationCode,
        display_code: OrientationCode,
    ) -> Self {
        Self::new(image_code, [display_code; 3])
    }

    pub fn image_code(&self) -> OrientationCode {
        self.image_code
    }

    pub fn display_code(&self, axis: usize) -> OrientationCode {
        self.display_codes[axis]
    }

    pub fn image_to_anatomy(&self) -> CoordinateTransform {
        self.image_to_anatomy
    }

    pub fn display_to_anatomy(&self, axis: usize) -> CoordinateTransform {
        self.display_to_anatomy[axis]
    }

    pub fn image_to_display(&self, axis: usize) -> CoordinateTransform {
        self.image_to_display[axis]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_codes() {
        assert_eq!(OrientationCode::parse("RAI").unwrap().mapping(), [1, 2, 3]);
        assert_eq!(OrientationCode::parse("LPI").unwrap().mapping(), [-1, -2, 3]);
        assert_eq!(OrientationCode::parse("lps").unwrap().mapping(), [-1, -2, -3]);
        assert_eq!(OrientationCode::parse("ASL").unwrap().mapping(), [2, -3, -1]);
    }

    #[test]
    fn test_parse_rejects_bad_codes() {
        assert_eq!(
            OrientationCode::parse("RA"),
            Err(OrientationError::InvalidLength("RA".to_string()))
        );
        assert!(matches!(
            OrientationCode::parse("RAX"),
            Err(OrientationError::UnknownLetter { letter: 'X', .. })
        ));
        assert!(matches!(
            OrientationCode::parse("RLI"),
            Err(OrientationError::RepeatedAxis { axis: "R-L", .. })
        ));
    }

    #[test]
    fn test_display_round_trips_case() {
        let code: OrientationCode = "rpi".parse().unwrap();
        assert_eq!(code.to_string(), "RPI");
    }

    #[test]
    fn test_same_image_and_display_code_is_identity() {
        let geometry = ImageGeometry::from_codes("ASL", ["ASL"; 3]).unwrap();
        for axis in 0..3 {
            assert_eq!(geometry.image_to_display(axis), CoordinateTransform::identity());
        }
    }

    #[test]
    fn test_flipped_display_negates_every_axis() {
        let geometry = ImageGeometry::from_codes("RAI", ["LPS"; 3]).unwrap();
        assert_eq!(geometry.image_to_display(0).mapping(), [-1, -2, -3]);
    }

    #[test]
    fn test_image_to_display_composes_through_anatomy() {
        let geometry = ImageGeometry::from_codes("PIR", ["RAI", "AIL", "RIP"]).unwrap();
        let v = [1, 2, 3];
        for axis in 0..3 {
            let through_anatomy = geometry
                .display_to_anatomy(axis)
                .inverse()
                .apply(geometry.image_to_anatomy().apply(v));
            assert_eq!(geometry.image_to_display(axis).apply(v), through_anatomy);
        }
    }

    #[test]
    fn test_default_geometry() {
        let geometry = ImageGeometry::default();
        assert_eq!(geometry.image_code().to_string(), "RAI");
        assert_eq!(geometry.image_to_display(0), CoordinateTransform::identity());
        assert_eq!(geometry.image_to_display(1), CoordinateTransform::new(3, 2, 1));
        assert_eq!(geometry.image_to_display(2), CoordinateTransform::identity());
    }

    #[test]
    fn test_default_geometry_matches_default_codes() {
        let [sagittal, coronal, axial] = DEFAULT_DISPLAY_CODES;
        assert_eq!(
            ImageGeometry::default(),
            ImageGeometry::from_codes("RAI", [sagittal, coronal, axial]).unwrap()
        );
    }
}
