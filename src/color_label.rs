//! Segmentation label descriptors and the 256-entry label table.
//!
//! Label descriptions can be exchanged as plain text, one label per line:
//!
//! ```text
//! # IDX   -R-  -G-  -B-  -A--  VIS MSH  LABEL
//!     1   255    0    0  1.00  1   1    "Liver"
//! ```
//!
//! Alpha is written as a fraction in `[0, 1]`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::info;
use thiserror::Error;

use crate::volume::Volume;

/// Number of entries in a label table, one per `u8` label value.
pub const MAX_COLOR_LABELS: usize = 256;

/// Label 0 marks unlabeled voxels.
pub const CLEAR_LABEL: u8 = 0;

#[derive(Debug, Error)]
pub enum LabelFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed label description on line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },

    #[error("Label index {index} on line {line} is outside 0..=255")]
    IndexOutOfRange { line: usize, index: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorLabel {
    rgb: [u8; 3],
    alpha: u8,
    visible: bool,
    valid: bool,
    mesh: bool,
    name: String,
}

impl Default for ColorLabel {
    fn default() -> Self {
        Self {
            rgb: [0; 3],
            alpha: 255,
            visible: true,
            valid: false,
            mesh: true,
            name: String::new(),
        }
    }
}

impl ColorLabel {
    pub fn new(name: impl Into<String>, rgb: [u8; 3], alpha: u8) -> Self {
        Self {
            rgb,
            alpha,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        self.rgb
    }

    pub fn set_rgb(&mut self, rgb: [u8; 3]) {
        self.rgb = rgb;
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha;
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha == 255
    }

    pub fn rgba(&self) -> [u8; 4] {
        [self.rgb[0], self.rgb[1], self.rgb[2], self.alpha]
    }

    pub fn set_rgba(&mut self, rgba: [u8; 4]) {
        self.rgb = [rgba[0], rgba[1], rgba[2]];
        self.alpha = rgba[3];
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    /// Whether a surface mesh is generated for this label.
    pub fn has_mesh(&self) -> bool {
        self.mesh
    }

    pub fn set_mesh(&mut self, mesh: bool) {
        self.mesh = mesh;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The colour used when drawing this label: transparent when hidden.
    pub fn display_rgba(&self) -> [u8; 4] {
        let alpha = if !self.visible {
            0
        } else if self.is_opaque() {
            255
        } else {
            self.alpha
        };
        [self.rgb[0], self.rgb[1], self.rgb[2], alpha]
    }
}

/// Descriptors for every `u8` label value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorLabelTable {
    labels: Vec<ColorLabel>,
}

impl Default for ColorLabelTable {
    fn default() -> Self {
        build_default_palette()
    }
}

/// The default palette: a clear label 0, six primary and secondary colours,
/// then three colour ramps filling the remaining entries. Labels 0-6 start
/// out valid.
pub fn build_default_palette() -> ColorLabelTable {
    const PRIMARY: [[u8; 3]; 6] = [
        [255, 0, 0],
        [0, 255, 0],
        [0, 0, 255],
        [255, 255, 0],
        [0, 255, 255],
        [255, 0, 255],
    ];
    let ramp = |numerator: f64| (numerator / 85.0 * 200.0 + 50.0) as u8;

    let mut labels = Vec::with_capacity(MAX_COLOR_LABELS);
    labels.push(ColorLabel {
        rgb: [0; 3],
        alpha: 0,
        visible: false,
        valid: true,
        mesh: false,
        name: "Clear".to_string(),
    });

    for i in 1..MAX_COLOR_LABELS {
        let rgb = if i <= PRIMARY.len() {
            PRIMARY[i - 1]
        } else {
            let f = i as f64;
            if i < 85 {
                [ramp(84.0 - f), ramp(f), 0]
            } else if i < 170 {
                [0, ramp(169.0 - f), ramp(f - 85.0)]
            } else {
                [ramp(f - 170.0), 0, ramp(255.0 - f)]
            }
        };
        labels.push(ColorLabel {
            rgb,
            alpha: 255,
            visible: true,
            valid: i <= PRIMARY.len(),
            mesh: true,
            name: format!("Label{i}"),
        });
    }

    ColorLabelTable { labels }
}

impl ColorLabelTable {
    pub fn get(&self, label: u8) -> &ColorLabel {
        &self.labels[label as usize]
    }

    pub fn get_mut(&mut self, label: u8) -> &mut ColorLabel {
        &mut self.labels[label as usize]
    }

    pub fn set(&mut self, label: u8, color_label: ColorLabel) {
        self.labels[label as usize] = color_label;
    }

    pub fn valid_count(&self) -> usize {
        self.labels.iter().filter(|label| label.valid).count()
    }

    /// Mark `label` as in use. Returns `true` if it was not valid before.
    pub fn mark_valid(&mut self, label: u8) -> bool {
        let entry = self.get_mut(label);
        let changed = !entry.valid;
        entry.valid = true;
        changed
    }

    /// Mark every label present in `volume` as valid. Returns how many changed.
    pub fn mark_valid_from_volume(&mut self, volume: &Volume<u8>) -> usize {
        let mut present = [false; MAX_COLOR_LABELS];
        for &value in volume.data().iter() {
            present[value as usize] = true;
        }
        present
            .iter()
            .enumerate()
            .filter(|&(label, &seen)| seen && self.mark_valid(label as u8))
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &ColorLabel)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(label, entry)| (label as u8, entry))
    }

    pub fn valid_labels(&self) -> impl Iterator<Item = (u8, &ColorLabel)> {
        self.iter().filter(|(_, entry)| entry.valid)
    }

    /// Merge label descriptions from a text file.
    pub fn load_label_descriptions(&mut self, path: impl AsRef<Path>) -> Result<usize, LabelFileError> {
        let file = File::open(path.as_ref())?;
        let count = self.read_label_descriptions(BufReader::new(file))?;
        info!("Read {count} label descriptions from {}", path.as_ref().display());
        Ok(count)
    }

    pub fn save_label_descriptions(&self, path: impl AsRef<Path>) -> Result<(), LabelFileError> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.write_label_descriptions(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Merge label descriptions into the table. Every described label becomes
    /// valid. Returns the number of labels read.
    pub fn read_label_descriptions(&mut self, reader: impl BufRead) -> Result<usize, LabelFileError> {
        let mut count = 0;
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (index, entry) = parse_label_line(trimmed, number + 1)?;
            self.labels[index as usize] = entry;
            count += 1;
        }
        Ok(count)
    }

    /// Write every valid label, repeating the header every 24 entries.
    pub fn write_label_descriptions(&self, mut writer: impl Write) -> Result<(), LabelFileError> {
        for (written, (index, entry)) in self.valid_labels().enumerate() {
            if written % 24 == 0 {
                writeln!(writer, "# IDX   -R-  -G-  -B-  -A--  VIS MSH  LABEL")?;
            }
            writeln!(
                writer,
                "  {:3}   {:3}  {:3}  {:3}  {:4.2}  {:1}   {:1}    \"{}\"",
                index,
                entry.rgb[0],
                entry.rgb[1],
                entry.rgb[2],
                entry.alpha as f32 / 255.0,
                entry.visible as u8,
                entry.mesh as u8,
                entry.name
            )?;
        }
        Ok(())
    }
}

fn parse_label_line(line: &str, number: usize) -> Result<(u8, ColorLabel), LabelFileError> {
    let malformed = || LabelFileError::MalformedLine {
        line: number,
        content: line.to_string(),
    };

    let (fields, rest) = line.split_once('"').ok_or_else(malformed)?;
    let name = rest.split('"').next().unwrap_or_default();
    let fields: Vec<&str> = fields.split_whitespace().collect();
    if fields.len() != 7 {
        return Err(malformed());
    }

    let integer = |field: &str| field.parse::<i64>().map_err(|_| malformed());
    let index = integer(fields[0])?;
    let index = u8::try_from(index).map_err(|_| LabelFileError::IndexOutOfRange { line: number, index })?;
    let channel = |field: &str| integer(field).map(|value| value.clamp(0, 255) as u8);
    let alpha: f32 = fields[4].parse().map_err(|_| malformed())?;

    let entry = ColorLabel {
        rgb: [channel(fields[1])?, channel(fields[2])?, channel(fields[3])?],
        alpha: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
        visible: integer(fields[5])? != 0,
        valid: true,
        mesh: integer(fields[6])? != 0,
        name: name.to_string(),
    };
    Ok((index, entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_default_palette_layout() {
        let table = build_default_palette();
        let clear = table.get(CLEAR_LABEL);
        assert_eq!(clear.name(), "Clear");
        assert!(clear.is_valid());
        assert!(!clear.is_visible());
        assert_eq!(clear.display_rgba(), [0, 0, 0, 0]);

        assert_eq!(table.get(1).rgb(), [255, 0, 0]);
        assert_eq!(table.get(6).rgb(), [255, 0, 255]);
        assert_eq!(table.get(7).rgb(), [ramp_value(77.0), ramp_value(7.0), 0]);
        assert_eq!(table.get(100).rgb(), [0, ramp_value(69.0), ramp_value(15.0)]);
        assert_eq!(table.get(255).rgb(), [ramp_value(85.0), 0, ramp_value(0.0)]);
        assert_eq!(table.get(42).name(), "Label42");
        assert_eq!(table.valid_count(), 7);
    }

    fn ramp_value(numerator: f64) -> u8 {
        (numerator / 85.0 * 200.0 + 50.0) as u8
    }

    #[test]
    fn test_display_alpha_rules() {
        let mut label = ColorLabel::new("Vessel", [10, 20, 30], 128);
        assert_eq!(label.display_rgba(), [10, 20, 30, 128]);
        label.set_alpha(255);
        assert_eq!(label.display_rgba(), [10, 20, 30, 255]);
        label.set_visible(false);
        assert_eq!(label.display_rgba(), [10, 20, 30, 0]);
    }

    #[test]
    fn test_mark_valid_reports_changes() {
        let mut table = build_default_palette();
        assert!(!table.get(9).is_valid());
        assert!(table.mark_valid(9));
        assert!(!table.mark_valid(9));
        assert_eq!(table.valid_count(), 8);
    }

    #[test]
    fn test_mark_valid_from_volume() {
        let mut table = build_default_palette();
        let data = Array3::from_shape_vec((2, 2, 1), vec![0u8, 1, 20, 20]).unwrap();
        let volume = Volume::new(data, [1.0; 3], [0.0; 3]);
        assert_eq!(table.mark_valid_from_volume(&volume), 1);
        assert!(table.get(20).is_valid());
    }

    #[test]
    fn test_read_label_descriptions() {
        let text = "\
# IDX   -R-  -G-  -B-  -A--  VIS MSH  LABEL
    0     0    0    0  0.00  0   0    \"Clear\"

   12   200  100   50  0.50  1   0    \"Left kidney\"
";
        let mut table = build_default_palette();
        let count = table.read_label_descriptions(text.as_bytes()).unwrap();
        assert_eq!(count, 2);
        let kidney = table.get(12);
        assert_eq!(kidney.name(), "Left kidney");
        assert_eq!(kidney.rgba(), [200, 100, 50, 128]);
        assert!(kidney.is_valid());
        assert!(kidney.is_visible());
        assert!(!kidney.has_mesh());
    }

    #[test]
    fn test_read_rejects_bad_lines() {
        let mut table = build_default_palette();
        let err = table
            .read_label_descriptions("  3 1 2 \"missing fields\"\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, LabelFileError::MalformedLine { line: 1, .. }));

        let err = table
            .read_label_descriptions("# header\n 300 1 2 3 1.0 1 1 \"big\"\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, LabelFileError::IndexOutOfRange { line: 2, index: 300 }));
    }

    #[test]
    fn test_written_descriptions_read_back() {
        let mut table = build_default_palette();
        table.set(40, ColorLabel::new("Tumor", [1, 2, 3], 255));
        table.mark_valid(40);

        let mut buffer = Vec::new();
        table.write_label_descriptions(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("# IDX"));
        assert!(text.contains("\"Tumor\""));

        let mut restored = ColorLabelTable { labels: vec![ColorLabel::default(); MAX_COLOR_LABELS] };
        assert_eq!(restored.read_label_descriptions(text.as_bytes()).unwrap(), 8);
        assert_eq!(restored.get(40), table.get(40));
        assert_eq!(restored.get(3), table.get(3));
    }
}
