//! Durable store wire format
//!
//! Four independently serialized per-cell arrays. Only `Width` and `Height`
//! carry information the codec relies on; `Top` and `Left` are written for
//! consumers that want them and ignored on read, since legacy records leave
//! them blank or inconsistent.

use panelgrid_topology::Rect;
use serde::{Deserialize, Serialize};

/// Separator between per-cell entries
pub const RAW_DELIMITER: char = ',';

/// Per-cell percentage arrays as stored remotely
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawPositionRecord {
    /// Top edges
    #[serde(default)]
    pub top: String,
    /// Left edges
    #[serde(default)]
    pub left: String,
    /// Widths
    #[serde(default)]
    pub width: String,
    /// Heights
    #[serde(default)]
    pub height: String,
}

fn join(values: impl Iterator<Item = f64>) -> String {
    values
        .map(|v| format!("{v:.2}"))
        .collect::<Vec<_>>()
        .join(&RAW_DELIMITER.to_string())
}

/// Parse one array; blank input is an empty list
fn parse(field: &str) -> Result<Vec<f64>, String> {
    if field.trim().is_empty() {
        return Ok(Vec::new());
    }
    field
        .split(RAW_DELIMITER)
        .map(|part| {
            let part = part.trim().trim_end_matches('%');
            part.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("unparsable entry '{part}'"))
        })
        .collect()
}

impl RawPositionRecord {
    /// Serialize cell rectangles in structural order
    #[must_use]
    pub fn from_rects(rects: &[Rect]) -> Self {
        Self {
            top: join(rects.iter().map(|r| r.top)),
            left: join(rects.iter().map(|r| r.left)),
            width: join(rects.iter().map(|r| r.width)),
            height: join(rects.iter().map(|r| r.height)),
        }
    }

    /// Parsed `Width` array
    ///
    /// # Errors
    /// Returns a description of the first unparsable entry
    pub fn widths(&self) -> Result<Vec<f64>, String> {
        parse(&self.width)
    }

    /// Parsed `Height` array
    ///
    /// # Errors
    /// Returns a description of the first unparsable entry
    pub fn heights(&self) -> Result<Vec<f64>, String> {
        parse(&self.height)
    }

    /// Both size arrays are blank
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.width.trim().is_empty() && self.height.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rects_formats_two_decimals() {
        let raw = RawPositionRecord::from_rects(&[
            Rect::new(0.0, 0.0, 70.0, 100.0),
            Rect::new(0.0, 70.0, 30.0, 100.0),
        ]);
        assert_eq!(raw.top, "0.00,0.00");
        assert_eq!(raw.left, "0.00,70.00");
        assert_eq!(raw.width, "70.00,30.00");
        assert_eq!(raw.height, "100.00,100.00");
    }

    #[test]
    fn parse_tolerates_spaces_and_percent_signs() {
        let raw = RawPositionRecord {
            width: " 62% , 38 ".to_string(),
            ..Default::default()
        };
        assert_eq!(raw.widths().unwrap(), vec![62.0, 38.0]);
        assert!(raw.heights().unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_garbage() {
        let raw = RawPositionRecord {
            width: "50,,50".to_string(),
            height: "NaN,1".to_string(),
            ..Default::default()
        };
        assert!(raw.widths().is_err());
        assert!(raw.heights().is_err());
    }

    #[test]
    fn wire_field_names_are_pascal_case() {
        let raw = RawPositionRecord::from_rects(&[Rect::new(0.0, 0.0, 100.0, 100.0)]);
        let json = serde_json::to_value(&raw).unwrap();
        assert_eq!(json["Width"], "100.00");
        let legacy: RawPositionRecord =
            serde_json::from_str(r#"{"Width":"50,50","Height":"100,100"}"#).unwrap();
        assert!(legacy.top.is_empty());
        assert!(!legacy.is_blank());
    }
}
