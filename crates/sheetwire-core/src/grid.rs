//! Zero-based, end-exclusive grid ranges as used on the wire

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::a1::{CellRef, RangeShape, TextRange};
use crate::error::{Error, Result};

const START_ROW: &str = "startRowIndex";
const END_ROW: &str = "endRowIndex";
const START_COL: &str = "startColumnIndex";
const END_COL: &str = "endColumnIndex";
const SHEET_ID: &str = "sheetId";

/// A rectangular block of cells in wire coordinates.
///
/// All indices are 0-based; `end_*` is exclusive. A valid range has
/// `start_row < end_row` and `start_col < end_col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridRange {
    /// Tab the range is scoped to; `None` means not yet sheet-scoped
    #[serde(rename = "sheetId", default, skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<i64>,
    #[serde(rename = "startRowIndex")]
    pub start_row: u32,
    #[serde(rename = "endRowIndex")]
    pub end_row: u32,
    #[serde(rename = "startColumnIndex")]
    pub start_col: u32,
    #[serde(rename = "endColumnIndex")]
    pub end_col: u32,
}

impl GridRange {
    /// Create an unscoped grid range
    pub fn new(start_row: u32, end_row: u32, start_col: u32, end_col: u32) -> Self {
        Self {
            sheet_id: None,
            start_row,
            end_row,
            start_col,
            end_col,
        }
    }

    /// Scope this range to a tab
    pub fn with_sheet_id(mut self, sheet_id: i64) -> Self {
        self.sheet_id = Some(sheet_id);
        self
    }

    /// Check the bounds are non-empty on both axes
    pub fn validate(&self) -> Result<()> {
        if self.start_row >= self.end_row {
            return Err(Error::InvalidGridRange(format!(
                "start row index {} must be below end row index {}",
                self.start_row, self.end_row
            )));
        }
        if self.start_col >= self.end_col {
            return Err(Error::InvalidGridRange(format!(
                "start column index {} must be below end column index {}",
                self.start_col, self.end_col
            )));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Number of rows covered
    pub fn row_count(&self) -> u32 {
        self.end_row.saturating_sub(self.start_row)
    }

    /// Number of columns covered
    pub fn col_count(&self) -> u32 {
        self.end_col.saturating_sub(self.start_col)
    }

    /// Convert back to an inclusive rectangle in text coordinates.
    pub fn to_text_range(&self) -> Result<TextRange> {
        self.validate()?;
        Ok(TextRange::new(RangeShape::Rect {
            start: CellRef::new(self.start_row, self.start_col),
            end: CellRef::new(self.end_row - 1, self.end_col - 1),
        }))
    }

    /// Build a grid range from a raw JSON object after checking it with
    /// [`validate_grid_range`]'s rules.
    pub fn from_json(value: &Value, expect_sheet_scope: bool) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::InvalidGridRange("grid range is not an object".into()))?;

        let mut expected: BTreeSet<&str> = [START_ROW, END_ROW, START_COL, END_COL].into();
        if expect_sheet_scope {
            expected.insert(SHEET_ID);
        }
        let actual: BTreeSet<&str> = object.keys().map(String::as_str).collect();
        if actual != expected {
            return Err(Error::InvalidGridRange(format!(
                "unexpected fields: expected {:?}, got {:?}",
                expected, actual
            )));
        }

        let index = |key: &str| -> Result<u32> {
            object
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    Error::InvalidGridRange(format!(
                        "{} must be a non-negative integer, got {}",
                        key, object[key]
                    ))
                })
        };

        let sheet_id = match object.get(SHEET_ID) {
            Some(id) => Some(id.as_i64().ok_or_else(|| {
                Error::InvalidGridRange(format!("sheetId must be an integer, got {}", id))
            })?),
            None => None,
        };

        let grid = GridRange {
            sheet_id,
            start_row: index(START_ROW)?,
            end_row: index(END_ROW)?,
            start_col: index(START_COL)?,
            end_col: index(END_COL)?,
        };
        grid.validate()?;
        Ok(grid)
    }
}

/// Validate a raw JSON grid range object.
///
/// The key set must be exactly the four index fields, plus `sheetId` when
/// `expect_sheet_scope` is set. Every index must be a non-negative integer and
/// both axes must be non-empty.
pub fn validate_grid_range(value: &Value, expect_sheet_scope: bool) -> bool {
    match GridRange::from_json(value, expect_sheet_scope) {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("rejected grid range {value}: {e}");
            false
        }
    }
}
