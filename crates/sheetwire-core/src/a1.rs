//! A1-style text ranges and column letter arithmetic
//!
//! Four textual shapes are accepted, each optionally prefixed with a tab name
//! and `!`:
//!
//! | shape        | example  |
//! |--------------|----------|
//! | single cell  | `A1`     |
//! | rectangle    | `A1:B2`  |
//! | columns only | `A:B`    |
//! | rows only    | `1:10`   |
//!
//! Internally rows and columns are 0-based and both endpoints are inclusive.
//! The only place the inclusive/exclusive boundary is crossed is
//! [`TextRange::to_grid_range_within`] and its inverse
//! [`GridRange::to_text_range`].

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::grid::GridRange;

/// Largest column count the service allows in a tab (`ZZZ`)
pub const MAX_COLUMNS: u32 = 18_278;

/// Largest row count the service allows in a tab
pub const MAX_ROWS: u32 = 10_000_000;

/// Convert column letters to a 0-based index (A = 0, Z = 25, AA = 26, etc.)
///
/// Letters are read as a bijective base-26 numeral with digits `A=1..Z=26`.
/// Lowercase input is accepted.
pub fn column_letters_to_index(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::InvalidColumn("empty column letters".into()));
    }

    let mut col: u64 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::InvalidColumn(format!(
                "invalid column letter '{}' in '{}'",
                c, letters
            )));
        }
        col = col * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);

        if col > u32::MAX as u64 + 1 {
            return Err(Error::InvalidColumn(format!(
                "column '{}' is out of range",
                letters
            )));
        }
    }

    Ok((col - 1) as u32)
}

/// Convert a 0-based column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
pub fn index_to_column_letters(index: u32) -> String {
    let mut result = String::new();
    let mut n = index as u64 + 1; // 1-based for calculation

    while n > 0 {
        n -= 1;
        let c = ((n % 26) as u8 + b'A') as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Returns true if `text` is one of the four accepted A1 shapes with its
/// endpoints in order.
pub fn validate_text_range(text: &str) -> bool {
    match TextRange::parse(text) {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("rejected text range {text:?}: {e}");
            false
        }
    }
}

/// Returns true if `text` addresses exactly one cell (e.g. `C7`, `Sheet1!C7`).
pub fn is_cell(text: &str) -> bool {
    matches!(
        TextRange::parse(text),
        Ok(TextRange {
            shape: RangeShape::Cell(_),
            ..
        })
    )
}

/// Parse `text` and convert it to a zero-based, end-exclusive grid range.
///
/// Column-only and row-only shapes span the whole of the unconstrained axis,
/// bounded by the service maximums. Use [`TextRange::to_grid_range_within`]
/// when the tab's real dimensions are known.
pub fn text_range_to_grid_range(text: &str) -> Result<GridRange> {
    TextRange::parse(text)?.to_grid_range()
}

/// Convert a grid range back to rectangle notation (`A1:E10`).
pub fn grid_range_to_text_range(grid: &GridRange) -> Result<String> {
    Ok(grid.to_text_range()?.to_a1_string())
}

/// A single cell position, 0-based on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ...)
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Format as `A1`
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", index_to_column_letters(self.col), self.row as u64 + 1)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

/// The four accepted range shapes. Endpoints are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeShape {
    /// `A1`
    Cell(CellRef),
    /// `A1:B2`
    Rect { start: CellRef, end: CellRef },
    /// `A:B`
    Columns { start: u32, end: u32 },
    /// `1:10`
    Rows { start: u32, end: u32 },
}

/// Extent of a tab, used to bound the free axis of column-only and row-only
/// ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetExtent {
    pub rows: u32,
    pub cols: u32,
}

impl SheetExtent {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }
}

impl Default for SheetExtent {
    fn default() -> Self {
        Self {
            rows: MAX_ROWS,
            cols: MAX_COLUMNS,
        }
    }
}

/// A parsed A1 range with an optional tab name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextRange {
    /// Tab name from a `Name!` prefix, unquoted
    pub sheet: Option<String>,
    pub shape: RangeShape,
}

/// One side of a `:`
enum Endpoint {
    Cell(CellRef),
    Column(u32),
    Row(u32),
}

impl TextRange {
    pub fn new(shape: RangeShape) -> Self {
        Self { sheet: None, shape }
    }

    /// Parse a range in any of the four accepted shapes.
    ///
    /// Leading and trailing whitespace is ignored; whitespace anywhere after
    /// the tab prefix is not.
    ///
    /// Reversed ranges (`B2:A1`, `Z:A`, `10:1`) are rejected rather than
    /// swapped.
    ///
    /// # Examples
    /// ```
    /// use sheetwire_core::{RangeShape, TextRange};
    ///
    /// let range = TextRange::parse("Sheet1!a1:c3").unwrap();
    /// assert_eq!(range.sheet.as_deref(), Some("Sheet1"));
    /// assert_eq!(range.to_a1_string(), "A1:C3");
    ///
    /// assert!(TextRange::parse("B2:A1").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();

        let (sheet, body) = match text.rsplit_once('!') {
            Some((sheet, body)) => (Some(unquote_sheet_name(sheet)), body),
            None => (None, text),
        };

        let upper = body.to_ascii_uppercase();
        let shape = match upper.split_once(':') {
            Some((first, second)) => {
                let first = parse_endpoint(first, text)?;
                let second = parse_endpoint(second, text)?;
                ordered_shape(first, second, text)?
            }
            None => match parse_endpoint(&upper, text)? {
                Endpoint::Cell(cell) => RangeShape::Cell(cell),
                _ => {
                    return Err(Error::InvalidRange(format!(
                        "'{}' is neither a cell nor a range",
                        text
                    )))
                }
            },
        };

        Ok(Self { sheet, shape })
    }

    /// Attach a tab name
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Drop the tab name
    pub fn without_sheet(mut self) -> Self {
        self.sheet = None;
        self
    }

    /// Whether this addresses a single cell
    pub fn is_cell(&self) -> bool {
        matches!(self.shape, RangeShape::Cell(_))
    }

    /// Grow a single-cell anchor into the rectangle needed to hold
    /// `rows` x `cols` values. Other shapes, and payloads that fit in the
    /// anchor itself (1x1 or empty), come back unchanged.
    pub fn expand_to_fit(&self, rows: u32, cols: u32) -> Self {
        match self.shape {
            RangeShape::Cell(anchor) if rows > 0 && cols > 0 && (rows, cols) != (1, 1) => Self {
                sheet: self.sheet.clone(),
                shape: RangeShape::Rect {
                    start: anchor,
                    end: CellRef::new(
                        anchor.row.saturating_add(rows - 1),
                        anchor.col.saturating_add(cols - 1),
                    ),
                },
            },
            _ => self.clone(),
        }
    }

    /// Convert to a grid range, bounding free axes by the service maximums.
    pub fn to_grid_range(&self) -> Result<GridRange> {
        self.to_grid_range_within(SheetExtent::default())
    }

    /// Convert to a zero-based, end-exclusive grid range. Column-only and
    /// row-only shapes span `0..extent` on the axis they leave open.
    pub fn to_grid_range_within(&self, extent: SheetExtent) -> Result<GridRange> {
        let exclusive = |last: u32| {
            last.checked_add(1)
                .ok_or_else(|| Error::InvalidRange(format!("'{}' exceeds the grid", self)))
        };

        let (start_row, end_row, start_col, end_col) = match self.shape {
            RangeShape::Cell(cell) => (cell.row, exclusive(cell.row)?, cell.col, exclusive(cell.col)?),
            RangeShape::Rect { start, end } => {
                (start.row, exclusive(end.row)?, start.col, exclusive(end.col)?)
            }
            RangeShape::Columns { start, end } => (0, extent.rows, start, exclusive(end)?),
            RangeShape::Rows { start, end } => (start, exclusive(end)?, 0, extent.cols),
        };

        let grid = GridRange::new(start_row, end_row, start_col, end_col);
        grid.validate()?;
        Ok(grid)
    }

    /// Format the shape in normalized (upper-case, unprefixed) form.
    pub fn to_a1_string(&self) -> String {
        match self.shape {
            RangeShape::Cell(cell) => cell.to_a1_string(),
            RangeShape::Rect { start, end } => {
                format!("{}:{}", start.to_a1_string(), end.to_a1_string())
            }
            RangeShape::Columns { start, end } => format!(
                "{}:{}",
                index_to_column_letters(start),
                index_to_column_letters(end)
            ),
            RangeShape::Rows { start, end } => {
                format!("{}:{}", start as u64 + 1, end as u64 + 1)
            }
        }
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sheet {
            Some(sheet) => write!(f, "{}!{}", quote_sheet_name(sheet), self.to_a1_string()),
            None => write!(f, "{}", self.to_a1_string()),
        }
    }
}

impl FromStr for TextRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Quote a tab name for use as an A1 prefix when it contains anything other
/// than ASCII letters, digits and underscores.
pub fn quote_sheet_name(name: &str) -> String {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

fn unquote_sheet_name(raw: &str) -> String {
    match raw
        .strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
    {
        Some(inner) => inner.replace("''", "'"),
        None => raw.to_string(),
    }
}

/// Parse `[A-Z]*[1-9][0-9]*`-ish endpoints. At least one of the letter and
/// digit parts must be present; the row part has no leading zero.
fn parse_endpoint(s: &str, original: &str) -> Result<Endpoint> {
    let bytes = s.as_bytes();

    let mut pos = 0;
    while pos < bytes.len() && bytes[pos].is_ascii_uppercase() {
        pos += 1;
    }
    let letters = &s[..pos];
    let digits = &s[pos..];

    if letters.is_empty() && digits.is_empty() {
        return Err(Error::InvalidRange(format!("empty endpoint in '{}'", original)));
    }

    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidRange(format!(
            "unexpected characters in '{}'",
            original
        )));
    }

    let row = if digits.is_empty() {
        None
    } else {
        if digits.starts_with('0') {
            return Err(Error::InvalidRange(format!(
                "row number must be >= 1 without leading zeros in '{}'",
                original
            )));
        }
        let row: u32 = digits
            .parse()
            .map_err(|_| Error::InvalidRange(format!("row number too large in '{}'", original)))?;
        // Rows are 1-based in text, 0-based internally
        Some(row - 1)
    };

    let col = if letters.is_empty() {
        None
    } else {
        Some(column_letters_to_index(letters)?)
    };

    match (col, row) {
        (Some(col), Some(row)) => Ok(Endpoint::Cell(CellRef::new(row, col))),
        (Some(col), None) => Ok(Endpoint::Column(col)),
        (None, Some(row)) => Ok(Endpoint::Row(row)),
        (None, None) => Err(Error::InvalidRange(format!("empty endpoint in '{}'", original))),
    }
}

fn ordered_shape(first: Endpoint, second: Endpoint, original: &str) -> Result<RangeShape> {
    let reversed = || Error::ReversedRange(original.to_string());

    match (first, second) {
        (Endpoint::Cell(start), Endpoint::Cell(end)) => {
            if start.row > end.row || start.col > end.col {
                return Err(reversed());
            }
            Ok(RangeShape::Rect { start, end })
        }
        (Endpoint::Column(start), Endpoint::Column(end)) => {
            if start > end {
                return Err(reversed());
            }
            Ok(RangeShape::Columns { start, end })
        }
        (Endpoint::Row(start), Endpoint::Row(end)) => {
            if start > end {
                return Err(reversed());
            }
            Ok(RangeShape::Rows { start, end })
        }
        _ => Err(Error::InvalidRange(format!(
            "mixed endpoint kinds in '{}'",
            original
        ))),
    }
}
