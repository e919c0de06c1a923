//! # sheetwire-core
//!
//! Pure data types for the sheetwire client:
//! - [`TextRange`] and friends - A1 range notation (`A1:C3`, `A:A`, `5:10`)
//! - [`GridRange`] - zero-based, end-exclusive wire coordinates
//! - [`Envelope`] and [`ErrorInfo`] - the uniform result container
//! - [`ValueInputOption`], [`InsertDataOption`], [`MajorDimension`] - request options
//!
//! ## Example
//!
//! ```rust
//! use sheetwire_core::{grid_range_to_text_range, text_range_to_grid_range, GridRange};
//!
//! let grid = text_range_to_grid_range("A1:B2").unwrap();
//! assert_eq!(grid, GridRange::new(0, 2, 0, 2));
//!
//! assert_eq!(grid_range_to_text_range(&grid).unwrap(), "A1:B2");
//! ```

pub mod a1;
pub mod envelope;
pub mod error;
pub mod grid;
pub mod options;

pub use a1::{
    column_letters_to_index, grid_range_to_text_range, index_to_column_letters, is_cell,
    quote_sheet_name, text_range_to_grid_range, validate_text_range, CellRef, RangeShape,
    SheetExtent, TextRange, MAX_COLUMNS, MAX_ROWS,
};
pub use envelope::{Context, Envelope, ErrorInfo, ErrorKind};
pub use error::{Error, Result};
pub use grid::{validate_grid_range, GridRange};
pub use options::{InsertDataOption, MajorDimension, ValueInputOption};
