//! Prelude module - common imports for sheetwire users
//!
//! ```rust
//! use sheetwire::prelude::*;
//! ```

pub use crate::{
    // Addressing
    GridRange,
    TextRange,
    // Results
    Envelope,
    ErrorInfo,
    ErrorKind,
    // Values and options
    CellValue,
    InsertDataOption,
    MajorDimension,
    ValueInputOption,
    Values,
    WriteOptions,
    // Resources
    BatchQueue,
    Sheet,
    SheetInfo,
    SheetsClient,
    Spreadsheet,
    // Configuration
    ClientConfig,
    CredentialSource,
    RetryPolicy,
};
