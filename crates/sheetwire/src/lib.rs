//! # sheetwire
//!
//! A client for the spreadsheet values API that takes care of the fiddly
//! parts: A1 range translation, credential refresh and retries.
//!
//! ## Features
//!
//! - Read, append, update and clear values by A1 range (`A1:C3`, `A:A`, `5:10`)
//! - Batched writes through an explicit [`BatchQueue`]
//! - Credential loading from a file, an env var or an injected blob, with
//!   refresh and best-effort persistence
//! - Bounded exponential-backoff retries on rate limiting and server errors
//! - Every operation returns an [`Envelope`] with diagnostic context
//! - CSV export
//!
//! ## Architecture
//!
//! ```text
//! Sheet / Spreadsheet          (validate, build ApiRequest, reshape result)
//!     └── SheetsClient
//!           ├── ResilientExecutor  (ensure credential, retry with backoff)
//!           │     └── TokenSource (CredentialSession)
//!           └── Transport          (HttpTransport, or a test double)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use sheetwire::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SheetsClient::from_config(ClientConfig::from_env())?;
//!     let spreadsheet = client.open("1WUBUMIw0fk_dnFO_jnMUTCMS_t_esnYKPYndZIFXhIs");
//!     let spreadsheet = spreadsheet.into_result()?.ok_or("no spreadsheet")?;
//!
//!     let sheet = spreadsheet.get_by_name("Sheet1").ok_or("no such tab")?;
//!     let values = sheet.read(Some("A1:C3"));
//!     println!("{:?}", values.data());
//!
//!     let written = sheet.update("E1", vec![vec!["total".into(), 42.into()]], WriteOptions::default());
//!     println!("updated {:?}", written.context_value("updated_range"));
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod executor;
pub mod export;
#[cfg(feature = "http")]
pub mod http;
pub mod prelude;
pub mod sheet;
pub mod spreadsheet;
pub mod transport;

pub use batch::BatchQueue;
pub use client::SheetsClient;
pub use config::{ClientConfig, ClientSecretsSource, CredentialSource, RetryPolicy};
pub use credential::{
    ClientSecrets, Credential, CredentialAcquirer, CredentialSession, CredentialStore,
    EnvCredentialStore, FileCredentialStore, NoAcquisition, SessionState, TokenRefresher,
};
pub use error::{CallError, ClientError, CredentialError};
pub use executor::{RemoteCall, ResilientExecutor, Sleeper, StaticToken, ThreadSleeper, TokenSource};
pub use export::{write_values_csv, CsvExportOptions, LineTerminator};
pub use sheet::{Sheet, Values, WriteOptions};
pub use spreadsheet::{SheetInfo, Spreadsheet};
pub use transport::{PreparedCall, Transport};

pub use sheetwire_core::{
    column_letters_to_index, grid_range_to_text_range, index_to_column_letters, is_cell,
    text_range_to_grid_range, validate_grid_range, validate_text_range, Envelope, ErrorInfo,
    ErrorKind, GridRange, InsertDataOption, MajorDimension, SheetExtent, TextRange,
    ValueInputOption,
};
pub use sheetwire_protocol::{ApiRequest, CellValue};
