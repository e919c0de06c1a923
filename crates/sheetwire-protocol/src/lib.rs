//! Shared wire types for the spreadsheet values API.
//!
//! Requests are described by [`ApiRequest`], which knows its HTTP method, path
//! segments, query string and JSON body but performs no I/O. Responses are
//! plain serde structs mirroring the JSON the service returns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use sheetwire_core::{InsertDataOption, MajorDimension, ValueInputOption};

/// API version prefix for every path
pub const API_VERSION: &str = "v4";

/// HTTP verb of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

/// A prepared call against the values API.
///
/// `range` fields hold fully qualified A1 text (`'My Tab'!A1:B2`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "params", rename_all = "snake_case")]
pub enum ApiRequest {
    /// Fetch spreadsheet metadata (title, locale, tabs).
    GetSpreadsheet { spreadsheet_id: String },

    /// Read a block of values.
    GetValues {
        spreadsheet_id: String,
        range: String,
        major_dimension: MajorDimension,
    },

    /// Append rows after the table found at `range`.
    AppendValues {
        spreadsheet_id: String,
        range: String,
        value_input_option: ValueInputOption,
        insert_data_option: InsertDataOption,
        body: ValueRange,
    },

    /// Overwrite the cells at `range`.
    UpdateValues {
        spreadsheet_id: String,
        range: String,
        value_input_option: ValueInputOption,
        body: ValueRange,
    },

    /// Clear values (not formatting) at `range`.
    ClearValues {
        spreadsheet_id: String,
        range: String,
    },

    /// Overwrite several ranges in one call.
    BatchUpdateValues {
        spreadsheet_id: String,
        body: BatchUpdateValuesRequest,
    },

    /// Clear several ranges in one call.
    BatchClearValues {
        spreadsheet_id: String,
        body: BatchClearValuesRequest,
    },
}

impl ApiRequest {
    /// Short operation name for logs and error context
    pub fn name(&self) -> &'static str {
        match self {
            ApiRequest::GetSpreadsheet { .. } => "spreadsheets.get",
            ApiRequest::GetValues { .. } => "values.get",
            ApiRequest::AppendValues { .. } => "values.append",
            ApiRequest::UpdateValues { .. } => "values.update",
            ApiRequest::ClearValues { .. } => "values.clear",
            ApiRequest::BatchUpdateValues { .. } => "values.batchUpdate",
            ApiRequest::BatchClearValues { .. } => "values.batchClear",
        }
    }

    pub fn spreadsheet_id(&self) -> &str {
        match self {
            ApiRequest::GetSpreadsheet { spreadsheet_id }
            | ApiRequest::GetValues { spreadsheet_id, .. }
            | ApiRequest::AppendValues { spreadsheet_id, .. }
            | ApiRequest::UpdateValues { spreadsheet_id, .. }
            | ApiRequest::ClearValues { spreadsheet_id, .. }
            | ApiRequest::BatchUpdateValues { spreadsheet_id, .. }
            | ApiRequest::BatchClearValues { spreadsheet_id, .. } => spreadsheet_id,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            ApiRequest::GetSpreadsheet { .. } | ApiRequest::GetValues { .. } => Method::Get,
            ApiRequest::UpdateValues { .. } => Method::Put,
            ApiRequest::AppendValues { .. }
            | ApiRequest::ClearValues { .. }
            | ApiRequest::BatchUpdateValues { .. }
            | ApiRequest::BatchClearValues { .. } => Method::Post,
        }
    }

    /// Unencoded path segments below the API root
    pub fn path_segments(&self) -> Vec<String> {
        let mut segments = vec![
            API_VERSION.to_string(),
            "spreadsheets".to_string(),
            self.spreadsheet_id().to_string(),
        ];

        match self {
            ApiRequest::GetSpreadsheet { .. } => {}
            ApiRequest::GetValues { range, .. } | ApiRequest::UpdateValues { range, .. } => {
                segments.push("values".into());
                segments.push(range.clone());
            }
            ApiRequest::AppendValues { range, .. } => {
                segments.push("values".into());
                segments.push(format!("{range}:append"));
            }
            ApiRequest::ClearValues { range, .. } => {
                segments.push("values".into());
                segments.push(format!("{range}:clear"));
            }
            ApiRequest::BatchUpdateValues { .. } => segments.push("values:batchUpdate".into()),
            ApiRequest::BatchClearValues { .. } => segments.push("values:batchClear".into()),
        }

        segments
    }

    /// Query string parameters
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            ApiRequest::GetValues {
                major_dimension, ..
            } => vec![("majorDimension", major_dimension.as_str().into())],
            ApiRequest::AppendValues {
                value_input_option,
                insert_data_option,
                ..
            } => vec![
                ("valueInputOption", value_input_option.as_str().into()),
                ("insertDataOption", insert_data_option.as_str().into()),
            ],
            ApiRequest::UpdateValues {
                value_input_option,
                ..
            } => vec![("valueInputOption", value_input_option.as_str().into())],
            _ => Vec::new(),
        }
    }

    /// JSON body, if the call has one
    pub fn body(&self) -> Result<Option<Value>, serde_json::Error> {
        Ok(match self {
            ApiRequest::AppendValues { body, .. } | ApiRequest::UpdateValues { body, .. } => {
                Some(serde_json::to_value(body)?)
            }
            ApiRequest::BatchUpdateValues { body, .. } => Some(serde_json::to_value(body)?),
            ApiRequest::BatchClearValues { body, .. } => Some(serde_json::to_value(body)?),
            ApiRequest::ClearValues { .. } => Some(Value::Object(Default::default())),
            ApiRequest::GetSpreadsheet { .. } | ApiRequest::GetValues { .. } => None,
        })
    }
}

/// A block of values and the range it covers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<MajorDimension>,
    /// Missing when the range is empty
    #[serde(default)]
    pub values: Vec<Vec<CellValue>>,
}

impl ValueRange {
    pub fn new(values: Vec<Vec<CellValue>>) -> Self {
        Self {
            range: None,
            major_dimension: None,
            values,
        }
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self
    }

    pub fn with_major_dimension(mut self, dimension: MajorDimension) -> Self {
        self.major_dimension = Some(dimension);
        self
    }
}

/// Counts reported after a write.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateValuesResponse {
    pub spreadsheet_id: Option<String>,
    pub updated_range: Option<String>,
    pub updated_rows: Option<u64>,
    pub updated_columns: Option<u64>,
    pub updated_cells: Option<u64>,
}

/// Result of an append: the table that was found and what was written.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppendValuesResponse {
    pub spreadsheet_id: Option<String>,
    pub table_range: Option<String>,
    pub updates: Option<UpdateValuesResponse>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClearValuesResponse {
    pub spreadsheet_id: Option<String>,
    pub cleared_range: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesRequest {
    pub value_input_option: ValueInputOption,
    pub data: Vec<ValueRange>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchUpdateValuesResponse {
    pub spreadsheet_id: Option<String>,
    pub total_updated_rows: Option<u64>,
    pub total_updated_columns: Option<u64>,
    pub total_updated_cells: Option<u64>,
    pub total_updated_sheets: Option<u64>,
    pub responses: Vec<UpdateValuesResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchClearValuesRequest {
    pub ranges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchClearValuesResponse {
    pub spreadsheet_id: Option<String>,
    pub cleared_ranges: Vec<String>,
}

/// Spreadsheet metadata returned by `spreadsheets.get`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpreadsheetResource {
    pub spreadsheet_id: String,
    pub properties: SpreadsheetProperties,
    pub sheets: Vec<SheetResource>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpreadsheetProperties {
    pub title: String,
    pub locale: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetResource {
    pub properties: SheetProperties,
}

/// Properties of a single tab.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
    pub index: u32,
    pub grid_properties: GridProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridProperties {
    pub row_count: u32,
    pub column_count: u32,
}

/// Error body the service sends with non-2xx statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorStatus {
    pub code: u16,
    #[serde(default)]
    pub message: String,
    /// Canonical status name, e.g. `NOT_FOUND`, `RESOURCE_EXHAUSTED`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

/// A cell value as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::String(s) => write!(f, "{s}"),
        }
    }
}
