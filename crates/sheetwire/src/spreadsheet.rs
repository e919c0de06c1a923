//! Spreadsheet handle: metadata, tab lookup and batched writes.

use serde::Serialize;
use serde_json::json;
use sheetwire_core::{Context, Envelope, ErrorInfo, TextRange, ValueInputOption};
use sheetwire_protocol::{
    ApiRequest, BatchClearValuesRequest, BatchClearValuesResponse, BatchUpdateValuesRequest,
    BatchUpdateValuesResponse, SheetProperties, SpreadsheetResource,
};

use crate::batch::BatchQueue;
use crate::client::SheetsClient;
use crate::sheet::Sheet;

/// Properties of one tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetInfo {
    pub title: String,
    pub sheet_id: i64,
    pub index: u32,
    pub row_count: u32,
    pub column_count: u32,
}

impl From<&SheetProperties> for SheetInfo {
    fn from(props: &SheetProperties) -> Self {
        Self {
            title: props.title.clone(),
            sheet_id: props.sheet_id,
            index: props.index,
            row_count: props.grid_properties.row_count,
            column_count: props.grid_properties.column_count,
        }
    }
}

/// A remote spreadsheet and its tabs.
pub struct Spreadsheet {
    client: SheetsClient,
    id: String,
    title: String,
    locale: String,
    time_zone: String,
    sheets: Vec<SheetInfo>,
    queue: BatchQueue,
}

impl Spreadsheet {
    /// Fetch metadata for `spreadsheet_id`.
    pub fn open(client: SheetsClient, spreadsheet_id: &str) -> Envelope<Self> {
        let mut context = Context::new();
        context.insert("spreadsheet_id".into(), json!(spreadsheet_id));

        let mut spreadsheet = Self::from_resource(
            client,
            SpreadsheetResource {
                spreadsheet_id: spreadsheet_id.to_string(),
                ..Default::default()
            },
        );

        match spreadsheet.fetch() {
            Ok(()) => {
                tracing::info!(
                    spreadsheet_id,
                    title = %spreadsheet.title,
                    sheets = spreadsheet.sheets.len(),
                    "Opened spreadsheet"
                );
                context.insert("title".into(), json!(spreadsheet.title));
                context.insert("sheet_count".into(), json!(spreadsheet.sheets.len()));
                Envelope::success(spreadsheet).with_context(context)
            }
            Err(error) => {
                Envelope::failure(error.with_operation("Spreadsheet::open")).with_context(context)
            }
        }
    }

    /// Build a handle from metadata already in hand
    pub fn from_resource(client: SheetsClient, resource: SpreadsheetResource) -> Self {
        let mut spreadsheet = Self {
            client,
            id: resource.spreadsheet_id.clone(),
            title: String::new(),
            locale: String::new(),
            time_zone: String::new(),
            sheets: Vec::new(),
            queue: BatchQueue::new(),
        };
        spreadsheet.apply(resource);
        spreadsheet
    }

    fn fetch(&mut self) -> Result<(), ErrorInfo> {
        let resource: SpreadsheetResource = self.client.call(&ApiRequest::GetSpreadsheet {
            spreadsheet_id: self.id.clone(),
        })?;
        self.apply(resource);
        Ok(())
    }

    fn apply(&mut self, resource: SpreadsheetResource) {
        self.title = resource.properties.title;
        self.locale = resource.properties.locale;
        self.time_zone = resource.properties.time_zone;
        self.sheets = resource
            .sheets
            .iter()
            .map(|s| SheetInfo::from(&s.properties))
            .collect();
    }

    /// Re-fetch metadata; tabs added or removed remotely show up afterwards.
    pub fn refresh_metadata(&mut self) -> Envelope<()> {
        let mut context = Context::new();
        context.insert("spreadsheet_id".into(), json!(self.id));

        match self.fetch() {
            Ok(()) => {
                context.insert("sheet_count".into(), json!(self.sheets.len()));
                Envelope::done().with_context(context)
            }
            Err(error) => Envelope::failure(error.with_operation("Spreadsheet::refresh_metadata"))
                .with_context(context),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn time_zone(&self) -> &str {
        &self.time_zone
    }

    pub fn client(&self) -> &SheetsClient {
        &self.client
    }

    /// Tabs in the order the service reported them
    pub fn sheets(&self) -> &[SheetInfo] {
        &self.sheets
    }

    /// Tab with exactly this title
    pub fn get_by_name(&self, name: &str) -> Option<Sheet> {
        let found = self.sheets.iter().find(|s| s.title == name);
        if found.is_none() {
            tracing::debug!(name, "No such tab; metadata may be stale");
        }
        found.map(|info| self.sheet(info))
    }

    /// Tab with this numeric id
    pub fn get_by_id(&self, sheet_id: i64) -> Option<Sheet> {
        let found = self.sheets.iter().find(|s| s.sheet_id == sheet_id);
        if found.is_none() {
            tracing::debug!(sheet_id, "No such tab id; metadata may be stale");
        }
        found.map(|info| self.sheet(info))
    }

    fn sheet(&self, info: &SheetInfo) -> Sheet {
        Sheet::new(
            self.client.clone(),
            self.id.clone(),
            self.title.clone(),
            info.clone(),
        )
    }

    pub(crate) fn find_info(&self, sheet_id: i64, title: &str) -> Option<&SheetInfo> {
        self.sheets
            .iter()
            .find(|s| s.sheet_id == sheet_id)
            .or_else(|| self.sheets.iter().find(|s| s.title == title))
    }

    pub fn batch(&self) -> &BatchQueue {
        &self.queue
    }

    /// Queue handed to [`Sheet::queue_update`]
    pub fn batch_mut(&mut self) -> &mut BatchQueue {
        &mut self.queue
    }

    /// Send every queued write in one call.
    ///
    /// The queue is emptied on success. On failure the writes go back into the
    /// queue so the caller can retry or inspect them.
    pub fn batch_mutate(&mut self, value_input_option: ValueInputOption) -> Envelope<()> {
        const OPERATION: &str = "Spreadsheet::batch_mutate";

        let mut context = Context::new();
        context.insert("spreadsheet_id".into(), json!(self.id));
        context.insert("value_input_option".into(), json!(value_input_option));
        context.insert("ranges".into(), json!(self.queue.ranges()));

        if self.queue.is_empty() {
            return Envelope::failure(
                ErrorInfo::validation("No queued updates to send").with_operation(OPERATION),
            )
            .with_context(context);
        }

        let data = self.queue.take();
        let request = ApiRequest::BatchUpdateValues {
            spreadsheet_id: self.id.clone(),
            body: BatchUpdateValuesRequest {
                value_input_option,
                data,
            },
        };

        match self.client.call::<BatchUpdateValuesResponse>(&request) {
            Ok(response) => {
                context.insert("total_updated_rows".into(), json!(response.total_updated_rows));
                context.insert(
                    "total_updated_columns".into(),
                    json!(response.total_updated_columns),
                );
                context.insert("total_updated_cells".into(), json!(response.total_updated_cells));
                context.insert(
                    "total_updated_sheets".into(),
                    json!(response.total_updated_sheets),
                );
                context.insert(
                    "updated_ranges".into(),
                    json!(response
                        .responses
                        .iter()
                        .filter_map(|r| r.updated_range.as_deref())
                        .collect::<Vec<_>>()),
                );
                Envelope::done().with_context(context)
            }
            Err(error) => {
                if let ApiRequest::BatchUpdateValues { body, .. } = request {
                    self.queue.restore(body.data);
                }
                Envelope::failure(error.with_operation(OPERATION)).with_context(context)
            }
        }
    }

    /// Clear several ranges in one call. Ranges may carry their own tab prefix.
    pub fn batch_clear(&self, ranges: &[&str]) -> Envelope<()> {
        const OPERATION: &str = "Spreadsheet::batch_clear";

        let mut context = Context::new();
        context.insert("spreadsheet_id".into(), json!(self.id));
        context.insert("ranges".into(), json!(ranges));

        let resolved: Result<Vec<String>, ErrorInfo> = if ranges.is_empty() {
            Err(ErrorInfo::validation("No ranges to clear"))
        } else {
            ranges
                .iter()
                .map(|r| {
                    TextRange::parse(r)
                        .map(|range| range.to_string())
                        .map_err(ErrorInfo::from)
                })
                .collect()
        };

        let outcome = resolved.and_then(|ranges| {
            self.client
                .call::<BatchClearValuesResponse>(&ApiRequest::BatchClearValues {
                    spreadsheet_id: self.id.clone(),
                    body: BatchClearValuesRequest { ranges },
                })
        });

        match outcome {
            Ok(response) => {
                context.insert("cleared_ranges".into(), json!(response.cleared_ranges));
                Envelope::done().with_context(context)
            }
            Err(error) => Envelope::failure(error.with_operation(OPERATION)).with_context(context),
        }
    }
}

impl std::fmt::Debug for Spreadsheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spreadsheet")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("sheets", &self.sheets)
            .field("queued", &self.queue.len())
            .finish()
    }
}
