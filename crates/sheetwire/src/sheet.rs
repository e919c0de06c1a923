//! Value operations on a single tab.
//!
//! Every operation validates its input locally, builds an [`ApiRequest`],
//! runs it through the executor and reshapes the result. The returned
//! envelope's context holds the caller's parameters and the tab's info, plus
//! whatever the service reported (resolved range, updated counts) on success.

use std::fmt;
use std::io::Write;

use serde::Serialize;
use serde_json::{json, Value};
use sheetwire_core::{
    quote_sheet_name, Context, Envelope, ErrorInfo, GridRange, InsertDataOption, MajorDimension,
    SheetExtent, TextRange, ValueInputOption,
};
use sheetwire_protocol::{
    AppendValuesResponse, ApiRequest, CellValue, ClearValuesResponse, UpdateValuesResponse,
    ValueRange,
};

use crate::batch::BatchQueue;
use crate::client::SheetsClient;
use crate::export::{write_values_csv, CsvExportOptions};
use crate::spreadsheet::{SheetInfo, Spreadsheet};

/// Payload of [`Sheet::read`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Values {
    /// A single-cell read, unwrapped
    Cell(CellValue),
    Grid(Vec<Vec<CellValue>>),
}

impl Values {
    pub fn as_cell(&self) -> Option<&CellValue> {
        match self {
            Values::Cell(value) => Some(value),
            Values::Grid(_) => None,
        }
    }

    pub fn into_grid(self) -> Vec<Vec<CellValue>> {
        match self {
            Values::Cell(value) => vec![vec![value]],
            Values::Grid(rows) => rows,
        }
    }
}

/// Options for writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// How input strings are interpreted (default: as if typed)
    pub value_input: ValueInputOption,
    /// Append only: insert rows or overwrite (default: insert)
    pub insert_data: InsertDataOption,
    /// Whether the outer list holds rows or columns (default: rows)
    pub major_dimension: MajorDimension,
}

impl WriteOptions {
    /// Parse the wire spellings, rejecting anything outside each closed set
    pub fn parse(
        value_input: &str,
        insert_data: &str,
        major_dimension: &str,
    ) -> sheetwire_core::Result<Self> {
        Ok(Self {
            value_input: value_input.parse()?,
            insert_data: insert_data.parse()?,
            major_dimension: major_dimension.parse()?,
        })
    }

    pub fn with_value_input(mut self, value_input: ValueInputOption) -> Self {
        self.value_input = value_input;
        self
    }

    pub fn with_insert_data(mut self, insert_data: InsertDataOption) -> Self {
        self.insert_data = insert_data;
        self
    }

    pub fn with_major_dimension(mut self, major_dimension: MajorDimension) -> Self {
        self.major_dimension = major_dimension;
        self
    }
}

/// Handle to one tab of a [`Spreadsheet`].
#[derive(Clone)]
pub struct Sheet {
    client: SheetsClient,
    spreadsheet_id: String,
    spreadsheet_title: String,
    info: SheetInfo,
}

impl Sheet {
    pub(crate) fn new(
        client: SheetsClient,
        spreadsheet_id: String,
        spreadsheet_title: String,
        info: SheetInfo,
    ) -> Self {
        Self {
            client,
            spreadsheet_id,
            spreadsheet_title,
            info,
        }
    }

    pub fn info(&self) -> &SheetInfo {
        &self.info
    }

    pub fn title(&self) -> &str {
        &self.info.title
    }

    pub fn sheet_id(&self) -> i64 {
        self.info.sheet_id
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Known grid size, or the service maximums when metadata reported none
    pub fn extent(&self) -> SheetExtent {
        let max = SheetExtent::default();
        SheetExtent::new(
            if self.info.row_count == 0 { max.rows } else { self.info.row_count },
            if self.info.column_count == 0 { max.cols } else { self.info.column_count },
        )
    }

    /// Tab info as recorded in every operation's context
    pub fn describe(&self) -> Value {
        json!({
            "title": self.info.title,
            "sheet_id": self.info.sheet_id,
            "row_count": self.info.row_count,
            "column_count": self.info.column_count,
            "spreadsheet": self.spreadsheet_title,
        })
    }

    /// Pick up renamed or resized tab info from freshly refreshed metadata.
    /// Returns `false` when the tab no longer exists.
    pub fn sync(&mut self, spreadsheet: &Spreadsheet) -> bool {
        match spreadsheet.find_info(self.info.sheet_id, &self.info.title) {
            Some(info) => {
                self.info = info.clone();
                self.spreadsheet_title = spreadsheet.title().to_string();
                true
            }
            None => {
                tracing::warn!(sheet = %self.info.title, "Tab missing from metadata, possibly deleted");
                false
            }
        }
    }

    /// Zero-based grid range of `range` on this tab, carrying the tab id.
    /// Column-only and row-only ranges span the tab's known extent.
    pub fn grid_range(&self, range: &str) -> Result<GridRange, ErrorInfo> {
        let target = self.resolve(range)?;
        let grid = target.to_grid_range_within(self.extent())?;
        Ok(grid.with_sheet_id(self.info.sheet_id))
    }

    /// Read values. `None` (or an empty string) reads the whole tab.
    ///
    /// A single-cell range comes back as [`Values::Cell`].
    pub fn read(&self, range: Option<&str>) -> Envelope<Values> {
        let mut context = self.context(json!({ "input_range": range }));
        let outcome = self.read_into(range, &mut context);
        finish(outcome.map(Envelope::success), context, "Sheet::read")
    }

    fn read_into(&self, range: Option<&str>, context: &mut Context) -> Result<Values, ErrorInfo> {
        let target = self.resolve_optional(range)?;
        let request_range = self.request_range(target.as_ref());
        context.insert("range".into(), json!(request_range));

        let response: ValueRange = self.client.call(&ApiRequest::GetValues {
            spreadsheet_id: self.spreadsheet_id.clone(),
            range: request_range,
            major_dimension: MajorDimension::Rows,
        })?;

        let (rows, cols) = MajorDimension::Rows.extent_of(&response.values);
        context.insert("returned_range".into(), json!(response.range));
        context.insert("rows".into(), json!(rows));
        context.insert("columns".into(), json!(cols));

        if target.as_ref().is_some_and(TextRange::is_cell) {
            let value = response
                .values
                .into_iter()
                .next()
                .and_then(|row| row.into_iter().next())
                .unwrap_or(CellValue::Null);
            Ok(Values::Cell(value))
        } else {
            Ok(Values::Grid(response.values))
        }
    }

    /// Append rows after the table found at `range` (whole tab when `None`).
    pub fn append(
        &self,
        values: Vec<Vec<CellValue>>,
        range: Option<&str>,
        options: WriteOptions,
    ) -> Envelope<()> {
        let mut context = self.context(json!({
            "values": values,
            "input_range": range,
            "value_input_option": options.value_input,
            "insert_data_option": options.insert_data,
        }));
        let outcome = self.append_into(values, range, options, &mut context);
        finish(outcome.map(|()| Envelope::done()), context, "Sheet::append")
    }

    fn append_into(
        &self,
        values: Vec<Vec<CellValue>>,
        range: Option<&str>,
        options: WriteOptions,
        context: &mut Context,
    ) -> Result<(), ErrorInfo> {
        if values.is_empty() {
            return Err(ErrorInfo::validation("No values to append"));
        }
        let target = self.resolve_optional(range)?;
        let request_range = self.request_range(target.as_ref());
        context.insert("range".into(), json!(request_range));

        let response: AppendValuesResponse = self.client.call(&ApiRequest::AppendValues {
            spreadsheet_id: self.spreadsheet_id.clone(),
            range: request_range,
            value_input_option: options.value_input,
            insert_data_option: options.insert_data,
            body: ValueRange::new(values),
        })?;

        context.insert("table_range".into(), json!(response.table_range));
        if let Some(updates) = response.updates {
            insert_update_counts(context, &updates);
        }
        Ok(())
    }

    /// Overwrite cells at `range`. A single-cell range is an anchor and grows
    /// to the rectangle the values cover.
    pub fn update(
        &self,
        range: &str,
        values: Vec<Vec<CellValue>>,
        options: WriteOptions,
    ) -> Envelope<()> {
        let mut context = self.context(json!({
            "input_range": range,
            "values": values,
            "value_input_option": options.value_input,
            "major_dimension": options.major_dimension,
        }));
        let outcome = self
            .resolve_required(range)
            .and_then(|target| self.update_into(&target, values, options, &mut context));
        finish(outcome.map(|()| Envelope::done()), context, "Sheet::update")
    }

    /// Write one value into one cell.
    pub fn update_cell(&self, cell: &str, value: impl Into<CellValue>) -> Envelope<()> {
        let value = value.into();
        let mut context = self.context(json!({ "cell": cell, "value": value }));

        let outcome = self.resolve_required(cell).and_then(|target| {
            if !target.is_cell() {
                return Err(ErrorInfo::validation(format!("Invalid cell format: {cell}")));
            }
            self.update_into(&target, vec![vec![value]], WriteOptions::default(), &mut context)
        });
        finish(outcome.map(|()| Envelope::done()), context, "Sheet::update_cell")
    }

    fn update_into(
        &self,
        target: &TextRange,
        values: Vec<Vec<CellValue>>,
        options: WriteOptions,
        context: &mut Context,
    ) -> Result<(), ErrorInfo> {
        let (rows, cols) = options.major_dimension.extent_of(&values);
        if rows == 0 || cols == 0 {
            return Err(ErrorInfo::validation("No values to write"));
        }

        let request_range = target.expand_to_fit(rows, cols).to_string();
        context.insert("range".into(), json!(request_range));

        let response: UpdateValuesResponse = self.client.call(&ApiRequest::UpdateValues {
            spreadsheet_id: self.spreadsheet_id.clone(),
            range: request_range,
            value_input_option: options.value_input,
            body: ValueRange::new(values).with_major_dimension(options.major_dimension),
        })?;

        insert_update_counts(context, &response);
        Ok(())
    }

    /// Clear values at `range` (whole tab when `None`). Formatting is kept.
    pub fn clear(&self, range: Option<&str>) -> Envelope<()> {
        let mut context = self.context(json!({ "input_range": range }));
        let outcome = self.clear_into(range, &mut context);
        finish(outcome.map(|()| Envelope::done()), context, "Sheet::clear")
    }

    fn clear_into(&self, range: Option<&str>, context: &mut Context) -> Result<(), ErrorInfo> {
        let target = self.resolve_optional(range)?;
        let request_range = self.request_range(target.as_ref());
        context.insert("range".into(), json!(request_range));

        let response: ClearValuesResponse = self.client.call(&ApiRequest::ClearValues {
            spreadsheet_id: self.spreadsheet_id.clone(),
            range: request_range,
        })?;

        context.insert("cleared_range".into(), json!(response.cleared_range));
        Ok(())
    }

    /// Add a write to `queue` instead of sending it. Nothing is sent until
    /// [`Spreadsheet::batch_mutate`] runs.
    pub fn queue_update(
        &self,
        queue: &mut BatchQueue,
        range: &str,
        values: Vec<Vec<CellValue>>,
        major_dimension: MajorDimension,
    ) -> Envelope<()> {
        let mut context = self.context(json!({
            "input_range": range,
            "major_dimension": major_dimension,
        }));

        let outcome = self.resolve_required(range).and_then(|target| {
            let (rows, cols) = major_dimension.extent_of(&values);
            if rows == 0 || cols == 0 {
                return Err(ErrorInfo::validation("No values to write"));
            }
            let request_range = target.expand_to_fit(rows, cols).to_string();
            context.insert("range".into(), json!(request_range));

            queue.push(
                ValueRange::new(values)
                    .with_range(request_range)
                    .with_major_dimension(major_dimension),
            );
            context.insert("queued".into(), json!(queue.len()));
            Ok(())
        });
        finish(outcome.map(|()| Envelope::done()), context, "Sheet::queue_update")
    }

    /// Read `range` and write it as CSV.
    pub fn to_csv<W: Write>(
        &self,
        writer: W,
        range: Option<&str>,
        options: &CsvExportOptions,
    ) -> Envelope<()> {
        let read = self.read(range);
        let mut context = read.context.clone();

        let outcome = read.into_result().and_then(|values| {
            let grid = values.map(Values::into_grid).unwrap_or_default();
            let written = write_values_csv(writer, &grid, options)
                .map_err(|e| ErrorInfo::internal(format!("CSV export failed: {e}")))?;
            context.insert("rows_written".into(), json!(written));
            Ok(())
        });
        finish(outcome.map(|()| Envelope::done()), context, "Sheet::to_csv")
    }

    fn context(&self, params: Value) -> Context {
        let mut context = match params {
            Value::Object(map) => map,
            _ => Context::new(),
        };
        context.insert("sheet".into(), self.describe());
        context
    }

    /// Parse `range`, replacing any tab prefix with this tab's name
    fn resolve(&self, range: &str) -> Result<TextRange, ErrorInfo> {
        let parsed = TextRange::parse(range)?;
        Ok(parsed.with_sheet(self.info.title.clone()))
    }

    fn resolve_required(&self, range: &str) -> Result<TextRange, ErrorInfo> {
        if range.trim().is_empty() {
            return Err(ErrorInfo::validation("No range specified"));
        }
        self.resolve(range)
    }

    fn resolve_optional(&self, range: Option<&str>) -> Result<Option<TextRange>, ErrorInfo> {
        match range.map(str::trim).filter(|r| !r.is_empty()) {
            Some(range) => self.resolve(range).map(Some),
            None => Ok(None),
        }
    }

    fn request_range(&self, target: Option<&TextRange>) -> String {
        match target {
            Some(range) => range.to_string(),
            None => quote_sheet_name(&self.info.title),
        }
    }
}

impl fmt::Display for Sheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sheet \"{}\" (id {}) in \"{}\", {} rows x {} columns",
            self.info.title,
            self.info.sheet_id,
            self.spreadsheet_title,
            self.info.row_count,
            self.info.column_count
        )
    }
}

impl fmt::Debug for Sheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sheet")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("info", &self.info)
            .finish()
    }
}

fn insert_update_counts(context: &mut Context, response: &UpdateValuesResponse) {
    context.insert("updated_range".into(), json!(response.updated_range));
    context.insert("updated_rows".into(), json!(response.updated_rows));
    context.insert("updated_columns".into(), json!(response.updated_columns));
    context.insert("updated_cells".into(), json!(response.updated_cells));
}

fn finish<T>(
    outcome: Result<Envelope<T>, ErrorInfo>,
    context: Context,
    operation: &str,
) -> Envelope<T> {
    match outcome {
        Ok(envelope) => envelope.with_context(context),
        Err(error) => {
            tracing::debug!(operation, kind = %error.kind, "{}", error.message);
            Envelope::failure(error.with_operation(operation)).with_context(context)
        }
    }
}
