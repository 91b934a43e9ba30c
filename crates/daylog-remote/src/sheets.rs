//! Google Sheets adapter
//!
//! Uses the v4 REST API directly:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list tabs | `GET /{id}?fields=sheets.properties.title` |
//! | read rows | `GET /{id}/values/{tab}!A1:Z` |
//! | read cell | `GET /{id}/values/{tab}!E{row}` |
//! | write cell | `PUT /{id}/values/{tab}!E{row}?valueInputOption=RAW` |
//!
//! Writes replace the addressed cell; nothing is ever appended. Reading an
//! unknown tab yields `SyncError::TabNotFound`.

use daylog_core::{CellAddress, Config, SheetRow, Spreadsheet, SyncError, TabName};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::auth::{ServiceAccountAuth, TokenProvider};
use crate::http::{self, bearer, map_error, parse_json, read_body};

pub const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

const UNPARSABLE_RANGE: &str = "Unable to parse range";

/// A1 range covering every row of a tab, columns A through Z
pub fn rows_range(tab: &TabName) -> String {
    format!("{tab}!A1:Z")
}

// ── Wire types ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SpreadsheetWire {
    #[serde(default)]
    sheets: Vec<SheetWire>,
}

#[derive(Debug, Deserialize)]
struct SheetWire {
    properties: Option<SheetPropertiesWire>,
}

#[derive(Debug, Deserialize)]
struct SheetPropertiesWire {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValueRangeWire {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateWire {
    #[serde(default)]
    updated_cells: u64,
    updated_range: Option<String>,
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Tab titles from a spreadsheet metadata response
pub fn parse_tabs(body: &str) -> Result<Vec<TabName>, SyncError> {
    let spreadsheet: SpreadsheetWire = parse_json(body)?;
    Ok(spreadsheet
        .sheets
        .into_iter()
        .filter_map(|s| s.properties?.title)
        .map(TabName::from)
        .collect())
}

/// Rows of a value range; a range with no data has no `values` key
pub fn parse_rows(body: &str) -> Result<Vec<SheetRow>, SyncError> {
    let range: ValueRangeWire = parse_json(body)?;
    Ok(range
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect())
}

/// First cell of a value range, `None` when the range is blank
pub fn parse_cell(body: &str) -> Result<Option<String>, SyncError> {
    let rows = parse_rows(body)?;
    Ok(rows.into_iter().next().and_then(|row| row.into_iter().next()))
}

/// Google answers a read of an unknown tab with 400 "Unable to parse range"
/// rather than 404; report it as a missing tab.
pub fn classify_range_error(tab: &TabName, err: SyncError) -> SyncError {
    let unknown_tab = matches!(
        &err,
        SyncError::Http { status: 400, message } if message.starts_with(UNPARSABLE_RANGE)
    );
    if unknown_tab {
        SyncError::TabNotFound(tab.clone())
    } else {
        err
    }
}

/// Request body replacing a single cell
pub fn update_body(cell: &CellAddress, value: &str) -> Value {
    json!({
        "range": cell.a1(),
        "majorDimension": "ROWS",
        "values": [[value]],
    })
}

// ── Client ─────────────────────────────────────────────────────

/// Blocking client for one spreadsheet
pub struct SheetsClient {
    agent: ureq::Agent,
    spreadsheet_id: String,
    base_url: String,
    auth: Box<dyn TokenProvider>,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: impl Into<String>, auth: impl TokenProvider + 'static) -> Self {
        Self {
            agent: http::agent(),
            spreadsheet_id: spreadsheet_id.into(),
            base_url: SHEETS_API.to_string(),
            auth: Box::new(auth),
        }
    }

    /// Client authenticated with the configured service-account key file
    pub fn from_config(config: &Config) -> Result<Self, SyncError> {
        let auth = ServiceAccountAuth::from_file(&config.service_account_file)?;
        debug!(account = auth.client_email(), "loaded service-account key");
        Ok(Self::new(config.google_sheet_id.clone(), auth))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn spreadsheet_url(&self) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(&self.spreadsheet_id))
    }

    fn values_url(&self, range: &str) -> String {
        format!("{}/values/{}", self.spreadsheet_url(), urlencoding::encode(range))
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, SyncError> {
        let token = self.auth.access_token()?;
        let mut request = self.agent.get(url).set("Authorization", &bearer(&token));
        for (key, value) in query {
            request = request.query(key, value);
        }
        let response = request.call().map_err(map_error)?;
        read_body(response)
    }
}

impl Spreadsheet for SheetsClient {
    fn list_tabs(&self) -> Result<Vec<TabName>, SyncError> {
        debug!(spreadsheet = %self.spreadsheet_id, "listing tabs");
        let body = self.get(&self.spreadsheet_url(), &[("fields", "sheets.properties.title")])?;
        parse_tabs(&body)
    }

    fn read_rows(&self, tab: &TabName) -> Result<Vec<SheetRow>, SyncError> {
        let range = rows_range(tab);
        debug!(%range, "reading rows");
        let body = self
            .get(&self.values_url(&range), &[])
            .map_err(|e| classify_range_error(tab, e))?;
        parse_rows(&body)
    }

    fn read_cell(&self, cell: &CellAddress) -> Result<Option<String>, SyncError> {
        debug!(%cell, "reading cell");
        let body = self.get(&self.values_url(&cell.a1()), &[])?;
        parse_cell(&body)
    }

    fn write_cell(&self, cell: &CellAddress, value: &str) -> Result<(), SyncError> {
        let token = self.auth.access_token()?;
        let body = update_body(cell, value).to_string();

        let response = self
            .agent
            .put(&self.values_url(&cell.a1()))
            .query("valueInputOption", "RAW")
            .set("Authorization", &bearer(&token))
            .set("Content-Type", "application/json")
            .send_string(&body)
            .map_err(map_error)?;

        let update: UpdateWire = parse_json(&read_body(response)?)?;
        info!(
            %cell,
            updated_cells = update.updated_cells,
            updated_range = update.updated_range.as_deref().unwrap_or(""),
            "updated sheet"
        );
        Ok(())
    }
}
