//! Destinations for a finished report table.

use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::api::{ReportResult, http_client, read_json};

pub const DEFAULT_SPREADSHEET_TITLE: &str = "AdSense Report";

/// Header row plus data rows, all as display strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header row followed by the data rows.
    pub fn to_values(&self) -> Vec<Vec<String>> {
        std::iter::once(self.headers.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }
}

impl From<&ReportResult> for Table {
    fn from(report: &ReportResult) -> Self {
        Self {
            headers: report.headers.iter().map(|h| h.name.clone()).collect(),
            rows: report
                .rows
                .iter()
                .map(|r| r.cells.iter().map(|c| c.value.clone()).collect())
                .collect(),
        }
    }
}

#[async_trait]
pub trait TableSink {
    /// Writes the table and returns where it went.
    async fn write_table(&mut self, table: &Table) -> Result<String>;
}

/// Tab separated lines, header first.
pub struct TsvSink<W> {
    out: W,
    label: String,
}

impl TsvSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), "stdout")
    }
}

impl<W: Write> TsvSink<W> {
    pub fn new(out: W, label: impl Into<String>) -> Self {
        Self {
            out,
            label: label.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: Write + Send> TableSink for TsvSink<W> {
    async fn write_table(&mut self, table: &Table) -> Result<String> {
        for line in table.to_values() {
            writeln!(self.out, "{}", line.join("\t"))?;
        }
        self.out.flush()?;
        Ok(self.label.clone())
    }
}

pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    label: String,
}

impl CsvSink<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file), path.display().to_string()))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W, label: impl Into<String>) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
            label: label.into(),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))
    }
}

#[async_trait]
impl<W: Write + Send> TableSink for CsvSink<W> {
    async fn write_table(&mut self, table: &Table) -> Result<String> {
        self.writer.write_record(&table.headers)?;
        for row in &table.rows {
            self.writer.write_record(row)?;
        }
        self.writer.flush()?;
        Ok(self.label.clone())
    }
}

/// CSV file that is only created (or truncated) once there is a table to
/// write into it.
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TableSink for CsvFileSink {
    async fn write_table(&mut self, table: &Table) -> Result<String> {
        let mut sink = CsvSink::create(&self.path)?;
        let dest = sink.write_table(table).await?;
        sink.into_inner()?;
        Ok(dest)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
    spreadsheet_url: Option<String>,
}

/// Creates a new spreadsheet per table and fills it from A1.
pub struct SheetsSink {
    http: Client,
    base_url: Url,
    access_token: String,
    title: String,
}

impl SheetsSink {
    pub fn new(access_token: impl Into<String>, title: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            base_url: Url::parse("https://sheets.googleapis.com/")?,
            access_token: access_token.into(),
            title: title.into(),
        })
    }

    /// Overrides the base URL for API requests. Useful for tests with a mock server.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    async fn create_spreadsheet(&self) -> Result<CreatedSpreadsheet> {
        let url = self.base_url.join("v4/spreadsheets")?;
        let res = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "properties": { "title": self.title } }))
            .send()
            .await?;
        read_json("POST", res).await
    }
}

#[async_trait]
impl TableSink for SheetsSink {
    async fn write_table(&mut self, table: &Table) -> Result<String> {
        let sheet = self.create_spreadsheet().await?;
        debug!("created spreadsheet {}", sheet.spreadsheet_id);

        let url = self
            .base_url
            .join(&format!("v4/spreadsheets/{}/values/A1", sheet.spreadsheet_id))?;
        let res = self
            .http
            .put(url)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "range": "A1", "majorDimension": "ROWS", "values": table.to_values() }))
            .send()
            .await?;
        let _: serde_json::Value = read_json("PUT", res).await?;

        Ok(sheet.spreadsheet_url.unwrap_or_else(|| {
            format!(
                "https://docs.google.com/spreadsheets/d/{}",
                sheet.spreadsheet_id
            )
        }))
    }
}
