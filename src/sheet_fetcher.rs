use std::collections::BTreeMap;

use tracing::{debug, instrument, warn};
use url::Url;

use crate::catalog::CellRange;
use crate::converters::Converter;
use crate::fetch_error::FetchError;
use crate::table::{CellValue, RowTable};

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://docs.google.com/spreadsheets/d/";

/// Downloads cell ranges of published spreadsheets as CSV.
///
/// Every call hits the network; nothing is cached.
#[derive(Clone)]
pub struct SheetFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl SheetFetcher {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// `{base}{key}/gviz/tq?tqx=out:csv&range=A9:G69&sheet={sheet}`
    pub fn sheet_url(&self, key: &str, sheet: &str, range: &CellRange) -> Result<Url, FetchError> {
        let raw = format!("{}{}/gviz/tq", self.base_url, key);
        let mut url = Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;
        url.query_pairs_mut()
            .append_pair("tqx", "out:csv")
            .append_pair("range", &range.to_string())
            .append_pair("sheet", sheet);
        Ok(url)
    }

    /// Fetch one range and convert it to a table.
    ///
    /// With `names` every record is data; without them the first record is the header.
    #[instrument(skip(self, names, converters), fields(key = %key, sheet = %sheet, range = %range))]
    pub async fn fetch_table(
        &self,
        key: &str,
        sheet: &str,
        range: &CellRange,
        names: Option<&[String]>,
        converters: &BTreeMap<String, Converter>,
    ) -> Result<RowTable, FetchError> {
        let url = self.sheet_url(key, sheet, range)?;
        debug!("Sending HTTP request to {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        debug!("Received HTTP response with status: {}", status);

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let text = response.text().await?;
        debug!("Retrieved CSV content, size: {} bytes", text.len());

        parse_table(&text, names, converters)
    }
}

/// Parse delimited text into a [`RowTable`], applying converters by column name.
#[instrument(skip_all, fields(text_size = text.len()))]
pub fn parse_table(
    text: &str,
    names: Option<&[String]>,
    converters: &BTreeMap<String, Converter>,
) -> Result<RowTable, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let column_names: Vec<String> = match names {
        Some(names) => names.to_vec(),
        None => {
            let header = records.next().ok_or(FetchError::MissingHeader)??;
            header.iter().map(|name| name.replace('\n', "")).collect()
        }
    };
    debug!("Parsing with columns {:?}", column_names);

    let column_converters: Vec<Option<Converter>> = column_names
        .iter()
        .map(|name| converters.get(name).copied())
        .collect();

    let mut table = RowTable::new(&column_names);
    let mut short_rows = 0;

    for record in records {
        let record = record?;
        if record.len() < column_names.len() {
            short_rows += 1;
        }
        let cells = column_converters
            .iter()
            .enumerate()
            .map(|(idx, converter)| {
                let raw = record.get(idx).unwrap_or("");
                match converter {
                    Some(converter) => converter.apply(raw),
                    None => CellValue::infer(raw),
                }
            })
            .collect();
        table.push_row(cells);
    }

    if short_rows > 0 {
        warn!("{} rows were shorter than the header and were padded", short_rows);
    }
    debug!("Parsed {} rows", table.row_count());

    Ok(table)
}
