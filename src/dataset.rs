//! The in-memory record table.
//!
//! A [`Dataset`] is built once per input file and is read-only afterwards;
//! every analysis is a full recompute over it. One [`Record`] is one
//! (account, product) association, so a single account contributes one
//! record per purchased product.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use calamine::{DataType, Reader, Xlsx, open_workbook};
use log::debug;

use crate::{io_utils, schema::HeaderMap};

/// One (account, product) association from the source table.
///
/// String fields are trimmed; optional industry fields are `None` when the
/// source cell was empty. Account ids are opaque, case-sensitive keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub account_id: String,
    pub account_name: String,
    pub primary_code: Option<String>,
    pub primary_description: Option<String>,
    pub secondary_code: Option<String>,
    pub secondary_description: Option<String>,
    pub product: String,
}

#[derive(Debug)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Loads a dataset from `path`. `.xlsx` inputs read the first worksheet;
    /// anything else is parsed as delimited text using the resolved delimiter
    /// and encoding.
    pub fn load(path: &Path, delimiter: Option<u8>, encoding_label: Option<&str>) -> Result<Self> {
        if io_utils::has_extension(path, "xlsx") {
            return Self::load_xlsx(path);
        }
        let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
        let encoding = io_utils::resolve_encoding(encoding_label)?;
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let headers = io_utils::reader_headers(&mut reader, encoding)?;
        let map = HeaderMap::resolve(&headers)
            .with_context(|| format!("Validating headers for {path:?}"))?;

        let mut records = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
            let decoded = io_utils::decode_record(&record, encoding)?;
            records.push(build_record(&map, &decoded, row_idx + 2)?);
        }
        debug!("Loaded {} record(s) from {path:?}", records.len());
        Ok(Self { records })
    }

    fn load_xlsx(path: &Path) -> Result<Self> {
        let mut workbook: Xlsx<_> =
            open_workbook(path).with_context(|| format!("Opening workbook {path:?}"))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| anyhow!("Workbook {path:?} contains no worksheets"))?
            .with_context(|| format!("Reading first worksheet of {path:?}"))?;

        let mut rows = range.rows();
        let headers = rows
            .next()
            .ok_or_else(|| anyhow!("Worksheet in {path:?} is empty"))?
            .iter()
            .map(cell_to_string)
            .collect::<Vec<_>>();
        let map = HeaderMap::resolve(&headers)
            .with_context(|| format!("Validating headers for {path:?}"))?;

        let mut records = Vec::new();
        for (row_idx, row) in rows.enumerate() {
            let cells = row.iter().map(cell_to_string).collect::<Vec<_>>();
            records.push(build_record(&map, &cells, row_idx + 2)?);
        }
        debug!("Loaded {} record(s) from {path:?}", records.len());
        Ok(Self { records })
    }

    /// Builds a dataset from an already-decoded header row and data rows.
    pub fn from_rows<I>(headers: &[String], rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let map = HeaderMap::resolve(headers)?;
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(row_idx, row)| build_record(&map, &row, row_idx + 2))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct non-null primary industry descriptions, sorted. This is the
    /// domain of the segment-selection parameter.
    pub fn distinct_descriptions(&self) -> Vec<String> {
        let mut descriptions = self
            .records
            .iter()
            .filter_map(|record| record.primary_description.as_deref())
            .map(|description| description.to_string())
            .collect::<Vec<_>>();
        descriptions.sort();
        descriptions.dedup();
        descriptions
    }

    /// Checks that `requested` names a description present in the dataset and
    /// returns it trimmed.
    pub fn resolve_description(&self, requested: &str) -> Result<String> {
        let requested = requested.trim();
        let descriptions = self.distinct_descriptions();
        if descriptions.iter().any(|description| description == requested) {
            Ok(requested.to_string())
        } else {
            Err(anyhow!(
                "Industry description '{requested}' not found in the input ({} distinct description(s) available)",
                descriptions.len()
            ))
        }
    }

    /// Filters to the records of one primary industry description (exact
    /// match on the trimmed value).
    pub fn segment(&self, description: &str) -> Segment<'_> {
        let records = self
            .records
            .iter()
            .filter(|record| record.primary_description.as_deref() == Some(description))
            .collect::<Vec<_>>();
        Segment {
            description: description.to_string(),
            records,
        }
    }
}

/// The records of one selected industry description.
#[derive(Debug)]
pub struct Segment<'a> {
    pub description: String,
    pub records: Vec<&'a Record>,
}

impl Segment<'_> {
    /// Count of distinct account ids in the segment.
    pub fn unique_accounts(&self) -> usize {
        let mut ids = self
            .records
            .iter()
            .map(|record| record.account_id.as_str())
            .collect::<Vec<_>>();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}

fn build_record(map: &HeaderMap, cells: &[String], row_number: usize) -> Result<Record> {
    let cell = |idx: usize| cells.get(idx).map(|value| value.trim()).unwrap_or("");
    let optional = |idx: Option<usize>| {
        idx.map(cell)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let account_id = cell(map.account_id);
    if account_id.is_empty() {
        bail!("Row {row_number} has an empty Account Id");
    }

    Ok(Record {
        account_id: account_id.to_string(),
        account_name: cell(map.account_name).to_string(),
        primary_code: optional(Some(map.primary_code)),
        primary_description: optional(Some(map.primary_description)),
        secondary_code: optional(map.secondary_code),
        secondary_description: optional(map.secondary_description),
        product: cell(map.product).to_string(),
    })
}

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(value) => value.trim().to_string(),
        // Spreadsheets store integer-looking codes as floats; render them
        // without the trailing `.0`.
        DataType::Float(value) if value.fract() == 0.0 => format!("{value:.0}"),
        other => other.to_string(),
    }
}
