//! I/O utilities for CSV reading, export writing, encoding, and delimiter
//! resolution.
//!
//! All file I/O in sni-gap flows through this module:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Reader construction**: `open_csv_reader_from_path`, with the `-` path
//!   convention routing through stdin.
//! - **Export writing**: comma-separated UTF-8 output prefixed with a
//!   byte-order mark so spreadsheet tools pick up the encoding.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| {
        if has_extension(path, "tsv") {
            DEFAULT_TSV_DELIMITER
        } else {
            DEFAULT_CSV_DELIMITER
        }
    })
}

pub fn open_csv_reader_from_path(
    path: &Path,
    delimiter: u8,
) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    Ok(builder.from_reader(reader))
}

/// Creates a comma-separated export writer. The file starts with a UTF-8
/// byte-order mark and always carries a header row.
pub fn open_export_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    let mut file = BufWriter::new(
        File::create(path).with_context(|| format!("Creating export file {path:?}"))?,
    );
    file.write_all(UTF8_BOM)
        .with_context(|| format!("Writing byte-order mark to {path:?}"))?;
    let mut builder = csv::WriterBuilder::new();
    builder.delimiter(DEFAULT_CSV_DELIMITER).double_quote(true);
    Ok(builder.from_writer(file))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn resolve_input_delimiter_prefers_override_then_extension() {
        let tsv = PathBuf::from("accounts.TSV");
        assert_eq!(resolve_input_delimiter(&tsv, None), b'\t');
        assert_eq!(resolve_input_delimiter(&tsv, Some(b';')), b';');
        assert_eq!(resolve_input_delimiter(&PathBuf::from("accounts.csv"), None), b',');
    }

    #[test]
    fn resolve_encoding_defaults_to_utf8() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(
            resolve_encoding(Some("latin1")).unwrap().name(),
            "windows-1252"
        );
        assert!(resolve_encoding(Some("not-an-encoding")).is_err());
    }

    #[test]
    fn export_writer_emits_byte_order_mark() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("export.csv");
        {
            let mut writer = open_export_writer(&path).expect("open export writer");
            writer
                .write_record(["Product Name", "Antal konton (saknar-top)"])
                .expect("write header");
            writer.flush().expect("flush");
        }
        let bytes = std::fs::read(&path).expect("read export");
        assert!(bytes.starts_with(UTF8_BOM));
        assert!(bytes.ends_with(b"\n"));
    }
}
