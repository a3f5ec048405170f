// src/process/read.rs

use anyhow::{bail, Context, Result};
use arrow::{
    compute::concat_batches,
    csv::{reader::Format, ReaderBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use encoding_rs::mem::decode_latin1;
use std::{
    fmt, fs,
    fs::File,
    io::{BufRead, BufReader, Cursor},
    path::Path,
    sync::Arc,
};
use tracing::{debug, info};

const BATCH_SIZE: usize = 8_192;

/// Encoding a source file was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Latin1,
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceEncoding::Utf8 => write!(f, "utf-8"),
            SourceEncoding::Latin1 => write!(f, "latin-1"),
        }
    }
}

#[derive(Debug)]
pub struct DecodedText {
    pub text: String,
    pub encoding: SourceEncoding,
}

/// Decode as UTF-8 (dropping a BOM), falling back to ISO-8859-1, which maps
/// every byte and cannot fail.
pub fn decode_bytes(bytes: &[u8]) -> DecodedText {
    match std::str::from_utf8(bytes) {
        Ok(s) => DecodedText {
            text: s.strip_prefix('\u{feff}').unwrap_or(s).to_string(),
            encoding: SourceEncoding::Utf8,
        },
        Err(e) => {
            debug!("not valid utf-8 ({}), decoding as latin-1", e);
            DecodedText {
                text: decode_latin1(bytes).into_owned(),
                encoding: SourceEncoding::Latin1,
            }
        }
    }
}

/// Read a whole file, decoding it with the UTF-8 → latin-1 fallback.
pub fn read_with_fallback<P: AsRef<Path>>(path: P) -> Result<DecodedText> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("reading {:?}", path))?;
    let decoded = decode_bytes(&bytes);
    if decoded.encoding == SourceEncoding::Latin1 {
        info!(path = %path.display(), "file read with latin-1 encoding");
    }
    Ok(decoded)
}

/// Header row of CSV text.
pub fn parse_headers(text: &str) -> Result<Vec<String>> {
    let (schema, _) = Format::default()
        .with_header(true)
        .infer_schema(Cursor::new(text.as_bytes()), Some(0))
        .context("reading CSV header")?;
    let headers: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
    if headers.is_empty() {
        bail!("no header row");
    }
    Ok(headers)
}

/// Parse CSV text into a single batch of nullable `Utf8` columns.
/// Short rows are padded with nulls; rows with extra fields are an error.
pub fn parse_csv_batch(text: &str) -> Result<RecordBatch> {
    let headers = parse_headers(text)?;
    let fields: Vec<Field> = headers
        .iter()
        .map(|n| Field::new(n, DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .with_truncated_rows(true)
        .build(Cursor::new(text.as_bytes()))
        .context("creating CSV reader")?;

    let batches = reader
        .collect::<Result<Vec<RecordBatch>, _>>()
        .context("reading CSV records")?;
    concat_batches(&schema, &batches).context("joining CSV batches")
}

/// Header row of a file on disk. Only the first line is read.
pub fn read_headers<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {:?}", path))?;
    let mut line = Vec::new();
    BufReader::new(file)
        .read_until(b'\n', &mut line)
        .with_context(|| format!("reading header of {:?}", path))?;
    let decoded = decode_bytes(&line);
    parse_headers(&decoded.text).with_context(|| format!("parsing header of {:?}", path))
}

/// Whole file as a raw batch.
pub fn read_batch<P: AsRef<Path>>(path: P) -> Result<RecordBatch> {
    let path = path.as_ref();
    let decoded = read_with_fallback(path)?;
    parse_csv_batch(&decoded.text).with_context(|| format!("parsing {:?}", path))
}
