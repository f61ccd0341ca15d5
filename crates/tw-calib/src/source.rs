//! Calibration sources: the query surface tables are built from, plus an
//! in-memory implementation readable from the standard CSV layout.
//!
//! ```text
//! CSVv2;OperatingPoint, measurementType, sysType, jetFlavor, etaMin, etaMax, ptMin, ptMax, discrMin, discrMax, formula
//! 0, comb, central, 0, 0, 2.4, 30, 670, 0, 1, "0.9*((1.+(0.05*x))/(1.+(0.046*x)))"
//! ```

use std::io::Read;
use std::path::Path;

use tw_core::{Category, Error, OperatingPoint, Result, Variation};

use crate::entry::CalibrationEntry;

/// Selection applied when building a table.
#[derive(Debug, Clone, Copy)]
pub struct EntryQuery<'a> {
    /// Operating point.
    pub operating_point: OperatingPoint,
    /// Flavour category.
    pub category: Category,
    /// Systematic variation.
    pub variation: Variation,
    /// Measurement type.
    pub measurement_type: &'a str,
}

impl EntryQuery<'_> {
    /// True when `entry` carries exactly the requested tags.
    pub fn matches(&self, entry: &CalibrationEntry) -> bool {
        let key = &entry.key;
        key.operating_point == self.operating_point
            && key.category == self.category
            && key.sys_type == self.variation.as_str()
            && key.measurement_type == self.measurement_type
    }
}

/// Anything that can answer calibration-row queries.
pub trait CalibrationSource: Send + Sync {
    /// Tagger the rows belong to.
    fn tagger(&self) -> &str;

    /// Rows matching `query`, in source order.
    fn select(&self, query: &EntryQuery<'_>) -> Vec<&CalibrationEntry>;
}

/// An in-memory set of calibration rows for one tagger.
#[derive(Debug, Clone, Default)]
pub struct CalibrationSet {
    tagger: String,
    entries: Vec<CalibrationEntry>,
}

impl CalibrationSet {
    /// Create an empty set.
    pub fn new(tagger: impl Into<String>) -> Self {
        Self { tagger: tagger.into(), entries: Vec::new() }
    }

    /// Add an entry.
    pub fn push(&mut self, entry: CalibrationEntry) {
        self.entries.push(entry);
    }

    /// Add an entry (builder style).
    pub fn with_entry(mut self, entry: CalibrationEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// All rows in source order.
    pub fn entries(&self) -> &[CalibrationEntry] {
        &self.entries
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the set has no rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a calibration CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {e}", path.display())))
        })?;
        let set = Self::from_csv_reader(file)?;
        log::info!(
            "read {} calibration rows for tagger '{}' from {}",
            set.len(),
            set.tagger,
            path.display()
        );
        Ok(set)
    }

    /// Read calibration CSV text.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        Self::from_csv_reader(text.as_bytes())
    }

    /// Read calibration CSV from any reader.
    ///
    /// The first line is the header; the tagger name precedes its `;`.
    /// Blank lines and lines starting with `#` are skipped.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let tagger = rdr
            .headers()
            .map_err(csv_error)?
            .get(0)
            .and_then(|h| h.split_once(';'))
            .map(|(tagger, _)| tagger.trim().to_string())
            .unwrap_or_default();

        let mut set = Self::new(tagger);
        for record in rdr.records() {
            let record = record.map_err(csv_error)?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let fields: Vec<&str> = record.iter().collect();
            let entry = CalibrationEntry::from_fields(&fields).map_err(|e| match e {
                Error::Parse(msg) => Error::Parse(format!("line {line}: {msg}")),
                other => other,
            })?;
            set.push(entry);
        }
        Ok(set)
    }
}

impl CalibrationSource for CalibrationSet {
    fn tagger(&self) -> &str {
        &self.tagger
    }

    fn select(&self, query: &EntryQuery<'_>) -> Vec<&CalibrationEntry> {
        self.entries.iter().filter(|e| query.matches(e)).collect()
    }
}

fn csv_error(err: csv::Error) -> Error {
    let msg = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => Error::Io(io),
        _ => Error::Parse(msg),
    }
}
