use crate::error::{AnalysisError, Result};
use polars::prelude::{Column, DataFrame};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Cell contents that load as missing values.
///
/// Matched against the raw field, so a cell holding only whitespace is a
/// value, not a missing marker.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Text encoding of the input file.
///
/// The start-up data set is published in ISO-8859-1, so `Latin1` is the
/// default. Latin-1 assigns a character to every byte value, which means
/// decoding in that mode cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Latin1,
    Utf8,
}

impl Encoding {
    /// Canonical name of the encoding, as shown in the report header.
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Latin1 => "ISO-8859-1",
            Encoding::Utf8 => "UTF-8",
        }
    }

    /// Decodes raw file bytes, returning the offset of the first invalid
    /// byte on failure.
    fn decode(&self, bytes: Vec<u8>) -> std::result::Result<String, usize> {
        match self {
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Encoding::Utf8 => String::from_utf8(bytes).map_err(|e| e.utf8_error().valid_up_to()),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Ok(Encoding::Latin1),
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            other => Err(anyhow::anyhow!(
                "unsupported encoding '{}' (expected latin1 or utf-8)",
                other
            )),
        }
    }
}

/// Loads delimited start-up records from disk into a polars [`DataFrame`].
///
/// The whole file is read into memory in one call, so the file handle is
/// closed before parsing starts regardless of the outcome. Every column is
/// loaded as a string column; missing markers become nulls.
///
/// # Fields
/// * `encoding`: How the file bytes are decoded before CSV parsing
pub struct DataIngestion {
    encoding: Encoding,
}

impl DataIngestion {
    /// Creates a loader for files in the given encoding.
    ///
    /// # Arguments
    /// * `encoding` - Text encoding of the input file, usually [`Encoding::Latin1`]
    ///
    /// # Returns
    /// A `DataIngestion` ready to load any number of files
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    /// Reads a comma-separated file with a header row.
    ///
    /// Header names are trimmed. Rows keep their input order and every
    /// input column is retained as a string column, in header order.
    ///
    /// # Arguments
    /// * `path` - Location of the CSV file
    ///
    /// # Returns
    /// A `DataFrame` with one row per record
    ///
    /// # Errors
    /// - `FileAccess` if the file cannot be read
    /// - `Decoding` if the bytes do not conform to the configured encoding
    /// - `Format` if the content is not well-formed CSV (including rows
    ///   whose field count differs from the header)
    /// - `Frame` if the header repeats a column name
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        let bytes = std::fs::read(path).map_err(|source| AnalysisError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

        let text = self
            .encoding
            .decode(bytes)
            .map_err(|offset| AnalysisError::Decoding {
                path: path.to_path_buf(),
                encoding: self.encoding.name(),
                offset,
            })?;

        let format_error = |source| AnalysisError::Format {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(format_error)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record.map_err(format_error)?;
            for (column, raw) in cells.iter_mut().zip(record.iter()) {
                column.push(parse_cell(raw));
            }
        }

        let columns: Vec<Column> = headers
            .iter()
            .zip(cells)
            .map(|(name, values)| Column::new(name.as_str().into(), values))
            .collect();
        let frame = DataFrame::new(columns)?;

        if frame.height() == 0 {
            warn!(path = %path.display(), "input file has a header but no records");
        }
        info!(
            path = %path.display(),
            encoding = %self.encoding,
            rows = frame.height(),
            columns = frame.width(),
            "loaded start-up records"
        );

        Ok(frame)
    }
}

fn parse_cell(raw: &str) -> Option<String> {
    if MISSING_MARKERS.contains(&raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_fixture(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_latin1_with_non_ascii() {
        let mut bytes = b"name, market ,status\n".to_vec();
        bytes.extend_from_slice(b"Caf\xe9 Ltd,Food,operating\n");
        let file = write_fixture(&bytes);

        let frame = DataIngestion::new(Encoding::Latin1)
            .load_csv(file.path())
            .unwrap();

        assert_eq!(frame.get_column_names()[1].as_str(), "market");
        assert_eq!(frame.height(), 1);
        let names = frame.column("name").unwrap().str().unwrap();
        assert_eq!(names.get(0), Some("Café Ltd"));
    }

    #[test]
    fn test_utf8_rejects_latin1_bytes() {
        let file = write_fixture(b"name,market\nCaf\xe9,Food\n");

        let err = DataIngestion::new(Encoding::Utf8)
            .load_csv(file.path())
            .unwrap_err();

        match err {
            AnalysisError::Decoding { offset, encoding, .. } => {
                assert_eq!(offset, 15);
                assert_eq!(encoding, "UTF-8");
            }
            other => panic!("expected decoding error, got {other:?}"),
        }
    }

    fn strings(frame: &DataFrame, name: &str) -> Vec<Option<String>> {
        frame
            .column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|cell| cell.map(String::from))
            .collect()
    }

    #[test]
    fn test_missing_markers_load_as_null() {
        let file = write_fixture(
            b"market,status,funding_total_usd\n,NA,1000\nGames,None,nan\n<NA>,n/a,-nan\n",
        );

        let frame = DataIngestion::new(Encoding::Latin1)
            .load_csv(file.path())
            .unwrap();

        assert_eq!(strings(&frame, "market"), vec![None, Some("Games".into()), None]);
        assert_eq!(strings(&frame, "status"), vec![None, None, None]);
        assert_eq!(
            strings(&frame, "funding_total_usd"),
            vec![Some("1000".into()), None, None]
        );
    }

    #[test]
    fn test_whitespace_cell_is_a_value() {
        let file = write_fixture(b"market,status\nGames, \n NA,operating\n");

        let frame = DataIngestion::new(Encoding::Latin1)
            .load_csv(file.path())
            .unwrap();

        assert_eq!(strings(&frame, "status"), vec![Some(" ".into()), Some("operating".into())]);
        assert_eq!(strings(&frame, "market"), vec![Some("Games".into()), Some(" NA".into())]);
    }

    #[test]
    fn test_duplicate_header_is_frame_error() {
        let file = write_fixture(b"market,market\nGames,Web\n");

        let err = DataIngestion::new(Encoding::Latin1)
            .load_csv(file.path())
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Frame(_)));
    }

    #[test]
    fn test_ragged_row_is_format_error() {
        let file = write_fixture(b"market,status\nGames,operating,extra\n");

        let err = DataIngestion::new(Encoding::Latin1)
            .load_csv(file.path())
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Format { .. }));
    }

    #[test]
    fn test_missing_file_is_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataIngestion::new(Encoding::Latin1)
            .load_csv(&dir.path().join("absent.csv"))
            .unwrap_err();

        assert!(matches!(err, AnalysisError::FileAccess { .. }));
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("ISO-8859-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert_eq!("utf-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert!("ebcdic".parse::<Encoding>().is_err());
    }
}
