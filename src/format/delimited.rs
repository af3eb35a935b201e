//! Delimited format implementation.

use super::{FormatError, FormatKind, LineFormat};
use crate::record::Record;

/// Fields in the fixed order `id, firstName, lastName, birthdate`,
/// separated by a single ASCII delimiter.
///
/// Fields holding the delimiter, a quote or a line break are quoted, so
/// every record parses back unchanged.
#[derive(Debug, Clone, Copy)]
pub struct DelimitedFormat {
    delimiter: u8,
}

impl DelimitedFormat {
    pub fn new(delimiter: char) -> Result<Self, FormatError> {
        if !delimiter.is_ascii() || matches!(delimiter, '"' | '\n' | '\r') {
            return Err(FormatError::InvalidDelimiter(delimiter));
        }
        Ok(Self {
            delimiter: delimiter as u8,
        })
    }

    pub fn delimiter(&self) -> char {
        self.delimiter as char
    }
}

impl Default for DelimitedFormat {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl LineFormat for DelimitedFormat {
    fn kind(&self) -> FormatKind {
        FormatKind::Delimited
    }

    fn format(&self, record: &Record) -> Result<String, FormatError> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        let id = record.id().to_string();
        wtr.write_record([
            id.as_str(),
            record.first_name(),
            record.last_name(),
            record.birthdate(),
        ])
        .map_err(|e| FormatError::Serde(Box::new(e)))?;

        let mut bytes = wtr
            .into_inner()
            .map_err(|e| FormatError::Serde(Box::new(e.into_error())))?;
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        String::from_utf8(bytes).map_err(|e| FormatError::Serde(Box::new(e)))
    }

    fn parse(&self, line: &str) -> Result<Record, FormatError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_reader(line.as_bytes());

        let fields = match rdr.records().next() {
            Some(result) => result.map_err(|e| FormatError::Serde(Box::new(e)))?,
            None => return Err(FormatError::Malformed("empty line".into())),
        };

        if fields.len() != 4 {
            return Err(FormatError::Malformed(format!(
                "expected 4 fields, found {}",
                fields.len()
            )));
        }

        let id = fields[0]
            .parse::<i64>()
            .map_err(|e| FormatError::Malformed(format!("invalid id {:?}: {e}", &fields[0])))?;

        Ok(Record::new(id, &fields[1], &fields[2], &fields[3]))
    }
}
