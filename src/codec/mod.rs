//! Record registry: frozen line tags, the decode error taxonomy, and the
//! field-splitting helpers every record codec shares.
//!
//! # Tag rules
//! Every line starts with an uppercase tag followed by
//! [`FIELD_SEPARATOR`](crate::delimiter::FIELD_SEPARATOR).  The tag alone
//! decides which codec owns the line; codecs never guess.  Tags are never
//! reused or renamed.

use thiserror::Error;

use crate::delimiter::FIELD_SEPARATOR;
use crate::revision::{RecordKind, Revision};

// ── Frozen tags ──────────────────────────────────────────────────────────────

/// Runtime tag discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordTag {
    RevisionMarker,
    Grid,
    Cell,
    Cage,
    CellChange,
}

impl RecordTag {
    /// The literal written at the start of the line.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            RecordTag::RevisionMarker => "SAVED_WITH_REVISION",
            RecordTag::Grid           => "GRID",
            RecordTag::Cell           => "CELL",
            RecordTag::Cage           => "CAGE",
            RecordTag::CellChange     => "CELL_CHANGE",
        }
    }

    /// Resolve a literal tag.  Returns `None` for anything this build does
    /// not know.
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "SAVED_WITH_REVISION" => Some(RecordTag::RevisionMarker),
            "GRID"                => Some(RecordTag::Grid),
            "CELL"                => Some(RecordTag::Cell),
            "CAGE"                => Some(RecordTag::Cage),
            "CELL_CHANGE"         => Some(RecordTag::CellChange),
            _                     => None,
        }
    }

    /// Tag of `line`, i.e. the text before the first field separator.
    pub fn of_line(line: &str) -> Option<Self> {
        Self::from_name(raw_tag(line))
    }
}

impl std::fmt::Display for RecordTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text before the first field separator (the whole line if there is none).
pub fn raw_tag(line: &str) -> &str {
    line.split(FIELD_SEPARATOR).next().unwrap_or("")
}

// ── Error type ───────────────────────────────────────────────────────────────

/// What exactly is wrong with a record that has the right tag.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Malformation {
    #[error("expected {expected} fields, found {actual}")]
    FieldCount { expected: usize, actual: usize },
    #[error("field `{field}` is not a number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("field `{field}` is not `true` or `false`: '{value}'")]
    InvalidFlag { field: &'static str, value: String },
    #[error("field `{field}` contains an empty list element")]
    EmptyListElement { field: &'static str },
    #[error("field `{field}` lists {value} more than once")]
    DuplicateValue { field: &'static str, value: u64 },
    #[error("field `{field}` holds more than {max} values")]
    TooManyValues { field: &'static str, max: usize },
    #[error("field `{field}` contains the delimiter '{found}'")]
    ReservedCharacter { field: &'static str, found: char },
    #[error("unknown cage operator id '{0}'")]
    UnknownOperator(String),
    #[error("bracket inside a leading field at byte {position}")]
    MisplacedBracket { position: usize },
    #[error("stray field at byte {position}")]
    StrayField { position: usize },
    #[error("nested record not followed by ',' at byte {position}")]
    MissingSeparator { position: usize },
    #[error("unexpected characters after the record at byte {position}")]
    TrailingCharacters { position: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected a {expected} record, found tag '{found}'")]
    WrongRecordType { expected: RecordTag, found: String },

    #[error("malformed record ({problem}): {line}")]
    MalformedRecord { line: String, problem: Malformation },

    /// The file was written before the oldest layout this build knows.
    /// Decoding MUST NOT continue.
    #[error("{kind} records written by {revision} are not supported (oldest supported is {floor})")]
    UnsupportedRevision { kind: RecordKind, revision: Revision, floor: Revision },

    #[error("unbalanced nesting at byte {position}: {line}")]
    UnbalancedNesting { line: String, position: usize },

    #[error("nesting deeper than {limit} levels: {line}")]
    NestingTooDeep { line: String, limit: usize },

    #[error("reference to cell {cell_id}, grid has {cell_count} cells")]
    DanglingCellReference { cell_id: usize, cell_count: usize },
}

impl DecodeError {
    pub(crate) fn malformed(line: &str, problem: Malformation) -> Self {
        DecodeError::MalformedRecord { line: line.to_owned(), problem }
    }
}

// ── Field helpers ────────────────────────────────────────────────────────────

/// Split `line` into level-1 fields after checking its tag and field count.
///
/// Returns all fields, tag included, so indices match the layout tables.
pub fn split_record<'a>(
    line:     &'a str,
    tag:      RecordTag,
    expected: usize,
) -> Result<Vec<&'a str>, DecodeError> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields[0] != tag.as_str() {
        return Err(DecodeError::WrongRecordType {
            expected: tag,
            found:    fields[0].to_owned(),
        });
    }
    if fields.len() != expected {
        return Err(DecodeError::malformed(
            line,
            Malformation::FieldCount { expected, actual: fields.len() },
        ));
    }
    Ok(fields)
}

/// Cursor over the fields of one record; reports failures against the line.
pub struct Fields<'a> {
    line:   &'a str,
    fields: Vec<&'a str>,
    next:   usize,
}

impl<'a> Fields<'a> {
    /// Positioned on the first field after the tag.
    pub fn new(line: &'a str, fields: Vec<&'a str>) -> Self {
        Self { line, fields, next: 1 }
    }

    pub fn raw(&mut self) -> &'a str {
        let f = self.fields.get(self.next).copied().unwrap_or("");
        self.next += 1;
        f
    }

    pub fn number<T: std::str::FromStr>(&mut self, field: &'static str) -> Result<T, DecodeError> {
        let line = self.line;
        let raw = self.raw();
        parse_number(line, field, raw)
    }

    pub fn flag(&mut self, field: &'static str) -> Result<bool, DecodeError> {
        let line = self.line;
        let raw = self.raw();
        parse_flag(line, field, raw)
    }

    /// Entered-value style field where `0` means "no value".  Unlike move
    /// records, cell lines always spell the sentinel out.
    pub fn optional_value(&mut self, field: &'static str) -> Result<Option<u32>, DecodeError> {
        let line = self.line;
        let raw = self.raw();
        let v: u32 = parse_number(line, field, raw)?;
        Ok(if v == 0 { None } else { Some(v) })
    }

    pub fn value_set(&mut self, field: &'static str) -> Result<std::collections::BTreeSet<u32>, DecodeError> {
        let line = self.line;
        let raw = self.raw();
        parse_value_set(line, field, raw)
    }
}

pub fn parse_number<T: std::str::FromStr>(
    line:  &str,
    field: &'static str,
    raw:   &str,
) -> Result<T, DecodeError> {
    // `FromStr` for integers accepts a leading '+'; the format never writes one.
    if raw.starts_with('+') {
        return Err(DecodeError::malformed(
            line,
            Malformation::InvalidNumber { field, value: raw.to_owned() },
        ));
    }
    raw.parse::<T>().map_err(|_| {
        DecodeError::malformed(line, Malformation::InvalidNumber { field, value: raw.to_owned() })
    })
}

pub fn parse_flag(line: &str, field: &'static str, raw: &str) -> Result<bool, DecodeError> {
    match raw {
        "true"  => Ok(true),
        "false" => Ok(false),
        _ => Err(DecodeError::malformed(
            line,
            Malformation::InvalidFlag { field, value: raw.to_owned() },
        )),
    }
}

/// `0` (and, in move records, the empty string) is the "no value" sentinel.
pub fn parse_optional_value(
    line:  &str,
    field: &'static str,
    raw:   &str,
) -> Result<Option<u32>, DecodeError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let v: u32 = parse_number(line, field, raw)?;
    Ok(if v == 0 { None } else { Some(v) })
}

/// Inverse of [`parse_optional_value`].
pub fn optional_value_str(v: Option<u32>) -> String {
    v.unwrap_or(0).to_string()
}

pub fn parse_value_set(
    line:  &str,
    field: &'static str,
    raw:   &str,
) -> Result<std::collections::BTreeSet<u32>, DecodeError> {
    use crate::delimiter::{ListError, SetError};

    crate::delimiter::parse_value_set(raw).map_err(|e| {
        let problem = match e {
            SetError::List(ListError::Empty)      => Malformation::EmptyListElement { field },
            SetError::List(ListError::Invalid(v)) => Malformation::InvalidNumber { field, value: v },
            SetError::Duplicate(v)                => Malformation::DuplicateValue { field, value: v as u64 },
        };
        DecodeError::malformed(line, problem)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_lookup() {
        assert_eq!(RecordTag::of_line("CELL:1:2"), Some(RecordTag::Cell));
        assert_eq!(RecordTag::of_line("CELL_CHANGE:[0:1::]"), Some(RecordTag::CellChange));
        assert_eq!(RecordTag::of_line("SAVED_WITH_REVISION:600"), Some(RecordTag::RevisionMarker));
        assert_eq!(RecordTag::of_line("VIEW.v5:1:2"), None);
        assert_eq!(RecordTag::of_line(""), None);
        for tag in [RecordTag::Grid, RecordTag::Cell, RecordTag::Cage, RecordTag::CellChange] {
            assert_eq!(RecordTag::from_name(tag.as_str()), Some(tag));
        }
    }

    #[test]
    fn split_checks_tag_before_count() {
        let err = split_record("CAGE:1", RecordTag::Cell, 9).unwrap_err();
        assert_eq!(
            err,
            DecodeError::WrongRecordType { expected: RecordTag::Cell, found: "CAGE".into() }
        );
    }

    #[test]
    fn split_reports_counts() {
        let err = split_record("CELL:1:2", RecordTag::Cell, 9).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedRecord {
                line: "CELL:1:2".into(),
                problem: Malformation::FieldCount { expected: 9, actual: 3 },
            }
        );
    }

    #[test]
    fn numbers_and_flags_are_strict() {
        assert!(parse_number::<u32>("l", "f", "+3").is_err());
        assert!(parse_number::<u32>("l", "f", "-3").is_err());
        assert!(parse_number::<u32>("l", "f", "").is_err());
        assert_eq!(parse_number::<u32>("l", "f", "42").unwrap(), 42);
        assert!(parse_flag("l", "f", "TRUE").is_err());
        assert!(parse_flag("l", "f", "1").is_err());
        assert!(parse_flag("l", "f", "false").is_ok());
    }

    #[test]
    fn optional_value_sentinel() {
        assert_eq!(parse_optional_value("l", "f", "0").unwrap(), None);
        assert_eq!(parse_optional_value("l", "f", "").unwrap(), None);
        assert_eq!(parse_optional_value("l", "f", "7").unwrap(), Some(7));
        assert_eq!(optional_value_str(None), "0");
        assert_eq!(optional_value_str(Some(7)), "7");
    }
}
