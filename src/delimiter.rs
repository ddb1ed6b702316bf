//! Delimiter registry shared by every record codec.
//!
//! # Stability
//! These characters are part of the on-disk contract.  Changing any of them
//! breaks every save file ever written; they are frozen.
//!
//! | Level  | Char | Separates                                   |
//! |--------|------|---------------------------------------------|
//! | record | `\n` | one record (line) from the next             |
//! | 1      | `:`  | fields within a record                      |
//! | 2      | `,`  | values within a list-valued field           |
//!
//! Lists are written with a trailing level-2 separator after *every*
//! element (`4,5,6,` never `4,5,6`).  Move records additionally use a
//! bracket pair to nest related moves.

use std::collections::BTreeSet;
use std::str::FromStr;

/// Separates records.  A file is a sequence of `RECORD_SEPARATOR`-terminated lines.
pub const RECORD_SEPARATOR: char = '\n';
/// Level-1 separator between fields of one record.
pub const FIELD_SEPARATOR:  char = ':';
/// Level-2 separator between values of a list-valued field.
pub const VALUE_SEPARATOR:  char = ',';
/// Opens a nested move record.
pub const NESTED_OPEN:      char = '[';
/// Closes a nested move record.
pub const NESTED_CLOSE:     char = ']';

/// Returns `true` if `c` is one of the reserved delimiter characters.
pub fn is_reserved(c: char) -> bool {
    matches!(
        c,
        RECORD_SEPARATOR | FIELD_SEPARATOR | VALUE_SEPARATOR | NESTED_OPEN | NESTED_CLOSE
    )
}

/// Append `values` to `out`, each one followed by [`VALUE_SEPARATOR`].
pub fn write_value_list<'a, T, I>(out: &mut String, values: I)
where
    T: std::fmt::Display + 'a,
    I: IntoIterator<Item = &'a T>,
{
    for v in values {
        out.push_str(&format!("{v}{VALUE_SEPARATOR}"));
    }
}

/// Why a level-2 list could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// Element is not a valid number.
    Invalid(String),
    /// An element between two separators is empty (`4,,5,`).
    Empty,
}

/// Parse a level-2 list.
///
/// The canonical form carries a trailing separator; older writers sometimes
/// left it out, so both `4,5,6,` and `4,5,6` are accepted.  An empty field
/// is an empty list.
pub fn parse_value_list<T: FromStr>(field: &str) -> Result<Vec<T>, ListError> {
    if field.is_empty() {
        return Ok(Vec::new());
    }
    let body = field.strip_suffix(VALUE_SEPARATOR).unwrap_or(field);
    body.split(VALUE_SEPARATOR)
        .map(|v| {
            if v.is_empty() {
                Err(ListError::Empty)
            } else {
                v.parse::<T>().map_err(|_| ListError::Invalid(v.to_owned()))
            }
        })
        .collect()
}

/// Parse a level-2 list into a set, reporting the first duplicate value.
pub fn parse_value_set(field: &str) -> Result<BTreeSet<u32>, SetError> {
    let values: Vec<u32> = parse_value_list(field).map_err(SetError::List)?;
    let mut set = BTreeSet::new();
    for v in values {
        if !set.insert(v) {
            return Err(SetError::Duplicate(v));
        }
    }
    Ok(set)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetError {
    List(ListError),
    Duplicate(u32),
}
