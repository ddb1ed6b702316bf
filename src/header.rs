//! `GRID` header record.
//!
//! Builds before r596 also stored a game seed, the creation time and the
//! elapsed time in the header.  Those moved to the statistics store; they are
//! still decoded so callers can migrate them, but never written back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::{parse_flag, parse_number, split_record, DecodeError, Fields, Malformation, RecordTag};
use crate::delimiter::{parse_value_list, ListError, FIELD_SEPARATOR, RECORD_SEPARATOR, VALUE_SEPARATOR};
use crate::revision::{layout_for, Layout, RecordKind, Revision};

/// Number of values in the legacy statistics block.
const LEGACY_STAT_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridHeader {
    /// Game still in progress.
    pub active:   bool,
    /// Solution was revealed.
    pub revealed: bool,
}

/// Statistics stored inline by old headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LegacyStatistics {
    pub game_seed:      i64,
    pub created_millis: i64,
    pub elapsed_millis: i64,
}

impl LegacyStatistics {
    /// Creation time, or `None` when the stored value is out of range.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.created_millis)
    }
}

/// Result of decoding a header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedHeader {
    pub header:            GridHeader,
    pub legacy_statistics: Option<LegacyStatistics>,
}

impl GridHeader {
    /// Decode one logical header line.  For [`Layout::HeaderUntaggedLines`]
    /// files the caller joins the physical lines first, see
    /// [`coalesce_untagged_header`].
    pub fn decode(line: &str, revision: Revision) -> Result<DecodedHeader, DecodeError> {
        let layout = layout_for(RecordKind::Header, revision)?;
        let fields = split_record(line, RecordTag::Grid, layout.field_count())?;
        let mut f = Fields::new(line, fields);

        let header = GridHeader {
            active:   f.flag("active")?,
            revealed: f.flag("revealed")?,
        };

        let legacy_statistics = match layout {
            Layout::HeaderLegacy => Some(decode_statistics(line, f.raw())?),
            _ => None,
        };

        Ok(DecodedHeader { header, legacy_statistics })
    }

    /// Always the modern layout.
    pub fn encode(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            RecordTag::Grid,
            self.active,
            self.revealed,
            sep = FIELD_SEPARATOR
        )
    }
}

fn decode_statistics(line: &str, raw: &str) -> Result<LegacyStatistics, DecodeError> {
    const FIELD: &str = "statistics";

    let values: Vec<i64> = parse_value_list(raw).map_err(|e| {
        DecodeError::malformed(
            line,
            match e {
                ListError::Empty      => Malformation::EmptyListElement { field: FIELD },
                ListError::Invalid(v) => Malformation::InvalidNumber { field: FIELD, value: v },
            },
        )
    })?;
    if values.len() > LEGACY_STAT_COUNT {
        return Err(DecodeError::malformed(
            line,
            Malformation::TooManyValues { field: FIELD, max: LEGACY_STAT_COUNT },
        ));
    }

    // Some builds wrote only the seed; absent values are zero.
    let at = |i: usize| values.get(i).copied().unwrap_or(0);
    Ok(LegacyStatistics {
        game_seed:      at(0),
        created_millis: at(1),
        elapsed_millis: at(2),
    })
}

/// Rewrite the four bare header lines of a marker-less file
/// (`created`, `elapsed`, `gridSize`, `active`) as a legacy `GRID` line.
///
/// Those files never stored a seed or a revealed flag; both become zero /
/// `false`.  The grid size is checked for shape only, the caller owns it.
pub fn coalesce_untagged_header(lines: &[&str]) -> Result<String, DecodeError> {
    let joined = lines.join(&RECORD_SEPARATOR.to_string());
    let [created, elapsed, grid_size, active] = lines else {
        return Err(DecodeError::malformed(
            &joined,
            Malformation::FieldCount {
                expected: Layout::HeaderUntaggedLines.physical_lines(),
                actual:   lines.len(),
            },
        ));
    };

    let created: i64 = parse_number(&joined, "created", created)?;
    let elapsed: i64 = parse_number(&joined, "elapsed", elapsed)?;
    let _: usize = parse_number(&joined, "grid size", grid_size)?;
    let active = parse_flag(&joined, "active", active)?;

    let sep = FIELD_SEPARATOR;
    let val = VALUE_SEPARATOR;
    Ok(format!("{}{sep}{active}{sep}false{sep}0{val}{created}{val}{elapsed}{val}", RecordTag::Grid))
}
