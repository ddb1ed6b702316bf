//! Revision dispatcher: maps (record kind, writer revision) to a layout.
//!
//! Every save file declares the revision of the build that wrote it.  Each
//! record kind has changed layout a few times over the years; instead of
//! scattering `if revision <= N` checks through the codecs, the history of
//! every kind lives in [`LAYOUT_TABLE`].  Supporting a new revision means
//! appending one row.
//!
//! # Rules
//! - Rows for one kind are sorted by `since`.  The row with the greatest
//!   `since <= revision` wins.
//! - A revision below the first row of a kind is rejected outright with
//!   [`DecodeError::UnsupportedRevision`].  Nothing is down-converted.
//! - A revision newer than [`CURRENT_REVISION`] resolves to the newest
//!   layout; strict field counting still guards against surprises.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::DecodeError;

/// Writer revision stamped in a save file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(pub u32);

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Files written before this revision carried no usable history and are
/// rejected by every codec.
pub const MIN_SUPPORTED_REVISION: Revision = Revision(369);
/// Revision assumed for a file without a `SAVED_WITH_REVISION` marker.
pub const DEFAULT_REVISION:       Revision = MIN_SUPPORTED_REVISION;
/// Revision written by this build.  Saving always upgrades to it.
pub const CURRENT_REVISION:       Revision = Revision(600);

/// The record kinds whose layout is revision-dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Header,
    Cell,
    Cage,
    CellChange,
}

impl RecordKind {
    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Header     => "grid header",
            RecordKind::Cell       => "cell",
            RecordKind::Cage       => "cage",
            RecordKind::CellChange => "cell change",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named field layouts.  The set is closed; codecs match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Four bare lines `created`, `elapsed`, `gridSize`, `active` with no
    /// tag.  Only found in files without a revision marker; never selected
    /// by the table, the reader recognises it by the missing record tag.
    HeaderUntaggedLines,
    /// `GRID:active:revealed:statistics` where the last field is the
    /// `seed,created,elapsed,` block (often just a single value).
    HeaderLegacy,
    /// `GRID:active:revealed`
    HeaderModern,
    /// `CELL:id:row:col:cageText:correct:entered:candidates:invalid:revealed:selected`
    CellWithCoordinates,
    /// `CELL:id:cageText:correct:entered:candidates:invalid:revealed:selected`
    CellImplicitCoordinates,
    /// `CAGE:id:operator:result:cells:hidden`
    CageExplicitCells,
    /// `CELL_CHANGE:[cell:previous:candidates:[nested],...]`
    CellChangeNested,
}

impl Layout {
    /// Number of level-1 fields, tag included.  For nested cell changes this
    /// is the count of fixed leading fields inside one bracket pair.
    pub fn field_count(self) -> usize {
        match self {
            Layout::HeaderUntaggedLines     => 4,
            Layout::HeaderLegacy            => 4,
            Layout::HeaderModern            => 3,
            Layout::CellWithCoordinates     => 11,
            Layout::CellImplicitCoordinates => 9,
            Layout::CageExplicitCells       => 6,
            Layout::CellChangeNested        => 3,
        }
    }

    /// Number of physical lines the record occupies on disk.
    pub fn physical_lines(self) -> usize {
        match self {
            Layout::HeaderUntaggedLines => 4,
            _                           => 1,
        }
    }
}

/// One row of the dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct LayoutRow {
    pub kind:   RecordKind,
    pub since:  Revision,
    pub layout: Layout,
}

const fn row(kind: RecordKind, since: u32, layout: Layout) -> LayoutRow {
    LayoutRow { kind, since: Revision(since), layout }
}

/// Layout history of every record kind.
pub static LAYOUT_TABLE: &[LayoutRow] = &[
    row(RecordKind::Header,     369, Layout::HeaderLegacy),
    row(RecordKind::Header,     596, Layout::HeaderModern),
    row(RecordKind::Cell,       369, Layout::CellWithCoordinates),
    row(RecordKind::Cell,       597, Layout::CellImplicitCoordinates),
    row(RecordKind::Cage,       369, Layout::CageExplicitCells),
    row(RecordKind::CellChange, 369, Layout::CellChangeNested),
];

/// Lowest revision any layout of `kind` accepts.
pub fn floor(kind: RecordKind) -> Revision {
    LAYOUT_TABLE
        .iter()
        .filter(|r| r.kind == kind)
        .map(|r| r.since)
        .min()
        .unwrap_or(MIN_SUPPORTED_REVISION)
}

/// Resolve the layout of `kind` for a file written with `revision`.
pub fn layout_for(kind: RecordKind, revision: Revision) -> Result<Layout, DecodeError> {
    let found = LAYOUT_TABLE
        .iter()
        .filter(|r| r.kind == kind && r.since <= revision)
        .max_by_key(|r| r.since);

    match found {
        Some(r) => Ok(r.layout),
        None => Err(DecodeError::UnsupportedRevision {
            kind,
            revision,
            floor: floor(kind),
        }),
    }
}

/// Layout the writer emits for `kind`.
pub fn current_layout(kind: RecordKind) -> Layout {
    // The table always has a row at or below CURRENT_REVISION for every kind.
    layout_for(kind, CURRENT_REVISION).unwrap_or(match kind {
        RecordKind::Header     => Layout::HeaderModern,
        RecordKind::Cell       => Layout::CellImplicitCoordinates,
        RecordKind::Cage       => Layout::CageExplicitCells,
        RecordKind::CellChange => Layout::CellChangeNested,
    })
}

/// Check a declared file revision against the global floor.
pub fn check_supported(revision: Revision) -> Result<(), DecodeError> {
    if revision < MIN_SUPPORTED_REVISION {
        return Err(DecodeError::UnsupportedRevision {
            kind: RecordKind::Header,
            revision,
            floor: MIN_SUPPORTED_REVISION,
        });
    }
    if revision > CURRENT_REVISION {
        log::warn!(
            "save file written by newer build ({revision}, this build writes {CURRENT_REVISION}); \
             decoding with the newest known layouts"
        );
    }
    Ok(())
}
