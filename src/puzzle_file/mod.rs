//! A whole puzzle save file.
//!
//! # Record order
//! ```text
//! SAVED_WITH_REVISION:<n>      optional, defaults to r369 when absent
//! GRID:...                     header (four untagged lines in marker-less files)
//! CELL:...   × size²           row-major, ids 0..size²
//! CAGE:...   × 1..
//! CELL_CHANGE:... × 0..        undo history, oldest first
//! ```
//!
//! The grid size is not stored in the file; the caller knows it from the
//! game type and passes it in.  Writing always produces the current layout
//! of every record, so loading an old file and saving it upgrades it.

mod reader;

use std::fmt;
use std::io::{self, BufRead, Write};

use serde::Serialize;
use thiserror::Error;

use crate::cage::Cage;
use crate::cell::Cell;
use crate::cell_change::MoveRecord;
use crate::codec::{DecodeError, RecordTag};
use crate::delimiter::{FIELD_SEPARATOR, RECORD_SEPARATOR};
use crate::header::{DecodedHeader, GridHeader, LegacyStatistics};
use crate::revision::{Revision, CURRENT_REVISION};

use reader::Reader;

/// Largest grid the game offers.
pub const MAX_GRID_SIZE: usize = 9;

// ── Errors ───────────────────────────────────────────────────────────────────

/// File section being read when input ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    RevisionMarker,
    Header,
    Cells,
    Cages,
    Moves,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Section::RevisionMarker => "revision marker",
            Section::Header         => "grid header",
            Section::Cells          => "cells",
            Section::Cages          => "cages",
            Section::Moves          => "moves",
        })
    }
}

#[derive(Error, Debug)]
pub enum PuzzleFileError {
    #[error("line {line_number}: {source}")]
    Decode { line_number: usize, #[source] source: DecodeError },

    #[error("file ends in the {section} section (after line {line_number})")]
    UnexpectedEndOfFile { section: Section, line_number: usize },

    #[error("unexpected data at line {line_number} after the last record")]
    TrailingData { line_number: usize },

    #[error("line {line_number}: expected cell {expected}, found cell {found}")]
    CellOutOfOrder { line_number: usize, expected: usize, found: usize },

    #[error("grid size {0} out of range 1..=9")]
    InvalidGridSize(usize),

    #[error("puzzle lock poisoned by a panicking writer")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PuzzleFileError {
    /// The record-level error, if this is one.
    pub fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            PuzzleFileError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ── PuzzleFile ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PuzzleFile {
    /// Revision the file was read with.  Writing always stamps
    /// [`CURRENT_REVISION`].
    pub revision:          Revision,
    pub header:            GridHeader,
    /// Only present for files written before r596.
    pub legacy_statistics: Option<LegacyStatistics>,
    pub grid_size:         usize,
    pub cells:             Vec<Cell>,
    pub cages:             Vec<Cage>,
    pub moves:             Vec<MoveRecord>,
}

/// Revision and header of a file, without the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeaderSummary {
    pub revision:          Revision,
    pub header:            GridHeader,
    pub legacy_statistics: Option<LegacyStatistics>,
}

pub fn check_grid_size(grid_size: usize) -> Result<(), PuzzleFileError> {
    if (1..=MAX_GRID_SIZE).contains(&grid_size) {
        Ok(())
    } else {
        Err(PuzzleFileError::InvalidGridSize(grid_size))
    }
}

impl PuzzleFile {
    pub fn read_from<R: BufRead>(input: R, grid_size: usize) -> Result<Self, PuzzleFileError> {
        check_grid_size(grid_size)?;
        Reader::new(input).read_file(grid_size)
    }

    pub fn parse(text: &str, grid_size: usize) -> Result<Self, PuzzleFileError> {
        Self::read_from(text.as_bytes(), grid_size)
    }

    /// Read the revision marker and header only; the rest of the input is
    /// left unread.
    pub fn read_header<R: BufRead>(input: R) -> Result<HeaderSummary, PuzzleFileError> {
        let mut reader = Reader::new(input);
        let revision = reader.read_revision()?;
        let DecodedHeader { header, legacy_statistics } = reader.read_header(revision)?;
        Ok(HeaderSummary { revision, header, legacy_statistics })
    }

    /// Write every record in the current layout, in file order.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut line = |s: &str| -> io::Result<()> {
            out.write_all(s.as_bytes())?;
            let mut buf = [0u8; 4];
            out.write_all(RECORD_SEPARATOR.encode_utf8(&mut buf).as_bytes())
        };

        line(&encode_revision_marker(CURRENT_REVISION))?;
        line(&self.header.encode())?;
        for cell in &self.cells {
            line(&cell.encode())?;
        }
        for cage in &self.cages {
            line(&cage.encode())?;
        }
        for m in &self.moves {
            line(&m.encode())?;
        }
        Ok(())
    }

    pub fn to_text(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn cell(&self, id: usize) -> Option<&Cell> {
        self.cells.get(id)
    }

    /// Id of the cage containing `cell_id`.
    pub fn cage_id_of(&self, cell_id: usize) -> Option<usize> {
        self.cages.iter().find(|c| c.cells.contains(&cell_id)).map(|c| c.id)
    }

    /// First cell flagged as selected, if any.
    pub fn selected_cell(&self) -> Option<&Cell> {
        self.cells.iter().find(|c| c.selected)
    }
}

pub fn encode_revision_marker(revision: Revision) -> String {
    format!("{}{}{}", RecordTag::RevisionMarker, FIELD_SEPARATOR, revision.0)
}
