//! Line-driven reader for a whole save file.
//!
//! ```text
//! Start ─► Marker? ─► Header ─► Cells[size²] ─► Cages[1..] ─► Moves[0..] ─► End
//! ```
//!
//! Each section is read by one method; a section never looks back.  The
//! only lookahead is a single peeked line, used to see where one section
//! ends and the next begins.

use std::io::BufRead;

use crate::cage::Cage;
use crate::cell::Cell;
use crate::cell_change::MoveRecord;
use crate::codec::{raw_tag, split_record, DecodeError, Fields, RecordTag};
use crate::header::{coalesce_untagged_header, DecodedHeader, GridHeader};
use crate::revision::{check_supported, Layout, Revision, DEFAULT_REVISION};

use super::{PuzzleFile, PuzzleFileError, Section};

/// One physical line and its 1-based number.
type Numbered = (usize, String);

pub(super) struct Reader<R: BufRead> {
    lines:  std::io::Lines<R>,
    number: usize,
    peeked: Option<Numbered>,
    /// The file opened with a revision marker.
    marked: bool,
}

impl<R: BufRead> Reader<R> {
    pub(super) fn new(input: R) -> Self {
        Self { lines: input.lines(), number: 0, peeked: None, marked: false }
    }

    fn next_line(&mut self) -> Result<Option<Numbered>, PuzzleFileError> {
        if let Some(l) = self.peeked.take() {
            return Ok(Some(l));
        }
        match self.lines.next() {
            Some(line) => {
                self.number += 1;
                Ok(Some((self.number, line?)))
            }
            None => Ok(None),
        }
    }

    fn peek_tag(&mut self) -> Result<Option<&str>, PuzzleFileError> {
        if self.peeked.is_none() {
            self.peeked = self.next_line()?;
        }
        Ok(self.peeked.as_ref().map(|(_, l)| raw_tag(l)))
    }

    fn require(&mut self, section: Section) -> Result<Numbered, PuzzleFileError> {
        self.next_line()?.ok_or(PuzzleFileError::UnexpectedEndOfFile {
            section,
            line_number: self.number,
        })
    }

    // ── Sections ────────────────────────────────────────────────────────────

    pub(super) fn read_revision(&mut self) -> Result<Revision, PuzzleFileError> {
        if self.peek_tag()? != Some(RecordTag::RevisionMarker.as_str()) {
            return Ok(DEFAULT_REVISION);
        }
        self.marked = true;
        let (n, line) = self.require(Section::RevisionMarker)?;
        let revision = decode_revision_marker(&line).map_err(at(n))?;
        check_supported(revision).map_err(at(n))?;
        Ok(revision)
    }

    pub(super) fn read_header(&mut self, revision: Revision) -> Result<DecodedHeader, PuzzleFileError> {
        let (n, first) = self.require(Section::Header)?;

        // Builds from before the revision marker wrote the header as bare
        // lines with no tag.  A tagged file never does.
        if self.marked || RecordTag::of_line(&first).is_some() {
            return GridHeader::decode(&first, revision).map_err(at(n));
        }

        let count = Layout::HeaderUntaggedLines.physical_lines();
        let mut lines = Vec::with_capacity(count);
        lines.push(first);
        for _ in 1..count {
            lines.push(self.require(Section::Header)?.1);
        }
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        let line = coalesce_untagged_header(&lines).map_err(at(n))?;
        GridHeader::decode(&line, revision).map_err(at(n))
    }

    pub(super) fn read_cells(&mut self, revision: Revision, grid_size: usize) -> Result<Vec<Cell>, PuzzleFileError> {
        let count = grid_size * grid_size;
        let mut cells = Vec::with_capacity(count);
        for expected in 0..count {
            if self.peek_tag()? != Some(RecordTag::Cell.as_str()) {
                // A short grid: the cell section ended early.
                return Err(PuzzleFileError::UnexpectedEndOfFile {
                    section:     Section::Cells,
                    line_number: self.number,
                });
            }
            let (n, line) = self.require(Section::Cells)?;
            let cell = Cell::decode(&line, revision).map_err(at(n))?;
            if cell.id != expected {
                return Err(PuzzleFileError::CellOutOfOrder { line_number: n, expected, found: cell.id });
            }
            cells.push(cell);
        }
        Ok(cells)
    }

    pub(super) fn read_cages(&mut self, revision: Revision, cells: &[Cell]) -> Result<Vec<Cage>, PuzzleFileError> {
        let mut cages = Vec::new();
        loop {
            match self.peek_tag()? {
                Some(tag) if tag == RecordTag::Cage.as_str() => {}
                Some(tag) if cages.is_empty() => {
                    let found = tag.to_owned();
                    return Err(at(self.number)(DecodeError::WrongRecordType {
                        expected: RecordTag::Cage,
                        found,
                    }));
                }
                None if cages.is_empty() => {
                    return Err(PuzzleFileError::UnexpectedEndOfFile {
                        section:     Section::Cages,
                        line_number: self.number,
                    });
                }
                _ => return Ok(cages),
            }
            let (n, line) = self.require(Section::Cages)?;
            cages.push(Cage::decode(&line, revision, cells).map_err(at(n))?);
        }
    }

    pub(super) fn read_moves(&mut self, revision: Revision, cell_count: usize) -> Result<Vec<MoveRecord>, PuzzleFileError> {
        let mut moves = Vec::new();
        while self.peek_tag()? == Some(RecordTag::CellChange.as_str()) {
            let (n, line) = self.require(Section::Moves)?;
            let m = MoveRecord::decode(&line, revision).map_err(at(n))?;
            m.check_cells(cell_count).map_err(at(n))?;
            moves.push(m);
        }
        Ok(moves)
    }

    /// Only blank lines may follow the last record.
    pub(super) fn read_end(&mut self) -> Result<(), PuzzleFileError> {
        while let Some((n, line)) = self.next_line()? {
            if !line.trim().is_empty() {
                return Err(PuzzleFileError::TrailingData { line_number: n });
            }
        }
        Ok(())
    }

    pub(super) fn read_file(mut self, grid_size: usize) -> Result<PuzzleFile, PuzzleFileError> {
        let revision = self.read_revision()?;
        let DecodedHeader { header, legacy_statistics } = self.read_header(revision)?;
        let cells = self.read_cells(revision, grid_size)?;
        let cages = self.read_cages(revision, &cells)?;
        let moves = self.read_moves(revision, cells.len())?;
        self.read_end()?;

        log::debug!(
            "decoded {revision} save: {} cells, {} cages, {} moves over {} lines",
            cells.len(),
            cages.len(),
            moves.len(),
            self.number
        );
        Ok(PuzzleFile { revision, header, legacy_statistics, grid_size, cells, cages, moves })
    }
}

/// Attach a line number to a record error.
fn at(line_number: usize) -> impl Fn(DecodeError) -> PuzzleFileError {
    move |source| PuzzleFileError::Decode { line_number, source }
}

pub(super) fn decode_revision_marker(line: &str) -> Result<Revision, DecodeError> {
    let fields = split_record(line, RecordTag::RevisionMarker, 2)?;
    let mut f = Fields::new(line, fields);
    Ok(Revision(f.number("revision")?))
}
