//! Path-level load and save.
//!
//! ```no_run
//! use std::sync::Mutex;
//! use mathdoku_save::store::PuzzleStore;
//!
//! let puzzle = PuzzleStore::load("game.sav", 4)?;
//! let shared = Mutex::new(puzzle);
//! PuzzleStore::save("game.sav", &shared)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::puzzle_file::{HeaderSummary, PuzzleFile, PuzzleFileError};

pub struct PuzzleStore;

impl PuzzleStore {
    pub fn load<P: AsRef<Path>>(path: P, grid_size: usize) -> Result<PuzzleFile, PuzzleFileError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let puzzle = PuzzleFile::read_from(BufReader::new(file), grid_size)?;
        log::info!("Loaded {} ({}, {} moves)", path.display(), puzzle.revision, puzzle.moves.len());
        Ok(puzzle)
    }

    /// Revision and header only, for listing saved games without decoding
    /// their grids.
    pub fn peek_header<P: AsRef<Path>>(path: P) -> Result<HeaderSummary, PuzzleFileError> {
        let file = File::open(path.as_ref())?;
        PuzzleFile::read_header(BufReader::new(file))
    }

    /// Write `puzzle` to `path` in the current layout.
    ///
    /// The lock is held until the new file is in place, so no edit can land
    /// half-way through a save.  The data goes to a temporary file next to
    /// `path` first and is renamed over it once synced; on any error the
    /// previous file is left as it was.
    pub fn save<P: AsRef<Path>>(path: P, puzzle: &Mutex<PuzzleFile>) -> Result<(), PuzzleFileError> {
        let path = path.as_ref();
        let guard = puzzle.lock().map_err(|_| PuzzleFileError::LockPoisoned)?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            guard.write_to(&mut out)?;
            out.flush()?;
        }
        tmp.as_file().sync_all()?;
        let bytes = tmp.as_file().metadata()?.len();
        tmp.persist(path).map_err(|e| PuzzleFileError::Io(e.error))?;

        log::info!("Saved {} ({} cells, {} moves)", path.display(), guard.cells.len(), guard.moves.len());
        log::debug!("Saved {} bytes to {:?}", bytes, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TWO_BY_TWO: &str = "SAVED_WITH_REVISION:600\nGRID:true:false\n\
        CELL:0:3+:1:0::false:false:false\nCELL:1::2:0::false:false:false\n\
        CELL:2::2:0::false:false:false\nCELL:3::1:0::false:false:false\n\
        CAGE:0:1:3:0,1,:false\nCAGE:1:1:3:2,3,:false\n";

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("game.sav");
        let puzzle = PuzzleFile::parse(TWO_BY_TWO, 2).unwrap();

        PuzzleStore::save(&path, &Mutex::new(puzzle.clone())).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TWO_BY_TWO);
        assert_eq!(PuzzleStore::load(&path, 2).unwrap(), puzzle);
    }

    #[test]
    fn poisoned_lock_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("game.sav");
        std::fs::write(&path, TWO_BY_TWO).unwrap();

        let shared = Mutex::new(PuzzleFile::parse(TWO_BY_TWO, 2).unwrap());
        let _ = std::panic::catch_unwind(|| {
            let _g = shared.lock().unwrap();
            panic!("writer died");
        });

        let err = PuzzleStore::save(&path, &shared).unwrap_err();
        assert!(matches!(err, PuzzleFileError::LockPoisoned));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TWO_BY_TWO);
        // No stray temp files either.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn peek_reads_only_the_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("game.sav");
        std::fs::write(&path, "SAVED_WITH_REVISION:600\nGRID:false:true\nnot a cell\n").unwrap();
        let summary = PuzzleStore::peek_header(&path).unwrap();
        assert!(summary.header.revealed);
        assert!(PuzzleStore::load(&path, 2).is_err());
    }
}
