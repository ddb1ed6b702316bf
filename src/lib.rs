pub mod delimiter;
pub mod revision;
pub mod codec;
pub mod header;
pub mod cell;
pub mod cage;
pub mod cell_change;
pub mod puzzle_file;
pub mod store;

pub use revision::{Revision, CURRENT_REVISION, MIN_SUPPORTED_REVISION};
pub use codec::{DecodeError, Malformation, RecordTag};
pub use header::{GridHeader, LegacyStatistics};
pub use cell::Cell;
pub use cage::{Cage, CageOperator};
pub use cell_change::MoveRecord;
pub use puzzle_file::{PuzzleFile, PuzzleFileError};
pub use store::PuzzleStore;
