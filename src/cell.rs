use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::codec::{optional_value_str, split_record, DecodeError, Fields, Malformation, RecordTag};
use crate::delimiter::{is_reserved, write_value_list, FIELD_SEPARATOR};
use crate::revision::{layout_for, Layout, RecordKind, Revision};

/// One grid cell and its solving state.
///
/// `cage_text` is the label drawn in the top-left cell of a cage (`"12x"`),
/// empty for every other cell.  It never contains a delimiter character.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub id:                usize,
    pub cage_text:         String,
    pub correct_value:     u32,
    pub entered_value:     Option<u32>,
    pub candidates:        BTreeSet<u32>,
    pub invalid_highlight: bool,
    pub revealed:          bool,
    pub selected:          bool,
}

impl Cell {
    pub fn new(id: usize, correct_value: u32) -> Self {
        Self { id, correct_value, ..Self::default() }
    }

    /// Row and column in a grid of `grid_size` columns.
    pub fn position(&self, grid_size: usize) -> (usize, usize) {
        (self.id / grid_size, self.id % grid_size)
    }

    pub fn is_empty(&self) -> bool {
        self.entered_value.is_none()
    }

    pub fn decode(line: &str, revision: Revision) -> Result<Self, DecodeError> {
        let layout = layout_for(RecordKind::Cell, revision)?;
        let fields = split_record(line, RecordTag::Cell, layout.field_count())?;
        let mut f = Fields::new(line, fields);

        let id: usize = f.number("id")?;
        if layout == Layout::CellWithCoordinates {
            // Row and column are implied by the id; they only have to be numbers.
            let _row: usize = f.number("row")?;
            let _col: usize = f.number("column")?;
        }

        Ok(Self {
            id,
            cage_text:         plain_text(line, "cage text", f.raw())?,
            correct_value:     f.number("correct value")?,
            entered_value:     f.optional_value("entered value")?,
            candidates:        f.value_set("candidates")?,
            invalid_highlight: f.flag("invalid highlight")?,
            revealed:          f.flag("revealed")?,
            selected:          f.flag("selected")?,
        })
    }

    /// Always emits the current layout.
    pub fn encode(&self) -> String {
        debug_assert!(!self.cage_text.chars().any(is_reserved), "cage text {:?}", self.cage_text);
        let sep = FIELD_SEPARATOR;
        let mut s = format!(
            "{tag}{sep}{id}{sep}{text}{sep}{correct}{sep}{entered}{sep}",
            tag     = RecordTag::Cell,
            id      = self.id,
            text    = self.cage_text,
            correct = self.correct_value,
            entered = optional_value_str(self.entered_value),
        );
        write_value_list(&mut s, &self.candidates);
        s.push_str(&format!(
            "{sep}{}{sep}{}{sep}{}",
            self.invalid_highlight, self.revealed, self.selected
        ));
        s
    }
}

/// Level-1 splitting already removed `:`; the other delimiters would
/// corrupt the line when it is written back.
fn plain_text(line: &str, field: &'static str, raw: &str) -> Result<String, DecodeError> {
    match raw.chars().find(|&c| is_reserved(c)) {
        Some(found) => Err(DecodeError::malformed(line, Malformation::ReservedCharacter { field, found })),
        None => Ok(raw.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::{current_layout, CURRENT_REVISION};

    const OLD: Revision = Revision(596);

    fn cell(id: usize, text: &str, correct: u32, entered: Option<u32>, cands: &[u32]) -> Cell {
        Cell {
            id,
            cage_text: text.into(),
            correct_value: correct,
            entered_value: entered,
            candidates: cands.iter().copied().collect(),
            ..Cell::default()
        }
    }

    #[test]
    fn decode_current_layout() {
        let c = Cell::decode("CELL:1:2-:3:0:4,:false:true:false", CURRENT_REVISION).unwrap();
        assert_eq!(c, Cell { revealed: true, ..cell(1, "2-", 3, None, &[4]) });
    }

    #[test]
    fn decode_with_candidates_and_selection() {
        let c = Cell::decode("CELL:1:2-:3:0:1,2,3,4,:false:false:true", CURRENT_REVISION).unwrap();
        assert_eq!(c, Cell { selected: true, ..cell(1, "2-", 3, None, &[1, 2, 3, 4]) });
    }

    #[test]
    fn decode_legacy_layout_drops_coordinates() {
        let c = Cell::decode("CELL:1:2:3:4+:5:6::true:false:false", OLD).unwrap();
        assert_eq!(c, Cell { invalid_highlight: true, ..cell(1, "4+", 5, Some(6), &[]) });
    }

    #[test]
    fn field_count_is_per_revision() {
        // 9 fields is right for the current layout only.
        assert!(Cell::decode("CELL:2:3:4:5:6:7:8:9:10", OLD).is_err());
        for line in ["CELL:2:3:4:5:6:7:8", "CELL:2:3:4:5:6:7:8:9:10:11:12"] {
            let err = Cell::decode(line, OLD).unwrap_err();
            assert!(matches!(
                err,
                DecodeError::MalformedRecord { problem: Malformation::FieldCount { expected: 11, .. }, .. }
            ));
        }
        let err = Cell::decode("CELL:1:2:3:4+:5:6::true:false:false", CURRENT_REVISION).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedRecord { problem: Malformation::FieldCount { expected: 9, actual: 11 }, .. }
        ));
    }

    #[test]
    fn wrong_tag() {
        let err = Cell::decode("CAGE:1:2-:3:0::false:true:false", CURRENT_REVISION).unwrap_err();
        assert!(matches!(err, DecodeError::WrongRecordType { expected: RecordTag::Cell, .. }));
    }

    #[test]
    fn non_numeric_and_bad_flags_are_malformed() {
        for line in [
            "CELL:x:2-:3:0::false:true:false",
            "CELL:1:2-:three:0::false:true:false",
            "CELL:1:2-:3:0:1,a,:false:true:false",
            "CELL:1:2-:3:0:1,1,:false:true:false",
            "CELL:1:2-:3:0::no:true:false",
            "CELL:1:2-:3:::false:true:false",
        ] {
            let err = Cell::decode(line, CURRENT_REVISION).unwrap_err();
            assert!(matches!(err, DecodeError::MalformedRecord { .. }), "{line}: {err:?}");
        }
        let err = Cell::decode("CELL:1:x:y:4+:5:6::true:false:false", OLD).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedRecord { .. }));
    }

    #[test]
    fn delimiters_in_cage_text_are_rejected() {
        for (line, found) in [
            ("CELL:1:1,2:3:0::false:false:false", ','),
            ("CELL:1:[6x:3:0::false:false:false", '['),
            ("CELL:1:6x]:3:0::false:false:false", ']'),
        ] {
            let err = Cell::decode(line, CURRENT_REVISION).unwrap_err();
            assert_eq!(
                err,
                DecodeError::malformed(line, Malformation::ReservedCharacter { field: "cage text", found })
            );
        }
        let err = Cell::decode("CELL:1:2:3:4,+:5:6::true:false:false", OLD).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedRecord { problem: Malformation::ReservedCharacter { found: ',', .. }, .. }
        ));
    }

    #[test]
    fn below_floor_rejected() {
        let err = Cell::decode("CELL:1:2:3:4+:5:6::true:false:false", Revision(368)).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedRevision { .. }));
    }

    #[test]
    fn encode_fixtures() {
        assert_eq!(
            Cell { invalid_highlight: true, ..cell(1, "2+", 3, Some(4), &[]) }.encode(),
            "CELL:1:2+:3:4::true:false:false"
        );
        assert_eq!(
            Cell { revealed: true, ..cell(1, "2x", 3, Some(4), &[5]) }.encode(),
            "CELL:1:2x:3:4:5,:false:true:false"
        );
        assert_eq!(
            Cell { selected: true, ..cell(1, "2/", 3, Some(4), &[7, 5, 6]) }.encode(),
            "CELL:1:2/:3:4:5,6,7,:false:false:true"
        );
    }

    #[test]
    fn encode_uses_current_field_count() {
        let line = cell(3, "", 1, None, &[2, 3]).encode();
        assert_eq!(
            line.split(FIELD_SEPARATOR).count(),
            current_layout(RecordKind::Cell).field_count()
        );
    }

    #[test]
    fn save_upgrades_legacy_line() {
        let old = Cell::decode("CELL:5:1:1:6x:2:0:1,3,:false:false:true", OLD).unwrap();
        let line = old.encode();
        assert_eq!(line, "CELL:5:6x:2:0:1,3,:false:false:true");
        assert_eq!(Cell::decode(&line, CURRENT_REVISION).unwrap(), old);
    }

    #[test]
    fn position_is_row_major() {
        assert_eq!(Cell::new(6, 1).position(4), (1, 2));
        assert_eq!(Cell::new(0, 1).position(4), (0, 0));
    }
}
