use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::codec::{parse_number, split_record, DecodeError, Fields, Malformation, RecordTag};
use crate::delimiter::{parse_value_list, write_value_list, ListError, FIELD_SEPARATOR};
use crate::revision::{layout_for, RecordKind, Revision};

/// Arithmetic operator of a cage.  The numeric ids are written to disk and
/// are frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CageOperator {
    #[default]
    None,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl CageOperator {
    pub fn id(self) -> u8 {
        match self {
            CageOperator::None     => 0,
            CageOperator::Add      => 1,
            CageOperator::Subtract => 2,
            CageOperator::Multiply => 3,
            CageOperator::Divide   => 4,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "0" => Some(CageOperator::None),
            "1" => Some(CageOperator::Add),
            "2" => Some(CageOperator::Subtract),
            "3" => Some(CageOperator::Multiply),
            "4" => Some(CageOperator::Divide),
            _   => None,
        }
    }

    /// Symbol used in cage labels (`"12x"`).  Empty for single-cell cages.
    pub fn symbol(self) -> &'static str {
        match self {
            CageOperator::None     => "",
            CageOperator::Add      => "+",
            CageOperator::Subtract => "-",
            CageOperator::Multiply => "x",
            CageOperator::Divide   => "/",
        }
    }
}

/// A region of cells sharing one arithmetic constraint.
///
/// The cage owns its member list.  Cells do not store a back-reference; use
/// [`PuzzleFile::cage_id_of`](crate::puzzle_file::PuzzleFile::cage_id_of).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cage {
    pub id:            usize,
    pub operator:      CageOperator,
    pub result:        u32,
    pub hide_operator: bool,
    pub cells:         Vec<usize>,
}

impl Cage {
    /// Label shown in the top-left cell, honouring a hidden operator.
    pub fn label(&self) -> String {
        if self.hide_operator {
            self.result.to_string()
        } else {
            format!("{}{}", self.result, self.operator.symbol())
        }
    }

    /// Decode a cage line.  Member ids are checked against `cells`, the cells
    /// already loaded for this grid.
    pub fn decode(line: &str, revision: Revision, cells: &[Cell]) -> Result<Self, DecodeError> {
        let layout = layout_for(RecordKind::Cage, revision)?;
        let fields = split_record(line, RecordTag::Cage, layout.field_count())?;
        let mut f = Fields::new(line, fields);

        let id: usize = f.number("id")?;
        let op_raw = f.raw();
        let operator = CageOperator::from_id(op_raw).ok_or_else(|| {
            DecodeError::malformed(line, Malformation::UnknownOperator(op_raw.to_owned()))
        })?;
        let result: u32 = f.number("result")?;

        // Every cage layout so far carries an explicit member list.
        let members = decode_members(line, f.raw(), cells.len())?;

        Ok(Self {
            id,
            operator,
            result,
            cells: members,
            hide_operator: f.flag("hide operator")?,
        })
    }

    pub fn encode(&self) -> String {
        let sep = FIELD_SEPARATOR;
        let mut s = format!(
            "{}{sep}{}{sep}{}{sep}{}{sep}",
            RecordTag::Cage,
            self.id,
            self.operator.id(),
            self.result
        );
        write_value_list(&mut s, &self.cells);
        s.push(sep);
        s.push_str(if self.hide_operator { "true" } else { "false" });
        s
    }
}

fn decode_members(line: &str, raw: &str, cell_count: usize) -> Result<Vec<usize>, DecodeError> {
    let ids: Vec<String> = parse_value_list(raw).map_err(|e| {
        DecodeError::malformed(
            line,
            match e {
                ListError::Empty      => Malformation::EmptyListElement { field: "cells" },
                ListError::Invalid(v) => Malformation::InvalidNumber { field: "cells", value: v },
            },
        )
    })?;

    let mut seen = HashSet::with_capacity(ids.len());
    let mut members = Vec::with_capacity(ids.len());
    for raw_id in &ids {
        let cell_id: usize = parse_number(line, "cells", raw_id)?;
        if cell_id >= cell_count {
            return Err(DecodeError::DanglingCellReference { cell_id, cell_count });
        }
        if !seen.insert(cell_id) {
            return Err(DecodeError::malformed(
                line,
                Malformation::DuplicateValue { field: "cells", value: cell_id as u64 },
            ));
        }
        members.push(cell_id);
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::CURRENT_REVISION;

    fn grid(n: usize) -> Vec<Cell> {
        (0..n * n).map(|id| Cell::new(id, 1)).collect()
    }

    #[test]
    fn decode_fixtures() {
        let cells = grid(4);
        let c = Cage::decode("CAGE:1:2:3::false", CURRENT_REVISION, &cells).unwrap();
        assert_eq!(
            c,
            Cage { id: 1, operator: CageOperator::Subtract, result: 3, hide_operator: false, cells: vec![] }
        );

        let c = Cage::decode("CAGE:1:2:3:4:true", CURRENT_REVISION, &cells).unwrap();
        assert_eq!(c.cells, vec![4]);
        assert!(c.hide_operator);

        let c = Cage::decode("CAGE:1:2:3:4,5,6,7:false", CURRENT_REVISION, &cells).unwrap();
        assert_eq!(c.cells, vec![4, 5, 6, 7]);
    }

    #[test]
    fn member_order_is_kept() {
        let c = Cage::decode("CAGE:0:1:9:9,1,5,:false", CURRENT_REVISION, &grid(4)).unwrap();
        assert_eq!(c.cells, vec![9, 1, 5]);
        assert_eq!(c.encode(), "CAGE:0:1:9:9,1,5,:false");
    }

    #[test]
    fn field_count_strict() {
        for line in ["CAGE:2:3:4:5", "CAGE:1:2:3:4:5:6", "CAGE:2:3:4:5:6:7"] {
            let err = Cage::decode(line, CURRENT_REVISION, &grid(4)).unwrap_err();
            assert!(
                matches!(err, DecodeError::MalformedRecord { problem: Malformation::FieldCount { expected: 6, .. }, .. }),
                "{line}: {err:?}"
            );
        }
    }

    #[test]
    fn dangling_member() {
        let err = Cage::decode("CAGE:1:1:3:15,16,:false", CURRENT_REVISION, &grid(4)).unwrap_err();
        assert_eq!(err, DecodeError::DanglingCellReference { cell_id: 16, cell_count: 16 });
    }

    #[test]
    fn duplicate_member_and_bad_operator() {
        let err = Cage::decode("CAGE:1:1:3:2,2,:false", CURRENT_REVISION, &grid(4)).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedRecord { problem: Malformation::DuplicateValue { .. }, .. }));

        let err = Cage::decode("CAGE:1:7:3:2,:false", CURRENT_REVISION, &grid(4)).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedRecord { problem: Malformation::UnknownOperator(_), .. }));
    }

    #[test]
    fn below_floor_and_wrong_tag() {
        let err = Cage::decode("CAGE:1:2:3::false", Revision(200), &grid(4)).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedRevision { kind: RecordKind::Cage, .. }));
        let err = Cage::decode("CELL:1:2:3::false", CURRENT_REVISION, &grid(4)).unwrap_err();
        assert!(matches!(err, DecodeError::WrongRecordType { .. }));
    }

    #[test]
    fn encode_fixtures() {
        let c = Cage { id: 1, operator: CageOperator::Multiply, result: 4, hide_operator: false, cells: vec![] };
        assert_eq!(c.encode(), "CAGE:1:3:4::false");
        let c = Cage { id: 1, operator: CageOperator::Subtract, result: 3, hide_operator: false, cells: vec![4] };
        assert_eq!(c.encode(), "CAGE:1:2:3:4,:false");
        let c = Cage { id: 1, operator: CageOperator::Divide, result: 3, hide_operator: false, cells: vec![5, 6, 7] };
        assert_eq!(c.encode(), "CAGE:1:4:3:5,6,7,:false");
    }

    #[test]
    fn labels() {
        let mut c = Cage { id: 0, operator: CageOperator::Multiply, result: 12, hide_operator: false, cells: vec![0, 1] };
        assert_eq!(c.label(), "12x");
        c.hide_operator = true;
        assert_eq!(c.label(), "12");
    }

    #[test]
    fn operator_ids_round_trip() {
        for op in [
            CageOperator::None,
            CageOperator::Add,
            CageOperator::Subtract,
            CageOperator::Multiply,
            CageOperator::Divide,
        ] {
            assert_eq!(CageOperator::from_id(&op.id().to_string()), Some(op));
        }
    }
}
