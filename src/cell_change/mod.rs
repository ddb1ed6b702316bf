//! Move records (`CELL_CHANGE`): the undo history of a game.
//!
//! One move stores the value and candidates a cell had *before* the user
//! changed it.  A move that touched several cells at once (clearing a row of
//! candidates, say) keeps the secondary changes as nested records:
//!
//! ```text
//! CELL_CHANGE:[4:1::[2:0:3,:],[16:0:2,3,4,:],]
//!              │ │ │ └─ related moves, each followed by ','
//!              │ │ └─── previous candidates
//!              │ └───── previous value (0 = none)
//!              └─────── cell id
//! ```
//!
//! Decoding never recurses on the call stack; see [`parser`].

mod parser;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::codec::{optional_value_str, raw_tag, DecodeError, RecordTag};
use crate::delimiter::{write_value_list, FIELD_SEPARATOR, NESTED_CLOSE, NESTED_OPEN, VALUE_SEPARATOR};
use crate::revision::{layout_for, RecordKind, Revision};

/// Maximum number of nested bracket pairs accepted on decode, the outermost
/// record included.
pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveRecord {
    pub cell_id:             usize,
    pub previous_value:      Option<u32>,
    pub previous_candidates: BTreeSet<u32>,
    pub related:             Vec<MoveRecord>,
}

impl MoveRecord {
    pub fn new(cell_id: usize, previous_value: Option<u32>) -> Self {
        Self { cell_id, previous_value, ..Self::default() }
    }

    pub fn decode(line: &str, revision: Revision) -> Result<Self, DecodeError> {
        let layout = layout_for(RecordKind::CellChange, revision)?;

        let tag = raw_tag(line);
        if tag != RecordTag::CellChange.as_str() {
            return Err(DecodeError::WrongRecordType {
                expected: RecordTag::CellChange,
                found:    tag.to_owned(),
            });
        }
        // Body starts right after the tag and its separator.
        let offset = (tag.len() + FIELD_SEPARATOR.len_utf8()).min(line.len());
        parser::parse_body(line, &line[offset..], offset, layout.field_count())
    }

    pub fn encode(&self) -> String {
        let mut s = format!("{}{}", RecordTag::CellChange, FIELD_SEPARATOR);
        self.write_body(&mut s);
        s
    }

    fn write_body(&self, out: &mut String) {
        let sep = FIELD_SEPARATOR;
        out.push_str(&format!(
            "{NESTED_OPEN}{}{sep}{}{sep}",
            self.cell_id,
            optional_value_str(self.previous_value)
        ));
        write_value_list(out, &self.previous_candidates);
        out.push(sep);
        for child in &self.related {
            child.write_body(out);
            out.push(VALUE_SEPARATOR);
        }
        out.push(NESTED_CLOSE);
    }

    /// Every cell id in this move, depth first, parent before children.
    pub fn cell_ids(&self) -> Vec<usize> {
        let mut ids = Vec::new();
        let mut pending = vec![self];
        while let Some(m) = pending.pop() {
            ids.push(m.cell_id);
            pending.extend(m.related.iter().rev());
        }
        ids
    }

    /// Nesting depth below this record; a move without related moves is 0.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 0usize)];
        while let Some((m, d)) = pending.pop() {
            deepest = deepest.max(d);
            pending.extend(m.related.iter().map(|c| (c, d + 1)));
        }
        deepest
    }

    /// Check every referenced cell, at any depth, against a grid of
    /// `cell_count` cells.
    pub fn check_cells(&self, cell_count: usize) -> Result<(), DecodeError> {
        match self.cell_ids().into_iter().find(|&id| id >= cell_count) {
            Some(cell_id) => Err(DecodeError::DanglingCellReference { cell_id, cell_count }),
            None => Ok(()),
        }
    }
}
