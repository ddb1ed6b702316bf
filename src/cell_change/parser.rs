//! Bracket parser for nested move records.
//!
//! Works on one frame per open bracket, kept on an explicit stack, so a
//! hostile line costs heap rather than call stack.  The stack is capped at
//! [`MAX_NESTING_DEPTH`] frames.

use crate::codec::{parse_number, parse_optional_value, parse_value_set, DecodeError, Malformation};
use crate::delimiter::{FIELD_SEPARATOR, NESTED_CLOSE, NESTED_OPEN, VALUE_SEPARATOR};

use super::{MoveRecord, MAX_NESTING_DEPTH};

/// What the innermost open frame accepts next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// Inside one of the leading `cell:previous:candidates:` fields.
    Field,
    /// A nested `[` or the closing `]`.
    ChildOrClose,
    /// The `,` that has to follow every nested record.
    Separator,
}

struct Frame<'a> {
    expect:      Expect,
    fields:      Vec<&'a str>,
    field_start: usize,
    record:      MoveRecord,
}

impl<'a> Frame<'a> {
    fn open(field_start: usize) -> Self {
        Self {
            expect: Expect::Field,
            fields: Vec::with_capacity(3),
            field_start,
            record: MoveRecord::default(),
        }
    }
}

/// Parse the bracketed body of a `CELL_CHANGE` line.
///
/// `body` is everything after `CELL_CHANGE:`; `offset` is its byte offset in
/// `line` so reported positions point into the full line.  `leading` is the
/// number of fixed fields of one record.
pub(super) fn parse_body(
    line:    &str,
    body:    &str,
    offset:  usize,
    leading: usize,
) -> Result<MoveRecord, DecodeError> {
    let unbalanced = |at: usize| DecodeError::UnbalancedNesting {
        line:     line.to_owned(),
        position: offset + at,
    };

    if !body.starts_with(NESTED_OPEN) {
        return Err(unbalanced(0));
    }

    let mut stack: Vec<Frame<'_>> = vec![Frame::open(1)];

    for (i, c) in body.char_indices().skip(1) {
        let Some(top) = stack.last_mut() else {
            // The outermost record closed and more text follows.
            return Err(DecodeError::malformed(
                line,
                Malformation::TrailingCharacters { position: offset + i },
            ));
        };

        match top.expect {
            Expect::Field => match c {
                FIELD_SEPARATOR => {
                    top.fields.push(&body[top.field_start..i]);
                    top.field_start = i + 1;
                    if top.fields.len() == leading {
                        fill_leading(line, top)?;
                        top.expect = Expect::ChildOrClose;
                    }
                }
                NESTED_OPEN | NESTED_CLOSE => {
                    return Err(DecodeError::malformed(
                        line,
                        Malformation::MisplacedBracket { position: offset + i },
                    ));
                }
                _ => {}
            },

            Expect::ChildOrClose => match c {
                NESTED_OPEN => {
                    if stack.len() >= MAX_NESTING_DEPTH {
                        return Err(DecodeError::NestingTooDeep {
                            line:  line.to_owned(),
                            limit: MAX_NESTING_DEPTH,
                        });
                    }
                    stack.push(Frame::open(i + 1));
                }
                NESTED_CLOSE => {
                    // `top` is the last frame, so the pop always succeeds.
                    if let Some(done) = stack.pop() {
                        if let Some(parent) = stack.last_mut() {
                            parent.record.related.push(done.record);
                            parent.expect = Expect::Separator;
                        } else if i + c.len_utf8() < body.len() {
                            return Err(DecodeError::malformed(
                                line,
                                Malformation::TrailingCharacters { position: offset + i + 1 },
                            ));
                        } else {
                            return Ok(done.record);
                        }
                    }
                }
                FIELD_SEPARATOR => {
                    return Err(DecodeError::malformed(
                        line,
                        Malformation::StrayField { position: offset + i },
                    ));
                }
                _ => return Err(unbalanced(i)),
            },

            Expect::Separator => {
                if c == VALUE_SEPARATOR {
                    top.expect = Expect::ChildOrClose;
                } else {
                    return Err(DecodeError::malformed(
                        line,
                        Malformation::MissingSeparator { position: offset + i },
                    ));
                }
            }
        }
    }

    // Ran out of input with at least one bracket still open.
    Err(unbalanced(body.len()))
}

fn fill_leading(line: &str, frame: &mut Frame<'_>) -> Result<(), DecodeError> {
    let r = &mut frame.record;
    r.cell_id             = parse_number(line, "cell id", frame.fields[0])?;
    r.previous_value      = parse_optional_value(line, "previous value", frame.fields[1])?;
    r.previous_candidates = parse_value_set(line, "previous candidates", frame.fields[2])?;
    Ok(())
}
