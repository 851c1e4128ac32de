use crate::expression::flow::LabelId;
use crate::expression::instr::{Instr, Program};
use crate::foundation::error::{PixelMathError, PixelMathResult};
use std::collections::HashMap;

/// Resolve branch targets to forward offsets and strip the labels.
///
/// Offsets are measured in the stripped stream. Branches that already carry an offset are kept
/// as they are, so linking a linked program returns it unchanged.
pub fn link_program(program: &Program) -> PixelMathResult<Program> {
    let mut positions: HashMap<LabelId, usize> = HashMap::new();
    let mut pos = 0usize;
    for instr in program.instrs() {
        if let Instr::Label(id) = instr {
            if positions.insert(*id, pos).is_some() {
                return Err(PixelMathError::internal(format!(
                    "duplicate branch target {id}"
                )));
            }
        } else {
            pos += 1;
        }
    }

    let mut out = Vec::with_capacity(pos);
    for instr in program.instrs() {
        match instr {
            Instr::Label(_) => {}
            Instr::Branch(b) if b.offset.is_none() => {
                let here = out.len();
                let target = *positions.get(&b.target).ok_or_else(|| {
                    PixelMathError::internal(format!(
                        "orphan branch target {}: no matching label",
                        b.target
                    ))
                })?;
                let offset = target as isize - here as isize;
                if offset <= 0 {
                    return Err(PixelMathError::internal(format!(
                        "branch to {} does not jump forward (offset {offset})",
                        b.target
                    )));
                }
                let mut linked = *b;
                linked.offset = Some(offset);
                out.push(Instr::Branch(linked));
            }
            other => out.push(other.clone()),
        }
    }
    Ok(Program::new(out))
}

#[cfg(test)]
#[path = "../../tests/unit/expression/link.rs"]
mod tests;
