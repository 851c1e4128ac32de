use crate::expression::instr::{CallOp, Instr, Program};
use crate::expression::registry::Invariance;
use crate::expression::vm::{self, Alias, EvalCtx, Operand};
use crate::foundation::core::Canvas;
use crate::foundation::error::{PixelMathError, PixelMathResult};
use crate::foundation::pixel::Pixel;
use crate::imaging::store::ImageScope;
use crate::symbols::table::{ConstId, SymbolTable};
use rand::SeedableRng;
use rand::rngs::StdRng;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Inputs for compile-time evaluation.
pub(crate) struct FoldCtx<'a> {
    pub(crate) symbols: &'a SymbolTable,
    pub(crate) scope: ImageScope<'a>,
    pub(crate) canvas: Canvas,
}

/// Fold constants and invariant calls of every program into literals, until no fold applies.
///
/// Returns the number of folds.
pub(crate) fn solve_invariants<'p>(
    programs: impl IntoIterator<Item = &'p mut Program>,
    ctx: &FoldCtx<'_>,
) -> PixelMathResult<usize> {
    let mut resolved = HashMap::new();
    let mut folds = 0;
    for program in programs {
        while let Some((range, value)) = find_fold(program.instrs(), ctx, &mut resolved)? {
            program.instrs.splice(range, [Instr::from_literal(value)]);
            folds += 1;
        }
    }
    if folds > 0 {
        tracing::info!(folds, "solved {folds} invariant subexpression(s)");
    }
    Ok(folds)
}

type Fold = (std::ops::Range<usize>, Pixel);

fn find_fold(
    instrs: &[Instr],
    ctx: &FoldCtx<'_>,
    resolved: &mut HashMap<ConstId, Pixel>,
) -> PixelMathResult<Option<Fold>> {
    for (i, instr) in instrs.iter().enumerate() {
        match instr {
            Instr::Constant(id) => {
                let value = match resolved.get(id) {
                    Some(v) => *v,
                    None => {
                        let def = ctx.symbols.constant(*id).ok_or_else(|| {
                            PixelMathError::internal(format!("unknown constant id {}", id.0))
                        })?;
                        let v = def.value.resolve(&ctx.scope).map_err(|e| {
                            PixelMathError::compile(format!("constant '{}': {e}", def.name))
                        })?;
                        resolved.insert(*id, v);
                        v
                    }
                };
                return Ok(Some((i..i + 1, value)));
            }
            Instr::Call(call) if call.argc <= i => {
                let window = &instrs[i - call.argc..i];
                if is_invariant(call.func.def().invariance, window) {
                    let value = evaluate(call, window, ctx.canvas)?;
                    return Ok(Some((i - call.argc..i + 1, value)));
                }
            }
            _ => {}
        }
    }
    Ok(None)
}

fn is_literal(i: &Instr) -> bool {
    i.literal().is_some()
}

fn is_invariant(rule: Invariance, window: &[Instr]) -> bool {
    match rule {
        Invariance::Never => false,
        Invariance::Pure => window.iter().all(is_literal),
        Invariance::ImageStatistics => {
            matches!(window, [Instr::Image(_)]) || window.iter().all(is_literal)
        }
        Invariance::PixelLookup => match window.split_first() {
            Some((Instr::Image(_), rest)) => rest.iter().all(is_literal),
            _ => false,
        },
    }
}

/// Evaluate a call once through the per-pixel path with a position-free context.
fn evaluate(call: &CallOp, window: &[Instr], canvas: Canvas) -> PixelMathResult<Pixel> {
    let mut ops: SmallVec<[Operand<'_>; 8]> = window
        .iter()
        .map(|instr| match instr {
            Instr::Image(img) => Operand {
                value: Pixel::gray(0.0),
                alias: Some(Alias::Image(img)),
            },
            other => Operand::value(other.literal().unwrap_or_default()),
        })
        .collect();
    let mut rng = StdRng::seed_from_u64(0);
    let mut vars: [Pixel; 0] = [];
    let mut ctx = EvalCtx {
        x: 0,
        y: 0,
        canvas,
        vars: &mut vars,
        rng: &mut rng,
    };
    vm::invoke(call.func, &mut ops, &mut ctx)
        .map_err(|e| PixelMathError::compile(format!("{}(): {e}", call.func.token())))
}

#[cfg(test)]
#[path = "../../tests/unit/expression/solve.rs"]
mod tests;
