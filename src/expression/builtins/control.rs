use crate::expression::node::Expr;
use crate::expression::registry::{Control, FunctionDef};
use crate::expression::vm::{EvalCtx, EvalResult, Operand};
use crate::foundation::pixel::Pixel;

// Both alternatives have been evaluated when these run; the optimizing compiler replaces them with
// branches so only the selected alternative executes.

fn iif(out: &mut Pixel, ops: &mut [Operand<'_>], _: &mut EvalCtx<'_>) -> EvalResult {
    let (cond, a, b) = (ops[0].value, ops[1].value, ops[2].value);
    Pixel::fill(out, |c| {
        if cond.is_logical_one(c) {
            a.get(c)
        } else {
            b.get(c)
        }
    });
    Ok(())
}

fn iswitch(out: &mut Pixel, ops: &mut [Operand<'_>], _: &mut EvalCtx<'_>) -> EvalResult {
    let (pairs, default) = ops.split_at(ops.len() - 1);
    let default = default[0].value;
    Pixel::fill(out, |c| {
        pairs
            .chunks_exact(2)
            .find(|pair| pair[0].value.is_logical_one(c))
            .map_or(default.get(c), |pair| pair[1].value.get(c))
    });
    Ok(())
}

fn iswitch_args(args: &[Expr]) -> Result<(), String> {
    if args.len() % 2 == 0 {
        return Err(
            "iswitch() takes condition/value pairs followed by a default value".to_string(),
        );
    }
    Ok(())
}

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::function("iif", 3, Some(3), iif, "Conditional: iif(c, a, b).")
        .control(Control::Iif),
    FunctionDef::function("iswitch", 3, None, iswitch, "Multi-way conditional with a default.")
        .control(Control::Iswitch)
        .validated(iswitch_args),
];
