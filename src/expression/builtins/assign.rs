use crate::expression::registry::{AssignOp, FunctionDef};
use crate::expression::vm::{EvalCtx, EvalError, EvalResult, Operand};
use crate::foundation::pixel::Pixel;

/// Write `ops[1]` into the variable aliased by `ops[0]`.
///
/// With a channel the selected component is combined and the result is gray; otherwise `=`
/// replaces the whole value (taking the assigned value's shape) and compound operators promote
/// both sides before combining.
fn assign_with(
    op: AssignOp,
    out: &mut Pixel,
    ops: &[Operand<'_>],
    ctx: &mut EvalCtx<'_>,
) -> EvalResult {
    let Some((slot, channel)) = ops[0].variable() else {
        return Err(EvalError::new("assignment target is not a variable"));
    };
    let value = ops[1].value;
    let current = ctx
        .vars
        .get_mut(slot.0 as usize)
        .ok_or_else(|| EvalError::new(format!("variable slot {} is not allocated", slot.0)))?;
    match channel {
        Some(c) if c > 2 => {
            return Err(EvalError::new(format!(
                "variable channel index out of range: {c}"
            )));
        }
        Some(c) => {
            if c > 0 && !current.is_color() {
                *current = current.to_color();
            }
            let r = op.apply(current.get(c), value.get(c));
            current.set(c, r);
            *out = Pixel::gray(r);
        }
        None => {
            let next = if op == AssignOp::Set {
                value
            } else {
                let color = current.is_color() || value.is_color();
                let a = if color { current.to_color() } else { *current };
                let mut n = Pixel::shaped(color);
                Pixel::fill(&mut n, |c| op.apply(a.get(c), value.get(c)));
                n
            };
            *current = next;
            *out = next;
        }
    }
    Ok(())
}

macro_rules! assign_fn {
    ($name:ident, $op:expr) => {
        fn $name(out: &mut Pixel, ops: &mut [Operand<'_>], ctx: &mut EvalCtx<'_>) -> EvalResult {
            assign_with($op, out, ops, ctx)
        }
    };
}

assign_fn!(set, AssignOp::Set);
assign_fn!(add, AssignOp::Add);
assign_fn!(sub, AssignOp::Sub);
assign_fn!(mul, AssignOp::Mul);
assign_fn!(div, AssignOp::Div);
assign_fn!(pow, AssignOp::Pow);
assign_fn!(rem, AssignOp::Mod);
assign_fn!(dif, AssignOp::Dif);
assign_fn!(land, AssignOp::And);
assign_fn!(lor, AssignOp::Or);

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::operator("assign", &["="], 2, set, "Assignment.").assignment(AssignOp::Set),
    FunctionDef::operator("add_assign", &["+="], 2, add, "Addition assignment.")
        .assignment(AssignOp::Add),
    FunctionDef::operator("sub_assign", &["-="], 2, sub, "Subtraction assignment.")
        .assignment(AssignOp::Sub),
    FunctionDef::operator("mul_assign", &["*="], 2, mul, "Multiplication assignment.")
        .assignment(AssignOp::Mul),
    FunctionDef::operator("div_assign", &["/="], 2, div, "Division assignment.")
        .assignment(AssignOp::Div),
    FunctionDef::operator("pow_assign", &["^="], 2, pow, "Exponentiation assignment.")
        .assignment(AssignOp::Pow),
    FunctionDef::operator("mod_assign", &["%="], 2, rem, "Remainder assignment.")
        .assignment(AssignOp::Mod),
    FunctionDef::operator("dif_assign", &["--="], 2, dif, "Absolute difference assignment.")
        .assignment(AssignOp::Dif),
    FunctionDef::operator("land_assign", &["&&="], 2, land, "Logical AND assignment.")
        .assignment(AssignOp::And),
    FunctionDef::operator("lor_assign", &["||="], 2, lor, "Logical OR assignment.")
        .assignment(AssignOp::Or),
];
