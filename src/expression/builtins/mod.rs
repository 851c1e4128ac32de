//! Built-in functions and operators.
//!
//! Each submodule exposes a `FUNCTIONS` table; the registry concatenates them in the order of
//! [`TABLES`].

use crate::expression::registry::FunctionDef;
use crate::expression::vm::Operand;
use crate::foundation::pixel::Pixel;

pub(crate) mod assign;
pub(crate) mod control;
pub(crate) mod generate;
pub(crate) mod geometry;
pub(crate) mod images;
pub(crate) mod math;
pub(crate) mod ops;
pub(crate) mod random;
pub(crate) mod stats;

pub(crate) const TABLES: &[&[FunctionDef]] = &[
    ops::FUNCTIONS,
    assign::FUNCTIONS,
    math::FUNCTIONS,
    stats::FUNCTIONS,
    geometry::FUNCTIONS,
    images::FUNCTIONS,
    random::FUNCTIONS,
    control::FUNCTIONS,
    generate::FUNCTIONS,
];

#[inline]
pub(crate) fn unary(out: &mut Pixel, ops: &[Operand<'_>], f: impl Fn(f64) -> f64) {
    let a = ops[0].value;
    Pixel::fill(out, |c| f(a.get(c)));
}

#[inline]
pub(crate) fn binary(out: &mut Pixel, ops: &[Operand<'_>], f: impl Fn(f64, f64) -> f64) {
    let (a, b) = (ops[0].value, ops[1].value);
    Pixel::fill(out, |c| f(a.get(c), b.get(c)));
}

#[inline]
pub(crate) fn truth(v: bool) -> f64 {
    if v { 1.0 } else { 0.0 }
}

/// Per-channel function of one operand.
macro_rules! unary_fn {
    ($name:ident, |$a:ident| $body:expr) => {
        fn $name(
            out: &mut $crate::foundation::pixel::Pixel,
            ops: &mut [$crate::expression::vm::Operand<'_>],
            _: &mut $crate::expression::vm::EvalCtx<'_>,
        ) -> $crate::expression::vm::EvalResult {
            $crate::expression::builtins::unary(out, ops, |$a| $body);
            Ok(())
        }
    };
}

/// Per-channel function of two operands.
macro_rules! binary_fn {
    ($name:ident, |$a:ident, $b:ident| $body:expr) => {
        fn $name(
            out: &mut $crate::foundation::pixel::Pixel,
            ops: &mut [$crate::expression::vm::Operand<'_>],
            _: &mut $crate::expression::vm::EvalCtx<'_>,
        ) -> $crate::expression::vm::EvalResult {
            $crate::expression::builtins::binary(out, ops, |$a, $b| $body);
            Ok(())
        }
    };
}

pub(crate) use binary_fn;
pub(crate) use unary_fn;

#[cfg(test)]
#[path = "../../../tests/unit/expression/builtins.rs"]
mod tests;
