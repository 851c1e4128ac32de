use crate::expression::builtins::{binary_fn, unary_fn};
use crate::expression::registry::FunctionDef;
use crate::expression::vm::{EvalCtx, EvalResult, Operand};
use crate::foundation::pixel::Pixel;

unary_fn!(abs, |a| a.abs());
unary_fn!(acos, |a| a.acos());
unary_fn!(asin, |a| a.asin());
unary_fn!(atan, |a| a.atan());
binary_fn!(atan2, |y, x| y.atan2(x));
unary_fn!(ceil, |a| a.ceil());
unary_fn!(cos, |a| a.cos());
unary_fn!(cosh, |a| a.cosh());
unary_fn!(exp, |a| a.exp());
unary_fn!(floor, |a| a.floor());
unary_fn!(frac, |a| a.fract());
unary_fn!(ln, |a| a.ln());
unary_fn!(log10, |a| a.log10());
unary_fn!(log2, |a| a.log2());
unary_fn!(sign, |a| if a > 0.0 {
    1.0
} else if a < 0.0 {
    -1.0
} else {
    0.0
});
unary_fn!(sin, |a| a.sin());
unary_fn!(sinh, |a| a.sinh());
unary_fn!(sqrt, |a| a.sqrt());
unary_fn!(tan, |a| a.tan());
unary_fn!(tanh, |a| a.tanh());
unary_fn!(trunc, |a| a.trunc());

/// `round(x[, n])`: round half away from zero to `n` decimal places.
fn round(out: &mut Pixel, ops: &mut [Operand<'_>], _: &mut EvalCtx<'_>) -> EvalResult {
    let x = ops[0].value;
    let digits = ops.get(1).map(|o| o.value);
    Pixel::fill(out, |c| match digits {
        Some(d) => {
            let scale = 10f64.powi(d.get(c).trunc() as i32);
            (x.get(c) * scale).round() / scale
        }
        None => x.get(c).round(),
    });
    Ok(())
}

fn pi(out: &mut Pixel, _: &mut [Operand<'_>], _: &mut EvalCtx<'_>) -> EvalResult {
    out.set_gray(std::f64::consts::PI);
    Ok(())
}

/// Midtones transfer function with midtones balance `m`.
pub(crate) fn midtones_transfer(m: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    if x == m {
        return 0.5;
    }
    (m - 1.0) * x / ((2.0 * m - 1.0) * x - m)
}

binary_fn!(mtf, |m, x| midtones_transfer(m, x));

/// `range(x, lo, hi)`: clamp.
fn range(out: &mut Pixel, ops: &mut [Operand<'_>], _: &mut EvalCtx<'_>) -> EvalResult {
    let (x, lo, hi) = (ops[0].value, ops[1].value, ops[2].value);
    Pixel::fill(out, |c| x.get(c).max(lo.get(c)).min(hi.get(c)));
    Ok(())
}

/// `rescale(x, lo, hi)`: map `[lo, hi]` linearly to `[0, 1]`.
fn rescale(out: &mut Pixel, ops: &mut [Operand<'_>], _: &mut EvalCtx<'_>) -> EvalResult {
    let (x, lo, hi) = (ops[0].value, ops[1].value, ops[2].value);
    Pixel::fill(out, |c| {
        let span = hi.get(c) - lo.get(c);
        if span == 0.0 {
            0.0
        } else {
            (x.get(c) - lo.get(c)) / span
        }
    });
    Ok(())
}

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::function("abs", 1, Some(1), abs, "Absolute value."),
    FunctionDef::function("acos", 1, Some(1), acos, "Arc cosine."),
    FunctionDef::function("asin", 1, Some(1), asin, "Arc sine."),
    FunctionDef::function("atan", 1, Some(1), atan, "Arc tangent."),
    FunctionDef::function("atan2", 2, Some(2), atan2, "Arc tangent of y/x."),
    FunctionDef::function("ceil", 1, Some(1), ceil, "Smallest integer not below x."),
    FunctionDef::function("cos", 1, Some(1), cos, "Cosine."),
    FunctionDef::function("cosh", 1, Some(1), cosh, "Hyperbolic cosine."),
    FunctionDef::function("exp", 1, Some(1), exp, "Exponential."),
    FunctionDef::function("floor", 1, Some(1), floor, "Largest integer not above x."),
    FunctionDef::function("frac", 1, Some(1), frac, "Fractional part."),
    FunctionDef::function("ln", 1, Some(1), ln, "Natural logarithm."),
    FunctionDef::function("log", 1, Some(1), log10, "Base 10 logarithm.").aliases(&["log10"]),
    FunctionDef::function("log2", 1, Some(1), log2, "Base 2 logarithm."),
    FunctionDef::function("round", 1, Some(2), round, "Round to n decimal places."),
    FunctionDef::function("sign", 1, Some(1), sign, "Sign: -1, 0 or 1."),
    FunctionDef::function("sin", 1, Some(1), sin, "Sine."),
    FunctionDef::function("sinh", 1, Some(1), sinh, "Hyperbolic sine."),
    FunctionDef::function("sqrt", 1, Some(1), sqrt, "Square root."),
    FunctionDef::function("tan", 1, Some(1), tan, "Tangent."),
    FunctionDef::function("tanh", 1, Some(1), tanh, "Hyperbolic tangent."),
    FunctionDef::function("trunc", 1, Some(1), trunc, "Integer part."),
    FunctionDef::function("pi", 0, Some(0), pi, "The constant pi."),
    FunctionDef::function("mtf", 2, Some(2), mtf, "Midtones transfer function mtf(m, x)."),
    FunctionDef::function("range", 3, Some(3), range, "Clamp x to [lo, hi].")
        .aliases(&["clamp"]),
    FunctionDef::function("rescale", 3, Some(3), rescale, "Map [lo, hi] to [0, 1]."),
];
