use crate::expression::registry::{FunctionDef, Invariance};
use crate::expression::vm::{EvalCtx, EvalResult, Operand};
use crate::foundation::pixel::Pixel;
use rand::Rng;

/// `random()`: uniform deviate in `[0, 1)`.
fn random(out: &mut Pixel, _: &mut [Operand<'_>], ctx: &mut EvalCtx<'_>) -> EvalResult {
    out.set_gray(ctx.rng.random::<f64>());
    Ok(())
}

/// `gauss([mean, sigma])`: normal deviate (Box-Muller).
fn gauss(out: &mut Pixel, ops: &mut [Operand<'_>], ctx: &mut EvalCtx<'_>) -> EvalResult {
    let (mean, sigma) = match ops {
        [m, s] => (m.value.get(0), s.value.get(0)),
        _ => (0.0, 1.0),
    };
    let u1 = 1.0 - ctx.rng.random::<f64>();
    let u2 = ctx.rng.random::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    out.set_gray(mean + sigma * z);
    Ok(())
}

fn gauss_args(args: &[crate::expression::node::Expr]) -> Result<(), String> {
    if args.len() == 1 {
        return Err("gauss() takes no arguments or (mean, sigma)".to_string());
    }
    Ok(())
}

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::function("random", 0, Some(0), random, "Uniform random deviate in [0, 1).")
        .aliases(&["rnd"])
        .invariance(Invariance::Never),
    FunctionDef::function("gauss", 0, Some(2), gauss, "Normal random deviate.")
        .invariance(Invariance::Never)
        .validated(gauss_args),
];
