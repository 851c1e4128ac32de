use crate::expression::builtins::truth;
use crate::expression::registry::{FunctionDef, Invariance};
use crate::expression::vm::{EvalCtx, EvalResult, Operand};
use crate::foundation::pixel::Pixel;

fn normalized(pos: u32, extent: u32) -> f64 {
    if extent <= 1 {
        0.0
    } else {
        f64::from(pos) / f64::from(extent - 1)
    }
}

fn x(out: &mut Pixel, _: &mut [Operand<'_>], ctx: &mut EvalCtx<'_>) -> EvalResult {
    out.set_gray(normalized(ctx.x, ctx.canvas.width));
    Ok(())
}

fn y(out: &mut Pixel, _: &mut [Operand<'_>], ctx: &mut EvalCtx<'_>) -> EvalResult {
    out.set_gray(normalized(ctx.y, ctx.canvas.height));
    Ok(())
}

fn xpos(out: &mut Pixel, _: &mut [Operand<'_>], ctx: &mut EvalCtx<'_>) -> EvalResult {
    out.set_gray(f64::from(ctx.x));
    Ok(())
}

fn ypos(out: &mut Pixel, _: &mut [Operand<'_>], ctx: &mut EvalCtx<'_>) -> EvalResult {
    out.set_gray(f64::from(ctx.y));
    Ok(())
}

fn width(out: &mut Pixel, _: &mut [Operand<'_>], ctx: &mut EvalCtx<'_>) -> EvalResult {
    out.set_gray(f64::from(ctx.canvas.width));
    Ok(())
}

fn height(out: &mut Pixel, _: &mut [Operand<'_>], ctx: &mut EvalCtx<'_>) -> EvalResult {
    out.set_gray(f64::from(ctx.canvas.height));
    Ok(())
}

fn area(out: &mut Pixel, _: &mut [Operand<'_>], ctx: &mut EvalCtx<'_>) -> EvalResult {
    out.set_gray(ctx.canvas.area() as f64);
    Ok(())
}

/// `inrect(x0, y0, w, h)`: 1 inside the rectangle, 0 elsewhere.
fn inrect(out: &mut Pixel, ops: &mut [Operand<'_>], ctx: &mut EvalCtx<'_>) -> EvalResult {
    let [x0, y0, w, h] = [0, 1, 2, 3].map(|i| ops[i].value.get(0));
    let (px, py) = (f64::from(ctx.x), f64::from(ctx.y));
    out.set_gray(truth(px >= x0 && px < x0 + w && py >= y0 && py < y0 + h));
    Ok(())
}

/// `inellipse(xc, yc, rx, ry)`: 1 inside the axis-aligned ellipse, 0 elsewhere.
fn inellipse(out: &mut Pixel, ops: &mut [Operand<'_>], ctx: &mut EvalCtx<'_>) -> EvalResult {
    let [xc, yc, rx, ry] = [0, 1, 2, 3].map(|i| ops[i].value.get(0));
    let inside = if rx <= 0.0 || ry <= 0.0 {
        false
    } else {
        let dx = (f64::from(ctx.x) - xc) / rx;
        let dy = (f64::from(ctx.y) - yc) / ry;
        dx * dx + dy * dy <= 1.0
    };
    out.set_gray(truth(inside));
    Ok(())
}

/// `rdist([xc, yc])`: distance in pixels from a point, the canvas centre by default.
fn rdist(out: &mut Pixel, ops: &mut [Operand<'_>], ctx: &mut EvalCtx<'_>) -> EvalResult {
    let (xc, yc) = match ops {
        [xc, yc] => (xc.value.get(0), yc.value.get(0)),
        _ => (
            (f64::from(ctx.canvas.width) - 1.0) / 2.0,
            (f64::from(ctx.canvas.height) - 1.0) / 2.0,
        ),
    };
    let (dx, dy) = (f64::from(ctx.x) - xc, f64::from(ctx.y) - yc);
    out.set_gray(dx.hypot(dy));
    Ok(())
}

fn rdist_args(args: &[crate::expression::node::Expr]) -> Result<(), String> {
    if args.len() == 1 {
        return Err("rdist() takes no arguments or a centre (xc, yc)".to_string());
    }
    Ok(())
}

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::function("x", 0, Some(0), x, "Normalized column position in [0, 1].")
        .invariance(Invariance::Never),
    FunctionDef::function("y", 0, Some(0), y, "Normalized row position in [0, 1].")
        .invariance(Invariance::Never),
    FunctionDef::function("xpos", 0, Some(0), xpos, "Column index of the current pixel.")
        .invariance(Invariance::Never),
    FunctionDef::function("ypos", 0, Some(0), ypos, "Row index of the current pixel.")
        .invariance(Invariance::Never),
    FunctionDef::function("w", 0, Some(0), width, "Canvas width in pixels.")
        .aliases(&["width"]),
    FunctionDef::function("h", 0, Some(0), height, "Canvas height in pixels.")
        .aliases(&["height"]),
    FunctionDef::function("area", 0, Some(0), area, "Canvas area in pixels."),
    FunctionDef::function("inrect", 4, Some(4), inrect, "1 inside the rectangle (x0, y0, w, h).")
        .invariance(Invariance::Never),
    FunctionDef::function("inellipse", 4, Some(4), inellipse, "1 inside the ellipse (xc, yc, rx, ry).")
        .invariance(Invariance::Never),
    FunctionDef::function("rdist", 0, Some(2), rdist, "Distance from a point, the centre by default.")
        .invariance(Invariance::Never)
        .validated(rdist_args),
];
