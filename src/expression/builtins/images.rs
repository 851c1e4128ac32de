use crate::expression::builtins::truth;
use crate::expression::registry::{FunctionDef, Invariance};
use crate::expression::vm::{EvalCtx, EvalError, EvalResult, Operand};
use crate::foundation::pixel::Pixel;
use crate::imaging::raster::Raster;

fn image_of<'p>(op: &Operand<'p>, func: &str) -> Result<&'p Raster, EvalError> {
    op.image()
        .map(|img| img.raster.as_ref())
        .ok_or_else(|| EvalError::new(format!("{func}(): the first argument must be an image")))
}

/// `pixel(image, x, y[, c])`: sample at absolute coordinates, 0 outside the image.
fn pixel(out: &mut Pixel, ops: &mut [Operand<'_>], _: &mut EvalCtx<'_>) -> EvalResult {
    let r = image_of(&ops[0], "pixel")?;
    let px = ops[1].value.get(0).round();
    let py = ops[2].value.get(0).round();
    let channel = match ops.get(3) {
        Some(c) => {
            let c = c.value.get(0).trunc();
            if c < 0.0 || c >= r.channels() as f64 {
                return Err(EvalError::new(format!(
                    "pixel(): channel index out of range: {c}"
                )));
            }
            Some(c as usize)
        }
        None => None,
    };
    if !px.is_finite() || !py.is_finite() || !r.includes(px as i64, py as i64) {
        *out = Pixel::gray(0.0);
        return Ok(());
    }
    let (px, py) = (px as u32, py as u32);
    *out = match channel {
        Some(c) => Pixel::gray(r.sample(px, py, c)),
        None => r.pixel(px, py),
    };
    Ok(())
}

/// `n(image)`: number of pixels.
fn count(out: &mut Pixel, ops: &mut [Operand<'_>], _: &mut EvalCtx<'_>) -> EvalResult {
    let r = image_of(&ops[0], "n")?;
    *out = Pixel::gray(f64::from(r.width()) * f64::from(r.height()));
    Ok(())
}

fn iscolor(out: &mut Pixel, ops: &mut [Operand<'_>], _: &mut EvalCtx<'_>) -> EvalResult {
    let r = image_of(&ops[0], "iscolor")?;
    *out = Pixel::gray(truth(r.is_color()));
    Ok(())
}

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::function("pixel", 3, Some(4), pixel, "Image sample at (x, y), 0 outside.")
        .invariance(Invariance::PixelLookup)
        .image_argument(),
    FunctionDef::function("n", 1, Some(1), count, "Number of pixels of an image.")
        .invariance(Invariance::PixelLookup)
        .image_argument(),
    FunctionDef::function("iscolor", 1, Some(1), iscolor, "1 for colour images, 0 for gray ones.")
        .invariance(Invariance::PixelLookup)
        .image_argument(),
];
