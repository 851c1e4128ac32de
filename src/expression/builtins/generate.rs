use crate::expression::generators::GeneratorArgs;
use crate::expression::node::Expr;
use crate::expression::registry::FunctionDef;
use crate::expression::vm::{EvalCtx, EvalError, EvalResult, Operand};
use crate::foundation::error::{PixelMathError, PixelMathResult};
use crate::foundation::pixel::Pixel;
use crate::imaging::raster::Raster;

/// Per-pixel evaluation of a generator call. The generator runner replaces these calls with
/// image references before execution, so reaching this is a compiler fault.
fn not_generated(_: &mut Pixel, _: &mut [Operand<'_>], _: &mut EvalCtx<'_>) -> EvalResult {
    Err(EvalError::new("image generator call was not pre-evaluated"))
}

/// Convolve every channel with a centred 1-D kernel horizontally, then vertically.
/// Borders are extended by clamping.
fn separable(src: &Raster, kernel: &[f64]) -> PixelMathResult<Raster> {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let channels = src.channels();
    let radius = (kernel.len() / 2) as isize;
    let clamp = |v: isize, n: usize| v.clamp(0, n as isize - 1) as usize;

    let input = src.data();
    let mut tmp = src.zeros_like()?;
    {
        let t = tmp.data_mut();
        for y in 0..h {
            for x in 0..w {
                for c in 0..channels {
                    let mut acc = 0.0;
                    for (k, wt) in kernel.iter().enumerate() {
                        let sx = clamp(x as isize + k as isize - radius, w);
                        acc += wt * input[(y * w + sx) * channels + c];
                    }
                    t[(y * w + x) * channels + c] = acc;
                }
            }
        }
    }
    let mut out = src.zeros_like()?;
    {
        let t = tmp.data();
        let o = out.data_mut();
        for y in 0..h {
            for x in 0..w {
                for c in 0..channels {
                    let mut acc = 0.0;
                    for (k, wt) in kernel.iter().enumerate() {
                        let sy = clamp(y as isize + k as isize - radius, h);
                        acc += wt * t[(sy * w + x) * channels + c];
                    }
                    o[(y * w + x) * channels + c] = acc;
                }
            }
        }
    }
    Ok(out)
}

/// Remap pixels: `out(x, y) = src(f(x, y))`, zero where `f` yields `None`.
fn remap(src: &Raster, f: impl Fn(i64, i64) -> Option<(i64, i64)>) -> PixelMathResult<Raster> {
    let mut out = src.zeros_like()?;
    for y in 0..src.height() {
        for x in 0..src.width() {
            let Some((sx, sy)) = f(i64::from(x), i64::from(y)) else {
                continue;
            };
            if !src.includes(sx, sy) {
                continue;
            }
            for c in 0..src.channels() {
                out.set_sample(x, y, c, src.sample(sx as u32, sy as u32, c));
            }
        }
    }
    Ok(out)
}

fn box_size(v: f64) -> Result<usize, String> {
    if v.fract() != 0.0 || v < 3.0 || v % 2.0 == 0.0 {
        return Err(format!(
            "bconv(): filter size must be an odd integer >= 3, got {v}"
        ));
    }
    Ok(v as usize)
}

fn gauss_sigma(v: f64) -> Result<f64, String> {
    if !(v.is_finite() && v > 0.0) {
        return Err(format!("gconv(): sigma must be positive, got {v}"));
    }
    Ok(v)
}

/// Empty kernel with room for `taps` weights; huge filters are resource errors.
fn kernel_buffer(name: &str, taps: f64) -> PixelMathResult<Vec<f64>> {
    let limit = (isize::MAX as usize / size_of::<f64>()) as f64;
    if !(taps <= limit) {
        return Err(PixelMathError::resource(format!(
            "{name}(): filter of {taps} taps is too large"
        )));
    }
    let mut kernel = Vec::new();
    kernel.try_reserve_exact(taps as usize).map_err(|_| {
        PixelMathError::resource(format!(
            "{name}(): out of memory allocating a filter of {taps} taps"
        ))
    })?;
    Ok(kernel)
}

fn bconv(args: &GeneratorArgs<'_>) -> PixelMathResult<Raster> {
    let n = match args.params.first() {
        Some(v) => box_size(*v).map_err(PixelMathError::compile)?,
        None => 3,
    };
    let mut kernel = kernel_buffer("bconv", n as f64)?;
    kernel.resize(n, 1.0 / n as f64);
    separable(args.image, &kernel)
}

fn gconv(args: &GeneratorArgs<'_>) -> PixelMathResult<Raster> {
    let sigma = match args.params.first() {
        Some(v) => gauss_sigma(*v).map_err(PixelMathError::compile)?,
        None => 2.0,
    };
    let radius = (3.0 * sigma).ceil();
    let mut kernel = kernel_buffer("gconv", 2.0 * radius + 1.0)?;
    let radius = radius as isize;
    kernel.extend(
        (-radius..=radius).map(|i| (-(i as f64).powi(2) / (2.0 * sigma * sigma)).exp()),
    );
    let total: f64 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= total;
    }
    separable(args.image, &kernel)
}

fn hmirror(args: &GeneratorArgs<'_>) -> PixelMathResult<Raster> {
    let w = i64::from(args.image.width());
    remap(args.image, |x, y| Some((w - 1 - x, y)))
}

fn vmirror(args: &GeneratorArgs<'_>) -> PixelMathResult<Raster> {
    let h = i64::from(args.image.height());
    remap(args.image, |x, y| Some((x, h - 1 - y)))
}

fn translate(args: &GeneratorArgs<'_>) -> PixelMathResult<Raster> {
    let [dx, dy] = [0, 1].map(|i| args.params.get(i).copied().unwrap_or(0.0).round());
    if !(dx.is_finite() && dy.is_finite()) {
        return Err(PixelMathError::compile(
            "translate(): offsets must be finite",
        ));
    }
    let (dx, dy) = (dx as i64, dy as i64);
    remap(args.image, |x, y| Some((x - dx, y - dy)))
}

fn literal_arg(args: &[Expr], i: usize) -> Option<f64> {
    match args.get(i) {
        Some(Expr::Sample(v)) => Some(*v),
        _ => None,
    }
}

fn bconv_args(args: &[Expr]) -> Result<(), String> {
    literal_arg(args, 1).map_or(Ok(()), |v| box_size(v).map(|_| ()))
}

fn gconv_args(args: &[Expr]) -> Result<(), String> {
    literal_arg(args, 1).map_or(Ok(()), |v| gauss_sigma(v).map(|_| ()))
}

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::function("bconv", 1, Some(2), not_generated, "Box filter of odd size n (default 3).")
        .generator(bconv)
        .validated(bconv_args),
    FunctionDef::function("gconv", 1, Some(2), not_generated, "Gaussian filter (default sigma 2).")
        .generator(gconv)
        .validated(gconv_args),
    FunctionDef::function("hmirror", 1, Some(1), not_generated, "Horizontal mirror.")
        .generator(hmirror),
    FunctionDef::function("vmirror", 1, Some(1), not_generated, "Vertical mirror.")
        .generator(vmirror),
    FunctionDef::function("translate", 3, Some(3), not_generated, "Integer translation by (dx, dy).")
        .generator(translate),
];
