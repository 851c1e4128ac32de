use crate::expression::registry::{FunctionDef, Invariance};
use crate::expression::vm::{EvalCtx, EvalError, EvalResult, Operand};
use crate::foundation::pixel::Pixel;
use crate::imaging::raster::StatKind;
use smallvec::SmallVec;

/// Statistic across the operands, per channel; a single image reference yields the statistic of
/// the whole image instead.
fn aggregate(kind: StatKind, out: &mut Pixel, ops: &[Operand<'_>]) -> EvalResult {
    if let [single] = ops
        && let Some(img) = single.image()
    {
        *out = img
            .raster
            .statistic_pixel(kind, img.channel)
            .map_err(|e| EvalError::new(format!("{}: {e}", img.id)))?;
        return Ok(());
    }
    let mut buf: SmallVec<[f64; 8]> = SmallVec::with_capacity(ops.len());
    Pixel::fill(out, |c| {
        buf.clear();
        buf.extend(ops.iter().map(|o| o.value.get(c)));
        kind.compute(&buf)
    });
    Ok(())
}

/// Extreme sample over every channel of every operand, as a gray value.
fn extreme_sample(out: &mut Pixel, ops: &[Operand<'_>], kind: StatKind) -> EvalResult {
    let pick = |a: f64, b: f64| match kind {
        StatKind::Minimum => a.min(b),
        _ => a.max(b),
    };
    let start = match kind {
        StatKind::Minimum => f64::INFINITY,
        _ => f64::NEG_INFINITY,
    };
    let mut acc = start;
    if let [single] = ops
        && let Some(img) = single.image()
    {
        let r = &img.raster;
        let channels: Vec<usize> = match img.channel {
            Some(c) if c >= r.channels() => {
                return Err(EvalError::new(format!(
                    "{}: channel index out of range: {c}",
                    img.id
                )));
            }
            Some(c) => vec![c],
            None => (0..r.nominal_channels()).collect(),
        };
        for c in channels {
            acc = pick(acc, r.statistic(kind, c));
        }
    } else {
        for o in ops {
            for &v in o.value.samples() {
                acc = pick(acc, v);
            }
        }
    }
    *out = Pixel::gray(acc);
    Ok(())
}

macro_rules! aggregate_fn {
    ($name:ident, $kind:expr) => {
        fn $name(out: &mut Pixel, ops: &mut [Operand<'_>], _: &mut EvalCtx<'_>) -> EvalResult {
            aggregate($kind, out, ops)
        }
    };
}

aggregate_fn!(min, StatKind::Minimum);
aggregate_fn!(max, StatKind::Maximum);
aggregate_fn!(sum, StatKind::Sum);
aggregate_fn!(mean, StatKind::Mean);
aggregate_fn!(med, StatKind::Median);
aggregate_fn!(sdev, StatKind::StdDev);
aggregate_fn!(var, StatKind::Variance);
aggregate_fn!(mdev, StatKind::MedianDev);
aggregate_fn!(adev, StatKind::AvgDev);
aggregate_fn!(ssqr, StatKind::SumSquares);
aggregate_fn!(asqr, StatKind::MeanSquares);

fn maxsample(out: &mut Pixel, ops: &mut [Operand<'_>], _: &mut EvalCtx<'_>) -> EvalResult {
    extreme_sample(out, ops, StatKind::Maximum)
}

fn minsample(out: &mut Pixel, ops: &mut [Operand<'_>], _: &mut EvalCtx<'_>) -> EvalResult {
    extreme_sample(out, ops, StatKind::Minimum)
}

const fn statistic(
    token: &'static str,
    eval: crate::expression::registry::EvalFn,
    summary: &'static str,
) -> FunctionDef {
    FunctionDef::function(token, 1, None, eval, summary).invariance(Invariance::ImageStatistics)
}

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    statistic("min", min, "Minimum of the arguments or of an image.").aliases(&["minimum"]),
    statistic("max", max, "Maximum of the arguments or of an image.").aliases(&["maximum"]),
    statistic("sum", sum, "Sum of the arguments or of an image."),
    statistic("mean", mean, "Arithmetic mean of the arguments or of an image.")
        .aliases(&["avg"]),
    statistic("med", med, "Median of the arguments or of an image.").aliases(&["median"]),
    statistic("sdev", sdev, "Standard deviation of the arguments or of an image.")
        .aliases(&["stddev"]),
    statistic("var", var, "Variance of the arguments or of an image.")
        .aliases(&["variance"]),
    statistic("mdev", mdev, "Normalized median absolute deviation."),
    statistic("adev", adev, "Normalized average absolute deviation."),
    statistic("ssqr", ssqr, "Sum of squares."),
    statistic("asqr", asqr, "Mean of squares."),
    statistic("maxsample", maxsample, "Largest sample over every channel."),
    statistic("minsample", minsample, "Smallest sample over every channel."),
];
