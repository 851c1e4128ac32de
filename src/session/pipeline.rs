use crate::expression::bind::Binder;
use crate::expression::compile::postfix_statements;
use crate::expression::generators::{GeneratedImages, run_image_generators};
use crate::expression::instr::{Program, SlotPrograms};
use crate::expression::link::link_program;
use crate::expression::node::Expr;
use crate::expression::solve::{FoldCtx, solve_invariants};
use crate::expression::validate::validate;
use crate::foundation::core::{Canvas, Geometry, Slot};
use crate::foundation::error::{PixelMathError, PixelMathResult};
use crate::imaging::raster::Raster;
use crate::imaging::store::{ImageScope, ImageStore};
use crate::render::evaluator::{CompiledProgram, ExecuteOpts, ExecuteReport, Output, execute};
use crate::symbols::table::{GlobalReport, SymbolTable};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Statement lists for the four expression slots.
///
/// Each slot holds statements evaluated in order for every pixel; the last one produces the
/// pixel value.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ChannelExpressions {
    /// Red channel, gray channel, or the combined RGB expression.
    pub red_or_gray: Vec<Expr>,
    /// Green channel.
    pub green: Vec<Expr>,
    /// Blue channel.
    pub blue: Vec<Expr>,
    /// Alpha channel.
    pub alpha: Vec<Expr>,
}

impl ChannelExpressions {
    /// One expression for every nominal channel.
    pub fn single(expr: Expr) -> Self {
        Self {
            red_or_gray: vec![expr],
            ..Self::default()
        }
    }

    /// One expression per RGB channel.
    pub fn per_channel(red: Expr, green: Expr, blue: Expr) -> Self {
        Self {
            red_or_gray: vec![red],
            green: vec![green],
            blue: vec![blue],
            alpha: Vec::new(),
        }
    }

    /// Parse channel expressions from JSON; unknown function tokens are serialization errors.
    pub fn from_json(json: &str) -> PixelMathResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Statements of one slot.
    pub fn slot(&self, slot: Slot) -> &[Expr] {
        match slot {
            Slot::RedOrGray => &self.red_or_gray,
            Slot::Green => &self.green,
            Slot::Blue => &self.blue,
            Slot::Alpha => &self.alpha,
        }
    }
}

/// Evaluated sub-region of the target canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Region {
    /// Left edge.
    pub x0: u32,
    /// Top edge.
    pub y0: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// Shape of the execution target.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Target {
    /// Full canvas.
    pub canvas: Canvas,
    /// Three nominal channels instead of one.
    #[serde(default)]
    pub color: bool,
    /// Output carries an alpha channel.
    #[serde(default)]
    pub alpha: bool,
    /// Target image: the `$T` operand, the default image of symbol functions and the initial
    /// contents of the output.
    #[serde(default)]
    pub image: Option<String>,
    /// Evaluate only this part of the canvas; the output raster has the region's size.
    #[serde(default)]
    pub region: Option<Region>,
}

impl Target {
    /// A blank canvas with no target image.
    pub fn blank(canvas: Canvas, color: bool) -> Self {
        Self {
            canvas,
            color,
            alpha: false,
            image: None,
            region: None,
        }
    }

    /// Target an image of the store, taking its size and colour space.
    pub fn image(images: &ImageStore, id: &str) -> PixelMathResult<Self> {
        let r = images
            .get(id)
            .ok_or_else(|| PixelMathError::compile(format!("unknown image identifier '{id}'")))?;
        Ok(Self {
            canvas: Canvas::new(r.width(), r.height())?,
            color: r.is_color(),
            alpha: r.has_alpha(),
            image: Some(id.to_string()),
            region: None,
        })
    }

    /// Execution geometry.
    pub fn geometry(&self) -> PixelMathResult<Geometry> {
        let canvas = Canvas::new(self.canvas.width, self.canvas.height)?;
        match self.region {
            Some(r) => Geometry::region(canvas, r.x0, r.y0, r.width, r.height),
            None => Ok(Geometry::full(canvas)),
        }
    }
}

/// Options of [`run`] and [`compile`].
#[derive(Clone, Debug)]
pub struct PixelMathOpts {
    /// Slot 0 holds one expression for every nominal channel; slots 1 and 2 are ignored.
    pub single_expression: bool,
    /// Emit branches for short-circuit functions. Forced off for a single expression on a colour
    /// target, where branches could only test one channel.
    pub optimize: bool,
    /// Produce an output raster; otherwise evaluate for variable side effects only.
    pub generate_output: bool,
    /// Worker thread count; `None` uses the available parallelism.
    pub threads: Option<usize>,
    /// Evaluate on a single worker.
    pub single_threaded: bool,
    /// Keep generated images in the process-wide cache after the run.
    pub cache_generated_images: bool,
    /// Rescale the output linearly to this range.
    pub rescale: Option<(f64, f64)>,
    /// Clamp the output to this range when not rescaling.
    pub truncate: Option<(f64, f64)>,
    /// Seed of the per-worker random number generators.
    pub seed: u64,
    /// Cooperative abort flag.
    pub abort: Option<Arc<AtomicBool>>,
}

impl Default for PixelMathOpts {
    fn default() -> Self {
        Self {
            single_expression: true,
            optimize: true,
            generate_output: true,
            threads: None,
            single_threaded: false,
            cache_generated_images: false,
            rescale: None,
            truncate: Some((0.0, 1.0)),
            seed: 0,
            abort: None,
        }
    }
}

/// Compilation counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Invariant folds performed.
    pub folds: usize,
    /// Image generator calls replaced.
    pub generators: usize,
    /// Instructions across every linked statement.
    pub instructions: usize,
    /// Workers that ran.
    pub workers: usize,
}

/// Result of [`run`].
#[derive(Clone, Debug, PartialEq)]
pub struct RunOutput {
    /// Output raster; `None` for side-effect runs.
    pub raster: Option<Raster>,
    /// Final values of the global variables.
    pub globals: Vec<GlobalReport>,
    /// Counters.
    pub stats: RunStats,
}

struct Compiled {
    program: CompiledProgram,
    generated: GeneratedImages,
    stats: RunStats,
}

fn optimize_for(target: &Target, opts: &PixelMathOpts) -> bool {
    opts.optimize && !(opts.single_expression && target.color)
}

fn compile_inner(
    exprs: &ChannelExpressions,
    symbols: &SymbolTable,
    images: &ImageStore,
    target: &Target,
    opts: &PixelMathOpts,
) -> PixelMathResult<Compiled> {
    let optimize = optimize_for(target, opts);
    let scope = ImageScope::new(images, target.image.as_deref());
    let canvas = target.canvas;

    let mut slots: SlotPrograms = Default::default();
    let mut binder = Binder::new(symbols, scope, canvas);
    for slot in Slot::ALL {
        let statements = exprs.slot(slot);
        if opts.single_expression && matches!(slot, Slot::Green | Slot::Blue) {
            if !statements.is_empty() {
                tracing::debug!(?slot, "ignoring per-channel expression in single expression mode");
            }
            continue;
        }
        for s in statements {
            validate(s, symbols)?;
        }
        let mut programs = postfix_statements(statements, optimize);
        for p in &mut programs {
            binder.bind(p)?;
        }
        slots[slot.index()] = programs;
    }

    let fold = FoldCtx {
        symbols,
        scope,
        canvas,
    };
    let mut folds = solve_invariants(slots.iter_mut().flatten(), &fold)?;
    let mut generated = run_image_generators(slots.iter_mut().flatten(), &mut binder)?;
    if generated.executed > 0 {
        match solve_invariants(slots.iter_mut().flatten(), &fold) {
            Ok(n) => folds += n,
            Err(e) => {
                generated.release();
                return Err(e);
            }
        }
    }

    let linked = link_slots(&slots);
    let linked = match linked {
        Ok(l) => l,
        Err(e) => {
            generated.release();
            return Err(e);
        }
    };
    let instructions = linked.iter().flatten().map(Program::len).sum();
    let program = match CompiledProgram::new(linked, opts.single_expression, symbols.clone()) {
        Ok(p) => p,
        Err(e) => {
            generated.release();
            return Err(e);
        }
    };
    tracing::debug!(folds, generators = generated.executed, instructions, optimize, "compiled");
    Ok(Compiled {
        program,
        stats: RunStats {
            folds,
            generators: generated.executed,
            instructions,
            workers: 0,
        },
        generated,
    })
}

fn link_slots(slots: &SlotPrograms) -> PixelMathResult<SlotPrograms> {
    let mut out: SlotPrograms = Default::default();
    for (i, programs) in slots.iter().enumerate() {
        out[i] = programs
            .iter()
            .map(link_program)
            .collect::<PixelMathResult<Vec<_>>>()?;
    }
    Ok(out)
}

/// Compile channel expressions into an executable program.
///
/// Images synthesized by generators stay in the process-wide cache; release them with
/// [`crate::clear_image_cache`] when the program is no longer needed.
#[tracing::instrument(skip_all)]
pub fn compile(
    exprs: &ChannelExpressions,
    symbols: &SymbolTable,
    images: &ImageStore,
    target: &Target,
    opts: &PixelMathOpts,
) -> PixelMathResult<CompiledProgram> {
    compile_inner(exprs, symbols, images, target, opts).map(|c| c.program)
}

/// Compile and execute channel expressions, returning the output raster and the final values of
/// the global variables.
///
/// The output starts as a copy of the target image (zeros without one), is overwritten by the
/// evaluated channels and then rescaled or truncated. The run is all-or-nothing: on error no
/// raster is returned and generated images are released unless caching is enabled.
#[tracing::instrument(skip_all, fields(width = target.canvas.width, height = target.canvas.height))]
pub fn run(
    exprs: &ChannelExpressions,
    symbols: &SymbolTable,
    images: &ImageStore,
    target: &Target,
    opts: &PixelMathOpts,
) -> PixelMathResult<RunOutput> {
    let geometry = target.geometry()?;
    let Compiled {
        program,
        mut generated,
        mut stats,
    } = compile_inner(exprs, symbols, images, target, opts)?;
    let result = execute_compiled(&program, images, target, geometry, opts);
    if !opts.cache_generated_images {
        generated.release();
    }
    let (raster, report) = result?;
    stats.workers = report.workers;
    Ok(RunOutput {
        raster,
        globals: report.globals,
        stats,
    })
}

fn execute_compiled(
    program: &CompiledProgram,
    images: &ImageStore,
    target: &Target,
    geometry: Geometry,
    opts: &PixelMathOpts,
) -> PixelMathResult<(Option<Raster>, ExecuteReport)> {
    let exec = ExecuteOpts {
        threads: opts.threads,
        single_threaded: opts.single_threaded,
        seed: opts.seed,
        abort: opts.abort.clone(),
    };
    if !opts.generate_output {
        let channels =
            usize::from(if target.color { 3u8 } else { 1 }) + usize::from(target.alpha);
        let report = execute(program, Output::SideEffects { channels }, geometry, &exec)?;
        return Ok((None, report));
    }

    let mut raster = Raster::new(geometry.width, geometry.height, target.color, target.alpha)?;
    if let Some(id) = target.image.as_deref() {
        let source = ImageScope::new(images, Some(id)).find(None)?;
        copy_region(source, &mut raster, geometry);
    }
    let report = execute(program, Output::Raster(&mut raster), geometry, &exec)?;
    if let Some((lo, hi)) = opts.rescale {
        raster.rescale(lo, hi);
    } else if let Some((lo, hi)) = opts.truncate {
        raster.truncate(lo, hi);
    }
    Ok((Some(raster), report))
}

/// Copy the samples of `source` under `geometry` into `dest`, for the channels both share.
fn copy_region(source: &Raster, dest: &mut Raster, geometry: Geometry) {
    let channels = source.channels().min(dest.channels());
    for y in 0..geometry.height {
        for x in 0..geometry.width {
            let (sx, sy) = (geometry.x0 + x, geometry.y0 + y);
            if !source.includes(i64::from(sx), i64::from(sy)) {
                continue;
            }
            for c in 0..channels {
                dest.set_sample(x, y, c, source.sample(sx, sy, c));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/pipeline.rs"]
mod tests;
