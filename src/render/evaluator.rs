use crate::expression::instr::{Program, SlotPrograms};
use crate::expression::vm::{self, EvalCtx, Operand};
use crate::foundation::core::{Geometry, Slot};
use crate::foundation::error::{PixelMathError, PixelMathResult};
use crate::foundation::pixel::Pixel;
use crate::imaging::raster::Raster;
use crate::render::rows::{row_ranges, worker_count};
use crate::symbols::table::{GlobalReport, SymbolTable};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Linked statement lists for the four slots, ready for execution.
#[derive(Clone, Debug)]
pub struct CompiledProgram {
    pub(crate) slots: SlotPrograms,
    pub(crate) single_expression: bool,
    pub(crate) symbols: SymbolTable,
    pub(crate) max_stack: usize,
}

impl CompiledProgram {
    /// Wrap linked programs. Fails with an internal error when a program still holds labels or
    /// unresolved branches.
    pub fn new(
        slots: SlotPrograms,
        single_expression: bool,
        symbols: SymbolTable,
    ) -> PixelMathResult<Self> {
        if let Some(p) = slots.iter().flatten().find(|p| !p.is_linked()) {
            return Err(PixelMathError::internal(format!(
                "program is not linked: {p}"
            )));
        }
        let max_stack = slots
            .iter()
            .flatten()
            .map(Program::max_depth)
            .max()
            .unwrap_or(0);
        Ok(Self {
            slots,
            single_expression,
            symbols,
            max_stack,
        })
    }

    /// Statements of one slot.
    pub fn slot(&self, slot: Slot) -> &[Program] {
        &self.slots[slot.index()]
    }

    /// `true` when slot 0 holds one expression for every nominal channel.
    pub fn single_expression(&self) -> bool {
        self.single_expression
    }

    /// Symbols the programs were bound against.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Largest operand stack any statement needs.
    pub fn max_stack(&self) -> usize {
        self.max_stack
    }
}

/// Execution destination.
#[derive(Debug)]
pub enum Output<'a> {
    /// Write pixels into a raster sized like the execution region.
    Raster(&'a mut Raster),
    /// Evaluate for variable side effects only, as if writing `channels` channels (1 to 4).
    SideEffects {
        /// Channel count of the virtual output.
        channels: usize,
    },
}

/// Execution options.
#[derive(Clone, Debug, Default)]
pub struct ExecuteOpts {
    /// Worker thread count; `None` uses the available parallelism. Must be >= 1 when set.
    pub threads: Option<usize>,
    /// Evaluate every row on a single worker.
    pub single_threaded: bool,
    /// Seed of the per-worker random number generators.
    pub seed: u64,
    /// Cooperative abort flag, checked once per row.
    pub abort: Option<Arc<AtomicBool>>,
}

/// Result of an execution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExecuteReport {
    /// Final values of the global variables, in declaration order.
    pub globals: Vec<GlobalReport>,
    /// Number of workers that ran.
    pub workers: usize,
}

/// A slot that runs during execution.
///
/// `component` is the channel of the result that branches test and that is written (`-1`: all of
/// RGB); `channel` is the output channel it lands in. The alpha slot reads component 0, so a
/// colour alpha expression contributes its first component.
#[derive(Clone, Copy, Debug)]
struct ActiveSlot<'p> {
    statements: &'p [Program],
    component: isize,
    channel: usize,
}

#[derive(Clone, Copy, Debug)]
struct Shape {
    color: bool,
    alpha: bool,
    nominal: usize,
    stride: usize,
}

impl Shape {
    fn of(output: &Output<'_>) -> PixelMathResult<Self> {
        match output {
            Output::Raster(r) => Ok(Self {
                color: r.is_color(),
                alpha: r.has_alpha(),
                nominal: r.nominal_channels(),
                stride: r.channels(),
            }),
            Output::SideEffects { channels } => {
                if !(1..=4).contains(channels) {
                    return Err(PixelMathError::compile(format!(
                        "side-effect execution needs 1 to 4 channels, got {channels}"
                    )));
                }
                let color = *channels >= 3;
                Ok(Self {
                    color,
                    alpha: *channels == 2 || *channels == 4,
                    nominal: if color { 3 } else { 1 },
                    stride: *channels,
                })
            }
        }
    }
}

fn active_slots<'p>(program: &'p CompiledProgram, shape: Shape) -> Vec<ActiveSlot<'p>> {
    let mut active = Vec::new();
    for slot in Slot::ALL {
        let statements = program.slot(slot);
        if statements.is_empty() {
            continue;
        }
        let (component, channel) = match slot {
            Slot::RedOrGray if program.single_expression && shape.color => (-1, 0),
            Slot::RedOrGray => (0, 0),
            Slot::Green | Slot::Blue if program.single_expression || !shape.color => continue,
            Slot::Green => (1, 1),
            Slot::Blue => (2, 2),
            Slot::Alpha if shape.alpha => (0, shape.nominal),
            Slot::Alpha => {
                tracing::debug!("alpha expression ignored: output has no alpha channel");
                continue;
            }
        };
        active.push(ActiveSlot {
            statements,
            component,
            channel,
        });
    }
    active
}

struct Job<'p> {
    program: &'p CompiledProgram,
    slots: Vec<ActiveSlot<'p>>,
    geometry: Geometry,
    stride: usize,
    seed: u64,
    abort: Option<&'p AtomicBool>,
    failed: AtomicBool,
    first_error: Mutex<Option<PixelMathError>>,
}

impl Job<'_> {
    fn record(&self, e: PixelMathError) {
        self.failed.store(true, Ordering::Relaxed);
        let mut slot = self
            .first_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_none() {
            *slot = Some(e);
        }
    }
}

/// Execute a compiled program over `geometry`.
///
/// Rows are split into one contiguous range per worker. Each worker owns its operand stack, random
/// number generator and variable storage; global variables are merged in worker order after the
/// join. The first worker error is returned once every worker has stopped. On error the output
/// raster holds partial results and should be discarded.
#[tracing::instrument(skip(program, output, opts))]
pub fn execute(
    program: &CompiledProgram,
    output: Output<'_>,
    geometry: Geometry,
    opts: &ExecuteOpts,
) -> PixelMathResult<ExecuteReport> {
    let geometry = Geometry::region(
        geometry.full,
        geometry.x0,
        geometry.y0,
        geometry.width,
        geometry.height,
    )?;
    let shape = Shape::of(&output)?;
    let data = match output {
        Output::Raster(r) => {
            if r.width() != geometry.width || r.height() != geometry.height {
                return Err(PixelMathError::compile(format!(
                    "output raster is {}x{} but the execution region is {}x{}",
                    r.width(),
                    r.height(),
                    geometry.width,
                    geometry.height
                )));
            }
            Some(r.data_mut())
        }
        Output::SideEffects { .. } => None,
    };

    let pool = build_thread_pool(if opts.single_threaded {
        Some(1)
    } else {
        opts.threads
    })?;
    let workers = worker_count(
        geometry.height,
        pool.current_num_threads(),
        opts.single_threaded,
    );
    let ranges = row_ranges(geometry.height, workers);
    tracing::debug!(workers = ranges.len(), rows = geometry.height, "executing");

    let row_len = geometry.width as usize * shape.stride;
    let mut tasks: Vec<(usize, Range<u32>, Option<&mut [f64]>)> = Vec::with_capacity(ranges.len());
    let mut rest = data;
    for (i, rows) in ranges.into_iter().enumerate() {
        let chunk = match rest.take() {
            Some(buf) => {
                let (head, tail) = buf.split_at_mut(rows.len() * row_len);
                rest = Some(tail);
                Some(head)
            }
            None => None,
        };
        tasks.push((i, rows, chunk));
    }

    let job = Job {
        program,
        slots: active_slots(program, shape),
        geometry,
        stride: shape.stride,
        seed: opts.seed,
        abort: opts.abort.as_deref(),
        failed: AtomicBool::new(false),
        first_error: Mutex::new(None),
    };

    let worker_vars = pool.install(|| {
        tasks
            .into_par_iter()
            .map(|(worker, rows, chunk)| match run_worker(&job, worker, rows, chunk) {
                Ok(vars) => vars,
                Err(e) => {
                    job.record(e);
                    None
                }
            })
            .collect::<Vec<_>>()
    });

    let first_error = job
        .first_error
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(e) = first_error {
        return Err(e);
    }
    let worker_vars = worker_vars
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| PixelMathError::internal("a worker stopped without reporting an error"))?;

    Ok(ExecuteReport {
        globals: program.symbols.merge_globals(&worker_vars),
        workers: worker_vars.len(),
    })
}

/// Evaluate `rows` on one worker. Returns `Ok(None)` when stopped because another worker failed.
fn run_worker<'p>(
    job: &Job<'p>,
    worker: usize,
    rows: Range<u32>,
    mut out: Option<&mut [f64]>,
) -> PixelMathResult<Option<Vec<Pixel>>> {
    let g = job.geometry;
    let mut vars = job.program.symbols.worker_storage();
    let mut rng = StdRng::seed_from_u64(
        job.seed ^ (worker as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15),
    );
    let mut stack: Vec<Operand<'p>> = Vec::with_capacity(job.program.max_stack);
    let mut ctx = EvalCtx {
        x: 0,
        y: 0,
        canvas: g.full,
        vars: &mut vars,
        rng: &mut rng,
    };

    for y in rows.clone() {
        if job.abort.is_some_and(|a| a.load(Ordering::Relaxed)) {
            return Err(PixelMathError::Cancelled);
        }
        if job.failed.load(Ordering::Relaxed) {
            return Ok(None);
        }
        let row_base = (y - rows.start) as usize * g.width as usize;
        ctx.y = g.y0 + y;
        for x in 0..g.width {
            ctx.x = g.x0 + x;
            let base = (row_base + x as usize) * job.stride;
            for slot in &job.slots {
                let px = vm::run_statements(slot.statements, slot.component, &mut stack, &mut ctx);
                let px = px.map_err(|e| {
                    PixelMathError::evaluation(format!("pixel ({}, {}): {e}", ctx.x, ctx.y))
                })?;
                let Some(buf) = out.as_deref_mut() else {
                    continue;
                };
                if slot.component < 0 {
                    for c in 0..3 {
                        buf[base + c] = px.get(c);
                    }
                } else {
                    buf[base + slot.channel] = px.get(slot.component as usize);
                }
            }
        }
    }
    Ok(Some(vars))
}

fn build_thread_pool(threads: Option<usize>) -> PixelMathResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(PixelMathError::compile(
            "execution 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| PixelMathError::resource(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/evaluator.rs"]
mod tests;
