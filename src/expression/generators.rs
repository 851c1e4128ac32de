use crate::expression::bind::Binder;
use crate::expression::instr::{Instr, Program};
use crate::foundation::core::Canvas;
use crate::foundation::error::{PixelMathError, PixelMathResult};
use crate::foundation::hash::StableHasher;
use crate::imaging::raster::Raster;
use crate::imaging::store::ImageCache;
use smallvec::SmallVec;
use std::sync::Arc;

/// Inputs of an image generator.
#[derive(Clone, Copy, Debug)]
pub struct GeneratorArgs<'a> {
    /// Source image.
    pub image: &'a Raster,
    /// Literal parameters following the image.
    pub params: &'a [f64],
    /// Execution canvas.
    pub canvas: Canvas,
}

/// Outcome of a generator pass.
#[derive(Debug, Default)]
pub(crate) struct GeneratedImages {
    /// Generator calls replaced.
    pub(crate) executed: usize,
    /// Cache keys inserted by this pass.
    pub(crate) created: Vec<String>,
}

impl GeneratedImages {
    /// Drop the images this pass inserted into the cache.
    pub(crate) fn release(&mut self) {
        if self.created.is_empty() {
            return;
        }
        let mut cache = ImageCache::global();
        for key in self.created.drain(..) {
            cache.remove(&key);
        }
    }
}

/// Replace every generator call with a reference to its (cached) output image.
///
/// Generated images are pushed by reference, so a statistic over a generator call aggregates the
/// whole generated image.
pub(crate) fn run_image_generators<'p>(
    programs: impl IntoIterator<Item = &'p mut Program>,
    binder: &mut Binder<'_>,
) -> PixelMathResult<GeneratedImages> {
    let mut run = GeneratedImages::default();
    for program in programs {
        if let Err(e) = run_program(program, binder, &mut run) {
            run.release();
            return Err(e);
        }
    }
    if run.executed > 0 {
        tracing::info!(
            executed = run.executed,
            created = run.created.len(),
            "executed {} image generator(s)",
            run.executed
        );
    }
    Ok(run)
}

fn run_program(
    program: &mut Program,
    binder: &mut Binder<'_>,
    run: &mut GeneratedImages,
) -> PixelMathResult<()> {
    loop {
        let found = program.instrs.iter().enumerate().find_map(|(i, instr)| match instr {
            Instr::Call(call) => call.func.def().generate.map(|g| (i, *call, g)),
            _ => None,
        });
        let Some((i, call, generate)) = found else {
            return Ok(());
        };
        let token = call.func.token();
        let start = i.checked_sub(call.argc).ok_or_else(|| {
            PixelMathError::internal(format!("{token}(): argument window underflow"))
        })?;
        let window = &program.instrs[start..i];
        let Some((Instr::Image(source), rest)) = window.split_first() else {
            return Err(PixelMathError::compile(format!(
                "{token}(): the first argument must be an image"
            )));
        };
        if source.channel.is_some() {
            return Err(PixelMathError::compile(format!(
                "{token}(): expected a whole image, got a single channel of '{}'",
                source.id
            )));
        }
        let params = rest
            .iter()
            .map(|instr| match instr {
                Instr::Sample(v) => Ok(*v),
                _ => Err(PixelMathError::compile(format!(
                    "{token}(): parameters must be constant scalars"
                ))),
            })
            .collect::<PixelMathResult<SmallVec<[f64; 4]>>>()?;

        let mut h = StableHasher::new();
        h.write_str(token);
        h.write_u32(params.len() as u32);
        for p in &params {
            h.write_f64(*p);
        }
        let fp = source.raster.fingerprint();
        h.write_u64(fp.hi);
        h.write_u64(fp.lo);
        let key = format!("{token}#{}", h.finish());

        let cached = ImageCache::global().get(&key);
        let raster = match cached {
            Some(r) => {
                tracing::debug!(key = %key, "reusing generated image");
                r
            }
            None => {
                let raster = Arc::new(generate(&GeneratorArgs {
                    image: &source.raster,
                    params: &params,
                    canvas: binder.canvas,
                })?);
                ImageCache::global().insert(key.clone(), Arc::clone(&raster));
                run.created.push(key.clone());
                raster
            }
        };
        let operand = binder.operand(&key, raster, None, true)?;
        program.instrs.splice(start..=i, [Instr::Image(operand)]);
        run.executed += 1;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/generators.rs"]
mod tests;
