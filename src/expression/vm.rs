use crate::expression::instr::{ImageOperand, Instr, Program};
use crate::expression::registry::FunctionId;
use crate::foundation::core::Canvas;
use crate::foundation::pixel::Pixel;
use crate::symbols::table::VarSlot;
use rand::rngs::StdRng;
use std::fmt;

/// What a stack operand refers to besides its value.
#[derive(Clone, Copy, Debug)]
pub enum Alias<'p> {
    /// Assignment target in the worker's variable storage.
    Variable {
        /// Storage slot.
        slot: VarSlot,
        /// Assigned channel; the whole value when `None`.
        channel: Option<usize>,
    },
    /// Image passed by reference.
    Image(&'p ImageOperand),
}

/// Operand stack entry.
#[derive(Clone, Copy, Debug)]
pub struct Operand<'p> {
    /// Value pushed for this operand.
    pub value: Pixel,
    /// Reference carried alongside the value.
    pub alias: Option<Alias<'p>>,
}

impl<'p> Operand<'p> {
    /// Plain value operand.
    pub fn value(value: Pixel) -> Self {
        Self { value, alias: None }
    }

    /// The referenced image, if passed by reference.
    pub fn image(&self) -> Option<&'p ImageOperand> {
        match self.alias {
            Some(Alias::Image(img)) => Some(img),
            _ => None,
        }
    }

    /// The referenced variable slot and channel, for assignment targets.
    pub fn variable(&self) -> Option<(VarSlot, Option<usize>)> {
        match self.alias {
            Some(Alias::Variable { slot, channel }) => Some((slot, channel)),
            _ => None,
        }
    }
}

/// Per-pixel evaluation context owned by one worker.
#[derive(Debug)]
pub struct EvalCtx<'w> {
    /// Absolute column in the full canvas.
    pub x: u32,
    /// Absolute row in the full canvas.
    pub y: u32,
    /// Full canvas.
    pub canvas: Canvas,
    /// Worker variable storage.
    pub vars: &'w mut [Pixel],
    /// Worker random number generator.
    pub rng: &'w mut StdRng,
}

/// Error raised while evaluating a pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    message: String,
}

impl EvalError {
    /// Error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

/// Result of a function evaluation.
pub type EvalResult = Result<(), EvalError>;

/// Call `func` over `ops`.
///
/// Gray operands are promoted when any operand is colour and the result is shaped accordingly;
/// assignment targets take no part in promotion.
pub(crate) fn invoke(
    func: FunctionId,
    ops: &mut [Operand<'_>],
    ctx: &mut EvalCtx<'_>,
) -> Result<Pixel, EvalError> {
    let is_target = |o: &Operand<'_>| matches!(o.alias, Some(Alias::Variable { .. }));
    let color = ops
        .iter()
        .any(|o| !is_target(o) && o.value.is_color());
    if color {
        for o in ops.iter_mut().filter(|o| !is_target(o)) {
            o.value = o.value.to_color();
        }
    }
    let mut out = Pixel::shaped(color);
    (func.def().eval)(&mut out, ops, ctx)?;
    Ok(out)
}

/// Read the current pixel of an image operand.
pub(crate) fn read_image(img: &ImageOperand, ctx: &EvalCtx<'_>) -> Result<Pixel, EvalError> {
    let r = &img.raster;
    if let Some(c) = img.channel
        && c >= r.channels()
    {
        return Err(EvalError::new(format!(
            "{}: channel index out of range: {c}",
            img.id
        )));
    }
    if let Some(interp) = &img.interp {
        let fx = f64::from(ctx.x) * f64::from(r.width()) / f64::from(ctx.canvas.width);
        let fy = f64::from(ctx.y) * f64::from(r.height()) / f64::from(ctx.canvas.height);
        return Ok(match img.channel {
            Some(c) => Pixel::gray(interp.sample(c, fx, fy)),
            None => interp.pixel(fx, fy),
        });
    }
    if !r.includes(i64::from(ctx.x), i64::from(ctx.y)) {
        return Err(EvalError::new(format!(
            "{}: pixel ({}, {}) is outside the image",
            img.id, ctx.x, ctx.y
        )));
    }
    Ok(match img.channel {
        Some(c) => Pixel::gray(r.sample(ctx.x, ctx.y, c)),
        None => r.pixel(ctx.x, ctx.y),
    })
}

fn underflow(instr: &Instr) -> EvalError {
    EvalError::new(format!("operand stack underflow at '{instr}'"))
}

/// Run one linked statement and return the value it leaves on the stack.
///
/// `channel` selects the channel tested by branches; negative values test channel 0.
pub(crate) fn run_program<'p>(
    program: &'p Program,
    channel: isize,
    stack: &mut Vec<Operand<'p>>,
    ctx: &mut EvalCtx<'_>,
) -> Result<Pixel, EvalError> {
    let test_channel = channel.max(0) as usize;
    let instrs = program.instrs();
    stack.clear();
    let mut pc = 0usize;
    while pc < instrs.len() {
        let instr = &instrs[pc];
        match instr {
            Instr::Sample(v) => stack.push(Operand::value(Pixel::gray(*v))),
            Instr::Pixel(p) => stack.push(Operand::value(*p)),
            Instr::Image(img) => {
                let value = read_image(img, ctx)?;
                stack.push(Operand {
                    value,
                    alias: img.by_reference.then_some(Alias::Image(img)),
                });
            }
            Instr::Variable(var) => {
                let stored = ctx.vars.get(var.slot.0 as usize).copied().ok_or_else(|| {
                    EvalError::new(format!("variable slot {} is not allocated", var.slot.0))
                })?;
                let value = match var.channel {
                    Some(c) => Pixel::gray(stored.get(c)),
                    None => stored,
                };
                stack.push(Operand {
                    value,
                    alias: var.lvalue.then_some(Alias::Variable {
                        slot: var.slot,
                        channel: var.channel,
                    }),
                });
            }
            Instr::Call(call) => {
                let base = stack
                    .len()
                    .checked_sub(call.argc)
                    .ok_or_else(|| underflow(instr))?;
                let value = invoke(call.func, &mut stack[base..], ctx)?;
                stack.truncate(base);
                stack.push(Operand::value(value));
            }
            Instr::Branch(branch) => {
                let offset = branch.offset.ok_or_else(|| {
                    EvalError::new(format!("unlinked branch to {}", branch.target))
                })?;
                let taken = if branch.op.tests_stack() {
                    let top = stack.last().ok_or_else(|| underflow(instr))?;
                    branch.op.taken(top.value.is_logical_zero(test_channel))
                } else {
                    true
                };
                if branch.op.pops(taken) {
                    stack.pop();
                }
                if taken {
                    pc = pc.saturating_add_signed(offset);
                    continue;
                }
            }
            Instr::Constant(_) | Instr::Label(_) | Instr::ImageName(_) | Instr::Symbol(_) => {
                return Err(EvalError::new(format!(
                    "unexpected instruction '{instr}' in a linked program"
                )));
            }
        }
        pc += 1;
    }
    match stack.as_slice() {
        [result] => Ok(result.value),
        other => Err(EvalError::new(format!(
            "statement left {} values on the stack",
            other.len()
        ))),
    }
}

/// Run a statement list; the last statement produces the result.
pub(crate) fn run_statements<'p>(
    statements: &'p [Program],
    channel: isize,
    stack: &mut Vec<Operand<'p>>,
    ctx: &mut EvalCtx<'_>,
) -> Result<Pixel, EvalError> {
    let mut result = None;
    for program in statements {
        result = Some(run_program(program, channel, stack, ctx)?);
    }
    result.ok_or_else(|| EvalError::new("empty statement list"))
}

#[cfg(test)]
#[path = "../../tests/unit/expression/vm.rs"]
mod tests;
