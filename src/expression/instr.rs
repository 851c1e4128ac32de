use crate::expression::flow::{Branch, LabelId};
use crate::expression::node::ImageRef;
use crate::expression::registry::FunctionId;
use crate::foundation::pixel::Pixel;
use crate::imaging::interp::ImageInterpolation;
use crate::imaging::raster::Raster;
use crate::symbols::table::{ConstId, VarSlot};
use std::fmt;
use std::sync::Arc;

/// A bound image operand.
#[derive(Clone, Debug)]
pub struct ImageOperand {
    /// Store identifier or generated image cache key.
    pub id: String,
    /// Shared raster.
    pub raster: Arc<Raster>,
    /// Channel read as a gray value; the whole pixel when `None`.
    pub channel: Option<usize>,
    /// Push an alias to the image for the consuming function.
    pub by_reference: bool,
    /// Present when the raster size differs from the canvas.
    pub(crate) interp: Option<Arc<ImageInterpolation>>,
}

impl PartialEq for ImageOperand {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && Arc::ptr_eq(&self.raster, &other.raster)
            && self.channel == other.channel
            && self.by_reference == other.by_reference
    }
}

/// A bound variable operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarOperand {
    /// Storage slot.
    pub slot: VarSlot,
    /// Channel read or assigned.
    pub channel: Option<usize>,
    /// Assignment target: pushes an alias to the storage slot.
    pub lvalue: bool,
}

/// An unbound variable or constant name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolRef {
    /// Identifier.
    pub name: String,
    /// Channel, for variables.
    pub channel: Option<usize>,
    /// Assignment target.
    pub lvalue: bool,
    /// Referenced as a constant.
    pub constant: bool,
}

/// Function call instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallOp {
    /// Function identity.
    pub func: FunctionId,
    /// Number of stack operands consumed.
    pub argc: usize,
}

/// Flat postfix instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    /// Scalar literal.
    Sample(f64),
    /// Gray or RGB literal.
    Pixel(Pixel),
    /// Bound image.
    Image(ImageOperand),
    /// Bound variable.
    Variable(VarOperand),
    /// Bound constant, folded to a literal before execution.
    Constant(ConstId),
    /// Function call.
    Call(CallOp),
    /// Branch.
    Branch(Branch),
    /// Branch target; removed by the linker.
    Label(LabelId),
    /// Image not yet bound to a raster.
    ImageName(ImageRef),
    /// Variable or constant not yet bound to the symbol table.
    Symbol(SymbolRef),
}

impl Instr {
    /// Literal value of `Sample` and `Pixel` instructions.
    pub fn literal(&self) -> Option<Pixel> {
        match self {
            Instr::Sample(v) => Some(Pixel::gray(*v)),
            Instr::Pixel(p) => Some(*p),
            _ => None,
        }
    }

    /// Literal instruction for `p`: `Sample` when gray, `Pixel` when colour.
    pub fn from_literal(p: Pixel) -> Self {
        if p.is_color() {
            Instr::Pixel(p)
        } else {
            Instr::Sample(p.get(0))
        }
    }

    /// Net stack effect.
    fn stack_delta(&self) -> isize {
        match self {
            Instr::Call(call) => 1 - call.argc as isize,
            Instr::Branch(_) | Instr::Label(_) => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Sample(v) => write!(f, "{v}"),
            Instr::Pixel(p) => write!(f, "{p}"),
            Instr::Image(img) => match img.channel {
                Some(c) => write!(f, "{}[{c}]", img.id),
                None => f.write_str(&img.id),
            },
            Instr::Variable(v) => match v.channel {
                Some(c) => write!(f, "var{}[{c}]", v.slot.0),
                None => write!(f, "var{}", v.slot.0),
            },
            Instr::Constant(c) => write!(f, "const{}", c.0),
            Instr::Call(call) => write!(f, "{}/{}", call.func.token(), call.argc),
            Instr::Branch(b) => match b.offset {
                Some(off) => write!(f, "{} {:+}", b.op, off),
                None => write!(f, "{} {}", b.op, b.target),
            },
            Instr::Label(id) => write!(f, "{id}:"),
            Instr::ImageName(r) => write!(f, "{}?", r.id),
            Instr::Symbol(s) => write!(f, "{}?", s.name),
        }
    }
}

/// One compiled statement: a flat postfix instruction sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub(crate) instrs: Vec<Instr>,
}

impl Program {
    /// Wrap an instruction sequence.
    pub fn new(instrs: Vec<Instr>) -> Self {
        Self { instrs }
    }

    /// Instructions in execution order.
    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    /// `true` for an empty program.
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    /// `true` when no labels or unresolved branches remain.
    pub fn is_linked(&self) -> bool {
        self.instrs.iter().all(|i| match i {
            Instr::Label(_) => false,
            Instr::Branch(b) => b.offset.is_some(),
            _ => true,
        })
    }

    /// Upper bound of the operand stack depth, ignoring branches.
    pub fn max_depth(&self) -> usize {
        let mut depth = 0isize;
        let mut max = 0isize;
        for i in &self.instrs {
            depth += i.stack_delta();
            max = max.max(depth);
        }
        max.max(0) as usize
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, instr) in self.instrs.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{instr}")?;
        }
        Ok(())
    }
}

/// Statement lists for the red/gray, green, blue and alpha slots.
pub type SlotPrograms = [Vec<Program>; 4];
