//! PixelMath is a per-pixel expression engine for astronomical images.
//!
//! Expressions are trees of function calls over images, variables, constants and literals. They
//! are compiled to flat postfix programs, optimized at compile time and evaluated in parallel over
//! the pixels of a target canvas:
//!
//! - Parse variable and constant definitions with [`parse_symbols`]
//! - Describe the target with a [`Target`] and the per-channel expressions with
//!   [`ChannelExpressions`]
//! - [`run`] them against an [`ImageStore`], or [`compile`] once and [`execute`] repeatedly
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;
mod imaging;

pub(crate) mod expression;
pub(crate) mod render;
pub(crate) mod session;
pub(crate) mod symbols;

pub use crate::foundation::core::{Canvas, Geometry, Slot};
pub use crate::foundation::error::{PixelMathError, PixelMathResult};
pub use crate::foundation::pixel::Pixel;

pub use crate::imaging::raster::{Raster, StatKind};
pub use crate::imaging::store::{CacheReport, ImageStore, clear_image_cache, image_cache_report};

pub use crate::symbols::parse::parse_symbols;
pub use crate::symbols::table::{
    ConstId, ConstValue, ConstantDef, GlobalOp, GlobalReport, SymbolId, SymbolTable, VarSlot,
    VariableDef,
};

pub use crate::expression::compile::{postfix, postfix_statements};
pub use crate::expression::flow::{Branch, BranchOp, LabelId};
pub use crate::expression::generators::GeneratorArgs;
pub use crate::expression::instr::{
    CallOp, ImageOperand, Instr, Program, SlotPrograms, SymbolRef, VarOperand,
};
pub use crate::expression::link::link_program;
pub use crate::expression::node::{Call, Expr, ImageRef, TARGET_IMAGE, VarRef};
pub use crate::expression::registry::{
    AssignOp, Control, EvalFn, FunctionDef, FunctionId, FunctionKind, GenerateFn, Invariance,
    ValidateFn, functions,
};
pub use crate::expression::validate::validate;
pub use crate::expression::vm::{Alias, EvalCtx, EvalError, EvalResult, Operand};

pub use crate::render::evaluator::{CompiledProgram, ExecuteOpts, ExecuteReport, Output, execute};
pub use crate::session::pipeline::{
    ChannelExpressions, PixelMathOpts, Region, RunOutput, RunStats, Target, compile, run,
};
