use crate::expression::instr::{ImageOperand, Instr, Program, VarOperand};
use crate::foundation::core::Canvas;
use crate::foundation::error::{PixelMathError, PixelMathResult};
use crate::imaging::interp::ImageInterpolation;
use crate::imaging::raster::Raster;
use crate::imaging::store::ImageScope;
use crate::symbols::table::{SymbolId, SymbolTable};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves image names and symbols of compiled programs.
///
/// Interpolators for images whose size differs from the canvas are built once per binder and
/// shared by every operand referring to the same image.
pub(crate) struct Binder<'a> {
    pub(crate) symbols: &'a SymbolTable,
    pub(crate) scope: ImageScope<'a>,
    pub(crate) canvas: Canvas,
    interps: HashMap<String, Arc<ImageInterpolation>>,
}

impl<'a> Binder<'a> {
    pub(crate) fn new(symbols: &'a SymbolTable, scope: ImageScope<'a>, canvas: Canvas) -> Self {
        Self {
            symbols,
            scope,
            canvas,
            interps: HashMap::new(),
        }
    }

    /// Build an image operand, attaching interpolation when the raster size differs from the
    /// canvas.
    pub(crate) fn operand(
        &mut self,
        id: &str,
        raster: Arc<Raster>,
        channel: Option<usize>,
        by_reference: bool,
    ) -> PixelMathResult<ImageOperand> {
        if raster.width() == 0 || raster.height() == 0 {
            return Err(PixelMathError::compile(format!(
                "{id}: empty image ({}x{})",
                raster.width(),
                raster.height()
            )));
        }
        if let Some(c) = channel
            && c >= raster.channels()
        {
            return Err(PixelMathError::compile(format!(
                "{id}: channel index out of range: {c} (image has {} channels)",
                raster.channels()
            )));
        }
        let same_size =
            raster.width() == self.canvas.width && raster.height() == self.canvas.height;
        let interp = if same_size {
            None
        } else {
            Some(
                self.interps
                    .entry(id.to_string())
                    .or_insert_with(|| Arc::new(ImageInterpolation::new(&raster)))
                    .clone(),
            )
        };
        Ok(ImageOperand {
            id: id.to_string(),
            raster,
            channel,
            by_reference,
            interp,
        })
    }

    /// Replace every `ImageName` and `Symbol` instruction of `program`.
    pub(crate) fn bind(&mut self, program: &mut Program) -> PixelMathResult<()> {
        for instr in &mut program.instrs {
            let bound = match instr {
                Instr::ImageName(r) => {
                    let id = self.scope.canonical(Some(r.id.as_str()))?;
                    let raster = Arc::clone(self.scope.find(Some(id))?);
                    Instr::Image(self.operand(id, raster, r.channel, r.by_reference)?)
                }
                Instr::Symbol(s) => match self.symbols.lookup(&s.name) {
                    Some(SymbolId::Variable(slot)) if !s.constant => Instr::Variable(VarOperand {
                        slot,
                        channel: s.channel,
                        lvalue: s.lvalue,
                    }),
                    Some(SymbolId::Constant(id)) if s.constant && !s.lvalue => {
                        Instr::Constant(id)
                    }
                    Some(_) => {
                        return Err(PixelMathError::compile(format!(
                            "symbol '{}' is used as a {}",
                            s.name,
                            if s.constant { "constant" } else { "variable" }
                        )));
                    }
                    None => {
                        return Err(PixelMathError::compile(format!(
                            "unknown symbol '{}'",
                            s.name
                        )));
                    }
                },
                _ => continue,
            };
            *instr = bound;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/bind.rs"]
mod tests;
