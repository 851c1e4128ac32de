use crate::expression::node::{Call, Expr};
use crate::expression::registry::{AssignOp, FunctionKind};
use crate::foundation::error::{PixelMathError, PixelMathResult};
use crate::symbols::table::{GlobalOp, SymbolId, SymbolTable};

/// Check an expression tree before compilation: argument counts, argument kinds, symbol names and
/// global variable assignment operators.
pub fn validate(expr: &Expr, symbols: &SymbolTable) -> PixelMathResult<()> {
    match expr {
        Expr::Sample(_) | Expr::Pixel(_) => Ok(()),
        Expr::Image(img) => {
            if img.id.is_empty() {
                return Err(PixelMathError::compile("empty image identifier"));
            }
            Ok(())
        }
        Expr::Variable(var) => {
            match symbols.lookup(&var.name) {
                Some(SymbolId::Variable(_)) => {}
                Some(SymbolId::Constant(_)) => {
                    return Err(PixelMathError::compile(format!(
                        "'{}' is a constant, not a variable",
                        var.name
                    )));
                }
                None => {
                    return Err(PixelMathError::compile(format!(
                        "unknown variable '{}'",
                        var.name
                    )));
                }
            }
            if let Some(c) = var.channel
                && c > 2
            {
                return Err(PixelMathError::compile(format!(
                    "variable channel index out of range: {}[{c}]",
                    var.name
                )));
            }
            Ok(())
        }
        Expr::Constant(name) => match symbols.lookup(name) {
            Some(SymbolId::Constant(_)) => Ok(()),
            Some(SymbolId::Variable(_)) => Err(PixelMathError::compile(format!(
                "'{name}' is a variable, not a constant"
            ))),
            None => Err(PixelMathError::compile(format!(
                "unknown constant '{name}'"
            ))),
        },
        Expr::Call(call) => {
            validate_call(call, symbols)?;
            call.args.iter().try_for_each(|a| validate(a, symbols))
        }
    }
}

fn validate_call(call: &Call, symbols: &SymbolTable) -> PixelMathResult<()> {
    let def = call.func.def();
    let argc = call.args.len();
    if !def.accepts(argc) {
        return Err(PixelMathError::compile(format!(
            "{}() takes {} argument(s), got {argc}",
            def.token,
            def.arity()
        )));
    }
    if let FunctionKind::Assignment(op) = def.kind {
        let Some(Expr::Variable(target)) = call.args.first() else {
            return Err(PixelMathError::compile(format!(
                "the left operand of '{}' must be a variable",
                def.aliases.first().unwrap_or(&def.token)
            )));
        };
        if let Some(SymbolId::Variable(slot)) = symbols.lookup(&target.name)
            && let Some(global) = symbols.variable(slot).and_then(|v| v.global)
        {
            let allowed = match global {
                GlobalOp::Add => matches!(op, AssignOp::Add | AssignOp::Sub),
                GlobalOp::Mul => matches!(op, AssignOp::Mul | AssignOp::Div),
            };
            if !allowed {
                let ops = match global {
                    GlobalOp::Add => "+= or -=",
                    GlobalOp::Mul => "*= or /=",
                };
                return Err(PixelMathError::compile(format!(
                    "global variable '{}' declared with '{}' can only be assigned with {ops}",
                    target.name,
                    global.symbol()
                )));
            }
        }
    }
    if def.image_argument && !matches!(call.args.first(), Some(Expr::Image(_))) {
        return Err(PixelMathError::compile(format!(
            "{}(): the first argument must be an image",
            def.token
        )));
    }
    if let Some(check) = def.validate {
        check(&call.args).map_err(PixelMathError::compile)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/expression/validate.rs"]
mod tests;
