use crate::expression::flow::{Branch, BranchOp, LabelId};
use crate::expression::instr::{CallOp, Instr, Program, SymbolRef};
use crate::expression::node::{Call, Expr, ImageRef};
use crate::expression::registry::{Control, FunctionKind, Invariance};
use smallvec::SmallVec;

/// Compile a validated expression tree into postfix order.
///
/// With `optimize`, short-circuit functions (`iif`, `iswitch`, `&&`, `||`) are emitted as branches
/// around their alternatives; otherwise every argument is evaluated and the function selects.
pub fn postfix(expr: &Expr, optimize: bool) -> Program {
    let mut out = Vec::new();
    Emitter { optimize }.emit(expr, Role::Value, &mut out);
    Program::new(out)
}

/// Compile a statement list.
pub fn postfix_statements(statements: &[Expr], optimize: bool) -> Vec<Program> {
    statements.iter().map(|s| postfix(s, optimize)).collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
    Value,
    Target,
    Reference,
}

struct Emitter {
    optimize: bool,
}

impl Emitter {
    fn emit(&self, expr: &Expr, role: Role, out: &mut Vec<Instr>) {
        match expr {
            Expr::Sample(v) => out.push(Instr::Sample(*v)),
            Expr::Pixel(p) => out.push(Instr::Pixel(*p)),
            Expr::Image(img) => out.push(Instr::ImageName(ImageRef {
                by_reference: img.by_reference || role == Role::Reference,
                ..img.clone()
            })),
            Expr::Variable(var) => out.push(Instr::Symbol(SymbolRef {
                name: var.name.clone(),
                channel: var.channel,
                lvalue: role == Role::Target,
                constant: false,
            })),
            Expr::Constant(name) => out.push(Instr::Symbol(SymbolRef {
                name: name.clone(),
                channel: None,
                lvalue: false,
                constant: true,
            })),
            Expr::Call(call) => match call.func.def().control {
                Some(control) if self.optimize => self.emit_control(control, call, out),
                _ => self.emit_call(call, out),
            },
        }
    }

    fn emit_call(&self, call: &Call, out: &mut Vec<Instr>) {
        let def = call.func.def();
        let whole_image = def.invariance == Invariance::ImageStatistics
            && matches!(call.args.as_slice(), [Expr::Image(_)]);
        for (i, arg) in call.args.iter().enumerate() {
            let role = match def.kind {
                FunctionKind::Assignment(_) if i == 0 => Role::Target,
                _ if i == 0 && (def.image_argument || whole_image) => Role::Reference,
                _ => Role::Value,
            };
            self.emit(arg, role, out);
        }
        out.push(Instr::Call(CallOp {
            func: call.func,
            argc: call.args.len(),
        }));
    }

    fn emit_control(&self, control: Control, call: &Call, out: &mut Vec<Instr>) {
        let args = &call.args;
        match control {
            Control::Iif => {
                let (l_else, l_end) = (LabelId::next(), LabelId::next());
                self.emit(&args[0], Role::Value, out);
                out.push(Instr::Branch(Branch::to(BranchOp::Jzp, l_else)));
                self.emit(&args[1], Role::Value, out);
                out.push(Instr::Branch(Branch::to(BranchOp::Jmp, l_end)));
                out.push(Instr::Label(l_else));
                self.emit(&args[2], Role::Value, out);
                out.push(Instr::Label(l_end));
            }
            Control::Iswitch => {
                let l_end = LabelId::next();
                let (pairs, default) = args.split_at(args.len() - 1);
                let labels: SmallVec<[LabelId; 8]> =
                    pairs.chunks_exact(2).map(|_| LabelId::next()).collect();
                for (pair, l_next) in pairs.chunks_exact(2).zip(labels) {
                    self.emit(&pair[0], Role::Value, out);
                    out.push(Instr::Branch(Branch::to(BranchOp::Jzp, l_next)));
                    self.emit(&pair[1], Role::Value, out);
                    out.push(Instr::Branch(Branch::to(BranchOp::Jmp, l_end)));
                    out.push(Instr::Label(l_next));
                }
                self.emit(&default[0], Role::Value, out);
                out.push(Instr::Label(l_end));
            }
            Control::And | Control::Or => {
                let (op, fallthrough) = if control == Control::And {
                    (BranchOp::Jz, 1.0)
                } else {
                    (BranchOp::Jnz, 0.0)
                };
                let l_end = LabelId::next();
                for arg in args {
                    self.emit(arg, Role::Value, out);
                    out.push(Instr::Branch(Branch::to(op, l_end)));
                }
                out.push(Instr::Sample(fallthrough));
                out.push(Instr::Label(l_end));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/compile.rs"]
mod tests;
