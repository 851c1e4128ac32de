use crate::expression::builtins::{binary_fn, truth, unary_fn};
use crate::expression::registry::{Control, FunctionDef};

unary_fn!(neg, |a| -a);
unary_fn!(pos, |a| a);
unary_fn!(inv, |a| 1.0 - a);
unary_fn!(not, |a| truth(a == 0.0));

binary_fn!(pow, |a, b| a.powf(b));
binary_fn!(mul, |a, b| a * b);
binary_fn!(div, |a, b| a / b);
binary_fn!(rem, |a, b| a % b);
binary_fn!(add, |a, b| a + b);
binary_fn!(sub, |a, b| a - b);
binary_fn!(dif, |a, b| (a - b).abs());

binary_fn!(lt, |a, b| truth(a < b));
binary_fn!(le, |a, b| truth(a <= b));
binary_fn!(gt, |a, b| truth(a > b));
binary_fn!(ge, |a, b| truth(a >= b));
binary_fn!(eq, |a, b| truth(a == b));
binary_fn!(ne, |a, b| truth(a != b));

// Bitwise operators work on the truncated 64-bit integer values.
binary_fn!(and, |a, b| ((a as i64) & (b as i64)) as f64);
binary_fn!(nand, |a, b| (!((a as i64) & (b as i64))) as f64);
binary_fn!(xor, |a, b| ((a as i64) ^ (b as i64)) as f64);
binary_fn!(xnor, |a, b| (!((a as i64) ^ (b as i64))) as f64);
binary_fn!(or, |a, b| ((a as i64) | (b as i64)) as f64);
binary_fn!(nor, |a, b| (!((a as i64) | (b as i64))) as f64);

binary_fn!(land, |a, b| truth(a != 0.0 && b != 0.0));
binary_fn!(lor, |a, b| truth(a != 0.0 || b != 0.0));

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::operator("neg", &[], 1, neg, "Unary minus (-x)."),
    FunctionDef::operator("pos", &[], 1, pos, "Unary plus (+x)."),
    FunctionDef::operator("inv", &["~"], 1, inv, "Inversion: 1 - x."),
    FunctionDef::operator("not", &["!"], 1, not, "Logical negation."),
    FunctionDef::operator("pow", &["^"], 2, pow, "Exponentiation."),
    FunctionDef::operator("mul", &["*"], 2, mul, "Multiplication."),
    FunctionDef::operator("div", &["/"], 2, div, "Division."),
    FunctionDef::operator("mod", &["%"], 2, rem, "Floating point remainder."),
    FunctionDef::operator("add", &["+"], 2, add, "Addition."),
    FunctionDef::operator("sub", &["-"], 2, sub, "Subtraction."),
    FunctionDef::operator("dif", &["--"], 2, dif, "Absolute difference."),
    FunctionDef::operator("lt", &["<"], 2, lt, "Less than."),
    FunctionDef::operator("le", &["<="], 2, le, "Less than or equal."),
    FunctionDef::operator("gt", &[">"], 2, gt, "Greater than."),
    FunctionDef::operator("ge", &[">="], 2, ge, "Greater than or equal."),
    FunctionDef::operator("eq", &["=="], 2, eq, "Equal."),
    FunctionDef::operator("ne", &["!="], 2, ne, "Not equal."),
    FunctionDef::operator("and", &["&"], 2, and, "Bitwise AND."),
    FunctionDef::operator("nand", &["!&"], 2, nand, "Bitwise NAND."),
    FunctionDef::operator("xor", &["&|"], 2, xor, "Bitwise XOR."),
    FunctionDef::operator("xnor", &["!&|"], 2, xnor, "Bitwise XNOR."),
    FunctionDef::operator("or", &["|"], 2, or, "Bitwise OR."),
    FunctionDef::operator("nor", &["!|"], 2, nor, "Bitwise NOR."),
    FunctionDef::operator("land", &["&&"], 2, land, "Logical AND.").control(Control::And),
    FunctionDef::operator("lor", &["||"], 2, lor, "Logical OR.").control(Control::Or),
];
