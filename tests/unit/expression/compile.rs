use super::*;
use crate::expression::flow::BranchOp;

fn e(name: &str, args: Vec<Expr>) -> Expr {
    Expr::call(name, args).unwrap()
}

fn shape(p: &Program) -> Vec<String> {
    p.instrs()
        .iter()
        .map(|i| match i {
            Instr::Branch(b) => b.op.to_string(),
            Instr::Label(_) => "L".to_string(),
            other => other.to_string(),
        })
        .collect()
}

#[test]
fn calls_are_emitted_after_their_arguments() {
    let expr = e("add", vec![1.0.into(), e("mul", vec![2.0.into(), 3.0.into()])]);
    let p = postfix(&expr, true);
    assert_eq!(shape(&p), vec!["1", "2", "3", "mul/2", "add/2"]);
    assert_eq!(p.max_depth(), 3);
}

#[test]
fn iif_emits_two_branches_when_optimized() {
    let expr = e("iif", vec![Expr::target(), 1.0.into(), 0.0.into()]);
    let p = postfix(&expr, true);
    assert_eq!(
        shape(&p),
        vec!["$T?", "JZP", "1", "JMP", "L", "0", "L"]
    );
    let plain = postfix(&expr, false);
    assert_eq!(shape(&plain), vec!["$T?", "1", "0", "iif/3"]);
}

#[test]
fn iswitch_tests_each_condition_in_turn() {
    let expr = e(
        "iswitch",
        vec![
            Expr::variable("a"),
            1.0.into(),
            Expr::variable("b"),
            2.0.into(),
            3.0.into(),
        ],
    );
    let p = postfix(&expr, true);
    assert_eq!(
        shape(&p),
        vec![
            "a?", "JZP", "1", "JMP", "L", "b?", "JZP", "2", "JMP", "L", "3", "L"
        ]
    );
    let branches = p
        .instrs()
        .iter()
        .filter(|i| matches!(i, Instr::Branch(b) if b.op == BranchOp::Jmp))
        .count();
    assert_eq!(branches, 2);
}

#[test]
fn logical_operators_short_circuit_without_popping() {
    let and = postfix(&e("&&", vec![Expr::variable("a"), Expr::variable("b")]), true);
    assert_eq!(shape(&and), vec!["a?", "JZ", "b?", "JZ", "1", "L"]);
    let or = postfix(&e("||", vec![Expr::variable("a"), Expr::variable("b")]), true);
    assert_eq!(shape(&or), vec!["a?", "JNZ", "b?", "JNZ", "0", "L"]);
}

#[test]
fn assignment_targets_are_lvalues() {
    let p = postfix(&e("+=", vec![Expr::variable("v"), Expr::variable("w")]), true);
    let Instr::Symbol(target) = &p.instrs()[0] else {
        panic!("expected a symbol");
    };
    assert!(target.lvalue);
    let Instr::Symbol(source) = &p.instrs()[1] else {
        panic!("expected a symbol");
    };
    assert!(!source.lvalue);
}

#[test]
fn single_image_statistics_take_the_image_by_reference() {
    let p = postfix(&e("mean", vec![Expr::image("img")]), true);
    let Instr::ImageName(r) = &p.instrs()[0] else {
        panic!("expected an image name");
    };
    assert!(r.by_reference);

    let p = postfix(&e("mean", vec![Expr::image("img"), 1.0.into()]), true);
    let Instr::ImageName(r) = &p.instrs()[0] else {
        panic!("expected an image name");
    };
    assert!(!r.by_reference);

    let p = postfix(&e("pixel", vec![Expr::image("img"), 0.0.into(), 0.0.into()]), true);
    let Instr::ImageName(r) = &p.instrs()[0] else {
        panic!("expected an image name");
    };
    assert!(r.by_reference);
}

#[test]
fn constants_are_marked() {
    let p = postfix(&Expr::constant("k"), true);
    assert!(matches!(&p.instrs()[0], Instr::Symbol(s) if s.constant && !s.lvalue));
    assert_eq!(postfix_statements(&[1.0.into(), 2.0.into()], true).len(), 2);
}
