use super::*;
use crate::expression::flow::{Branch, BranchOp};
use crate::expression::instr::CallOp;
use crate::expression::registry::FunctionId;

fn call(name: &str, argc: usize) -> Instr {
    Instr::Call(CallOp {
        func: FunctionId::named(name).unwrap(),
        argc,
    })
}

#[test]
fn offsets_are_measured_in_the_stripped_stream() {
    let (l1, l2) = (LabelId::next(), LabelId::next());
    let p = Program::new(vec![
        Instr::Sample(1.0),
        Instr::Branch(Branch::to(BranchOp::Jzp, l1)),
        Instr::Sample(2.0),
        Instr::Branch(Branch::to(BranchOp::Jmp, l2)),
        Instr::Label(l1),
        Instr::Sample(3.0),
        Instr::Label(l2),
    ]);
    let linked = link_program(&p).unwrap();
    assert!(linked.is_linked());
    assert_eq!(linked.len(), 5);
    let offsets: Vec<isize> = linked
        .instrs()
        .iter()
        .filter_map(|i| match i {
            Instr::Branch(b) => b.offset,
            _ => None,
        })
        .collect();
    assert_eq!(offsets, vec![3, 2]);
}

#[test]
fn linking_is_idempotent() {
    let l = LabelId::next();
    let p = Program::new(vec![
        Instr::Sample(0.0),
        Instr::Branch(Branch::to(BranchOp::Jz, l)),
        Instr::Sample(1.0),
        call("add", 2),
        Instr::Label(l),
    ]);
    let once = link_program(&p).unwrap();
    let twice = link_program(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn programs_without_branches_pass_through() {
    let p = Program::new(vec![Instr::Sample(1.0), Instr::Sample(2.0), call("add", 2)]);
    assert_eq!(link_program(&p).unwrap(), p);
}

#[test]
fn missing_and_duplicate_labels_are_internal_errors() {
    let l = LabelId::next();
    let orphan = Program::new(vec![
        Instr::Sample(1.0),
        Instr::Branch(Branch::to(BranchOp::Jzp, l)),
        Instr::Sample(2.0),
    ]);
    assert!(matches!(
        link_program(&orphan),
        Err(PixelMathError::Internal(_))
    ));

    let dup = Program::new(vec![
        Instr::Label(l),
        Instr::Sample(1.0),
        Instr::Label(l),
    ]);
    assert!(matches!(link_program(&dup), Err(PixelMathError::Internal(_))));
}

#[test]
fn backward_branches_are_rejected() {
    let l = LabelId::next();
    let p = Program::new(vec![
        Instr::Label(l),
        Instr::Sample(1.0),
        Instr::Branch(Branch::to(BranchOp::Jmp, l)),
    ]);
    assert!(matches!(link_program(&p), Err(PixelMathError::Internal(_))));
}
