use super::*;

#[test]
fn conditional_branches_pop_only_when_falling_through() {
    assert!(BranchOp::Jz.taken(true));
    assert!(!BranchOp::Jz.pops(true));
    assert!(BranchOp::Jz.pops(false));
    assert!(BranchOp::Jnz.taken(false));
    assert!(!BranchOp::Jnz.pops(true));
}

#[test]
fn popping_branches_always_pop() {
    for op in [BranchOp::Jzp, BranchOp::Jnzp] {
        assert!(op.pops(true));
        assert!(op.pops(false));
    }
    assert!(BranchOp::Jzp.taken(true));
    assert!(!BranchOp::Jnzp.taken(true));
}

#[test]
fn jmp_ignores_the_stack() {
    assert!(BranchOp::Jmp.taken(false));
    assert!(!BranchOp::Jmp.pops(true));
    assert!(!BranchOp::Jmp.tests_stack());
    assert!(BranchOp::Jzp.tests_stack());
}

#[test]
fn labels_are_unique() {
    let a = LabelId::next();
    let b = LabelId::next();
    assert_ne!(a, b);
    assert!(b > a);
    assert_eq!(format!("{a}"), format!("L{}", a.0));
}

#[test]
fn branches_start_unlinked() {
    let l = LabelId::next();
    let b = Branch::to(BranchOp::Jnz, l);
    assert_eq!(b.offset, None);
    assert_eq!(b.target, l);
    assert_eq!(BranchOp::Jnzp.to_string(), "JNZP");
}
