use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Branch opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BranchOp {
    /// Unconditional jump.
    Jmp,
    /// Jump if the top of the stack is zero; pops only when the jump is not taken.
    Jz,
    /// Jump if the top of the stack is non-zero; pops only when the jump is not taken.
    Jnz,
    /// Jump if the top of the stack is zero; always pops.
    Jzp,
    /// Jump if the top of the stack is non-zero; always pops.
    Jnzp,
}

impl BranchOp {
    /// Whether the branch is taken for a top-of-stack value with truthiness `is_zero`.
    /// `Jmp` ignores the stack.
    pub(crate) fn taken(self, is_zero: bool) -> bool {
        match self {
            BranchOp::Jmp => true,
            BranchOp::Jz | BranchOp::Jzp => is_zero,
            BranchOp::Jnz | BranchOp::Jnzp => !is_zero,
        }
    }

    /// Whether the tested value is popped for the given outcome.
    pub(crate) fn pops(self, taken: bool) -> bool {
        match self {
            BranchOp::Jmp => false,
            BranchOp::Jz | BranchOp::Jnz => !taken,
            BranchOp::Jzp | BranchOp::Jnzp => true,
        }
    }

    /// `false` for `Jmp`.
    pub(crate) fn tests_stack(self) -> bool {
        self != BranchOp::Jmp
    }
}

impl fmt::Display for BranchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BranchOp::Jmp => "JMP",
            BranchOp::Jz => "JZ",
            BranchOp::Jnz => "JNZ",
            BranchOp::Jzp => "JZP",
            BranchOp::Jnzp => "JNZP",
        })
    }
}

static NEXT_LABEL: AtomicU64 = AtomicU64::new(0);

/// Branch target marker. Ids are unique for the lifetime of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(pub u64);

impl LabelId {
    /// Allocate a fresh label id.
    pub fn next() -> Self {
        Self(NEXT_LABEL.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// A branch instruction. `offset` is relative to the branch's own position and stays `None` until
/// the program is linked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Branch {
    /// Opcode.
    pub op: BranchOp,
    /// Target label.
    pub target: LabelId,
    /// Resolved forward offset.
    pub offset: Option<isize>,
}

impl Branch {
    /// Unlinked branch to `target`.
    pub fn to(op: BranchOp, target: LabelId) -> Self {
        Self {
            op,
            target,
            offset: None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/flow.rs"]
mod tests;
