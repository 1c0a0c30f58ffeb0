//! Instruction definitions of the lifted IR.
//!
//! The opcode set is exactly what the decompiler core consumes: integer
//! arithmetic, comparisons, the six integer-reinterpretation casts, memory
//! access, select, call, phi, branches and returns. Floating point, vector,
//! atomic and exception opcodes never survive lifting and are not modeled.
use smallvec::SmallVec;

use crate::{dfg::BlockId, module::FuncRef, Immediate, Type, ValueId};

/// An opaque reference to [`Inst`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Copy, Hash)]
pub struct InstId(pub u32);
cranelift_entity::entity_impl!(InstId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,
    And,
    Or,
    Xor,
    Shl,
    LShr,
    AShr,
}

impl BinaryOp {
    /// Operations whose C rendering requires signed operands.
    pub fn is_signed(self) -> bool {
        matches!(self, Self::SDiv | Self::SRem | Self::AShr)
    }

    pub fn is_shift(self) -> bool {
        matches!(self, Self::Shl | Self::LShr | Self::AShr)
    }

    pub fn as_text(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::UDiv => "udiv",
            Self::SDiv => "sdiv",
            Self::URem => "urem",
            Self::SRem => "srem",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Shl => "shl",
            Self::LShr => "lshr",
            Self::AShr => "ashr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpCond {
    Eq,
    Ne,
    Ugt,
    Uge,
    Ult,
    Ule,
    Sgt,
    Sge,
    Slt,
    Sle,
}

impl CmpCond {
    pub fn is_signed(self) -> bool {
        matches!(self, Self::Sgt | Self::Sge | Self::Slt | Self::Sle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    Trunc,
    Zext,
    Sext,
    IntToPtr,
    PtrToInt,
    Bitcast,
}

#[derive(Debug, Clone)]
pub enum Inst {
    Binary {
        op: BinaryOp,
        lhs: ValueId,
        rhs: ValueId,
    },

    Icmp {
        cond: CmpCond,
        lhs: ValueId,
        rhs: ValueId,
    },

    Cast {
        kind: CastKind,
        from: ValueId,
    },

    Load {
        addr: ValueId,
    },

    Store {
        value: ValueId,
        addr: ValueId,
    },

    /// Static stack allocation of one `ty`. The result is a pointer.
    Alloca {
        ty: Type,
    },

    Select {
        cond: ValueId,
        then: ValueId,
        else_: ValueId,
    },

    Call {
        callee: FuncRef,
        args: SmallVec<[ValueId; 4]>,
    },

    Phi {
        args: Vec<(ValueId, BlockId)>,
    },

    Br {
        cond: ValueId,
        then_dest: BlockId,
        else_dest: BlockId,
    },

    Jump {
        dest: BlockId,
    },

    Switch {
        cond: ValueId,
        default: BlockId,
        cases: Vec<(Immediate, BlockId)>,
    },

    Return {
        value: Option<ValueId>,
    },

    Unreachable,
}

impl Inst {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Self::Br { .. }
                | Self::Jump { .. }
                | Self::Switch { .. }
                | Self::Return { .. }
                | Self::Unreachable
        )
    }

    /// `true` for the unconditional and conditional branch terminators the
    /// statement builder skips (control flow is materialized downstream).
    pub fn is_branch(&self) -> bool {
        matches!(self, Self::Br { .. } | Self::Jump { .. })
    }

    pub fn as_text(&self) -> &'static str {
        match self {
            Self::Binary { op, .. } => op.as_text(),
            Self::Icmp { .. } => "icmp",
            Self::Cast { kind, .. } => match kind {
                CastKind::Trunc => "trunc",
                CastKind::Zext => "zext",
                CastKind::Sext => "sext",
                CastKind::IntToPtr => "inttoptr",
                CastKind::PtrToInt => "ptrtoint",
                CastKind::Bitcast => "bitcast",
            },
            Self::Load { .. } => "load",
            Self::Store { .. } => "store",
            Self::Alloca { .. } => "alloca",
            Self::Select { .. } => "select",
            Self::Call { .. } => "call",
            Self::Phi { .. } => "phi",
            Self::Br { .. } => "br",
            Self::Jump { .. } => "jump",
            Self::Switch { .. } => "switch",
            Self::Return { .. } => "return",
            Self::Unreachable => "unreachable",
        }
    }

    /// Visits every value operand with its operand index, in operand order.
    pub fn visit_values(&self, f: &mut impl FnMut(usize, ValueId)) {
        match self {
            Self::Binary { lhs, rhs, .. } | Self::Icmp { lhs, rhs, .. } => {
                f(0, *lhs);
                f(1, *rhs);
            }
            Self::Cast { from, .. } => f(0, *from),
            Self::Load { addr } => f(0, *addr),
            Self::Store { value, addr } => {
                f(0, *value);
                f(1, *addr);
            }
            Self::Alloca { .. } => {}
            Self::Select { cond, then, else_ } => {
                f(0, *cond);
                f(1, *then);
                f(2, *else_);
            }
            Self::Call { args, .. } => {
                for (idx, arg) in args.iter().enumerate() {
                    f(idx, *arg);
                }
            }
            Self::Phi { args } => {
                for (idx, (value, _)) in args.iter().enumerate() {
                    f(idx, *value);
                }
            }
            Self::Br { cond, .. } => f(0, *cond),
            Self::Jump { .. } => {}
            Self::Switch { cond, .. } => f(0, *cond),
            Self::Return { value } => {
                if let Some(value) = value {
                    f(0, *value);
                }
            }
            Self::Unreachable => {}
        }
    }

    /// Successor blocks of a terminator; empty for non-terminators.
    pub fn branch_dests(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            Self::Br {
                then_dest,
                else_dest,
                ..
            } => SmallVec::from_slice(&[*then_dest, *else_dest]),
            Self::Jump { dest } => SmallVec::from_slice(&[*dest]),
            Self::Switch { default, cases, .. } => {
                let mut dests = SmallVec::new();
                dests.push(*default);
                dests.extend(cases.iter().map(|(_, block)| *block));
                dests
            }
            _ => SmallVec::new(),
        }
    }
}
