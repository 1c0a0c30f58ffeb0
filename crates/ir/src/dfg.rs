//! Data flow graph of a lifted function.
use std::collections::BTreeSet;

use cranelift_entity::{packed_option::PackedOption, PrimaryMap, SecondaryMap};
use rustc_hash::FxHashMap;

use crate::{
    inst::{CastKind, Inst, InstId},
    GlobalVariable, Immediate, Type, Value, ValueId,
};

/// An opaque reference to a basic block.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Copy, Hash)]
pub struct BlockId(pub u32);
cranelift_entity::entity_impl!(BlockId);

#[derive(Debug, Clone, Default)]
pub struct Block {}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Default)]
pub struct DataFlowGraph {
    pub blocks: PrimaryMap<BlockId, Block>,
    pub values: PrimaryMap<ValueId, Value>,
    insts: PrimaryMap<InstId, Inst>,
    inst_results: SecondaryMap<InstId, PackedOption<ValueId>>,
    immediates: FxHashMap<Immediate, ValueId>,
    users: SecondaryMap<ValueId, BTreeSet<InstId>>,
}

impl DataFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_block(&mut self) -> BlockId {
        self.blocks.push(Block::new())
    }

    pub fn make_value(&mut self, value: Value) -> ValueId {
        self.values.push(value)
    }

    pub fn make_inst(&mut self, inst: Inst) -> InstId {
        let inst_id = self.insts.push(inst);
        self.attach_user(inst_id);
        inst_id
    }

    pub fn make_imm_value<Imm>(&mut self, imm: Imm) -> ValueId
    where
        Imm: Into<Immediate>,
    {
        let imm: Immediate = imm.into();
        if let Some(&value) = self.immediates.get(&imm) {
            return value;
        }

        let ty = imm.ty();
        let value = self.make_value(Value::Immediate { imm, ty });
        self.immediates.insert(imm, value);
        value
    }

    /// The null pointer constant of the given pointer type.
    pub fn make_null_value(&mut self, ty: Type) -> ValueId {
        self.make_value(Value::Null { ty })
    }

    pub fn make_global_value(&mut self, gv: GlobalVariable, ptr_ty: Type) -> ValueId {
        self.make_value(Value::Global { gv, ty: ptr_ty })
    }

    /// A constant-expression cast over another constant.
    pub fn make_const_cast(&mut self, kind: CastKind, from: ValueId, ty: Type) -> ValueId {
        debug_assert!(self.values[from].is_constant());
        self.make_value(Value::ConstCast { kind, from, ty })
    }

    pub fn make_arg_value(&mut self, ty: Type, idx: usize) -> Value {
        Value::Arg { ty, idx }
    }

    pub fn attach_result(&mut self, inst_id: InstId, value_id: ValueId) {
        debug_assert!(self.inst_results[inst_id].is_none());
        self.inst_results[inst_id] = value_id.into();
    }

    pub fn inst(&self, inst_id: InstId) -> &Inst {
        &self.insts[inst_id]
    }

    pub fn value(&self, value_id: ValueId) -> &Value {
        &self.values[value_id]
    }

    pub fn value_ty(&self, value_id: ValueId) -> Type {
        self.values[value_id].ty()
    }

    pub fn inst_result(&self, inst_id: InstId) -> Option<ValueId> {
        self.inst_results[inst_id].expand()
    }

    /// The defining instruction of `value_id`, if it is an instruction result.
    pub fn value_inst(&self, value_id: ValueId) -> Option<InstId> {
        match self.values[value_id] {
            Value::Inst { inst, .. } => Some(inst),
            _ => None,
        }
    }

    fn attach_user(&mut self, inst_id: InstId) {
        let inst = &self.insts[inst_id];
        let mut used = Vec::new();
        inst.visit_values(&mut |_, value| used.push(value));
        for value in used {
            self.users[value].insert(inst_id);
        }
    }

    /// Returns all instructions that use `value_id`.
    pub fn users(&self, value_id: ValueId) -> impl Iterator<Item = &InstId> {
        self.users[value_id].iter()
    }

    pub fn users_num(&self, value_id: ValueId) -> usize {
        self.users[value_id].len()
    }

    pub fn iter_insts(&self) -> impl Iterator<Item = (InstId, &Inst)> {
        self.insts.iter()
    }

    pub fn iter_values(&self) -> impl Iterator<Item = (ValueId, &Value)> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inst::BinaryOp;

    #[test]
    fn immediates_are_deduplicated() {
        let mut dfg = DataFlowGraph::new();
        let a = dfg.make_imm_value(7i32);
        let b = dfg.make_imm_value(7i32);
        assert_eq!(a, b);
        assert_ne!(dfg.make_imm_value(7i64), a);
    }

    #[test]
    fn users_track_operands() {
        let mut dfg = DataFlowGraph::new();
        let a = dfg.make_imm_value(1i32);
        let b = dfg.make_imm_value(2i32);
        let inst = dfg.make_inst(Inst::Binary {
            op: BinaryOp::Add,
            lhs: a,
            rhs: b,
        });

        assert_eq!(dfg.users_num(a), 1);
        assert_eq!(dfg.users(b).next(), Some(&inst));
    }
}
