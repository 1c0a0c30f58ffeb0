//! Builders for constructing lifted-IR modules and functions.
//!
//! The lifter hands this core an already-SSA module, so there is no
//! variable/sealing machinery here; the builders only append blocks and
//! instructions and wire up result values.
use crate::{
    dfg::BlockId,
    inst::{CastKind, Inst, InstId},
    module::FuncRef,
    types::DataLayout,
    Function, GlobalVariable, GlobalVariableData, Immediate, Module, ModuleCtx, Signature, Type,
    Value, ValueId,
};

#[derive(Debug, Default)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new(data_layout: DataLayout) -> Self {
        Self {
            module: Module::new(ModuleCtx::new(data_layout)),
        }
    }

    pub fn declare_function(&mut self, sig: Signature) -> FuncRef {
        self.module.declare_function(Function::new(sig))
    }

    pub fn make_global(&mut self, gv_data: GlobalVariableData) -> GlobalVariable {
        self.module.ctx.gv_store.make_gv(gv_data)
    }

    pub fn ptr_type(&mut self, ty: Type) -> Type {
        self.module.ctx.type_store.make_ptr(ty)
    }

    pub fn array_type(&mut self, elem: Type, len: usize) -> Type {
        self.module.ctx.type_store.make_array(elem, len)
    }

    pub fn struct_type(&mut self, fields: &[Type]) -> Type {
        self.module.ctx.type_store.make_struct(fields)
    }

    pub fn func_builder(&mut self, func: FuncRef) -> FunctionBuilder<'_> {
        FunctionBuilder::new(&mut self.module, func)
    }

    pub fn build(self) -> Module {
        self.module
    }
}

pub struct FunctionBuilder<'a> {
    module: &'a mut Module,
    func: FuncRef,
    current_block: Option<BlockId>,
}

impl<'a> FunctionBuilder<'a> {
    fn new(module: &'a mut Module, func: FuncRef) -> Self {
        Self {
            module,
            func,
            current_block: None,
        }
    }

    pub fn func_ref(&self) -> FuncRef {
        self.func
    }

    pub fn args(&self) -> &[ValueId] {
        &self.module.funcs[self.func].arg_values
    }

    pub fn append_block(&mut self) -> BlockId {
        let func = &mut self.module.funcs[self.func];
        let block = func.dfg.make_block();
        func.layout.append_block(block);
        block
    }

    pub fn switch_to_block(&mut self, block: BlockId) {
        self.current_block = Some(block);
    }

    pub fn make_imm_value<Imm>(&mut self, imm: Imm) -> ValueId
    where
        Imm: Into<Immediate>,
    {
        self.module.funcs[self.func].dfg.make_imm_value(imm)
    }

    pub fn make_null_value(&mut self, ty: Type) -> ValueId {
        debug_assert!(self.module.ctx.is_ptr(ty));
        self.module.funcs[self.func].dfg.make_null_value(ty)
    }

    /// Returns a pointer value to the global variable.
    pub fn make_global_value(&mut self, gv: GlobalVariable) -> ValueId {
        let gv_ty = self.module.ctx.gv_store.ty(gv);
        let ptr_ty = self.module.ctx.type_store.make_ptr(gv_ty);
        self.module.funcs[self.func]
            .dfg
            .make_global_value(gv, ptr_ty)
    }

    pub fn make_const_cast(&mut self, kind: CastKind, from: ValueId, ty: Type) -> ValueId {
        self.module.funcs[self.func]
            .dfg
            .make_const_cast(kind, from, ty)
    }

    /// Inserts `inst` at the end of the current block and attaches a result
    /// value of type `ret_ty`.
    pub fn insert_inst(&mut self, inst: Inst, ret_ty: Type) -> ValueId {
        let inst_id = self.append(inst);
        let func = &mut self.module.funcs[self.func];
        let result = func.dfg.make_value(Value::Inst {
            inst: inst_id,
            ty: ret_ty,
        });
        func.dfg.attach_result(inst_id, result);
        result
    }

    /// Inserts an instruction that produces no value.
    pub fn insert_inst_no_result(&mut self, inst: Inst) -> InstId {
        self.append(inst)
    }

    fn append(&mut self, inst: Inst) -> InstId {
        let block = self
            .current_block
            .expect("no block selected; call `switch_to_block` first");
        let func = &mut self.module.funcs[self.func];
        let inst_id = func.dfg.make_inst(inst);
        func.layout.append_inst(inst_id, block);
        inst_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{inst::BinaryOp, Linkage};

    #[test]
    fn build_straight_line_function() {
        let mut mb = ModuleBuilder::new(DataLayout::default());
        let sig = Signature::new(
            "sum",
            Linkage::Public,
            &[Type::I32, Type::I32],
            Type::I32,
        );
        let func = mb.declare_function(sig);

        let mut fb = mb.func_builder(func);
        let entry = fb.append_block();
        fb.switch_to_block(entry);

        let (x, y) = (fb.args()[0], fb.args()[1]);
        let sum = fb.insert_inst(
            Inst::Binary {
                op: BinaryOp::Add,
                lhs: x,
                rhs: y,
            },
            Type::I32,
        );
        fb.insert_inst_no_result(Inst::Return { value: Some(sum) });

        let module = mb.build();
        let func = &module.funcs[func];
        assert_eq!(func.layout.iter_block().count(), 1);
        assert_eq!(func.layout.iter_inst(entry).count(), 2);
        assert_eq!(func.dfg.value_ty(sum), Type::I32);
    }
}
