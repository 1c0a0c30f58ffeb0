//! Per-function AST synthesis: walks the IR in reverse-postorder and
//! builds one C statement per instruction.
use cranelift_entity::{packed_option::PackedOption, SecondaryMap};
use rustc_hash::FxHashSet;
use tracing::trace;

use decant_ir::{
    BinaryOp, BlockId, CastKind, CmpCond, ControlFlowGraph, FuncRef, Inst, InstId, Module, Value,
    ValueId,
};

use crate::{
    ast::{
        AstArena, AstContext, BinOp, CastOp, DeclRef, ExprData, ExprId, LabelDeclData, LabelId,
        LocalId, Stmt, StmtId, UnaryOp, VarDeclData,
    },
    ctype::QualType,
    translate,
};

/// Builds the statements of one function.
///
/// `to_serialize` marks the instructions whose value is materialized into a
/// named local; everything else is inlined at its uses. One builder exists
/// per function; the counters backing `var_N`/`bb_N` names reset with it.
pub struct StmtBuilder<'a> {
    module: &'a Module,
    func: FuncRef,
    ctx: &'a mut AstContext,
    pub arena: AstArena,

    to_serialize: FxHashSet<InstId>,
    instr_stmts: SecondaryMap<InstId, PackedOption<StmtId>>,
    var_decls: SecondaryMap<InstId, PackedOption<LocalId>>,
    alloca_decls: SecondaryMap<InstId, PackedOption<LocalId>>,
    bb_labels: SecondaryMap<BlockId, PackedOption<LabelId>>,
    nvar: u32,
}

/// The builder's product: the arena plus the per-instruction statement,
/// per-instruction variable, per-alloca array and per-block label maps.
pub struct BuildOutput {
    pub arena: AstArena,
    instr_stmts: SecondaryMap<InstId, PackedOption<StmtId>>,
    var_decls: SecondaryMap<InstId, PackedOption<LocalId>>,
    alloca_decls: SecondaryMap<InstId, PackedOption<LocalId>>,
    bb_labels: SecondaryMap<BlockId, PackedOption<LabelId>>,
}

impl BuildOutput {
    pub fn instr_stmt(&self, inst: InstId) -> Option<StmtId> {
        self.instr_stmts[inst].expand()
    }

    pub fn var_decl(&self, inst: InstId) -> Option<LocalId> {
        self.var_decls[inst].expand()
    }

    pub fn alloca_decl(&self, inst: InstId) -> Option<LocalId> {
        self.alloca_decls[inst].expand()
    }

    pub fn block_label(&self, block: BlockId) -> Option<LabelId> {
        self.bb_labels[block].expand()
    }
}

impl<'a> StmtBuilder<'a> {
    pub fn new(
        module: &'a Module,
        func: FuncRef,
        ctx: &'a mut AstContext,
        to_serialize: FxHashSet<InstId>,
    ) -> Self {
        Self {
            module,
            func,
            ctx,
            arena: AstArena::new(),
            to_serialize,
            instr_stmts: SecondaryMap::default(),
            var_decls: SecondaryMap::default(),
            alloca_decls: SecondaryMap::default(),
            bb_labels: SecondaryMap::default(),
            nvar: 0,
        }
    }

    /// Releases the context borrow and hands the result maps out.
    pub fn finish(self) -> BuildOutput {
        BuildOutput {
            arena: self.arena,
            instr_stmts: self.instr_stmts,
            var_decls: self.var_decls,
            alloca_decls: self.alloca_decls,
            bb_labels: self.bb_labels,
        }
    }

    /// The statement built for `inst`, if any.
    pub fn instr_stmt(&self, inst: InstId) -> Option<StmtId> {
        self.instr_stmts[inst].expand()
    }

    /// The named variable declaration of `inst`, if one was created.
    pub fn var_decl(&self, inst: InstId) -> Option<LocalId> {
        self.var_decls[inst].expand()
    }

    pub fn alloca_decl(&self, inst: InstId) -> Option<LocalId> {
        self.alloca_decls[inst].expand()
    }

    pub fn block_label(&self, block: BlockId) -> Option<LabelId> {
        self.bb_labels[block].expand()
    }

    /// Walks the function in reverse-postorder and synthesizes statements.
    pub fn build(&mut self) {
        let module = self.module;
        let func = &module.funcs[self.func];
        trace!(target: "ast-builder", func = func.sig.name(), "building statements");

        let mut cfg = ControlFlowGraph::new();
        cfg.compute(func);

        let mut bb_id = 0u64;
        for block in cfg.rpo() {
            // Labels exist for every block so goto emission stays possible
            // downstream.
            let label = self.arena.labels.push(LabelDeclData {
                name: format!("bb_{bb_id}"),
            });
            bb_id += 1;
            self.bb_labels[block] = label.into();

            for inst_id in func.layout.iter_inst(block) {
                let inst = func.dfg.inst(inst_id);

                // Control flow is materialized later by the structured AST
                // layer; branches produce no statement here.
                if inst.is_branch() {
                    continue;
                }

                // PHIs lower to a local assigned on each incoming edge, so
                // they only need the variable declaration.
                if let Inst::Phi { .. } = inst {
                    assert!(self.var_decls[inst_id].is_none());
                    let decl = self.create_var_decl(inst_id);
                    self.var_decls[inst_id] = decl.into();
                    continue;
                }

                if let Inst::Alloca { ty } = inst {
                    // The array is sized in bits on purpose: the behavior is
                    // inherited and preserved until the unit question is
                    // settled.
                    let size_in_bits = module.ctx.size_of(*ty) * 8;
                    let char_ty = self.ctx.types.char_ty();
                    let array_ty = self.ctx.types.array(char_ty, size_in_bits);
                    let name = self.fresh_var_name();
                    let decl = self.arena.locals.push(VarDeclData { name, ty: array_ty });
                    self.alloca_decls[inst_id] = decl.into();
                }

                let stmt = self.build_stmt(inst_id);
                self.instr_stmts[inst_id] = stmt.into();

                let has_uses = func
                    .dfg
                    .inst_result(inst_id)
                    .map(|result| func.dfg.users_num(result) > 0)
                    .unwrap_or(false);
                if has_uses && self.to_serialize.contains(&inst_id) {
                    assert!(self.var_decls[inst_id].is_none());
                    let decl = self.create_var_decl(inst_id);
                    self.var_decls[inst_id] = decl.into();
                }
            }
        }
    }

    fn fresh_var_name(&mut self) -> String {
        let name = format!("var_{}", self.nvar);
        self.nvar += 1;
        name
    }

    fn create_var_decl(&mut self, inst: InstId) -> LocalId {
        let module = self.module;
        let result = module.funcs[self.func]
            .dfg
            .inst_result(inst)
            .expect("variable declaration for a valueless instruction");
        let ty = self.translate(module.funcs[self.func].dfg.value_ty(result));
        let name = self.fresh_var_name();
        self.arena.locals.push(VarDeclData { name, ty })
    }

    fn translate(&mut self, ty: decant_ir::Type) -> QualType {
        translate::qual_type_of(self.module, &mut self.ctx.types, ty)
    }

    /// Builds the statement for one instruction.
    pub fn build_stmt(&mut self, inst_id: InstId) -> StmtId {
        let module = self.module;
        let func = &module.funcs[self.func];
        let inst = func.dfg.inst(inst_id);
        trace!(target: "ast-builder", inst = inst.as_text(), "building statement");

        match inst {
            Inst::Br { .. } | Inst::Jump { .. } => {
                panic!("branch instructions are not supported yet")
            }
            Inst::Switch { .. } => {
                panic!("switch instructions are not supported yet")
            }

            Inst::Return { value } => {
                let value = *value;
                let returned = value.map(|value| self.paren_expr_for_value(value));
                self.arena.make_stmt(Stmt::Return(returned))
            }

            Inst::Binary { .. } | Inst::Icmp { .. } => {
                let expr = self.rvalue_expr_for_binary(inst_id);
                self.arena.make_stmt(Stmt::Expr(expr))
            }

            Inst::Alloca { .. } => {
                let expr = self.alloca_expr(inst_id);
                self.arena.make_stmt(Stmt::Expr(expr))
            }

            Inst::Load { .. } | Inst::Store { .. } => {
                let expr = self.store_or_load_expr(inst_id);
                self.arena.make_stmt(Stmt::Expr(expr))
            }

            Inst::Cast { from, .. } => {
                let from = *from;
                let operand = self.paren_expr_for_value(from);
                let target = {
                    let result = func.dfg.inst_result(inst_id).expect("cast without result");
                    self.translate(func.dfg.value_ty(result))
                };
                let expr = if self.arena.expr(operand).ty != target {
                    self.create_cast(target, operand)
                } else {
                    operand
                };
                self.arena.make_stmt(Stmt::Expr(expr))
            }

            Inst::Select { cond, then, else_ } => {
                let (cond, then, else_) = (*cond, *then, *else_);
                let cond = self.paren_expr_for_value(cond);
                let then = self.paren_expr_for_value(then);
                let else_ = self.paren_expr_for_value(else_);
                let ty = {
                    let result = func.dfg.inst_result(inst_id).expect("select without result");
                    self.translate(func.dfg.value_ty(result))
                };
                let expr = self.arena.make_expr(
                    ExprData::Conditional { cond, then, else_ },
                    ty,
                    false,
                );
                self.arena.make_stmt(Stmt::Expr(expr))
            }

            Inst::Call { callee, args } => {
                let (callee, args) = (*callee, args.clone());
                let expr = self.call_expr(inst_id, callee, &args);
                self.arena.make_stmt(Stmt::Expr(expr))
            }

            Inst::Unreachable => {
                let abort_decl = self
                    .ctx
                    .func_decl_by_name("abort")
                    .expect("no `abort` declaration in the context");
                let callee_ty = self.ctx.func_decls[abort_decl].ret_ty;
                let callee =
                    self.arena
                        .make_expr(ExprData::DeclRef(DeclRef::Func(abort_decl)), callee_ty, true);
                let void = self.ctx.types.void();
                let expr = self.arena.make_expr(
                    ExprData::Call {
                        callee,
                        args: Vec::new(),
                    },
                    void,
                    false,
                );
                self.arena.make_stmt(Stmt::Expr(expr))
            }

            Inst::Phi { .. } => panic!("phi nodes never become statements"),
        }
    }

    /// `&var_K[0]`, typed `char *`.
    fn alloca_expr(&mut self, inst_id: InstId) -> ExprId {
        let decl = self.alloca_decls[inst_id]
            .expand()
            .expect("alloca without array declaration");
        let array_ty = self.arena.local(decl).ty;
        let char_ty = self.ctx.types.char_ty();
        let char_ptr = self.ctx.types.ptr(char_ty);

        let array_ref = self
            .arena
            .make_expr(ExprData::DeclRef(DeclRef::Local(decl)), array_ty, true);
        let decayed = self.arena.make_expr(
            ExprData::ImplicitCast {
                op: CastOp::ArrayToPointerDecay,
                operand: array_ref,
            },
            char_ptr,
            false,
        );
        let int_ty = self.ctx.types.int(32, true);
        let zero = self
            .arena
            .make_expr(ExprData::IntLit { value: 0 }, int_ty, false);
        let subscript = self.arena.make_expr(
            ExprData::Subscript {
                base: decayed,
                index: zero,
            },
            char_ty,
            true,
        );
        self.arena.make_expr(
            ExprData::Unary {
                op: UnaryOp::AddrOf,
                operand: subscript,
            },
            char_ptr,
            false,
        )
    }

    fn call_expr(&mut self, inst_id: InstId, callee: FuncRef, args: &[ValueId]) -> ExprId {
        let module = self.module;
        let callee_decl = self.ctx.func_decl(callee);
        let callee_arity = module.funcs[callee].sig.args().len();

        let decl = &self.ctx.func_decls[callee_decl];
        let num_params = decl.params.len();
        let has_no_params = num_params == 0
            || (num_params == 1
                && matches!(
                    self.ctx.types.resolve(decl.params[0].ty.ty),
                    crate::ctype::CTypeData::Void
                ));
        assert!(has_no_params || callee_arity == num_params);
        assert_eq!(callee_arity, args.len());

        let callee_ty = self.ctx.func_decls[callee_decl].ret_ty;
        let callee_expr = self.arena.make_expr(
            ExprData::DeclRef(DeclRef::Func(callee_decl)),
            callee_ty,
            true,
        );

        let mut arg_exprs = Vec::with_capacity(args.len());
        if !has_no_params {
            for (idx, &arg) in args.iter().enumerate() {
                let mut arg_expr = self.expr_for_value(arg);
                let param_ty = self.ctx.func_decls[callee_decl].params[idx].ty;
                if self.arena.expr(arg_expr).ty != param_ty {
                    let inner_ty = self.arena.expr(arg_expr).ty;
                    arg_expr = self
                        .arena
                        .make_expr(ExprData::Paren(arg_expr), inner_ty, false);
                    arg_expr = self.create_cast(param_ty, arg_expr);
                }
                arg_exprs.push(arg_expr);
            }
        }

        let ret_ty = match module.funcs[self.func].dfg.inst_result(inst_id) {
            Some(result) => self.translate(module.funcs[self.func].dfg.value_ty(result)),
            None => self.ctx.types.void(),
        };
        self.arena.make_expr(
            ExprData::Call {
                callee: callee_expr,
                args: arg_exprs,
            },
            ret_ty,
            false,
        )
    }

    /// The lvalue/assignment expression of a memory instruction.
    ///
    /// For a load, this is the dereferenced (or global) location the load
    /// reads. For a store, it is the full `lhs = rhs` assignment.
    fn store_or_load_expr(&mut self, inst_id: InstId) -> ExprId {
        let module = self.module;
        let func = &module.funcs[self.func];
        match func.dfg.inst(inst_id) {
            Inst::Load { .. } => self.mem_location_expr(inst_id),
            Inst::Store { value, .. } => {
                let value = *value;
                let lhs = self.paren_mem_location_expr(inst_id);
                let lhs_ty = self.arena.expr(lhs).ty;
                let mut rhs = self.paren_expr_for_value(value);
                if self.arena.expr(rhs).ty != lhs_ty {
                    rhs = self.create_cast(lhs_ty, rhs);
                }
                self.arena.make_expr(
                    ExprData::Binary {
                        op: BinOp::Assign,
                        lhs,
                        rhs,
                    },
                    lhs_ty,
                    false,
                )
            }
            _ => unreachable!(),
        }
    }

    fn paren_mem_location_expr(&mut self, inst_id: InstId) -> ExprId {
        let expr = self.mem_location_expr(inst_id);
        self.paren_wrap(expr)
    }

    /// The lvalue a load/store accesses: the global itself when the address
    /// is a global reference, a cast-and-dereferenced pointer otherwise.
    fn mem_location_expr(&mut self, inst_id: InstId) -> ExprId {
        let module = self.module;
        let func = &module.funcs[self.func];
        let (addr, accessed_ty) = match func.dfg.inst(inst_id) {
            Inst::Load { addr } => {
                let result = func.dfg.inst_result(inst_id).expect("load without result");
                (*addr, func.dfg.value_ty(result))
            }
            Inst::Store { value, addr } => (*addr, func.dfg.value_ty(*value)),
            _ => unreachable!("memory access expression for a non-memory instruction"),
        };

        let addr_is_global = matches!(func.dfg.value(addr), Value::Global { .. });
        let addr_is_null = matches!(func.dfg.value(addr), Value::Null { .. });

        let mut addr_expr = self.paren_expr_for_value(addr);
        if addr_is_global {
            // The global reference is itself the accessed lvalue.
            return addr_expr;
        }

        addr_expr = self.lvalue_to_rvalue(addr_expr);

        let pointee = self.translate(accessed_ty);
        let addr_ty = self.arena.expr(addr_expr).ty;
        if !self.ctx.types.is_pointer(addr_ty) {
            assert!(
                self.ctx.types.is_integer(addr_ty),
                "address is neither pointer nor integer"
            );
            let ptr_ty = self.ctx.types.ptr(pointee);
            let ptr_bits = self.ctx.types.bit_width(ptr_ty);
            let int_bits = self.ctx.types.bit_width(addr_ty);
            assert!(ptr_bits >= int_bits);
            if ptr_bits > int_bits {
                let uintptr = self.ctx.types.uintptr();
                addr_expr = self.create_cast(uintptr, addr_expr);
            }
            addr_expr = self.create_cast(ptr_ty, addr_expr);
        }

        if addr_is_null {
            // Accesses through literal null must stay observable.
            let pointee = self
                .ctx
                .types
                .pointee(self.arena.expr(addr_expr).ty)
                .unwrap_or(pointee)
                .with_volatile();
            let ptr_to_volatile = self.ctx.types.ptr(pointee);
            addr_expr = self.create_cast(ptr_to_volatile, addr_expr);
        }

        let pointee = self
            .ctx
            .types
            .pointee(self.arena.expr(addr_expr).ty)
            .unwrap_or(pointee);
        self.arena.make_expr(
            ExprData::Unary {
                op: UnaryOp::Deref,
                operand: addr_expr,
            },
            pointee,
            true,
        )
    }

    /// Binary and compare instructions, with operand signedness
    /// reconciliation and the outward-type wrap for signed operations.
    fn rvalue_expr_for_binary(&mut self, inst_id: InstId) -> ExprId {
        let module = self.module;
        let func = &module.funcs[self.func];
        let (lhs_val, rhs_val, bin_op, coerce_signed, wrap_result, is_shift) =
            match func.dfg.inst(inst_id) {
                Inst::Binary { op, lhs, rhs } => {
                    let bin_op = match op {
                        BinaryOp::Add => BinOp::Add,
                        BinaryOp::Sub => BinOp::Sub,
                        BinaryOp::Mul => BinOp::Mul,
                        BinaryOp::UDiv | BinaryOp::SDiv => BinOp::Div,
                        BinaryOp::URem | BinaryOp::SRem => BinOp::Rem,
                        BinaryOp::And => BinOp::And,
                        BinaryOp::Or => BinOp::Or,
                        BinaryOp::Xor => BinOp::Xor,
                        BinaryOp::Shl => BinOp::Shl,
                        BinaryOp::LShr | BinaryOp::AShr => BinOp::Shr,
                    };
                    (*lhs, *rhs, bin_op, op.is_signed(), op.is_signed(), op.is_shift())
                }
                Inst::Icmp { cond, lhs, rhs } => {
                    let bin_op = match cond {
                        CmpCond::Eq => BinOp::Eq,
                        CmpCond::Ne => BinOp::Ne,
                        CmpCond::Ugt | CmpCond::Sgt => BinOp::Gt,
                        CmpCond::Uge | CmpCond::Sge => BinOp::Ge,
                        CmpCond::Ult | CmpCond::Slt => BinOp::Lt,
                        CmpCond::Ule | CmpCond::Sle => BinOp::Le,
                    };
                    (*lhs, *rhs, bin_op, cond.is_signed(), cond.is_signed(), false)
                }
                _ => unreachable!("binary expression for a non-binary instruction"),
            };

        let mut lhs = self.paren_expr_for_value(lhs_val);
        lhs = self.lvalue_to_rvalue(lhs);
        let mut rhs = self.paren_expr_for_value(rhs_val);
        rhs = self.lvalue_to_rvalue(rhs);

        let lhs_ty = self.arena.expr(lhs).ty;
        let rhs_ty = self.arena.expr(rhs).ty;
        assert!(self.ctx.types.is_integer(lhs_ty) && self.ctx.types.is_integer(rhs_ty));
        let lhs_bits = self.ctx.types.bit_width(lhs_ty);
        let rhs_bits = self.ctx.types.bit_width(rhs_ty);
        // Width mismatch is tolerated for shift counts and against 128-bit
        // operands only.
        assert!(lhs_bits == rhs_bits || is_shift || lhs_bits == 128 || rhs_bits == 128);

        if coerce_signed {
            let width = lhs_bits.max(rhs_bits);
            let signed_ty = self.ctx.types.signed_int(width);
            if !self.ctx.types.is_signed(rhs_ty) {
                rhs = self.create_cast(signed_ty, rhs);
            }
            if !self.ctx.types.is_signed(lhs_ty) {
                lhs = self.create_cast(signed_ty, lhs);
            }
        }

        let result_ty = {
            let result = func.dfg.inst_result(inst_id).expect("binary without result");
            self.translate(func.dfg.value_ty(result))
        };

        let operand_ty = self.arena.expr(lhs).ty;
        let expr_ty = if wrap_result { operand_ty } else { result_ty };
        let mut expr = self.arena.make_expr(
            ExprData::Binary {
                op: bin_op,
                lhs,
                rhs,
            },
            expr_ty,
            false,
        );

        // Signed operations keep an unsigned outward type through an
        // explicit cast of the parenthesized result.
        if wrap_result {
            expr = self
                .arena
                .make_expr(ExprData::Paren(expr), expr_ty, false);
            expr = self.create_cast(result_ty, expr);
        }
        expr
    }

    /// Synthesizes the expression for any IR value.
    pub fn expr_for_value(&mut self, value_id: ValueId) -> ExprId {
        let module = self.module;
        let func = &module.funcs[self.func];
        match func.dfg.value(value_id) {
            Value::Immediate { imm, ty } => {
                let (imm, ty) = (*imm, *ty);
                self.literal_expr(imm, ty)
            }

            Value::Null { .. } => {
                let uintptr = self.ctx.types.uintptr();
                self.arena
                    .make_expr(ExprData::IntLit { value: 0 }, uintptr, false)
            }

            Value::ConstCast { kind: _, from, .. } => {
                // Constant-expression casts reduce to their inner constant;
                // only the integer-reinterpretation kinds reach this point.
                let from = *from;
                assert!(func.dfg.value(from).is_constant());
                self.expr_for_value(from)
            }

            Value::Global { gv, .. } => {
                let decl = self.ctx.global_decl(*gv);
                let ty = self.ctx.global_decls[decl].ty;
                self.arena
                    .make_expr(ExprData::DeclRef(DeclRef::Global(decl)), ty, true)
            }

            Value::Arg { idx, .. } => {
                let idx = *idx;
                let func_decl = self.ctx.func_decl(self.func);
                let decl = &self.ctx.func_decls[func_decl];
                assert_eq!(
                    decl.params.len(),
                    module.funcs[self.func].sig.args().len(),
                    "declaration arity diverges from the IR signature"
                );
                let ty = decl.params[idx].ty;
                self.arena.make_expr(
                    ExprData::DeclRef(DeclRef::Param(func_decl, idx)),
                    ty,
                    true,
                )
            }

            Value::Inst { inst, .. } => {
                let inst = *inst;
                self.expr_for_inst(inst)
            }
        }
    }

    /// Declaration reference to a function.
    pub fn expr_for_func(&mut self, func: FuncRef) -> ExprId {
        let decl = self.ctx.func_decl(func);
        let ty = self.ctx.func_decls[decl].ret_ty;
        self.arena
            .make_expr(ExprData::DeclRef(DeclRef::Func(decl)), ty, true)
    }

    /// Like [`Self::expr_for_value`], wrapping binary and conditional
    /// results in parentheses to keep precedence explicit at composition
    /// sites.
    pub fn paren_expr_for_value(&mut self, value_id: ValueId) -> ExprId {
        let expr = self.expr_for_value(value_id);
        self.paren_wrap(expr)
    }

    fn paren_wrap(&mut self, expr: ExprId) -> ExprId {
        let needs_paren = matches!(
            self.arena.expr(expr).data,
            ExprData::Binary { .. } | ExprData::Conditional { .. }
        );
        if needs_paren {
            let ty = self.arena.expr(expr).ty;
            self.arena.make_expr(ExprData::Paren(expr), ty, false)
        } else {
            expr
        }
    }

    fn expr_for_inst(&mut self, inst_id: InstId) -> ExprId {
        // A serialized instruction reads from its named variable.
        if let Some(decl) = self.var_decls[inst_id].expand() {
            let ty = self.arena.local(decl).ty;
            return self
                .arena
                .make_expr(ExprData::DeclRef(DeclRef::Local(decl)), ty, true);
        }

        // An already-built statement is memoized; reuse its expression.
        if let Some(stmt) = self.instr_stmts[inst_id].expand() {
            match self.arena.stmt(stmt) {
                Stmt::Expr(expr) => return *expr,
                _ => panic!("instruction statement carries no expression"),
            }
        }

        // Only memory accesses and casts are synthesized on first use from
        // an operand position.
        let module = self.module;
        match module.funcs[self.func].dfg.inst(inst_id) {
            Inst::Load { .. } | Inst::Store { .. } => self.mem_location_expr(inst_id),
            Inst::Cast { kind, from } => {
                let (kind, from) = (*kind, *from);
                self.cast_expr(inst_id, kind, from)
            }
            inst => panic!("no expression for `{}` at an operand position", inst.as_text()),
        }
    }

    /// An explicit cast instruction, with the cast kind derived from the
    /// integer/pointer classification of source and destination.
    fn cast_expr(&mut self, inst_id: InstId, kind: CastKind, from: ValueId) -> ExprId {
        let module = self.module;
        let func = &module.funcs[self.func];
        let src_ty = func.dfg.value_ty(from);
        let result = func.dfg.inst_result(inst_id).expect("cast without result");
        let dest_ty = func.dfg.value_ty(result);

        let mut expr = self.paren_expr_for_value(from);
        if src_ty == dest_ty {
            return expr;
        }

        let dest = self.translate(dest_ty);
        let cast_op = match kind {
            CastKind::Trunc | CastKind::Zext | CastKind::Sext => {
                assert!(!module.ctx.is_ptr(src_ty) && !module.ctx.is_ptr(dest_ty));
                CastOp::IntegralCast
            }
            CastKind::IntToPtr => {
                assert!(!module.ctx.is_ptr(src_ty) && module.ctx.is_ptr(dest_ty));
                let int_ty = self.arena.expr(expr).ty;
                let ptr_bits = self.ctx.types.bit_width(dest);
                let int_bits = self.ctx.types.bit_width(int_ty);
                assert!(ptr_bits >= int_bits);
                if ptr_bits > int_bits {
                    let uintptr = self.ctx.types.uintptr();
                    expr = self.create_cast(uintptr, expr);
                }
                CastOp::IntegralToPointer
            }
            CastKind::PtrToInt => {
                assert!(module.ctx.is_ptr(src_ty) && !module.ctx.is_ptr(dest_ty));
                CastOp::PointerToIntegral
            }
            CastKind::Bitcast => {
                assert!(module.ctx.is_ptr(src_ty) && module.ctx.is_ptr(dest_ty));
                CastOp::BitCast
            }
        };

        self.arena.make_expr(
            ExprData::Cast {
                op: cast_op,
                operand: expr,
            },
            dest,
            false,
        )
    }

    /// The C-style cast of `operand` to `target`, with the cast kind chosen
    /// by the integer/pointer classification of both sides. Integers
    /// narrower than a pointer destination widen through `uintptr_t` first.
    fn create_cast(&mut self, target: QualType, operand: ExprId) -> ExprId {
        let operand_ty = self.arena.expr(operand).ty;
        let types = &mut self.ctx.types;

        let op = if types.is_integer(target) {
            if types.is_integer(operand_ty) {
                CastOp::IntegralCast
            } else if types.is_pointer(operand_ty) {
                CastOp::PointerToIntegral
            } else {
                panic!("cast to integer from a non-scalar type");
            }
        } else if types.is_pointer(target) {
            if types.is_integer(operand_ty) {
                let ptr_bits = types.bit_width(target);
                let int_bits = types.bit_width(operand_ty);
                assert!(ptr_bits >= int_bits);
                if ptr_bits > int_bits {
                    let uintptr = types.uintptr();
                    let widened = self.create_cast(uintptr, operand);
                    return self.finish_cast(target, CastOp::IntegralToPointer, widened);
                }
                CastOp::IntegralToPointer
            } else if types.is_pointer(operand_ty) {
                CastOp::BitCast
            } else {
                panic!("cast to pointer from a non-scalar type");
            }
        } else {
            panic!("cast to a non-scalar type");
        };

        self.finish_cast(target, op, operand)
    }

    fn finish_cast(&mut self, target: QualType, op: CastOp, operand: ExprId) -> ExprId {
        self.arena
            .make_expr(ExprData::Cast { op, operand }, target, false)
    }

    fn lvalue_to_rvalue(&mut self, expr: ExprId) -> ExprId {
        if !self.arena.expr(expr).is_lvalue {
            return expr;
        }
        let ty = self.arena.expr(expr).ty;
        self.arena.make_expr(
            ExprData::ImplicitCast {
                op: CastOp::LValueToRValue,
                operand: expr,
            },
            ty,
            false,
        )
    }

    /// Integer literals. The C type is the width-exact translation of the
    /// IR type; 128-bit constants are narrowed to 64-bit literals because C
    /// has no 128-bit literal syntax.
    fn literal_expr(&mut self, imm: decant_ir::Immediate, ty: decant_ir::Type) -> ExprId {
        let translated = self.translate(ty);
        match ty {
            decant_ir::Type::I128 => {
                let signed = self.ctx.types.is_signed(translated);
                let narrowed = self.ctx.types.int(64, signed);
                self.arena.make_expr(
                    ExprData::IntLit {
                        value: imm.zext_bits() as u64,
                    },
                    narrowed,
                    false,
                )
            }
            _ => self.arena.make_expr(
                ExprData::IntLit {
                    value: imm.zext_bits() as u64,
                },
                translated,
                false,
            ),
        }
    }
}
