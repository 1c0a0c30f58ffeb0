//! Graph population: seeds the type system with the layout observations a
//! lifted module exposes.
//!
//! Every integer- or pointer-typed value gets a layout type. Value
//! aliasing (casts, phis, selects, call/return wiring) becomes equality
//! links; memory access becomes a zero-offset instance link from the
//! pointer's layout to the accessed layout, with the access recorded as
//! evidence on the pointee.
use tracing::debug;

use decant_ir::{FuncRef, Inst, Module, ValueId};

use crate::{
    key::{IrSlot, LayoutKey},
    type_system::{LayoutNodeId, TypeSystem, UseSite},
    OffsetExpression,
};

/// Builds a fresh type system from `module`. The result is not yet
/// normalized; callers run [`TypeSystem::normalize`] before querying.
pub fn collect(module: &Module) -> TypeSystem {
    let mut ts = TypeSystem::new();

    for func_ref in module.iter_functions() {
        collect_function(module, func_ref, &mut ts);
    }

    debug!(
        target: "dla",
        nodes = ts.num_nodes(),
        "collected layout observations"
    );
    debug_assert!(ts.verify_consistency());
    ts
}

fn collect_function(module: &Module, func_ref: FuncRef, ts: &mut TypeSystem) {
    let func = &module.funcs[func_ref];

    let ret_ty = func.sig.ret_ty();
    if ret_ty.is_integral() || module.ctx.is_ptr(ret_ty) || module.ctx.type_store.is_struct(ret_ty)
    {
        ts.get_or_create_types(module, IrSlot::Func(func_ref));
    }

    for &arg in func.arg_values.iter() {
        node_for(module, func_ref, arg, ts);
    }

    for block in func.layout.iter_block() {
        for inst_id in func.layout.iter_inst(block) {
            let inst = func.dfg.inst(inst_id);
            let result = func.dfg.inst_result(inst_id);
            let result_node =
                result.and_then(|value| node_for(module, func_ref, value, ts));

            match inst {
                Inst::Load { addr } => {
                    let addr_node = node_for(module, func_ref, *addr, ts);
                    if let (Some(addr_node), Some(loaded)) = (addr_node, result_node) {
                        let site = UseSite {
                            func: func_ref,
                            inst: inst_id,
                            operand: 0,
                        };
                        let size = module.ctx.size_of(func.dfg.value_ty(result.unwrap()));
                        ts.record_access(loaded, site, size);
                        ts.add_instance(addr_node, loaded, OffsetExpression::new(0));
                    }
                }
                Inst::Store { value, addr } => {
                    let addr_node = node_for(module, func_ref, *addr, ts);
                    let stored = node_for(module, func_ref, *value, ts);
                    if let (Some(addr_node), Some(stored)) = (addr_node, stored) {
                        let site = UseSite {
                            func: func_ref,
                            inst: inst_id,
                            operand: 1,
                        };
                        let size = module.ctx.size_of(func.dfg.value_ty(*value));
                        ts.record_access(stored, site, size);
                        ts.add_instance(addr_node, stored, OffsetExpression::new(0));
                    }
                }
                Inst::Cast { from, .. } => {
                    link_equal(module, func_ref, *from, result_node, ts);
                }
                Inst::Phi { args } => {
                    for (incoming, _) in args {
                        link_equal(module, func_ref, *incoming, result_node, ts);
                    }
                }
                Inst::Select { then, else_, .. } => {
                    link_equal(module, func_ref, *then, result_node, ts);
                    link_equal(module, func_ref, *else_, result_node, ts);
                }
                Inst::Return { value: Some(value) } => {
                    // Returned values feed the function's return slot.
                    let value_node = node_for(module, func_ref, *value, ts);
                    let ret_nodes = ts.get_or_create_types(module, IrSlot::Func(func_ref));
                    if let (Some(value_node), Some(&(ret_node, _))) =
                        (value_node, ret_nodes.first())
                    {
                        ts.add_equality(value_node, ret_node);
                    }
                }
                Inst::Call { callee, args } => {
                    // Wire arguments to the callee's parameters and the
                    // call result to the callee's return slot.
                    let callee_args: Vec<ValueId> =
                        module.funcs[*callee].arg_values.to_vec();
                    for (arg, param) in args.iter().zip(callee_args) {
                        let arg_node = node_for(module, func_ref, *arg, ts);
                        let param_node = node_for(module, *callee, param, ts);
                        if let (Some(a), Some(p)) = (arg_node, param_node) {
                            ts.add_equality(a, p);
                        }
                    }

                    if let Some(result_node) = result_node {
                        let ret_nodes = ts.get_or_create_types(module, IrSlot::Func(*callee));
                        if let Some(&(ret_node, _)) = ret_nodes.first() {
                            ts.add_equality(result_node, ret_node);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// The layout node of `value`, created on demand; `None` when the value is
/// not integer- or pointer-typed.
fn node_for(
    module: &Module,
    func: FuncRef,
    value: ValueId,
    ts: &mut TypeSystem,
) -> Option<LayoutNodeId> {
    let ty = module.funcs[func].dfg.value_ty(value);
    if !ty.is_integral() && !module.ctx.is_ptr(ty) {
        return None;
    }

    let key = LayoutKey::value(module, func, value);
    Some(ts.get_or_create(key).0)
}

fn link_equal(
    module: &Module,
    func: FuncRef,
    from: ValueId,
    to: Option<LayoutNodeId>,
    ts: &mut TypeSystem,
) {
    let from_node = node_for(module, func, from, ts);
    if let (Some(from_node), Some(to)) = (from_node, to) {
        ts.add_equality(from_node, to);
    }
}
