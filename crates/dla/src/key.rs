//! Identities of typed slots observed by the layout analysis.
use std::fmt;

use decant_ir::{FuncRef, Module, ValueId};

/// The IR entity a layout type was observed on: a whole function (its
/// return slot) or a single SSA value of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IrSlot {
    Func(FuncRef),
    Value(FuncRef, ValueId),
}

/// Identity of a typed slot: an [`IrSlot`] plus an optional tuple-field
/// index for functions that return an aggregate.
///
/// Construction enforces:
/// - a `Value` slot must be integer- or pointer-typed;
/// - `field_idx` is present iff the slot is a function returning a struct,
///   and is then below the struct's field count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayoutKey {
    slot: IrSlot,
    field_idx: Option<u32>,
}

impl LayoutKey {
    pub fn new(module: &Module, slot: IrSlot, field_idx: Option<u32>) -> Self {
        match slot {
            IrSlot::Value(func, value) => {
                let ty = module.funcs[func].dfg.value_ty(value);
                assert!(
                    ty.is_integral() || module.ctx.is_ptr(ty),
                    "layout key over non-integer, non-pointer value"
                );
                assert!(
                    field_idx.is_none(),
                    "field index on a non-function layout key"
                );
            }
            IrSlot::Func(func) => {
                let ret_ty = module.funcs[func].sig.ret_ty();
                let fields = module.ctx.type_store.struct_fields(ret_ty);
                match (fields, field_idx) {
                    (Some(fields), Some(idx)) => {
                        assert!(
                            (idx as usize) < fields.len(),
                            "field index {idx} out of bounds for aggregate return"
                        );
                    }
                    (None, None) => {}
                    (Some(_), None) => {
                        panic!("missing field index for aggregate-returning function")
                    }
                    (None, Some(_)) => {
                        panic!("field index on a function without aggregate return")
                    }
                }
            }
        }

        Self { slot, field_idx }
    }

    /// Key for a single SSA value.
    pub fn value(module: &Module, func: FuncRef, value: ValueId) -> Self {
        Self::new(module, IrSlot::Value(func, value), None)
    }

    /// Key for a function's (scalar) return slot.
    pub fn func(module: &Module, func: FuncRef) -> Self {
        Self::new(module, IrSlot::Func(func), None)
    }

    /// Key for one field of a function's aggregate return.
    pub fn func_field(module: &Module, func: FuncRef, field_idx: u32) -> Self {
        Self::new(module, IrSlot::Func(func), Some(field_idx))
    }

    pub fn slot(&self) -> IrSlot {
        self.slot
    }

    pub fn field_idx(&self) -> Option<u32> {
        self.field_idx
    }
}

impl fmt::Display for LayoutKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.slot {
            IrSlot::Func(func) => write!(f, "{func:?}")?,
            IrSlot::Value(func, value) => write!(f, "{func:?}/{value:?}")?,
        }
        if let Some(idx) = self.field_idx {
            write!(f, ".{idx}")?;
        }
        Ok(())
    }
}
