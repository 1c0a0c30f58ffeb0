use cranelift_entity::{entity_impl, PrimaryMap};
use rustc_hash::FxHashMap;

use crate::{
    types::{DataLayout, TypeStore},
    Function, GlobalVariableStore, Type,
};

/// Shared per-module state: the type store, the global variable store and
/// the data layout of the lifted target.
#[derive(Debug, Default)]
pub struct ModuleCtx {
    pub type_store: TypeStore,
    pub gv_store: GlobalVariableStore,
    pub data_layout: DataLayout,
}

impl ModuleCtx {
    pub fn new(data_layout: DataLayout) -> Self {
        Self {
            type_store: TypeStore::default(),
            gv_store: GlobalVariableStore::default(),
            data_layout,
        }
    }

    /// Size of `ty` in bytes.
    pub fn size_of(&self, ty: Type) -> u64 {
        self.data_layout.size_of(ty, &self.type_store)
    }

    pub fn is_ptr(&self, ty: Type) -> bool {
        self.type_store.is_ptr(ty)
    }
}

#[derive(Debug, Default)]
pub struct Module {
    pub ctx: ModuleCtx,

    /// Holds all functions declared in the module.
    pub funcs: PrimaryMap<FuncRef, Function>,

    symbols: FxHashMap<String, FuncRef>,
}

impl Module {
    pub fn new(ctx: ModuleCtx) -> Self {
        Self {
            ctx,
            funcs: PrimaryMap::default(),
            symbols: FxHashMap::default(),
        }
    }

    pub fn declare_function(&mut self, func: Function) -> FuncRef {
        let name = func.sig.name().to_string();
        let func_ref = self.funcs.push(func);
        if self.symbols.insert(name.clone(), func_ref).is_some() {
            panic!("duplicate function symbol `{name}`");
        }
        func_ref
    }

    pub fn iter_functions(&self) -> impl Iterator<Item = FuncRef> {
        self.funcs.keys()
    }

    pub fn func_by_symbol(&self, symbol: &str) -> Option<FuncRef> {
        self.symbols.get(symbol).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncRef(u32);
entity_impl!(FuncRef);
