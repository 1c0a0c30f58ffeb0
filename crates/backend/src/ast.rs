//! The C-style AST: sum types over arena-allocated nodes.
//!
//! Expressions and statements live in a per-function [`AstArena`] so that
//! teardown is one drop; declarations for functions and globals live in the
//! longer-lived [`AstContext`] and are only referenced from expressions.
use cranelift_entity::PrimaryMap;
use rustc_hash::FxHashMap;

use decant_ir::{FuncRef, GlobalVariable, Module};

use crate::{
    ctype::{CTypeStore, QualType},
    translate,
};

/// An opaque reference to an [`Expr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(u32);
cranelift_entity::entity_impl!(ExprId);

/// An opaque reference to a [`Stmt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StmtId(u32);
cranelift_entity::entity_impl!(StmtId);

/// An opaque reference to a local variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalId(u32);
cranelift_entity::entity_impl!(LocalId);

/// An opaque reference to a label declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelId(u32);
cranelift_entity::entity_impl!(LabelId);

/// An opaque reference to a function declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncDeclId(u32);
cranelift_entity::entity_impl!(FuncDeclId);

/// An opaque reference to a global variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlobalDeclId(u32);
cranelift_entity::entity_impl!(GlobalDeclId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Deref,
    AddrOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,
}

impl BinOp {
    pub fn as_text(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Assign => "=",
        }
    }
}

/// The cast kinds this core can emit. Explicit C-style casts carry one of
/// the reinterpretation kinds; the value-category adjustments are implicit
/// and render to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    IntegralCast,
    IntegralToPointer,
    PointerToIntegral,
    BitCast,
    LValueToRValue,
    ArrayToPointerDecay,
}

/// What a declaration reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclRef {
    Func(FuncDeclId),
    Global(GlobalDeclId),
    Param(FuncDeclId, usize),
    Local(LocalId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprData {
    /// An integer literal. The value is stored as raw 64-bit data; the
    /// carried type decides signedness of rendering.
    IntLit { value: u64 },
    DeclRef(DeclRef),
    Unary { op: UnaryOp, operand: ExprId },
    Binary { op: BinOp, lhs: ExprId, rhs: ExprId },
    /// An explicit C-style cast to the expression's carried type.
    Cast { op: CastOp, operand: ExprId },
    /// An implicit value adjustment; invisible in rendered C.
    ImplicitCast { op: CastOp, operand: ExprId },
    Paren(ExprId),
    Subscript { base: ExprId, index: ExprId },
    Call { callee: ExprId, args: Vec<ExprId> },
    Conditional {
        cond: ExprId,
        then: ExprId,
        else_: ExprId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub data: ExprData,
    pub ty: QualType,
    pub is_lvalue: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Expr(ExprId),
    Return(Option<ExprId>),
    Compound(Vec<StmtId>),
    Label(LabelId),
    Goto(LabelId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDeclData {
    pub name: String,
    pub ty: QualType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDeclData {
    pub name: String,
    pub ty: QualType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDeclData {
    pub name: String,
    pub ret_ty: QualType,
    pub params: Vec<ParamDeclData>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDeclData {
    pub name: String,
}

/// Per-function arena for AST nodes and the declarations scoped to one
/// function (named locals, alloca arrays, block labels).
#[derive(Debug)]
pub struct AstArena {
    pub exprs: PrimaryMap<ExprId, Expr>,
    pub stmts: PrimaryMap<StmtId, Stmt>,
    pub locals: PrimaryMap<LocalId, VarDeclData>,
    pub labels: PrimaryMap<LabelId, LabelDeclData>,
}

impl AstArena {
    pub fn new() -> Self {
        Self {
            exprs: PrimaryMap::default(),
            stmts: PrimaryMap::default(),
            labels: PrimaryMap::default(),
            locals: PrimaryMap::default(),
        }
    }

    pub fn make_expr(&mut self, data: ExprData, ty: QualType, is_lvalue: bool) -> ExprId {
        self.exprs.push(Expr {
            data,
            ty,
            is_lvalue,
        })
    }

    pub fn make_stmt(&mut self, stmt: Stmt) -> StmtId {
        self.stmts.push(stmt)
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id]
    }

    pub fn local(&self, id: LocalId) -> &VarDeclData {
        &self.locals[id]
    }

    pub fn label(&self, id: LabelId) -> &LabelDeclData {
        &self.labels[id]
    }
}

impl Default for AstArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Long-lived declaration context: the C type store plus the function and
/// global declarations materialized from the module.
#[derive(Debug)]
pub struct AstContext {
    pub types: CTypeStore,
    pub func_decls: PrimaryMap<FuncDeclId, FunctionDeclData>,
    pub global_decls: PrimaryMap<GlobalDeclId, VarDeclData>,
    func_map: FxHashMap<FuncRef, FuncDeclId>,
    global_map: FxHashMap<GlobalVariable, GlobalDeclId>,
    symbols: FxHashMap<String, FuncDeclId>,
}

impl AstContext {
    /// Materializes C declarations for every function and global of the
    /// module, and guarantees an `abort` declaration exists.
    pub fn from_module(module: &Module) -> Self {
        let mut ctx = Self {
            types: CTypeStore::new(module.ctx.data_layout.pointer_bits()),
            func_decls: PrimaryMap::default(),
            global_decls: PrimaryMap::default(),
            func_map: FxHashMap::default(),
            global_map: FxHashMap::default(),
            symbols: FxHashMap::default(),
        };

        for func_ref in module.iter_functions() {
            let sig = &module.funcs[func_ref].sig;
            let ret_ty = translate::qual_type_of(module, &mut ctx.types, sig.ret_ty());
            let params = sig
                .args()
                .iter()
                .enumerate()
                .map(|(idx, arg_ty)| ParamDeclData {
                    name: format!("arg_{idx}"),
                    ty: translate::qual_type_of(module, &mut ctx.types, *arg_ty),
                })
                .collect();

            let decl = ctx.func_decls.push(FunctionDeclData {
                name: sig.name().to_string(),
                ret_ty,
                params,
            });
            ctx.func_map.insert(func_ref, decl);
            ctx.symbols.insert(sig.name().to_string(), decl);
        }

        for (gv, data) in module.ctx.gv_store.all_gv() {
            let ty = translate::qual_type_of(module, &mut ctx.types, data.ty);
            let decl = ctx.global_decls.push(VarDeclData {
                name: data.symbol.clone(),
                ty,
            });
            ctx.global_map.insert(gv, decl);
        }

        if !ctx.symbols.contains_key("abort") {
            let ret_ty = ctx.types.void();
            let decl = ctx.func_decls.push(FunctionDeclData {
                name: "abort".to_string(),
                ret_ty,
                params: Vec::new(),
            });
            ctx.symbols.insert("abort".to_string(), decl);
        }

        ctx
    }

    pub fn func_decl(&self, func: FuncRef) -> FuncDeclId {
        self.func_map[&func]
    }

    pub fn global_decl(&self, gv: GlobalVariable) -> GlobalDeclId {
        self.global_map[&gv]
    }

    pub fn func_decl_by_name(&self, name: &str) -> Option<FuncDeclId> {
        self.symbols.get(name).copied()
    }
}
