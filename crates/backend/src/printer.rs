//! Deterministic C rendering of the synthesized AST.
use std::io;

use crate::{
    ast::{AstArena, AstContext, CastOp, DeclRef, ExprData, ExprId, Stmt, StmtId, UnaryOp},
    ctype::{CTypeData, QualType},
};

/// Renders expressions, statements and types of one function's arena.
pub struct CWriter<'a> {
    ctx: &'a AstContext,
    arena: &'a AstArena,
}

impl<'a> CWriter<'a> {
    pub fn new(ctx: &'a AstContext, arena: &'a AstArena) -> Self {
        Self { ctx, arena }
    }

    pub fn write_type<W: io::Write>(&self, w: &mut W, ty: QualType) -> io::Result<()> {
        if ty.volatile {
            write!(w, "volatile ")?;
        }
        match self.ctx.types.resolve(ty.ty) {
            CTypeData::Void => write!(w, "void"),
            CTypeData::Bool => write!(w, "bool"),
            CTypeData::Char => write!(w, "char"),
            CTypeData::Int { width, signed } => {
                if *signed {
                    write!(w, "int{width}_t")
                } else {
                    write!(w, "uint{width}_t")
                }
            }
            CTypeData::UIntPtr { .. } => write!(w, "uintptr_t"),
            CTypeData::Ptr(pointee) => {
                self.write_type(w, *pointee)?;
                write!(w, " *")
            }
            CTypeData::Array { elem, len } => {
                self.write_type(w, *elem)?;
                write!(w, "[{len}]")
            }
        }
    }

    pub fn write_expr<W: io::Write>(&self, w: &mut W, expr: ExprId) -> io::Result<()> {
        let node = self.arena.expr(expr);
        match &node.data {
            ExprData::IntLit { value } => {
                if self.ctx.types.is_signed(node.ty) {
                    write!(w, "{}", *value as i64)
                } else {
                    write!(w, "{value}")
                }
            }
            ExprData::DeclRef(decl_ref) => write!(w, "{}", self.decl_name(*decl_ref)),
            ExprData::Unary { op, operand } => {
                match op {
                    UnaryOp::Deref => write!(w, "*")?,
                    UnaryOp::AddrOf => write!(w, "&")?,
                }
                self.write_expr(w, *operand)
            }
            ExprData::Binary { op, lhs, rhs } => {
                self.write_expr(w, *lhs)?;
                write!(w, " {} ", op.as_text())?;
                self.write_expr(w, *rhs)
            }
            ExprData::Cast { operand, .. } => {
                write!(w, "(")?;
                self.write_type(w, node.ty)?;
                write!(w, ")")?;
                self.write_expr(w, *operand)
            }
            ExprData::ImplicitCast { operand, op } => {
                debug_assert!(matches!(
                    op,
                    CastOp::LValueToRValue | CastOp::ArrayToPointerDecay
                ));
                self.write_expr(w, *operand)
            }
            ExprData::Paren(inner) => {
                write!(w, "(")?;
                self.write_expr(w, *inner)?;
                write!(w, ")")
            }
            ExprData::Subscript { base, index } => {
                self.write_expr(w, *base)?;
                write!(w, "[")?;
                self.write_expr(w, *index)?;
                write!(w, "]")
            }
            ExprData::Call { callee, args } => {
                self.write_expr(w, *callee)?;
                write!(w, "(")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        write!(w, ", ")?;
                    }
                    self.write_expr(w, *arg)?;
                }
                write!(w, ")")
            }
            ExprData::Conditional { cond, then, else_ } => {
                self.write_expr(w, *cond)?;
                write!(w, " ? ")?;
                self.write_expr(w, *then)?;
                write!(w, " : ")?;
                self.write_expr(w, *else_)
            }
        }
    }

    pub fn write_stmt<W: io::Write>(&self, w: &mut W, stmt: StmtId) -> io::Result<()> {
        match self.arena.stmt(stmt) {
            Stmt::Expr(expr) => {
                self.write_expr(w, *expr)?;
                write!(w, ";")
            }
            Stmt::Return(None) => write!(w, "return;"),
            Stmt::Return(Some(expr)) => {
                write!(w, "return ")?;
                self.write_expr(w, *expr)?;
                write!(w, ";")
            }
            Stmt::Compound(stmts) => {
                writeln!(w, "{{")?;
                for inner in stmts {
                    write!(w, "  ")?;
                    self.write_stmt(w, *inner)?;
                    writeln!(w)?;
                }
                write!(w, "}}")
            }
            Stmt::Label(label) => write!(w, "{}:", self.arena.label(*label).name),
            Stmt::Goto(label) => write!(w, "goto {};", self.arena.label(*label).name),
        }
    }

    fn decl_name(&self, decl_ref: DeclRef) -> &str {
        match decl_ref {
            DeclRef::Func(decl) => &self.ctx.func_decls[decl].name,
            DeclRef::Global(decl) => &self.ctx.global_decls[decl].name,
            DeclRef::Param(decl, idx) => &self.ctx.func_decls[decl].params[idx].name,
            DeclRef::Local(decl) => &self.arena.local(decl).name,
        }
    }

    pub fn expr_to_string(&self, expr: ExprId) -> String {
        let mut buf = Vec::new();
        self.write_expr(&mut buf, expr).unwrap();
        String::from_utf8(buf).unwrap()
    }

    pub fn stmt_to_string(&self, stmt: StmtId) -> String {
        let mut buf = Vec::new();
        self.write_stmt(&mut buf, stmt).unwrap();
        String::from_utf8(buf).unwrap()
    }

    pub fn type_to_string(&self, ty: QualType) -> String {
        let mut buf = Vec::new();
        self.write_type(&mut buf, ty).unwrap();
        String::from_utf8(buf).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LabelDeclData;
    use decant_ir::{DataLayout, Module, ModuleCtx};

    #[test]
    fn labels_gotos_and_compounds_render() {
        let module = Module::new(ModuleCtx::new(DataLayout::default()));
        let ctx = AstContext::from_module(&module);
        let mut arena = AstArena::new();

        let label = arena.labels.push(LabelDeclData {
            name: "bb_2".to_string(),
        });
        let label_stmt = arena.make_stmt(Stmt::Label(label));
        let goto_stmt = arena.make_stmt(Stmt::Goto(label));
        let ret = arena.make_stmt(Stmt::Return(None));
        let body = arena.make_stmt(Stmt::Compound(vec![label_stmt, goto_stmt, ret]));

        let writer = CWriter::new(&ctx, &arena);
        assert_eq!(
            writer.stmt_to_string(body),
            "{\n  bb_2:\n  goto bb_2;\n  return;\n}"
        );
    }

    #[test]
    fn pointer_types_render_inside_out() {
        let module = Module::new(ModuleCtx::new(DataLayout::default()));
        let mut ctx = AstContext::from_module(&module);
        let arena = AstArena::new();

        let u8_ty = ctx.types.int(8, false);
        let volatile_ptr = {
            let pointee = u8_ty.with_volatile();
            ctx.types.ptr(pointee)
        };
        let writer = CWriter::new(&ctx, &arena);
        assert_eq!(writer.type_to_string(volatile_ptr), "volatile uint8_t *");
    }
}
