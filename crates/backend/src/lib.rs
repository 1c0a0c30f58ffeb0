//! The IR-to-AST back-end: turns lifted, SSA-form IR functions into
//! C-style ASTs and serializes them into the pipeline's containers.
pub mod ast;
pub mod builder;
pub mod ctype;
pub mod pipes;
pub mod printer;
pub mod translate;

pub use ast::{AstArena, AstContext, Expr, ExprData, ExprId, Stmt, StmtId};
pub use builder::{BuildOutput, StmtBuilder};
pub use ctype::{CTypeData, CTypeRef, CTypeStore, QualType};
pub use pipes::{decompile, ArtifactKind, Contract, StringMapContainer};
pub use printer::CWriter;
pub use translate::qual_type_of;
