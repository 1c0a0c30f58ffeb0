pub mod builder;
pub mod cfg;
pub mod dfg;
pub mod function;
pub mod global_variable;
pub mod inst;
pub mod layout;
pub mod linkage;
pub mod module;
pub mod types;
pub mod value;

pub use builder::{FunctionBuilder, ModuleBuilder};
pub use cfg::ControlFlowGraph;
pub use dfg::{Block, BlockId, DataFlowGraph};
pub use function::{Function, Signature};
pub use global_variable::{GlobalVariable, GlobalVariableData, GlobalVariableStore};
pub use inst::{BinaryOp, CastKind, CmpCond, Inst, InstId};
pub use layout::Layout;
pub use linkage::Linkage;
pub use module::{FuncRef, Module, ModuleCtx};
pub use types::{CompoundType, CompoundTypeRef, DataLayout, Type, TypeStore};
pub use value::{Immediate, Value, ValueId};
