//! Pipeline-facing surface: artifact kinds, step contracts and the YAML
//! string-map containers the host pipeline persists.
use std::io;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use decant_ir::{Inst, Module};

use crate::{ast::AstContext, builder::StmtBuilder, printer::CWriter};

pub const DECOMPILED_C_MIME: &str = "text/x.c+ptml+yaml";
pub const MODEL_TYPE_MIME: &str = "text/x.c+yaml";
pub const MODEL_TYPE_EXTENSION: &str = ".h";

/// The artifact kinds this step consumes and produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArtifactKind {
    StackAccessesSegregated,
    DecompiledToYaml,
    ModelTypeDefinition,
}

impl ArtifactKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::StackAccessesSegregated => "StackAccessesSegregated",
            Self::DecompiledToYaml => "DecompiledToYAML",
            Self::ModelTypeDefinition => "ModelTypeDefinition",
        }
    }
}

/// An exact consumption/production declaration of one pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contract {
    pub input: ArtifactKind,
    pub input_index: usize,
    pub output: ArtifactKind,
    pub output_index: usize,
    pub preserves_input: bool,
}

/// The decompilation step consumes function-kind input 0 and produces
/// output 1, preserving its input.
pub fn decompilation_contract() -> Contract {
    Contract {
        input: ArtifactKind::StackAccessesSegregated,
        input_index: 0,
        output: ArtifactKind::DecompiledToYaml,
        output_index: 1,
        preserves_input: true,
    }
}

/// The type-definition step produces model type definitions idempotently
/// over its target list.
pub fn type_definition_contract() -> Contract {
    Contract {
        input: ArtifactKind::ModelTypeDefinition,
        input_index: 0,
        output: ArtifactKind::ModelTypeDefinition,
        output_index: 0,
        preserves_input: true,
    }
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("yaml serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// An ordered map from stable keys (function symbols, model-type names) to
/// emitted C text, tagged with its MIME type. The container is opaque to
/// the core; the host pipeline persists it.
#[derive(Debug, Clone, Serialize)]
pub struct StringMapContainer {
    mime: &'static str,
    entries: IndexMap<String, String>,
}

impl StringMapContainer {
    pub fn new(mime: &'static str) -> Self {
        Self {
            mime,
            entries: IndexMap::new(),
        }
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(key.into(), text.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, text)| (key.as_str(), text.as_str()))
    }

    pub fn to_yaml(&self) -> Result<String, ArtifactError> {
        Ok(serde_yaml::to_string(&self.entries)?)
    }

    pub fn write_yaml<W: io::Write>(&self, w: &mut W) -> Result<(), ArtifactError> {
        serde_yaml::to_writer(w, &self.entries)?;
        Ok(())
    }
}

/// Decompiles every defined function of `module` into the per-function C
/// container.
///
/// The serialization policy is the default one: an instruction's value is
/// materialized into a named variable when it has more than one use;
/// single-use values stay inlined at their use.
pub fn decompile(module: &Module, ctx: &mut AstContext) -> StringMapContainer {
    let mut container = StringMapContainer::new(DECOMPILED_C_MIME);

    for func_ref in module.iter_functions() {
        let func = &module.funcs[func_ref];
        if func.layout.entry_block().is_none() {
            continue;
        }

        let to_serialize = func
            .dfg
            .iter_insts()
            .filter_map(|(inst_id, _)| {
                let result = func.dfg.inst_result(inst_id)?;
                (func.dfg.users_num(result) > 1).then_some(inst_id)
            })
            .collect();

        let mut builder = StmtBuilder::new(module, func_ref, ctx, to_serialize);
        builder.build();
        let output = builder.finish();

        let writer = CWriter::new(ctx, &output.arena);
        let mut text = String::new();

        let mut cfg = decant_ir::ControlFlowGraph::new();
        cfg.compute(func);
        for block in cfg.rpo() {
            if let Some(label) = output.block_label(block) {
                text.push_str(&output.arena.label(label).name);
                text.push_str(":\n");
            }
            for inst_id in func.layout.iter_inst(block) {
                let Some(stmt) = output.instr_stmt(inst_id) else {
                    continue;
                };

                if let Some(local) = output.var_decl(inst_id) {
                    let decl = output.arena.local(local);
                    let expr = match output.arena.stmt(stmt) {
                        crate::ast::Stmt::Expr(expr) => *expr,
                        _ => continue,
                    };
                    text.push_str(&format!(
                        "  {} {} = {};\n",
                        writer.type_to_string(decl.ty),
                        decl.name,
                        writer.expr_to_string(expr)
                    ));
                    continue;
                }

                // Unserialized value-producing instructions are inlined at
                // their uses; only effectful statements print here.
                let print_plain = match func.dfg.inst(inst_id) {
                    Inst::Store { .. } | Inst::Return { .. } | Inst::Unreachable => true,
                    Inst::Call { .. } => func
                        .dfg
                        .inst_result(inst_id)
                        .map(|result| func.dfg.users_num(result) == 0)
                        .unwrap_or(true),
                    _ => false,
                };
                if print_plain {
                    text.push_str("  ");
                    text.push_str(&writer.stmt_to_string(stmt));
                    text.push('\n');
                }
            }
        }

        debug!(
            target: "ast-builder",
            func = func.sig.name(),
            bytes = text.len(),
            "decompiled function"
        );
        container.insert(func.sig.name(), text);
    }

    container
}
