use decant_backend::{
    decompile,
    pipes::{self, ArtifactKind},
    AstContext,
};
use decant_ir::{
    inst::BinaryOp, DataLayout, Inst, Linkage, ModuleBuilder, Signature, Type,
};

#[test]
fn decompilation_contract_is_exact() {
    let contract = pipes::decompilation_contract();
    assert_eq!(contract.input, ArtifactKind::StackAccessesSegregated);
    assert_eq!(contract.input_index, 0);
    assert_eq!(contract.output, ArtifactKind::DecompiledToYaml);
    assert_eq!(contract.output_index, 1);
    assert!(contract.preserves_input);
    assert_eq!(contract.output.name(), "DecompiledToYAML");
}

#[test]
fn decompile_emits_one_entry_per_defined_function() {
    let mut mb = ModuleBuilder::new(DataLayout::default());

    // External declaration: no body, no container entry.
    mb.declare_function(Signature::new(
        "memcpy_like",
        Linkage::External,
        &[Type::I64],
        Type::Void,
    ));

    let func = mb.declare_function(Signature::new(
        "square_plus_self",
        Linkage::Public,
        &[Type::I32],
        Type::I32,
    ));
    let mut fb = mb.func_builder(func);
    let block = fb.append_block();
    fb.switch_to_block(block);
    let x = fb.args()[0];
    // `sq` has two uses, so the default policy materializes it.
    let sq = fb.insert_inst(
        Inst::Binary {
            op: BinaryOp::Mul,
            lhs: x,
            rhs: x,
        },
        Type::I32,
    );
    let sum = fb.insert_inst(
        Inst::Binary {
            op: BinaryOp::Add,
            lhs: sq,
            rhs: sq,
        },
        Type::I32,
    );
    fb.insert_inst_no_result(Inst::Return { value: Some(sum) });
    let module = mb.build();

    let mut ctx = AstContext::from_module(&module);
    let container = decompile(&module, &mut ctx);

    assert_eq!(container.mime(), pipes::DECOMPILED_C_MIME);
    assert_eq!(container.len(), 1);

    let text = container.get("square_plus_self").expect("missing entry");
    assert!(text.contains("bb_0:"), "{text}");
    assert!(text.contains("uint32_t var_0 = arg_0 * arg_0;"), "{text}");
    assert!(text.contains("return (var_0 + var_0);"), "{text}");
}

#[test]
fn container_round_trips_through_yaml() {
    let mut mb = ModuleBuilder::new(DataLayout::default());
    let func = mb.declare_function(Signature::new("noop", Linkage::Public, &[], Type::Void));
    let mut fb = mb.func_builder(func);
    let block = fb.append_block();
    fb.switch_to_block(block);
    fb.insert_inst_no_result(Inst::Return { value: None });
    let module = mb.build();

    let mut ctx = AstContext::from_module(&module);
    let container = decompile(&module, &mut ctx);

    let yaml = container.to_yaml().unwrap();
    assert!(yaml.contains("noop"), "{yaml}");
    assert!(yaml.contains("return;"), "{yaml}");
}
