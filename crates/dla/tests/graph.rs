use decant_dla::{collect, IrSlot, LayoutKey, LinkFilter, OffsetExpression, TypeSystem};
use decant_ir::{
    inst::{BinaryOp, CastKind},
    DataLayout, FuncRef, Inst, Linkage, Module, ModuleBuilder, Signature, Type, ValueId,
};

/// A module with a single function taking `arity` i64 arguments, enough to
/// key standalone graph nodes on real IR values.
fn test_module(arity: usize) -> (Module, FuncRef, Vec<ValueId>) {
    let mut mb = ModuleBuilder::new(DataLayout::default());
    let args = vec![Type::I64; arity];
    let func = mb.declare_function(Signature::new("probe", Linkage::Public, &args, Type::Void));

    let mut fb = mb.func_builder(func);
    let entry = fb.append_block();
    fb.switch_to_block(entry);
    let arg_values = fb.args().to_vec();
    fb.insert_inst_no_result(Inst::Return { value: None });

    (mb.build(), func, arg_values)
}

fn keyed_nodes(
    module: &Module,
    func: FuncRef,
    values: &[ValueId],
    ts: &mut TypeSystem,
) -> Vec<decant_dla::LayoutNodeId> {
    values
        .iter()
        .map(|&value| ts.get_or_create(LayoutKey::value(module, func, value)).0)
        .collect()
}

#[test]
fn get_or_create_is_idempotent() {
    let (module, func, args) = test_module(1);
    let mut ts = TypeSystem::new();

    let key = LayoutKey::value(&module, func, args[0]);
    let (node, created) = ts.get_or_create(key);
    assert!(created);
    let (again, created) = ts.get_or_create(key);
    assert!(!created);
    assert_eq!(node, again);
    assert_eq!(ts.get(key), Some(node));
    assert!(ts.has_keys(node));
}

#[test]
fn equality_normalization_collapses_chains() {
    // Nodes A, B, C with A=B and B=C collapse to one node carrying all
    // three keys, and no equality edge survives.
    let (module, func, args) = test_module(3);
    let mut ts = TypeSystem::new();
    let nodes = keyed_nodes(&module, func, &args, &mut ts);

    ts.add_equality(nodes[0], nodes[1]);
    ts.add_equality(nodes[1], nodes[2]);

    ts.collapse_equality_classes();

    assert!(ts.verify_no_equality());
    assert!(ts.verify_consistency());
    assert_eq!(ts.num_nodes(), 1);

    let survivor = ts.iter_nodes().next().unwrap().0;
    assert_eq!(ts.keys_of(survivor).unwrap().len(), 3);
}

#[test]
fn duplicate_instance_links_share_one_edge() {
    let (module, func, args) = test_module(2);
    let mut ts = TypeSystem::new();
    let nodes = keyed_nodes(&module, func, &args, &mut ts);

    let (tag, was_new) = ts.add_instance(nodes[0], nodes[1], OffsetExpression::new(0));
    assert!(tag.is_some());
    assert!(was_new);

    let (tag_again, was_new) = ts.add_instance(nodes[0], nodes[1], OffsetExpression::new(0));
    assert_eq!(tag, tag_again);
    assert!(!was_new);

    assert_eq!(ts.node(nodes[0]).successors().count(), 1);
}

#[test]
fn diamond_inheritance_is_a_dag_but_not_a_tree() {
    let (module, func, args) = test_module(3);
    let mut ts = TypeSystem::new();
    let nodes = keyed_nodes(&module, func, &args, &mut ts);
    let (a, b, c) = (nodes[0], nodes[1], nodes[2]);

    ts.add_inheritance(a, b);
    ts.add_inheritance(c, b);
    ts.add_inheritance(a, c);

    assert!(ts.verify_inheritance_dag());
    // B has two inheritance predecessors.
    assert!(!ts.verify_inheritance_tree());
}

#[test]
fn inheritance_normalization_produces_a_tree() {
    let (module, func, args) = test_module(4);
    let mut ts = TypeSystem::new();
    let nodes = keyed_nodes(&module, func, &args, &mut ts);

    ts.add_inheritance(nodes[0], nodes[3]);
    ts.add_inheritance(nodes[1], nodes[3]);
    ts.add_inheritance(nodes[2], nodes[3]);

    ts.enforce_inheritance_tree();

    assert!(ts.verify_inheritance_tree());
    assert!(ts.verify_consistency());
}

#[test]
fn consistency_holds_under_mixed_operations() {
    let (module, func, args) = test_module(6);
    let mut ts = TypeSystem::new();
    let nodes = keyed_nodes(&module, func, &args, &mut ts);

    ts.add_equality(nodes[0], nodes[1]);
    ts.add_inheritance(nodes[2], nodes[3]);
    let mut oe = OffsetExpression::new(16);
    oe.add_dimension(8, Some(4));
    ts.add_instance(nodes[3], nodes[4], oe);
    assert!(ts.verify_consistency());

    ts.merge(nodes[1], nodes[0]);
    assert!(ts.verify_consistency());

    ts.remove(nodes[4]);
    assert!(ts.verify_consistency());

    ts.merge_all(&[nodes[2], nodes[3], nodes[5]]);
    assert!(ts.verify_consistency());
    assert!(ts.verify_dag());
}

#[test]
fn merge_keeps_larger_size_and_unions_accesses() {
    let (module, func, args) = test_module(2);
    let mut ts = TypeSystem::new();
    let nodes = keyed_nodes(&module, func, &args, &mut ts);

    let site = decant_dla::UseSite {
        func,
        inst: decant_ir::InstId(0),
        operand: 0,
    };
    ts.record_access(nodes[0], site, 4);
    ts.record_access(nodes[1], site, 8);

    ts.merge(nodes[1], nodes[0]);

    let node = ts.node(nodes[0]);
    assert_eq!(node.size, 8);
    assert_eq!(node.accesses.len(), 1);
    assert_eq!(ts.keys_of(nodes[0]).unwrap().len(), 2);
}

#[test]
fn aggregate_returns_expand_per_field() {
    let mut mb = ModuleBuilder::new(DataLayout::default());
    let pair = mb.struct_type(&[Type::I64, Type::I32]);
    let func = mb.declare_function(Signature::new("wide", Linkage::Public, &[], pair));
    let mut fb = mb.func_builder(func);
    let entry = fb.append_block();
    fb.switch_to_block(entry);
    fb.insert_inst_no_result(Inst::Return { value: None });
    let module = mb.build();

    let mut ts = TypeSystem::new();
    let created = ts.get_or_create_types(&module, IrSlot::Func(func));
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|(_, is_new)| *is_new));

    let found = ts.types_of(&module, IrSlot::Func(func));
    assert_eq!(found.len(), 2);
    assert_ne!(found[0], found[1]);
}

#[test]
fn collector_seeds_and_normalizes_a_load_chain() {
    // p = inttoptr x; v = load p; return v
    let mut mb = ModuleBuilder::new(DataLayout::default());
    let i8_ptr = mb.ptr_type(Type::I8);
    let func = mb.declare_function(Signature::new(
        "read_byte",
        Linkage::Public,
        &[Type::I64],
        Type::I8,
    ));

    let mut fb = mb.func_builder(func);
    let entry = fb.append_block();
    fb.switch_to_block(entry);
    let x = fb.args()[0];
    let p = fb.insert_inst(
        Inst::Cast {
            kind: CastKind::IntToPtr,
            from: x,
        },
        i8_ptr,
    );
    let v = fb.insert_inst(Inst::Load { addr: p }, Type::I8);
    fb.insert_inst_no_result(Inst::Return { value: Some(v) });
    let module = mb.build();

    let mut ts = collect(&module);
    assert!(ts.verify_consistency());

    // x = p via the cast; load makes v an instance of *p with evidence.
    let v_node = ts.get(LayoutKey::value(&module, func, v)).unwrap();
    assert!(!ts.node(v_node).accesses.is_empty());
    assert_eq!(ts.node(v_node).size, 1);

    ts.normalize();
    assert!(ts.verify_no_equality());
    assert!(ts.verify_inheritance_tree());
    assert!(ts.verify_dag());
    assert!(ts.verify_leafs_have_layout());
}

#[test]
fn binary_results_do_not_carry_layout_evidence() {
    let mut mb = ModuleBuilder::new(DataLayout::default());
    let func = mb.declare_function(Signature::new(
        "sum",
        Linkage::Public,
        &[Type::I32, Type::I32],
        Type::I32,
    ));
    let mut fb = mb.func_builder(func);
    let entry = fb.append_block();
    fb.switch_to_block(entry);
    let (x, y) = (fb.args()[0], fb.args()[1]);
    let sum = fb.insert_inst(
        Inst::Binary {
            op: BinaryOp::Add,
            lhs: x,
            rhs: y,
        },
        Type::I32,
    );
    fb.insert_inst_no_result(Inst::Return { value: Some(sum) });
    let module = mb.build();

    let ts = collect(&module);
    let sum_node = ts.get(LayoutKey::value(&module, func, sum)).unwrap();
    assert!(ts.node(sum_node).accesses.is_empty());
    assert!(ts.is_leaf_for(sum_node, LinkFilter::Instance));
}
