//! IR-to-C type translation.
//!
//! A pure mapping: integers become the unsigned exact-width C type,
//! pointers become pointers to the translated pointee (pointer-to-char
//! when the pointee is opaque), arrays translate element-wise for global
//! declarations. Signedness only ever appears later, through casts.
use decant_ir::{CompoundType, Module, Type};

use crate::ctype::{CTypeStore, QualType};

pub fn qual_type_of(module: &Module, store: &mut CTypeStore, ty: Type) -> QualType {
    match ty {
        Type::I1 => store.bool_ty(),
        Type::I8 => store.int(8, false),
        Type::I16 => store.int(16, false),
        Type::I32 => store.int(32, false),
        Type::I64 => store.int(64, false),
        Type::I128 => store.int(128, false),
        Type::Void => store.void(),
        Type::Compound(cmpd_ref) => {
            match module.ctx.type_store.resolve_compound(cmpd_ref).clone() {
                CompoundType::Ptr(pointee) => {
                    if pointee.is_void() || module.ctx.type_store.is_struct(pointee) {
                        // Opaque pointee: fall back to pointer-to-char.
                        let char_ty = store.char_ty();
                        store.ptr(char_ty)
                    } else {
                        let pointee = qual_type_of(module, store, pointee);
                        store.ptr(pointee)
                    }
                }
                CompoundType::Array { elem, len } => {
                    let elem = qual_type_of(module, store, elem);
                    store.array(elem, len as u64)
                }
                CompoundType::Struct { .. } => {
                    panic!("aggregate type reaches scalar type translation")
                }
            }
        }
    }
}

/// Per-field translation of a function's aggregate return type.
pub fn aggregate_field_types(
    module: &Module,
    store: &mut CTypeStore,
    ty: Type,
) -> Option<Vec<QualType>> {
    let fields = module.ctx.type_store.struct_fields(ty)?.to_vec();
    Some(
        fields
            .into_iter()
            .map(|field| qual_type_of(module, store, field))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use decant_ir::{DataLayout, ModuleBuilder};

    use crate::ctype::CTypeData;

    #[test]
    fn integers_translate_unsigned_exact_width() {
        let mb = ModuleBuilder::new(DataLayout::default());
        let module = mb.build();
        let mut store = CTypeStore::new(64);

        let u32_ty = qual_type_of(&module, &mut store, Type::I32);
        assert_eq!(
            store.resolve(u32_ty.ty),
            &CTypeData::Int {
                width: 32,
                signed: false
            }
        );

        let bool_ty = qual_type_of(&module, &mut store, Type::I1);
        assert_eq!(store.resolve(bool_ty.ty), &CTypeData::Bool);

        let u128_ty = qual_type_of(&module, &mut store, Type::I128);
        assert_eq!(
            store.resolve(u128_ty.ty),
            &CTypeData::Int {
                width: 128,
                signed: false
            }
        );
    }

    #[test]
    fn opaque_pointees_become_char_pointers() {
        let mut mb = ModuleBuilder::new(DataLayout::default());
        let void_ptr = mb.ptr_type(Type::Void);
        let module = mb.build();
        let mut store = CTypeStore::new(64);

        let translated = qual_type_of(&module, &mut store, void_ptr);
        let pointee = store.pointee(translated).unwrap();
        assert_eq!(store.resolve(pointee.ty), &CTypeData::Char);
    }

    #[test]
    fn pointer_pointees_translate_recursively() {
        let mut mb = ModuleBuilder::new(DataLayout::default());
        let u16_ptr = mb.ptr_type(Type::I16);
        let module = mb.build();
        let mut store = CTypeStore::new(64);

        let translated = qual_type_of(&module, &mut store, u16_ptr);
        let pointee = store.pointee(translated).unwrap();
        assert_eq!(
            store.resolve(pointee.ty),
            &CTypeData::Int {
                width: 16,
                signed: false
            }
        );
    }

    #[test]
    fn aggregate_returns_translate_per_field() {
        let mut mb = ModuleBuilder::new(DataLayout::default());
        let pair = mb.struct_type(&[Type::I64, Type::I1]);
        let module = mb.build();
        let mut store = CTypeStore::new(64);

        let fields = aggregate_field_types(&module, &mut store, pair).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(
            store.resolve(fields[0].ty),
            &CTypeData::Int {
                width: 64,
                signed: false
            }
        );
        assert_eq!(store.resolve(fields[1].ty), &CTypeData::Bool);
    }
}
