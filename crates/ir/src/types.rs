//! Types of the lifted IR consumed by the decompiler core.
use std::cmp;

use cranelift_entity::PrimaryMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

#[derive(Debug, Default)]
pub struct TypeStore {
    compounds: PrimaryMap<CompoundTypeRef, CompoundType>,
    rev_types: FxHashMap<CompoundType, CompoundTypeRef>,
}

impl TypeStore {
    pub fn make_ptr(&mut self, ty: Type) -> Type {
        let ty = self.make_compound(CompoundType::Ptr(ty));
        Type::Compound(ty)
    }

    pub fn make_array(&mut self, elem: Type, len: usize) -> Type {
        let ty = self.make_compound(CompoundType::Array { elem, len });
        Type::Compound(ty)
    }

    pub fn make_struct(&mut self, fields: &[Type]) -> Type {
        let cmpd_ref = self.make_compound(CompoundType::Struct {
            fields: fields.into(),
        });
        Type::Compound(cmpd_ref)
    }

    pub fn struct_fields(&self, ty: Type) -> Option<&[Type]> {
        match ty {
            Type::Compound(cmpd_ref) => match self.compounds[cmpd_ref] {
                CompoundType::Struct { ref fields } => Some(fields),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn array_def(&self, ty: Type) -> Option<(Type, usize)> {
        match ty {
            Type::Compound(cmpd_ref) => match self.compounds[cmpd_ref] {
                CompoundType::Array { elem, len } => Some((elem, len)),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn deref(&self, ptr: Type) -> Option<Type> {
        match ptr {
            Type::Compound(cmpd_ref) => match self.compounds[cmpd_ref] {
                CompoundType::Ptr(ty) => Some(ty),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_ptr(&self, ty: Type) -> bool {
        match ty {
            Type::Compound(cmpd_ref) => self.compounds[cmpd_ref].is_ptr(),
            _ => false,
        }
    }

    pub fn is_struct(&self, ty: Type) -> bool {
        match ty {
            Type::Compound(cmpd_ref) => self.compounds[cmpd_ref].is_struct(),
            _ => false,
        }
    }

    pub fn make_compound(&mut self, data: CompoundType) -> CompoundTypeRef {
        match self.rev_types.get(&data) {
            Some(cmpd_ref) => *cmpd_ref,
            None => {
                let cmpd_ref = self.compounds.push(data.clone());
                self.rev_types.insert(data, cmpd_ref);
                cmpd_ref
            }
        }
    }

    pub fn resolve_compound(&self, cmpd_ref: CompoundTypeRef) -> &CompoundType {
        &self.compounds[cmpd_ref]
    }
}

/// IR types. Only integers, pointers and the aggregates reachable from
/// function signatures appear in lifted code; there is no floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Type {
    I1,
    I8,
    I16,
    I32,
    I64,
    I128,
    Compound(CompoundTypeRef),
    #[default]
    Void,
}

impl Type {
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Self::I1 | Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::I128
        )
    }

    pub fn is_compound(self) -> bool {
        matches!(self, Type::Compound(_))
    }

    pub fn is_void(self) -> bool {
        matches!(self, Self::Void)
    }

    /// Bit width of an integral type.
    pub fn bit_width(self) -> Option<u16> {
        match self {
            Self::I1 => Some(1),
            Self::I8 => Some(8),
            Self::I16 => Some(16),
            Self::I32 => Some(32),
            Self::I64 => Some(64),
            Self::I128 => Some(128),
            _ => None,
        }
    }
}

impl cmp::PartialOrd for Type {
    fn partial_cmp(&self, rhs: &Self) -> Option<cmp::Ordering> {
        use Type::*;

        if self == rhs {
            return Some(cmp::Ordering::Equal);
        }

        if !self.is_integral() || !rhs.is_integral() {
            return None;
        }

        match (self, rhs) {
            (I1, _) => Some(cmp::Ordering::Less),
            (I8, I1) => Some(cmp::Ordering::Greater),
            (I8, _) => Some(cmp::Ordering::Less),
            (I16, I1 | I8) => Some(cmp::Ordering::Greater),
            (I16, _) => Some(cmp::Ordering::Less),
            (I32, I1 | I8 | I16) => Some(cmp::Ordering::Greater),
            (I32, _) => Some(cmp::Ordering::Less),
            (I64, I128) => Some(cmp::Ordering::Less),
            (I64, _) => Some(cmp::Ordering::Greater),
            (I128, _) => Some(cmp::Ordering::Greater),
            (_, _) => unreachable!(),
        }
    }
}

/// An opaque reference to [`CompoundType`].
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
pub struct CompoundTypeRef(u32);
cranelift_entity::entity_impl!(CompoundTypeRef);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompoundType {
    Array { elem: Type, len: usize },
    Ptr(Type),
    Struct { fields: SmallVec<[Type; 8]> },
}

impl CompoundType {
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array { .. })
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self, Self::Ptr(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Self::Struct { .. })
    }
}

/// Byte sizes of IR types for the target the binary was lifted from.
#[derive(Debug, Clone, Copy)]
pub struct DataLayout {
    pub pointer_size: u32,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self { pointer_size: 8 }
    }
}

impl DataLayout {
    pub fn new(pointer_size: u32) -> Self {
        Self { pointer_size }
    }

    pub fn pointer_bits(&self) -> u16 {
        (self.pointer_size * 8) as u16
    }

    /// Size of `ty` in bytes. `I1` occupies one byte; structs are packed.
    pub fn size_of(&self, ty: Type, store: &TypeStore) -> u64 {
        match ty {
            Type::I1 | Type::I8 => 1,
            Type::I16 => 2,
            Type::I32 => 4,
            Type::I64 => 8,
            Type::I128 => 16,
            Type::Void => 0,
            Type::Compound(cmpd_ref) => match store.resolve_compound(cmpd_ref) {
                CompoundType::Ptr(_) => self.pointer_size as u64,
                CompoundType::Array { elem, len } => self.size_of(*elem, store) * *len as u64,
                CompoundType::Struct { fields } => {
                    fields.iter().map(|field| self.size_of(*field, store)).sum()
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_types_are_interned() {
        let mut store = TypeStore::default();
        let a = store.make_ptr(Type::I64);
        let b = store.make_ptr(Type::I64);
        assert_eq!(a, b);

        let c = store.make_ptr(Type::I32);
        assert_ne!(a, c);
    }

    #[test]
    fn size_of_compounds() {
        let mut store = TypeStore::default();
        let dl = DataLayout::new(8);

        let ptr = store.make_ptr(Type::I8);
        assert_eq!(dl.size_of(ptr, &store), 8);

        let arr = store.make_array(Type::I32, 4);
        assert_eq!(dl.size_of(arr, &store), 16);

        let st = store.make_struct(&[Type::I64, Type::I8]);
        assert_eq!(dl.size_of(st, &store), 9);
    }
}
