//! The C-side type model: qualified types over an interning store.
use cranelift_entity::PrimaryMap;
use rustc_hash::FxHashMap;

/// An opaque reference to [`CTypeData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CTypeRef(u32);
cranelift_entity::entity_impl!(CTypeRef);

/// A C type plus qualifiers. Only `volatile` matters to this core (it is
/// added to pointees of null-constant addresses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualType {
    pub ty: CTypeRef,
    pub volatile: bool,
}

impl QualType {
    pub fn new(ty: CTypeRef) -> Self {
        Self {
            ty,
            volatile: false,
        }
    }

    pub fn with_volatile(self) -> Self {
        Self {
            volatile: true,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CTypeData {
    Void,
    Bool,
    Char,
    Int { width: u16, signed: bool },
    /// `uintptr_t`; kept distinct from plain integers so casts through it
    /// render faithfully.
    UIntPtr { width: u16 },
    Ptr(QualType),
    Array { elem: QualType, len: u64 },
}

/// Interning store for C types, shaped like the IR-side type store: a
/// dense arena plus a reverse map so equal types share one handle.
#[derive(Debug)]
pub struct CTypeStore {
    types: PrimaryMap<CTypeRef, CTypeData>,
    rev_types: FxHashMap<CTypeData, CTypeRef>,
    pointer_bits: u16,
}

impl CTypeStore {
    pub fn new(pointer_bits: u16) -> Self {
        Self {
            types: PrimaryMap::default(),
            rev_types: FxHashMap::default(),
            pointer_bits,
        }
    }

    pub fn pointer_bits(&self) -> u16 {
        self.pointer_bits
    }

    pub fn intern(&mut self, data: CTypeData) -> CTypeRef {
        match self.rev_types.get(&data) {
            Some(ty) => *ty,
            None => {
                let ty = self.types.push(data.clone());
                self.rev_types.insert(data, ty);
                ty
            }
        }
    }

    pub fn resolve(&self, ty: CTypeRef) -> &CTypeData {
        &self.types[ty]
    }

    pub fn void(&mut self) -> QualType {
        QualType::new(self.intern(CTypeData::Void))
    }

    pub fn bool_ty(&mut self) -> QualType {
        QualType::new(self.intern(CTypeData::Bool))
    }

    pub fn char_ty(&mut self) -> QualType {
        QualType::new(self.intern(CTypeData::Char))
    }

    pub fn int(&mut self, width: u16, signed: bool) -> QualType {
        QualType::new(self.intern(CTypeData::Int { width, signed }))
    }

    pub fn uintptr(&mut self) -> QualType {
        let width = self.pointer_bits;
        QualType::new(self.intern(CTypeData::UIntPtr { width }))
    }

    pub fn ptr(&mut self, pointee: QualType) -> QualType {
        QualType::new(self.intern(CTypeData::Ptr(pointee)))
    }

    pub fn array(&mut self, elem: QualType, len: u64) -> QualType {
        QualType::new(self.intern(CTypeData::Array { elem, len }))
    }

    pub fn is_integer(&self, ty: QualType) -> bool {
        matches!(
            self.resolve(ty.ty),
            CTypeData::Bool | CTypeData::Char | CTypeData::Int { .. } | CTypeData::UIntPtr { .. }
        )
    }

    pub fn is_pointer(&self, ty: QualType) -> bool {
        matches!(self.resolve(ty.ty), CTypeData::Ptr(_))
    }

    pub fn is_signed(&self, ty: QualType) -> bool {
        matches!(self.resolve(ty.ty), CTypeData::Int { signed: true, .. })
    }

    pub fn pointee(&self, ty: QualType) -> Option<QualType> {
        match self.resolve(ty.ty) {
            CTypeData::Ptr(pointee) => Some(*pointee),
            _ => None,
        }
    }

    /// Bit width of an integer or pointer type. `_Bool` and `char` occupy
    /// one byte.
    pub fn bit_width(&self, ty: QualType) -> u16 {
        match self.resolve(ty.ty) {
            CTypeData::Bool | CTypeData::Char => 8,
            CTypeData::Int { width, .. } => *width,
            CTypeData::UIntPtr { width } => *width,
            CTypeData::Ptr(_) => self.pointer_bits,
            data => panic!("bit width of non-scalar C type {data:?}"),
        }
    }

    /// The signed integer type of `width` bits.
    pub fn signed_int(&mut self, width: u16) -> QualType {
        self.int(width, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let mut store = CTypeStore::new(64);
        let a = store.int(32, false);
        let b = store.int(32, false);
        assert_eq!(a, b);
        assert_ne!(store.int(32, true), a);

        let p1 = store.ptr(a);
        let p2 = store.ptr(b);
        assert_eq!(p1, p2);
    }

    #[test]
    fn volatile_is_a_qualifier_not_a_type() {
        let mut store = CTypeStore::new(64);
        let t = store.int(8, false);
        let v = t.with_volatile();
        assert_eq!(t.ty, v.ty);
        assert_ne!(t, v);
    }

    #[test]
    fn widths() {
        let mut store = CTypeStore::new(64);
        let b = store.bool_ty();
        assert_eq!(store.bit_width(b), 8);
        let p = store.ptr(b);
        assert_eq!(store.bit_width(p), 64);
        let up = store.uintptr();
        assert_eq!(store.bit_width(up), 64);
    }
}
