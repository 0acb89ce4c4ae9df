//! Smart builder for union types.
//!
//! Invariants maintained here:
//!   * No single-element union types (just the contained type instead.)
//!   * No nested unions (the inner union flattens into the outer one.)
//!   * `Never` contributes nothing; an empty union *is* `Never`.
//!   * The same type never appears more than once, where "the same" is
//!     [`is_type_same`] rather than identity, so an instance and its
//!     differently-interned twin cannot both survive.
//!
//! The implication is that a [`UnionBuilder`] does not necessarily build a
//! `Type::Union`: adding one type and building returns that type directly.

use smallvec::SmallVec;

use crate::types::{is_type_same, Type, TypeSameOptions, UnionType};
use crate::Db;

pub struct UnionBuilder<'db> {
    db: &'db dyn Db,
    // Most unions stay small; keep them off the heap.
    elements: SmallVec<[Type<'db>; 8]>,
}

impl<'db> UnionBuilder<'db> {
    pub fn new(db: &'db dyn Db) -> Self {
        Self {
            db,
            elements: SmallVec::new(),
        }
    }

    /// Adds a type to this union.
    #[must_use]
    pub fn add(mut self, ty: Type<'db>) -> Self {
        match ty {
            Type::Union(union) => {
                let new_elements = union.elements(self.db);
                self.elements.reserve(new_elements.len());
                for element in new_elements {
                    self = self.add(*element);
                }
            }
            Type::Never => {}
            _ => {
                let duplicate = self.elements.iter().any(|existing| {
                    is_type_same(self.db, *existing, ty, TypeSameOptions::default())
                });
                if !duplicate {
                    self.elements.push(ty);
                }
            }
        }
        self
    }

    pub fn build(self) -> Type<'db> {
        match self.elements.len() {
            0 => Type::Never,
            1 => self.elements[0],
            _ => {
                let includes_recursive_alias = self
                    .elements
                    .iter()
                    .any(|element| element.is_recursive_type_alias(self.db));
                Type::Union(UnionType::new(
                    self.db,
                    self.elements.into_vec().into_boxed_slice(),
                    includes_recursive_alias,
                    None,
                    None,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::setup_db;
    use crate::types::tests::{class, instance_of};

    #[test]
    fn build_union_no_elements() {
        let db = setup_db();
        assert_eq!(UnionBuilder::new(&db).build(), Type::Never);
    }

    #[test]
    fn build_union_single_element() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        assert_eq!(UnionBuilder::new(&db).add(int).build(), int);
    }

    #[test]
    fn never_is_absorbed() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let ty = UnionBuilder::new(&db).add(Type::Never).add(int).build();
        assert_eq!(ty, int);
    }

    #[test]
    fn nested_unions_flatten() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let string = instance_of(&db, class(&db, "str", &[]));
        let none = Type::None;

        let inner = UnionBuilder::new(&db).add(int).add(string).build();
        let outer = UnionBuilder::new(&db).add(none).add(inner).build().expect_union();
        assert_eq!(outer.elements(&db).as_ref(), &[none, int, string]);
    }

    #[test]
    fn duplicates_are_dropped() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let ty = UnionBuilder::new(&db).add(int).add(int).build();
        assert_eq!(ty, int);
    }
}
