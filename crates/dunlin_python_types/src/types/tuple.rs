//! Tuple specialization and fusion utilities.

use crate::types::{ClassType, TupleTypeArgument, Type, UnionType};
use crate::Db;

/// Specialize a tuple class with structural element types. The result
/// carries both views of the elements: the ordered `tuple_type_args` and
/// the flattened union in the (single) ordinary type-argument slot.
///
/// An unpacked variadic type variable among the entries is represented as
/// an in-union variadic marker in the flattened view, so that substituting
/// it later unpacks back into the union.
pub fn specialize_tuple_class<'db>(
    db: &'db dyn Db,
    class_type: ClassType<'db>,
    entries: Box<[TupleTypeArgument<'db>]>,
) -> ClassType<'db> {
    let union_view = UnionType::from_elements(
        db,
        entries.iter().map(|entry| match entry.ty {
            Type::TypeVar(type_var) if type_var.typevar(db).is_variadic(db) => {
                Type::TypeVar(type_var.with_variadic_in_union(db, true))
            }
            ty => ty,
        }),
    );
    class_type.with_tuple_type_args(db, Some(Box::from([union_view])), entries)
}

/// If `ty` is a union consisting solely of fixed-length tuples of one
/// arity, fuse them into a single tuple whose `i`-th element is the union
/// of the `i`-th elements. Anything else passes through unchanged.
pub fn combine_same_sized_tuples<'db>(db: &'db dyn Db, ty: Type<'db>) -> Type<'db> {
    let Type::Union(union) = ty else {
        return ty;
    };

    let mut arity: Option<usize> = None;
    let mut template: Option<ClassType<'db>> = None;
    let mut tuples: Vec<&[TupleTypeArgument<'db>]> = Vec::new();
    for element in union.elements(db).iter() {
        let Type::Class(class_type) = element else {
            return ty;
        };
        if !class_type.class(db).is_tuple(db) {
            return ty;
        }
        let Some(entries) = class_type.tuple_type_args(db) else {
            return ty;
        };
        let fixed_length = entries.iter().all(|entry| {
            !entry.is_unbounded
                && !matches!(entry.ty, Type::TypeVar(type_var)
                    if type_var.typevar(db).is_variadic(db))
        });
        if !fixed_length {
            return ty;
        }
        match arity {
            None => arity = Some(entries.len()),
            Some(expected) if expected == entries.len() => {}
            Some(_) => return ty,
        }
        template.get_or_insert(*class_type);
        tuples.push(entries);
    }

    let (Some(arity), Some(template)) = (arity, template) else {
        return ty;
    };

    let combined: Box<[TupleTypeArgument<'db>]> = (0..arity)
        .map(|index| {
            TupleTypeArgument::new(UnionType::from_elements(
                db,
                tuples.iter().map(|entries| entries[index].ty),
            ))
        })
        .collect();
    Type::Class(specialize_tuple_class(db, template, combined))
}
