//! A total order over types, used to produce deterministic output
//! (canonical union ordering, stable diagnostics, test stability).
//!
//! ## Why not just implement `Ord` on `Type`?
//!
//! The ordering is not user-facing and it doesn't really "make sense" for
//! `Type` to be `Ord` in terms of the semantics: there are many plausible
//! ways to sort types and this is only one, somewhat arbitrary at times.

use std::cmp::Ordering;

use crate::types::{Type, MAX_TYPE_RECURSION};
use crate::Db;

/// Sort `types` into the canonical order.
pub fn sort_types<'db>(db: &'db dyn Db, types: &mut [Type<'db>]) {
    types.sort_by(|left, right| compare_types(db, *left, *right, 0));
}

/// Rank of the type's category; categories sort descending.
fn category_rank(ty: Type<'_>) -> u8 {
    match ty {
        Type::Unbound => 0,
        Type::Unknown => 1,
        Type::Any => 2,
        Type::None => 3,
        Type::Never => 4,
        Type::Function(_) => 5,
        Type::Overloaded(_) => 6,
        Type::Class(_) => 7,
        Type::Module(_) => 8,
        Type::Union(_) => 9,
        Type::TypeVar(_) => 10,
    }
}

pub(crate) fn compare_types<'db>(
    db: &'db dyn Db,
    left: Type<'db>,
    right: Type<'db>,
    depth: u32,
) -> Ordering {
    if left == right || depth > MAX_TYPE_RECURSION {
        return Ordering::Equal;
    }
    let depth = depth + 1;

    let left_rank = category_rank(left);
    let right_rank = category_rank(right);
    if left_rank != right_rank {
        return right_rank.cmp(&left_rank);
    }

    match (left, right) {
        (Type::Class(left), Type::Class(right)) => {
            // Instances precede instantiables.
            let instance_order = right.is_instance(db).cmp(&left.is_instance(db));
            if instance_order != Ordering::Equal {
                return instance_order;
            }
            // Literals precede non-literals, and order among themselves by
            // value.
            match (left.literal(db), right.literal(db)) {
                (Some(left_literal), Some(right_literal)) => {
                    let literal_order = left_literal.cmp(right_literal);
                    if literal_order != Ordering::Equal {
                        return literal_order;
                    }
                }
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => {}
            }
            // Non-generics precede generics.
            let generic_order = left
                .class(db)
                .is_generic(db)
                .cmp(&right.class(db).is_generic(db));
            if generic_order != Ordering::Equal {
                return generic_order;
            }
            // Then by qualified name.
            let module_order = left.class(db).module(db).cmp(right.class(db).module(db));
            if module_order != Ordering::Equal {
                return module_order;
            }
            let name_order = left.name(db).cmp(right.name(db));
            if name_order != Ordering::Equal {
                return name_order;
            }
            // Same class; compare applied arguments element-wise.
            let left_args = left.type_args(db).as_deref().unwrap_or_default();
            let right_args = right.type_args(db).as_deref().unwrap_or_default();
            let len_order = left_args.len().cmp(&right_args.len());
            if len_order != Ordering::Equal {
                return len_order;
            }
            for (left_arg, right_arg) in left_args.iter().zip(right_args.iter()) {
                let arg_order = compare_types(db, *left_arg, *right_arg, depth);
                if arg_order != Ordering::Equal {
                    return arg_order;
                }
            }
            Ordering::Equal
        }
        (Type::Function(left), Type::Function(right)) => {
            compare_functions(db, left, right, depth)
        }
        (Type::Overloaded(left), Type::Overloaded(right)) => {
            let left_overloads = left.overloads(db);
            let right_overloads = right.overloads(db);
            // Longer overload sets first, then element-wise.
            let len_order = right_overloads.len().cmp(&left_overloads.len());
            if len_order != Ordering::Equal {
                return len_order;
            }
            for (left_overload, right_overload) in
                left_overloads.iter().zip(right_overloads.iter())
            {
                let overload_order = compare_functions(db, *left_overload, *right_overload, depth);
                if overload_order != Ordering::Equal {
                    return overload_order;
                }
            }
            Ordering::Equal
        }
        (Type::Module(left), Type::Module(right)) => left.name(db).cmp(right.name(db)),
        (Type::TypeVar(left), Type::TypeVar(right)) => {
            let name_order = left.typevar(db).name(db).cmp(right.typevar(db).name(db));
            if name_order != Ordering::Equal {
                return name_order;
            }
            left.typevar(db)
                .scope_id(db)
                .cmp(&right.typevar(db).scope_id(db))
        }
        (Type::Union(left), Type::Union(right)) => {
            let left_elements = left.elements(db);
            let right_elements = right.elements(db);
            let len_order = left_elements.len().cmp(&right_elements.len());
            if len_order != Ordering::Equal {
                return len_order;
            }
            for (left_element, right_element) in left_elements.iter().zip(right_elements.iter()) {
                let element_order = compare_types(db, *left_element, *right_element, depth);
                if element_order != Ordering::Equal {
                    return element_order;
                }
            }
            Ordering::Equal
        }
        // Equal-rank atoms are identical and were handled up front.
        _ => Ordering::Equal,
    }
}

fn compare_functions<'db>(
    db: &'db dyn Db,
    left: crate::types::FunctionType<'db>,
    right: crate::types::FunctionType<'db>,
    depth: u32,
) -> Ordering {
    let left_params = left.parameters(db);
    let right_params = right.parameters(db);
    // Longer signatures first.
    let len_order = right_params.len().cmp(&left_params.len());
    if len_order != Ordering::Equal {
        return len_order;
    }
    for index in 0..left_params.len() {
        let param_order = compare_types(
            db,
            left.effective_parameter_type(db, index),
            right.effective_parameter_type(db, index),
            depth,
        );
        if param_order != Ordering::Equal {
            return param_order;
        }
    }
    let return_order = compare_types(
        db,
        left.effective_return_type(db),
        right.effective_return_type(db),
        depth,
    );
    if return_order != Ordering::Equal {
        return return_order;
    }
    left.name(db).cmp(right.name(db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::setup_db;
    use crate::types::tests::{class, instance_of, typevar};
    use crate::types::{ClassType, LiteralValue};

    #[test]
    fn categories_sort_descending() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let t = Type::TypeVar(typevar(&db, "T", 1));

        let mut types = [Type::Unknown, int, t, Type::Never];
        sort_types(&db, &mut types);
        assert_eq!(types, [t, int, Type::Never, Type::Unknown]);
    }

    #[test]
    fn instances_precede_instantiables_and_literals_lead() {
        let db = setup_db();
        let int_class = class(&db, "int", &[]);
        let instance = instance_of(&db, int_class);
        let instantiable = instance.to_instantiable(&db);
        let literal = Type::Class(
            ClassType::instance(&db, int_class).with_literal(&db, Some(LiteralValue::Int(3))),
        );

        let mut types = [instantiable, instance, literal];
        sort_types(&db, &mut types);
        assert_eq!(types, [literal, instance, instantiable]);
    }

    #[test]
    fn classes_order_by_name() {
        let db = setup_db();
        let a = instance_of(&db, class(&db, "Apple", &[]));
        let b = instance_of(&db, class(&db, "Banana", &[]));
        let mut types = [b, a];
        sort_types(&db, &mut types);
        assert_eq!(types, [a, b]);
    }

    #[test]
    fn sorting_is_idempotent() {
        let db = setup_db();
        let a = instance_of(&db, class(&db, "A", &[]));
        let b = instance_of(&db, class(&db, "B", &[]));
        let t = Type::TypeVar(typevar(&db, "T", 1));

        let mut once = [b, Type::Any, t, a];
        sort_types(&db, &mut once);
        let mut twice = once;
        sort_types(&db, &mut twice);
        assert_eq!(once, twice);
    }
}
