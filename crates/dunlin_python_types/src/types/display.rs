//! Display implementations for types.

use std::fmt::{self, Display, Formatter};

use crate::types::{
    LiteralValue, Parameter, ParameterCategory, ParamSpecAccess, Type,
};
use crate::Db;

impl<'db> Type<'db> {
    pub fn display(self, db: &'db dyn Db) -> DisplayType<'db> {
        DisplayType { ty: self, db }
    }
}

pub struct DisplayType<'db> {
    ty: Type<'db>,
    db: &'db dyn Db,
}

impl Display for DisplayType<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut visited = Vec::new();
        write_type(self.db, self.ty, f, &mut visited)
    }
}

fn write_type<'db>(
    db: &'db dyn Db,
    ty: Type<'db>,
    f: &mut Formatter<'_>,
    visited: &mut Vec<Type<'db>>,
) -> fmt::Result {
    if visited.contains(&ty) {
        return f.write_str("...");
    }
    visited.push(ty);
    let result = write_type_inner(db, ty, f, visited);
    let removed = visited.pop();
    debug_assert_eq!(removed, Some(ty));
    result
}

fn write_type_inner<'db>(
    db: &'db dyn Db,
    ty: Type<'db>,
    f: &mut Formatter<'_>,
    visited: &mut Vec<Type<'db>>,
) -> fmt::Result {
    match ty {
        Type::Unbound => f.write_str("Unbound"),
        Type::Unknown => f.write_str("Unknown"),
        Type::Any => f.write_str("Any"),
        Type::None => f.write_str("None"),
        Type::Never => f.write_str("Never"),
        Type::Module(module) => write!(f, "<module '{}'>", module.name(db)),
        Type::TypeVar(type_var) => {
            f.write_str(type_var.typevar(db).name(db))?;
            match type_var.access(db) {
                Some(ParamSpecAccess::Args) => f.write_str(".args"),
                Some(ParamSpecAccess::Kwargs) => f.write_str(".kwargs"),
                None => Ok(()),
            }
        }
        Type::Union(union) => {
            for (index, element) in union.elements(db).iter().enumerate() {
                if index > 0 {
                    f.write_str(" | ")?;
                }
                write_type(db, *element, f, visited)?;
            }
            Ok(())
        }
        Type::Class(class_type) => {
            if let Some(literal) = class_type.literal(db) {
                f.write_str("Literal[")?;
                write_literal(literal, f)?;
                return f.write_str("]");
            }

            let instance = class_type.is_instance(db);
            if !instance {
                f.write_str("type[")?;
            }

            // The structural tuple view is more precise than the flattened
            // type-argument slot.
            if let Some(entries) = class_type.tuple_type_args(db) {
                f.write_str(class_type.name(db))?;
                f.write_str("[")?;
                for (index, entry) in entries.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write_type(db, entry.ty, f, visited)?;
                    if entry.is_unbounded {
                        f.write_str(", ...")?;
                    }
                }
                f.write_str("]")?;
            } else {
                f.write_str(class_type.name(db))?;
                if let Some(type_args) = class_type.type_args(db) {
                    f.write_str("[")?;
                    for (index, arg) in type_args.iter().enumerate() {
                        if index > 0 {
                            f.write_str(", ")?;
                        }
                        write_type(db, *arg, f, visited)?;
                    }
                    f.write_str("]")?;
                }
            }

            if !instance {
                f.write_str("]")?;
            }
            Ok(())
        }
        Type::Function(function) => {
            f.write_str("(")?;
            let parameters = function.parameters(db);
            for (index, parameter) in parameters.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write_parameter(db, function, parameter, index, f, visited)?;
            }
            f.write_str(") -> ")?;
            write_type(db, function.effective_return_type(db), f, visited)
        }
        Type::Overloaded(overloaded) => {
            f.write_str("Overload[")?;
            for (index, overload) in overloaded.overloads(db).iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write_type(db, Type::Function(*overload), f, visited)?;
            }
            f.write_str("]")
        }
    }
}

fn write_parameter<'db>(
    db: &'db dyn Db,
    function: crate::types::FunctionType<'db>,
    parameter: &Parameter<'db>,
    index: usize,
    f: &mut Formatter<'_>,
    visited: &mut Vec<Type<'db>>,
) -> fmt::Result {
    match parameter.category {
        ParameterCategory::KeywordSeparator => return f.write_str("*"),
        ParameterCategory::Positional if parameter.name.is_none() => return f.write_str("/"),
        ParameterCategory::VariadicPositional => f.write_str("*")?,
        ParameterCategory::VariadicKeyword => f.write_str("**")?,
        ParameterCategory::Positional | ParameterCategory::Simple => {}
    }
    if let Some(name) = &parameter.name {
        f.write_str(name)?;
        f.write_str(": ")?;
    }
    write_type(db, function.effective_parameter_type(db, index), f, visited)?;
    if parameter.has_default {
        f.write_str(" = ...")?;
    }
    Ok(())
}

fn write_literal(literal: &LiteralValue, f: &mut Formatter<'_>) -> fmt::Result {
    match literal {
        LiteralValue::Bool(true) => f.write_str("True"),
        LiteralValue::Bool(false) => f.write_str("False"),
        LiteralValue::Int(value) => write!(f, "{value}"),
        LiteralValue::Str(value) => write!(f, "'{value}'"),
        LiteralValue::Bytes(value) => {
            f.write_str("b'")?;
            for byte in value.iter() {
                if byte.is_ascii_graphic() {
                    write!(f, "{}", *byte as char)?;
                } else {
                    write!(f, "\\x{byte:02x}")?;
                }
            }
            f.write_str("'")
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::db::tests::setup_db;
    use crate::types::property_tests::Ty;
    use crate::types::tests::{class, generic_class, instance_of, typevar};
    use crate::types::{ClassType, FunctionType, UnionType};
    use crate::Name;

    #[test_case(Ty::Any, "Any")]
    #[test_case(Ty::Unknown, "Unknown")]
    #[test_case(Ty::Unbound, "Unbound")]
    #[test_case(Ty::None, "None")]
    #[test_case(Ty::Never, "Never")]
    fn atoms_display_by_name(ty: Ty, expected: &str) {
        let db = setup_db();
        assert_eq!(ty.into_type(&db).display(&db).to_string(), expected);
    }

    #[test]
    fn classes_display_with_arguments() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let t = typevar(&db, "T", 1);
        let list = generic_class(&db, "list", &[t], &[]);
        let list_int = Type::Class(
            ClassType::instance(&db, list).with_type_args(&db, Some(Box::from([int]))),
        );
        assert_eq!(list_int.display(&db).to_string(), "list[int]");
        assert_eq!(
            list_int.to_instantiable(&db).display(&db).to_string(),
            "type[list[int]]"
        );
    }

    #[test]
    fn unions_display_with_pipes() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let string = instance_of(&db, class(&db, "str", &[]));
        let union = UnionType::from_elements(&db, [int, string, Type::None]);
        assert_eq!(union.display(&db).to_string(), "int | str | None");
    }

    #[test]
    fn functions_display_signatures() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let f = FunctionType::simple(
            &db,
            Name::new_static("f"),
            Box::from([
                Parameter::simple(Name::new_static("x"), int),
                Parameter::keyword_separator(),
                Parameter::simple(Name::new_static("y"), int),
            ]),
            Some(int),
        );
        assert_eq!(
            Type::Function(f).display(&db).to_string(),
            "(x: int, *, y: int) -> int"
        );
    }
}
