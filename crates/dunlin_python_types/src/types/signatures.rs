//! The callable model: ordered parameter lists, overloads, and the bridges
//! between parameter specifications and their `Function`-shaped values.

use bitflags::bitflags;

use crate::types::{ParamSpecAccess, Type, TypeAliasInfo, TypeCondition, TypeVarType};
use crate::{Db, Name};

/// Category of a single parameter, as established by the parser.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParameterCategory {
    /// A positional-only parameter. A nameless entry of this category is
    /// the `/` marker ending the positional-only section.
    Positional,
    /// A positional-or-keyword parameter.
    Simple,
    /// The bare `*` marker: every parameter after it is keyword-only.
    KeywordSeparator,
    /// A `*args`-style variadic positional parameter.
    VariadicPositional,
    /// A `**kwargs`-style variadic keyword parameter.
    VariadicKeyword,
}

/// A single parameter of a signature.
///
/// It is possible for signatures to leave positional-only parameters
/// nameless (e.g. `Callable[[int, str], ...]` annotations).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Parameter<'db> {
    pub category: ParameterCategory,
    pub name: Option<Name>,
    pub annotated_type: Type<'db>,
    pub has_default: bool,
    pub default_type: Option<Type<'db>>,
}

impl<'db> Parameter<'db> {
    pub fn new(category: ParameterCategory, name: Option<Name>, annotated_type: Type<'db>) -> Self {
        Self {
            category,
            name,
            annotated_type,
            has_default: false,
            default_type: None,
        }
    }

    pub fn positional(name: Option<Name>, annotated_type: Type<'db>) -> Self {
        Self::new(ParameterCategory::Positional, name, annotated_type)
    }

    pub fn simple(name: Name, annotated_type: Type<'db>) -> Self {
        Self::new(ParameterCategory::Simple, Some(name), annotated_type)
    }

    pub fn variadic_positional(name: Name, annotated_type: Type<'db>) -> Self {
        Self::new(ParameterCategory::VariadicPositional, Some(name), annotated_type)
    }

    pub fn variadic_keyword(name: Name, annotated_type: Type<'db>) -> Self {
        Self::new(ParameterCategory::VariadicKeyword, Some(name), annotated_type)
    }

    pub fn keyword_separator() -> Self {
        Self::new(ParameterCategory::KeywordSeparator, None, Type::Never)
    }

    /// The `/` marker ending a positional-only parameter section.
    pub fn position_only_separator() -> Self {
        Self::new(ParameterCategory::Positional, None, Type::Never)
    }

    #[must_use]
    pub fn with_default(mut self, default_type: Option<Type<'db>>) -> Self {
        self.has_default = true;
        self.default_type = default_type;
        self
    }

    pub fn is_position_only_separator(&self) -> bool {
        self.category == ParameterCategory::Positional && self.name.is_none()
    }

    pub fn is_keyword_separator(&self) -> bool {
        self.category == ParameterCategory::KeywordSeparator
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct FunctionFlags: u8 {
        /// This function is the solved value of a parameter specification,
        /// not a real callable.
        const PARAM_SPEC_VALUE = 1 << 0;
        /// Skip the `*args`/`**kwargs` compatibility check when matching
        /// this signature (used for gradual callables like `Callable[..., T]`).
        const SKIP_ARGS_KWARGS_CHECK = 1 << 1;
        /// The function is declared `async`.
        const ASYNC = 1 << 2;
    }
}

/// The substituted-types overlay attached to a specialized function. The
/// parallel arrays always match the parameter list in length.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpecializedSignature<'db> {
    pub parameter_types: Box<[Type<'db>]>,
    /// Substituted default-value types; `None` entries mean the parameter
    /// has no default.
    pub parameter_default_types: Option<Box<[Option<Type<'db>>]>>,
    pub return_type: Type<'db>,
}

/// A single callable signature.
#[salsa::interned]
pub struct FunctionType<'db> {
    #[return_ref]
    pub name: Name,

    #[return_ref]
    pub parameters: Box<[Parameter<'db>]>,

    pub declared_return_type: Option<Type<'db>>,

    pub inferred_return_type: Option<Type<'db>>,

    pub flags: FunctionFlags,

    /// A parameter specification bound at the tail of the parameter list
    /// (`Callable[Concatenate[int, P], ...]` and friends).
    pub param_spec: Option<TypeVarType<'db>>,

    #[return_ref]
    pub specialized: Option<SpecializedSignature<'db>>,

    pub type_alias: Option<TypeAliasInfo<'db>>,

    #[return_ref]
    pub conditions: Option<Box<[TypeCondition<'db>]>>,
}

impl<'db> FunctionType<'db> {
    /// A function with only the interesting fields filled in; everything
    /// else empty.
    pub fn simple(
        db: &'db dyn Db,
        name: Name,
        parameters: Box<[Parameter<'db>]>,
        declared_return_type: Option<Type<'db>>,
    ) -> Self {
        Self::new(
            db,
            name,
            parameters,
            declared_return_type,
            None,
            FunctionFlags::empty(),
            None,
            None,
            None,
            None,
        )
    }

    /// The type of parameter `index`, preferring the specialized overlay.
    pub fn effective_parameter_type(self, db: &'db dyn Db, index: usize) -> Type<'db> {
        if let Some(specialized) = self.specialized(db) {
            debug_assert_eq!(
                specialized.parameter_types.len(),
                self.parameters(db).len(),
                "specialized overlay must parallel the parameter list"
            );
            specialized.parameter_types[index]
        } else {
            self.parameters(db)[index].annotated_type
        }
    }

    /// The default-value type of parameter `index`, preferring the
    /// specialized overlay.
    pub fn effective_default_type(self, db: &'db dyn Db, index: usize) -> Option<Type<'db>> {
        if let Some(specialized) = self.specialized(db) {
            if let Some(defaults) = &specialized.parameter_default_types {
                return defaults[index];
            }
        }
        self.parameters(db)[index].default_type
    }

    /// The return type: the specialized overlay if present, else the
    /// declared return type, else the inferred one.
    pub fn effective_return_type(self, db: &'db dyn Db) -> Type<'db> {
        if let Some(specialized) = self.specialized(db) {
            return specialized.return_type;
        }
        self.declared_return_type(db)
            .or(self.inferred_return_type(db))
            .unwrap_or(Type::Unknown)
    }

    #[must_use]
    pub fn with_flags(self, db: &'db dyn Db, flags: FunctionFlags) -> Self {
        if self.flags(db) == flags {
            return self;
        }
        Self::new(
            db,
            self.name(db).clone(),
            self.parameters(db).clone(),
            self.declared_return_type(db),
            self.inferred_return_type(db),
            flags,
            self.param_spec(db),
            self.specialized(db).clone(),
            self.type_alias(db),
            self.conditions(db).clone(),
        )
    }

    #[must_use]
    pub fn with_specialized(
        self,
        db: &'db dyn Db,
        specialized: Option<SpecializedSignature<'db>>,
    ) -> Self {
        Self::new(
            db,
            self.name(db).clone(),
            self.parameters(db).clone(),
            self.declared_return_type(db),
            self.inferred_return_type(db),
            self.flags(db),
            self.param_spec(db),
            specialized,
            self.type_alias(db),
            self.conditions(db).clone(),
        )
    }

    #[must_use]
    pub fn with_parameters(
        self,
        db: &'db dyn Db,
        parameters: Box<[Parameter<'db>]>,
        param_spec: Option<TypeVarType<'db>>,
    ) -> Self {
        Self::new(
            db,
            self.name(db).clone(),
            parameters,
            self.declared_return_type(db),
            self.inferred_return_type(db),
            self.flags(db),
            param_spec,
            // A new parameter list invalidates any parallel overlay.
            None,
            self.type_alias(db),
            self.conditions(db).clone(),
        )
    }

    #[must_use]
    pub fn with_type_alias(self, db: &'db dyn Db, alias: Option<TypeAliasInfo<'db>>) -> Self {
        Self::new(
            db,
            self.name(db).clone(),
            self.parameters(db).clone(),
            self.declared_return_type(db),
            self.inferred_return_type(db),
            self.flags(db),
            self.param_spec(db),
            self.specialized(db).clone(),
            alias,
            self.conditions(db).clone(),
        )
    }

    #[must_use]
    pub fn with_conditions(
        self,
        db: &'db dyn Db,
        conditions: Option<Box<[TypeCondition<'db>]>>,
    ) -> Self {
        Self::new(
            db,
            self.name(db).clone(),
            self.parameters(db).clone(),
            self.declared_return_type(db),
            self.inferred_return_type(db),
            self.flags(db),
            self.param_spec(db),
            self.specialized(db).clone(),
            self.type_alias(db),
            conditions,
        )
    }

    /// Detect the `*args: P.args, **kwargs: P.kwargs` tail. Returns the
    /// index of the `*args` parameter and the parameter specification, when
    /// both sides name the same one.
    pub fn param_spec_variadics_tail(
        self,
        db: &'db dyn Db,
    ) -> Option<(usize, TypeVarType<'db>)> {
        let parameters = self.parameters(db);
        let [.., args, kwargs] = parameters.as_ref() else {
            return None;
        };
        if args.category != ParameterCategory::VariadicPositional
            || kwargs.category != ParameterCategory::VariadicKeyword
        {
            return None;
        }
        let Type::TypeVar(args_spec) = args.annotated_type else {
            return None;
        };
        let Type::TypeVar(kwargs_spec) = kwargs.annotated_type else {
            return None;
        };
        if args_spec.access(db) != Some(ParamSpecAccess::Args)
            || kwargs_spec.access(db) != Some(ParamSpecAccess::Kwargs)
        {
            return None;
        }
        if args_spec.typevar(db) != kwargs_spec.typevar(db) {
            return None;
        }
        Some((parameters.len() - 2, args_spec))
    }
}

/// An ordered sequence of overload signatures.
#[salsa::interned]
pub struct OverloadedFunctionType<'db> {
    #[return_ref]
    pub overloads: Box<[FunctionType<'db>]>,
}

/// Strip a trailing `*args: P.args, **kwargs: P.kwargs` pair from the
/// signature, recording `P` as the function's bound parameter specification
/// instead. Used to normalize signatures before matching. Returns the input
/// unchanged when the tail pattern is absent.
#[must_use]
pub fn remove_param_spec_variadics_from_signature<'db>(
    db: &'db dyn Db,
    function: FunctionType<'db>,
) -> FunctionType<'db> {
    let Some((args_index, args_spec)) = function.param_spec_variadics_tail(db) else {
        return function;
    };
    let parameters: Box<[Parameter<'db>]> = function.parameters(db)[..args_index].into();
    let param_spec = TypeVarType::new(
        db,
        args_spec.typevar(db),
        args_spec.flags(db),
        None,
        false,
        None,
    );
    function.with_parameters(db, parameters, Some(param_spec))
}

/// Bridge a type into a parameter-spec value: the `Function`-shaped record
/// a solved parameter specification stores.
pub fn convert_type_to_param_spec_value<'db>(db: &'db dyn Db, ty: Type<'db>) -> FunctionType<'db> {
    match ty {
        // A free parameter specification: no parameters of its own, the
        // whole value is the spec.
        Type::TypeVar(type_var)
            if type_var.typevar(db).is_param_spec(db) && type_var.access(db).is_none() =>
        {
            FunctionType::new(
                db,
                Name::default(),
                Box::from([]),
                None,
                None,
                FunctionFlags::PARAM_SPEC_VALUE,
                Some(type_var),
                None,
                None,
                None,
            )
        }
        Type::Function(function) => {
            function.with_flags(db, function.flags(db) | FunctionFlags::PARAM_SPEC_VALUE)
        }
        // Anything else degrades to the gradual parameter list
        // `(*args: Unknown, **kwargs: Unknown)`.
        _ => FunctionType::new(
            db,
            Name::default(),
            Box::from([
                Parameter::variadic_positional(Name::new_static("args"), Type::Unknown),
                Parameter::variadic_keyword(Name::new_static("kwargs"), Type::Unknown),
            ]),
            None,
            None,
            FunctionFlags::PARAM_SPEC_VALUE | FunctionFlags::SKIP_ARGS_KWARGS_CHECK,
            None,
            None,
            None,
            None,
        ),
    }
}

/// The inverse bridge: re-express a parameter-spec value as a type. A value
/// with no parameters of its own (a single nameless positional separator
/// counts as none) and a bound spec collapses back to the spec itself.
pub fn convert_param_spec_value_to_type<'db>(
    db: &'db dyn Db,
    function: FunctionType<'db>,
) -> Type<'db> {
    let parameters = function.parameters(db);
    let effective: &[Parameter<'db>] =
        if parameters.len() == 1 && parameters[0].is_position_only_separator() {
            &[]
        } else {
            parameters
        };
    if effective.is_empty() {
        if let Some(param_spec) = function.param_spec(db) {
            return Type::TypeVar(param_spec);
        }
    }
    Type::Function(function.with_flags(db, function.flags(db) | FunctionFlags::PARAM_SPEC_VALUE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::setup_db;
    use crate::types::tests::{class, instance_of};
    use crate::types::{
        is_type_same, ParamSpecAccess, TypeFlags, TypeSameOptions, TypeVarInstance, TypeVarKind,
        TypeVarScopeId, TypeVarVariance,
    };

    fn param_spec<'db>(db: &'db crate::db::tests::TestDb, name: &str) -> TypeVarType<'db> {
        TypeVarType::of(
            db,
            TypeVarInstance::new(
                db,
                Name::new(name),
                Some(TypeVarScopeId(7)),
                TypeVarKind::ParamSpec,
                TypeVarVariance::Invariant,
                None,
                None,
                None,
                false,
            ),
        )
    }

    fn access<'db>(
        db: &'db crate::db::tests::TestDb,
        spec: TypeVarType<'db>,
        access: ParamSpecAccess,
    ) -> Type<'db> {
        Type::TypeVar(TypeVarType::new(
            db,
            spec.typevar(db),
            TypeFlags::INSTANCE,
            Some(access),
            false,
            None,
        ))
    }

    #[test]
    fn param_spec_round_trip() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let string = instance_of(&db, class(&db, "str", &[]));
        let f = FunctionType::simple(
            &db,
            Name::new_static("f"),
            Box::from([
                Parameter::simple(Name::new_static("x"), int),
                Parameter::simple(Name::new_static("y"), string),
            ]),
            Some(int),
        );

        let round_tripped = convert_param_spec_value_to_type(&db, convert_type_to_param_spec_value(&db, Type::Function(f)));
        assert!(is_type_same(
            &db,
            Type::Function(f),
            round_tripped,
            TypeSameOptions::default()
        ));
    }

    #[test]
    fn free_param_spec_round_trips_to_itself() {
        let db = setup_db();
        let p = param_spec(&db, "P");
        let value = convert_type_to_param_spec_value(&db, Type::TypeVar(p));
        assert!(value.parameters(&db).is_empty());
        assert_eq!(convert_param_spec_value_to_type(&db, value), Type::TypeVar(p));
    }

    #[test]
    fn nameless_positional_separator_means_no_parameters() {
        let db = setup_db();
        let p = param_spec(&db, "P");
        let value = FunctionType::new(
            &db,
            Name::default(),
            Box::from([Parameter::position_only_separator()]),
            None,
            None,
            FunctionFlags::PARAM_SPEC_VALUE,
            Some(p),
            None,
            None,
            None,
        );
        assert_eq!(convert_param_spec_value_to_type(&db, value), Type::TypeVar(p));
    }

    #[test]
    fn strips_param_spec_variadics_tail() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let p = param_spec(&db, "P");
        let f = FunctionType::simple(
            &db,
            Name::new_static("f"),
            Box::from([
                Parameter::simple(Name::new_static("x"), int),
                Parameter::variadic_positional(
                    Name::new_static("args"),
                    access(&db, p, ParamSpecAccess::Args),
                ),
                Parameter::variadic_keyword(
                    Name::new_static("kwargs"),
                    access(&db, p, ParamSpecAccess::Kwargs),
                ),
            ]),
            Some(int),
        );

        let stripped = remove_param_spec_variadics_from_signature(&db, f);
        assert_eq!(stripped.parameters(&db).len(), 1);
        assert_eq!(
            stripped.param_spec(&db).map(|spec| spec.typevar(&db)),
            Some(p.typevar(&db))
        );
    }

    #[test]
    fn mismatched_tail_is_left_alone() {
        let db = setup_db();
        let p = param_spec(&db, "P");
        let q = param_spec(&db, "Q");
        let f = FunctionType::simple(
            &db,
            Name::new_static("f"),
            Box::from([
                Parameter::variadic_positional(
                    Name::new_static("args"),
                    access(&db, p, ParamSpecAccess::Args),
                ),
                Parameter::variadic_keyword(
                    Name::new_static("kwargs"),
                    access(&db, q, ParamSpecAccess::Kwargs),
                ),
            ]),
            None,
        );
        assert_eq!(remove_param_spec_variadics_from_signature(&db, f), f);
    }

    #[test]
    fn effective_types_prefer_the_overlay() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let string = instance_of(&db, class(&db, "str", &[]));
        let f = FunctionType::simple(
            &db,
            Name::new_static("f"),
            Box::from([Parameter::simple(Name::new_static("x"), Type::Unknown)]),
            Some(Type::Unknown),
        );
        assert_eq!(f.effective_parameter_type(&db, 0), Type::Unknown);

        let specialized = f.with_specialized(
            &db,
            Some(SpecializedSignature {
                parameter_types: Box::from([int]),
                parameter_default_types: None,
                return_type: string,
            }),
        );
        assert_eq!(specialized.effective_parameter_type(&db, 0), int);
        assert_eq!(specialized.effective_return_type(&db), string);
    }
}
