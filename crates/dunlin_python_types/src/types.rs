//! The type representation and the pure queries over it.
//!
//! `Type` is a small `Copy` enum; everything structured behind it is a
//! salsa-interned payload, so type values compare and hash by identity and
//! structurally equal types are deduplicated globally. All operations take a
//! `db: &dyn Db` and never mutate existing values: "modifying" a type means
//! interning a clone with different fields.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::{Db, Name};

pub use self::builder::UnionBuilder;
pub use self::class::{Class, ClassFlags, ClassType, KnownClass, LiteralValue, TupleTypeArgument};
pub use self::display::DisplayType;
pub use self::generics::{SignatureContext, TypeVarContext, TypeVarMapEntry};
pub use self::member::{lookup_class_member, ClassMember, MemberLookupFlags};
pub use self::mro::{Mro, MroError, MroIterator};
pub use self::signatures::{
    convert_param_spec_value_to_type, convert_type_to_param_spec_value,
    remove_param_spec_variadics_from_signature, FunctionFlags, FunctionType,
    OverloadedFunctionType, Parameter, ParameterCategory, SpecializedSignature,
};
pub use self::specialize::{
    apply_solved_type_vars, build_type_var_context_from_class, partially_specialize_type,
    requires_specialization, ApplyTypeVarOptions, RequiresSpecializationOptions,
};

mod builder;
mod class;
mod class_base;
mod display;
mod generics;
mod member;
mod mro;
mod signatures;
mod specialize;
mod tuple;
mod type_ordering;

pub use self::class_base::ClassBase;
pub use self::generics::is_variance_of_type_argument_compatible;
pub use self::member::class_fields_recursive;
pub use self::tuple::{combine_same_sized_tuples, specialize_tuple_class};
pub use self::type_ordering::sort_types;

/// Maximum recursion depth for any single algebra operation. Hitting the
/// bound returns the input unchanged, which is conservatively correct.
pub(crate) const MAX_TYPE_RECURSION: u32 = 64;

bitflags! {
    /// Whether a type denotes a set of runtime values, something that can be
    /// instantiated, or (for the untyped atoms) both at once.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        const INSTANCE = 1 << 0;
        const INSTANTIABLE = 1 << 1;
    }
}

/// A type in the algebra.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type<'db> {
    /// Name is not bound to any value; a binding error the checker reports.
    Unbound,
    /// A type the checker could not determine; like `Any`, but distinguishes
    /// "the user widened this" from "we don't know".
    Unknown,
    /// The dynamic type.
    Any,
    /// The `None` singleton.
    None,
    /// The empty set of values.
    Never,
    /// A class object or an instance of a class, depending on its flags.
    Class(ClassType<'db>),
    /// A single callable signature.
    Function(FunctionType<'db>),
    /// An ordered sequence of overload signatures.
    Overloaded(OverloadedFunctionType<'db>),
    /// A module object.
    Module(ModuleType<'db>),
    /// The set of values in any of the contained types.
    Union(UnionType<'db>),
    /// A reference to a type variable.
    TypeVar(TypeVarType<'db>),
}

// Interned handles keep `Type` two words; the algebra copies these around
// constantly.
static_assertions::const_assert!(std::mem::size_of::<Type<'static>>() <= 16);

impl<'db> Type<'db> {
    pub const fn is_unbound(&self) -> bool {
        matches!(self, Type::Unbound)
    }

    pub const fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub const fn is_never(&self) -> bool {
        matches!(self, Type::Never)
    }

    pub const fn is_any_or_unknown(&self) -> bool {
        matches!(self, Type::Any | Type::Unknown)
    }

    pub const fn into_class_type(self) -> Option<ClassType<'db>> {
        match self {
            Type::Class(class_type) => Some(class_type),
            _ => None,
        }
    }

    #[track_caller]
    pub fn expect_class(self) -> ClassType<'db> {
        self.into_class_type()
            .expect("Expected a Type::Class variant")
    }

    pub const fn into_function_type(self) -> Option<FunctionType<'db>> {
        match self {
            Type::Function(function_type) => Some(function_type),
            _ => None,
        }
    }

    #[track_caller]
    pub fn expect_function(self) -> FunctionType<'db> {
        self.into_function_type()
            .expect("Expected a Type::Function variant")
    }

    pub const fn into_union_type(self) -> Option<UnionType<'db>> {
        match self {
            Type::Union(union_type) => Some(union_type),
            _ => None,
        }
    }

    #[track_caller]
    pub fn expect_union(self) -> UnionType<'db> {
        self.into_union_type()
            .expect("Expected a Type::Union variant")
    }

    pub const fn into_type_var(self) -> Option<TypeVarType<'db>> {
        match self {
            Type::TypeVar(type_var) => Some(type_var),
            _ => None,
        }
    }

    /// The instance/instantiable flags of this type. The untyped atoms carry
    /// both bits at once.
    pub fn flags(self, db: &'db dyn Db) -> TypeFlags {
        match self {
            Type::Unbound | Type::Unknown | Type::Any | Type::None | Type::Never => {
                TypeFlags::INSTANCE | TypeFlags::INSTANTIABLE
            }
            Type::Class(class_type) => class_type.flags(db),
            Type::TypeVar(type_var) => type_var.flags(db),
            Type::Function(_) | Type::Overloaded(_) | Type::Module(_) => TypeFlags::INSTANCE,
            Type::Union(union) => union
                .elements(db)
                .iter()
                .fold(TypeFlags::all(), |flags, element| {
                    flags & element.flags(db)
                }),
        }
    }

    pub fn is_instance(self, db: &'db dyn Db) -> bool {
        self.flags(db).contains(TypeFlags::INSTANCE)
    }

    pub fn is_instantiable(self, db: &'db dyn Db) -> bool {
        self.flags(db).contains(TypeFlags::INSTANTIABLE)
    }

    /// Project this type onto its instance form: `type[C]` becomes `C`.
    /// Projections re-intern, so repeated calls are cheap and the result is
    /// shared.
    #[must_use]
    pub fn to_instance(self, db: &'db dyn Db) -> Type<'db> {
        match self {
            Type::Class(class_type) => Type::Class(class_type.with_flags(db, TypeFlags::INSTANCE)),
            Type::TypeVar(type_var) => Type::TypeVar(type_var.with_flags(db, TypeFlags::INSTANCE)),
            Type::Union(union) => union.map(db, |element| element.to_instance(db)),
            _ => self,
        }
    }

    /// Project this type onto its instantiable form: `C` becomes `type[C]`.
    #[must_use]
    pub fn to_instantiable(self, db: &'db dyn Db) -> Type<'db> {
        match self {
            Type::Class(class_type) => {
                Type::Class(class_type.with_flags(db, TypeFlags::INSTANTIABLE))
            }
            Type::TypeVar(type_var) => {
                Type::TypeVar(type_var.with_flags(db, TypeFlags::INSTANTIABLE))
            }
            Type::Union(union) => union.map(db, |element| element.to_instantiable(db)),
            _ => self,
        }
    }

    /// The alias metadata attached to this type, if it was produced by
    /// expanding a type alias.
    pub fn type_alias_info(self, db: &'db dyn Db) -> Option<TypeAliasInfo<'db>> {
        match self {
            Type::Class(class_type) => class_type.type_alias(db),
            Type::Function(function) => function.type_alias(db),
            Type::Union(union) => union.type_alias(db),
            Type::TypeVar(type_var) => type_var.type_alias(db),
            _ => None,
        }
    }

    /// Re-attach alias metadata to this type, where the representation
    /// supports it. Atoms silently drop the alias.
    #[must_use]
    pub fn with_type_alias(self, db: &'db dyn Db, alias: TypeAliasInfo<'db>) -> Type<'db> {
        match self {
            Type::Class(class_type) => Type::Class(class_type.with_type_alias(db, Some(alias))),
            Type::Function(function) => Type::Function(function.with_type_alias(db, Some(alias))),
            Type::Union(union) => Type::Union(union.with_type_alias(db, Some(alias))),
            Type::TypeVar(type_var) => Type::TypeVar(type_var.with_type_alias(db, Some(alias))),
            _ => self,
        }
    }

    /// The narrowing conditions attached to this type, if any.
    pub fn condition(self, db: &'db dyn Db) -> Option<&'db [TypeCondition<'db>]> {
        match self {
            Type::Class(class_type) => class_type.conditions(db).as_deref(),
            Type::Function(function) => function.conditions(db).as_deref(),
            Type::Union(union) => union.conditions(db).as_deref(),
            _ => None,
        }
    }

    /// Return `true` if this type is a placeholder for a recursive type
    /// alias that is still being (or has been) resolved.
    pub fn is_recursive_type_alias(self, db: &'db dyn Db) -> bool {
        matches!(self, Type::TypeVar(type_var)
            if type_var.typevar(db).recursive_alias_name(db).is_some())
    }
}

/// Combine the dynamic-ness of two types: `Unknown` means "the checker could
/// not produce a type" and must survive combination with the user-declared
/// `Any`.
pub fn preserve_unknown<'db>(left: Type<'db>, right: Type<'db>) -> Type<'db> {
    if left.is_unknown() || right.is_unknown() {
        Type::Unknown
    } else {
        Type::Any
    }
}

/// Return `true` if a union may be formed from `subtypes` in a type
/// annotation position: every subtype must contribute the instantiable bit
/// and the combination must not be instance-only.
pub fn is_unionable_type<'db>(db: &'db dyn Db, subtypes: &[Type<'db>]) -> bool {
    let combined = subtypes
        .iter()
        .fold(TypeFlags::all(), |flags, subtype| flags & subtype.flags(db));
    combined.contains(TypeFlags::INSTANTIABLE) && !combined.contains(TypeFlags::INSTANCE)
}

/// Return `true` if `ty` is (or contains, for unions) a literal type.
pub fn contains_literal_type<'db>(db: &'db dyn Db, ty: Type<'db>) -> bool {
    match ty {
        Type::Class(class_type) => class_type.literal(db).is_some(),
        Type::Union(union) => union
            .elements(db)
            .iter()
            .any(|element| contains_literal_type(db, *element)),
        _ => false,
    }
}

/// Apply `transform` to every subtype of a union (or to `ty` itself for any
/// other type). Subtypes for which the transform returns `None` are dropped;
/// if everything is dropped the result folds to `Never`. The union's
/// conditions are distributed onto each kept subtype and its alias metadata
/// is preserved on the result.
pub fn map_subtypes<'db>(
    db: &'db dyn Db,
    ty: Type<'db>,
    mut transform: impl FnMut(Type<'db>) -> Option<Type<'db>>,
) -> Type<'db> {
    let Type::Union(union) = ty else {
        return transform(ty).unwrap_or(Type::Never);
    };

    let conditions = union.conditions(db).clone();
    let mut builder = UnionBuilder::new(db);
    let mut changed = false;
    for element in union.elements(db) {
        match transform(*element) {
            Some(mapped) => {
                let mapped = match &conditions {
                    Some(conditions) => add_condition_to_type(db, mapped, conditions),
                    None => mapped,
                };
                changed |= mapped != *element;
                builder = builder.add(mapped);
            }
            None => changed = true,
        }
    }

    if !changed {
        return ty;
    }

    let mapped = builder.build();
    match union.type_alias(db) {
        Some(alias) => mapped.with_type_alias(db, alias),
        None => mapped,
    }
}

/// Attach narrowing conditions to a type, distributing over unions and
/// overloads. The atoms, modules and type variables are non-conditionable
/// and pass through unchanged.
#[must_use]
pub fn add_condition_to_type<'db>(
    db: &'db dyn Db,
    ty: Type<'db>,
    conditions: &[TypeCondition<'db>],
) -> Type<'db> {
    if conditions.is_empty() {
        return ty;
    }
    match ty {
        Type::Unbound
        | Type::Unknown
        | Type::Any
        | Type::None
        | Type::Never
        | Type::Module(_)
        | Type::TypeVar(_) => ty,
        Type::Class(class_type) => Type::Class(class_type.with_conditions(
            db,
            merge_conditions(class_type.conditions(db).as_deref(), conditions),
        )),
        Type::Function(function) => Type::Function(function.with_conditions(
            db,
            merge_conditions(function.conditions(db).as_deref(), conditions),
        )),
        Type::Overloaded(overloaded) => {
            let overloads = overloaded
                .overloads(db)
                .iter()
                .map(|overload| {
                    overload.with_conditions(
                        db,
                        merge_conditions(overload.conditions(db).as_deref(), conditions),
                    )
                })
                .collect::<Box<[_]>>();
            Type::Overloaded(OverloadedFunctionType::new(db, overloads))
        }
        Type::Union(_) => map_subtypes(db, ty, |element| {
            Some(add_condition_to_type(db, element, conditions))
        }),
    }
}

/// Merge two condition sets as a logical AND, deduplicating clauses while
/// preserving first-occurrence order.
pub(crate) fn merge_conditions<'db>(
    existing: Option<&[TypeCondition<'db>]>,
    additional: &[TypeCondition<'db>],
) -> Option<Box<[TypeCondition<'db>]>> {
    // Condition sets rarely grow past a clause or two.
    let mut merged: SmallVec<[TypeCondition<'db>; 2]> =
        SmallVec::from(existing.unwrap_or_default());
    for condition in additional {
        if !merged.contains(condition) {
            merged.push(condition.clone());
        }
    }
    if merged.is_empty() {
        None
    } else {
        Some(merged.into_vec().into_boxed_slice())
    }
}

/// A narrowing predicate attached to a type: the type is only inhabited when
/// the given (constrained) type variable is solved to its
/// `constraint_index`-th constraint. A condition set is the AND of its
/// clauses and is carried through substitution untouched.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeCondition<'db> {
    pub typevar: TypeVarInstance<'db>,
    pub constraint_index: u32,
}

/// Identifier of a lexical scope that binds type variables. Solve-for scope
/// sets in a [`TypeVarContext`] refer to these.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVarScopeId(pub u32);

impl TypeVarScopeId {
    /// Matches every scope; a context carrying this scope solves all type
    /// variables it encounters.
    pub const WILDCARD: TypeVarScopeId = TypeVarScopeId(u32::MAX);
}

/// The identity of a type variable for substitution purposes: two uses with
/// the same name and binding scope are the same variable, whatever else
/// differs about the records describing them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeVarKey {
    pub name: Name,
    pub scope: Option<TypeVarScopeId>,
}

/// Which flavor of type variable a declaration introduces.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeVarKind {
    /// An ordinary type variable standing for a single type.
    Plain,
    /// A parameter specification standing for an entire parameter list.
    ParamSpec,
    /// A variadic type variable standing for an ordered sequence of types.
    TypeVarTuple,
}

/// Declared variance of a type variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeVarVariance {
    Unknown,
    Invariant,
    Covariant,
    Contravariant,
    /// Variance is inferred from usage rather than declared.
    Auto,
}

/// `P.args` / `P.kwargs` member access on a parameter specification.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamSpecAccess {
    Args,
    Kwargs,
}

/// A type-variable declaration: everything the `TypeVar(...)` /
/// `ParamSpec(...)` / `TypeVarTuple(...)` call site established.
#[salsa::interned]
pub struct TypeVarInstance<'db> {
    #[return_ref]
    pub name: Name,

    /// The scope that binds this variable; `None` for variables that have
    /// not been bound to a generic declaration (yet).
    pub scope_id: Option<TypeVarScopeId>,

    pub kind: TypeVarKind,

    pub variance: TypeVarVariance,

    /// Upper bound, if declared. For a recursive type alias placeholder this
    /// holds the resolved alias body.
    pub bound: Option<Type<'db>>,

    pub default_type: Option<Type<'db>>,

    /// Set when this "type variable" is really the placeholder for a
    /// recursive type alias. Invariant: `bound` is populated on every
    /// resolved placeholder handed out by the algebra.
    #[return_ref]
    pub recursive_alias_name: Option<Name>,

    /// A compiler-synthesized `Self` variable rather than a user-declared
    /// one.
    pub is_synthesized_self: bool,
}

impl<'db> TypeVarInstance<'db> {
    /// The `(name, scope)` identity used by substitution maps and the
    /// transformer's in-progress set.
    pub fn key(self, db: &'db dyn Db) -> TypeVarKey {
        TypeVarKey {
            name: self.name(db).clone(),
            scope: self.scope_id(db),
        }
    }

    pub fn is_param_spec(self, db: &'db dyn Db) -> bool {
        self.kind(db) == TypeVarKind::ParamSpec
    }

    pub fn is_variadic(self, db: &'db dyn Db) -> bool {
        self.kind(db) == TypeVarKind::TypeVarTuple
    }
}

/// A use of a type variable inside a type expression, together with the
/// use-site modifiers that do not belong to the declaration.
#[salsa::interned]
pub struct TypeVarType<'db> {
    pub typevar: TypeVarInstance<'db>,

    pub flags: TypeFlags,

    /// `Some` when this use is a `P.args` / `P.kwargs` access on a
    /// parameter specification.
    pub access: Option<ParamSpecAccess>,

    /// A variadic type variable that appeared inside a union; its tuple
    /// solution is unpacked back into the union after substitution.
    pub is_variadic_in_union: bool,

    pub type_alias: Option<TypeAliasInfo<'db>>,
}

impl<'db> TypeVarType<'db> {
    /// An instance-flavored use of `typevar` with no use-site modifiers.
    pub fn of(db: &'db dyn Db, typevar: TypeVarInstance<'db>) -> Self {
        Self::new(db, typevar, TypeFlags::INSTANCE, None, false, None)
    }

    pub fn key(self, db: &'db dyn Db) -> TypeVarKey {
        self.typevar(db).key(db)
    }

    #[must_use]
    pub fn with_flags(self, db: &'db dyn Db, flags: TypeFlags) -> Self {
        if self.flags(db) == flags {
            return self;
        }
        Self::new(
            db,
            self.typevar(db),
            flags,
            self.access(db),
            self.is_variadic_in_union(db),
            self.type_alias(db),
        )
    }

    #[must_use]
    pub fn with_type_alias(self, db: &'db dyn Db, alias: Option<TypeAliasInfo<'db>>) -> Self {
        Self::new(
            db,
            self.typevar(db),
            self.flags(db),
            self.access(db),
            self.is_variadic_in_union(db),
            alias,
        )
    }

    #[must_use]
    pub fn with_variadic_in_union(self, db: &'db dyn Db, in_union: bool) -> Self {
        Self::new(
            db,
            self.typevar(db),
            self.flags(db),
            self.access(db),
            in_union,
            self.type_alias(db),
        )
    }
}

/// Alias metadata preserved on a type produced by expanding a type alias:
/// the alias's own name and scope, its declared parameters, and the
/// arguments it was applied to.
#[salsa::interned]
pub struct TypeAliasInfo<'db> {
    #[return_ref]
    pub name: Name,

    #[return_ref]
    pub qualified_name: Name,

    pub scope_id: TypeVarScopeId,

    #[return_ref]
    pub type_params: Option<Box<[TypeVarType<'db>]>>,

    #[return_ref]
    pub type_args: Option<Box<[Type<'db>]>>,
}

impl<'db> TypeAliasInfo<'db> {
    #[must_use]
    pub fn with_type_args(self, db: &'db dyn Db, type_args: Box<[Type<'db>]>) -> Self {
        Self::new(
            db,
            self.name(db).clone(),
            self.qualified_name(db).clone(),
            self.scope_id(db),
            self.type_params(db).clone(),
            Some(type_args),
        )
    }
}

/// A module object.
#[salsa::interned]
pub struct ModuleType<'db> {
    #[return_ref]
    pub name: Name,
}

/// An ordered, duplicate-free union. Never nests unions and never contains
/// `Never`; [`UnionBuilder`] maintains those invariants.
#[salsa::interned]
pub struct UnionType<'db> {
    #[return_ref]
    pub elements: Box<[Type<'db>]>,

    /// Pruning hint: one of the elements is a recursive-type-alias
    /// placeholder, so consumers that expand aliases must guard against
    /// cycles.
    pub includes_recursive_alias: bool,

    pub type_alias: Option<TypeAliasInfo<'db>>,

    #[return_ref]
    pub conditions: Option<Box<[TypeCondition<'db>]>>,
}

impl<'db> UnionType<'db> {
    /// Create a union from elements, eagerly simplifying: a single element
    /// collapses to itself and zero elements collapse to `Never`.
    pub fn from_elements<I>(db: &'db dyn Db, elements: I) -> Type<'db>
    where
        I: IntoIterator<Item = Type<'db>>,
    {
        elements
            .into_iter()
            .fold(UnionBuilder::new(db), UnionBuilder::add)
            .build()
    }

    /// Apply a transform to every element and build a new union from the
    /// results.
    pub fn map(
        self,
        db: &'db dyn Db,
        transform: impl FnMut(Type<'db>) -> Type<'db>,
    ) -> Type<'db> {
        Self::from_elements(db, self.elements(db).iter().copied().map(transform))
    }

    pub fn contains(self, db: &'db dyn Db, ty: Type<'db>) -> bool {
        self.elements(db).contains(&ty)
    }

    #[must_use]
    pub fn with_type_alias(self, db: &'db dyn Db, alias: Option<TypeAliasInfo<'db>>) -> Self {
        Self::new(
            db,
            self.elements(db).clone(),
            self.includes_recursive_alias(db),
            alias,
            self.conditions(db).clone(),
        )
    }
}

/// Options tuning [`is_type_same`].
#[derive(Copy, Clone, Debug, Default)]
pub struct TypeSameOptions {
    /// Treat two differently-specialized pseudo-generic classes as the same.
    pub ignore_pseudo_generic: bool,
    /// Ignore the instance/instantiable distinction.
    pub ignore_type_flags: bool,
}

/// Structural equality modulo `options`: the equivalence relation the rest
/// of the algebra is defined against.
///
/// Classes compare by generic template plus applied arguments element-wise;
/// functions by parameter categories, parameter types, return type and
/// param-spec identity (names are ignored for positional-only parameters);
/// unions compare as sets.
pub fn is_type_same<'db>(
    db: &'db dyn Db,
    left: Type<'db>,
    right: Type<'db>,
    options: TypeSameOptions,
) -> bool {
    is_type_same_impl(db, left, right, options, 0)
}

fn is_type_same_impl<'db>(
    db: &'db dyn Db,
    left: Type<'db>,
    right: Type<'db>,
    options: TypeSameOptions,
    depth: u32,
) -> bool {
    if left == right {
        return true;
    }
    if depth > MAX_TYPE_RECURSION {
        return true;
    }
    let depth = depth + 1;

    match (left, right) {
        (Type::Class(left), Type::Class(right)) => {
            if left.class(db) != right.class(db) {
                return false;
            }
            if !options.ignore_type_flags && left.flags(db) != right.flags(db) {
                return false;
            }
            if left.literal(db) != right.literal(db) {
                return false;
            }
            if options.ignore_pseudo_generic && left.class(db).is_pseudo_generic(db) {
                return true;
            }
            if left.is_unpacked(db) != right.is_unpacked(db) {
                return false;
            }
            let same_args = match (left.type_args(db), right.type_args(db)) {
                (None, None) => true,
                (Some(left_args), Some(right_args)) => {
                    left_args.len() == right_args.len()
                        && left_args.iter().zip(right_args.iter()).all(|(a, b)| {
                            is_type_same_impl(db, *a, *b, options, depth)
                        })
                }
                _ => false,
            };
            if !same_args {
                return false;
            }
            match (left.tuple_type_args(db), right.tuple_type_args(db)) {
                (None, None) => true,
                (Some(left_args), Some(right_args)) => {
                    left_args.len() == right_args.len()
                        && left_args.iter().zip(right_args.iter()).all(|(a, b)| {
                            a.is_unbounded == b.is_unbounded
                                && is_type_same_impl(db, a.ty, b.ty, options, depth)
                        })
                }
                _ => false,
            }
        }
        (Type::Function(left), Type::Function(right)) => {
            is_function_same(db, left, right, options, depth)
        }
        (Type::Overloaded(left), Type::Overloaded(right)) => {
            let left_overloads = left.overloads(db);
            let right_overloads = right.overloads(db);
            left_overloads.len() == right_overloads.len()
                && left_overloads
                    .iter()
                    .zip(right_overloads.iter())
                    .all(|(a, b)| is_function_same(db, *a, *b, options, depth))
        }
        (Type::Union(left), Type::Union(right)) => {
            let left_elements = left.elements(db);
            let right_elements = right.elements(db);
            if left_elements.len() != right_elements.len() {
                return false;
            }
            // Unions compare as sets: every element on the left must have a
            // distinct partner on the right.
            let mut matched = vec![false; right_elements.len()];
            left_elements.iter().all(|left_element| {
                right_elements.iter().enumerate().any(|(i, right_element)| {
                    if matched[i] {
                        return false;
                    }
                    if is_type_same_impl(db, *left_element, *right_element, options, depth) {
                        matched[i] = true;
                        true
                    } else {
                        false
                    }
                })
            })
        }
        (Type::TypeVar(left), Type::TypeVar(right)) => {
            // Identity is the (name, scope) pair, not the record: two
            // declarations of the same variable compare equal.
            if left.typevar(db).key(db) != right.typevar(db).key(db) {
                return false;
            }
            if left.access(db) != right.access(db) {
                return false;
            }
            options.ignore_type_flags || left.flags(db) == right.flags(db)
        }
        (Type::Module(left), Type::Module(right)) => left.name(db) == right.name(db),
        _ => false,
    }
}

fn is_function_same<'db>(
    db: &'db dyn Db,
    left: FunctionType<'db>,
    right: FunctionType<'db>,
    options: TypeSameOptions,
    depth: u32,
) -> bool {
    let left_params = left.parameters(db);
    let right_params = right.parameters(db);
    if left_params.len() != right_params.len() {
        return false;
    }
    for (i, (left_param, right_param)) in left_params.iter().zip(right_params.iter()).enumerate() {
        if left_param.category != right_param.category {
            return false;
        }
        // Positional-only parameters match regardless of their names.
        if left_param.category != ParameterCategory::Positional
            && left_param.name != right_param.name
        {
            return false;
        }
        if left_param.has_default != right_param.has_default {
            return false;
        }
        if !is_type_same_impl(
            db,
            left.effective_parameter_type(db, i),
            right.effective_parameter_type(db, i),
            options,
            depth,
        ) {
            return false;
        }
    }
    match (left.param_spec(db), right.param_spec(db)) {
        (None, None) => {}
        (Some(left_spec), Some(right_spec)) => {
            if left_spec.key(db) != right_spec.key(db) {
                return false;
            }
        }
        _ => return false,
    }
    is_type_same_impl(
        db,
        left.effective_return_type(db),
        right.effective_return_type(db),
        options,
        depth,
    )
}
