//! Class records and specialized class references.
//!
//! A [`Class`] is the generic template a `class` statement introduces: its
//! salsa identity doubles as the "same generic class" key, so two
//! specializations of one template always agree on their `class` field. A
//! [`ClassType`] is a (possibly specialized) reference to a template and is
//! what actually appears inside [`Type::Class`].

use bitflags::bitflags;

use crate::symbol::SymbolTable;
use crate::types::mro::{self, Mro, MroError, MroIterator};
use crate::types::{
    TypeAliasInfo, TypeCondition, TypeFlags, TypeVarType, Type,
};
use crate::{Db, Name};

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct ClassFlags: u8 {
        /// Membership is structural rather than nominal.
        const PROTOCOL = 1 << 0;
        /// A `TypedDict` class; class-body fields describe dictionary entries.
        const TYPED_DICT = 1 << 1;
        /// A dataclass (or dataclass-transformed class).
        const DATACLASS = 1 << 2;
        /// A class whose type parameters are synthesized from its
        /// constructor rather than declared.
        const PSEUDO_GENERIC = 1 << 3;
        /// One of the special-form builtins that participate in
        /// specialization even without declared type parameters.
        const SPECIAL_BUILTIN = 1 << 4;
        /// A tuple class; carries structural element types.
        const TUPLE = 1 << 5;
    }
}

/// Classes the algebra itself needs to recognize. The embedder tags class
/// records with these markers when it builds them; the algebra never
/// resolves names to classes on its own.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KnownClass {
    Object,
    Type,
    Tuple,
    Generic,
    Dict,
    List,
    Str,
    Int,
    Bool,
}

impl KnownClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            KnownClass::Object => "object",
            KnownClass::Type => "type",
            KnownClass::Tuple => "tuple",
            KnownClass::Generic => "Generic",
            KnownClass::Dict => "dict",
            KnownClass::List => "list",
            KnownClass::Str => "str",
            KnownClass::Int => "int",
            KnownClass::Bool => "bool",
        }
    }
}

/// The value of a literal type: a class instance narrowed to a single
/// compile-time-known inhabitant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LiteralValue {
    Bool(bool),
    Int(i64),
    Str(Name),
    Bytes(Box<[u8]>),
}

/// One structural element of a tuple class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TupleTypeArgument<'db> {
    pub ty: Type<'db>,
    /// An `int, ...`-style entry matching any number of elements. At most
    /// one entry of a tuple may be unbounded.
    pub is_unbounded: bool,
}

impl<'db> TupleTypeArgument<'db> {
    pub const fn new(ty: Type<'db>) -> Self {
        Self {
            ty,
            is_unbounded: false,
        }
    }

    pub const fn unbounded(ty: Type<'db>) -> Self {
        Self {
            ty,
            is_unbounded: true,
        }
    }
}

/// The generic template introduced by a class definition.
#[salsa::interned]
pub struct Class<'db> {
    #[return_ref]
    pub name: Name,

    /// Name of the module the class is defined in.
    #[return_ref]
    pub module: Name,

    /// Declared type parameters, in order.
    #[return_ref]
    pub type_params: Box<[TypeVarType<'db>]>,

    /// Base classes in declaration order. The binder is responsible for
    /// appending `object` where the runtime would.
    #[return_ref]
    pub bases: Box<[Type<'db>]>,

    /// The class body's symbol table.
    #[return_ref]
    pub fields: SymbolTable<'db>,

    pub flags: ClassFlags,

    pub metaclass: Option<Type<'db>>,

    pub known: Option<KnownClass>,
}

impl<'db> Class<'db> {
    pub fn is_known(self, db: &'db dyn Db, known: KnownClass) -> bool {
        self.known(db) == Some(known)
    }

    pub fn is_object(self, db: &'db dyn Db) -> bool {
        self.is_known(db, KnownClass::Object)
    }

    pub fn is_protocol(self, db: &'db dyn Db) -> bool {
        self.flags(db).contains(ClassFlags::PROTOCOL)
    }

    pub fn is_typed_dict(self, db: &'db dyn Db) -> bool {
        self.flags(db).contains(ClassFlags::TYPED_DICT)
    }

    pub fn is_dataclass(self, db: &'db dyn Db) -> bool {
        self.flags(db).contains(ClassFlags::DATACLASS)
    }

    pub fn is_pseudo_generic(self, db: &'db dyn Db) -> bool {
        self.flags(db).contains(ClassFlags::PSEUDO_GENERIC)
    }

    pub fn is_special_builtin(self, db: &'db dyn Db) -> bool {
        self.flags(db).contains(ClassFlags::SPECIAL_BUILTIN)
    }

    pub fn is_tuple(self, db: &'db dyn Db) -> bool {
        self.flags(db).contains(ClassFlags::TUPLE)
    }

    pub fn is_generic(self, db: &'db dyn Db) -> bool {
        !self.type_params(db).is_empty()
    }

    /// Attempt to resolve the method resolution order for this class,
    /// returning an error carrying the best-effort fallback if the
    /// linearization is inconsistent.
    pub fn try_mro(self, db: &'db dyn Db) -> &'db Result<Mro<'db>, MroError<'db>> {
        mro::try_mro(db, self)
    }

    /// The method resolution order of this class: the successful
    /// linearization, or the deterministic best-effort fallback when the
    /// bases cannot be linearized consistently.
    pub fn mro(self, db: &'db dyn Db) -> &'db Mro<'db> {
        match self.try_mro(db) {
            Ok(mro) => mro,
            Err(error) => error.fallback(),
        }
    }

    pub fn iter_mro(self, db: &'db dyn Db) -> MroIterator<'db> {
        MroIterator::new(db, self)
    }

    /// The identity specialization of this class: each declared type
    /// parameter applied as its own argument. This is what `mro[0]` holds
    /// for a generic class.
    pub fn self_specialization(self, db: &'db dyn Db) -> ClassType<'db> {
        let class_type = ClassType::of(db, self);
        if !self.is_generic(db) {
            return class_type;
        }
        let identity_args = self
            .type_params(db)
            .iter()
            .map(|param| Type::TypeVar(*param))
            .collect();
        class_type.with_type_args(db, Some(identity_args))
    }
}

/// A reference to a class: the template plus applied type arguments, the
/// structural tuple elements for tuple classes, and the envelope data every
/// type value carries (flags, alias metadata, conditions, literal value).
#[salsa::interned]
pub struct ClassType<'db> {
    pub class: Class<'db>,

    /// Applied type arguments; absent means unspecialized. When present,
    /// the length always equals the number of declared type parameters.
    #[return_ref]
    pub type_args: Option<Box<[Type<'db>]>>,

    /// Structural element types for tuple classes.
    #[return_ref]
    pub tuple_type_args: Option<Box<[TupleTypeArgument<'db>]>>,

    /// A tuple class used as an unpacked variadic (`*tuple[int, str]`).
    pub is_unpacked: bool,

    /// `Some` for literal types (`Literal[3]` is an `int` instance narrowed
    /// to one value).
    #[return_ref]
    pub literal: Option<LiteralValue>,

    pub flags: TypeFlags,

    pub type_alias: Option<TypeAliasInfo<'db>>,

    #[return_ref]
    pub conditions: Option<Box<[TypeCondition<'db>]>>,
}

impl<'db> ClassType<'db> {
    /// An unspecialized, instantiable (class-object) reference to `class`.
    pub fn of(db: &'db dyn Db, class: Class<'db>) -> Self {
        Self::new(
            db,
            class,
            None,
            None,
            false,
            None,
            TypeFlags::INSTANTIABLE,
            None,
            None,
        )
    }

    /// An instance-of-`class` type.
    pub fn instance(db: &'db dyn Db, class: Class<'db>) -> Self {
        Self::of(db, class).with_flags(db, TypeFlags::INSTANCE)
    }

    pub fn is_instance(self, db: &'db dyn Db) -> bool {
        self.flags(db).contains(TypeFlags::INSTANCE)
    }

    pub fn is_same_generic_class(self, db: &'db dyn Db, other: ClassType<'db>) -> bool {
        self.class(db) == other.class(db)
    }

    pub fn name(self, db: &'db dyn Db) -> &'db Name {
        self.class(db).name(db)
    }

    pub fn is_known(self, db: &'db dyn Db, known: KnownClass) -> bool {
        self.class(db).is_known(db, known)
    }

    #[must_use]
    pub fn with_flags(self, db: &'db dyn Db, flags: TypeFlags) -> Self {
        if self.flags(db) == flags {
            return self;
        }
        Self::new(
            db,
            self.class(db),
            self.type_args(db).clone(),
            self.tuple_type_args(db).clone(),
            self.is_unpacked(db),
            self.literal(db).clone(),
            flags,
            self.type_alias(db),
            self.conditions(db).clone(),
        )
    }

    #[must_use]
    pub fn with_type_args(self, db: &'db dyn Db, type_args: Option<Box<[Type<'db>]>>) -> Self {
        if let Some(type_args) = &type_args {
            debug_assert_eq!(
                type_args.len(),
                self.class(db).type_params(db).len(),
                "applied type arguments must match the declared type parameters"
            );
        }
        Self::new(
            db,
            self.class(db),
            type_args,
            self.tuple_type_args(db).clone(),
            self.is_unpacked(db),
            self.literal(db).clone(),
            self.flags(db),
            self.type_alias(db),
            self.conditions(db).clone(),
        )
    }

    #[must_use]
    pub fn with_tuple_type_args(
        self,
        db: &'db dyn Db,
        type_args: Option<Box<[Type<'db>]>>,
        tuple_type_args: Box<[TupleTypeArgument<'db>]>,
    ) -> Self {
        debug_assert!(
            tuple_type_args
                .iter()
                .filter(|argument| argument.is_unbounded)
                .count()
                <= 1,
            "a tuple may contain at most one unbounded element"
        );
        Self::new(
            db,
            self.class(db),
            type_args,
            Some(tuple_type_args),
            self.is_unpacked(db),
            self.literal(db).clone(),
            self.flags(db),
            self.type_alias(db),
            self.conditions(db).clone(),
        )
    }

    #[must_use]
    pub fn with_unpacked(self, db: &'db dyn Db, is_unpacked: bool) -> Self {
        if self.is_unpacked(db) == is_unpacked {
            return self;
        }
        Self::new(
            db,
            self.class(db),
            self.type_args(db).clone(),
            self.tuple_type_args(db).clone(),
            is_unpacked,
            self.literal(db).clone(),
            self.flags(db),
            self.type_alias(db),
            self.conditions(db).clone(),
        )
    }

    #[must_use]
    pub fn with_literal(self, db: &'db dyn Db, literal: Option<LiteralValue>) -> Self {
        Self::new(
            db,
            self.class(db),
            self.type_args(db).clone(),
            self.tuple_type_args(db).clone(),
            self.is_unpacked(db),
            literal,
            self.flags(db),
            self.type_alias(db),
            self.conditions(db).clone(),
        )
    }

    #[must_use]
    pub fn with_type_alias(self, db: &'db dyn Db, alias: Option<TypeAliasInfo<'db>>) -> Self {
        Self::new(
            db,
            self.class(db),
            self.type_args(db).clone(),
            self.tuple_type_args(db).clone(),
            self.is_unpacked(db),
            self.literal(db).clone(),
            self.flags(db),
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
            self.class(db),
            self.type_args(db).clone(),
            self.tuple_type_args(db).clone(),
            self.is_unpacked(db),
            self.literal(db).clone(),
            self.flags(db),
            self.type_alias(db),
            conditions,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::setup_db;
    use crate::types::tests::{class, generic_class, typevar};

    #[test]
    fn self_specialization_uses_identity_arguments() {
        let db = setup_db();
        let t = typevar(&db, "T", 1);
        let c = generic_class(&db, "C", &[t], &[]);

        let specialized = c.self_specialization(&db);
        assert_eq!(
            specialized.type_args(&db).as_deref(),
            Some(&[Type::TypeVar(t)][..])
        );

        let plain = class(&db, "D", &[]);
        assert_eq!(plain.self_specialization(&db).type_args(&db), &None);
    }

    #[test]
    fn same_generic_class_ignores_specialization() {
        let db = setup_db();
        let t = typevar(&db, "T", 1);
        let c = generic_class(&db, "C", &[t], &[]);

        let unspecialized = ClassType::of(&db, c);
        let specialized = unspecialized.with_type_args(&db, Some(Box::from([Type::Any])));
        assert_ne!(unspecialized, specialized);
        assert!(unspecialized.is_same_generic_class(&db, specialized));
    }
}
