//! The substitution context: the only mutable state in the algebra.
//!
//! A [`TypeVarContext`] is created at the start of a call or assignment
//! decision, filled in by the solver, applied by the transformer, and then
//! discarded. Solving against an overload set can fork it into several
//! [`SignatureContext`]s; a downstream consumer emits one specialized
//! signature per context.

use rustc_hash::FxHashMap;

use crate::types::{
    FunctionType, TupleTypeArgument, Type, TypeVarKey, TypeVarScopeId, TypeVarType,
    TypeVarVariance,
};
use crate::Db;

/// The solved value recorded for one type variable.
#[derive(Clone, Debug)]
pub enum TypeVarMapEntry<'db> {
    /// A plain type variable: the narrow bound is the best solution seen so
    /// far, the wide bound the loosest admissible one.
    TypeVar {
        narrow: Option<Type<'db>>,
        wide: Option<Type<'db>>,
        /// Keep literal types in the solution instead of widening them.
        retain_literals: bool,
    },
    /// A parameter specification: the solved value is a whole parameter
    /// list.
    ParamSpec(FunctionType<'db>),
    /// A variadic type variable: the solved value is an ordered tuple.
    Tuple(Box<[TupleTypeArgument<'db>]>),
}

/// One alternative solution set, mapping type-variable identity to a solved
/// entry.
#[derive(Clone, Debug, Default)]
pub struct SignatureContext<'db> {
    entries: FxHashMap<TypeVarKey, TypeVarMapEntry<'db>>,
}

impl<'db> SignatureContext<'db> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_type_var_type(
        &mut self,
        db: &'db dyn Db,
        type_var: TypeVarType<'db>,
        narrow: Option<Type<'db>>,
        wide: Option<Type<'db>>,
        retain_literals: bool,
    ) {
        self.entries.insert(
            type_var.key(db),
            TypeVarMapEntry::TypeVar {
                narrow,
                wide,
                retain_literals,
            },
        );
    }

    pub fn set_param_spec_type(
        &mut self,
        db: &'db dyn Db,
        type_var: TypeVarType<'db>,
        value: FunctionType<'db>,
    ) {
        self.entries
            .insert(type_var.key(db), TypeVarMapEntry::ParamSpec(value));
    }

    pub fn set_tuple_type_var(
        &mut self,
        db: &'db dyn Db,
        type_var: TypeVarType<'db>,
        entries: Box<[TupleTypeArgument<'db>]>,
    ) {
        self.entries
            .insert(type_var.key(db), TypeVarMapEntry::Tuple(entries));
    }

    pub fn get(&self, key: &TypeVarKey) -> Option<&TypeVarMapEntry<'db>> {
        self.entries.get(key)
    }

    /// The solution for a plain type variable: the narrow bound if set,
    /// else the wide bound; `narrow_only` suppresses the wide fallback.
    pub fn get_type_var_type(&self, key: &TypeVarKey, narrow_only: bool) -> Option<Type<'db>> {
        match self.entries.get(key)? {
            TypeVarMapEntry::TypeVar { narrow, wide, .. } => {
                if narrow_only {
                    *narrow
                } else {
                    narrow.or(*wide)
                }
            }
            _ => None,
        }
    }

    pub fn get_param_spec_type(&self, key: &TypeVarKey) -> Option<FunctionType<'db>> {
        match self.entries.get(key)? {
            TypeVarMapEntry::ParamSpec(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_tuple_type_var(&self, key: &TypeVarKey) -> Option<&[TupleTypeArgument<'db>]> {
        match self.entries.get(key)? {
            TypeVarMapEntry::Tuple(entries) => Some(entries),
            _ => None,
        }
    }
}

/// A stack of signature contexts plus the set of scopes being solved.
#[derive(Clone, Debug)]
pub struct TypeVarContext<'db> {
    solve_for_scopes: Vec<TypeVarScopeId>,
    signature_contexts: Vec<SignatureContext<'db>>,
    locked: bool,
}

impl<'db> TypeVarContext<'db> {
    pub fn new(solve_for_scopes: impl IntoIterator<Item = TypeVarScopeId>) -> Self {
        Self {
            solve_for_scopes: solve_for_scopes.into_iter().collect(),
            signature_contexts: vec![SignatureContext::new()],
            locked: false,
        }
    }

    /// A context that solves every scope it encounters.
    pub fn wildcard() -> Self {
        Self::new([TypeVarScopeId::WILDCARD])
    }

    pub fn add_solve_for_scope(&mut self, scope: TypeVarScopeId) {
        if !self.solve_for_scopes.contains(&scope) {
            self.solve_for_scopes.push(scope);
        }
    }

    pub fn has_solve_for_scope(&self, scope: TypeVarScopeId) -> bool {
        self.solve_for_scopes
            .iter()
            .any(|candidate| *candidate == scope || *candidate == TypeVarScopeId::WILDCARD)
    }

    pub fn solve_for_scopes(&self) -> &[TypeVarScopeId] {
        &self.solve_for_scopes
    }

    /// Lock the context against further mutation.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_empty(&self) -> bool {
        self.signature_contexts
            .iter()
            .all(SignatureContext::is_empty)
    }

    /// The primary signature context. Most operations solve into a single
    /// context; the stack only grows when an overload set forks it.
    pub fn primary_signature_context(&self) -> &SignatureContext<'db> {
        &self.signature_contexts[0]
    }

    pub fn signature_context(&self, index: usize) -> &SignatureContext<'db> {
        &self.signature_contexts[index]
    }

    pub fn signature_contexts(&self) -> &[SignatureContext<'db>] {
        &self.signature_contexts
    }

    pub fn add_signature_context(&mut self, context: SignatureContext<'db>) {
        debug_assert!(!self.locked, "cannot mutate a locked context");
        self.signature_contexts.push(context);
    }

    pub fn set_type_var_type(
        &mut self,
        db: &'db dyn Db,
        type_var: TypeVarType<'db>,
        narrow: Option<Type<'db>>,
        wide: Option<Type<'db>>,
        retain_literals: bool,
    ) {
        debug_assert!(!self.locked, "cannot mutate a locked context");
        for context in &mut self.signature_contexts {
            context.set_type_var_type(db, type_var, narrow, wide, retain_literals);
        }
    }

    pub fn set_param_spec_type(
        &mut self,
        db: &'db dyn Db,
        type_var: TypeVarType<'db>,
        value: FunctionType<'db>,
    ) {
        debug_assert!(!self.locked, "cannot mutate a locked context");
        for context in &mut self.signature_contexts {
            context.set_param_spec_type(db, type_var, value);
        }
    }

    pub fn set_tuple_type_var(
        &mut self,
        db: &'db dyn Db,
        type_var: TypeVarType<'db>,
        entries: Box<[TupleTypeArgument<'db>]>,
    ) {
        debug_assert!(!self.locked, "cannot mutate a locked context");
        for context in &mut self.signature_contexts {
            context.set_tuple_type_var(db, type_var, entries.clone());
        }
    }

    pub fn get_type_var_type(&self, key: &TypeVarKey, narrow_only: bool) -> Option<Type<'db>> {
        self.primary_signature_context()
            .get_type_var_type(key, narrow_only)
    }

    pub fn get_param_spec_type(&self, key: &TypeVarKey) -> Option<FunctionType<'db>> {
        self.primary_signature_context().get_param_spec_type(key)
    }

    pub fn get_tuple_type_var(&self, key: &TypeVarKey) -> Option<&[TupleTypeArgument<'db>]> {
        self.primary_signature_context().get_tuple_type_var(key)
    }
}

impl Default for TypeVarContext<'_> {
    fn default() -> Self {
        Self::new([])
    }
}

/// Decide whether `ty` is an acceptable argument for a type parameter of
/// the given declared variance.
///
/// A plain type variable argument must declare a matching variance. A
/// concrete class argument can occupy a covariant or invariant position but
/// never a contravariant one; a generic instantiation is checked
/// recursively, composing the outer variance with each inner parameter's
/// declared variance (covariance composes identically, contravariance
/// flips).
pub fn is_variance_of_type_argument_compatible<'db>(
    db: &'db dyn Db,
    ty: Type<'db>,
    variance: TypeVarVariance,
) -> bool {
    if matches!(variance, TypeVarVariance::Unknown | TypeVarVariance::Auto) {
        return true;
    }

    match ty {
        Type::TypeVar(type_var)
            if !type_var.typevar(db).is_param_spec(db)
                && !type_var.typevar(db).is_variadic(db) =>
        {
            let argument_variance = type_var.typevar(db).variance(db);
            if matches!(
                argument_variance,
                TypeVarVariance::Covariant | TypeVarVariance::Contravariant
            ) {
                return argument_variance == variance;
            }
            true
        }
        Type::Class(class_type) => {
            let class = class_type.class(db);
            let type_params = class.type_params(db);
            if type_params.is_empty() {
                return variance != TypeVarVariance::Contravariant;
            }
            type_params.iter().enumerate().all(|(index, param)| {
                let param_instance = param.typevar(db);
                if param_instance.is_param_spec(db) || param_instance.is_variadic(db) {
                    return true;
                }
                let declared = param_instance.variance(db);
                if declared == TypeVarVariance::Auto {
                    return true;
                }
                let effective = compose_variance(declared, variance);
                let argument = class_type
                    .type_args(db)
                    .as_ref()
                    .and_then(|args| args.get(index).copied())
                    .unwrap_or(Type::Unknown);
                is_variance_of_type_argument_compatible(db, argument, effective)
            })
        }
        _ => true,
    }
}

/// The effective variance of an inner type parameter seen through an outer
/// position of the given variance. A contravariant inner parameter flips
/// the outer variance; everything else lets it flow through.
fn compose_variance(declared: TypeVarVariance, outer: TypeVarVariance) -> TypeVarVariance {
    match declared {
        TypeVarVariance::Contravariant => match outer {
            TypeVarVariance::Covariant => TypeVarVariance::Contravariant,
            TypeVarVariance::Contravariant => TypeVarVariance::Covariant,
            other => other,
        },
        _ => outer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::setup_db;
    use crate::types::tests::{class, generic_class, instance_of, typevar};
    use crate::types::{ClassType, TypeVarInstance, TypeVarKind};
    use crate::Name;

    fn variant_typevar<'db>(
        db: &'db crate::db::tests::TestDb,
        name: &str,
        variance: TypeVarVariance,
    ) -> TypeVarType<'db> {
        TypeVarType::of(
            db,
            TypeVarInstance::new(
                db,
                Name::new(name),
                Some(TypeVarScopeId(3)),
                TypeVarKind::Plain,
                variance,
                None,
                None,
                None,
                false,
            ),
        )
    }

    #[test]
    fn context_stores_and_returns_bounds() {
        let db = setup_db();
        let t = typevar(&db, "T", 1);
        let int = instance_of(&db, class(&db, "int", &[]));
        let object = instance_of(&db, class(&db, "object", &[]));

        let mut context = TypeVarContext::new([TypeVarScopeId(1)]);
        assert!(context.is_empty());
        context.set_type_var_type(&db, t, Some(int), Some(object), false);
        assert!(!context.is_empty());

        let key = t.key(&db);
        assert_eq!(context.get_type_var_type(&key, false), Some(int));
        assert_eq!(context.get_type_var_type(&key, true), Some(int));

        context.set_type_var_type(&db, t, None, Some(object), false);
        assert_eq!(context.get_type_var_type(&key, false), Some(object));
        assert_eq!(context.get_type_var_type(&key, true), None);
    }

    #[test]
    fn wildcard_scope_solves_everything() {
        let context = TypeVarContext::wildcard();
        assert!(context.has_solve_for_scope(TypeVarScopeId(0)));
        assert!(context.has_solve_for_scope(TypeVarScopeId(123)));

        let scoped = TypeVarContext::new([TypeVarScopeId(1)]);
        assert!(scoped.has_solve_for_scope(TypeVarScopeId(1)));
        assert!(!scoped.has_solve_for_scope(TypeVarScopeId(2)));
    }

    #[test]
    fn entry_kinds_do_not_bleed_into_each_other() {
        let db = setup_db();
        let t = typevar(&db, "T", 1);
        let int = instance_of(&db, class(&db, "int", &[]));

        let mut context = TypeVarContext::new([TypeVarScopeId(1)]);
        context.set_type_var_type(&db, t, Some(int), None, false);

        let key = t.key(&db);
        assert!(context.get_param_spec_type(&key).is_none());
        assert!(context.get_tuple_type_var(&key).is_none());
    }

    #[test]
    fn unknown_and_auto_variance_accept_anything() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        for variance in [TypeVarVariance::Unknown, TypeVarVariance::Auto] {
            assert!(is_variance_of_type_argument_compatible(&db, int, variance));
        }
    }

    #[test]
    fn typevar_argument_variance_must_match() {
        let db = setup_db();
        let covariant = Type::TypeVar(variant_typevar(&db, "T_co", TypeVarVariance::Covariant));
        assert!(is_variance_of_type_argument_compatible(
            &db,
            covariant,
            TypeVarVariance::Covariant
        ));
        assert!(!is_variance_of_type_argument_compatible(
            &db,
            covariant,
            TypeVarVariance::Contravariant
        ));
    }

    #[test]
    fn concrete_arguments_reject_contravariant_positions() {
        let db = setup_db();
        let t = typevar(&db, "T", 2);
        let list = generic_class(&db, "list", &[t], &[]);
        let int = instance_of(&db, class(&db, "int", &[]));
        let list_int = Type::Class(
            ClassType::instance(&db, list).with_type_args(&db, Some(Box::from([int]))),
        );
        assert!(is_variance_of_type_argument_compatible(
            &db,
            list_int,
            TypeVarVariance::Covariant
        ));
        assert!(!is_variance_of_type_argument_compatible(
            &db,
            list_int,
            TypeVarVariance::Contravariant
        ));
    }

    #[test]
    fn contravariant_parameter_flips_the_outer_variance() {
        let db = setup_db();
        let t_contra = variant_typevar(&db, "T_contra", TypeVarVariance::Contravariant);
        let sink = generic_class(&db, "Sink", &[t_contra], &[]);
        let int = instance_of(&db, class(&db, "int", &[]));
        let sink_int = Type::Class(
            ClassType::instance(&db, sink).with_type_args(&db, Some(Box::from([int]))),
        );
        // Through `Sink`'s contravariant parameter, a contravariant outer
        // position becomes covariant and accepts the concrete argument.
        assert!(is_variance_of_type_argument_compatible(
            &db,
            sink_int,
            TypeVarVariance::Contravariant
        ));
        assert!(!is_variance_of_type_argument_compatible(
            &db,
            sink_int,
            TypeVarVariance::Covariant
        ));
    }
}
