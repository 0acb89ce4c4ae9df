//! The recursive type-variable transformer.
//!
//! A policy (the [`TypeVarTransform`] trait) decides what happens to each
//! kind of type variable; the engine owns the recursion: walking every type
//! category, cutting cycles through the in-progress set and the signature
//! stack, and bounding depth. Concrete policies are plain structs; the main
//! one applies a solved [`TypeVarContext`].

use rustc_hash::FxHashSet;

use crate::types::class::Class;
use crate::types::signatures::{
    convert_param_spec_value_to_type, convert_type_to_param_spec_value,
};
use crate::types::tuple::specialize_tuple_class;
use crate::types::{
    contains_literal_type, map_subtypes, ClassType, FunctionType, OverloadedFunctionType,
    Parameter, ParameterCategory, SpecializedSignature, TupleTypeArgument, Type, TypeFlags,
    TypeVarContext, TypeVarKey, TypeVarMapEntry, TypeVarType, UnionType, MAX_TYPE_RECURSION,
};
use crate::{Db, Name};

/// Options tuning [`requires_specialization`].
#[derive(Copy, Clone, Debug, Default)]
pub struct RequiresSpecializationOptions {
    /// Treat pseudo-generic classes as concrete.
    pub ignore_pseudo_generic: bool,
    /// Treat a synthesized `Self` variable as concrete.
    pub ignore_self: bool,
}

/// Options tuning [`apply_solved_type_vars`].
#[derive(Copy, Clone, Debug, Default)]
pub struct ApplyTypeVarOptions<'db> {
    /// Replace in-scope variables that have no solution with `Unknown` (or
    /// with their declared default, unless `use_unknown_over_default`).
    pub unknown_if_not_found: bool,
    /// With `unknown_if_not_found`, ignore declared defaults and always
    /// insert `Unknown`.
    pub use_unknown_over_default: bool,
    /// Use only the narrow bound of a solution, falling back to a wide
    /// bound that contains literal types.
    pub use_narrow_bound_only: bool,
    /// Drop in-scope unsolved variables from unions (used to compute
    /// residual return types).
    pub eliminate_unsolved_in_unions: bool,
    /// The `type` class: when present, `Any`/`Unknown` replacements in an
    /// instantiable position are wrapped as `type[...]`.
    pub type_class_type: Option<Class<'db>>,
}

/// Whether applying a substitution to `ty` could change anything. The single
/// most important shortcut in the algebra: the transformer returns
/// immediately when this is `false`.
pub fn requires_specialization<'db>(
    db: &'db dyn Db,
    ty: Type<'db>,
    options: RequiresSpecializationOptions,
) -> bool {
    requires_specialization_impl(db, ty, options, 0)
}

fn requires_specialization_impl<'db>(
    db: &'db dyn Db,
    ty: Type<'db>,
    options: RequiresSpecializationOptions,
    depth: u32,
) -> bool {
    if depth > MAX_TYPE_RECURSION {
        return false;
    }
    let depth = depth + 1;

    match ty {
        Type::Unbound | Type::Unknown | Type::Any | Type::None | Type::Never | Type::Module(_) => {
            false
        }
        Type::Class(class_type) => {
            if options.ignore_pseudo_generic && class_type.class(db).is_pseudo_generic(db) {
                return false;
            }
            if let Some(tuple_args) = class_type.tuple_type_args(db) {
                if tuple_args
                    .iter()
                    .any(|arg| requires_specialization_impl(db, arg.ty, options, depth))
                {
                    return true;
                }
            }
            if let Some(type_args) = class_type.type_args(db) {
                return type_args
                    .iter()
                    .any(|arg| requires_specialization_impl(db, *arg, options, depth));
            }
            !class_type.class(db).type_params(db).is_empty()
        }
        Type::Function(function) => {
            if function.param_spec(db).is_some() {
                return true;
            }
            for index in 0..function.parameters(db).len() {
                if requires_specialization_impl(
                    db,
                    function.effective_parameter_type(db, index),
                    options,
                    depth,
                ) {
                    return true;
                }
            }
            requires_specialization_impl(db, function.effective_return_type(db), options, depth)
        }
        Type::Overloaded(overloaded) => overloaded
            .overloads(db)
            .iter()
            .any(|overload| requires_specialization_impl(db, Type::Function(*overload), options, depth)),
        Type::Union(union) => union
            .elements(db)
            .iter()
            .any(|element| requires_specialization_impl(db, *element, options, depth)),
        Type::TypeVar(type_var) => {
            let instance = type_var.typevar(db);
            if instance.recursive_alias_name(db).is_none() {
                if options.ignore_self && instance.is_synthesized_self(db) {
                    return false;
                }
                return true;
            }
            // A resolved recursive alias only needs specialization when it
            // carries generic arguments.
            if let Some(alias) = type_var.type_alias(db) {
                if let Some(type_args) = alias.type_args(db) {
                    return type_args
                        .iter()
                        .any(|arg| requires_specialization_impl(db, *arg, options, depth));
                }
            }
            false
        }
    }
}

/// The substitution policy: what to do when the engine reaches a type
/// variable. Every hook may decline (return `None`) to leave the variable
/// in place.
pub(crate) trait TypeVarTransform<'db> {
    /// Replacement for a plain (or variadic) type variable.
    fn transform_type_var(&mut self, db: &'db dyn Db, type_var: TypeVarType<'db>)
        -> Option<Type<'db>>;

    /// Replacement for a parameter specification.
    fn transform_param_spec(
        &mut self,
        db: &'db dyn Db,
        type_var: TypeVarType<'db>,
    ) -> Option<FunctionType<'db>>;

    /// Replacement entries for a variadic type variable in a splice
    /// position (tuple elements, unpacked arguments).
    fn transform_tuple_type_var(
        &mut self,
        db: &'db dyn Db,
        type_var: TypeVarType<'db>,
    ) -> Option<Box<[TupleTypeArgument<'db>]>>;

    /// Post-processing for each union subtype; returning `None` drops the
    /// subtype.
    fn transform_union_subtype(
        &mut self,
        db: &'db dyn Db,
        pre_transform: Type<'db>,
        post_transform: Type<'db>,
    ) -> Option<Type<'db>> {
        let _ = (db, pre_transform);
        Some(post_transform)
    }

    /// Number of alternative solution sets; signatures are transformed once
    /// per set and combined into an overload.
    fn signature_context_count(&self) -> usize {
        1
    }

    fn set_active_signature_context(&mut self, index: usize) {
        let _ = index;
    }
}

/// Run `policy` over `ty`.
pub(crate) fn apply_type_var_transform<'db, P: TypeVarTransform<'db>>(
    db: &'db dyn Db,
    ty: Type<'db>,
    policy: &mut P,
) -> Type<'db> {
    let mut transformer = TypeVarTransformer {
        db,
        policy,
        in_progress: FxHashSet::default(),
        pending_signatures: Vec::new(),
    };
    transformer.apply(ty, 0)
}

/// The shared recursion engine.
struct TypeVarTransformer<'p, 'db, P: TypeVarTransform<'db>> {
    db: &'db dyn Db,
    policy: &'p mut P,
    /// Type variables currently being substituted, keyed by `(name, scope)`.
    /// A bound or chained replacement that mentions one of these is left
    /// alone, cutting cycles through recursive aliases and bounds.
    in_progress: FxHashSet<TypeVarKey>,
    /// Functions and overload sets currently being rewritten, cutting
    /// identity cycles through overload sets.
    pending_signatures: Vec<Type<'db>>,
}

impl<'p, 'db, P: TypeVarTransform<'db>> TypeVarTransformer<'p, 'db, P> {
    fn apply(&mut self, ty: Type<'db>, depth: u32) -> Type<'db> {
        if depth > MAX_TYPE_RECURSION {
            return ty;
        }
        let depth = depth + 1;

        // Shortcut the walk entirely when no substitution can apply.
        if !requires_specialization(
            self.db,
            ty,
            RequiresSpecializationOptions {
                ignore_pseudo_generic: true,
                ignore_self: false,
            },
        ) {
            return ty;
        }

        match ty {
            Type::Unbound
            | Type::Unknown
            | Type::Any
            | Type::None
            | Type::Never
            | Type::Module(_) => ty,
            Type::TypeVar(type_var) => self.apply_type_var(type_var, depth),
            Type::Union(_) => {
                let transformed = self.apply_union(ty, depth);
                self.reapply_alias(ty, transformed, depth)
            }
            Type::Class(class_type) => {
                let transformed = Type::Class(self.apply_class(class_type, depth));
                self.reapply_alias(ty, transformed, depth)
            }
            Type::Function(_) | Type::Overloaded(_) => {
                if self.pending_signatures.contains(&ty) {
                    return ty;
                }
                self.pending_signatures.push(ty);
                let transformed = match ty {
                    Type::Function(function) => self.apply_function(function, depth),
                    Type::Overloaded(overloaded) => self.apply_overloaded(overloaded, depth),
                    _ => unreachable!(),
                };
                self.pending_signatures.pop();
                self.reapply_alias(ty, transformed, depth)
            }
        }
    }

    /// Re-transform generic alias arguments so the alias metadata on the
    /// result reflects the substitution, preserving the alias name and
    /// scope.
    fn reapply_alias(
        &mut self,
        original: Type<'db>,
        transformed: Type<'db>,
        depth: u32,
    ) -> Type<'db> {
        let Some(alias) = original.type_alias_info(self.db) else {
            return transformed;
        };
        let Some(type_args) = alias.type_args(self.db) else {
            return transformed;
        };
        let mut changed = false;
        let new_args: Box<[Type<'db>]> = type_args
            .iter()
            .map(|arg| {
                let new_arg = self.apply(*arg, depth);
                changed |= new_arg != *arg;
                new_arg
            })
            .collect();
        if !changed && transformed == original {
            return transformed;
        }
        transformed.with_type_alias(self.db, alias.with_type_args(self.db, new_args))
    }

    fn apply_type_var(&mut self, type_var: TypeVarType<'db>, depth: u32) -> Type<'db> {
        let db = self.db;
        let instance = type_var.typevar(db);

        // A recursive type alias placeholder is never substituted itself;
        // only its generic arguments are.
        if instance.recursive_alias_name(db).is_some() {
            let Some(alias) = type_var.type_alias(db) else {
                return Type::TypeVar(type_var);
            };
            let Some(type_args) = alias.type_args(db) else {
                return Type::TypeVar(type_var);
            };
            let mut changed = false;
            let new_args: Box<[Type<'db>]> = type_args
                .iter()
                .map(|arg| {
                    let new_arg = self.apply(*arg, depth);
                    changed |= new_arg != *arg;
                    new_arg
                })
                .collect();
            if !changed {
                return Type::TypeVar(type_var);
            }
            return Type::TypeVar(
                type_var.with_type_alias(db, Some(alias.with_type_args(db, new_args))),
            );
        }

        let key = instance.key(db);
        if self.in_progress.contains(&key) {
            return Type::TypeVar(type_var);
        }

        if instance.is_param_spec(db) && type_var.access(db).is_none() {
            return match self.policy.transform_param_spec(db, type_var) {
                Some(value) => convert_param_spec_value_to_type(db, value),
                None => Type::TypeVar(type_var),
            };
        }

        let mut replacement = self
            .policy
            .transform_type_var(db, type_var)
            .unwrap_or(Type::TypeVar(type_var));
        if replacement != Type::TypeVar(type_var) {
            // Resolve chained substitutions, guarding against the variable
            // reappearing in its own replacement.
            self.in_progress.insert(key.clone());
            replacement = self.apply(replacement, depth);
            self.in_progress.remove(&key);
        }

        // A variadic that stood inside a union unpacks its solved tuple
        // back into union subtypes.
        if instance.is_variadic(db) && type_var.is_variadic_in_union(db) {
            if let Type::Class(class_type) = replacement {
                if class_type.class(db).is_tuple(db) {
                    if let Some(entries) = class_type.tuple_type_args(db) {
                        return UnionType::from_elements(db, entries.iter().map(|entry| entry.ty));
                    }
                }
            }
        }

        replacement
    }

    fn apply_union(&mut self, ty: Type<'db>, depth: u32) -> Type<'db> {
        let db = self.db;
        let transformed = map_subtypes(db, ty, |subtype| {
            let post = self.apply(subtype, depth);
            self.policy.transform_union_subtype(db, subtype, post)
        });
        // An emptied union would otherwise silently become `Never`; the
        // conservative answer for "every alternative vanished" is `Unknown`.
        if transformed.is_never() && !ty.is_never() {
            Type::Unknown
        } else {
            transformed
        }
    }

    fn apply_class(&mut self, class_type: ClassType<'db>, depth: u32) -> ClassType<'db> {
        let db = self.db;
        let class = class_type.class(db);
        if class.type_params(db).is_empty() && !class.is_special_builtin(db) {
            return class_type;
        }

        let mut changed = false;

        let new_type_args: Option<Box<[Type<'db>]>> = match class_type.type_args(db) {
            Some(type_args) => {
                let mapped: Box<[Type<'db>]> = type_args
                    .iter()
                    .map(|arg| {
                        let new_arg = self.apply(*arg, depth);
                        changed |= new_arg != *arg;
                        new_arg
                    })
                    .collect();
                Some(mapped)
            }
            None => {
                // Unspecialized: ask the policy about each declared
                // parameter; any hit forces a full specialization.
                let params = class.type_params(db);
                let mut any_replaced = false;
                let mapped: Box<[Type<'db>]> = params
                    .iter()
                    .map(|param| {
                        let replacement = self.apply(Type::TypeVar(*param), depth);
                        any_replaced |= replacement != Type::TypeVar(*param);
                        replacement
                    })
                    .collect();
                if any_replaced {
                    changed = true;
                    Some(mapped)
                } else {
                    None
                }
            }
        };

        let new_tuple_args: Option<Box<[TupleTypeArgument<'db>]>> =
            match class_type.tuple_type_args(db) {
                Some(entries) => {
                    let mut tuple_changed = false;
                    let mut new_entries: Vec<TupleTypeArgument<'db>> =
                        Vec::with_capacity(entries.len());
                    for entry in entries {
                        // A variadic entry may splice an entire solved tuple
                        // into place.
                        if let Type::TypeVar(entry_var) = entry.ty {
                            if entry_var.typevar(db).is_variadic(db)
                                && !self.in_progress.contains(&entry_var.key(db))
                            {
                                if let Some(spliced) =
                                    self.policy.transform_tuple_type_var(db, entry_var)
                                {
                                    tuple_changed = true;
                                    new_entries.extend(spliced.iter().copied());
                                    continue;
                                }
                            }
                        }
                        let new_ty = self.apply(entry.ty, depth);
                        if new_ty != entry.ty {
                            tuple_changed = true;
                            // A variadic replaced by another tuple splices
                            // its elements in place.
                            if matches!(entry.ty, Type::TypeVar(_)) {
                                if let Type::Class(inner) = new_ty {
                                    if inner.class(db).is_tuple(db) {
                                        if let Some(inner_entries) = inner.tuple_type_args(db) {
                                            new_entries.extend(inner_entries.iter().copied());
                                            continue;
                                        }
                                    }
                                }
                            }
                        }
                        new_entries.push(TupleTypeArgument {
                            ty: new_ty,
                            is_unbounded: entry.is_unbounded,
                        });
                    }
                    if tuple_changed {
                        changed = true;
                        Some(new_entries.into_boxed_slice())
                    } else {
                        None
                    }
                }
                None => None,
            };

        if !changed {
            return class_type;
        }

        if let Some(tuple_args) = new_tuple_args {
            return specialize_tuple_class(db, class_type, tuple_args);
        }
        class_type.with_type_args(db, new_type_args)
    }

    fn apply_function(&mut self, function: FunctionType<'db>, depth: u32) -> Type<'db> {
        let context_count = self.policy.signature_context_count().max(1);
        if context_count == 1 {
            return Type::Function(self.apply_signature(function, depth));
        }

        // One signature per solution alternative; the combined result is an
        // overload set.
        let mut results: Vec<FunctionType<'db>> = Vec::with_capacity(context_count);
        for index in 0..context_count {
            self.policy.set_active_signature_context(index);
            let transformed = self.apply_signature(function, depth);
            if !results.contains(&transformed) {
                results.push(transformed);
            }
        }
        self.policy.set_active_signature_context(0);

        if results.len() == 1 {
            Type::Function(results[0])
        } else {
            Type::Overloaded(OverloadedFunctionType::new(
                self.db,
                results.into_boxed_slice(),
            ))
        }
    }

    fn apply_overloaded(
        &mut self,
        overloaded: OverloadedFunctionType<'db>,
        depth: u32,
    ) -> Type<'db> {
        let db = self.db;
        let mut changed = false;
        let mut new_overloads: Vec<FunctionType<'db>> = Vec::new();
        for overload in overloaded.overloads(db).iter() {
            match self.apply_function(*overload, depth) {
                Type::Function(function) => {
                    changed |= function != *overload;
                    new_overloads.push(function);
                }
                // A single overload can expand into several when multiple
                // signature contexts are in play; flatten.
                Type::Overloaded(inner) => {
                    changed = true;
                    new_overloads.extend(inner.overloads(db).iter().copied());
                }
                _ => {}
            }
        }
        if !changed {
            return Type::Overloaded(overloaded);
        }
        Type::Overloaded(OverloadedFunctionType::new(
            db,
            new_overloads.into_boxed_slice(),
        ))
    }

    fn apply_signature(&mut self, original: FunctionType<'db>, depth: u32) -> FunctionType<'db> {
        let db = self.db;
        let mut function = original;

        // A trailing bound parameter specification substitutes first; it
        // may extend the parameter list.
        if let Some(param_spec) = function.param_spec(db) {
            if !self.in_progress.contains(&param_spec.key(db)) {
                if let Some(value) = self.policy.transform_param_spec(db, param_spec) {
                    function = apply_param_spec_value(db, function, param_spec, value);
                }
            }
        }

        // The `*args: P.args, **kwargs: P.kwargs` tail pattern.
        if let Some((tail_index, args_spec)) = function.param_spec_variadics_tail(db) {
            if !self.in_progress.contains(&args_spec.key(db)) {
                if let Some(value) = self.policy.transform_param_spec(db, args_spec) {
                    function = replace_param_spec_tail(db, function, tail_index, args_spec, value);
                }
            }
        }

        let mut changed = function != original;
        let parameters = function.parameters(db).clone();

        let mut new_param_types: Vec<Type<'db>> = Vec::with_capacity(parameters.len());
        let mut new_default_types: Vec<Option<Type<'db>>> = Vec::with_capacity(parameters.len());
        for index in 0..parameters.len() {
            let old_ty = function.effective_parameter_type(db, index);
            let new_ty = self.apply(old_ty, depth);
            changed |= new_ty != old_ty;
            new_param_types.push(new_ty);

            let old_default = function.effective_default_type(db, index);
            let new_default = old_default.map(|default| self.apply(default, depth));
            changed |= new_default != old_default;
            new_default_types.push(new_default);
        }

        let old_return = function.effective_return_type(db);
        let new_return = self.apply(old_return, depth);
        changed |= new_return != old_return;

        if !changed {
            return original;
        }

        // An unpacked variadic tuple in a `*args` position expands into
        // individual positional parameters.
        if let Some(expanded) = expand_unpacked_variadic(
            db,
            &parameters,
            &new_param_types,
            &new_default_types,
        ) {
            let (final_params, final_types, final_defaults) = expanded;
            return FunctionType::new(
                db,
                function.name(db).clone(),
                final_params,
                function.declared_return_type(db),
                function.inferred_return_type(db),
                function.flags(db),
                function.param_spec(db),
                Some(SpecializedSignature {
                    parameter_types: final_types,
                    parameter_default_types: Some(final_defaults),
                    return_type: new_return,
                }),
                function.type_alias(db),
                function.conditions(db).clone(),
            );
        }

        function.with_specialized(
            db,
            Some(SpecializedSignature {
                parameter_types: new_param_types.into_boxed_slice(),
                parameter_default_types: Some(new_default_types.into_boxed_slice()),
                return_type: new_return,
            }),
        )
    }
}

type ExpandedParameters<'db> = (
    Box<[Parameter<'db>]>,
    Box<[Type<'db>]>,
    Box<[Option<Type<'db>>]>,
);

/// Expand a `*args` parameter whose substituted type is an unpacked tuple
/// into individual positional-only parameters with synthesized names. Fixed
/// entries close with a position-only separator (and a keyword-only
/// separator when keyword parameters follow); an unbounded entry stays a
/// `*args` suffix and the position-only separator is swallowed.
fn expand_unpacked_variadic<'db>(
    db: &'db dyn Db,
    parameters: &[Parameter<'db>],
    new_param_types: &[Type<'db>],
    new_default_types: &[Option<Type<'db>>],
) -> Option<ExpandedParameters<'db>> {
    let variadic_index = parameters.iter().enumerate().find_map(|(index, param)| {
        if param.category != ParameterCategory::VariadicPositional {
            return None;
        }
        let Type::Class(inner) = new_param_types[index] else {
            return None;
        };
        if !inner.class(db).is_tuple(db) {
            return None;
        }
        let was_variadic_var = matches!(param.annotated_type, Type::TypeVar(type_var)
            if type_var.typevar(db).is_variadic(db));
        if !(inner.is_unpacked(db) || was_variadic_var) {
            return None;
        }
        inner.tuple_type_args(db).as_ref().map(|_| (index, inner))
    })?;
    let (index, inner) = variadic_index;
    let entries = inner
        .tuple_type_args(db)
        .as_ref()
        .expect("checked above")
        .clone();

    let mut final_params: Vec<Parameter<'db>> = Vec::with_capacity(parameters.len() + entries.len());
    let mut final_types: Vec<Type<'db>> = Vec::with_capacity(final_params.capacity());
    let mut final_defaults: Vec<Option<Type<'db>>> = Vec::with_capacity(final_params.capacity());

    let mut push = |param: Parameter<'db>, ty: Type<'db>, default: Option<Type<'db>>| {
        final_params.push(param);
        final_types.push(ty);
        final_defaults.push(default);
    };

    for before in 0..index {
        push(
            parameters[before].clone(),
            new_param_types[before],
            new_default_types[before],
        );
    }

    let mut emitted_unbounded_tail = false;
    let mut synthetic_index = 0usize;
    for entry in entries.iter() {
        if entry.is_unbounded {
            push(
                Parameter::variadic_positional(
                    parameters[index]
                        .name
                        .clone()
                        .unwrap_or_else(|| Name::new_static("args")),
                    entry.ty,
                ),
                entry.ty,
                None,
            );
            emitted_unbounded_tail = true;
        } else {
            let name = Name::new(format!("__p{synthetic_index}"));
            synthetic_index += 1;
            push(
                Parameter::positional(Some(name), entry.ty),
                entry.ty,
                None,
            );
        }
    }

    if !emitted_unbounded_tail {
        push(Parameter::position_only_separator(), Type::Never, None);
        let keyword_parameters_follow = parameters[index + 1..]
            .iter()
            .any(|param| param.category == ParameterCategory::Simple);
        if keyword_parameters_follow {
            push(Parameter::keyword_separator(), Type::Never, None);
        }
    }

    for after in index + 1..parameters.len() {
        push(
            parameters[after].clone(),
            new_param_types[after],
            new_default_types[after],
        );
    }

    drop(push);
    Some((
        final_params.into_boxed_slice(),
        final_types.into_boxed_slice(),
        final_defaults.into_boxed_slice(),
    ))
}

/// Apply a solved parameter-spec value to a function whose parameter list
/// is bound by that spec: the value's concrete parameters are appended and
/// the value's own trailing spec (if any) becomes the new binding. A free
/// spec value renames or keeps the binding.
fn apply_param_spec_value<'db>(
    db: &'db dyn Db,
    function: FunctionType<'db>,
    bound_spec: TypeVarType<'db>,
    value: FunctionType<'db>,
) -> FunctionType<'db> {
    let value_params = effective_param_spec_parameters(db, value);
    if value_params.is_empty() {
        if let Some(inner) = value.param_spec(db) {
            if inner.key(db) == bound_spec.key(db) {
                return function;
            }
            return function.with_parameters(db, function.parameters(db).clone(), Some(inner));
        }
    }
    let mut parameters: Vec<Parameter<'db>> = function.parameters(db).to_vec();
    parameters.extend(value_params.iter().cloned());
    function.with_parameters(db, parameters.into_boxed_slice(), value.param_spec(db))
}

/// Replace the `*args: P.args, **kwargs: P.kwargs` tail by the solved value
/// of `P`: concrete parameters are spliced in after the non-variadic prefix
/// and the value's own trailing spec (if any) re-emerges as a fresh
/// `args`/`kwargs` pair.
fn replace_param_spec_tail<'db>(
    db: &'db dyn Db,
    function: FunctionType<'db>,
    tail_index: usize,
    tail_spec: TypeVarType<'db>,
    value: FunctionType<'db>,
) -> FunctionType<'db> {
    let value_params = effective_param_spec_parameters(db, value);
    if value_params.is_empty() {
        if let Some(inner) = value.param_spec(db) {
            // The substitution is itself a free parameter specification:
            // identity, or a renamed tail.
            if inner.key(db) == tail_spec.key(db) {
                return function;
            }
            let mut parameters: Vec<Parameter<'db>> =
                function.parameters(db)[..tail_index].to_vec();
            push_param_spec_tail(db, &mut parameters, inner);
            return function.with_parameters(db, parameters.into_boxed_slice(), function.param_spec(db));
        }
    }

    let mut parameters: Vec<Parameter<'db>> = function.parameters(db)[..tail_index].to_vec();
    parameters.extend(value_params.iter().cloned());
    if let Some(inner) = value.param_spec(db) {
        push_param_spec_tail(db, &mut parameters, inner);
    }
    function.with_parameters(db, parameters.into_boxed_slice(), function.param_spec(db))
}

fn push_param_spec_tail<'db>(
    db: &'db dyn Db,
    parameters: &mut Vec<Parameter<'db>>,
    spec: TypeVarType<'db>,
) {
    use crate::types::ParamSpecAccess;
    let args_type = TypeVarType::new(
        db,
        spec.typevar(db),
        TypeFlags::INSTANCE,
        Some(ParamSpecAccess::Args),
        false,
        None,
    );
    let kwargs_type = TypeVarType::new(
        db,
        spec.typevar(db),
        TypeFlags::INSTANCE,
        Some(ParamSpecAccess::Kwargs),
        false,
        None,
    );
    parameters.push(Parameter::variadic_positional(
        Name::new_static("args"),
        Type::TypeVar(args_type),
    ));
    parameters.push(Parameter::variadic_keyword(
        Name::new_static("kwargs"),
        Type::TypeVar(kwargs_type),
    ));
}

/// The concrete parameters of a param-spec value; a single nameless
/// positional separator counts as an empty list.
fn effective_param_spec_parameters<'db>(
    db: &'db dyn Db,
    value: FunctionType<'db>,
) -> &'db [Parameter<'db>] {
    let parameters = value.parameters(db);
    if parameters.len() == 1 && parameters[0].is_position_only_separator() {
        &[]
    } else {
        parameters
    }
}

/// Apply a solved substitution context to `ty`.
pub fn apply_solved_type_vars<'db>(
    db: &'db dyn Db,
    ty: Type<'db>,
    context: &TypeVarContext<'db>,
    options: ApplyTypeVarOptions<'db>,
) -> Type<'db> {
    if context.is_empty()
        && !options.unknown_if_not_found
        && !options.eliminate_unsolved_in_unions
    {
        return ty;
    }
    let _span = tracing::trace_span!("apply_solved_type_vars").entered();
    let mut policy = ApplySolvedTypeVars {
        context,
        options,
        active: 0,
    };
    apply_type_var_transform(db, ty, &mut policy)
}

/// Specialize `ty` as seen through `context_class`: the class's applied
/// type arguments (or, for an unspecialized class, its own parameters) are
/// substituted for its declared parameters. This is how inherited
/// annotations are re-expressed in terms of a subclass's arguments.
pub fn partially_specialize_type<'db>(
    db: &'db dyn Db,
    ty: Type<'db>,
    context_class: ClassType<'db>,
) -> Type<'db> {
    let context = build_type_var_context_from_class(db, context_class);
    apply_solved_type_vars(db, ty, &context, ApplyTypeVarOptions::default())
}

/// Build a substitution context from a specialized class: declared
/// parameters map to the applied arguments, or to themselves when the class
/// is unspecialized.
pub fn build_type_var_context_from_class<'db>(
    db: &'db dyn Db,
    class_type: ClassType<'db>,
) -> TypeVarContext<'db> {
    let class = class_type.class(db);
    let params = class.type_params(db);

    let mut context = TypeVarContext::new(
        params
            .iter()
            .filter_map(|param| param.typevar(db).scope_id(db)),
    );

    let type_args = class_type.type_args(db);
    for (index, param) in params.iter().enumerate() {
        let argument = type_args
            .as_ref()
            .and_then(|args| args.get(index).copied())
            .unwrap_or(Type::TypeVar(*param));
        let instance = param.typevar(db);
        if instance.is_param_spec(db) {
            context.set_param_spec_type(db, *param, convert_type_to_param_spec_value(db, argument));
        } else if instance.is_variadic(db) {
            if let Type::Class(tuple_type) = argument {
                if let Some(entries) = tuple_type.tuple_type_args(db) {
                    context.set_tuple_type_var(db, *param, entries.clone());
                }
            }
            context.set_type_var_type(db, *param, Some(argument), None, true);
        } else {
            context.set_type_var_type(db, *param, Some(argument), None, true);
        }
    }
    context
}

/// The substitution policy that applies a solved [`TypeVarContext`].
struct ApplySolvedTypeVars<'a, 'db> {
    context: &'a TypeVarContext<'db>,
    options: ApplyTypeVarOptions<'db>,
    active: usize,
}

impl<'a, 'db> ApplySolvedTypeVars<'a, 'db> {
    fn in_scope(&self, db: &'db dyn Db, type_var: TypeVarType<'db>) -> bool {
        type_var
            .typevar(db)
            .scope_id(db)
            .is_some_and(|scope| self.context.has_solve_for_scope(scope))
    }

    /// Route an `Any`/`Unknown` replacement for an instantiable-position
    /// variable through `type[...]` when the `type` class is available.
    fn adjust_replacement(
        &self,
        db: &'db dyn Db,
        type_var: TypeVarType<'db>,
        replacement: Type<'db>,
    ) -> Type<'db> {
        if !replacement.is_any_or_unknown() {
            return replacement;
        }
        let Some(type_class) = self.options.type_class_type else {
            return replacement;
        };
        let flags = type_var.flags(db);
        if flags.contains(TypeFlags::INSTANTIABLE) && !flags.contains(TypeFlags::INSTANCE) {
            let wrapped = ClassType::instance(db, type_class)
                .with_type_args(db, Some(Box::from([replacement])));
            return Type::Class(wrapped);
        }
        replacement
    }
}

impl<'a, 'db> TypeVarTransform<'db> for ApplySolvedTypeVars<'a, 'db> {
    fn signature_context_count(&self) -> usize {
        self.context.signature_contexts().len()
    }

    fn set_active_signature_context(&mut self, index: usize) {
        self.active = index;
    }

    fn transform_type_var(
        &mut self,
        db: &'db dyn Db,
        type_var: TypeVarType<'db>,
    ) -> Option<Type<'db>> {
        if !self.in_scope(db, type_var) {
            return None;
        }
        let instance = type_var.typevar(db);
        let key = instance.key(db);
        let signature = self.context.signature_context(self.active);

        if let Some(TypeVarMapEntry::TypeVar { narrow, wide, .. }) = signature.get(&key) {
            let (narrow, wide) = (*narrow, *wide);
            let replacement = if self.options.use_narrow_bound_only {
                // Prefer the narrow bound, but a literal-preserving wide
                // bound is more useful than nothing.
                narrow.or_else(|| wide.filter(|wide| contains_literal_type(db, *wide)))
            } else {
                narrow.or(wide)
            };
            if let Some(replacement) = replacement {
                return Some(self.adjust_replacement(db, type_var, replacement));
            }
        }

        // In scope but unsolved.
        if self.options.unknown_if_not_found {
            if !self.options.use_unknown_over_default {
                if let Some(default) = instance.default_type(db) {
                    return Some(default);
                }
            }
            return Some(self.adjust_replacement(db, type_var, Type::Unknown));
        }
        None
    }

    fn transform_param_spec(
        &mut self,
        db: &'db dyn Db,
        type_var: TypeVarType<'db>,
    ) -> Option<FunctionType<'db>> {
        if !self.in_scope(db, type_var) {
            return None;
        }
        let instance = type_var.typevar(db);
        let signature = self.context.signature_context(self.active);
        if let Some(value) = signature.get_param_spec_type(&instance.key(db)) {
            return Some(value);
        }
        if self.options.unknown_if_not_found {
            if !self.options.use_unknown_over_default {
                if let Some(default) = instance.default_type(db) {
                    return Some(convert_type_to_param_spec_value(db, default));
                }
            }
            return Some(convert_type_to_param_spec_value(db, Type::Unknown));
        }
        None
    }

    fn transform_tuple_type_var(
        &mut self,
        db: &'db dyn Db,
        type_var: TypeVarType<'db>,
    ) -> Option<Box<[TupleTypeArgument<'db>]>> {
        if !self.in_scope(db, type_var) {
            return None;
        }
        self.context
            .signature_context(self.active)
            .get_tuple_type_var(&type_var.typevar(db).key(db))
            .map(Box::from)
    }

    fn transform_union_subtype(
        &mut self,
        db: &'db dyn Db,
        pre_transform: Type<'db>,
        post_transform: Type<'db>,
    ) -> Option<Type<'db>> {
        if self.options.eliminate_unsolved_in_unions {
            if let Type::TypeVar(type_var) = pre_transform {
                if self.in_scope(db, type_var)
                    && type_var.typevar(db).recursive_alias_name(db).is_none()
                    && (post_transform == pre_transform || post_transform.is_unknown())
                {
                    return None;
                }
            }
        }
        Some(post_transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::setup_db;
    use crate::types::tests::{class, generic_class, instance_of, typevar};
    use crate::types::tuple::tests::tuple_class;
    use crate::types::{
        SignatureContext, TypeVarInstance, TypeVarKind, TypeVarScopeId, TypeVarVariance,
    };
    use crate::Name;

    fn plain_instance<'db>(
        db: &'db crate::db::tests::TestDb,
        name: &str,
        kind: TypeVarKind,
        scope: u32,
        default: Option<Type<'db>>,
    ) -> TypeVarType<'db> {
        TypeVarType::of(
            db,
            TypeVarInstance::new(
                db,
                Name::new(name),
                Some(TypeVarScopeId(scope)),
                kind,
                TypeVarVariance::Invariant,
                None,
                default,
                None,
                false,
            ),
        )
    }

    fn tuple_of<'db>(
        db: &'db crate::db::tests::TestDb,
        entries: Box<[TupleTypeArgument<'db>]>,
    ) -> ClassType<'db> {
        specialize_tuple_class(db, ClassType::instance(db, tuple_class(db)), entries)
    }

    #[test]
    fn empty_context_application_is_identity() {
        let db = setup_db();
        let t = typevar(&db, "T", 1);
        let int = instance_of(&db, class(&db, "int", &[]));
        let list = generic_class(&db, "list", &[t], &[]);
        let list_t = Type::Class(
            ClassType::instance(&db, list)
                .with_type_args(&db, Some(Box::from([Type::TypeVar(t)]))),
        );

        let context = TypeVarContext::default();
        for ty in [Type::TypeVar(t), int, list_t, Type::Any] {
            assert_eq!(
                apply_solved_type_vars(&db, ty, &context, ApplyTypeVarOptions::default()),
                ty
            );
        }
    }

    #[test]
    fn applies_substitution_and_reaches_a_fixpoint() {
        let db = setup_db();
        let t = typevar(&db, "T", 1);
        let u = typevar(&db, "U", 1);
        let int = instance_of(&db, class(&db, "int", &[]));
        let string = instance_of(&db, class(&db, "str", &[]));

        // (x: T, y: U) -> tuple[T, U]
        let return_type = Type::Class(tuple_of(
            &db,
            Box::from([
                TupleTypeArgument::new(Type::TypeVar(t)),
                TupleTypeArgument::new(Type::TypeVar(u)),
            ]),
        ));
        let function = Type::Function(FunctionType::simple(
            &db,
            Name::new_static("f"),
            Box::from([
                Parameter::positional(Some(Name::new_static("x")), Type::TypeVar(t)),
                Parameter::positional(Some(Name::new_static("y")), Type::TypeVar(u)),
            ]),
            Some(return_type),
        ));

        let mut context = TypeVarContext::new([TypeVarScopeId(1)]);
        context.set_type_var_type(&db, t, Some(int), None, true);
        context.set_type_var_type(&db, u, Some(string), None, true);

        let applied = apply_solved_type_vars(&db, function, &context, ApplyTypeVarOptions::default());
        let applied_fn = applied.expect_function();
        assert_eq!(applied_fn.effective_parameter_type(&db, 0), int);
        assert_eq!(applied_fn.effective_parameter_type(&db, 1), string);
        let return_tuple = applied_fn.effective_return_type(&db).expect_class();
        let entries = return_tuple.tuple_type_args(&db).as_deref().unwrap();
        assert_eq!(entries[0].ty, int);
        assert_eq!(entries[1].ty, string);

        // Re-applying the same (closed) context changes nothing.
        assert_eq!(
            apply_solved_type_vars(&db, applied, &context, ApplyTypeVarOptions::default()),
            applied
        );
        // And the result is fully solved.
        assert!(!requires_specialization(
            &db,
            applied,
            RequiresSpecializationOptions::default()
        ));
    }

    #[test]
    fn chained_substitutions_resolve_transitively() {
        let db = setup_db();
        let t = typevar(&db, "T", 1);
        let u = typevar(&db, "U", 1);
        let int = instance_of(&db, class(&db, "int", &[]));

        let mut context = TypeVarContext::new([TypeVarScopeId(1)]);
        context.set_type_var_type(&db, t, Some(Type::TypeVar(u)), None, true);
        context.set_type_var_type(&db, u, Some(int), None, true);

        assert_eq!(
            apply_solved_type_vars(
                &db,
                Type::TypeVar(t),
                &context,
                ApplyTypeVarOptions::default()
            ),
            int
        );
    }

    #[test]
    fn self_referential_substitution_is_cut() {
        let db = setup_db();
        let t = typevar(&db, "T", 1);
        let list = generic_class(&db, "list", &[typevar(&db, "E", 40)], &[]);
        let list_t = Type::Class(
            ClassType::instance(&db, list)
                .with_type_args(&db, Some(Box::from([Type::TypeVar(t)]))),
        );

        let mut context = TypeVarContext::new([TypeVarScopeId(1)]);
        context.set_type_var_type(&db, t, Some(list_t), None, true);

        // T -> list[T]: the inner occurrence stays a type variable rather
        // than expanding forever.
        assert_eq!(
            apply_solved_type_vars(
                &db,
                Type::TypeVar(t),
                &context,
                ApplyTypeVarOptions::default()
            ),
            list_t
        );
    }

    #[test]
    fn variadic_solution_unpacks_into_positional_parameters() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let string = instance_of(&db, class(&db, "str", &[]));
        let ts = plain_instance(&db, "Ts", TypeVarKind::TypeVarTuple, 1, None);

        // (*args: *Ts) -> tuple[*Ts]
        let return_type = Type::Class(tuple_of(
            &db,
            Box::from([TupleTypeArgument::new(Type::TypeVar(ts))]),
        ));
        let function = Type::Function(FunctionType::simple(
            &db,
            Name::new_static("f"),
            Box::from([Parameter::variadic_positional(
                Name::new_static("args"),
                Type::TypeVar(ts),
            )]),
            Some(return_type),
        ));

        let solved_entries: Box<[TupleTypeArgument]> = Box::from([
            TupleTypeArgument::new(int),
            TupleTypeArgument::new(string),
        ]);
        let solved_tuple = tuple_of(&db, solved_entries.clone()).with_unpacked(&db, true);

        let mut context = TypeVarContext::new([TypeVarScopeId(1)]);
        context.set_tuple_type_var(&db, ts, solved_entries);
        context.set_type_var_type(&db, ts, Some(Type::Class(solved_tuple)), None, true);

        let applied = apply_solved_type_vars(&db, function, &context, ApplyTypeVarOptions::default());
        let applied_fn = applied.expect_function();

        let parameters = applied_fn.parameters(&db);
        assert_eq!(parameters.len(), 3);
        assert_eq!(parameters[0].category, ParameterCategory::Positional);
        assert_eq!(parameters[0].name.as_deref(), Some("__p0"));
        assert_eq!(applied_fn.effective_parameter_type(&db, 0), int);
        assert_eq!(parameters[1].name.as_deref(), Some("__p1"));
        assert_eq!(applied_fn.effective_parameter_type(&db, 1), string);
        assert!(parameters[2].is_position_only_separator());

        let return_tuple = applied_fn.effective_return_type(&db).expect_class();
        let entries = return_tuple.tuple_type_args(&db).as_deref().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ty, int);
        assert_eq!(entries[1].ty, string);
    }

    #[test]
    fn param_spec_tail_is_replaced_by_its_solution() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let string = instance_of(&db, class(&db, "str", &[]));
        let p = plain_instance(&db, "P", TypeVarKind::ParamSpec, 1, None);

        let function = Type::Function(FunctionType::simple(
            &db,
            Name::new_static("f"),
            Box::from([
                Parameter::simple(Name::new_static("x"), int),
                Parameter::variadic_positional(
                    Name::new_static("args"),
                    Type::TypeVar(TypeVarType::new(
                        &db,
                        p.typevar(&db),
                        TypeFlags::INSTANCE,
                        Some(crate::types::ParamSpecAccess::Args),
                        false,
                        None,
                    )),
                ),
                Parameter::variadic_keyword(
                    Name::new_static("kwargs"),
                    Type::TypeVar(TypeVarType::new(
                        &db,
                        p.typevar(&db),
                        TypeFlags::INSTANCE,
                        Some(crate::types::ParamSpecAccess::Kwargs),
                        false,
                        None,
                    )),
                ),
            ]),
            Some(int),
        ));

        let value = convert_type_to_param_spec_value(
            &db,
            Type::Function(FunctionType::simple(
                &db,
                Name::default(),
                Box::from([
                    Parameter::simple(Name::new_static("a"), string),
                    Parameter::simple(Name::new_static("b"), int),
                ]),
                None,
            )),
        );

        let mut context = TypeVarContext::new([TypeVarScopeId(1)]);
        context.set_param_spec_type(&db, p, value);

        let applied = apply_solved_type_vars(&db, function, &context, ApplyTypeVarOptions::default());
        let applied_fn = applied.expect_function();
        let parameters = applied_fn.parameters(&db);
        assert_eq!(parameters.len(), 3);
        assert_eq!(parameters[0].name.as_deref(), Some("x"));
        assert_eq!(parameters[1].name.as_deref(), Some("a"));
        assert_eq!(applied_fn.effective_parameter_type(&db, 1), string);
        assert_eq!(parameters[2].name.as_deref(), Some("b"));
        assert!(applied_fn.param_spec_variadics_tail(&db).is_none());
    }

    #[test]
    fn free_param_spec_solution_renames_the_tail() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let p = plain_instance(&db, "P", TypeVarKind::ParamSpec, 1, None);
        let q = plain_instance(&db, "Q", TypeVarKind::ParamSpec, 2, None);

        let function = {
            let mut parameters = vec![Parameter::simple(Name::new_static("x"), int)];
            push_param_spec_tail(&db, &mut parameters, p);
            Type::Function(FunctionType::simple(
                &db,
                Name::new_static("f"),
                parameters.into_boxed_slice(),
                Some(int),
            ))
        };

        let mut context = TypeVarContext::new([TypeVarScopeId(1)]);
        context.set_param_spec_type(&db, p, convert_type_to_param_spec_value(&db, Type::TypeVar(q)));

        let applied = apply_solved_type_vars(&db, function, &context, ApplyTypeVarOptions::default());
        let applied_fn = applied.expect_function();
        let (_, tail_spec) = applied_fn
            .param_spec_variadics_tail(&db)
            .expect("tail is preserved under a free param-spec solution");
        assert_eq!(tail_spec.typevar(&db), q.typevar(&db));
    }

    #[test]
    fn unknown_if_not_found_prefers_the_declared_default() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let with_default = plain_instance(&db, "T", TypeVarKind::Plain, 1, Some(int));
        let context = TypeVarContext::new([TypeVarScopeId(1)]);

        assert_eq!(
            apply_solved_type_vars(
                &db,
                Type::TypeVar(with_default),
                &context,
                ApplyTypeVarOptions {
                    unknown_if_not_found: true,
                    ..ApplyTypeVarOptions::default()
                }
            ),
            int
        );
        assert_eq!(
            apply_solved_type_vars(
                &db,
                Type::TypeVar(with_default),
                &context,
                ApplyTypeVarOptions {
                    unknown_if_not_found: true,
                    use_unknown_over_default: true,
                    ..ApplyTypeVarOptions::default()
                }
            ),
            Type::Unknown
        );
        // Without the option the variable stays put.
        assert_eq!(
            apply_solved_type_vars(
                &db,
                Type::TypeVar(with_default),
                &context,
                ApplyTypeVarOptions::default()
            ),
            Type::TypeVar(with_default)
        );
    }

    #[test]
    fn unsolved_variables_are_eliminated_from_unions() {
        let db = setup_db();
        let t = typevar(&db, "T", 1);
        let int = instance_of(&db, class(&db, "int", &[]));
        let union = UnionType::from_elements(&db, [Type::TypeVar(t), int]);

        let context = TypeVarContext::new([TypeVarScopeId(1)]);
        let options = ApplyTypeVarOptions {
            eliminate_unsolved_in_unions: true,
            ..ApplyTypeVarOptions::default()
        };
        assert_eq!(apply_solved_type_vars(&db, union, &context, options), int);

        // An out-of-scope variable survives.
        let foreign = typevar(&db, "F", 2);
        let union = UnionType::from_elements(&db, [Type::TypeVar(foreign), int]);
        assert_eq!(
            apply_solved_type_vars(&db, union, &context, options),
            union
        );
    }

    #[test]
    fn instantiable_positions_wrap_unknown_in_type() {
        let db = setup_db();
        let type_class = generic_class(&db, "type", &[typevar(&db, "_C", 91)], &[]);
        let t = typevar(&db, "T", 1).with_flags(&db, TypeFlags::INSTANTIABLE);
        let context = TypeVarContext::new([TypeVarScopeId(1)]);

        let applied = apply_solved_type_vars(
            &db,
            Type::TypeVar(t),
            &context,
            ApplyTypeVarOptions {
                unknown_if_not_found: true,
                type_class_type: Some(type_class),
                ..ApplyTypeVarOptions::default()
            },
        );
        let wrapped = applied.expect_class();
        assert_eq!(wrapped.class(&db), type_class);
        assert_eq!(
            wrapped.type_args(&db).as_deref(),
            Some(&[Type::Unknown][..])
        );
    }

    #[test]
    fn recursive_alias_placeholders_are_not_substituted() {
        let db = setup_db();
        let int = instance_of(&db, class(&db, "int", &[]));
        let placeholder = TypeVarType::of(
            &db,
            TypeVarInstance::new(
                &db,
                Name::new_static("Json"),
                Some(TypeVarScopeId(1)),
                TypeVarKind::Plain,
                TypeVarVariance::Invariant,
                Some(int),
                None,
                Some(Name::new_static("Json")),
                false,
            ),
        );

        let mut context = TypeVarContext::wildcard();
        context.set_type_var_type(&db, placeholder, Some(int), None, true);

        assert_eq!(
            apply_solved_type_vars(
                &db,
                Type::TypeVar(placeholder),
                &context,
                ApplyTypeVarOptions::default()
            ),
            Type::TypeVar(placeholder)
        );
        assert!(!requires_specialization(
            &db,
            Type::TypeVar(placeholder),
            RequiresSpecializationOptions::default()
        ));
    }

    #[test]
    fn multiple_signature_contexts_expand_to_an_overload() {
        let db = setup_db();
        let t = typevar(&db, "T", 1);
        let int = instance_of(&db, class(&db, "int", &[]));
        let string = instance_of(&db, class(&db, "str", &[]));

        let function = Type::Function(FunctionType::simple(
            &db,
            Name::new_static("f"),
            Box::from([Parameter::simple(Name::new_static("x"), Type::TypeVar(t))]),
            Some(Type::TypeVar(t)),
        ));

        let mut context = TypeVarContext::new([TypeVarScopeId(1)]);
        context.set_type_var_type(&db, t, Some(int), None, true);
        let mut second = SignatureContext::new();
        second.set_type_var_type(&db, t, Some(string), None, true);
        context.add_signature_context(second);

        let applied = apply_solved_type_vars(&db, function, &context, ApplyTypeVarOptions::default());
        let Type::Overloaded(overloaded) = applied else {
            panic!("expected one signature per context, combined into an overload");
        };
        let overloads = overloaded.overloads(&db);
        assert_eq!(overloads.len(), 2);
        assert_eq!(overloads[0].effective_parameter_type(&db, 0), int);
        assert_eq!(overloads[1].effective_parameter_type(&db, 0), string);
    }

    #[test]
    fn partial_specialization_rewrites_inherited_annotations() {
        let db = setup_db();
        let t = typevar(&db, "T", 1);
        let int = instance_of(&db, class(&db, "int", &[]));
        let string = instance_of(&db, class(&db, "str", &[]));

        let b = generic_class(&db, "B", &[t], &[]);
        let b_str = ClassType::of(&db, b).with_type_args(&db, Some(Box::from([string])));

        // A `dict[T, int]` annotation inherited from `B[T]`, seen through
        // `B[str]`, becomes `dict[str, int]`.
        let k = typevar(&db, "K", 50);
        let v = typevar(&db, "V", 50);
        let dict = generic_class(&db, "dict", &[k, v], &[]);
        let annotation = Type::Class(
            ClassType::instance(&db, dict)
                .with_type_args(&db, Some(Box::from([Type::TypeVar(t), int]))),
        );

        let specialized = partially_specialize_type(&db, annotation, b_str).expect_class();
        assert_eq!(
            specialized.type_args(&db).as_deref(),
            Some(&[string, int][..])
        );
    }
}
