//! Method resolution order linearization.
//!
//! Implements the C3-merge algorithm. Unlike the runtime, an inconsistent
//! hierarchy does not raise: linearization keeps consuming heads (always
//! from the lowest-indexed non-empty list, so the fallback is deterministic)
//! and reports the inconsistency through [`MroError`], which carries the
//! complete best-effort MRO. Member lookup keeps working either way.

use std::collections::VecDeque;
use std::ops::Deref;

use itertools::Either;

use crate::types::class::{Class, ClassType, KnownClass};
use crate::types::class_base::ClassBase;
use crate::types::specialize::partially_specialize_type;
use crate::types::Type;
use crate::Db;

/// The method resolution order of a class: a linearized sequence of bases
/// starting with the class itself.
#[derive(PartialEq, Eq, Default, Clone, Debug, salsa::Update)]
pub struct Mro<'db>(Vec<ClassBase<'db>>);

impl<'db> Mro<'db> {
    pub fn iter(&self) -> std::slice::Iter<'_, ClassBase<'db>> {
        self.0.iter()
    }
}

impl<'db> Deref for Mro<'db> {
    type Target = [ClassBase<'db>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'db> From<Vec<ClassBase<'db>>> for Mro<'db> {
    fn from(value: Vec<ClassBase<'db>>) -> Self {
        Self(value)
    }
}

impl<'db> FromIterator<ClassBase<'db>> for Mro<'db> {
    fn from_iter<T: IntoIterator<Item = ClassBase<'db>>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a, 'db> IntoIterator for &'a Mro<'db> {
    type IntoIter = std::slice::Iter<'a, ClassBase<'db>>;
    type Item = &'a ClassBase<'db>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, salsa::Update)]
pub enum MroError<'db> {
    /// The class's bases admit no consistent linearization. The payload is
    /// the deterministic best-effort MRO produced by continuing the merge
    /// anyway; it still starts with the class itself.
    #[error("bases cannot be linearized into a consistent method resolution order")]
    UnresolvableMro { fallback: Mro<'db> },
}

impl<'db> MroError<'db> {
    pub fn fallback(&self) -> &Mro<'db> {
        match self {
            MroError::UnresolvableMro { fallback } => fallback,
        }
    }
}

/// Resolve the MRO of `class`, computed at most once per class.
///
/// Base classes must form a DAG; the binder that constructs class records is
/// responsible for rejecting cyclic inheritance before types are built.
#[salsa::tracked(return_ref)]
pub(crate) fn try_mro<'db>(
    db: &'db dyn Db,
    class: Class<'db>,
) -> Result<Mro<'db>, MroError<'db>> {
    let _span = tracing::trace_span!("try_mro", class = %class.name(db)).entered();

    let head = ClassBase::Class(class.self_specialization(db));
    let bases = filtered_bases(db, class);

    if bases.is_empty() {
        return Ok(Mro::from(vec![head]));
    }

    let mut sequences: Vec<VecDeque<ClassBase<'db>>> = Vec::with_capacity(bases.len() + 2);
    sequences.push(VecDeque::from([head]));
    for base in &bases {
        let linearized = match base {
            ClassBase::Class(base_class) => Either::Right(
                base_class
                    .class(db)
                    .mro(db)
                    .iter()
                    .map(|entry| specialize_entry(db, *entry, *base_class)),
            ),
            // A dynamic base contributes only itself; there is nothing to
            // linearize behind it.
            dynamic => Either::Left(std::iter::once(*dynamic)),
        };
        sequences.push(linearized.collect());
    }
    sequences.push(bases.iter().copied().collect());

    let (mro, ok) = c3_merge(db, sequences);
    if ok {
        Ok(mro)
    } else {
        Err(MroError::UnresolvableMro { fallback: mro })
    }
}

/// Resolve the direct bases of `class` into MRO entries.
///
/// A `Generic` base is dropped when the class is a protocol or when a later
/// base carries explicit type arguments; either way the variance information
/// `Generic[...]` would contribute is already declared elsewhere. A base
/// that is not a valid class base at all degrades to `Unknown` rather than
/// poisoning the whole computation.
fn filtered_bases<'db>(db: &'db dyn Db, class: Class<'db>) -> Vec<ClassBase<'db>> {
    let bases = class.bases(db);
    let mut filtered = Vec::with_capacity(bases.len());
    for (index, base) in bases.iter().enumerate() {
        let entry = ClassBase::try_from_type(*base).unwrap_or(ClassBase::Unknown);
        if let ClassBase::Class(base_class) = entry {
            if base_class.is_known(db, KnownClass::Generic) {
                let later_base_is_specialized = bases[index + 1..].iter().any(|later| {
                    matches!(later, Type::Class(later_class)
                        if later_class.type_args(db).is_some())
                });
                if class.is_protocol(db) || later_base_is_specialized {
                    continue;
                }
            }
        }
        filtered.push(entry);
    }
    filtered
}

/// Rewrite one entry of a base's MRO so that it is expressed in terms of the
/// subclass's view of that base: the base's applied type arguments are
/// substituted for the base's declared type parameters.
fn specialize_entry<'db>(
    db: &'db dyn Db,
    entry: ClassBase<'db>,
    base: ClassType<'db>,
) -> ClassBase<'db> {
    let ClassBase::Class(entry_class) = entry else {
        return entry;
    };
    if base.type_args(db).is_none() {
        return entry;
    }
    match partially_specialize_type(db, Type::Class(entry_class), base) {
        Type::Class(specialized) => ClassBase::Class(specialized),
        _ => ClassBase::Unknown,
    }
}

/// The C3-merge: repeatedly pick a head that appears in no other list's
/// tail, append it, and remove it from every head position.
///
/// When no valid head exists the hierarchy is inconsistent; we consume the
/// head of the lowest-indexed non-empty list instead and keep going, so the
/// result is always a complete linearization. The boolean reports whether
/// the merge stayed consistent throughout.
fn c3_merge<'db>(
    db: &'db dyn Db,
    mut sequences: Vec<VecDeque<ClassBase<'db>>>,
) -> (Mro<'db>, bool) {
    // Most MROs aren't that long...
    let mut mro = Vec::<ClassBase<'db>>::with_capacity(8);
    let mut ok = true;

    loop {
        sequences.retain(|sequence| !sequence.is_empty());

        if sequences.is_empty() {
            return (Mro::from(mro), ok);
        }

        // A candidate that still exists "deeper down" in some hierarchy
        // must not be emitted yet.
        let valid_head = sequences.iter().find_map(|outer_sequence| {
            let candidate = outer_sequence[0];

            let not_in_tail = sequences.iter().all(|sequence| {
                sequence
                    .iter()
                    .skip(1)
                    .all(|base| !base.is_same_entry(db, candidate))
            });

            not_in_tail.then_some(candidate)
        });

        let entry = match valid_head {
            Some(entry) => entry,
            None => {
                ok = false;
                sequences[0][0]
            }
        };

        // The fallback path can surface an entry the merge already emitted;
        // an MRO never repeats a class.
        if !mro.iter().any(|existing| existing.is_same_entry(db, entry)) {
            mro.push(entry);
        }

        for sequence in &mut sequences {
            if sequence[0].is_same_entry(db, entry) {
                sequence.pop_front();
            }
        }
    }
}

/// Iterator over the (best-effort) MRO of a class.
pub struct MroIterator<'db> {
    inner: std::slice::Iter<'db, ClassBase<'db>>,
}

impl<'db> MroIterator<'db> {
    pub(crate) fn new(db: &'db dyn Db, class: Class<'db>) -> Self {
        Self {
            inner: class.mro(db).iter(),
        }
    }
}

impl<'db> Iterator for MroIterator<'db> {
    type Item = ClassBase<'db>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().copied()
    }
}

impl std::iter::FusedIterator for MroIterator<'_> {}
