//! Member lookup through a class's method resolution order.

use bitflags::bitflags;

use crate::symbol::{Declaration, DeclarationKind, Symbol, SymbolFlags};
use crate::types::class_base::ClassBase;
use crate::types::specialize::partially_specialize_type;
use crate::types::{ClassType, KnownClass, Type};
use crate::{Db, FxOrderMap, Name};

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MemberLookupFlags: u8 {
        /// Start the search at the first base class rather than the class
        /// itself.
        const SKIP_ORIGINAL_CLASS = 1 << 0;
        /// Search only the class itself.
        const SKIP_BASE_CLASSES = 1 << 1;
        /// Ignore the root `object` class.
        const SKIP_OBJECT_BASE_CLASS = 1 << 2;
        /// Ignore the `type` class.
        const SKIP_TYPE_BASE_CLASS = 1 << 3;
        /// Consider only members that live on the class object.
        const SKIP_INSTANCE_MEMBERS = 1 << 4;
        /// Skip symbols without a declared type; the eventual match records
        /// that untyped shadowing occurred.
        const DECLARED_TYPES_ONLY = 1 << 5;
    }
}

/// A member found by walking the MRO.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassMember<'db> {
    pub symbol: Symbol<'db>,

    /// The MRO entry that provided the member, partially specialized
    /// against the class the lookup started from; `Unknown`/`Any` when the
    /// entry was dynamic.
    pub class_type: Type<'db>,

    pub is_instance_member: bool,
    pub is_class_member: bool,
    pub is_class_var: bool,
    pub is_type_declared: bool,

    /// An untyped declaration of the same name was skipped in a subclass
    /// before this (typed) member was found; the checker can warn about
    /// the shadowing.
    pub skipped_undeclared_type: bool,
}

impl<'db> ClassMember<'db> {
    /// The member's declared type, re-expressed in terms of the providing
    /// class's type arguments.
    pub fn declared_type(&self, db: &'db dyn Db) -> Option<Type<'db>> {
        let declared = self.symbol.declared_type()?;
        match self.class_type {
            Type::Class(class_type) => Some(partially_specialize_type(db, declared, class_type)),
            _ => Some(declared),
        }
    }
}

/// Search the MRO of `class_type` for a member named `name`.
///
/// Each MRO entry is partially specialized against `class_type` before it
/// is reported, so inherited annotations are seen with the subclass's type
/// arguments. A dynamic (`Any`/`Unknown`) entry yields a synthetic member
/// of type `Unknown`.
pub fn lookup_class_member<'db>(
    db: &'db dyn Db,
    class_type: ClassType<'db>,
    name: &str,
    flags: MemberLookupFlags,
) -> Option<ClassMember<'db>> {
    let _span = tracing::trace_span!("lookup_class_member", member = name).entered();

    let class = class_type.class(db);
    let mut skipped_undeclared_type = false;

    for (index, entry) in class.mro(db).iter().enumerate() {
        if index == 0 && flags.contains(MemberLookupFlags::SKIP_ORIGINAL_CLASS) {
            continue;
        }
        if index > 0 && flags.contains(MemberLookupFlags::SKIP_BASE_CLASSES) {
            break;
        }

        let entry_class = match entry {
            ClassBase::Class(entry_class) => *entry_class,
            // The caller decides whether a dynamic ancestor suppresses
            // "unknown member" diagnostics; we just report what we know.
            ClassBase::Any | ClassBase::Unknown => {
                return Some(synthesize_dynamic_member(Type::from(*entry)));
            }
        };
        let template = entry_class.class(db);
        if flags.contains(MemberLookupFlags::SKIP_OBJECT_BASE_CLASS)
            && template.is_known(db, KnownClass::Object)
        {
            continue;
        }
        if flags.contains(MemberLookupFlags::SKIP_TYPE_BASE_CLASS)
            && template.is_known(db, KnownClass::Type)
        {
            continue;
        }

        let Some(symbol) = template.fields(db).symbol(name) else {
            continue;
        };

        let mut is_instance_member = symbol.is_instance_member();
        let is_class_member = symbol.is_class_member();

        // Dataclass and typed-dict class-body declarations describe the
        // shape of instances, so their typed fields bind as instance
        // members.
        if (template.is_dataclass(db) || template.is_typed_dict(db))
            && is_class_member
            && symbol.has_typed_declarations()
        {
            is_instance_member = true;
        }

        if flags.contains(MemberLookupFlags::SKIP_INSTANCE_MEMBERS) && !is_class_member {
            continue;
        }

        if flags.contains(MemberLookupFlags::DECLARED_TYPES_ONLY)
            && !symbol.has_typed_declarations()
        {
            skipped_undeclared_type = true;
            continue;
        }

        let specialized_entry = if index == 0 {
            Type::Class(class_type)
        } else {
            partially_specialize_type(db, Type::Class(entry_class), class_type)
        };

        return Some(ClassMember {
            symbol: symbol.clone(),
            class_type: specialized_entry,
            is_instance_member,
            is_class_member,
            is_class_var: symbol.is_class_var(),
            is_type_declared: symbol.has_typed_declarations(),
            skipped_undeclared_type,
        });
    }

    None
}

fn synthesize_dynamic_member<'db>(entry: Type<'db>) -> ClassMember<'db> {
    ClassMember {
        symbol: Symbol::new(
            SymbolFlags::CLASS_MEMBER | SymbolFlags::INSTANCE_MEMBER,
            [Declaration::new(DeclarationKind::Variable, Some(Type::Unknown))],
        ),
        class_type: entry,
        is_instance_member: true,
        is_class_member: true,
        is_class_var: false,
        is_type_declared: true,
        skipped_undeclared_type: false,
    }
}

/// Collect every *typed* field declared anywhere in the MRO. Ancestors are
/// visited first so a descendant's declaration overrides an ancestor's.
pub fn class_fields_recursive<'db>(
    db: &'db dyn Db,
    class_type: ClassType<'db>,
) -> Vec<(Name, ClassMember<'db>)> {
    let class = class_type.class(db);
    let mut members: FxOrderMap<Name, ClassMember<'db>> = FxOrderMap::default();

    for entry in class.mro(db).iter().rev() {
        let ClassBase::Class(entry_class) = entry else {
            continue;
        };
        let specialized_entry = if entry_class.class(db) == class {
            Type::Class(class_type)
        } else {
            partially_specialize_type(db, Type::Class(*entry_class), class_type)
        };
        for (name, symbol) in entry_class.class(db).fields(db).iter() {
            if !symbol.has_typed_declarations() {
                continue;
            }
            members.insert(
                name.clone(),
                ClassMember {
                    symbol: symbol.clone(),
                    class_type: specialized_entry,
                    is_instance_member: symbol.is_instance_member(),
                    is_class_member: symbol.is_class_member(),
                    is_class_var: symbol.is_class_var(),
                    is_type_declared: true,
                    skipped_undeclared_type: false,
                },
            );
        }
    }

    members.into_iter().collect()
}
