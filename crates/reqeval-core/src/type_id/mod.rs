//! Stable type identities without runtime type information.
//!
//! Every type that participates in request evaluation is listed in a *zone*:
//! a closed, ordered table of types sharing one local id space. A type's
//! identity is the pair (zone id, local id), fixed by declaration order and
//! available as an associated constant, so reading it costs nothing at
//! runtime and never consults `std::any`.
//!
//! Zones are declared with [`define_type_zone!`](crate::define_type_zone):
//!
//! ```
//! use reqeval_core::define_type_zone;
//! use reqeval_core::type_id::{identity_of, ZoneId};
//!
//! pub struct Parse;
//! pub struct Resolve;
//!
//! define_type_zone! {
//!     /// Requests of the front end
//!     pub static FRONTEND_ZONE = zone(ZoneId::new(7), "Frontend") {
//!         Parse => Parse,
//!         Resolve => Resolve,
//!     }
//! }
//!
//! assert_eq!(identity_of::<Parse>().local_id().as_u8(), 0);
//! assert_eq!(identity_of::<Resolve>().local_id().as_u8(), 1);
//! ```

mod primitive;
mod registry;

pub use primitive::PRIMITIVE_ZONE;
pub use registry::{name_of, register, TypeRegistry};

use std::borrow::Cow;
use std::fmt;

/// An independent namespace of registered types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(u8);

impl ZoneId {
    /// Built-in primitive and standard library types
    pub const PRIMITIVE: ZoneId = ZoneId(0);

    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone#{}", self.0)
    }
}

/// Dense index of a type within its zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(u8);

impl LocalId {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn as_u8(self) -> u8 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

const CHUNK_BITS: u32 = 16;
const CHUNK_MASK: u64 = (1 << CHUNK_BITS) - 1;

/// The identity of a registered type.
///
/// A plain type occupies one 16-bit chunk: the zone id in the high byte and
/// the local id in the low byte. Applying a template to an argument shifts
/// the argument's chunks up and stores the template in the lowest chunk, so
/// `Vec<Option<u32>>` is `[Vector][Optional][UnsignedInt]` read from the low
/// end. Four chunks fit; deeper nesting fails constant evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIdentity(u64);

impl TypeIdentity {
    pub const fn new(zone: ZoneId, local: u8) -> Self {
        Self(((zone.0 as u64) << 8) | local as u64)
    }

    /// Instantiate the template identified by `self` with `argument`
    pub const fn apply(self, argument: TypeIdentity) -> Self {
        assert!(
            self.0 >> CHUNK_BITS == 0,
            "only a bare template identity can be applied"
        );
        assert!(
            argument.0 >> (64 - CHUNK_BITS) == 0,
            "template nesting exceeds the capacity of a type identity"
        );
        Self((argument.0 << CHUNK_BITS) | self.0)
    }

    /// Zone of the outermost type constructor
    pub const fn zone(self) -> ZoneId {
        ZoneId(((self.0 & CHUNK_MASK) >> 8) as u8)
    }

    /// Local id of the outermost type constructor
    pub const fn local_id(self) -> LocalId {
        LocalId((self.0 & 0xff) as u8)
    }

    /// The identity with the outermost constructor stripped.
    ///
    /// Only meaningful when the outermost constructor is a template.
    pub const fn template_argument(self) -> TypeIdentity {
        TypeIdentity(self.0 >> CHUNK_BITS)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Human readable name, resolved through the global registry
    pub fn name(self) -> Cow<'static, str> {
        match name_of(self) {
            Some(name) => name,
            None => Cow::Owned(format!("<unregistered {}:{}>", self.zone().0, self.local_id().0)),
        }
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Whether a zone entry names a concrete type or a one-parameter template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Type,
    Template,
}

/// One registered type of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneEntry {
    pub name: &'static str,
    pub kind: EntryKind,
}

impl ZoneEntry {
    pub const fn ty(name: &'static str) -> Self {
        Self {
            name,
            kind: EntryKind::Type,
        }
    }

    pub const fn template(name: &'static str) -> Self {
        Self {
            name,
            kind: EntryKind::Template,
        }
    }
}

/// The static table produced by [`define_type_zone!`](crate::define_type_zone).
///
/// Entry `i` has local id `i`.
#[derive(Debug)]
pub struct ZoneDefinition {
    pub id: ZoneId,
    pub name: &'static str,
    pub entries: &'static [ZoneEntry],
}

impl ZoneDefinition {
    pub const fn new(id: ZoneId, name: &'static str, entries: &'static [ZoneEntry]) -> Self {
        Self { id, name, entries }
    }

    pub fn entry(&self, local: LocalId) -> Option<&'static ZoneEntry> {
        self.entries.get(local.index())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identities of the plain (non-template) types, in declaration order
    pub fn identities(&self) -> impl Iterator<Item = TypeIdentity> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.kind == EntryKind::Type)
            .map(move |(local, _)| TypeIdentity::new(self.id, local as u8))
    }
}

/// A type listed in some zone.
///
/// Implemented by [`define_type_zone!`](crate::define_type_zone); implementing
/// it by hand bypasses the uniqueness guarantees of the zone table.
pub trait TypeIdentified: 'static {
    const IDENTITY: TypeIdentity;

    fn type_name() -> Cow<'static, str>;

    fn zone() -> &'static ZoneDefinition;
}

/// Identity of `T`, read from an associated constant
pub const fn identity_of<T: TypeIdentified>() -> TypeIdentity {
    T::IDENTITY
}

/// Declare a zone of types.
///
/// Types receive local ids in the order they are listed, followed by the
/// templates. Listing more than 256 entries, listing a display name twice,
/// or listing a type that already belongs to a zone are all compile errors.
#[macro_export]
macro_rules! define_type_zone {
    (
        $(#[$meta:meta])*
        $vis:vis static $zone:ident = zone($id:expr, $zone_name:literal) {
            $( $ty:ty => $name:ident ),* $(,)?
        }
        $( templates { $( $tmpl:ident => $tname:ident ),* $(,)? } )?
    ) => {
        $(#[$meta])*
        $vis static $zone: $crate::type_id::ZoneDefinition =
            $crate::type_id::ZoneDefinition::new(
                $id,
                $zone_name,
                &[
                    $( $crate::type_id::ZoneEntry::ty(stringify!($name)), )*
                    $($( $crate::type_id::ZoneEntry::template(stringify!($tname)), )*)?
                ],
            );

        const _: () = {
            #[allow(non_camel_case_types, dead_code, clippy::upper_case_acronyms)]
            #[repr(u8)]
            enum LocalIds {
                $( $name, )*
                $($( $tname, )*)?
            }

            $(
                impl $crate::type_id::TypeIdentified for $ty {
                    const IDENTITY: $crate::type_id::TypeIdentity =
                        $crate::type_id::TypeIdentity::new($id, LocalIds::$name as u8);

                    fn type_name() -> ::std::borrow::Cow<'static, str> {
                        ::std::borrow::Cow::Borrowed(stringify!($name))
                    }

                    fn zone() -> &'static $crate::type_id::ZoneDefinition {
                        &$zone
                    }
                }
            )*

            $($(
                impl<T: $crate::type_id::TypeIdentified> $crate::type_id::TypeIdentified for $tmpl<T> {
                    const IDENTITY: $crate::type_id::TypeIdentity =
                        $crate::type_id::TypeIdentity::new($id, LocalIds::$tname as u8)
                            .apply(T::IDENTITY);

                    fn type_name() -> ::std::borrow::Cow<'static, str> {
                        ::std::borrow::Cow::Owned(format!(
                            "{}<{}>",
                            stringify!($tname),
                            T::type_name()
                        ))
                    }

                    fn zone() -> &'static $crate::type_id::ZoneDefinition {
                        &$zone
                    }
                }
            )*)?
        };
    };
}
