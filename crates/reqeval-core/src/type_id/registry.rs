use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::sync::{OnceLock, PoisonError, RwLock};
use tracing::debug;

use super::{EntryKind, TypeIdentified, TypeIdentity, ZoneDefinition, ZoneId, PRIMITIVE_ZONE};

/// Process-wide table of zone definitions.
///
/// Identities themselves never need the registry; it only exists so that a
/// bare [`TypeIdentity`] can be turned back into a name for diagnostics.
/// The table is append-only and lives for the whole process.
pub struct TypeRegistry {
    zones: RwLock<FxHashMap<ZoneId, &'static ZoneDefinition>>,
}

static REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();

impl TypeRegistry {
    fn new() -> Self {
        let mut zones = FxHashMap::default();
        zones.insert(PRIMITIVE_ZONE.id, &PRIMITIVE_ZONE);
        Self {
            zones: RwLock::new(zones),
        }
    }

    /// The global registry, with the primitive zone already registered
    pub fn global() -> &'static TypeRegistry {
        REGISTRY.get_or_init(TypeRegistry::new)
    }

    /// Register a zone definition.
    ///
    /// Registering the same definition again is a no-op.
    ///
    /// # Panics
    /// Panics when a different definition already claimed the zone id; two
    /// subsystems sharing an id is a programming error.
    pub fn register_zone(&self, zone: &'static ZoneDefinition) {
        if let Some(existing) = self.zone(zone.id) {
            Self::check_same_zone(existing, zone);
            return;
        }

        let mut zones = self.zones.write().unwrap_or_else(PoisonError::into_inner);
        match zones.get(&zone.id) {
            Some(existing) => Self::check_same_zone(existing, zone),
            None => {
                debug!(zone = zone.name, id = zone.id.as_u8(), entries = zone.len(), "registered type zone");
                zones.insert(zone.id, zone);
            }
        }
    }

    fn check_same_zone(existing: &'static ZoneDefinition, zone: &'static ZoneDefinition) {
        assert!(
            std::ptr::eq(existing, zone),
            "type zone id {} is claimed by both '{}' and '{}'",
            zone.id.as_u8(),
            existing.name,
            zone.name
        );
    }

    pub fn zone(&self, id: ZoneId) -> Option<&'static ZoneDefinition> {
        self.zones
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
    }

    pub fn is_registered(&self, id: ZoneId) -> bool {
        self.zone(id).is_some()
    }

    /// Registered zones ordered by id
    pub fn zones(&self) -> Vec<&'static ZoneDefinition> {
        let mut zones: Vec<_> = self
            .zones
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .copied()
            .collect();
        zones.sort_by_key(|zone| zone.id);
        zones
    }

    /// Resolve an identity to its display name, decoding template
    /// applications such as `Vector<Optional<Int>>`.
    pub fn name_of(&self, identity: TypeIdentity) -> Option<Cow<'static, str>> {
        let zone = self.zone(identity.zone())?;
        let entry = zone.entry(identity.local_id())?;

        match entry.kind {
            EntryKind::Type => Some(Cow::Borrowed(entry.name)),
            EntryKind::Template => {
                let argument = self.name_of(identity.template_argument())?;
                Some(Cow::Owned(format!("{}<{}>", entry.name, argument)))
            }
        }
    }
}

/// Register `T`'s zone with the global registry and return `T`'s identity
pub fn register<T: TypeIdentified>() -> TypeIdentity {
    TypeRegistry::global().register_zone(T::zone());
    T::IDENTITY
}

/// Name of an identity according to the global registry
pub fn name_of(identity: TypeIdentity) -> Option<Cow<'static, str>> {
    TypeRegistry::global().name_of(identity)
}
