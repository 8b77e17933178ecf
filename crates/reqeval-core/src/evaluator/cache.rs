use rustc_hash::FxHashMap;
use std::any::Any;
use std::borrow::Cow;
use std::collections::hash_map::Entry;

use crate::request::RequestKind;
use crate::type_id::TypeIdentity;

/// Per-kind table, erased so tables of different kinds can share a map
trait ErasedTable {
    fn len(&self) -> usize;
    fn kind_name(&self) -> Cow<'static, str>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Table<K: RequestKind> {
    entries: FxHashMap<K::Inputs, K::Output>,
}

impl<K: RequestKind> Default for Table<K> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<K: RequestKind> ErasedTable for Table<K> {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn kind_name(&self) -> Cow<'static, str> {
        K::type_name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// The identity selects the table, so a failed downcast means two kinds
// were declared with the same identity
fn identity_conflict<K: RequestKind>(existing: &str) -> ! {
    panic!(
        "request kinds '{}' and '{}' share identity {:?}",
        existing,
        K::type_name(),
        K::IDENTITY
    )
}

/// Memoized outputs of `Cached` requests.
///
/// Keyed first by the request kind's identity, then by its inputs. Entries
/// are never evicted or overwritten; the first stored value for a request
/// stays for the lifetime of the cache.
#[derive(Default)]
pub struct ResultCache {
    tables: FxHashMap<TypeIdentity, Box<dyn ErasedTable>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn table<K: RequestKind>(&self) -> Option<&Table<K>> {
        let table = self.tables.get(&K::IDENTITY)?;
        match table.as_any().downcast_ref::<Table<K>>() {
            Some(table) => Some(table),
            None => identity_conflict::<K>(&table.kind_name()),
        }
    }

    pub fn get<K: RequestKind>(&self, inputs: &K::Inputs) -> Option<&K::Output> {
        self.table::<K>()?.entries.get(inputs)
    }

    pub fn contains<K: RequestKind>(&self, inputs: &K::Inputs) -> bool {
        self.get::<K>(inputs).is_some()
    }

    /// Store an output. Returns `false` if a value was already stored for
    /// these inputs, in which case the existing value is kept.
    ///
    /// # Panics
    /// Panics when a different kind already stored outputs under `K`'s
    /// identity.
    pub fn insert<K: RequestKind>(&mut self, inputs: K::Inputs, output: K::Output) -> bool {
        let table = self
            .tables
            .entry(K::IDENTITY)
            .or_insert_with(|| Box::new(Table::<K>::default()));

        let existing = table.kind_name();
        let Some(table) = table.as_any_mut().downcast_mut::<Table<K>>() else {
            identity_conflict::<K>(&existing)
        };

        match table.entries.entry(inputs) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(output);
                true
            }
        }
    }

    /// Total number of stored outputs across all kinds
    pub fn len(&self) -> usize {
        self.tables.values().map(|table| table.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kind names and entry counts, ordered by identity
    pub fn kinds(&self) -> Vec<(Cow<'static, str>, usize)> {
        let mut tables: Vec<_> = self.tables.iter().collect();
        tables.sort_by_key(|(identity, _)| **identity);
        tables
            .into_iter()
            .map(|(_, table)| (table.kind_name(), table.len()))
            .collect()
    }
}
