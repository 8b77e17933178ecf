//! Requests: immutable, typed, comparable descriptions of a computation.
//!
//! A request kind is a marker type listed in a type zone that implements
//! [`RequestKind`]. [`SimpleRequest<K>`] packages the kind's inputs and
//! derives equality, hashing, display and cycle diagnostics from them, so a
//! new analysis only has to supply its computation.

mod any;
mod real;

pub use any::AnyRequest;
pub use real::Real;

use crate::diagnostics::{Diag, DiagnosticHandler};
use crate::display::{display_string, SimpleDisplay};
use crate::evaluator::{Evaluator, Result};
use crate::span::Span;
use crate::type_id::{TypeIdentified, TypeIdentity};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Describes how the result for a particular request will be cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// The result should never be cached
    Uncached,
    /// The result is cached within the evaluator itself
    Cached,
    /// The result is cached by the request kind in storage it owns,
    /// such as a field on the node the request is about
    SeparatelyCached,
}

impl CacheKind {
    pub const fn is_ever_cached(self) -> bool {
        !matches!(self, CacheKind::Uncached)
    }

    pub const fn has_external_cache(self) -> bool {
        matches!(self, CacheKind::SeparatelyCached)
    }
}

/// Caching policies a request kind selects through [`RequestKind::Caching`]
pub mod caching {
    pub struct Uncached;
    pub struct Cached;
    /// Requires the kind to implement [`ExternalCache`](super::ExternalCache)
    pub struct SeparatelyCached;
}

/// A caching policy, resolved per request kind at compile time
pub trait CachePolicy<K: RequestKind> {
    const KIND: CacheKind;

    fn cached_result(_inputs: &K::Inputs) -> Option<K::Output> {
        None
    }

    fn cache_result(_inputs: &K::Inputs, _value: K::Output) {}
}

impl<K: RequestKind> CachePolicy<K> for caching::Uncached {
    const KIND: CacheKind = CacheKind::Uncached;
}

impl<K: RequestKind> CachePolicy<K> for caching::Cached {
    const KIND: CacheKind = CacheKind::Cached;
}

impl<K: ExternalCache> CachePolicy<K> for caching::SeparatelyCached {
    const KIND: CacheKind = CacheKind::SeparatelyCached;

    fn cached_result(inputs: &K::Inputs) -> Option<K::Output> {
        <K as ExternalCache>::cached_result(inputs)
    }

    fn cache_result(inputs: &K::Inputs, value: K::Output) {
        <K as ExternalCache>::cache_result(inputs, value);
    }
}

/// Storage owned by a separately cached request kind, usually a field on
/// the node the request is about.
///
/// ```
/// use reqeval_core::define_type_zone;
/// use reqeval_core::evaluator::{Evaluator, Result};
/// use reqeval_core::type_id::ZoneId;
/// use reqeval_core::{caching, ExternalCache, RequestKind};
/// use std::cell::Cell;
///
/// pub struct Square;
///
/// define_type_zone! {
///     pub static SQUARE_ZONE = zone(ZoneId::new(91), "Square") {
///         Square => Square,
///     }
/// }
///
/// thread_local! {
///     static LAST: Cell<Option<(u32, u32)>> = Cell::new(None);
/// }
///
/// impl RequestKind for Square {
///     type Inputs = (u32,);
///     type Output = u32;
///     type Caching = caching::SeparatelyCached;
///
///     fn evaluate(_evaluator: &mut Evaluator, inputs: &(u32,)) -> Result<u32> {
///         Ok(inputs.0 * inputs.0)
///     }
/// }
///
/// impl ExternalCache for Square {
///     fn cached_result(inputs: &(u32,)) -> Option<u32> {
///         LAST.with(|last| last.get().filter(|(n, _)| *n == inputs.0).map(|(_, v)| v))
///     }
///
///     fn cache_result(inputs: &(u32,), value: u32) {
///         LAST.with(|last| last.set(Some((inputs.0, value))));
///     }
/// }
/// ```
///
/// Choosing the separate policy without providing the storage is rejected:
///
/// ```compile_fail
/// use reqeval_core::define_type_zone;
/// use reqeval_core::evaluator::{Evaluator, Result};
/// use reqeval_core::type_id::ZoneId;
/// use reqeval_core::{caching, RequestKind};
///
/// pub struct Forgetful;
///
/// define_type_zone! {
///     pub static FORGETFUL_ZONE = zone(ZoneId::new(90), "Forgetful") {
///         Forgetful => Forgetful,
///     }
/// }
///
/// impl RequestKind for Forgetful {
///     type Inputs = (u32,);
///     type Output = u32;
///     type Caching = caching::SeparatelyCached;
///
///     fn evaluate(_evaluator: &mut Evaluator, inputs: &(u32,)) -> Result<u32> {
///         Ok(inputs.0)
///     }
/// }
/// ```
pub trait ExternalCache: RequestKind {
    fn cached_result(inputs: &Self::Inputs) -> Option<Self::Output>;

    fn cache_result(inputs: &Self::Inputs, value: Self::Output);
}

/// The input tuple of a request.
///
/// Implemented for tuples of up to six elements whose members can be
/// compared, hashed and displayed.
pub trait RequestInputs: Clone + Eq + Hash + SimpleDisplay + 'static {
    /// Each input rendered separately, used as diagnostic template arguments
    fn display_args(&self) -> Vec<String>;
}

impl RequestInputs for () {
    fn display_args(&self) -> Vec<String> {
        Vec::new()
    }
}

macro_rules! tuple_inputs {
    ($( ($($name:ident : $idx:tt),+) ),* $(,)?) => {
        $(
            impl<$($name),+> RequestInputs for ($($name,)+)
            where
                $($name: Clone + Eq + Hash + SimpleDisplay + 'static),+
            {
                fn display_args(&self) -> Vec<String> {
                    vec![$(display_string(&self.$idx)),+]
                }
            }
        )*
    };
}

tuple_inputs! {
    (A: 0),
    (A: 0, B: 1),
    (A: 0, B: 1, C: 2),
    (A: 0, B: 1, C: 2, D: 3),
    (A: 0, B: 1, C: 2, D: 3, E: 4),
    (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5),
}

/// The capabilities a request kind provides, selected at compile time.
///
/// `evaluate` is required. Cycle diagnostics can be handled in one of two
/// ways: override [`diagnose_cycle`](RequestKind::diagnose_cycle) and
/// [`note_cycle_step`](RequestKind::note_cycle_step) directly, or provide
/// [`cycle_diagnostic_loc`](RequestKind::cycle_diagnostic_loc) together with
/// the two templates and let the provided methods apply them to the inputs.
///
/// Kinds selecting [`caching::SeparatelyCached`] must also implement
/// [`ExternalCache`] over the storage they own; without it the kind does
/// not compile.
pub trait RequestKind: TypeIdentified + Sized {
    type Inputs: RequestInputs;
    type Output: Clone + 'static;

    type Caching: CachePolicy<Self>;

    /// Template for the primary diagnostic of a cycle through this request
    const CYCLE_DIAGNOSTIC: Diag = Diag::CIRCULAR_REFERENCE;

    /// Template for the note describing this request as one step of a cycle
    const CYCLE_STEP_DIAGNOSTIC: Diag = Diag::CIRCULAR_REFERENCE_THROUGH;

    /// Compute the result. This is the only place allowed to ask the
    /// evaluator for other requests.
    fn evaluate(evaluator: &mut Evaluator, inputs: &Self::Inputs) -> Result<Self::Output>;

    fn cycle_diagnostic_loc(_inputs: &Self::Inputs) -> Span {
        Span::dummy()
    }

    fn diagnose_cycle(inputs: &Self::Inputs, diags: &dyn DiagnosticHandler) {
        diags.diagnose(
            Self::cycle_diagnostic_loc(inputs),
            &Self::CYCLE_DIAGNOSTIC,
            &inputs.display_args(),
        );
    }

    fn note_cycle_step(inputs: &Self::Inputs, diags: &dyn DiagnosticHandler) {
        diags.diagnose(
            Self::cycle_diagnostic_loc(inputs),
            &Self::CYCLE_STEP_DIAGNOSTIC,
            &inputs.display_args(),
        );
    }
}

/// A request of kind `K`: the kind's inputs, stored immutably.
pub struct SimpleRequest<K: RequestKind> {
    storage: K::Inputs,
}

impl<K: RequestKind> SimpleRequest<K> {
    pub const CACHING: CacheKind = <K::Caching as CachePolicy<K>>::KIND;
    pub const IS_EVER_CACHED: bool = Self::CACHING.is_ever_cached();
    pub const HAS_EXTERNAL_CACHE: bool = Self::CACHING.has_external_cache();

    pub fn new(inputs: K::Inputs) -> Self {
        Self { storage: inputs }
    }

    pub fn inputs(&self) -> &K::Inputs {
        &self.storage
    }

    pub fn into_inputs(self) -> K::Inputs {
        self.storage
    }

    pub fn identity() -> TypeIdentity {
        K::IDENTITY
    }

    pub fn diagnose_cycle(&self, diags: &dyn DiagnosticHandler) {
        K::diagnose_cycle(&self.storage, diags);
    }

    pub fn note_cycle_step(&self, diags: &dyn DiagnosticHandler) {
        K::note_cycle_step(&self.storage, diags);
    }

    pub(crate) fn evaluate_request(&self, evaluator: &mut Evaluator) -> Result<K::Output> {
        K::evaluate(evaluator, &self.storage)
    }

    pub(crate) fn cached_result(&self) -> Option<K::Output> {
        <K::Caching as CachePolicy<K>>::cached_result(&self.storage)
    }

    pub(crate) fn cache_result(&self, value: K::Output) {
        <K::Caching as CachePolicy<K>>::cache_result(&self.storage, value);
    }
}

impl<K: RequestKind> Clone for SimpleRequest<K> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<K: RequestKind> PartialEq for SimpleRequest<K> {
    fn eq(&self, other: &Self) -> bool {
        self.storage == other.storage
    }
}

impl<K: RequestKind> Eq for SimpleRequest<K> {}

impl<K: RequestKind> Hash for SimpleRequest<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        K::IDENTITY.hash(state);
        self.storage.hash(state);
    }
}

impl<K: RequestKind> fmt::Display for SimpleRequest<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&K::type_name())?;
        self.storage.simple_display(f)
    }
}

impl<K: RequestKind> fmt::Debug for SimpleRequest<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimpleRequest({})", self)
    }
}
