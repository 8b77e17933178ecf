use rustc_hash::FxHasher;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::{RequestKind, SimpleRequest};
use crate::diagnostics::DiagnosticHandler;
use crate::type_id::TypeIdentity;

/// Object-safe view of a [`SimpleRequest`] of any kind
trait ErasedRequest {
    fn identity(&self) -> TypeIdentity;
    fn kind_name(&self) -> Cow<'static, str>;
    fn is_equal(&self, other: &dyn ErasedRequest) -> bool;
    fn diagnose_cycle(&self, diags: &dyn DiagnosticHandler);
    fn note_cycle_step(&self, diags: &dyn DiagnosticHandler);
    fn display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn as_any(&self) -> &dyn Any;
}

impl<K: RequestKind> ErasedRequest for SimpleRequest<K> {
    fn identity(&self) -> TypeIdentity {
        K::IDENTITY
    }

    fn kind_name(&self) -> Cow<'static, str> {
        K::type_name()
    }

    fn is_equal(&self, other: &dyn ErasedRequest) -> bool {
        // Identities decide whether the kinds match; the downcast only
        // recovers the concrete inputs once they do
        other.identity() == K::IDENTITY
            && other
                .as_any()
                .downcast_ref::<SimpleRequest<K>>()
                .is_some_and(|other| other == self)
    }

    fn diagnose_cycle(&self, diags: &dyn DiagnosticHandler) {
        SimpleRequest::diagnose_cycle(self, diags);
    }

    fn note_cycle_step(&self, diags: &dyn DiagnosticHandler) {
        SimpleRequest::note_cycle_step(self, diags);
    }

    fn display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A request of some kind, with its kind erased.
///
/// Used wherever requests of different kinds live side by side: the
/// evaluator's active-request stack and its dependency graph. Equality is
/// request equality (same kind, equal inputs), never pointer identity.
/// Cloning shares the underlying request.
#[derive(Clone)]
pub struct AnyRequest {
    identity: TypeIdentity,
    hash: u64,
    request: Rc<dyn ErasedRequest>,
}

impl AnyRequest {
    pub fn new<K: RequestKind>(request: SimpleRequest<K>) -> Self {
        let mut hasher = FxHasher::default();
        request.hash(&mut hasher);

        Self {
            identity: K::IDENTITY,
            hash: hasher.finish(),
            request: Rc::new(request),
        }
    }

    pub fn identity(&self) -> TypeIdentity {
        self.identity
    }

    pub fn kind_name(&self) -> Cow<'static, str> {
        self.request.kind_name()
    }

    /// Whether this is a request of kind `K`
    pub fn is<K: RequestKind>(&self) -> bool {
        self.identity == K::IDENTITY
    }

    pub fn diagnose_cycle(&self, diags: &dyn DiagnosticHandler) {
        self.request.diagnose_cycle(diags);
    }

    pub fn note_cycle_step(&self, diags: &dyn DiagnosticHandler) {
        self.request.note_cycle_step(diags);
    }
}

impl PartialEq for AnyRequest {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.hash == other.hash
            && self.request.is_equal(other.request.as_ref())
    }
}

impl Eq for AnyRequest {}

impl Hash for AnyRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Display for AnyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.request.display(f)
    }
}

impl fmt::Debug for AnyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyRequest({})", self)
    }
}

impl<K: RequestKind> From<SimpleRequest<K>> for AnyRequest {
    fn from(request: SimpleRequest<K>) -> Self {
        AnyRequest::new(request)
    }
}
