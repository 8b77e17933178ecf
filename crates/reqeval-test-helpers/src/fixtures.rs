//! Request kinds for testing, with per-thread call counters

use reqeval_core::define_type_zone;
use reqeval_core::diagnostics::{error_codes, Diag, DiagnosticHandler};
use reqeval_core::display::SimpleDisplay;
use reqeval_core::evaluator::{EvaluationError, Evaluator, Result};
use reqeval_core::request::{caching, ExternalCache, Real, RequestKind, SimpleRequest};
use reqeval_core::span::Span;
use reqeval_core::type_id::ZoneId;
use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

pub struct Square;
pub struct SquareUncached;
pub struct Fibonacci;
pub struct CycleA;
pub struct CycleB;
pub struct SelfCycle;
pub struct Failing;
pub struct Flaky;
pub struct NodeDepth;

define_type_zone! {
    /// Request kinds used across the test suites
    pub static FIXTURE_ZONE = zone(ZoneId::new(200), "Fixtures") {
        Square => Square,
        SquareUncached => SquareUncached,
        Fibonacci => Fibonacci,
        CycleA => CycleA,
        CycleB => CycleB,
        SelfCycle => SelfCycle,
        Failing => Failing,
        Flaky => Flaky,
        NodeDepth => NodeDepth,
    }
}

/// Computations counted by the fixtures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Square,
    SquareUncached,
    Fibonacci,
    Failing,
    Flaky,
    NodeDepth,
}

const COUNTERS: usize = 6;

thread_local! {
    static CALLS: RefCell<[u32; COUNTERS]> = const { RefCell::new([0; COUNTERS]) };
}

fn bump(counter: Counter) -> u32 {
    CALLS.with(|calls| {
        let mut calls = calls.borrow_mut();
        calls[counter as usize] += 1;
        calls[counter as usize]
    })
}

/// Number of times the fixture's computation ran on this thread
pub fn calls(counter: Counter) -> u32 {
    CALLS.with(|calls| calls.borrow()[counter as usize])
}

pub fn reset_counters() {
    CALLS.with(|calls| *calls.borrow_mut() = [0; COUNTERS]);
}

pub fn square(value: f64) -> SimpleRequest<Square> {
    SimpleRequest::new((Real(value),))
}

pub fn fibonacci(n: u32) -> SimpleRequest<Fibonacci> {
    SimpleRequest::new((n,))
}

impl RequestKind for Square {
    type Inputs = (Real,);
    type Output = f64;
    type Caching = caching::Cached;

    fn evaluate(_evaluator: &mut Evaluator, inputs: &(Real,)) -> Result<f64> {
        bump(Counter::Square);
        Ok(inputs.0.get() * inputs.0.get())
    }
}

impl RequestKind for SquareUncached {
    type Inputs = (Real,);
    type Output = f64;
    type Caching = caching::Uncached;

    fn evaluate(_evaluator: &mut Evaluator, inputs: &(Real,)) -> Result<f64> {
        bump(Counter::SquareUncached);
        Ok(inputs.0.get() * inputs.0.get())
    }
}

impl RequestKind for Fibonacci {
    type Inputs = (u32,);
    type Output = u64;
    type Caching = caching::Cached;

    fn evaluate(evaluator: &mut Evaluator, inputs: &(u32,)) -> Result<u64> {
        bump(Counter::Fibonacci);
        let n = inputs.0;
        if n < 2 {
            return Ok(u64::from(n));
        }
        let a = evaluator.evaluate(&fibonacci(n - 1))?;
        let b = evaluator.evaluate(&fibonacci(n - 2))?;
        Ok(a + b)
    }
}

/// Asks for `CycleB` with the same input
impl RequestKind for CycleA {
    type Inputs = (u32,);
    type Output = u32;
    type Caching = caching::Cached;
    const CYCLE_DIAGNOSTIC: Diag =
        Diag::error(error_codes::CIRCULAR_REFERENCE, "cycle through A({0})");
    const CYCLE_STEP_DIAGNOSTIC: Diag = Diag::note(
        error_codes::CIRCULAR_REFERENCE_THROUGH,
        "A({0}) is part of the cycle",
    );

    fn evaluate(evaluator: &mut Evaluator, inputs: &(u32,)) -> Result<u32> {
        evaluator.evaluate(&SimpleRequest::<CycleB>::new(*inputs))
    }

    fn cycle_diagnostic_loc(inputs: &(u32,)) -> Span {
        Span::new(0, 0, inputs.0, 1)
    }
}

/// Asks for `CycleA` with the same input; uses the default cycle diagnostics
impl RequestKind for CycleB {
    type Inputs = (u32,);
    type Output = u32;
    type Caching = caching::Cached;

    fn evaluate(evaluator: &mut Evaluator, inputs: &(u32,)) -> Result<u32> {
        evaluator.evaluate(&SimpleRequest::<CycleA>::new(*inputs))
    }
}

/// Asks for itself and reports cycles without templates
impl RequestKind for SelfCycle {
    type Inputs = (String,);
    type Output = String;
    type Caching = caching::Uncached;

    fn evaluate(evaluator: &mut Evaluator, inputs: &(String,)) -> Result<String> {
        evaluator.evaluate(&SimpleRequest::<SelfCycle>::new(inputs.clone()))
    }

    fn diagnose_cycle(inputs: &(String,), diags: &dyn DiagnosticHandler) {
        diags.error(Span::dummy(), &format!("'{}' refers to itself", inputs.0));
    }

    fn note_cycle_step(_inputs: &(String,), diags: &dyn DiagnosticHandler) {
        diags.note(Span::dummy(), "self reference here");
    }
}

impl RequestKind for Failing {
    type Inputs = ();
    type Output = u32;
    type Caching = caching::Cached;

    fn evaluate(_evaluator: &mut Evaluator, _inputs: &()) -> Result<u32> {
        bump(Counter::Failing);
        Err(EvaluationError::computation("failing fixture"))
    }
}

/// Fails on its first computation on a thread, succeeds afterwards
impl RequestKind for Flaky {
    type Inputs = (u32,);
    type Output = u32;
    type Caching = caching::Cached;

    fn evaluate(_evaluator: &mut Evaluator, inputs: &(u32,)) -> Result<u32> {
        if bump(Counter::Flaky) == 1 {
            return Err(EvaluationError::computation("first attempt fails"));
        }
        Ok(inputs.0)
    }
}

/// A tree node carrying its own depth cache
pub struct TreeNode {
    pub name: String,
    pub children: Vec<NodeRef>,
    depth: OnceCell<u32>,
}

impl TreeNode {
    pub fn leaf(name: &str) -> NodeRef {
        Self::with_children(name, Vec::new())
    }

    pub fn with_children(name: &str, children: Vec<NodeRef>) -> NodeRef {
        NodeRef(Rc::new(TreeNode {
            name: name.to_string(),
            children,
            depth: OnceCell::new(),
        }))
    }

    pub fn cached_depth(&self) -> Option<u32> {
        self.depth.get().copied()
    }
}

/// Shared handle to a node; equal only to handles of the same node
#[derive(Clone)]
pub struct NodeRef(pub Rc<TreeNode>);

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NodeRef {}

impl Hash for NodeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state);
    }
}

impl SimpleDisplay for NodeRef {
    fn simple_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.name.simple_display(f)
    }
}

impl RequestKind for NodeDepth {
    type Inputs = (NodeRef,);
    type Output = u32;
    type Caching = caching::SeparatelyCached;

    fn evaluate(evaluator: &mut Evaluator, inputs: &(NodeRef,)) -> Result<u32> {
        bump(Counter::NodeDepth);
        let mut depth = 0;
        for child in &inputs.0 .0.children {
            let child_depth = evaluator.evaluate(&SimpleRequest::<NodeDepth>::new((child.clone(),)))?;
            depth = depth.max(child_depth + 1);
        }
        Ok(depth)
    }
}

impl ExternalCache for NodeDepth {
    fn cached_result(inputs: &(NodeRef,)) -> Option<u32> {
        inputs.0 .0.cached_depth()
    }

    fn cache_result(inputs: &(NodeRef,), value: u32) {
        let _ = inputs.0 .0.depth.set(value);
    }
}
