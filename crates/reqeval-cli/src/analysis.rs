//! Analyses over declaration graphs, expressed as requests.
//!
//! A graph file lists named declarations, each with a weight and the names
//! of the declarations it depends on. Three request kinds answer questions
//! about it, one per caching policy:
//!
//! - `LookupDeclaration` resolves a name; cheap, so never cached
//! - `TotalWeight` sums a declaration's weight with its dependencies'
//!   total weights, memoized by the evaluator
//! - `DependencyDepth` is the length of the longest dependency chain,
//!   memoized on the declaration itself

use anyhow::{bail, Context};
use indexmap::IndexMap;
use reqeval_core::define_type_zone;
use reqeval_core::diagnostics::{error_codes, Diag};
use reqeval_core::display::SimpleDisplay;
use reqeval_core::evaluator::{EvaluationError, Evaluator, Result};
use reqeval_core::request::{caching, ExternalCache, RequestKind, SimpleRequest};
use reqeval_core::span::Span;
use reqeval_core::type_id::ZoneId;
use serde::Deserialize;
use std::cell::OnceCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::rc::Rc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphFile {
    pub declarations: Vec<DeclarationSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationSpec {
    pub name: String,
    #[serde(default)]
    pub weight: u64,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

pub struct Declaration {
    pub name: String,
    pub weight: u64,
    pub depends_on: Vec<String>,
    /// Line is the declaration's position in the file's list, starting at 1
    pub span: Span,
    depth: OnceCell<u32>,
}

pub struct Module {
    path: String,
    declarations: IndexMap<String, Rc<Declaration>>,
}

impl Module {
    /// Read a YAML or JSON graph file
    pub fn load(path: &Path) -> anyhow::Result<ModuleRef> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let graph: GraphFile = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => bail!("Unsupported graph format (expected .yaml, .yml or .json)"),
        };

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_graph(name, graph)
    }

    pub fn from_graph(path: impl Into<String>, graph: GraphFile) -> anyhow::Result<ModuleRef> {
        let mut declarations = IndexMap::with_capacity(graph.declarations.len());

        for (index, spec) in graph.declarations.into_iter().enumerate() {
            if declarations.contains_key(&spec.name) {
                bail!("Duplicate declaration '{}'", spec.name);
            }
            let line = u32::try_from(index + 1).unwrap_or(u32::MAX);
            let declaration = Declaration {
                name: spec.name.clone(),
                weight: spec.weight,
                depends_on: spec.depends_on,
                span: Span::new(0, 0, line, 1),
                depth: OnceCell::new(),
            };
            declarations.insert(spec.name, Rc::new(declaration));
        }

        Ok(ModuleRef(Rc::new(Module {
            path: path.into(),
            declarations,
        })))
    }

    pub fn get(&self, name: &str) -> Option<&Rc<Declaration>> {
        self.declarations.get(name)
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Rc<Declaration>> {
        self.declarations.values()
    }
}

/// Shared handle to a module; equal only to handles of the same module
#[derive(Clone)]
pub struct ModuleRef(pub Rc<Module>);

impl PartialEq for ModuleRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ModuleRef {}

impl Hash for ModuleRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state);
    }
}

impl SimpleDisplay for ModuleRef {
    fn simple_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.path.simple_display(f)
    }
}

#[derive(Clone)]
pub struct DeclRef(pub Rc<Declaration>);

pub struct LookupDeclaration;
pub struct TotalWeight;
pub struct DependencyDepth;

define_type_zone! {
    /// Requests of the declaration graph analyses
    pub static ANALYSIS_ZONE = zone(ZoneId::new(1), "Analysis") {
        LookupDeclaration => LookupDeclaration,
        TotalWeight => TotalWeight,
        DependencyDepth => DependencyDepth,
    }
}

type DeclarationKey = (ModuleRef, String);

fn key(module: &ModuleRef, name: &str) -> DeclarationKey {
    (module.clone(), name.to_string())
}

fn declaration_span(inputs: &DeclarationKey) -> Span {
    inputs
        .0
        .0
        .get(&inputs.1)
        .map(|decl| decl.span)
        .unwrap_or_default()
}

impl RequestKind for LookupDeclaration {
    type Inputs = DeclarationKey;
    type Output = DeclRef;
    type Caching = caching::Uncached;

    fn evaluate(_evaluator: &mut Evaluator, inputs: &DeclarationKey) -> Result<DeclRef> {
        let (module, name) = inputs;
        module
            .0
            .get(name)
            .cloned()
            .map(DeclRef)
            .ok_or_else(|| EvaluationError::computation(format!("unknown declaration '{}'", name)))
    }
}

impl RequestKind for TotalWeight {
    type Inputs = DeclarationKey;
    type Output = u64;
    type Caching = caching::Cached;
    const CYCLE_DIAGNOSTIC: Diag = Diag::error(
        error_codes::CIRCULAR_REFERENCE,
        "weight of {1} depends on itself",
    );
    const CYCLE_STEP_DIAGNOSTIC: Diag = Diag::note(
        error_codes::CIRCULAR_REFERENCE_THROUGH,
        "through the weight of {1}",
    );

    fn evaluate(evaluator: &mut Evaluator, inputs: &DeclarationKey) -> Result<u64> {
        let (module, name) = inputs;
        let decl = evaluator.evaluate(&SimpleRequest::<LookupDeclaration>::new(key(module, name)))?;

        let mut total = decl.0.weight;
        for dep in &decl.0.depends_on {
            let weight = evaluator.evaluate(&SimpleRequest::<TotalWeight>::new(key(module, dep)))?;
            total = total.saturating_add(weight);
        }
        Ok(total)
    }

    fn cycle_diagnostic_loc(inputs: &DeclarationKey) -> Span {
        declaration_span(inputs)
    }
}

impl RequestKind for DependencyDepth {
    type Inputs = DeclarationKey;
    type Output = u32;
    type Caching = caching::SeparatelyCached;
    const CYCLE_DIAGNOSTIC: Diag = Diag::error(
        error_codes::CIRCULAR_REFERENCE,
        "depth of {1} depends on itself",
    );
    const CYCLE_STEP_DIAGNOSTIC: Diag = Diag::note(
        error_codes::CIRCULAR_REFERENCE_THROUGH,
        "through the depth of {1}",
    );

    fn evaluate(evaluator: &mut Evaluator, inputs: &DeclarationKey) -> Result<u32> {
        let (module, name) = inputs;
        let decl = evaluator.evaluate(&SimpleRequest::<LookupDeclaration>::new(key(module, name)))?;

        let mut depth = 0;
        for dep in &decl.0.depends_on {
            let dep_depth =
                evaluator.evaluate(&SimpleRequest::<DependencyDepth>::new(key(module, dep)))?;
            depth = depth.max(dep_depth + 1);
        }
        Ok(depth)
    }

    fn cycle_diagnostic_loc(inputs: &DeclarationKey) -> Span {
        declaration_span(inputs)
    }
}

impl ExternalCache for DependencyDepth {
    fn cached_result(inputs: &DeclarationKey) -> Option<u32> {
        inputs.0.0.get(&inputs.1)?.depth.get().copied()
    }

    fn cache_result(inputs: &DeclarationKey, value: u32) {
        if let Some(decl) = inputs.0.0.get(&inputs.1) {
            let _ = decl.depth.set(value);
        }
    }
}

fn describe(evaluator: &mut Evaluator, module: &ModuleRef, name: &str) -> Result<(u64, u32)> {
    let weight = evaluator.evaluate(&SimpleRequest::<TotalWeight>::new(key(module, name)))?;
    let depth = evaluator.evaluate(&SimpleRequest::<DependencyDepth>::new(key(module, name)))?;
    Ok((weight, depth))
}

/// One output line per declaration, in file order.
///
/// Cycles are diagnosed by the evaluator; other failures are reported here
/// against the declaration that needed the failing request.
pub fn analyze(evaluator: &mut Evaluator, module: &ModuleRef) -> Vec<String> {
    let mut lines = Vec::new();

    for decl in module.0.declarations() {
        let line = match describe(evaluator, module, &decl.name) {
            Ok((weight, depth)) => format!("{} weight={} depth={}", decl.name, weight, depth),
            Err(EvaluationError::Cycle(_)) => format!("{} error", decl.name),
            Err(EvaluationError::Computation(error)) => {
                evaluator.diagnostic_handler().diagnose(
                    decl.span,
                    &Diag::REQUEST_FAILED,
                    &[format!("declaration '{}'", decl.name), format!("{:#}", error)],
                );
                format!("{} error", decl.name)
            }
        };
        lines.push(line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqeval_core::diagnostics::{CollectingDiagnosticHandler, DiagnosticHandler};
    use std::sync::Arc;

    fn graph(specs: &[(&str, u64, &[&str])]) -> ModuleRef {
        let declarations = specs
            .iter()
            .map(|(name, weight, deps)| DeclarationSpec {
                name: name.to_string(),
                weight: *weight,
                depends_on: deps.iter().map(|dep| dep.to_string()).collect(),
            })
            .collect();
        Module::from_graph("test.yaml", GraphFile { declarations }).unwrap()
    }

    fn run(module: &ModuleRef) -> (Vec<String>, Arc<CollectingDiagnosticHandler>) {
        let handler = Arc::new(CollectingDiagnosticHandler::new());
        let mut evaluator = Evaluator::new(handler.clone());
        (analyze(&mut evaluator, module), handler)
    }

    #[test]
    fn test_weights_and_depths() {
        let module = graph(&[
            ("main", 1, &["parse", "check"]),
            ("parse", 3, &["lex"]),
            ("check", 5, &["parse"]),
            ("lex", 2, &[]),
        ]);
        let (lines, handler) = run(&module);

        assert_eq!(
            lines,
            vec![
                "main weight=16 depth=3",
                "parse weight=5 depth=1",
                "check weight=10 depth=2",
                "lex weight=2 depth=0",
            ]
        );
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_depth_stored_on_declaration() {
        let module = graph(&[("a", 1, &["b"]), ("b", 1, &[])]);
        run(&module);

        assert_eq!(module.0.get("a").and_then(|d| d.depth.get().copied()), Some(1));
        assert_eq!(module.0.get("b").and_then(|d| d.depth.get().copied()), Some(0));
    }

    #[test]
    fn test_cycle_reported() {
        let module = graph(&[("a", 1, &["b"]), ("b", 1, &["a"]), ("c", 4, &[])]);
        let (lines, handler) = run(&module);

        assert_eq!(lines, vec!["a error", "b error", "c weight=4 depth=0"]);
        let diagnostics = handler.get_diagnostics();
        assert_eq!(diagnostics[0].message, "weight of \"a\" depends on itself");
        assert_eq!(diagnostics[0].span.line, 1);
        assert_eq!(diagnostics[1].message, "through the weight of \"b\"");
        assert_eq!(handler.error_count(), 2);
    }

    #[test]
    fn test_unknown_dependency_reported() {
        let module = graph(&[("a", 1, &["missing"])]);
        let (lines, handler) = run(&module);

        assert_eq!(lines, vec!["a error"]);
        let diagnostics = handler.get_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "declaration 'a' failed: unknown declaration 'missing'"
        );
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        let declarations = vec![
            DeclarationSpec {
                name: "a".to_string(),
                weight: 1,
                depends_on: Vec::new(),
            },
            DeclarationSpec {
                name: "a".to_string(),
                weight: 2,
                depends_on: Vec::new(),
            },
        ];
        let result = Module::from_graph("dup.yaml", GraphFile { declarations });
        assert!(result.is_err());
    }
}
