use crate::span::Span;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    /// Attached to a preceding error, e.g. one step of a dependency cycle
    Note,
    Info,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Note => "note",
            DiagnosticLevel::Info => "info",
        };
        f.write_str(s)
    }
}

/// Stable identifier of a diagnostic kind, rendered as e.g. `E0001`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticCode {
    pub prefix: char,
    pub number: u16,
}

impl DiagnosticCode {
    pub const fn new(prefix: char, number: u16) -> Self {
        Self { prefix, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", self.prefix, self.number)
    }
}

pub mod error_codes {
    use super::DiagnosticCode;

    pub const CIRCULAR_REFERENCE: DiagnosticCode = DiagnosticCode::new('E', 1);
    pub const CIRCULAR_REFERENCE_THROUGH: DiagnosticCode = DiagnosticCode::new('N', 1);
    pub const REQUEST_FAILED: DiagnosticCode = DiagnosticCode::new('E', 2);
}

/// A diagnostic template.
///
/// The format string refers to its arguments positionally (`{0}`, `{1}`, ...);
/// request kinds instantiate templates with the rendered form of their inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diag {
    pub code: DiagnosticCode,
    pub level: DiagnosticLevel,
    pub format: &'static str,
}

impl Diag {
    pub const fn error(code: DiagnosticCode, format: &'static str) -> Self {
        Self {
            code,
            level: DiagnosticLevel::Error,
            format,
        }
    }

    pub const fn note(code: DiagnosticCode, format: &'static str) -> Self {
        Self {
            code,
            level: DiagnosticLevel::Note,
            format,
        }
    }

    /// The default primary diagnostic for a dependency cycle
    pub const CIRCULAR_REFERENCE: Diag =
        Diag::error(error_codes::CIRCULAR_REFERENCE, "circular reference");

    /// The default note emitted for each step of a dependency cycle
    pub const CIRCULAR_REFERENCE_THROUGH: Diag = Diag::note(
        error_codes::CIRCULAR_REFERENCE_THROUGH,
        "through reference here",
    );

    /// Reported when a request's failure is swallowed by its caller
    pub const REQUEST_FAILED: Diag = Diag::error(error_codes::REQUEST_FAILED, "{0} failed: {1}");

    /// Substitute `{N}` placeholders with `args[N]`.
    ///
    /// Placeholders without a matching argument are kept verbatim, and `{{`
    /// / `}}` escape literal braces.
    pub fn render(&self, args: &[String]) -> String {
        let mut out = String::with_capacity(self.format.len());
        let mut chars = self.format.char_indices().peekable();

        while let Some((start, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    out.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let rest = &self.format[start + 1..];
                    let index = rest
                        .find('}')
                        .and_then(|end| rest[..end].parse::<usize>().ok().map(|i| (i, end)));
                    match index {
                        Some((i, end)) if i < args.len() => {
                            out.push_str(&args[i]);
                            // Skip the digits and the closing brace
                            for _ in 0..=end {
                                chars.next();
                            }
                        }
                        _ => out.push('{'),
                    }
                }
                _ => out.push(c),
            }
        }

        out
    }
}

/// A diagnostic message with location and severity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub code: Option<DiagnosticCode>,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            code: None,
            span,
            message: message.into(),
        }
    }

    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            code: None,
            span,
            message: message.into(),
        }
    }

    pub fn note(span: Span, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Note,
            code: None,
            span,
            message: message.into(),
        }
    }

    pub fn info(span: Span, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            code: None,
            span,
            message: message.into(),
        }
    }

    /// Instantiate a template at the given location
    pub fn from_template(span: Span, diag: &Diag, args: &[String]) -> Self {
        Self {
            level: diag.level,
            code: Some(diag.code),
            span,
            message: diag.render(args),
        }
    }

    pub fn with_code(mut self, code: DiagnosticCode) -> Self {
        self.code = Some(code);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(
                f,
                "{}[{}] at {}: {}",
                self.level, code, self.span, self.message
            ),
            None => write!(f, "{} at {}: {}", self.level, self.span, self.message),
        }
    }
}

/// Trait for handling diagnostics
/// This allows for dependency injection and testing with mock handlers
pub trait DiagnosticHandler: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);

    /// Render a template with the given arguments and report it
    fn diagnose(&self, span: Span, diag: &Diag, args: &[String]) {
        self.report(Diagnostic::from_template(span, diag, args));
    }

    fn error(&self, span: Span, message: &str) {
        self.report(Diagnostic::error(span, message));
    }

    fn warning(&self, span: Span, message: &str) {
        self.report(Diagnostic::warning(span, message));
    }

    fn note(&self, span: Span, message: &str) {
        self.report(Diagnostic::note(span, message));
    }

    fn info(&self, span: Span, message: &str) {
        self.report(Diagnostic::info(span, message));
    }

    fn has_errors(&self) -> bool;
    fn error_count(&self) -> usize;
    fn warning_count(&self) -> usize;
    fn get_diagnostics(&self) -> Vec<Diagnostic>;
}

fn lock(diagnostics: &Mutex<Vec<Diagnostic>>) -> MutexGuard<'_, Vec<Diagnostic>> {
    diagnostics.lock().unwrap_or_else(PoisonError::into_inner)
}

fn count_level(diagnostics: &Mutex<Vec<Diagnostic>>, level: DiagnosticLevel) -> usize {
    lock(diagnostics)
        .iter()
        .filter(|d| d.level == level)
        .count()
}

/// Console-based diagnostic handler that prints to stderr
pub struct ConsoleDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
    pretty: bool,
}

impl ConsoleDiagnosticHandler {
    pub fn new(pretty: bool) -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            pretty,
        }
    }
}

impl DiagnosticHandler for ConsoleDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        let code = diagnostic
            .code
            .map(|code| format!("[{}]", code))
            .unwrap_or_default();

        if self.pretty {
            eprintln!(
                "\x1b[1m{}{}\x1b[0m at {}: {}",
                diagnostic.level, code, diagnostic.span, diagnostic.message
            );
        } else {
            eprintln!("{}", diagnostic);
        }

        lock(&self.diagnostics).push(diagnostic);
    }

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn error_count(&self) -> usize {
        count_level(&self.diagnostics, DiagnosticLevel::Error)
    }

    fn warning_count(&self) -> usize {
        count_level(&self.diagnostics, DiagnosticLevel::Warning)
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        lock(&self.diagnostics).clone()
    }
}

/// Collecting diagnostic handler for testing
/// Collects all diagnostics without printing
pub struct CollectingDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnosticHandler {
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    /// Drop everything collected so far
    pub fn clear(&self) {
        lock(&self.diagnostics).clear();
    }
}

impl Default for CollectingDiagnosticHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticHandler for CollectingDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        lock(&self.diagnostics).push(diagnostic);
    }

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn error_count(&self) -> usize {
        count_level(&self.diagnostics, DiagnosticLevel::Error)
    }

    fn warning_count(&self) -> usize {
        count_level(&self.diagnostics, DiagnosticLevel::Warning)
    }

    fn get_diagnostics(&self) -> Vec<Diagnostic> {
        lock(&self.diagnostics).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_creation() {
        let span = Span::new(0, 5, 1, 1);
        let diag = Diagnostic::error(span, "Test error");

        assert_eq!(diag.level, DiagnosticLevel::Error);
        assert_eq!(diag.message, "Test error");
        assert_eq!(diag.code, None);
    }

    #[test]
    fn test_collecting_handler() {
        let handler = CollectingDiagnosticHandler::new();
        let span = Span::new(0, 5, 1, 1);

        handler.error(span, "Error 1");
        handler.warning(span, "Warning 1");
        handler.error(span, "Error 2");
        handler.note(span, "Note 1");

        assert_eq!(handler.error_count(), 2);
        assert_eq!(handler.warning_count(), 1);
        assert!(handler.has_errors());
        assert_eq!(handler.get_diagnostics().len(), 4);

        handler.clear();
        assert!(handler.get_diagnostics().is_empty());
    }

    #[test]
    fn test_no_errors() {
        let handler = CollectingDiagnosticHandler::new();
        let span = Span::new(0, 5, 1, 1);

        handler.warning(span, "Warning 1");
        handler.info(span, "Info 1");
        handler.note(span, "Note 1");

        assert!(!handler.has_errors());
        assert_eq!(handler.error_count(), 0);
    }

    #[test]
    fn test_template_rendering() {
        let diag = Diag::error(
            error_codes::CIRCULAR_REFERENCE,
            "type of '{0}' depends on itself through {1}",
        );
        let rendered = diag.render(&["x".to_string(), "y".to_string()]);
        assert_eq!(rendered, "type of 'x' depends on itself through y");
    }

    #[test]
    fn test_template_missing_argument_kept() {
        let diag = Diag::error(error_codes::REQUEST_FAILED, "{0} and {3}");
        assert_eq!(diag.render(&["a".to_string()]), "a and {3}");
    }

    #[test]
    fn test_template_escaped_braces() {
        let diag = Diag::note(error_codes::CIRCULAR_REFERENCE_THROUGH, "{{{0}}}");
        assert_eq!(diag.render(&["inner".to_string()]), "{inner}");
    }

    #[test]
    fn test_diagnose_uses_template_level_and_code() {
        let handler = CollectingDiagnosticHandler::new();
        handler.diagnose(Span::dummy(), &Diag::CIRCULAR_REFERENCE_THROUGH, &[]);

        let diagnostics = handler.get_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].level, DiagnosticLevel::Note);
        assert_eq!(
            diagnostics[0].code,
            Some(error_codes::CIRCULAR_REFERENCE_THROUGH)
        );
        assert_eq!(diagnostics[0].message, "through reference here");
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error(Span::new(0, 1, 2, 3), "boom")
            .with_code(error_codes::REQUEST_FAILED);
        assert_eq!(diag.to_string(), "error[E0002] at 2:3: boom");
    }
}
