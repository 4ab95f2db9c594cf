//! Tolerant parsing with tree-sitter.
//!
//! [`TolerantParser`] attempts a structured parse under a wall-clock budget
//! and reports any shortfall as a [`ParseFailure`] value. It never panics and
//! never returns a partial tree: a timed-out parse is reset, and a tree with
//! unrecoverable syntax errors is discarded so callers fall back to pattern
//! extraction on the raw text.

use std::time::Duration;

use camino::Utf8Path;
use tree_sitter::{Language, Node, Parser, Tree};
use xc_core::AnalyzerConfig;

use crate::error::{ParseError, ParseFailure};

/// Which grammar a file is parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Plain TypeScript (`.ts`). Angle-bracket casts are valid, JSX is not.
    TypeScript,
    /// TypeScript with JSX. Used for `.tsx` and every JavaScript flavor,
    /// since the TSX grammar accepts plain JavaScript and JSX alike.
    Tsx,
}

impl SourceKind {
    /// Picks the grammar from a file extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use xc_ts_parser::SourceKind;
    ///
    /// assert_eq!(SourceKind::from_path(Utf8Path::new("api.ts")), SourceKind::TypeScript);
    /// assert_eq!(SourceKind::from_path(Utf8Path::new("App.jsx")), SourceKind::Tsx);
    /// ```
    #[must_use]
    pub fn from_path(path: &Utf8Path) -> Self {
        match path.extension() {
            Some("ts" | "mts" | "cts") => Self::TypeScript,
            _ => Self::Tsx,
        }
    }

    /// Returns the tree-sitter language for this kind.
    #[must_use]
    pub fn language(self) -> Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// A successfully parsed syntax tree.
#[derive(Debug, Clone)]
pub struct ParseTree {
    tree: Tree,
    kind: SourceKind,
}

impl ParseTree {
    /// Returns the root node of the tree.
    #[must_use]
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Returns the grammar the tree was parsed with.
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        self.kind
    }
}

/// Failure counters accumulated by one parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseCounters {
    /// Parses rejected for syntax errors.
    pub parse_errors: u64,
    /// Parses that exceeded the budget.
    pub parse_timeouts: u64,
}

/// A tree-sitter parser that degrades instead of failing.
///
/// Holds one parser per grammar so a worker can parse `.ts` and `.tsx` files
/// without reconfiguring. `TolerantParser` is `Send` but not `Sync`; create
/// one per worker.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use xc_ts_parser::{ParseFailure, SourceKind, TolerantParser};
///
/// let mut parser = TolerantParser::new(Duration::from_secs(5), true)?;
/// assert!(parser.parse("const a = 1;", SourceKind::TypeScript).is_ok());
/// assert_eq!(
///     parser.parse("const = = ;", SourceKind::TypeScript).unwrap_err(),
///     ParseFailure::Syntax
/// );
/// assert_eq!(parser.counters().parse_errors, 1);
/// # Ok::<(), xc_ts_parser::ParseError>(())
/// ```
pub struct TolerantParser {
    typescript: Parser,
    tsx: Parser,
    timeout: Duration,
    enabled: bool,
    counters: ParseCounters,
}

impl TolerantParser {
    /// Creates a parser with the given budget.
    ///
    /// When `enabled` is false every call to [`parse`](Self::parse) returns
    /// [`ParseFailure::Disabled`] without touching tree-sitter.
    pub fn new(timeout: Duration, enabled: bool) -> Result<Self, ParseError> {
        let micros = u64::try_from(timeout.as_micros()).unwrap_or(u64::MAX).max(1);
        let mut typescript = Parser::new();
        typescript
            .set_language(&SourceKind::TypeScript.language())
            .map_err(|_| ParseError::LanguageInit)?;
        typescript.set_timeout_micros(micros);

        let mut tsx = Parser::new();
        tsx.set_language(&SourceKind::Tsx.language())
            .map_err(|_| ParseError::LanguageInit)?;
        tsx.set_timeout_micros(micros);

        Ok(Self {
            typescript,
            tsx,
            timeout,
            enabled,
            counters: ParseCounters::default(),
        })
    }

    /// Creates a parser from the analyzer configuration.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, ParseError> {
        Self::new(config.parse_timeout(), config.use_structured_parse)
    }

    /// Attempts a structured parse of `text`.
    ///
    /// Increments [`ParseCounters::parse_timeouts`] when the budget runs out
    /// and [`ParseCounters::parse_errors`] when the tree contains errors.
    pub fn parse(&mut self, text: &str, kind: SourceKind) -> Result<ParseTree, ParseFailure> {
        if !self.enabled {
            return Err(ParseFailure::Disabled);
        }
        let parser = match kind {
            SourceKind::TypeScript => &mut self.typescript,
            SourceKind::Tsx => &mut self.tsx,
        };

        let Some(tree) = parser.parse(text, None) else {
            // A cancelled parse resumes on the next call unless reset.
            parser.reset();
            self.counters.parse_timeouts += 1;
            tracing::debug!(budget_ms = self.timeout.as_millis(), "structured parse timed out");
            return Err(ParseFailure::Timeout);
        };

        if tree.root_node().has_error() {
            self.counters.parse_errors += 1;
            return Err(ParseFailure::Syntax);
        }

        Ok(ParseTree { tree, kind })
    }

    /// Returns the failure counters accumulated so far.
    #[must_use]
    pub const fn counters(&self) -> ParseCounters {
        self.counters
    }
}

impl std::fmt::Debug for TolerantParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TolerantParser")
            .field("timeout", &self.timeout)
            .field("enabled", &self.enabled)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write;

    use super::*;

    fn parser() -> TolerantParser {
        TolerantParser::new(Duration::from_secs(5), true).expect("Parser creation failed")
    }

    #[test]
    fn test_parse_typescript() {
        let mut parser = parser();
        let tree = parser
            .parse("interface User { id: number }", SourceKind::TypeScript)
            .expect("Parse failed");
        assert_eq!(tree.kind(), SourceKind::TypeScript);
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn test_parse_tsx() {
        let mut parser = parser();
        let source = "const App = () => <div className=\"x\">Hello</div>;";
        assert!(parser.parse(source, SourceKind::Tsx).is_ok());
        assert_eq!(parser.counters(), ParseCounters::default());
    }

    #[test]
    fn test_jsx_in_typescript_grammar_is_syntax_failure() {
        let mut parser = parser();
        let source = "const App = () => <div>Hello</div>;";
        assert_eq!(
            parser.parse(source, SourceKind::TypeScript).unwrap_err(),
            ParseFailure::Syntax
        );
        assert_eq!(parser.counters().parse_errors, 1);
    }

    #[test]
    fn test_disabled_parser() {
        let mut parser = TolerantParser::new(Duration::from_secs(5), false).unwrap();
        assert_eq!(
            parser.parse("const a = 1;", SourceKind::Tsx).unwrap_err(),
            ParseFailure::Disabled
        );
        assert_eq!(parser.counters(), ParseCounters::default());
    }

    #[test]
    fn test_timeout_counts_once_and_parser_recovers() {
        let mut source = String::new();
        for i in 0..20_000 {
            let _ = writeln!(source, "const value{i} = {{ a: [{i}, {i}, {i}], b: 'x{i}' }};");
        }
        let mut parser = TolerantParser::new(Duration::from_micros(1), true).unwrap();
        assert_eq!(
            parser.parse(&source, SourceKind::TypeScript).unwrap_err(),
            ParseFailure::Timeout
        );
        assert_eq!(parser.counters().parse_timeouts, 1);
        assert_eq!(parser.counters().parse_errors, 0);
    }

    #[test]
    fn test_source_kind_from_path() {
        assert_eq!(SourceKind::from_path(Utf8Path::new("a.tsx")), SourceKind::Tsx);
        assert_eq!(SourceKind::from_path(Utf8Path::new("a.mjs")), SourceKind::Tsx);
        assert_eq!(SourceKind::from_path(Utf8Path::new("a.ts")), SourceKind::TypeScript);
    }

    #[test]
    fn test_parser_debug() {
        let debug = format!("{:?}", parser());
        assert!(debug.contains("TolerantParser"));
    }
}
