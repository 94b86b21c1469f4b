//! Located diagnostic records collected during a parse pass.
//!
//! User-input problems are never surfaced as `Err` values; they are appended
//! to a [`DiagnosticLog`] with a precise [`Location`] and reported alongside
//! the parse tree. The log is append-only during a parse and enumerates its
//! records ordered by stage, not by insertion order.

use serde::{Deserialize, Serialize};

use crate::source::Location;

/// Pipeline stage a diagnostic was recorded in.
///
/// The core parser only emits [`Parsing`](DiagnosticStage::Parsing)
/// diagnostics; the later stages exist so that schema validation and an
/// enclosing execution engine can share the same log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum DiagnosticStage {
    /// Tokenization and command/flag/argument matching.
    #[default]
    Parsing,
    /// Schema- or rule-level validation of an already-built parse tree.
    Validation,
    /// Problems reported while executing the resolved command.
    Execution,
}

/// A recoverable, located problem report.
///
/// # Examples
///
/// ```
/// use argtree_core::diagnostics::{Diagnostic, DiagnosticStage};
/// use argtree_core::source::{Location, Point};
///
/// let at = Location::new(Point::new(0, 0), Point::new(0, 5));
/// let diag = Diagnostic::parsing(at, "Unknown flag '--oops'");
/// assert_eq!(diag.stage, DiagnosticStage::Parsing);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Which stage recorded this diagnostic.
    pub stage: DiagnosticStage,
    /// The span of input the problem refers to.
    pub location: Location,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic for the given stage.
    pub fn new(stage: DiagnosticStage, location: Location, message: impl Into<String>) -> Self {
        Self {
            stage,
            location,
            message: message.into(),
        }
    }

    /// Creates a [`DiagnosticStage::Parsing`] diagnostic.
    pub fn parsing(location: Location, message: impl Into<String>) -> Self {
        Self::new(DiagnosticStage::Parsing, location, message)
    }
}

/// Ordered collection of diagnostics for one parse pass.
///
/// Appends keep insertion order internally; [`iter`](DiagnosticLog::iter)
/// yields records sorted by stage (stable within a stage), so parsing
/// problems always precede validation and execution problems regardless of
/// when they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticLog {
    records: Vec<Diagnostic>,
}

impl DiagnosticLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.records.push(diagnostic);
    }

    /// Whether no diagnostics were recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Diagnostics ordered by stage, insertion order preserved within a
    /// stage.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        let mut ordered: Vec<&Diagnostic> = self.records.iter().collect();
        ordered.sort_by_key(|d| d.stage);
        ordered.into_iter()
    }

    /// Diagnostics recorded for one stage, in insertion order.
    pub fn for_stage(&self, stage: DiagnosticStage) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(move |d| d.stage == stage)
    }

    /// Merges another log into this one.
    pub fn extend(&mut self, other: DiagnosticLog) {
        self.records.extend(other.records);
    }
}

impl<'a> IntoIterator for &'a DiagnosticLog {
    type Item = &'a Diagnostic;
    type IntoIter = std::vec::IntoIter<&'a Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        let mut ordered: Vec<&Diagnostic> = self.records.iter().collect();
        ordered.sort_by_key(|d| d.stage);
        ordered.into_iter()
    }
}
