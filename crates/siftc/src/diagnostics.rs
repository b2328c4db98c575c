use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sift_contracts::SIFT_DIAG_SCHEMA_VERSION;

use crate::tree::{CompilationUnit, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Parse,
    Lint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Location {
    Text {
        range: TextRange,
        #[serde(skip_serializing_if = "Option::is_none")]
        snippet: Option<String>,
    },
}

impl Location {
    /// Text location of `span` in `unit`, with 1-based line and column.
    pub fn in_unit(unit: &CompilationUnit, span: Span) -> Self {
        let snippet = unit
            .source
            .get(span.range())
            .and_then(|s| s.lines().next())
            .map(str::to_string);
        Location::Text {
            range: TextRange {
                start: position_at(&unit.source, span.start),
                end: position_at(&unit.source, span.end),
                file: Some(unit.path.clone()),
            },
            snippet,
        }
    }

    pub fn offset(&self) -> Option<u64> {
        match self {
            Location::Text { range, .. } => range.start.offset,
        }
    }
}

fn position_at(source: &str, offset: u32) -> Position {
    let offset = (offset as usize).min(source.len());
    let before = source.get(..offset).unwrap_or_default();
    let line = before.matches('\n').count() as u32 + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = before[line_start..].chars().count() as u32 + 1;
    Position {
        line,
        col,
        offset: Some(offset as u64),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub col: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quickfix {
    pub kind: QuickfixKind,
    pub edits: Vec<TextEdit>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<ImportEdit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickfixKind {
    TextEdits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub span: Span,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImportEdit {
    pub path: String,
    #[serde(default)]
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub stage: Stage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quickfix: Option<Quickfix>,
}

impl Diagnostic {
    pub fn new(code: &str, severity: Severity, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity,
            stage,
            message: message.into(),
            loc: None,
            notes: Vec::new(),
            data: BTreeMap::new(),
            quickfix: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub schema_version: String,
    pub ok: bool,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Value>,
}

impl Report {
    pub fn ok() -> Self {
        Self {
            schema_version: SIFT_DIAG_SCHEMA_VERSION.to_string(),
            ok: true,
            diagnostics: Vec::new(),
            meta: BTreeMap::new(),
        }
    }

    pub fn with_diagnostics(mut self, mut diagnostics: Vec<Diagnostic>) -> Self {
        diagnostics.sort_by(|a, b| {
            let ap = a.loc.as_ref().and_then(Location::offset).unwrap_or(0);
            let bp = b.loc.as_ref().and_then(Location::offset).unwrap_or(0);
            ap.cmp(&bp)
                .then_with(|| a.code.cmp(&b.code))
                .then_with(|| a.message.cmp(&b.message))
        });
        self.ok = diagnostics.iter().all(|d| d.severity != Severity::Error);
        self.diagnostics = diagnostics;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based_and_count_chars() {
        let src = "ab\nçd x";
        let p = position_at(src, "ab\nçd ".len() as u32);
        assert_eq!((p.line, p.col), (2, 4));
        let p = position_at(src, 0);
        assert_eq!((p.line, p.col), (1, 1));
    }

    #[test]
    fn report_orders_by_offset_then_code() {
        let at = |offset: u64, code: &str| {
            let mut d = Diagnostic::new(code, Severity::Warning, Stage::Lint, "m");
            d.loc = Some(Location::Text {
                range: TextRange {
                    start: Position {
                        line: 1,
                        col: 1,
                        offset: Some(offset),
                    },
                    end: Position {
                        line: 1,
                        col: 1,
                        offset: Some(offset),
                    },
                    file: None,
                },
                snippet: None,
            });
            d
        };
        let report = Report::ok().with_diagnostics(vec![at(9, "B"), at(3, "Z"), at(9, "A")]);
        let codes: Vec<&str> = report.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["Z", "A", "B"]);
        assert!(report.ok);
    }
}
