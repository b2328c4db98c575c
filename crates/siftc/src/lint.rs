use tracing::{debug, info};

use crate::checks::{equals_incompatible_type, set_for_contains, type_to_string, CheckId};
use crate::config::LintOptions;
use crate::diagnostics::{Diagnostic, Report};
use crate::fix::FixError;
use crate::oracle::{CompatibilityOracle, StructuralOracle};
use crate::state::VisitorState;
use crate::text_patch::{self, PatchError};
use crate::tree::walk::{try_walk, VisitAction};
use crate::tree::{CompilationUnit, NodeKind};

#[derive(Debug, thiserror::Error)]
pub enum LintError {
    #[error("{check:?} produced conflicting edits")]
    Fix {
        check: CheckId,
        #[source]
        source: FixError,
    },
}

pub fn lint_unit(unit: &CompilationUnit, options: &LintOptions) -> Result<Report, LintError> {
    lint_unit_with_oracle(unit, options, &StructuralOracle)
}

/// Runs every enabled check over every class of the unit, visiting each node
/// once in source order.
pub fn lint_unit_with_oracle(
    unit: &CompilationUnit,
    options: &LintOptions,
    oracle: &dyn CompatibilityOracle,
) -> Result<Report, LintError> {
    let root = VisitorState::new(unit, options, oracle);
    let narrow = options.is_enabled(CheckId::ImmutableSetForContains);
    let equality = options.is_enabled(CheckId::EqualsIncompatibleType);
    let to_string = options.is_enabled(CheckId::TypeToString);

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for class in &unit.classes {
        try_walk(unit, *class, |id, path| {
            let state = root.at(path);
            match unit.kind(id) {
                NodeKind::Class { .. } if narrow => {
                    let found = set_for_contains::check_class(id, &state).map_err(|source| {
                        LintError::Fix {
                            check: CheckId::ImmutableSetForContains,
                            source,
                        }
                    })?;
                    diagnostics.extend(found);
                }
                NodeKind::Call { .. } => {
                    if equality {
                        diagnostics.extend(equals_incompatible_type::check_call(id, &state));
                    }
                    if to_string {
                        diagnostics.extend(type_to_string::check_call(id, &state));
                    }
                }
                _ => {}
            }
            Ok::<_, LintError>(VisitAction::Descend)
        })?;
    }

    debug!(path = %unit.path, diagnostics = diagnostics.len(), "lint finished");
    let mut report = Report::ok().with_diagnostics(diagnostics);
    report
        .meta
        .insert("path".to_string(), unit.path.clone().into());
    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    pub source: String,
    pub applied: usize,
    /// Codes of diagnostics whose quickfix overlapped an earlier one.
    pub skipped: Vec<String>,
}

/// Applies the quickfixes of `report` to the unit source. When two quickfixes
/// overlap the earlier one wins.
pub fn apply_report_fixes(unit: &CompilationUnit, report: &Report) -> Result<FixOutcome, PatchError> {
    let with_fix: Vec<&Diagnostic> = report
        .diagnostics
        .iter()
        .filter(|d| d.quickfix.is_some())
        .collect();
    let quickfixes: Vec<_> = with_fix
        .iter()
        .filter_map(|d| d.quickfix.clone())
        .collect();
    let (accepted, skipped_idx) = text_patch::partition_non_overlapping(&quickfixes);
    let skipped: Vec<String> = skipped_idx
        .iter()
        .filter_map(|idx| with_fix.get(*idx))
        .map(|d| d.code.clone())
        .collect();
    for code in &skipped {
        info!(%code, "skipping overlapping quickfix");
    }
    let source = text_patch::apply_quickfixes(unit, &accepted)?;
    Ok(FixOutcome {
        source,
        applied: accepted.len(),
        skipped,
    })
}
