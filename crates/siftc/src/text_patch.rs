use std::collections::BTreeMap;

use crate::diagnostics::{ImportEdit, Quickfix};
use crate::fix::{Fix, FixError};
use crate::tree::{CompilationUnit, ImportDecl, Span};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("edit at {start}..{end} is outside the source ({len} bytes) or not on a char boundary")]
    BadSpan { start: u32, end: u32, len: usize },
    #[error(transparent)]
    Overlap(#[from] FixError),
}

/// Applies every quickfix to the unit source and returns the new text.
///
/// Edits from all quickfixes must be pairwise disjoint. Requested imports that
/// the unit already has are skipped.
pub fn apply_quickfixes(unit: &CompilationUnit, fixes: &[Quickfix]) -> Result<String, PatchError> {
    let mut combined = Fix::new();
    for qf in fixes {
        for edit in &qf.edits {
            check_span(&unit.source, edit.span)?;
            combined.replace(edit.span, edit.replacement.clone())?;
        }
    }

    let mut wanted: Vec<&ImportEdit> = fixes.iter().flat_map(|qf| qf.imports.iter()).collect();
    // Static block first, then by path.
    wanted.sort_by(|a, b| b.is_static.cmp(&a.is_static).then_with(|| a.path.cmp(&b.path)));
    wanted.dedup();

    let mut insertions: BTreeMap<u32, String> = BTreeMap::new();
    for import in wanted {
        if import_present(unit, import) {
            continue;
        }
        let (at, text) = import_insertion(unit, import);
        insertions.entry(at).or_default().push_str(&text);
    }

    let mut ops: Vec<(Span, &str)> = combined
        .edits()
        .iter()
        .map(|e| (e.span, e.replacement.as_str()))
        .collect();
    ops.extend(
        insertions
            .iter()
            .map(|(at, text)| (Span::new(*at, *at), text.as_str())),
    );
    // Back to front; on a shared start the wider edit goes first so an
    // insertion ends up before the replaced text.
    ops.sort_by(|a, b| b.0.cmp(&a.0));

    let mut out = unit.source.clone();
    for (span, text) in ops {
        out.replace_range(span.range(), text);
    }
    Ok(out)
}

/// Splits quickfixes into those that can be applied together (first one wins)
/// and the indices of the ones that overlap an earlier accepted quickfix.
pub fn partition_non_overlapping(fixes: &[Quickfix]) -> (Vec<Quickfix>, Vec<usize>) {
    let mut accepted_edits = Fix::new();
    let mut accepted = Vec::new();
    let mut skipped = Vec::new();
    for (idx, qf) in fixes.iter().enumerate() {
        let mut trial = accepted_edits.clone();
        let fits = qf
            .edits
            .iter()
            .all(|e| trial.replace(e.span, e.replacement.clone()).is_ok());
        if fits {
            accepted_edits = trial;
            accepted.push(qf.clone());
        } else {
            skipped.push(idx);
        }
    }
    (accepted, skipped)
}

fn check_span(source: &str, span: Span) -> Result<(), PatchError> {
    let ok = span.start <= span.end
        && (span.end as usize) <= source.len()
        && source.is_char_boundary(span.start as usize)
        && source.is_char_boundary(span.end as usize);
    if ok {
        Ok(())
    } else {
        Err(PatchError::BadSpan {
            start: span.start,
            end: span.end,
            len: source.len(),
        })
    }
}

fn import_present(unit: &CompilationUnit, import: &ImportEdit) -> bool {
    if unit.is_import_present(&import.path, import.is_static) {
        return true;
    }
    match import.path.rsplit_once('.') {
        Some((owner, _)) => unit.is_import_present(&format!("{owner}.*"), import.is_static),
        None => false,
    }
}

fn import_line(import: &ImportEdit) -> String {
    if import.is_static {
        format!("import static {};", import.path)
    } else {
        format!("import {};", import.path)
    }
}

/// Offset and text that place `import` in sorted position within its block.
fn import_insertion(unit: &CompilationUnit, import: &ImportEdit) -> (u32, String) {
    let line = import_line(import);
    let same: Vec<&ImportDecl> = unit
        .imports
        .iter()
        .filter(|i| i.is_static == import.is_static)
        .collect();
    if let Some(next) = same.iter().find(|i| i.path > import.path) {
        return (next.span.start, format!("{line}\n"));
    }
    if let Some(last) = same.last() {
        return (last.span.end, format!("\n{line}"));
    }
    if import.is_static {
        if let Some(first_regular) = unit.imports.iter().find(|i| !i.is_static) {
            return (first_regular.span.start, format!("{line}\n\n"));
        }
    } else if let Some(last_static) = unit.imports.iter().filter(|i| i.is_static).last() {
        return (last_static.span.end, format!("\n\n{line}"));
    }
    match &unit.package {
        Some(pkg) => (pkg.span.end, format!("\n\n{line}")),
        None => (0, format!("{line}\n\n")),
    }
}
