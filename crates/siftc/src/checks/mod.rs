use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, Location, Severity, Stage};
use crate::state::VisitorState;
use crate::tree::NodeId;

pub mod equals_incompatible_type;
pub mod set_for_contains;
pub mod type_to_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    EqualsIncompatibleType,
    ImmutableSetForContains,
    TypeToString,
}

impl CheckId {
    pub const ALL: [CheckId; 3] = [
        CheckId::EqualsIncompatibleType,
        CheckId::ImmutableSetForContains,
        CheckId::TypeToString,
    ];

    pub fn code(self) -> &'static str {
        match self {
            CheckId::EqualsIncompatibleType => "SIFT-EQ-0001",
            CheckId::ImmutableSetForContains => "SIFT-SET-0001",
            CheckId::TypeToString => "SIFT-TOSTR-0001",
        }
    }

    /// Key used in config files.
    pub fn name(self) -> &'static str {
        match self {
            CheckId::EqualsIncompatibleType => "equals_incompatible_type",
            CheckId::ImmutableSetForContains => "immutable_set_for_contains",
            CheckId::TypeToString => "type_to_string",
        }
    }

    pub fn default_severity(self) -> Severity {
        match self {
            CheckId::EqualsIncompatibleType => Severity::Warning,
            CheckId::ImmutableSetForContains => Severity::Info,
            CheckId::TypeToString => Severity::Hint,
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            CheckId::EqualsIncompatibleType => {
                "An equality test between objects with incompatible types always returns false"
            }
            CheckId::ImmutableSetForContains => set_for_contains::MESSAGE,
            CheckId::TypeToString => type_to_string::MESSAGE,
        }
    }
}

/// Diagnostic for `check` anchored at `anchor`, or `None` when the check is
/// turned off.
pub(crate) fn diagnostic(
    state: &VisitorState<'_>,
    check: CheckId,
    anchor: NodeId,
    message: String,
) -> Option<Diagnostic> {
    let severity = state.options.severity_for(check)?;
    let mut d = Diagnostic::new(check.code(), severity, Stage::Lint, message);
    d.loc = Some(Location::in_unit(state.unit, state.unit.node(anchor).span));
    Some(d)
}
