//! Stage gates and input checks for the wizard.
//!
//! Each check is a pure function returning the rejection on failure and
//! `None` when the input is acceptable.

use crate::session::{SessionState, Stage};
use crate::wizard::Rejection;

/// Trim user text, returning `None` if nothing is left.
pub fn normalize_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// ChooseWorkflow gate.
///
/// A custom workflow passes if either the committed text or the live draft
/// has content.
fn check_workflow_choice(
    selected: Option<&str>,
    is_custom: bool,
    committed: &str,
    draft: &str,
) -> Option<Rejection> {
    if selected.is_none_or(str::is_empty) {
        return Some(Rejection::NoWorkflowSelected);
    }
    if is_custom && committed.trim().is_empty() && draft.trim().is_empty() {
        return Some(Rejection::CustomWorkflowUndescribed);
    }
    None
}

/// PainPoints gate.
fn check_pain_point_focus(count: usize, focused: Option<usize>) -> Option<Rejection> {
    if count == 0 {
        return Some(Rejection::NoPainPoints);
    }
    match focused {
        Some(i) if i < count => None,
        _ => Some(Rejection::NoPainPointFocused),
    }
}

/// Solutions gate: any solution anywhere will do.
fn check_any_solution(state: &SessionState) -> Option<Rejection> {
    if state.has_any_solution() {
        None
    } else {
        Some(Rejection::NoSolutions)
    }
}

/// Check whether `stage` may be left forward.
pub fn check_stage(state: &SessionState, stage: Stage) -> Option<Rejection> {
    match stage {
        Stage::Overview | Stage::Results => None,
        Stage::ChooseWorkflow => check_workflow_choice(
            state.selected_workflow_id.as_deref(),
            state.is_custom_workflow(),
            &state.custom_workflow_text,
            &state.custom_workflow_draft,
        ),
        Stage::PainPoints => {
            check_pain_point_focus(state.pain_points.len(), state.focused_pain_point)
        }
        Stage::Solutions => check_any_solution(state),
    }
}

/// Check that `index` addresses an existing pain point.
pub fn check_pain_index(state: &SessionState, index: usize) -> Option<Rejection> {
    if index < state.pain_points.len() {
        None
    } else {
        Some(Rejection::NoSuchPainPoint { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{PainPoint, Severity, Solution, SolutionOrigin};
    use chrono::Utc;

    // normalize_text

    #[test]
    fn test_normalize_text_trims() {
        assert_eq!(normalize_text("  notes  "), Some("notes".to_string()));
    }

    #[test]
    fn test_normalize_text_whitespace_only() {
        assert_eq!(normalize_text(" \t\n "), None);
        assert_eq!(normalize_text(""), None);
    }

    // check_workflow_choice

    #[test]
    fn test_workflow_unset() {
        assert_eq!(
            check_workflow_choice(None, false, "", ""),
            Some(Rejection::NoWorkflowSelected)
        );
        assert_eq!(
            check_workflow_choice(Some(""), false, "", ""),
            Some(Rejection::NoWorkflowSelected)
        );
    }

    #[test]
    fn test_workflow_catalog_id_passes() {
        assert_eq!(check_workflow_choice(Some("meetings"), false, "", ""), None);
    }

    #[test]
    fn test_custom_workflow_needs_text() {
        assert_eq!(
            check_workflow_choice(Some("custom"), true, "", "   "),
            Some(Rejection::CustomWorkflowUndescribed)
        );
    }

    #[test]
    fn test_custom_workflow_live_draft_counts() {
        assert_eq!(
            check_workflow_choice(Some("custom"), true, "", "volunteer intake"),
            None
        );
    }

    #[test]
    fn test_custom_workflow_committed_text_counts() {
        assert_eq!(
            check_workflow_choice(Some("custom"), true, "volunteer intake", ""),
            None
        );
    }

    // check_pain_point_focus

    #[test]
    fn test_pain_points_empty() {
        assert_eq!(
            check_pain_point_focus(0, None),
            Some(Rejection::NoPainPoints)
        );
    }

    #[test]
    fn test_pain_points_unfocused() {
        assert_eq!(
            check_pain_point_focus(2, None),
            Some(Rejection::NoPainPointFocused)
        );
    }

    #[test]
    fn test_pain_points_out_of_range_focus() {
        assert_eq!(
            check_pain_point_focus(2, Some(2)),
            Some(Rejection::NoPainPointFocused)
        );
    }

    #[test]
    fn test_pain_points_focused() {
        assert_eq!(check_pain_point_focus(2, Some(1)), None);
    }

    // check_stage

    #[test]
    fn test_ungated_stages() {
        let state = SessionState::new();
        assert_eq!(check_stage(&state, Stage::Overview), None);
        assert_eq!(check_stage(&state, Stage::Results), None);
    }

    #[test]
    fn test_solutions_anywhere_pass() {
        let mut state = SessionState::new();
        for text in ["a", "b"] {
            state.pain_points.push(PainPoint {
                text: text.to_string(),
                severity: Severity::Medium,
            });
        }
        state.focused_pain_point = Some(0);
        assert_eq!(
            check_stage(&state, Stage::Solutions),
            Some(Rejection::NoSolutions)
        );

        // A solution on a pain point other than the focused one still passes
        state.solutions.insert(
            1,
            vec![Solution {
                text: "Drafting".to_string(),
                origin: SolutionOrigin::AiSuggested,
                created_at: Utc::now(),
            }],
        );
        assert_eq!(check_stage(&state, Stage::Solutions), None);
    }

    // check_pain_index

    #[test]
    fn test_pain_index_bounds() {
        let mut state = SessionState::new();
        assert_eq!(
            check_pain_index(&state, 0),
            Some(Rejection::NoSuchPainPoint { index: 0 })
        );
        state.pain_points.push(PainPoint {
            text: "x".to_string(),
            severity: Severity::Low,
        });
        assert_eq!(check_pain_index(&state, 0), None);
    }
}
