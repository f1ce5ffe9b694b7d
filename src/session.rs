//! Session state the wizard operates on.
//!
//! A `SessionState` lives for exactly one wizard run. Only the
//! [`WizardController`](crate::wizard::WizardController) mutates it; every
//! other part of the program gets a shared reference.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Reserved workflow id for a user-described workflow.
pub const CUSTOM_WORKFLOW_ID: &str = "custom";

/// One step of the fixed, linear wizard sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Overview,
    ChooseWorkflow,
    PainPoints,
    Solutions,
    Results,
}

impl Stage {
    /// All stages in wizard order.
    pub const ALL: [Stage; 5] = [
        Stage::Overview,
        Stage::ChooseWorkflow,
        Stage::PainPoints,
        Stage::Solutions,
        Stage::Results,
    ];

    /// Index of the last stage.
    pub const LAST_INDEX: usize = 4;

    pub fn index(self) -> usize {
        match self {
            Self::Overview => 0,
            Self::ChooseWorkflow => 1,
            Self::PainPoints => 2,
            Self::Solutions => 3,
            Self::Results => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The following stage, or `None` on Results.
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// The preceding stage, or `None` on Overview.
    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Results
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Overview => "Mission Briefing",
            Self::ChooseWorkflow => "Choose Your Workflow",
            Self::PainPoints => "Find the Pain Points",
            Self::Solutions => "Design AI Solutions",
            Self::Results => "Case Closed",
        }
    }
}

/// How much a pain point hurts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

impl Severity {
    /// Cycle low -> medium -> high -> low.
    pub fn cycle(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// A user-entered workflow inefficiency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PainPoint {
    pub text: String,
    pub severity: Severity,
}

/// Where a solution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolutionOrigin {
    /// Picked from the AI-capability catalog.
    AiSuggested,
    /// Typed by the user.
    UserWritten,
}

impl SolutionOrigin {
    pub fn label(self) -> &'static str {
        match self {
            Self::AiSuggested => "ai-suggested",
            Self::UserWritten => "user-written",
        }
    }
}

/// A proposed remedy attached to one pain point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub text: String,
    pub origin: SolutionOrigin,
    pub created_at: DateTime<Utc>,
}

/// A one-time, non-revocable achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Badge {
    WorkflowExplorer,
    PainDetective,
    SolutionDesigner,
    MasterDetective,
}

impl Badge {
    pub const ALL: [Badge; 4] = [
        Badge::WorkflowExplorer,
        Badge::PainDetective,
        Badge::SolutionDesigner,
        Badge::MasterDetective,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::WorkflowExplorer => "workflow-explorer",
            Self::PainDetective => "pain-detective",
            Self::SolutionDesigner => "solution-designer",
            Self::MasterDetective => "master-detective",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::WorkflowExplorer => "Workflow Explorer",
            Self::PainDetective => "Pain Point Detective",
            Self::SolutionDesigner => "Solution Designer",
            Self::MasterDetective => "Master Detective",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::WorkflowExplorer => "🗺️",
            Self::PainDetective => "🔍",
            Self::SolutionDesigner => "💡",
            Self::MasterDetective => "🏆",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::WorkflowExplorer => "Selected a workflow to analyze",
            Self::PainDetective => "Identified 3 pain points",
            Self::SolutionDesigner => "Created 3 AI solutions",
            Self::MasterDetective => "Completed the full workflow analysis",
        }
    }
}

/// Mutable record for one wizard run.
///
/// `solutions`, `existing_tools` and `needed_tools` are keyed by pain-point
/// index and are not renumbered when a pain point is removed, so an entry can
/// end up pointing at a shifted or vanished pain point.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SessionState {
    pub stage: Stage,
    pub selected_workflow_id: Option<String>,
    pub custom_workflow_text: String,
    /// Live custom-workflow input, committed on leaving ChooseWorkflow.
    #[serde(skip)]
    pub custom_workflow_draft: String,
    pub pain_points: Vec<PainPoint>,
    pub focused_pain_point: Option<usize>,
    pub solutions: BTreeMap<usize, Vec<Solution>>,
    pub existing_tools: BTreeMap<usize, String>,
    pub needed_tools: BTreeMap<usize, String>,
    pub score: u32,
    pub earned_badges: BTreeSet<Badge>,
    /// Set once the overview has been left for the first time.
    pub journey_started: bool,
    /// Set once the completion bonus has been paid out.
    pub completion_awarded: bool,
    /// Pain indices whose tools have already earned points.
    pub tools_saved_for: BTreeSet<usize>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_custom_workflow(&self) -> bool {
        self.selected_workflow_id.as_deref() == Some(CUSTOM_WORKFLOW_ID)
    }

    pub fn focused(&self) -> Option<&PainPoint> {
        self.focused_pain_point.and_then(|i| self.pain_points.get(i))
    }

    /// Solutions for a pain index; a missing entry reads as empty.
    pub fn solutions_for(&self, pain_index: usize) -> &[Solution] {
        self.solutions
            .get(&pain_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total solutions across every pain index.
    pub fn total_solutions(&self) -> usize {
        self.solutions.values().map(Vec::len).sum()
    }

    pub fn has_any_solution(&self) -> bool {
        self.solutions.values().any(|s| !s.is_empty())
    }

    pub fn has_badge(&self, badge: Badge) -> bool {
        self.earned_badges.contains(&badge)
    }

    /// Recorded tools for a pain index as `(existing, needed)`.
    pub fn tools_for(&self, pain_index: usize) -> (&str, &str) {
        (
            self.existing_tools
                .get(&pain_index)
                .map(String::as_str)
                .unwrap_or(""),
            self.needed_tools
                .get(&pain_index)
                .map(String::as_str)
                .unwrap_or(""),
        )
    }

    /// Drop the pain point at `index` and keep the focus pointing at the
    /// same entry (or nothing, if the focused one went away).
    ///
    /// Side maps are left untouched. Caller must have checked the index.
    pub(crate) fn remove_pain_point_at(&mut self, index: usize) -> PainPoint {
        let removed = self.pain_points.remove(index);
        self.focused_pain_point = match self.focused_pain_point {
            Some(f) if f == index => None,
            Some(f) if f > index => Some(f - 1),
            other => other,
        };
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pain(text: &str) -> PainPoint {
        PainPoint {
            text: text.to_string(),
            severity: Severity::Medium,
        }
    }

    fn state_with(n: usize, focus: Option<usize>) -> SessionState {
        let mut state = SessionState::new();
        for i in 0..n {
            state.pain_points.push(pain(&format!("pain {}", i)));
        }
        state.focused_pain_point = focus;
        state
    }

    #[test]
    fn test_stage_index_roundtrip() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
            assert_eq!(Stage::from_index(i), Some(*stage));
        }
        assert_eq!(Stage::from_index(5), None);
    }

    #[test]
    fn test_stage_next_prev_bounds() {
        assert_eq!(Stage::Overview.prev(), None);
        assert_eq!(Stage::Results.next(), None);
        assert_eq!(Stage::Overview.next(), Some(Stage::ChooseWorkflow));
        assert_eq!(Stage::Results.prev(), Some(Stage::Solutions));
    }

    #[test]
    fn test_severity_cycle() {
        assert_eq!(Severity::default(), Severity::Medium);
        assert_eq!(Severity::Medium.cycle(), Severity::High);
        assert_eq!(Severity::High.cycle(), Severity::Low);
        assert_eq!(Severity::Low.cycle(), Severity::Medium);
    }

    #[test]
    fn test_badge_ids() {
        let ids: Vec<&str> = Badge::ALL.iter().map(|b| b.id()).collect();
        assert_eq!(
            ids,
            vec![
                "workflow-explorer",
                "pain-detective",
                "solution-designer",
                "master-detective"
            ]
        );
    }

    #[test]
    fn test_remove_focused_resets_focus() {
        let mut state = state_with(3, Some(1));
        state.remove_pain_point_at(1);
        assert_eq!(state.focused_pain_point, None);
        assert_eq!(state.pain_points.len(), 2);
    }

    #[test]
    fn test_remove_before_focus_decrements() {
        let mut state = state_with(3, Some(2));
        state.remove_pain_point_at(0);
        assert_eq!(state.focused_pain_point, Some(1));
        assert_eq!(state.focused().map(|p| p.text.as_str()), Some("pain 2"));
    }

    #[test]
    fn test_remove_after_focus_unchanged() {
        let mut state = state_with(3, Some(0));
        state.remove_pain_point_at(2);
        assert_eq!(state.focused_pain_point, Some(0));
    }

    #[test]
    fn test_remove_without_focus_keeps_none() {
        let mut state = state_with(2, None);
        state.remove_pain_point_at(0);
        assert_eq!(state.focused_pain_point, None);
    }

    #[test]
    fn test_missing_solution_entry_reads_empty() {
        let state = state_with(1, None);
        assert!(state.solutions_for(0).is_empty());
        assert_eq!(state.total_solutions(), 0);
        assert!(!state.has_any_solution());
    }

    #[test]
    fn test_empty_solution_vec_is_not_a_solution() {
        let mut state = state_with(1, None);
        state.solutions.insert(0, Vec::new());
        assert!(!state.has_any_solution());
    }

    #[test]
    fn test_tools_for_defaults_to_empty() {
        let mut state = state_with(2, None);
        state.existing_tools.insert(1, "Zoom".to_string());
        assert_eq!(state.tools_for(0), ("", ""));
        assert_eq!(state.tools_for(1), ("Zoom", ""));
    }

    #[test]
    fn test_state_serializes_with_tagged_solutions() {
        let mut state = state_with(1, Some(0));
        state.solutions.insert(
            0,
            vec![Solution {
                text: "Summarize notes".to_string(),
                origin: SolutionOrigin::AiSuggested,
                created_at: Utc::now(),
            }],
        );
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["stage"], "overview");
        assert_eq!(json["solutions"]["0"][0]["origin"], "ai-suggested");
        assert_eq!(json["pain_points"][0]["severity"], "medium");
    }
}
