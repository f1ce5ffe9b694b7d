//! Read-only projections of the session for rendering.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::catalog::Catalog;
use crate::session::{Badge, SessionState, Stage};
use crate::validators::check_stage;
use crate::wizard::{Notice, Rejection, ViewRefresher};

const PROGRESS_MESSAGES: [&str; 5] = [
    "Ready to begin your detective journey!",
    "🧭 Context identified - great start!",
    "🔍 Pain points discovered - you're on the trail!",
    "🎯 Solutions designed - almost there!",
    "🎉 Mission complete - you did it!",
];

/// Highest threshold first.
const SCORE_MESSAGES: [(u32, &str); 5] = [
    (
        200,
        "🌟 AI Detective Master! You've uncovered game-changing opportunities!",
    ),
    (
        150,
        "🎯 Expert Detective! Your workflow transformation plan is solid!",
    ),
    (
        100,
        "💪 Great Detective Work! You've identified key improvements!",
    ),
    (
        50,
        "👍 Good Start! You've begun your AI enhancement journey!",
    ),
    (
        0,
        "✨ Journey Started! Every step counts towards improvement!",
    ),
];

pub fn progress_percent(stage: Stage) -> u16 {
    (stage.index() * 100 / Stage::LAST_INDEX) as u16
}

pub fn progress_message(stage: Stage) -> &'static str {
    PROGRESS_MESSAGES[stage.index()]
}

pub fn score_message(score: u32) -> &'static str {
    SCORE_MESSAGES
        .iter()
        .find(|(threshold, _)| score >= *threshold)
        .map(|(_, message)| *message)
        .unwrap_or(SCORE_MESSAGES[SCORE_MESSAGES.len() - 1].1)
}

pub fn help_text(stage: Stage) -> &'static str {
    match stage {
        Stage::Overview => {
            "This tool helps you identify workflows that could benefit from AI enhancement. \
             You'll earn points and badges as you complete each step!"
        }
        Stage::ChooseWorkflow => {
            "Choose the type of work that takes up too much of your time. Be specific - the more \
             detailed you are, the better solutions we can suggest."
        }
        Stage::PainPoints => {
            "Think about specific tasks that are repetitive, time-consuming, or error-prone. \
             These are perfect candidates for AI assistance."
        }
        Stage::Solutions => {
            "Match AI capabilities to your pain points. Pick a suggested capability or write \
             your own custom solution."
        }
        Stage::Results => "Export your plan and share it with your team.",
    }
}

/// Title of the chosen workflow: the catalog title, or the custom text.
pub fn workflow_title(state: &SessionState, catalog: &Catalog) -> Option<String> {
    let id = state.selected_workflow_id.as_deref()?;
    if state.is_custom_workflow() {
        let text = if state.custom_workflow_text.is_empty() {
            state.custom_workflow_draft.trim()
        } else {
            state.custom_workflow_text.as_str()
        };
        return Some(if text.is_empty() {
            "Custom Workflow".to_string()
        } else {
            text.to_string()
        });
    }
    catalog.workflow(id).map(|w| w.title.clone())
}

/// One of the Context / Objective / Method steps.
///
/// Step `i` is completed once the stage index passes `i` and active while
/// the stage index is `i + 1`; both can hold at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompasStep {
    pub name: &'static str,
    pub description: &'static str,
    pub completed: bool,
    pub active: bool,
}

const COMPAS_STEPS: [(&str, &str); 3] = [
    ("Context", "Choose workflow"),
    ("Objective", "Identify pain & solutions"),
    ("Method", "Plan implementation"),
];

fn compas_steps(stage: Stage) -> Vec<CompasStep> {
    let current = stage.index();
    COMPAS_STEPS
        .iter()
        .enumerate()
        .map(|(i, &(name, description))| CompasStep {
            name,
            description,
            completed: current > i,
            active: current == i + 1,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavState {
    pub visible: bool,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub next_label: &'static str,
    /// Why the next button is disabled.
    pub blocking: Option<Rejection>,
}

impl NavState {
    fn derive(state: &SessionState) -> Self {
        let stage = state.stage;
        let blocking = if stage.is_terminal() {
            None
        } else {
            check_stage(state, stage)
        };
        Self {
            visible: !matches!(stage, Stage::Overview | Stage::Results),
            prev_enabled: stage.prev().is_some(),
            next_enabled: !stage.is_terminal() && blocking.is_none(),
            next_label: if stage == Stage::Solutions {
                "🎉 See Your Results! ➡️"
            } else {
                "Next Step ➡️"
            },
            blocking,
        }
    }
}

/// A pain point other than the focused one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherPainPoint {
    pub index: usize,
    pub text: String,
    pub has_solutions: bool,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageView {
    pub stage: Stage,
    pub title: &'static str,
    pub progress_percent: u16,
    pub progress_message: &'static str,
    pub help: &'static str,
    pub nav: NavState,
    pub compas: Vec<CompasStep>,
    pub score: u32,
    pub badges: Vec<Badge>,
    pub workflow_title: Option<String>,
    pub focused: Option<(usize, String)>,
    pub other_pain_points: Vec<OtherPainPoint>,
    /// Only set on Results.
    pub score_message: Option<&'static str>,
}

impl StageView {
    pub fn derive(state: &SessionState, catalog: &Catalog) -> Self {
        let stage = state.stage;
        let focused = state
            .focused_pain_point
            .and_then(|i| state.pain_points.get(i).map(|p| (i, p.text.clone())));
        let other_pain_points = state
            .pain_points
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != state.focused_pain_point)
            .map(|(index, p)| OtherPainPoint {
                index,
                text: p.text.clone(),
                has_solutions: !state.solutions_for(index).is_empty(),
            })
            .collect();

        Self {
            stage,
            title: stage.title(),
            progress_percent: progress_percent(stage),
            progress_message: progress_message(stage),
            help: help_text(stage),
            nav: NavState::derive(state),
            compas: compas_steps(stage),
            score: state.score,
            badges: state.earned_badges.iter().copied().collect(),
            workflow_title: workflow_title(state, catalog),
            focused,
            other_pain_points,
            score_message: stage.is_terminal().then(|| score_message(state.score)),
        }
    }
}

/// [`ViewRefresher`] that keeps the latest [`StageView`] and queues notices
/// for the terminal front end to pick up.
#[derive(Debug)]
pub struct ViewCache {
    catalog: Rc<Catalog>,
    current: StageView,
    notices: VecDeque<Notice>,
    refreshes: usize,
}

impl ViewCache {
    pub fn new(catalog: impl Into<Rc<Catalog>>) -> Self {
        let catalog = catalog.into();
        let current = StageView::derive(&SessionState::new(), &catalog);
        Self {
            catalog,
            current,
            notices: VecDeque::new(),
            refreshes: 0,
        }
    }

    pub fn current(&self) -> &StageView {
        &self.current
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes
    }

    pub fn pop_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }
}

impl ViewRefresher for ViewCache {
    fn on_stage_change(&mut self, _stage: Stage, state: &SessionState) {
        self.current = StageView::derive(state, &self.catalog);
        self.refreshes += 1;
    }

    fn on_notice(&mut self, notice: &Notice) {
        self.notices.push_back(notice.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{PainPoint, Severity, Solution, SolutionOrigin};
    use crate::wizard::{Rules, WizardController};
    use chrono::Utc;

    fn state_at(stage: Stage) -> SessionState {
        SessionState {
            stage,
            ..SessionState::new()
        }
    }

    fn pain(text: &str) -> PainPoint {
        PainPoint {
            text: text.to_string(),
            severity: Severity::Medium,
        }
    }

    #[test]
    fn test_progress_percent() {
        let percents: Vec<u16> = Stage::ALL.iter().map(|s| progress_percent(*s)).collect();
        assert_eq!(percents, vec![0, 25, 50, 75, 100]);
    }

    #[test]
    fn test_progress_messages() {
        assert_eq!(
            progress_message(Stage::Overview),
            "Ready to begin your detective journey!"
        );
        assert_eq!(
            progress_message(Stage::Results),
            "🎉 Mission complete - you did it!"
        );
    }

    #[test]
    fn test_score_message_thresholds() {
        assert!(score_message(0).starts_with("✨"));
        assert!(score_message(49).starts_with("✨"));
        assert!(score_message(50).starts_with("👍"));
        assert!(score_message(100).starts_with("💪"));
        assert!(score_message(150).starts_with("🎯"));
        assert!(score_message(199).starts_with("🎯"));
        assert!(score_message(200).starts_with("🌟"));
        assert!(score_message(10_000).starts_with("🌟"));
    }

    #[test]
    fn test_nav_hidden_on_first_and_last() {
        let catalog = Catalog::builtin();
        assert!(!StageView::derive(&state_at(Stage::Overview), &catalog).nav.visible);
        assert!(!StageView::derive(&state_at(Stage::Results), &catalog).nav.visible);
        assert!(StageView::derive(&state_at(Stage::PainPoints), &catalog).nav.visible);
    }

    #[test]
    fn test_nav_next_label() {
        let catalog = Catalog::builtin();
        let view = StageView::derive(&state_at(Stage::Solutions), &catalog);
        assert_eq!(view.nav.next_label, "🎉 See Your Results! ➡️");
        let view = StageView::derive(&state_at(Stage::PainPoints), &catalog);
        assert_eq!(view.nav.next_label, "Next Step ➡️");
    }

    #[test]
    fn test_nav_blocking_reason() {
        let catalog = Catalog::builtin();
        let mut state = state_at(Stage::PainPoints);
        let view = StageView::derive(&state, &catalog);
        assert!(!view.nav.next_enabled);
        assert_eq!(view.nav.blocking, Some(Rejection::NoPainPoints));

        state.pain_points.push(pain("a"));
        state.focused_pain_point = Some(0);
        let view = StageView::derive(&state, &catalog);
        assert!(view.nav.next_enabled);
        assert!(view.nav.prev_enabled);
        assert_eq!(view.nav.blocking, None);
    }

    #[test]
    fn test_nav_follows_custom_draft() {
        let catalog = Catalog::builtin();
        let mut state = state_at(Stage::ChooseWorkflow);
        state.selected_workflow_id = Some("custom".to_string());
        assert!(!StageView::derive(&state, &catalog).nav.next_enabled);
        state.custom_workflow_draft = "Board reports".to_string();
        assert!(StageView::derive(&state, &catalog).nav.next_enabled);
    }

    #[test]
    fn test_compas_steps() {
        let flags = |stage| -> Vec<(bool, bool)> {
            compas_steps(stage)
                .iter()
                .map(|s| (s.completed, s.active))
                .collect()
        };
        let (done, active, idle) = ((true, false), (true, true), (false, false));
        assert_eq!(flags(Stage::Overview), vec![idle, idle, idle]);
        assert_eq!(flags(Stage::ChooseWorkflow), vec![active, idle, idle]);
        assert_eq!(flags(Stage::PainPoints), vec![done, active, idle]);
        assert_eq!(flags(Stage::Solutions), vec![done, done, active]);
        assert_eq!(flags(Stage::Results), vec![done, done, done]);
        assert_eq!(compas_steps(Stage::Overview)[1].name, "Objective");
    }

    #[test]
    fn test_other_pain_points_exclude_focus() {
        let catalog = Catalog::builtin();
        let mut state = state_at(Stage::Solutions);
        state.pain_points = vec![pain("a"), pain("b"), pain("c")];
        state.focused_pain_point = Some(1);
        state.solutions.insert(
            2,
            vec![Solution {
                text: "Drafting".to_string(),
                origin: SolutionOrigin::AiSuggested,
                created_at: Utc::now(),
            }],
        );

        let view = StageView::derive(&state, &catalog);
        assert_eq!(view.focused, Some((1, "b".to_string())));
        assert_eq!(
            view.other_pain_points,
            vec![
                OtherPainPoint {
                    index: 0,
                    text: "a".to_string(),
                    has_solutions: false,
                },
                OtherPainPoint {
                    index: 2,
                    text: "c".to_string(),
                    has_solutions: true,
                },
            ]
        );
    }

    #[test]
    fn test_score_message_only_on_results() {
        let catalog = Catalog::builtin();
        assert_eq!(StageView::derive(&state_at(Stage::Solutions), &catalog).score_message, None);
        let mut state = state_at(Stage::Results);
        state.score = 120;
        assert_eq!(
            StageView::derive(&state, &catalog).score_message,
            Some("💪 Great Detective Work! You've identified key improvements!")
        );
    }

    #[test]
    fn test_workflow_title() {
        let catalog = Catalog::builtin();
        let mut state = SessionState::new();
        assert_eq!(workflow_title(&state, &catalog), None);

        state.selected_workflow_id = Some("meetings".to_string());
        assert_eq!(
            workflow_title(&state, &catalog).as_deref(),
            Some("Meeting Management")
        );

        state.selected_workflow_id = Some("custom".to_string());
        assert_eq!(
            workflow_title(&state, &catalog).as_deref(),
            Some("Custom Workflow")
        );
        state.custom_workflow_text = "Grant intake".to_string();
        assert_eq!(
            workflow_title(&state, &catalog).as_deref(),
            Some("Grant intake")
        );
    }

    #[test]
    fn test_view_cache_tracks_controller() {
        let catalog = Rc::new(Catalog::builtin());
        let mut wizard = WizardController::new(
            Rc::clone(&catalog),
            Rules::default(),
            ViewCache::new(catalog),
        );
        assert_eq!(wizard.view().refreshes(), 1);

        wizard.advance().unwrap();
        wizard.select_workflow("data").unwrap();
        let view = wizard.view().current();
        assert_eq!(view.stage, Stage::ChooseWorkflow);
        assert_eq!(view.score, 35);
        assert_eq!(view.badges, vec![Badge::WorkflowExplorer]);
        assert!(view.nav.next_enabled);

        let cache = wizard.view_mut();
        assert!(matches!(
            cache.pop_notice(),
            Some(Notice::PointsAwarded { points: 5, .. })
        ));
        let mut rest = 0;
        while cache.pop_notice().is_some() {
            rest += 1;
        }
        assert_eq!(rest, 3);
    }

    #[test]
    fn test_view_cache_not_refreshed_on_rejection() {
        let catalog = Rc::new(Catalog::builtin());
        let mut wizard = WizardController::new(
            Rc::clone(&catalog),
            Rules::default(),
            ViewCache::new(catalog),
        );
        wizard.advance().unwrap();
        let before = wizard.view().refreshes();
        assert!(wizard.advance().is_err());
        assert_eq!(wizard.view().refreshes(), before);
    }

    #[test]
    fn test_view_cache_shares_controller_catalog() {
        let catalog = Rc::new(Catalog::builtin());
        let wizard = WizardController::new(
            Rc::clone(&catalog),
            Rules::default(),
            ViewCache::new(Rc::clone(&catalog)),
        );
        assert_eq!(Rc::strong_count(&catalog), 3);
        assert!(Rc::ptr_eq(&wizard.view().catalog, &catalog));
        assert!(std::ptr::eq(wizard.catalog(), &*catalog));
    }
}
