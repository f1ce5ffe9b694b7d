//! Wizard controller: stage transitions, validation, and scoring.
//!
//! The controller exclusively owns the [`SessionState`]. Callers request
//! changes through its operations; each successful operation ends with one
//! [`ViewRefresher::on_stage_change`] call, while a rejected one leaves the
//! state untouched and triggers no callback.

use std::rc::Rc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::{Config, LimitsConfig, PointsConfig};
use crate::session::{Badge, PainPoint, SessionState, Severity, Solution, SolutionOrigin, Stage};
use crate::validators::{check_pain_index, check_stage, normalize_text};

/// Why an operation was refused. The `Display` text is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Please select a workflow to continue")]
    NoWorkflowSelected,

    #[error("Please describe your custom workflow")]
    CustomWorkflowUndescribed,

    #[error("Please add at least one pain point")]
    NoPainPoints,

    #[error("Please select a pain point to focus on")]
    NoPainPointFocused,

    #[error("Please add at least one solution")]
    NoSolutions,

    #[error("Already at the first step")]
    AtFirstStage,

    #[error("Already at the final step")]
    AtFinalStage,

    #[error("Unknown workflow: {id}")]
    UnknownWorkflow { id: String },

    #[error("Unknown AI capability: {id}")]
    UnknownCapability { id: String },

    #[error("Please describe a pain point")]
    EmptyPainPoint,

    #[error("You can track at most {max} pain points")]
    TooManyPainPoints { max: usize },

    #[error("No pain point #{}", .index + 1)]
    NoSuchPainPoint { index: usize },

    #[error("Please describe a solution")]
    EmptySolution,

    #[error("This solution is already added")]
    DuplicateSolution,

    #[error("At most {max} solutions per pain point")]
    TooManySolutions { max: usize },

    #[error("No solution #{} for pain point #{}", .solution_index + 1, .pain_index + 1)]
    NoSuchSolution {
        pain_index: usize,
        solution_index: usize,
    },

    #[error("Please identify at least one tool")]
    NoToolsGiven,

    #[error("Finish the earlier steps before closing the case")]
    NotAtResults,
}

/// Transient feedback produced alongside a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PointsAwarded { points: u32, reason: &'static str },
    BadgeEarned(Badge),
    Info(String),
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::PointsAwarded { points, reason } => write!(f, "+{} points: {}", points, reason),
            Notice::BadgeEarned(badge) => {
                write!(f, "{} New badge earned: {}", badge.icon(), badge.title())
            }
            Notice::Info(message) => write!(f, "{}", message),
        }
    }
}

/// Rendering side of the wizard. Implementations own all presentation and
/// must route any user intent back through the controller.
pub trait ViewRefresher {
    /// Called after every transition or successful mutation.
    fn on_stage_change(&mut self, stage: Stage, state: &SessionState);

    /// Called for each notice, before the matching `on_stage_change`.
    fn on_notice(&mut self, _notice: &Notice) {}
}

/// Scoring and sizing rules, usually taken from [`Config`].
#[derive(Debug, Clone, Default)]
pub struct Rules {
    pub points: PointsConfig,
    pub limits: LimitsConfig,
}

impl From<&Config> for Rules {
    fn from(config: &Config) -> Self {
        Self {
            points: config.points.clone(),
            limits: config.limits.clone(),
        }
    }
}

/// `0` means unlimited.
fn at_limit(len: usize, max: usize) -> bool {
    max > 0 && len >= max
}

/// Finite-state controller for one wizard run.
pub struct WizardController<V: ViewRefresher> {
    state: SessionState,
    catalog: Rc<Catalog>,
    rules: Rules,
    view: V,
}

impl<V: ViewRefresher> WizardController<V> {
    /// Start a fresh run and render the overview.
    pub fn new(catalog: impl Into<Rc<Catalog>>, rules: Rules, view: V) -> Self {
        let mut controller = Self {
            state: SessionState::new(),
            catalog: catalog.into(),
            rules,
            view,
        };
        controller.refresh();
        controller
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn custom_draft(&self) -> &str {
        &self.state.custom_workflow_draft
    }

    // Validation

    /// Reason `stage` cannot be left forward, if any.
    pub fn check(&self, stage: Stage) -> Option<Rejection> {
        check_stage(&self.state, stage)
    }

    pub fn validate(&self, stage: Stage) -> bool {
        self.check(stage).is_none()
    }

    /// Whether `advance()` would currently succeed.
    pub fn can_advance(&self) -> bool {
        !self.state.stage.is_terminal() && self.validate(self.state.stage)
    }

    // Navigation

    /// Move one stage forward if the current stage validates.
    pub fn advance(&mut self) -> Result<Stage, Rejection> {
        let from = self.state.stage;
        let Some(to) = from.next() else {
            return self.reject("advance", Rejection::AtFinalStage);
        };
        if let Some(rejection) = self.check(from) {
            return self.reject("advance", rejection);
        }

        match from {
            Stage::Overview if !self.state.journey_started => {
                self.state.journey_started = true;
                self.award_points(self.rules.points.journey_start, "Journey started!");
            }
            Stage::ChooseWorkflow if self.state.is_custom_workflow() => {
                if let Some(text) = normalize_text(&self.state.custom_workflow_draft) {
                    self.state.custom_workflow_text = text;
                }
            }
            _ => {}
        }

        self.state.stage = to;
        info!(from = ?from, to = ?to, score = self.state.score, "stage_advanced");

        if to.is_terminal() {
            self.finish_run();
        }

        self.refresh();
        Ok(to)
    }

    /// Move one stage back. Entered data is kept.
    pub fn retreat(&mut self) -> Result<Stage, Rejection> {
        let from = self.state.stage;
        let Some(to) = from.prev() else {
            return self.reject("retreat", Rejection::AtFirstStage);
        };
        self.state.stage = to;
        info!(from = ?from, to = ?to, "stage_retreated");
        self.refresh();
        Ok(to)
    }

    /// Throw the run away and start over on the overview.
    pub fn restart(&mut self) {
        info!(
            final_score = self.state.score,
            badges = self.state.earned_badges.len(),
            "wizard_restarted"
        );
        self.state = SessionState::new();
        self.refresh();
    }

    // Workflow

    pub fn select_workflow(&mut self, id: &str) -> Result<(), Rejection> {
        if !self.catalog.accepts_workflow_id(id) {
            return self.reject(
                "select_workflow",
                Rejection::UnknownWorkflow { id: id.to_string() },
            );
        }

        let first_selection = !self.state.has_badge(Badge::WorkflowExplorer);
        self.state.selected_workflow_id = Some(id.to_string());
        if !self.state.is_custom_workflow() {
            self.state.custom_workflow_text.clear();
        }
        info!(workflow = id, first_selection, "workflow_selected");

        if first_selection {
            let points = if self.state.is_custom_workflow() {
                self.rules.points.custom_workflow
            } else {
                self.rules.points.workflow_select
            };
            self.award_points(points, "Workflow selected!");
            self.earn_badge(Badge::WorkflowExplorer);
        }

        self.refresh();
        Ok(())
    }

    /// Record the live custom-workflow input without committing it.
    pub fn update_custom_workflow_draft(&mut self, text: &str) {
        self.state.custom_workflow_draft = text.to_string();
        self.refresh();
    }

    // Pain points

    /// Append a pain point; returns its index.
    pub fn add_pain_point(&mut self, text: &str) -> Result<usize, Rejection> {
        let Some(text) = normalize_text(text) else {
            return self.reject("add_pain_point", Rejection::EmptyPainPoint);
        };
        let max = self.rules.limits.max_pain_points;
        if at_limit(self.state.pain_points.len(), max) {
            return self.reject("add_pain_point", Rejection::TooManyPainPoints { max });
        }

        self.state.pain_points.push(PainPoint {
            text,
            severity: Severity::default(),
        });
        let index = self.state.pain_points.len() - 1;
        info!(index, total = self.state.pain_points.len(), "pain_point_added");

        self.award_points(self.rules.points.pain_point_add, "Pain point identified!");
        if self.state.pain_points.len() == 3 {
            self.earn_badge(Badge::PainDetective);
        }

        self.refresh();
        Ok(index)
    }

    /// Remove a pain point and re-normalize the focus.
    ///
    /// Solutions and tools stay keyed by their old indices. The tools payout
    /// for `index` is released so a pain point added there can earn it.
    pub fn remove_pain_point(&mut self, index: usize) -> Result<PainPoint, Rejection> {
        if let Some(rejection) = check_pain_index(&self.state, index) {
            return self.reject("remove_pain_point", rejection);
        }
        let removed = self.state.remove_pain_point_at(index);
        self.state.tools_saved_for.remove(&index);
        info!(
            index,
            remaining = self.state.pain_points.len(),
            focused = ?self.state.focused_pain_point,
            "pain_point_removed"
        );
        self.refresh();
        Ok(removed)
    }

    pub fn set_pain_point_severity(
        &mut self,
        index: usize,
        severity: Severity,
    ) -> Result<(), Rejection> {
        if let Some(rejection) = check_pain_index(&self.state, index) {
            return self.reject("set_pain_point_severity", rejection);
        }
        self.state.pain_points[index].severity = severity;
        debug!(index, severity = severity.label(), "pain_point_severity_set");
        self.refresh();
        Ok(())
    }

    /// Focus a pain point. Pays points when done from the PainPoints stage.
    pub fn select_pain_point(&mut self, index: usize) -> Result<(), Rejection> {
        if let Some(rejection) = check_pain_index(&self.state, index) {
            return self.reject("select_pain_point", rejection);
        }
        self.state.focused_pain_point = Some(index);
        info!(index, "pain_point_selected");

        if self.state.stage == Stage::PainPoints {
            self.award_points(
                self.rules.points.pain_point_select,
                "Pain point selected for focus!",
            );
        }
        self.notify(Notice::Info(format!(
            "🎯 Focusing on: \"{}\"",
            self.state.pain_points[index].text
        )));

        self.refresh();
        Ok(())
    }

    /// Move the focus without awarding anything.
    pub fn switch_focus(&mut self, index: usize) -> Result<(), Rejection> {
        if let Some(rejection) = check_pain_index(&self.state, index) {
            return self.reject("switch_focus", rejection);
        }
        self.state.focused_pain_point = Some(index);
        debug!(index, "focus_switched");
        self.notify(Notice::Info(format!(
            "🎯 Now focusing on: \"{}\"",
            self.state.pain_points[index].text
        )));
        self.refresh();
        Ok(())
    }

    // Solutions

    pub fn add_solution(
        &mut self,
        pain_index: usize,
        text: &str,
        origin: SolutionOrigin,
    ) -> Result<(), Rejection> {
        let Some(text) = normalize_text(text) else {
            return self.reject("add_solution", Rejection::EmptySolution);
        };
        if let Some(rejection) = check_pain_index(&self.state, pain_index) {
            return self.reject("add_solution", rejection);
        }
        let existing = self.state.solutions_for(pain_index);
        if existing.iter().any(|s| s.text == text) {
            return self.reject("add_solution", Rejection::DuplicateSolution);
        }
        let max = self.rules.limits.max_solutions_per_pain_point;
        if at_limit(existing.len(), max) {
            return self.reject("add_solution", Rejection::TooManySolutions { max });
        }

        self.state
            .solutions
            .entry(pain_index)
            .or_default()
            .push(Solution {
                text,
                origin,
                created_at: Utc::now(),
            });
        let total = self.state.total_solutions();
        info!(pain_index, origin = origin.label(), total, "solution_added");

        let reason = match origin {
            SolutionOrigin::AiSuggested => "AI solution added!",
            SolutionOrigin::UserWritten => "Solution added!",
        };
        self.award_points(self.rules.points.solution_add, reason);
        if total == 3 {
            self.earn_badge(Badge::SolutionDesigner);
        }

        self.refresh();
        Ok(())
    }

    /// Attach a catalog capability as an AI-suggested solution.
    pub fn add_capability_solution(
        &mut self,
        pain_index: usize,
        capability_id: &str,
    ) -> Result<(), Rejection> {
        let Some(text) = self
            .catalog
            .capability(capability_id)
            .map(|c| c.solution_text())
        else {
            return self.reject(
                "add_capability_solution",
                Rejection::UnknownCapability {
                    id: capability_id.to_string(),
                },
            );
        };
        self.add_solution(pain_index, &text, SolutionOrigin::AiSuggested)
    }

    pub fn remove_solution(
        &mut self,
        pain_index: usize,
        solution_index: usize,
    ) -> Result<Solution, Rejection> {
        let Some(list) = self
            .state
            .solutions
            .get_mut(&pain_index)
            .filter(|list| solution_index < list.len())
        else {
            return self.reject(
                "remove_solution",
                Rejection::NoSuchSolution {
                    pain_index,
                    solution_index,
                },
            );
        };
        let removed = list.remove(solution_index);
        info!(pain_index, solution_index, "solution_removed");
        self.refresh();
        Ok(removed)
    }

    /// Record the tools for a pain point. Saving again overwrites; points are
    /// paid only for the first save per pain point.
    pub fn save_tools(
        &mut self,
        pain_index: usize,
        existing: &str,
        needed: &str,
    ) -> Result<(), Rejection> {
        let existing = existing.trim();
        let needed = needed.trim();
        if existing.is_empty() && needed.is_empty() {
            return self.reject("save_tools", Rejection::NoToolsGiven);
        }
        if let Some(rejection) = check_pain_index(&self.state, pain_index) {
            return self.reject("save_tools", rejection);
        }

        self.state
            .existing_tools
            .insert(pain_index, existing.to_string());
        self.state.needed_tools.insert(pain_index, needed.to_string());
        let first_save = self.state.tools_saved_for.insert(pain_index);
        info!(pain_index, first_save, "tools_saved");

        if first_save {
            self.award_points(self.rules.points.tools_save, "Tools identified!");
        }
        self.notify(Notice::Info(
            "🛠️ Tools saved! This will help you plan implementation.".to_string(),
        ));

        self.refresh();
        Ok(())
    }

    // Completion

    /// Award the completion badge and bonus. Returns whether anything was
    /// awarded; a second call is a no-op.
    pub fn complete_wizard(&mut self) -> Result<bool, Rejection> {
        if self.state.stage != Stage::Results {
            return self.reject("complete_wizard", Rejection::NotAtResults);
        }
        let awarded = self.finish_run();
        if awarded {
            self.refresh();
        }
        Ok(awarded)
    }

    fn finish_run(&mut self) -> bool {
        if self.state.completion_awarded {
            return false;
        }
        self.state.completion_awarded = true;
        self.earn_badge(Badge::MasterDetective);
        self.award_points(self.rules.points.completion_bonus, "Mission complete!");
        info!(
            score = self.state.score,
            badges = self.state.earned_badges.len(),
            "wizard_completed"
        );
        true
    }

    // Side effects

    fn award_points(&mut self, points: u32, reason: &'static str) {
        self.state.score = self.state.score.saturating_add(points);
        debug!(points, reason, score = self.state.score, "points_awarded");
        if points > 0 {
            self.notify(Notice::PointsAwarded { points, reason });
        }
    }

    /// Returns false if the badge was already earned.
    fn earn_badge(&mut self, badge: Badge) -> bool {
        if !self.state.earned_badges.insert(badge) {
            return false;
        }
        info!(badge = badge.id(), "badge_earned");
        self.notify(Notice::BadgeEarned(badge));
        self.award_points(self.rules.points.badge_earn, "Badge earned!");
        true
    }

    fn notify(&mut self, notice: Notice) {
        self.view.on_notice(&notice);
    }

    fn refresh(&mut self) {
        self.view.on_stage_change(self.state.stage, &self.state);
    }

    fn reject<T>(&self, action: &'static str, rejection: Rejection) -> Result<T, Rejection> {
        debug!(action, reason = %rejection, stage = ?self.state.stage, "action_rejected");
        Err(rejection)
    }
}
