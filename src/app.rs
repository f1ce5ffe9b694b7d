//! Application state and core logic.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::Local;
use ratatui::style::Color;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::{Config, ConfigLoadStatus};
use crate::export::{ExportFormat, PlanSummary, write_plan};
use crate::input::{Field, ListCursor, TextField};
use crate::session::{CUSTOM_WORKFLOW_ID, SolutionOrigin, Stage};
use crate::views::{StageView, ViewCache};
use crate::wizard::{Notice, Rejection, Rules, WizardController};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl NotificationKind {
    pub fn color(self) -> Color {
        match self {
            NotificationKind::Success => Color::Green,
            NotificationKind::Error => Color::Red,
            NotificationKind::Info => Color::Cyan,
        }
    }
}

/// Transient message shown in a popup.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    /// Set when the notification first becomes visible.
    pub shown_at: Option<Instant>,
}

impl From<&Notice> for Notification {
    fn from(notice: &Notice) -> Self {
        let kind = match notice {
            Notice::PointsAwarded { .. } | Notice::BadgeEarned(_) => NotificationKind::Success,
            Notice::Info(_) => NotificationKind::Info,
        };
        Self {
            message: notice.to_string(),
            kind,
            shown_at: None,
        }
    }
}

/// Main application state.
pub struct App {
    pub wizard: WizardController<ViewCache>,
    pub focus: Field,
    pub should_quit: bool,

    pub workflow_cursor: ListCursor,
    pub custom_workflow: TextField,
    pub pain_input: TextField,
    pub pain_cursor: ListCursor,
    pub capability_cursor: ListCursor,
    pub solution_input: TextField,
    pub solution_cursor: ListCursor,
    pub existing_tools: TextField,
    pub needed_tools: TextField,
    pub other_cursor: ListCursor,

    /// Queued notifications; the front one is visible.
    pub notifications: VecDeque<Notification>,
    pub notification_ttl: Duration,

    pub export_dir: PathBuf,
    pub last_export: Option<PathBuf>,

    /// Session ID for this run (always populated).
    pub session_id: String,
    /// Directory where logs are written.
    pub log_directory: Option<PathBuf>,
    /// Path to the configuration file.
    pub config_path: PathBuf,
    /// Status of config loading.
    pub config_load_status: ConfigLoadStatus,
}

impl App {
    pub fn new(
        catalog: Catalog,
        config: &Config,
        config_path: PathBuf,
        config_load_status: ConfigLoadStatus,
        session_id: String,
        log_directory: Option<PathBuf>,
    ) -> Self {
        let catalog = Rc::new(catalog);
        let view = ViewCache::new(Rc::clone(&catalog));
        let wizard = WizardController::new(catalog, Rules::from(config), view);

        let mut app = Self {
            wizard,
            focus: Field::first(Stage::Overview),
            should_quit: false,
            workflow_cursor: ListCursor::default(),
            custom_workflow: TextField::default(),
            pain_input: TextField::default(),
            pain_cursor: ListCursor::default(),
            capability_cursor: ListCursor::default(),
            solution_input: TextField::default(),
            solution_cursor: ListCursor::default(),
            existing_tools: TextField::default(),
            needed_tools: TextField::default(),
            other_cursor: ListCursor::default(),
            notifications: VecDeque::new(),
            notification_ttl: Duration::from_secs(config.behavior.notification_secs),
            export_dir: config.export_dir(),
            last_export: None,
            session_id,
            log_directory,
            config_path,
            config_load_status,
        };

        if let ConfigLoadStatus::Error(e) = &app.config_load_status {
            let message = format!("⚠️ Config not loaded, using defaults: {}", e);
            app.push_notification(message, NotificationKind::Error);
        }
        app
    }

    pub fn stage(&self) -> Stage {
        self.wizard.state().stage
    }

    pub fn view(&self) -> &StageView {
        self.wizard.view().current()
    }

    // Notifications

    pub fn push_notification(&mut self, message: String, kind: NotificationKind) {
        self.notifications.push_back(Notification {
            message,
            kind,
            shown_at: None,
        });
    }

    /// Move controller notices into the notification queue.
    fn collect_notices(&mut self) {
        while let Some(notice) = self.wizard.view_mut().pop_notice() {
            self.notifications.push_back(Notification::from(&notice));
        }
    }

    /// Report a controller result, surfacing rejections to the user.
    fn report<T>(&mut self, result: Result<T, Rejection>) -> Option<T> {
        self.collect_notices();
        match result {
            Ok(value) => Some(value),
            Err(rejection) => {
                self.push_notification(format!("⚠️ {}", rejection), NotificationKind::Error);
                None
            }
        }
    }

    /// Expire the visible notification and start the clock on the next one.
    pub fn tick(&mut self) {
        let now = Instant::now();
        if let Some(front) = self.notifications.front()
            && front
                .shown_at
                .is_some_and(|at| now.duration_since(at) >= self.notification_ttl)
        {
            self.notifications.pop_front();
        }
        if let Some(front) = self.notifications.front_mut()
            && front.shown_at.is_none()
        {
            front.shown_at = Some(now);
        }
    }

    pub fn current_notification(&self) -> Option<&Notification> {
        self.notifications.front()
    }

    // Focus

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next(self.stage());
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev(self.stage());
    }

    fn reset_focus(&mut self) {
        self.focus = Field::first(self.stage());
    }

    // Navigation

    pub fn advance(&mut self) {
        let result = self.wizard.advance();
        if let Some(stage) = self.report(result) {
            self.arrive(stage);
        }
    }

    pub fn retreat(&mut self) {
        let result = self.wizard.retreat();
        if let Some(stage) = self.report(result) {
            self.arrive(stage);
        }
    }

    pub fn restart(&mut self) {
        self.wizard.restart();
        self.collect_notices();
        self.custom_workflow.clear();
        self.pain_input.clear();
        self.solution_input.clear();
        self.existing_tools.clear();
        self.needed_tools.clear();
        self.workflow_cursor = ListCursor::default();
        self.pain_cursor = ListCursor::default();
        self.capability_cursor = ListCursor::default();
        self.solution_cursor = ListCursor::default();
        self.other_cursor = ListCursor::default();
        self.last_export = None;
        self.reset_focus();
        self.push_notification("🔄 Starting a fresh case".to_string(), NotificationKind::Info);
    }

    fn arrive(&mut self, stage: Stage) {
        debug!(stage = ?stage, "stage_entered");
        self.reset_focus();
        if stage == Stage::Solutions {
            self.load_tools_fields();
            self.solution_cursor = ListCursor::default();
            self.other_cursor = ListCursor::default();
        }
    }

    // Workflow

    /// Catalog workflows plus the trailing custom entry.
    pub fn workflow_choice_count(&self) -> usize {
        self.wizard.catalog().workflows.len() + 1
    }

    /// Workflow id under the cursor; the last row is the custom workflow.
    pub fn workflow_id_at(&self, index: usize) -> &str {
        self.wizard
            .catalog()
            .workflows
            .get(index)
            .map(|w| w.id.as_str())
            .unwrap_or(CUSTOM_WORKFLOW_ID)
    }

    pub fn select_workflow_at_cursor(&mut self) {
        let id = self.workflow_id_at(self.workflow_cursor.0).to_string();
        let result = self.wizard.select_workflow(&id);
        if self.report(result).is_some() && id == CUSTOM_WORKFLOW_ID {
            self.focus = Field::CustomWorkflow;
        }
    }

    pub fn sync_custom_draft(&mut self) {
        let text = self.custom_workflow.value().to_string();
        self.wizard.update_custom_workflow_draft(&text);
    }

    // Pain points

    pub fn pain_point_count(&self) -> usize {
        self.wizard.state().pain_points.len()
    }

    pub fn add_pain_point(&mut self) {
        let text = self.pain_input.value().to_string();
        let result = self.wizard.add_pain_point(&text);
        if let Some(index) = self.report(result) {
            self.pain_input.clear();
            self.pain_cursor = ListCursor(index);
        }
    }

    pub fn select_pain_point_at_cursor(&mut self) {
        let result = self.wizard.select_pain_point(self.pain_cursor.0);
        self.report(result);
    }

    pub fn remove_pain_point_at_cursor(&mut self) {
        let result = self.wizard.remove_pain_point(self.pain_cursor.0);
        if let Some(removed) = self.report(result) {
            self.pain_cursor.clamp(self.pain_point_count());
            self.push_notification(
                format!("🗑️ Removed \"{}\"", removed.text),
                NotificationKind::Info,
            );
        }
    }

    pub fn cycle_severity_at_cursor(&mut self) {
        let index = self.pain_cursor.0;
        let Some(current) = self.wizard.state().pain_points.get(index).map(|p| p.severity) else {
            return;
        };
        let result = self.wizard.set_pain_point_severity(index, current.cycle());
        self.report(result);
    }

    // Solutions

    fn focused_index(&mut self) -> Option<usize> {
        let focused = self.wizard.state().focused_pain_point;
        if focused.is_none() {
            self.report::<()>(Err(Rejection::NoPainPointFocused));
        }
        focused
    }

    pub fn capability_count(&self) -> usize {
        self.wizard.catalog().capabilities.len()
    }

    pub fn focused_solution_count(&self) -> usize {
        self.wizard
            .state()
            .focused_pain_point
            .map(|i| self.wizard.state().solutions_for(i).len())
            .unwrap_or(0)
    }

    pub fn other_pain_point_count(&self) -> usize {
        self.view().other_pain_points.len()
    }

    pub fn add_capability_at_cursor(&mut self) {
        let Some(pain_index) = self.focused_index() else {
            return;
        };
        let Some(id) = self
            .wizard
            .catalog()
            .capabilities
            .get(self.capability_cursor.0)
            .map(|c| c.id.clone())
        else {
            return;
        };
        let result = self.wizard.add_capability_solution(pain_index, &id);
        self.report(result);
    }

    pub fn add_written_solution(&mut self) {
        let Some(pain_index) = self.focused_index() else {
            return;
        };
        let text = self.solution_input.value().to_string();
        let result = self
            .wizard
            .add_solution(pain_index, &text, SolutionOrigin::UserWritten);
        if self.report(result).is_some() {
            self.solution_input.clear();
        }
    }

    pub fn remove_solution_at_cursor(&mut self) {
        let Some(pain_index) = self.focused_index() else {
            return;
        };
        let result = self.wizard.remove_solution(pain_index, self.solution_cursor.0);
        if self.report(result).is_some() {
            self.solution_cursor.clamp(self.focused_solution_count());
        }
    }

    pub fn save_tools(&mut self) {
        let Some(pain_index) = self.focused_index() else {
            return;
        };
        let existing = self.existing_tools.value().to_string();
        let needed = self.needed_tools.value().to_string();
        let result = self.wizard.save_tools(pain_index, &existing, &needed);
        self.report(result);
    }

    pub fn switch_focus_at_cursor(&mut self) {
        let Some(index) = self
            .view()
            .other_pain_points
            .get(self.other_cursor.0)
            .map(|p| p.index)
        else {
            return;
        };
        let result = self.wizard.switch_focus(index);
        if self.report(result).is_some() {
            self.load_tools_fields();
            self.solution_cursor = ListCursor::default();
            self.other_cursor.clamp(self.other_pain_point_count());
        }
    }

    /// Fill the tools inputs from what is saved for the focused pain point.
    fn load_tools_fields(&mut self) {
        let (existing, needed) = match self.wizard.state().focused_pain_point {
            Some(i) => {
                let (e, n) = self.wizard.state().tools_for(i);
                (e.to_string(), n.to_string())
            }
            None => (String::new(), String::new()),
        };
        self.existing_tools.set(&existing);
        self.needed_tools.set(&needed);
    }

    // Results

    pub fn export(&mut self, format: ExportFormat) {
        let summary = PlanSummary::from_state(
            self.wizard.state(),
            self.wizard.catalog(),
            Local::now().date_naive(),
        );
        match write_plan(&summary, &self.export_dir, format) {
            Ok(path) => {
                info!(path = ?path, format = format.label(), "export_complete");
                self.push_notification(
                    format!("📄 {} plan saved to {}", format.label(), path.display()),
                    NotificationKind::Success,
                );
                self.last_export = Some(path);
            }
            Err(e) => {
                warn!(error = %e, "export_failed");
                self.push_notification(format!("⚠️ {}", e), NotificationKind::Error);
            }
        }
    }
}
