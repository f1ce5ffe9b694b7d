//! Keyboard input: editable text fields, per-stage focus, and key dispatch.

use crossterm::event::{KeyCode, KeyModifiers};

use crate::app::App;
use crate::export::ExportFormat;
use crate::session::Stage;

/// Single-line text input with a character-indexed cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    value: String,
    /// Cursor position in chars, `0..=char_count`.
    cursor: usize,
}

impl TextField {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Replace the contents and move the cursor to the end.
    pub fn set(&mut self, text: &str) {
        self.value = text.to_string();
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Insert a character at the cursor.
    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor (backspace).
    pub fn delete_char_before(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let at = self.byte_offset(self.cursor - 1);
        self.value.remove(at);
        self.cursor -= 1;
        true
    }

    /// Delete the character at the cursor (delete key).
    pub fn delete_char_at(&mut self) -> bool {
        if self.cursor >= self.char_count() {
            return false;
        }
        let at = self.byte_offset(self.cursor);
        self.value.remove(at);
        true
    }

    pub fn cursor_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn cursor_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Apply an editing key. Returns true if the text changed.
    pub fn handle_key(&mut self, key_code: KeyCode) -> bool {
        match key_code {
            KeyCode::Char(c) => {
                self.insert_char(c);
                true
            }
            KeyCode::Backspace => self.delete_char_before(),
            KeyCode::Delete => self.delete_char_at(),
            KeyCode::Left => {
                self.cursor_left();
                false
            }
            KeyCode::Right => {
                self.cursor_right();
                false
            }
            KeyCode::Home => {
                self.cursor_home();
                false
            }
            KeyCode::End => {
                self.cursor_end();
                false
            }
            _ => false,
        }
    }
}

/// Cursor into a list that may shrink under it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListCursor(pub usize);

impl ListCursor {
    pub fn select_prev(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }

    pub fn select_next(&mut self, len: usize) {
        if self.0 + 1 < len {
            self.0 += 1;
        }
    }

    /// Pull the cursor back inside `0..len`.
    pub fn clamp(&mut self, len: usize) {
        self.0 = self.0.min(len.saturating_sub(1));
    }
}

/// Which widget receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Briefing,
    WorkflowList,
    CustomWorkflow,
    PainInput,
    PainList,
    Capabilities,
    SolutionInput,
    SolutionList,
    ExistingTools,
    NeededTools,
    OtherPainPoints,
    ExportActions,
}

impl Field {
    /// Focus order for a stage. The first entry is focused on arrival.
    pub fn order(stage: Stage) -> &'static [Field] {
        match stage {
            Stage::Overview => &[Field::Briefing],
            Stage::ChooseWorkflow => &[Field::WorkflowList, Field::CustomWorkflow],
            Stage::PainPoints => &[Field::PainInput, Field::PainList],
            Stage::Solutions => &[
                Field::Capabilities,
                Field::SolutionInput,
                Field::SolutionList,
                Field::ExistingTools,
                Field::NeededTools,
                Field::OtherPainPoints,
            ],
            Stage::Results => &[Field::ExportActions],
        }
    }

    pub fn first(stage: Stage) -> Self {
        Self::order(stage)[0]
    }

    pub fn next(self, stage: Stage) -> Self {
        let order = Self::order(stage);
        match order.iter().position(|f| *f == self) {
            Some(i) => order[(i + 1) % order.len()],
            None => order[0],
        }
    }

    pub fn prev(self, stage: Stage) -> Self {
        let order = Self::order(stage);
        match order.iter().position(|f| *f == self) {
            Some(i) => order[(i + order.len() - 1) % order.len()],
            None => order[0],
        }
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            Field::CustomWorkflow
                | Field::PainInput
                | Field::SolutionInput
                | Field::ExistingTools
                | Field::NeededTools
        )
    }
}

/// Handle one key press.
pub fn handle_key(app: &mut App, key_code: KeyCode, modifiers: KeyModifiers) {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);

    // Global bindings
    match key_code {
        KeyCode::Esc => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('n') if ctrl => {
            app.advance();
            return;
        }
        KeyCode::Char('p') if ctrl => {
            app.retreat();
            return;
        }
        KeyCode::Char('r') if ctrl => {
            app.restart();
            return;
        }
        KeyCode::Tab => {
            if modifiers.contains(KeyModifiers::SHIFT) {
                app.focus_prev();
            } else {
                app.focus_next();
            }
            return;
        }
        KeyCode::BackTab => {
            app.focus_prev();
            return;
        }
        _ => {}
    }

    match app.focus {
        Field::Briefing => {
            if key_code == KeyCode::Enter {
                app.advance();
            }
        }

        Field::WorkflowList => match key_code {
            KeyCode::Up => app.workflow_cursor.select_prev(),
            KeyCode::Down => app.workflow_cursor.select_next(app.workflow_choice_count()),
            KeyCode::Enter => app.select_workflow_at_cursor(),
            _ => {}
        },

        Field::CustomWorkflow => {
            if key_code == KeyCode::Enter {
                app.advance();
            } else if app.custom_workflow.handle_key(key_code) {
                app.sync_custom_draft();
            }
        }

        Field::PainInput => {
            if key_code == KeyCode::Enter {
                app.add_pain_point();
            } else {
                app.pain_input.handle_key(key_code);
            }
        }

        Field::PainList => match key_code {
            KeyCode::Up => app.pain_cursor.select_prev(),
            KeyCode::Down => app.pain_cursor.select_next(app.pain_point_count()),
            KeyCode::Enter => app.select_pain_point_at_cursor(),
            KeyCode::Delete | KeyCode::Backspace => app.remove_pain_point_at_cursor(),
            KeyCode::Char('s') => app.cycle_severity_at_cursor(),
            _ => {}
        },

        Field::Capabilities => match key_code {
            KeyCode::Up => app.capability_cursor.select_prev(),
            KeyCode::Down => app.capability_cursor.select_next(app.capability_count()),
            KeyCode::Enter => app.add_capability_at_cursor(),
            _ => {}
        },

        Field::SolutionInput => {
            if key_code == KeyCode::Enter {
                app.add_written_solution();
            } else {
                app.solution_input.handle_key(key_code);
            }
        }

        Field::SolutionList => match key_code {
            KeyCode::Up => app.solution_cursor.select_prev(),
            KeyCode::Down => app.solution_cursor.select_next(app.focused_solution_count()),
            KeyCode::Delete | KeyCode::Backspace => app.remove_solution_at_cursor(),
            _ => {}
        },

        Field::ExistingTools => {
            if key_code == KeyCode::Enter {
                app.save_tools();
            } else {
                app.existing_tools.handle_key(key_code);
            }
        }

        Field::NeededTools => {
            if key_code == KeyCode::Enter {
                app.save_tools();
            } else {
                app.needed_tools.handle_key(key_code);
            }
        }

        Field::OtherPainPoints => match key_code {
            KeyCode::Up => app.other_cursor.select_prev(),
            KeyCode::Down => app.other_cursor.select_next(app.other_pain_point_count()),
            KeyCode::Enter => app.switch_focus_at_cursor(),
            _ => {}
        },

        Field::ExportActions => match key_code {
            KeyCode::Char('m') => app.export(ExportFormat::Markdown),
            KeyCode::Char('j') => app.export(ExportFormat::Json),
            _ => {}
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(text: &str) -> TextField {
        let mut f = TextField::default();
        f.set(text);
        f
    }

    // TextField

    #[test]
    fn test_insert_at_end_and_middle() {
        let mut f = field("ac");
        assert_eq!(f.cursor(), 2);
        f.cursor_left();
        f.insert_char('b');
        assert_eq!(f.value(), "abc");
        assert_eq!(f.cursor(), 2);
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut f = field("x");
        f.cursor_home();
        assert!(!f.delete_char_before());
        assert_eq!(f.value(), "x");
    }

    #[test]
    fn test_delete_at_end_is_noop() {
        let mut f = field("x");
        assert!(!f.delete_char_at());
        f.cursor_home();
        assert!(f.delete_char_at());
        assert_eq!(f.value(), "");
    }

    #[test]
    fn test_multibyte_editing() {
        let mut f = field("café");
        assert_eq!(f.cursor(), 4);
        assert!(f.delete_char_before());
        assert_eq!(f.value(), "caf");
        f.insert_char('é');
        f.insert_char('!');
        assert_eq!(f.value(), "café!");
        f.cursor_left();
        f.cursor_left();
        f.insert_char('🎯');
        assert_eq!(f.value(), "caf🎯é!");
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut f = field("ab");
        f.cursor_right();
        assert_eq!(f.cursor(), 2);
        f.cursor_home();
        f.cursor_left();
        assert_eq!(f.cursor(), 0);
        f.cursor_end();
        assert_eq!(f.cursor(), 2);
    }

    #[test]
    fn test_handle_key_reports_changes() {
        let mut f = TextField::default();
        assert!(f.handle_key(KeyCode::Char('a')));
        assert!(!f.handle_key(KeyCode::Left));
        assert!(!f.handle_key(KeyCode::Backspace));
        assert!(f.handle_key(KeyCode::Delete));
        assert_eq!(f.value(), "");
    }

    #[test]
    fn test_clear() {
        let mut f = field("notes");
        f.clear();
        assert_eq!(f.value(), "");
        assert_eq!(f.cursor(), 0);
    }

    // ListCursor

    #[test]
    fn test_list_cursor_bounds() {
        let mut c = ListCursor::default();
        c.select_prev();
        assert_eq!(c.0, 0);
        c.select_next(3);
        c.select_next(3);
        c.select_next(3);
        assert_eq!(c.0, 2);
        c.clamp(1);
        assert_eq!(c.0, 0);
        c.clamp(0);
        assert_eq!(c.0, 0);
    }

    // Field

    #[test]
    fn test_field_next_full_cycle() {
        let stage = Stage::Solutions;
        let mut f = Field::first(stage);
        let mut seen = vec![f];
        for _ in 0..Field::order(stage).len() - 1 {
            f = f.next(stage);
            seen.push(f);
        }
        assert_eq!(seen, Field::order(stage));
        assert_eq!(f.next(stage), Field::Capabilities);
    }

    #[test]
    fn test_field_prev_wraparound() {
        assert_eq!(
            Field::WorkflowList.prev(Stage::ChooseWorkflow),
            Field::CustomWorkflow
        );
        assert_eq!(Field::Briefing.prev(Stage::Overview), Field::Briefing);
    }

    #[test]
    fn test_field_next_prev_inverse() {
        for stage in Stage::ALL {
            for f in Field::order(stage) {
                assert_eq!(f.next(stage).prev(stage), *f);
            }
        }
    }

    #[test]
    fn test_field_from_other_stage_resets() {
        assert_eq!(Field::PainList.next(Stage::Results), Field::ExportActions);
    }

    #[test]
    fn test_text_fields() {
        assert!(Field::PainInput.is_text());
        assert!(!Field::PainList.is_text());
        assert!(!Field::ExportActions.is_text());
    }
}
