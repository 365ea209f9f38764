use crossterm::event::KeyCode;
use model_dashboard::{FetchOutcome, Session, ViewScope};
use ratatui::{layout::Rect, Frame};
use tokio::task::JoinHandle;

use crate::ui::{layout, widgets};

use super::{nav_key, Action, Route};

const HINTS: &[(&str, &str)] = &[
    ("↑↓", "field"),
    ("◀ ▶", "level"),
    ("enter", "edit"),
    ("s", "submit"),
    ("x", "reset"),
    ("1 2 / tab", "section"),
    ("q", "quit"),
];

const EDIT_HINTS: &[(&str, &str)] = &[("enter", "apply"), ("esc", "cancel")];

pub struct PredictionsState {
    scope: ViewScope,
    selected: usize,
    /// Text buffer while the selected field is being edited.
    editing: Option<String>,
    /// Scope of the latest submission; replacing it cancels the older one.
    submission: Option<ViewScope>,
    pending: Option<JoinHandle<FetchOutcome>>,
    pub error: Option<String>,
}

impl PredictionsState {
    pub fn new(session: &Session) -> Self {
        Self {
            scope: session.mount(),
            selected: 0,
            editing: None,
            submission: None,
            pending: None,
            error: None,
        }
    }

    fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

fn selected_name(state: &PredictionsState, session: &Session) -> Option<String> {
    let form = session.state().form.as_ref()?;
    form.get_index(state.selected).map(|(name, _)| name.to_string())
}

pub fn handle_key(state: &mut PredictionsState, key: KeyCode, session: &mut Session) -> Action {
    if state.editing.is_some() {
        handle_edit_key(state, key, session);
        return Action::None;
    }

    state.error = None;
    let len = session.state().form.as_ref().map_or(0, |f| f.len());

    match key {
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected = state.selected.saturating_sub(1);
            Action::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.selected + 1 < len {
                state.selected += 1;
            }
            Action::None
        }
        KeyCode::Left | KeyCode::Char('h') => {
            cycle(state, session, -1);
            Action::None
        }
        KeyCode::Right | KeyCode::Char('l') => {
            cycle(state, session, 1);
            Action::None
        }
        KeyCode::Enter | KeyCode::Char('e') => {
            start_edit(state, session);
            Action::None
        }
        KeyCode::Char('s') => {
            let submission = state.scope.child();
            state.pending = Some(session.submit(&submission));
            state.submission = Some(submission);
            Action::None
        }
        KeyCode::Char('x') => {
            if let Some(form) = session.form_mut() {
                form.reset();
            }
            Action::None
        }
        KeyCode::Char('r') => {
            let _ = session.load_metadata(&state.scope);
            state.selected = 0;
            Action::None
        }
        _ => nav_key(Route::ModelPredictions, key),
    }
}

fn handle_edit_key(state: &mut PredictionsState, key: KeyCode, session: &mut Session) {
    let Some(buf) = state.editing.as_mut() else {
        return;
    };

    match key {
        KeyCode::Char(c) => buf.push(c),
        KeyCode::Backspace => {
            buf.pop();
        }
        KeyCode::Esc => state.editing = None,
        KeyCode::Enter => {
            let text = state.editing.take().unwrap_or_default();
            let Some(name) = selected_name(state, session) else {
                return;
            };
            if let Some(form) = session.form_mut() {
                if let Err(e) = form.set_text(&name, text.trim()) {
                    state.error = Some(e.to_string());
                }
            }
        }
        _ => {}
    }
}

fn start_edit(state: &mut PredictionsState, session: &Session) {
    let Some(form) = session.state().form.as_ref() else {
        return;
    };
    let Some((_, entry)) = form.get_index(state.selected) else {
        return;
    };

    if entry.spec.levels().is_empty() {
        state.editing = Some(entry.value.to_query().unwrap_or_default());
    } else {
        state.error = Some("use ◀ ▶ to pick a level".into());
    }
}

fn cycle(state: &mut PredictionsState, session: &mut Session, step: isize) {
    let Some(name) = selected_name(state, session) else {
        return;
    };
    if let Some(form) = session.form_mut() {
        if let Err(e) = form.cycle_level(&name, step) {
            state.error = Some(e.to_string());
        }
    }
}

pub fn draw(f: &mut Frame, body: Rect, hints: Rect, state: &PredictionsState, session: &Session) {
    let dashboard = session.state();
    let (form_area, prediction_area, details_area) = layout::predictions(body);

    let form = dashboard.form.as_ref();
    f.render_widget(
        widgets::form(form, state.selected, state.editing.as_deref()),
        form_area,
    );

    f.render_widget(
        widgets::prediction(dashboard.prediction.as_ref(), state.is_pending()),
        prediction_area,
    );

    let levels = form
        .and_then(|form| form.get_index(state.selected))
        .map(|(_, entry)| entry.spec.levels())
        .unwrap_or(&[]);
    f.render_widget(widgets::details(levels, state.error.as_deref()), details_area);

    let hint_items = if state.editing.is_some() { EDIT_HINTS } else { HINTS };
    f.render_widget(widgets::hints(hint_items), hints);
}

#[cfg(test)]
mod tests {
    use model_dashboard::{DashboardConfig, FormValue, ModelApi};

    use super::*;

    fn session() -> Session {
        let config = DashboardConfig::new("http://127.0.0.1:9").unwrap();
        Session::new(ModelApi::new(config))
    }

    #[test]
    fn test_keys_without_form_do_nothing() {
        let mut session = session();
        let mut state = PredictionsState::new(&session);

        for key in [KeyCode::Down, KeyCode::Right, KeyCode::Enter, KeyCode::Char('x')] {
            assert!(matches!(
                handle_key(&mut state, key, &mut session),
                Action::None
            ));
        }
        assert_eq!(state.selected, 0);
        assert!(state.editing.is_none());
        assert!(session.state().form.is_none());
    }

    #[test]
    fn test_value_text() {
        assert_eq!(widgets::value_text(&FormValue::Numeric(34.0)), "34");
        assert_eq!(widgets::value_text(&FormValue::Unset), "(unset)");
    }

    #[test]
    fn test_leaving_the_view_cancels_its_scope() {
        let session = session();
        let state = PredictionsState::new(&session);
        let token = state.scope.token().clone();

        drop(state);
        assert!(token.is_cancelled());
    }
}
