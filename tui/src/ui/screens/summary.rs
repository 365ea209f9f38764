use crossterm::event::KeyCode;
use model_dashboard::{views::display_value, Session, ViewScope};
use ratatui::{layout::Rect, Frame};

use crate::ui::{layout, widgets};

use super::{nav_key, Action, Route};

const HINTS: &[(&str, &str)] = &[
    ("1 2 / tab", "section"),
    ("r", "reload"),
    ("q", "quit"),
];

pub struct SummaryState {
    scope: ViewScope,
}

impl SummaryState {
    pub fn new(session: &Session) -> Self {
        Self {
            scope: session.mount(),
        }
    }
}

pub fn handle_key(state: &mut SummaryState, key: KeyCode, session: &mut Session) -> Action {
    match key {
        KeyCode::Char('r') => {
            let _ = session.load_metadata(&state.scope);
            Action::None
        }
        _ => nav_key(Route::ModelSummary, key),
    }
}

pub fn draw(f: &mut Frame, body: Rect, hints: Rect, _state: &SummaryState, session: &Session) {
    let state = session.state();
    let [info_area, params_area, results_area, features_area] = layout::summary(body);

    let info = state.model_info.as_ref().map(|info| {
        info.0
            .iter()
            .map(|(k, v)| (k.clone(), display_value(v)))
            .collect()
    });
    f.render_widget(widgets::info_list("i", "Model info", info), info_area);

    let params = state.hyper_parameters.as_ref().map(|params| {
        params
            .0
            .iter()
            .map(|(k, v)| (k.clone(), display_value(v)))
            .collect()
    });
    f.render_widget(widgets::info_list("*", "Hyperparameters", params), params_area);

    let results = state.train_results.as_ref().map(|results| {
        results
            .iter()
            .map(|(metric, value)| (metric.to_string(), value.to_string()))
            .collect()
    });
    f.render_widget(widgets::info_list("~", "Train results", results), results_area);

    f.render_widget(widgets::features(state.input_features.as_ref()), features_area);
    f.render_widget(widgets::hints(HINTS), hints);
}
