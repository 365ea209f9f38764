pub mod predictions;
pub mod summary;

use crossterm::event::KeyCode;
use model_dashboard::Session;
use ratatui::{widgets::Block, Frame};

use super::{layout, theme::Theme, widgets};

pub enum Action {
    None,
    Quit,
    Navigate(Route),
}

/// Client-side routes of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ModelSummary,
    ModelPredictions,
}

impl Route {
    /// Resolves a route path; `/` is the model summary.
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/" | "/model_summary" => Some(Self::ModelSummary),
            "/model_predictions" => Some(Self::ModelPredictions),
            _ => None,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::ModelSummary => "/model_summary",
            Self::ModelPredictions => "/model_predictions",
        }
    }
}

/// Navigation sections, in tab order.
pub const SECTIONS: &[(&str, Route)] = &[
    ("Model summary", Route::ModelSummary),
    ("Try api", Route::ModelPredictions),
];

/// The mounted view. Replacing it unmounts the previous one, which
/// cancels whatever that view still had in flight.
pub enum Screen {
    Summary(summary::SummaryState),
    Predictions(predictions::PredictionsState),
}

impl Screen {
    pub fn mount(route: Route, session: &Session) -> Self {
        log::debug!("mounting {}", route.path());
        match route {
            Route::ModelSummary => Screen::Summary(summary::SummaryState::new(session)),
            Route::ModelPredictions => {
                Screen::Predictions(predictions::PredictionsState::new(session))
            }
        }
    }

    pub fn route(&self) -> Route {
        match self {
            Screen::Summary(_) => Route::ModelSummary,
            Screen::Predictions(_) => Route::ModelPredictions,
        }
    }

    pub fn draw(&self, f: &mut Frame, session: &Session) {
        let area = f.size();
        f.render_widget(Block::default().style(Theme::base()), area);

        let (nav, body, hints) = layout::shell(area);
        f.render_widget(widgets::nav(self.route()), nav);

        match self {
            Screen::Summary(s) => summary::draw(f, body, hints, s, session),
            Screen::Predictions(s) => predictions::draw(f, body, hints, s, session),
        }
    }

    pub fn handle_key(&mut self, key: KeyCode, session: &mut Session) -> Action {
        match self {
            Screen::Summary(s) => summary::handle_key(s, key, session),
            Screen::Predictions(s) => predictions::handle_key(s, key, session),
        }
    }
}

/// Keys every view shares: section switching and quitting.
fn nav_key(current: Route, key: KeyCode) -> Action {
    let target = match key {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('1') => Route::ModelSummary,
        KeyCode::Char('2') => Route::ModelPredictions,
        KeyCode::Tab | KeyCode::BackTab => match current {
            Route::ModelSummary => Route::ModelPredictions,
            Route::ModelPredictions => Route::ModelSummary,
        },
        _ => return Action::None,
    };

    if target == current {
        Action::None
    } else {
        Action::Navigate(target)
    }
}
