use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Computes the shell regions shared by every view.
///
/// # Returns
/// (nav, body, hints)
pub fn shell(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(area);

    (chunks[0], chunks[1], chunks[2])
}

/// Splits the summary body into a 2x2 grid.
///
/// # Returns
/// [model info, hyperparameters, train results, input features]
pub fn summary(area: Rect) -> [Rect; 4] {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let top = halves(rows[0]);
    let bottom = halves(rows[1]);

    [top.0, top.1, bottom.0, bottom.1]
}

/// Splits the prediction body into (form, prediction, status).
pub fn predictions(area: Rect) -> (Rect, Rect, Rect) {
    let (form, side) = {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);
        (cols[0], cols[1])
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(side);

    (form, rows[0], rows[1])
}

fn halves(area: Rect) -> (Rect, Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    (cols[0], cols[1])
}
