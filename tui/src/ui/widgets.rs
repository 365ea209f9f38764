use model_dashboard::{
    schema::FeatureClass,
    views::{display_value, first_if_exists},
    FeatureForm, FeatureSchema, FormValue, Prediction,
};
use ratatui::{
    layout::{Alignment, Constraint},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap},
};

use super::{
    screens::{Route, SECTIONS},
    theme::Theme,
};

fn panel(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border())
        .title(title)
        .title_style(Theme::title())
}

/// Section tabs, the active route highlighted.
pub fn nav(current: Route) -> Tabs<'static> {
    let titles = SECTIONS
        .iter()
        .enumerate()
        .map(|(i, (label, _))| Line::from(format!("{} {label}", i + 1)))
        .collect::<Vec<_>>();

    let selected = SECTIONS
        .iter()
        .position(|(_, route)| *route == current)
        .unwrap_or(0);

    Tabs::new(titles)
        .select(selected)
        .style(Theme::dim())
        .highlight_style(Theme::accent())
        .divider(Span::styled("|", Theme::muted()))
        .block(panel(format!(" Model dashboard  {} ", current.path())))
}

/// Key/value list panel. `None` rows means the data has not arrived.
pub fn info_list(icon: &str, title: &str, rows: Option<Vec<(String, String)>>) -> Table<'static> {
    let rows = match rows {
        None => vec![Row::new(vec![Cell::from(Span::styled("loading...", Theme::muted()))])],
        Some(rows) if rows.is_empty() => {
            vec![Row::new(vec![Cell::from(Span::styled("(empty)", Theme::muted()))])]
        }
        Some(rows) => rows
            .into_iter()
            .map(|(key, value)| {
                Row::new(vec![
                    Cell::from(Span::styled(key, Theme::dim())),
                    Cell::from(Span::styled(value, Theme::text())),
                ])
            })
            .collect(),
    };

    Table::new(rows, [Constraint::Percentage(45), Constraint::Percentage(55)])
        .block(panel(format!(" {icon} {title} ")))
}

/// Feature schema table: name, class, mean or levels.
pub fn features(schema: Option<&FeatureSchema>) -> Table<'static> {
    let Some(schema) = schema else {
        return info_list("#", "Input features", None);
    };

    let header = Row::new(vec!["feature", "class", "mean / levels"]).style(Theme::title());

    let rows = schema.iter().map(|(name, spec)| {
        let class = match &spec.class {
            FeatureClass::Tags(tags) => tags.join(", "),
            FeatureClass::Text(text) => text.clone(),
        };
        let detail = if spec.is_factor() && !spec.is_numeric() {
            spec.levels().join(" | ")
        } else {
            first_if_exists(spec.mean.as_ref())
        };

        Row::new(vec![
            Cell::from(Span::styled(name.to_string(), Theme::dim())),
            Cell::from(class),
            Cell::from(detail),
        ])
    });

    Table::new(
        rows,
        [
            Constraint::Percentage(30),
            Constraint::Percentage(25),
            Constraint::Percentage(45),
        ],
    )
    .header(header)
    .block(panel(" # Input features ".into()))
}

/// Text shown for a form value.
pub fn value_text(value: &FormValue) -> String {
    match value {
        FormValue::Unset => "(unset)".into(),
        other => other.to_query().unwrap_or_default(),
    }
}

/// The editable prediction form; `editing` is the buffer of the selected row.
pub fn form(form: Option<&FeatureForm>, selected: usize, editing: Option<&str>) -> Table<'static> {
    let Some(form) = form else {
        return info_list(">", "Prediction request", None);
    };

    let header = Row::new(vec!["feature", "value", "kind"]).style(Theme::title());

    let rows = form.iter().enumerate().map(|(i, (name, entry))| {
        let is_selected = i == selected;
        let value = match editing {
            Some(buf) if is_selected => format!("{buf}_"),
            _ => value_text(&entry.value),
        };
        let kind = match &entry.value {
            FormValue::Numeric(_) => "numeric",
            FormValue::Categorical(_) if !entry.spec.levels().is_empty() => "factor  ◀ ▶",
            FormValue::Categorical(_) => "text",
            FormValue::Unset => "unset",
        };

        let row = Row::new(vec![
            Cell::from(name.to_string()),
            Cell::from(value),
            Cell::from(Span::styled(kind, Theme::muted())),
        ]);

        if is_selected {
            row.style(Theme::highlight_bg())
        } else {
            row.style(Theme::text())
        }
    });

    Table::new(
        rows,
        [
            Constraint::Percentage(35),
            Constraint::Percentage(40),
            Constraint::Percentage(25),
        ],
    )
    .header(header)
    .block(panel(" > Prediction request ".into()))
}

/// The last prediction received.
pub fn prediction(prediction: Option<&Prediction>, pending: bool) -> Paragraph<'static> {
    let value = match prediction {
        Some(p) => Span::styled(display_value(&p.0), Theme::accent()),
        None => Span::styled("-", Theme::muted()),
    };

    let mut lines = vec![Line::from(value)];
    if pending {
        lines.push(Line::from(Span::styled("waiting for /predict...", Theme::dim())));
    }

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(panel(" = Prediction ".into()))
}

/// Valid levels of the selected feature and the last edit error.
pub fn details(levels: &[String], error: Option<&str>) -> Paragraph<'static> {
    let mut lines = Vec::new();

    if !levels.is_empty() {
        lines.push(Line::from(Span::styled("levels:", Theme::dim())));
        lines.extend(levels.iter().map(|l| Line::from(format!("  {l}"))));
    }

    if let Some(err) = error {
        lines.push(Line::from(Span::styled(err.to_string(), Theme::error())));
    }

    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(panel(" Details ".into()))
}

/// Key hints at the bottom of the screen.
pub fn hints(items: &[(&'static str, &'static str)]) -> Paragraph<'static> {
    let spans = items
        .iter()
        .flat_map(|(key, action)| {
            [
                Span::styled(*key, Theme::dim()),
                Span::styled(format!(" {action}    "), Theme::muted()),
            ]
        })
        .collect::<Vec<_>>();

    Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
}
