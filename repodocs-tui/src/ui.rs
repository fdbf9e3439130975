//! UI rendering for the dashboard.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};
use repodocs_core::format::{format_relative_time, format_relative_time_opt};

use crate::app::{App, BannerKind, ViewMode};

/// Success banner color
const BANNER_OK: Color = Color::Rgb(80, 200, 120);
/// Error banner color
const BANNER_ERR: Color = Color::Rgb(220, 80, 80);
/// Border color for the repositories table
const BORDER_REPOS: Color = Color::Rgb(0, 150, 150);
/// Border color for the browse table
const BORDER_BROWSE: Color = Color::Rgb(80, 160, 80);

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    match app.view_mode {
        ViewMode::Saved => render_saved_view(frame, app),
        ViewMode::Browse => render_browse_view(frame, app),
    }

    if app.pending_delete.is_some() {
        render_confirm_modal(frame, app);
    }
}

/// Render the connected repositories view.
fn render_saved_view(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Layout: tab header, status line, table, footer
    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .split(area);

    render_tab_header(frame, ViewMode::Saved, chunks[0]);
    render_status_line(frame, app, chunks[1]);
    render_saved_table(frame, app, chunks[2]);
    render_saved_footer(frame, app, chunks[3]);
}

/// Render the GitHub browse view.
fn render_browse_view(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .split(area);

    render_tab_header(frame, ViewMode::Browse, chunks[0]);
    render_status_line(frame, app, chunks[1]);
    render_browse_table(frame, app, chunks[2]);
    render_browse_footer(frame, app, chunks[3]);
}

/// Render the tab bar header with the app name and the two views.
fn render_tab_header(frame: &mut Frame, active: ViewMode, area: Rect) {
    let chunks = Layout::horizontal([
        Constraint::Length(10), // App name
        Constraint::Min(1),     // Tabs
    ])
    .split(area);

    let app_name = Paragraph::new(" repodocs").style(Style::default().fg(Color::Cyan).bold());
    frame.render_widget(app_name, chunks[0]);

    let (saved_style, browse_style) = match active {
        ViewMode::Saved => (
            Style::default()
                .fg(Color::Cyan)
                .bold()
                .add_modifier(Modifier::UNDERLINED),
            Style::default().fg(Color::DarkGray),
        ),
        ViewMode::Browse => (
            Style::default().fg(Color::DarkGray),
            Style::default()
                .fg(Color::Cyan)
                .bold()
                .add_modifier(Modifier::UNDERLINED),
        ),
    };

    let tabs = Line::from(vec![
        Span::styled(" Connected ", saved_style),
        Span::styled(" Browse GitHub ", browse_style),
    ]);
    frame.render_widget(Paragraph::new(tabs), chunks[1]);
}

/// Render the status line: search input, banner, or active filter.
fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    if app.searching {
        let line = Line::from(vec![
            Span::styled(" Search: ", Style::default().fg(Color::Yellow)),
            Span::raw(app.search_query.as_str()),
            Span::styled("_", Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    if let Some(banner) = &app.banner {
        let color = match banner.kind {
            BannerKind::Success => BANNER_OK,
            BannerKind::Error => BANNER_ERR,
        };
        let line = Line::from(vec![
            Span::raw(" "),
            Span::styled(banner.text.as_str(), Style::default().fg(color).bold()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    if !app.search_query.is_empty() {
        let line = Line::from(vec![
            Span::styled(" Filter: ", Style::default().fg(Color::DarkGray)),
            Span::raw(app.search_query.as_str()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Render the connected repositories table.
fn render_saved_table(frame: &mut Frame, app: &mut App, area: Rect) {
    let header_cells = ["ID", "Name", "Docs", "Last Run", "Connected"]
        .into_iter()
        .map(|h| Cell::from(h).style(Style::default().fg(Color::Yellow).bold()));
    let header = Row::new(header_cells).height(1);

    let visible = app.visible_saved();
    let saved = &app.saved;
    let rows = visible.iter().map(|&idx| {
        let row = &saved[idx];
        let docs_style = if row.has_docs() {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Row::new([
            Cell::from(row.repo.id.to_string()),
            Cell::from(row.repo.name.as_str()),
            Cell::from(row.doc_count.to_string()).style(docs_style),
            Cell::from(format_relative_time_opt(row.latest_generated_at)).style(docs_style),
            Cell::from(format_relative_time(row.repo.created_at)),
        ])
    });

    let widths = [
        Constraint::Length(6),  // ID
        Constraint::Fill(1),    // Name
        Constraint::Length(6),  // Docs
        Constraint::Length(12), // Last Run
        Constraint::Length(14), // Connected
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_REPOS))
                .title(" Connected Repositories "),
        )
        .row_highlight_style(
            Style::default()
                .add_modifier(Modifier::REVERSED)
                .fg(Color::Cyan),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

/// Render the GitHub repositories table.
fn render_browse_table(frame: &mut Frame, app: &mut App, area: Rect) {
    let header_cells = ["Repository", "Visibility", "Description"]
        .into_iter()
        .map(|h| Cell::from(h).style(Style::default().fg(Color::Yellow).bold()));
    let header = Row::new(header_cells).height(1);

    let visible = app.visible_github();
    let repos = &app.github_repos;
    let rows = visible.iter().map(|&idx| {
        let repo = &repos[idx];
        let vis_style = if repo.private {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Row::new([
            Cell::from(repo.full_name.as_str()),
            Cell::from(repo.visibility()).style(vis_style),
            Cell::from(repo.description.as_deref().unwrap_or("")),
        ])
    });

    let widths = [
        Constraint::Length(40), // Repository
        Constraint::Length(10), // Visibility
        Constraint::Fill(1),    // Description
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_BROWSE))
                .title(" GitHub Repositories "),
        )
        .row_highlight_style(
            Style::default()
                .add_modifier(Modifier::REVERSED)
                .fg(Color::Cyan),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut app.github_table_state);
}

/// Render the footer for the connected view.
fn render_saved_footer(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.visible_saved().len();
    let selected = app.table_state.selected().map(|i| i + 1).unwrap_or(0);

    let mut footer_spans = vec![
        Span::styled(" Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" docs  "),
        Span::styled("c", Style::default().fg(Color::Yellow)),
        Span::raw(" connect  "),
        Span::styled("d", Style::default().fg(Color::Yellow)),
        Span::raw(" remove  "),
        Span::styled("/", Style::default().fg(Color::Yellow)),
        Span::raw(" search  "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" refresh  "),
        Span::styled("j/k", Style::default().fg(Color::Yellow)),
        Span::raw(" navigate  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit  "),
        Span::raw("| "),
        Span::styled(
            format!("{}/{} repositories", selected, total),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    if let Some(at) = app.last_refreshed {
        footer_spans.push(Span::raw(" | "));
        footer_spans.push(Span::styled(
            format!("refreshed {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(footer_spans)), area);
}

/// Render the footer for the browse view.
fn render_browse_footer(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.visible_github().len();
    let selected = app
        .github_table_state
        .selected()
        .map(|i| i + 1)
        .unwrap_or(0);

    let footer = Line::from(vec![
        Span::styled(" Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" connect  "),
        Span::styled("/", Style::default().fg(Color::Yellow)),
        Span::raw(" search  "),
        Span::styled("j/k", Style::default().fg(Color::Yellow)),
        Span::raw(" navigate  "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" back  "),
        Span::raw("| "),
        Span::styled(
            format!("{}/{} repositories", selected, total),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}

/// Render the removal confirmation prompt over the current view.
fn render_confirm_modal(frame: &mut Frame, app: &App) {
    let Some(pending) = &app.pending_delete else {
        return;
    };

    let area = centered_rect(46, 6, frame.area());
    frame.render_widget(Clear, area);

    let text = vec![
        Line::raw(""),
        Line::from(vec![
            Span::raw("Remove "),
            Span::styled(
                pending.repo_name.as_str(),
                Style::default().fg(Color::Cyan).bold(),
            ),
            Span::raw("?"),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(Color::Yellow)),
            Span::raw(" remove  "),
            Span::styled("n", Style::default().fg(Color::Yellow)),
            Span::raw(" keep"),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BANNER_ERR))
        .title(" Confirm removal ");

    frame.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(block),
        area,
    );
}

/// Rectangle of the given size centered within `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .split(area);
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width),
        Constraint::Fill(1),
    ])
    .split(vertical[1]);
    horizontal[1]
}
