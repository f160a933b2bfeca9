// 🖥️ Terminal UI - Archive (heatmap + entry list) and Metrics pages
// Pure state lives in App; rendering reads a fresh snapshot every frame

use crate::entry::{Entry, EntryCandidate};
use crate::error::LedgerResult;
use crate::heatmap::{first_of_year, ViewMode, YearGranularity};
use crate::rules::{CategoryStyler, Tone};
use crate::scale::{label_inverted, Tier};
use crate::snapshot::{snapshot, Cell as GridCell, LedgerSnapshot};
use crate::store::{EntryFilter, EntryRepository, EntryStore};
use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Archive,
    Metrics,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Archive => Page::Metrics,
            Page::Metrics => Page::Archive,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Archive => "Archive",
            Page::Metrics => "Metrics",
        }
    }
}

/// Turns typed text into a candidate (the parsing collaborator, driven
/// synchronously by the caller)
pub type Submit<'a> = dyn FnMut(&str) -> LedgerResult<EntryCandidate> + 'a;

pub struct App<R: EntryRepository> {
    pub store: EntryStore<R>,
    pub page: Page,
    pub filter: EntryFilter,
    pub mode: ViewMode,
    pub granularity: YearGranularity,
    pub state: TableState,
    /// Some while the text input line is open
    pub input: Option<String>,
    /// Last outcome shown in the status bar
    pub status: Option<String>,
    pub today: NaiveDate,
    pub styler: CategoryStyler,
}

impl<R: EntryRepository> App<R> {
    pub fn new(store: EntryStore<R>, today: NaiveDate) -> Self {
        let mut state = TableState::default();
        if !store.is_empty() {
            state.select(Some(0));
        }

        App {
            store,
            page: Page::Archive,
            filter: EntryFilter::All,
            mode: ViewMode::Week,
            granularity: YearGranularity::ByMonth,
            state,
            input: None,
            status: None,
            today,
            styler: CategoryStyler::builtin(),
        }
    }

    /// Archive list under the current filter, newest first
    pub fn visible(&self) -> Vec<&Entry> {
        self.store.newest_first(self.filter)
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        let visible = self.visible();
        self.state.selected().and_then(|i| visible.get(i).copied())
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        snapshot(self.store.entries(), self.mode, self.granularity, self.today)
    }

    pub fn next(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn cycle_filter(&mut self) {
        self.filter = self.filter.next();
        self.reset_selection();
    }

    pub fn cycle_view(&mut self) {
        self.mode = self.mode.next();
    }

    pub fn toggle_granularity(&mut self) {
        self.granularity = self.granularity.toggle();
    }

    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected_entry().map(|e| e.id.clone()) else {
            return;
        };

        match self.store.delete(&id) {
            Ok(removed) => self.status = Some(format!("Deleted {} {}", removed.category, removed.amount)),
            Err(e) => {
                warn!(error = %e, "delete failed");
                self.status = Some(e.to_string());
            }
        }
        self.clamp_selection();
    }

    pub fn begin_input(&mut self) {
        self.input = Some(String::new());
    }

    pub fn cancel_input(&mut self) {
        self.input = None;
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(input) = self.input.as_mut() {
            input.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(input) = self.input.as_mut() {
            input.pop();
        }
    }

    /// Close the input line and commit whatever the parser makes of it.
    /// A failure leaves the ledger untouched and keeps the typed text.
    pub fn submit_input(&mut self, submit: &mut Submit<'_>) {
        let Some(text) = self.input.clone() else {
            return;
        };

        let result = submit(&text).and_then(|candidate| self.store.add(candidate, true));
        match result {
            Ok(entry) => {
                self.status = Some(format!(
                    "Added {} {:.2} {} ({})",
                    entry.kind, entry.amount, entry.currency, entry.category
                ));
                self.input = None;
                self.reset_selection();
            }
            Err(e) => {
                warn!(error = %e, "entry not added");
                self.status = Some(e.to_string());
            }
        }
    }

    fn reset_selection(&mut self) {
        if self.visible().is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            _ => {}
        }
    }
}

// ============================================================================
// EVENT LOOP
// ============================================================================

pub fn run_ui<R: EntryRepository>(app: &mut App<R>, submit: &mut Submit<'_>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, submit);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend, R: EntryRepository>(
    terminal: &mut Terminal<B>,
    app: &mut App<R>,
    submit: &mut Submit<'_>,
) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if app.input.is_some() {
            match key.code {
                KeyCode::Esc => app.cancel_input(),
                KeyCode::Enter => {
                    app.status = Some("Processing...".to_string());
                    terminal.draw(|f| draw(f, app))?;
                    app.submit_input(submit);
                }
                KeyCode::Backspace => app.pop_char(),
                KeyCode::Char(c) => app.push_char(c),
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Tab => app.page = app.page.next(),
            KeyCode::Char('a') | KeyCode::Char('i') => app.begin_input(),
            KeyCode::Char('f') => app.cycle_filter(),
            KeyCode::Char('v') => app.cycle_view(),
            KeyCode::Char('g') => app.toggle_granularity(),
            KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            _ => {}
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

pub fn draw<R: EntryRepository>(f: &mut Frame, app: &mut App<R>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Page
            Constraint::Length(3), // Input / status
        ])
        .split(f.size());

    let snap = app.snapshot();
    render_header(f, chunks[0], app, &snap);

    match app.page {
        Page::Archive => {
            let grid_height = grid_rows(&snap).len() as u16 + 2;
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(grid_height), Constraint::Min(0)])
                .split(chunks[1]);
            render_heatmap(f, parts[0], &snap);
            render_entries(f, parts[1], app);
        }
        Page::Metrics => render_metrics(f, chunks[1], &snap),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header<R: EntryRepository>(f: &mut Frame, area: Rect, app: &App<R>, snap: &LedgerSnapshot) {
    let mut spans = vec![Span::styled(
        "GARLIC ARCHIVE  ",
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];

    for (i, page) in [Page::Archive, Page::Metrics].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title().to_string(), style));
    }

    let net = snap.stats.net;
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Net {:+.2}", net),
        Style::default().fg(if net >= 0.0 { Color::Green } else { Color::Red }),
    ));
    spans.push(Span::raw("  |  "));
    spans.push(Span::raw(format!("{} entries", snap.stats.entry_count)));

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));
    f.render_widget(header, area);
}

/// Rows of cells as laid out on screen for the current view
fn grid_rows(snap: &LedgerSnapshot) -> Vec<Vec<&GridCell>> {
    match (snap.mode, snap.granularity) {
        (ViewMode::Year, YearGranularity::ByMonth) => snap.cells.chunks(6).map(|c| c.iter().collect()).collect(),
        (ViewMode::Year, YearGranularity::ByWeek) => {
            // Weekday rows (Sunday first), one column per calendar week
            let mut rows: Vec<Vec<&GridCell>> = vec![Vec::new(); 7];
            for cell in &snap.cells {
                if let Some(dow) = cell.bucket.day_of_week {
                    rows[dow as usize].push(cell);
                }
            }
            rows
        }
        _ => snap.cells.chunks(7).map(|c| c.iter().collect()).collect(),
    }
}

/// Leading empty columns in the weekday-row layout for the year of `date`
fn year_offset(date: NaiveDate) -> u32 {
    first_of_year(date).weekday().num_days_from_sunday()
}

fn tier_color(tier: Tier) -> Color {
    match tier {
        Tier::Blank => Color::Reset,
        Tier::Neutral => Color::Rgb(38, 38, 38),
        Tier::Gain(1) => Color::Rgb(20, 83, 45),
        Tier::Gain(2) => Color::Rgb(21, 128, 61),
        Tier::Gain(3) => Color::Rgb(34, 197, 94),
        Tier::Gain(_) => Color::Rgb(134, 239, 172),
        Tier::Loss(1) => Color::Rgb(127, 29, 29),
        Tier::Loss(2) => Color::Rgb(185, 28, 28),
        Tier::Loss(3) => Color::Rgb(239, 68, 68),
        Tier::Loss(_) => Color::Rgb(252, 165, 165),
    }
}

fn render_heatmap(f: &mut Frame, area: Rect, snap: &LedgerSnapshot) {
    let compact = snap.mode == ViewMode::Year && snap.granularity == YearGranularity::ByWeek;

    let lines: Vec<Line> = grid_rows(snap)
        .into_iter()
        .enumerate()
        .map(|(row, cells)| {
            let mut spans = Vec::new();
            if compact {
                // Sunday row starts on Jan 1; later rows start one column in
                // when Jan 1 falls after their weekday
                let lead = cells
                    .first()
                    .and_then(|c| c.bucket.date)
                    .map(|d| u32::from(year_offset(d) > row as u32))
                    .unwrap_or(0);
                spans.extend((0..lead).map(|_| Span::raw(" ")));
            }
            for cell in cells {
                spans.push(render_cell(cell, snap.max_abs, compact));
            }
            Line::from(spans)
        })
        .collect();

    let title = format!(
        " {} {} · {:+.2} ",
        snap.mode.title(),
        if snap.mode == ViewMode::Year { snap.granularity.title() } else { "" },
        snap.total
    );

    let grid = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    );
    f.render_widget(grid, area);
}

fn render_cell(cell: &GridCell, max_abs: f64, compact: bool) -> Span<'static> {
    let bg = tier_color(cell.tier);
    if compact {
        return Span::styled("■", Style::default().fg(bg));
    }

    let fg = if label_inverted(cell.bucket.value, max_abs) { Color::Black } else { Color::White };
    let text = if cell.bucket.is_padding {
        "      ".to_string()
    } else {
        format!(" {:>4} ", cell.bucket.label)
    };
    Span::styled(text, Style::default().bg(bg).fg(fg))
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Income => Color::Green,
        Tone::Food => Color::Yellow,
        Tone::Transport => Color::Blue,
        Tone::Neutral => Color::White,
    }
}

fn render_entries<R: EntryRepository>(f: &mut Frame, area: Rect, app: &mut App<R>) {
    let header = Row::new(["", "Date", "Category", "Description", "Amount", "AI"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray));

    let rows: Vec<Row> = app
        .visible()
        .into_iter()
        .map(|entry| {
            let style = app.styler.style(&entry.category, entry.kind);
            let color = tone_color(style.tone);
            Row::new(vec![
                Cell::from(style.tag.glyph()),
                Cell::from(entry.date.clone()),
                Cell::from(truncate(&entry.category, 16)).style(Style::default().fg(color)),
                Cell::from(truncate(&entry.description, 30)),
                Cell::from(format!("{:+.2} {}", entry.signed_amount(), entry.currency))
                    .style(Style::default().fg(if entry.is_income() { Color::Green } else { Color::Red })),
                Cell::from(if entry.is_ai_generated { "✦" } else { "" }),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(11),
            Constraint::Length(17),
            Constraint::Min(20),
            Constraint::Length(16),
            Constraint::Length(3),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Archive [{}] ", app.filter.title())),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_metrics(f: &mut Frame, area: Rect, snap: &LedgerSnapshot) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(0)])
        .split(columns[0]);

    let stats = &snap.stats;
    let stat_lines = vec![
        Line::from(format!("  Average daily spend  {:>12.2}", stats.average_daily)),
        Line::from(format!("  Peak flow            {:>12.2}", stats.peak_flow)),
        Line::from(format!("  Positive frequency   {:>11.1}%", stats.positive_frequency)),
        Line::from(Span::styled(
            format!("  Income               {:>12.2}", stats.total_income),
            Style::default().fg(Color::Green),
        )),
        Line::from(Span::styled(
            format!("  Expense              {:>12.2}", stats.total_expense),
            Style::default().fg(Color::Red),
        )),
        Line::from(format!("  Active days          {:>12}", stats.distinct_active_dates)),
    ];
    f.render_widget(
        Paragraph::new(stat_lines).block(Block::default().borders(Borders::ALL).title(" Summary ")),
        left[0],
    );

    let header = Row::new(["Category", "Count", "Income", "Expense"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }));
    let rows: Vec<Row> = snap
        .table
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(truncate(&row.category, 18)),
                Cell::from(row.count.to_string()),
                Cell::from(format!("{:.2}", row.income_sum)).style(Style::default().fg(Color::Green)),
                Cell::from(format!("{:.2}", row.expense_sum)).style(Style::default().fg(Color::Red)),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(19),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Categories "));
    f.render_widget(table, left[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[1]);

    render_bars(
        f,
        right[0],
        " Trend (last 15) ",
        snap.trend
            .iter()
            .map(|p| (p.label.clone(), p.income_sum, p.expense_sum))
            .collect(),
    );
    render_bars(
        f,
        right[1],
        " Spending by category ",
        snap.distribution
            .iter()
            .map(|s| (s.category.clone(), 0.0, s.value))
            .collect(),
    );
}

/// Horizontal bar lines: income in green, expense in red
fn render_bars(f: &mut Frame, area: Rect, title: &str, data: Vec<(String, f64, f64)>) {
    let peak = data
        .iter()
        .map(|(_, inc, exp)| inc.max(*exp))
        .fold(0.0_f64, f64::max);
    let width = area.width.saturating_sub(24).max(1) as f64;

    let bar = |value: f64| -> String {
        if peak <= 0.0 || value <= 0.0 {
            return String::new();
        }
        "█".repeat(((value / peak) * width).ceil() as usize)
    };

    let lines: Vec<Line> = data
        .iter()
        .map(|(label, income, expense)| {
            let mut spans = vec![Span::raw(format!(" {:<10} ", truncate(label, 10)))];
            if *income > 0.0 {
                spans.push(Span::styled(bar(*income), Style::default().fg(Color::Green)));
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(bar(*expense), Style::default().fg(Color::Red)));
            Line::from(spans)
        })
        .collect();

    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title.to_string())),
        area,
    );
}

fn render_status_bar<R: EntryRepository>(f: &mut Frame, area: Rect, app: &App<R>) {
    let line = if let Some(input) = &app.input {
        Line::from(vec![
            Span::styled(" > ", Style::default().fg(Color::Yellow)),
            Span::raw(input.clone()),
            Span::styled("█", Style::default().fg(Color::Gray)),
        ])
    } else {
        let mut spans = Vec::new();
        if let Some(status) = &app.status {
            spans.push(Span::styled(format!(" {} ", status), Style::default().fg(Color::Cyan)));
            spans.push(Span::raw("| "));
        }
        for (key, label) in [
            ("a", "Add"),
            ("d", "Delete"),
            ("f", "Filter"),
            ("v", "View"),
            ("g", "Year grid"),
            ("Tab", "Page"),
        ] {
            spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
            spans.push(Span::raw(format!(" {} | ", label)));
        }
        spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        spans.push(Span::raw(" Quit"));
        Line::from(spans)
    };

    let bar = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;
    use crate::error::LedgerError;
    use crate::store::MemoryRepository;
    use ratatui::backend::TestBackend;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    fn app_with(entries: &[(f64, &str, EntryKind)]) -> App<MemoryRepository> {
        let mut store = EntryStore::open(MemoryRepository::new());
        for (amount, category, kind) in entries {
            store
                .add(EntryCandidate::new(*amount, category, "2024-05-15", *kind), false)
                .unwrap();
        }
        App::new(store, today())
    }

    #[test]
    fn test_submit_adds_ai_entry() {
        let mut app = app_with(&[]);
        app.begin_input();
        for c in "coffee 12".chars() {
            app.push_char(c);
        }

        let mut submit = |text: &str| -> LedgerResult<EntryCandidate> {
            assert_eq!(text, "coffee 12");
            Ok(EntryCandidate::new(12.0, "Coffee", "2024-05-15", EntryKind::Expense))
        };
        app.submit_input(&mut submit);

        assert!(app.input.is_none());
        assert_eq!(app.store.len(), 1);
        assert!(app.store.entries()[0].is_ai_generated);
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_failed_submit_keeps_text() {
        let mut app = app_with(&[]);
        app.begin_input();
        app.push_char('x');

        let mut submit =
            |_: &str| -> LedgerResult<EntryCandidate> { Err(LedgerError::ParseFailure("No response from AI".into())) };
        app.submit_input(&mut submit);

        assert_eq!(app.input.as_deref(), Some("x"));
        assert!(app.store.is_empty());
        assert!(app.status.as_deref().unwrap().contains("No response"));
    }

    #[test]
    fn test_filter_and_delete() {
        let mut app = app_with(&[
            (10.0, "Food", EntryKind::Expense),
            (100.0, "Salary", EntryKind::Income),
        ]);

        app.cycle_filter();
        assert_eq!(app.filter, EntryFilter::Income);
        assert_eq!(app.visible().len(), 1);

        app.delete_selected();
        assert_eq!(app.store.len(), 1);
        assert!(app.visible().is_empty());
        assert_eq!(app.state.selected(), None);
    }

    #[test]
    fn test_selection_wraps() {
        let mut app = app_with(&[
            (1.0, "A", EntryKind::Expense),
            (2.0, "B", EntryKind::Expense),
        ]);
        assert_eq!(app.state.selected(), Some(0));
        app.previous();
        assert_eq!(app.state.selected(), Some(1));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_grid_rows_per_view() {
        let mut app = app_with(&[(50.0, "Food", EntryKind::Expense)]);

        assert_eq!(grid_rows(&app.snapshot()).len(), 1);

        app.cycle_view();
        // May 2024 starts on a Wednesday: 2 padding + 31 days
        assert_eq!(grid_rows(&app.snapshot()).len(), 5);

        app.cycle_view();
        assert_eq!(grid_rows(&app.snapshot()).len(), 2);

        app.toggle_granularity();
        let snap = app.snapshot();
        let rows = grid_rows(&snap);
        assert_eq!(rows.len(), 7);
        assert_eq!(rows.iter().map(|r| r.len()).sum::<usize>(), 366);
    }

    #[test]
    fn test_draw_every_view() {
        let mut app = app_with(&[
            (50.0, "Food", EntryKind::Expense),
            (5000.0, "Salary", EntryKind::Income),
        ]);
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();

        for _ in 0..4 {
            terminal.draw(|f| draw(f, &mut app)).unwrap();
            if app.mode == ViewMode::Year {
                app.toggle_granularity();
            } else {
                app.cycle_view();
            }
        }
        app.page = Page::Metrics;
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Summary"));
        assert!(text.contains("Salary"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Groceries and more", 8), "Groceri…");
    }
}
