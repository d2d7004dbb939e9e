use std::io;
use std::path::Path;

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::app::{App, Flow, FormKind, Mode, Query, Screen};
use crate::storage;
use crate::store::Stats;
use crate::task::{Priority, Status, Task};

const HELP: &str = "a add  e edit  c complete  d delete  / title  # tag  f status  p priority  \
                    o open  x all  s stats  t tags  ^S save  w save+quit  q quit";

/// Runs until the user quits. Returns whether the tasks were saved on the
/// way out.
pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    data_file: &Path,
) -> io::Result<bool> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let flow = app.handle_key(key);
            if let Some(saved) = apply_flow(app, flow, data_file) {
                return Ok(saved);
            }
        }
    }
}

/// Carries out a key's outcome. `Some(saved)` ends the session; a failed
/// save on the way out keeps it running so the user can retry or quit.
fn apply_flow(app: &mut App, flow: Flow, data_file: &Path) -> Option<bool> {
    match flow {
        Flow::Continue => None,
        Flow::Save => {
            match storage::save(data_file, &app.store) {
                Ok(()) => app.info(format!("Saved to {}", data_file.display())),
                Err(err) => app.report(err),
            }
            None
        }
        Flow::Quit { save: false } => Some(false),
        Flow::Quit { save: true } => match storage::save(data_file, &app.store) {
            Ok(()) => Some(true),
            Err(err) => {
                app.error(format!("{err}. Press w to retry or q to quit without saving"));
                None
            }
        },
    }
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(4),
        ])
        .split(f.area());

    f.render_widget(header(app), chunks[0]);
    match app.screen {
        Screen::Tasks => draw_tasks(f, app, chunks[1]),
        Screen::Stats => f.render_widget(stats_view(&app.store.stats()), chunks[1]),
        Screen::Tags => draw_tags(f, app, chunks[1]),
    }
    f.render_widget(footer(app), chunks[2]);
}

fn header(app: &App) -> Paragraph<'static> {
    let view = match &app.query {
        Query::All => "all tasks".to_string(),
        Query::Active => "open tasks".to_string(),
        Query::Title(needle) => format!("title contains \"{needle}\""),
        Query::Tag(tag) => format!("tag #{tag}"),
        Query::Status(status) => format!("status {status}"),
        Query::Priority(priority) => format!("priority {priority}"),
    };
    Paragraph::new(Line::from(vec![
        Span::styled("TERMINAL TASK MANAGER", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {} | {} total", view, app.store.len())),
    ]))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)))
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Done => Color::Green,
        Status::InProgress => Color::Yellow,
        Status::Cancelled => Color::Red,
        Status::Todo => Color::Blue,
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Urgent => Color::Red,
        Priority::High => Color::Yellow,
        Priority::Medium => Color::Green,
        Priority::Low => Color::Blue,
    }
}

fn draw_tasks(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let tasks = app.visible();
    let items: Vec<ListItem> = tasks
        .iter()
        .map(|t| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("[#{}] ", t.id)),
                Span::styled(&t.title, Style::default().fg(status_color(t.status))),
            ]))
        })
        .collect();

    let title = if tasks.is_empty() {
        "Tasks (none)".to_string()
    } else {
        format!("Tasks ({})", tasks.len())
    };
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(app.selected).filter(|_| !tasks.is_empty()));
    f.render_stateful_widget(list, chunks[0], &mut state);

    let detail = match app.selected_task() {
        Some(task) => task_detail(task),
        None => Paragraph::new("No tasks. Press 'a' to add one."),
    };
    f.render_widget(
        detail
            .block(Block::default().title("Details").borders(Borders::ALL))
            .wrap(Wrap { trim: false }),
        chunks[1],
    );
}

fn field<'a>(name: &'a str, value: impl Into<Span<'a>>) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{name}: "), Style::default().add_modifier(Modifier::BOLD)),
        value.into(),
    ])
}

fn task_detail(task: &Task) -> Paragraph<'_> {
    let mut lines = vec![
        field("Task", format!("#{}", task.id)),
        field("Title", task.title.as_str()),
        field("Description", task.description.as_str()),
        field(
            "Status",
            Span::styled(task.status.label(), Style::default().fg(status_color(task.status))),
        ),
        field(
            "Priority",
            Span::styled(task.priority.label(), Style::default().fg(priority_color(task.priority))),
        ),
        field("Created", task.created_at.as_str()),
    ];
    if let Some(due) = &task.due_date {
        lines.push(field("Due", due.as_str()));
    }
    if !task.tags.is_empty() {
        lines.push(field("Tags", task.tags.join(", ")));
    }
    Paragraph::new(lines)
}

fn stats_view(stats: &Stats) -> Paragraph<'static> {
    let block = Block::default().title("Statistics").borders(Borders::ALL);
    if stats.total == 0 {
        return Paragraph::new("No data for statistics yet").block(block);
    }

    let mut lines = vec![Line::from(format!("Total tasks: {}", stats.total)), Line::default()];
    for entry in &stats.by_status {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<14}", entry.status.label()),
                Style::default().fg(status_color(entry.status)),
            ),
            Span::raw(format!("{:>4} ({:.1}%)", entry.count, entry.percentage)),
        ]));
    }

    let bar = stats.progress_bar();
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Overall progress",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(vec![
        Span::raw("["),
        Span::styled("█".repeat(bar.filled), Style::default().fg(Color::Green)),
        Span::raw("░".repeat(bar.empty)),
        Span::raw(format!("] {:.1}%", stats.get(Status::Done).percentage)),
    ]));
    Paragraph::new(lines).block(block)
}

fn draw_tags(f: &mut Frame, app: &App, area: Rect) {
    let tags = app.store.distinct_tags();
    let items: Vec<ListItem> = tags
        .iter()
        .map(|t| ListItem::new(format!("#{}: {} task(s)", t.tag, t.count)))
        .collect();
    let title = format!("Tags ({})", tags.len());
    let list = if items.is_empty() {
        List::new(vec![ListItem::new("No tags yet")])
    } else {
        List::new(items)
    };
    f.render_widget(list.block(Block::default().title(title).borders(Borders::ALL)), area);
}

fn footer(app: &App) -> Paragraph<'static> {
    let prompt = match &app.mode {
        Mode::Input(form) => {
            let heading = match form.kind {
                FormKind::Add => "New task",
                FormKind::Edit(_) => "Edit task (leave blank to keep)",
                FormKind::SearchTitle | FormKind::SearchTag => "Search",
                FormKind::FilterStatus | FormKind::FilterPriority => "Filter",
            };
            let field = form.current_field();
            Line::from(vec![
                Span::styled(format!("{heading} > "), Style::default().fg(Color::Cyan)),
                Span::raw(format!("{}: {}_", field.label, field.value)),
            ])
        }
        _ => Line::from(Span::styled(HELP, Style::default().fg(Color::DarkGray))),
    };

    let message = match &app.message {
        Some(m) if m.is_error => Line::from(Span::styled(m.text.clone(), Style::default().fg(Color::Red))),
        Some(m) => Line::from(Span::styled(m.text.clone(), Style::default().fg(Color::Green))),
        None => Line::default(),
    };

    Paragraph::new(vec![message, prompt]).block(Block::default().borders(Borders::TOP))
}
