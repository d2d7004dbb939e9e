//! Interactive shell state: what is on screen, which input is being typed,
//! and how each key maps onto a store operation. Drawing lives in `ui`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::Error;
use crate::store::TaskStore;
use crate::task::{parse_tags, NewTask, Priority, Status, Task, TaskPatch};

/// Which subset of tasks the list shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Query {
    #[default]
    All,
    Active,
    Title(String),
    Tag(String),
    Status(Status),
    Priority(Priority),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Tasks,
    Stats,
    Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Add,
    Edit(u32),
    SearchTitle,
    SearchTag,
    FilterStatus,
    FilterPriority,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: String,
    pub value: String,
}

impl Field {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: String::new(),
        }
    }
}

/// A sequence of single-line inputs filled in one after another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<Field>,
    pub current: usize,
}

impl Form {
    fn add() -> Self {
        Self::new(
            FormKind::Add,
            vec![
                Field::new("Title"),
                Field::new("Description"),
                Field::new(format!("Priority {}", menu(&Priority::ALL.map(Priority::label)))),
                Field::new("Due date (DD.MM.YYYY, optional)"),
                Field::new("Tags (comma separated)"),
            ],
        )
    }

    fn edit(task: &Task) -> Self {
        Self::new(
            FormKind::Edit(task.id),
            vec![
                Field::new(format!("Title [{}]", task.title)),
                Field::new(format!("Description [{}]", task.description)),
                Field::new(format!(
                    "Status [{}] {}",
                    task.status,
                    menu(&Status::ALL.map(Status::label))
                )),
            ],
        )
    }

    fn single(kind: FormKind, label: impl Into<String>) -> Self {
        Self::new(kind, vec![Field::new(label)])
    }

    fn new(kind: FormKind, fields: Vec<Field>) -> Self {
        Self {
            kind,
            fields,
            current: 0,
        }
    }

    pub fn current_field(&self) -> &Field {
        &self.fields[self.current]
    }

    fn value(&self, index: usize) -> &str {
        self.fields[index].value.trim()
    }
}

fn menu(labels: &[&str]) -> String {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| format!("[{}] {}", i + 1, label))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Input(Form),
    ConfirmDelete(u32),
    /// Interrupted; waiting for y/N on saving before exit.
    ConfirmSave,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub is_error: bool,
}

/// What the event loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Save,
    Quit { save: bool },
}

#[derive(Debug, Default)]
pub struct App {
    pub store: TaskStore,
    pub query: Query,
    pub screen: Screen,
    pub selected: usize,
    pub mode: Mode,
    pub message: Option<Message>,
}

impl App {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store,
            ..Default::default()
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            is_error: true,
        });
    }

    /// Tasks matching the current query, in collection order.
    pub fn visible(&self) -> Vec<&Task> {
        match &self.query {
            Query::All => self.store.list_all().collect(),
            Query::Active => self.store.active().collect(),
            Query::Title(needle) => self.store.search_by_title(needle).collect(),
            Query::Tag(tag) => self.store.search_by_tag(tag).collect(),
            Query::Status(status) => self.store.filter_by_status(*status).collect(),
            Query::Priority(priority) => self.store.filter_by_priority(*priority).collect(),
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.visible().get(self.selected).copied()
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            if self.mode == Mode::ConfirmSave {
                return Flow::Quit { save: false };
            }
            self.mode = Mode::ConfirmSave;
            self.info("Interrupted. Save changes before exit? (y/N)");
            return Flow::Continue;
        }

        match std::mem::take(&mut self.mode) {
            Mode::Normal => self.handle_normal(key),
            Mode::Input(form) => {
                self.handle_input(form, key);
                Flow::Continue
            }
            Mode::ConfirmDelete(id) => {
                self.handle_confirm_delete(id, key);
                Flow::Continue
            }
            Mode::ConfirmSave => Flow::Quit {
                save: matches!(key.code, KeyCode::Char('y' | 'Y')),
            },
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            return Flow::Save;
        }

        self.message = None;
        match key.code {
            KeyCode::Char('q') => return Flow::Quit { save: false },
            KeyCode::Char('w') => return Flow::Quit { save: true },
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected += 1;
                self.clamp_selection();
            }
            KeyCode::Char('a') => self.mode = Mode::Input(Form::add()),
            KeyCode::Char('e') => match self.selected_task() {
                Some(task) => self.mode = Mode::Input(Form::edit(task)),
                None => self.error("No task selected"),
            },
            KeyCode::Char('c') => self.complete_selected(),
            KeyCode::Char('d') => match self.selected_task() {
                Some(task) => {
                    let text = format!("Delete task '{}'? (y/N)", task.title);
                    self.mode = Mode::ConfirmDelete(task.id);
                    self.info(text);
                }
                None => self.error("No task selected"),
            },
            KeyCode::Char('/') => {
                self.mode = Mode::Input(Form::single(FormKind::SearchTitle, "Title contains"))
            }
            KeyCode::Char('#') => self.mode = Mode::Input(Form::single(FormKind::SearchTag, "Tag")),
            KeyCode::Char('f') => {
                self.mode = Mode::Input(Form::single(
                    FormKind::FilterStatus,
                    format!("Status {}", menu(&Status::ALL.map(Status::label))),
                ))
            }
            KeyCode::Char('p') => {
                self.mode = Mode::Input(Form::single(
                    FormKind::FilterPriority,
                    format!("Priority {}", menu(&Priority::ALL.map(Priority::label))),
                ))
            }
            KeyCode::Char('o') => self.show(Query::Active),
            KeyCode::Char('x') | KeyCode::Char('l') | KeyCode::Esc => self.show(Query::All),
            KeyCode::Char('s') => self.screen = Screen::Stats,
            KeyCode::Char('t') => self.screen = Screen::Tags,
            _ => {}
        }
        Flow::Continue
    }

    fn show(&mut self, query: Query) {
        self.query = query;
        self.screen = Screen::Tasks;
        self.selected = 0;
    }

    fn complete_selected(&mut self) {
        let Some(task) = self.selected_task() else {
            self.error("No task selected");
            return;
        };
        if task.status == Status::Done {
            let text = format!("Task #{} is already done", task.id);
            self.info(text);
            return;
        }
        let id = task.id;
        match self.store.complete(id) {
            Ok(task) => {
                let text = format!("Task '{}' done", task.title);
                self.info(text);
            }
            Err(err) => self.report(err),
        }
        self.clamp_selection();
    }

    fn handle_input(&mut self, mut form: Form, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.info("Cancelled"),
            KeyCode::Backspace => {
                form.fields[form.current].value.pop();
                self.mode = Mode::Input(form);
            }
            KeyCode::Char(c) => {
                form.fields[form.current].value.push(c);
                self.mode = Mode::Input(form);
            }
            KeyCode::Enter if form.current + 1 < form.fields.len() => {
                // Title is checked up front so the user is not asked for the
                // remaining fields of a task that cannot be added.
                if form.kind == FormKind::Add && form.current == 0 && form.value(0).is_empty() {
                    self.error("Title must not be empty");
                    return;
                }
                form.current += 1;
                self.mode = Mode::Input(form);
            }
            KeyCode::Enter => self.submit(form),
            _ => self.mode = Mode::Input(form),
        }
    }

    fn submit(&mut self, form: Form) {
        match form.kind {
            FormKind::Add => {
                let priority = parse_ordinal(form.value(2))
                    .and_then(Priority::from_ordinal)
                    .unwrap_or_default();
                let mut new = NewTask::new(form.value(0))
                    .description(form.value(1))
                    .priority(priority)
                    .tags(parse_tags(form.value(4)));
                if !form.value(3).is_empty() {
                    new = new.due_date(form.value(3));
                }
                match self.store.add(new) {
                    Ok(task) => {
                        let text = format!("Task #{} added", task.id);
                        self.info(text);
                    }
                    Err(err) => self.report(err),
                }
            }
            FormKind::Edit(id) => {
                let patch = TaskPatch {
                    title: Some(form.value(0).to_string()),
                    description: Some(form.value(1).to_string()),
                    status: parse_ordinal(form.value(2)).and_then(Status::from_ordinal),
                };
                match self.store.edit(id, patch) {
                    Ok(task) => {
                        let text = format!("Task #{} updated", task.id);
                        self.info(text);
                    }
                    Err(err) => self.report(err),
                }
            }
            FormKind::SearchTitle => self.show(Query::Title(form.value(0).to_string())),
            FormKind::SearchTag => self.show(Query::Tag(form.value(0).to_string())),
            FormKind::FilterStatus => {
                match parse_ordinal(form.value(0)).and_then(Status::from_ordinal) {
                    Some(status) => self.show(Query::Status(status)),
                    None => self.error("Unknown status"),
                }
            }
            FormKind::FilterPriority => {
                match parse_ordinal(form.value(0)).and_then(Priority::from_ordinal) {
                    Some(priority) => self.show(Query::Priority(priority)),
                    None => self.error("Unknown priority"),
                }
            }
        }
        self.clamp_selection();
    }

    fn handle_confirm_delete(&mut self, id: u32, key: KeyEvent) {
        if !matches!(key.code, KeyCode::Char('y' | 'Y')) {
            self.info("Not deleted");
            return;
        }
        match self.store.delete(id) {
            Ok(task) => self.info(format!("Task '{}' deleted", task.title)),
            Err(err) => self.report(err),
        }
        self.clamp_selection();
    }

    /// Shows a store or storage error; the session carries on.
    pub fn report(&mut self, err: Error) {
        self.error(err.to_string());
    }
}

fn parse_ordinal(input: &str) -> Option<usize> {
    input.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(app: &mut App, code: KeyCode) -> Flow {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_line(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
        press(app, KeyCode::Enter);
    }

    fn app_with(titles: &[&str]) -> App {
        let mut store = TaskStore::new();
        for title in titles {
            store.add(NewTask::new(*title)).unwrap();
        }
        App::new(store)
    }

    #[test]
    fn add_form_creates_task() {
        let mut app = App::default();
        press(&mut app, KeyCode::Char('a'));
        type_line(&mut app, "Email Alice");
        type_line(&mut app, "re: invoice");
        type_line(&mut app, "4");
        type_line(&mut app, "");
        type_line(&mut app, "work, mail");

        assert_eq!(app.mode, Mode::Normal);
        let task = app.store.find(1).unwrap();
        assert_eq!(task.title, "Email Alice");
        assert_eq!(task.description, "re: invoice");
        assert_eq!(task.priority, Priority::Urgent);
        assert_eq!(task.due_date, None);
        assert_eq!(task.tags, vec!["work", "mail"]);
    }

    #[test]
    fn invalid_priority_choice_falls_back_to_medium() {
        let mut app = App::default();
        press(&mut app, KeyCode::Char('a'));
        for line in ["t", "", "9", "01.01.2027", ""] {
            type_line(&mut app, line);
        }
        let task = app.store.find(1).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.due_date.as_deref(), Some("01.01.2027"));
    }

    #[test]
    fn empty_title_aborts_add() {
        let mut app = App::default();
        press(&mut app, KeyCode::Char('a'));
        type_line(&mut app, "   ");

        assert_eq!(app.mode, Mode::Normal);
        assert!(app.store.is_empty());
        assert!(app.message.as_ref().unwrap().is_error);
    }

    #[test]
    fn edit_form_keeps_blank_fields() {
        let mut app = app_with(&["first"]);
        press(&mut app, KeyCode::Char('e'));
        type_line(&mut app, "");
        type_line(&mut app, "details");
        type_line(&mut app, "2");

        let task = app.store.find(1).unwrap();
        assert_eq!(task.title, "first");
        assert_eq!(task.description, "details");
        assert_eq!(task.status, Status::InProgress);
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut app = app_with(&["a", "b"]);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.store.len(), 2);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.store.len(), 1);
        assert!(app.store.find(1).is_err());
    }

    #[test]
    fn complete_marks_selected_task_done() {
        let mut app = app_with(&["a", "b"]);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.store.find(2).unwrap().status, Status::Done);
        assert_eq!(app.store.find(1).unwrap().status, Status::Todo);
    }

    #[test]
    fn search_and_filter_change_visible_tasks() {
        let mut app = app_with(&["Email Alice", "Buy milk"]);
        press(&mut app, KeyCode::Char('/'));
        type_line(&mut app, "ALE");
        assert_eq!(app.query, Query::Title("ALE".to_string()));
        assert_eq!(app.visible().len(), 1);

        press(&mut app, KeyCode::Char('f'));
        type_line(&mut app, "1");
        assert_eq!(app.query, Query::Status(Status::Todo));
        assert_eq!(app.visible().len(), 2);

        press(&mut app, KeyCode::Char('p'));
        type_line(&mut app, "x");
        assert!(app.message.as_ref().unwrap().is_error);

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.query, Query::All);
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut app = app_with(&["a", "b"]);
        for _ in 0..5 {
            press(&mut app, KeyCode::Down);
        }
        assert_eq!(app.selected, 1);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn quit_keys() {
        let mut app = App::default();
        assert_eq!(press(&mut app, KeyCode::Char('w')), Flow::Quit { save: true });
        assert_eq!(press(&mut app, KeyCode::Char('q')), Flow::Quit { save: false });
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            Flow::Save
        );
    }

    #[test]
    fn interrupt_asks_before_saving() {
        let mut app = App::default();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);

        assert_eq!(app.handle_key(ctrl_c), Flow::Continue);
        assert_eq!(app.mode, Mode::ConfirmSave);
        assert_eq!(press(&mut app, KeyCode::Char('y')), Flow::Quit { save: true });

        app.handle_key(ctrl_c);
        assert_eq!(press(&mut app, KeyCode::Enter), Flow::Quit { save: false });
    }
}
