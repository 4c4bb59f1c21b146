use crate::error::BoardError;
use crate::export::{self, ExportFormat};
use crate::kanban_board::KanbanBoard;
use crate::render::{self, BoardView, TaskAction, TaskCard};
use crate::storage::Storage;
use crate::task::{NewTask, TaskColor};
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::path::{Path, PathBuf};

const HELP: &str =
    "a task  c column  r rename  p progress  d done  x delete  e export  i import  q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Start,
    Due,
    Color,
    Column,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Title,
        FormField::Start,
        FormField::Due,
        FormField::Color,
        FormField::Column,
    ];

    fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskForm {
    pub title: String,
    pub start: String,
    pub due: String,
    pub color: TaskColor,
    /// Index into the board's columns
    pub column: usize,
    pub focus: FormField,
}

impl TaskForm {
    fn new(column: usize) -> Self {
        Self {
            title: String::new(),
            start: String::new(),
            due: String::new(),
            color: TaskColor::default(),
            column,
            focus: FormField::Title,
        }
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Title => Some(&mut self.title),
            FormField::Start => Some(&mut self.start),
            FormField::Due => Some(&mut self.due),
            FormField::Color | FormField::Column => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,
    AddTask(TaskForm),
    AddColumn(String),
    RenameColumn(String),
    Export,
    Import(String),
    /// Blocks everything until a key is pressed
    Alert(String),
}

pub struct App<S: Storage> {
    pub kanban: KanbanBoard<S>,
    pub export_dir: PathBuf,
    pub selected_column: usize,
    pub selected_task: usize,
    pub mode: Mode,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl<S: Storage> App<S> {
    pub fn new(kanban: KanbanBoard<S>, export_dir: PathBuf) -> Self {
        Self {
            kanban,
            export_dir,
            selected_column: 0,
            selected_task: 0,
            mode: Mode::Normal,
            status: None,
            should_quit: false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        self.mode = match mode {
            Mode::Normal => self.normal_key(key.code),
            Mode::AddTask(form) => self.task_form_key(form, key.code),
            Mode::AddColumn(title) => self.add_column_key(title, key.code),
            Mode::RenameColumn(title) => self.rename_column_key(title, key.code),
            Mode::Export => self.export_key(key.code),
            Mode::Import(path) => self.import_key(path, key.code),
            Mode::Alert(_) => Mode::Normal,
        };
    }

    fn normal_key(&mut self, code: KeyCode) -> Mode {
        let columns = self.kanban.board().columns.len();
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected_column = self.selected_column.saturating_sub(1);
                self.selected_task = 0;
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.selected_column + 1 < columns {
                    self.selected_column += 1;
                    self.selected_task = 0;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_task = self.selected_task.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let tasks = self
                    .kanban
                    .board()
                    .columns
                    .get(self.selected_column)
                    .map_or(0, |c| c.tasks.len());
                if self.selected_task + 1 < tasks {
                    self.selected_task += 1;
                }
            }
            KeyCode::Char('a') if columns > 0 => return Mode::AddTask(TaskForm::new(self.selected_column)),
            KeyCode::Char('c') => return Mode::AddColumn(String::new()),
            KeyCode::Char('r') => {
                if let Some(column) = self.kanban.board().columns.get(self.selected_column) {
                    return Mode::RenameColumn(column.title.clone());
                }
            }
            KeyCode::Char('p') => self.run_action(TaskAction::SendToProgress),
            KeyCode::Char('d') => self.run_action(TaskAction::Complete),
            KeyCode::Char('x') | KeyCode::Delete => self.run_action(TaskAction::Delete),
            KeyCode::Char('e') => return Mode::Export,
            KeyCode::Char('i') => return Mode::Import(String::new()),
            _ => {}
        }
        Mode::Normal
    }

    /// Runs `action` on the selected card if that card offers it.
    fn run_action(&mut self, action: TaskAction) {
        let Some(column) = self.kanban.board().columns.get(self.selected_column) else {
            return;
        };
        let Some(task) = column.tasks.get(self.selected_task) else {
            return;
        };
        if !render::actions_for(column.role).contains(&action) {
            return;
        }
        let (column_id, task_id, title) = (column.id.clone(), task.id.clone(), task.title.clone());

        let result = match action {
            TaskAction::SendToProgress => self.kanban.send_to_progress(&task_id),
            TaskAction::Complete => self.kanban.complete_task(&task_id),
            TaskAction::Delete => self.kanban.delete_task(&column_id, &task_id),
        };
        self.status = Some(match result {
            Ok(()) => match action {
                TaskAction::SendToProgress => format!("'{}' is in progress", title),
                TaskAction::Complete => format!("'{}' is done", title),
                TaskAction::Delete => format!("Deleted '{}'", title),
            },
            Err(err) => err.to_string(),
        });
        self.clamp_selection();
    }

    fn task_form_key(&mut self, mut form: TaskForm, code: KeyCode) -> Mode {
        let columns = self.kanban.board().columns.len();
        match code {
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
            KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
            KeyCode::Left => match form.focus {
                FormField::Color => form.color = form.color.prev(),
                FormField::Column => form.column = form.column.saturating_sub(1),
                _ => {}
            },
            KeyCode::Right => match form.focus {
                FormField::Color => form.color = form.color.next(),
                FormField::Column if form.column + 1 < columns => form.column += 1,
                _ => {}
            },
            KeyCode::Enter => return self.submit_task(form),
            KeyCode::Backspace => {
                if let Some(text) = form.focused_text() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = form.focused_text() {
                    text.push(c);
                }
            }
            _ => {}
        }
        Mode::AddTask(form)
    }

    fn submit_task(&mut self, form: TaskForm) -> Mode {
        let Some(column_id) = self
            .kanban
            .board()
            .columns
            .get(form.column)
            .map(|c| c.id.clone())
        else {
            return Mode::AddTask(form);
        };
        let draft = NewTask::new(column_id, &form.title, &form.start, &form.due).with_color(form.color);
        match self.kanban.add_task(draft) {
            Ok(_) => {
                self.selected_column = form.column;
                self.selected_task = self.kanban.board().columns[form.column].tasks.len() - 1;
                self.status = Some(format!("Added '{}'", form.title));
                Mode::Normal
            }
            // incomplete form: stay put, no message
            Err(BoardError::MissingField { .. }) => Mode::AddTask(form),
            Err(err) => {
                self.status = Some(err.to_string());
                Mode::AddTask(form)
            }
        }
    }

    fn add_column_key(&mut self, mut title: String, code: KeyCode) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Enter => match self.kanban.add_column(&title) {
                Ok(_) => {
                    self.selected_column = self.kanban.board().columns.len() - 1;
                    self.selected_task = 0;
                    self.status = Some(format!("Added column '{}'", title));
                    Mode::Normal
                }
                Err(BoardError::MissingField { .. }) => Mode::AddColumn(title),
                Err(err) => {
                    self.status = Some(err.to_string());
                    Mode::AddColumn(title)
                }
            },
            code => {
                edit_text(&mut title, code);
                Mode::AddColumn(title)
            }
        }
    }

    fn rename_column_key(&mut self, mut title: String, code: KeyCode) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Enter => {
                let Some(column_id) = self
                    .kanban
                    .board()
                    .columns
                    .get(self.selected_column)
                    .map(|c| c.id.clone())
                else {
                    return Mode::Normal;
                };
                match self.kanban.rename_column(&column_id, &title) {
                    Ok(()) => Mode::Normal,
                    Err(BoardError::MissingField { .. }) => Mode::RenameColumn(title),
                    Err(err) => {
                        self.status = Some(err.to_string());
                        Mode::RenameColumn(title)
                    }
                }
            }
            code => {
                edit_text(&mut title, code);
                Mode::RenameColumn(title)
            }
        }
    }

    fn export_key(&mut self, code: KeyCode) -> Mode {
        let format = match code {
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Char('j') => ExportFormat::Json,
            KeyCode::Char('t') => ExportFormat::Text,
            KeyCode::Char('c') => ExportFormat::Csv,
            KeyCode::Char('p') => ExportFormat::Pdf,
            _ => return Mode::Export,
        };
        self.status = Some(
            match export::write_export(self.kanban.board(), format, &self.export_dir) {
                Ok(path) => format!("Exported to {}", path.display()),
                Err(err) => format!("Export failed: {}", err),
            },
        );
        Mode::Normal
    }

    fn import_key(&mut self, mut path: String, code: KeyCode) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Enter => match self.kanban.import_file(Path::new(path.trim())) {
                Ok(()) => {
                    self.selected_column = 0;
                    self.selected_task = 0;
                    self.status = Some(format!("Imported {}", path.trim()));
                    Mode::Normal
                }
                Err(err) => Mode::Alert(err.to_string()),
            },
            code => {
                edit_text(&mut path, code);
                Mode::Import(path)
            }
        }
    }

    fn clamp_selection(&mut self) {
        let columns = &self.kanban.board().columns;
        if columns.is_empty() {
            self.selected_column = 0;
            self.selected_task = 0;
            return;
        }
        self.selected_column = self.selected_column.min(columns.len() - 1);
        let tasks = columns[self.selected_column].tasks.len();
        self.selected_task = self.selected_task.min(tasks.saturating_sub(1));
    }
}

fn edit_text(buffer: &mut String, code: KeyCode) {
    match code {
        KeyCode::Backspace => {
            buffer.pop();
        }
        KeyCode::Char(c) => buffer.push(c),
        _ => {}
    }
}

pub fn run_app<B: Backend, S: Storage>(terminal: &mut Terminal<B>, app: &mut App<S>) -> io::Result<()> {
    loop {
        // full re-projection every frame
        let view = render::project(app.kanban.board(), Utc::now());
        terminal.draw(|f| draw(f, app, &view))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key);
            }
        }
        if app.should_quit {
            return Ok(());
        }
    }
}

pub fn draw<S: Storage>(f: &mut Frame, app: &App<S>, view: &BoardView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    draw_columns(f, app, view, rows[0]);

    let status = app.status.as_deref().unwrap_or(HELP);
    f.render_widget(
        Paragraph::new(status).style(Style::default().fg(Color::Gray)),
        rows[1],
    );

    match &app.mode {
        Mode::Normal => {}
        Mode::AddTask(form) => draw_task_form(f, app, form),
        Mode::AddColumn(title) => draw_prompt(f, " New column ", "Name:", title),
        Mode::RenameColumn(title) => draw_prompt(f, " Rename column ", "Name:", title),
        Mode::Export => draw_export(f, app),
        Mode::Import(path) => draw_prompt(f, " Import board ", "Path to .json file:", path),
        Mode::Alert(message) => draw_alert(f, message),
    }
}

fn draw_columns<S: Storage>(f: &mut Frame, app: &App<S>, view: &BoardView, area: Rect) {
    if view.columns.is_empty() {
        f.render_widget(
            Paragraph::new("No columns. Press c to add one.")
                .block(Block::default().borders(Borders::ALL)),
            area,
        );
        return;
    }

    let count = view.columns.len() as u32;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, count); view.columns.len()])
        .split(area);

    for (i, column) in view.columns.iter().enumerate() {
        let selected = app.selected_column == i;
        let items: Vec<ListItem> = column.cards.iter().map(card_item).collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!(" {} ({}) ", column.title, column.cards.len()))
                    .borders(Borders::ALL)
                    .border_style(if selected {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default()
                    }),
            )
            .highlight_style(Style::default().add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");

        let mut state = ListState::default();
        if selected && !column.cards.is_empty() {
            state.select(Some(app.selected_task));
        }
        f.render_stateful_widget(list, chunks[i], &mut state);
    }
}

fn card_item(card: &TaskCard) -> ListItem<'static> {
    let (r, g, b) = card.color.rgb();
    let mut lines = vec![
        Line::from(Span::styled(
            card.title.clone(),
            Style::default()
                .fg(Color::White)
                .bg(Color::Rgb(r, g, b))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Start: {}", card.start)),
        Line::from(format!("Due: {}", card.due)),
    ];
    if card.overdue {
        lines.push(Line::from(Span::styled(
            "DUE DATE PASSED",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
    let hints: Vec<Span> = card
        .actions
        .iter()
        .map(|a| {
            Span::styled(
                format!("[{}] {}  ", a.key(), a.label()),
                Style::default().fg(Color::DarkGray),
            )
        })
        .collect();
    lines.push(Line::from(hints));
    lines.push(Line::from(""));
    ListItem::new(lines)
}

fn popup_area(area: Rect, width_percent: u16, height: u16) -> Rect {
    let side = (100 - width_percent) / 2;
    let band = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(height), Constraint::Fill(1)])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(side),
            Constraint::Percentage(width_percent),
            Constraint::Percentage(side),
        ])
        .split(band[1])[1]
}

fn draw_popup(f: &mut Frame, title: &str, lines: Vec<Line>, border: Color) {
    let area = popup_area(f.area(), 60, lines.len() as u16 + 2);
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .block(
                Block::default()
                    .title(title.to_string())
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border)),
            )
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_prompt(f: &mut Frame, title: &str, label: &str, value: &str) {
    let lines = vec![
        Line::from(label.to_string()),
        Line::from(format!("{}_", value)),
        Line::from(Span::styled(
            "Enter to save, Esc to cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    draw_popup(f, title, lines, Color::Cyan);
}

fn draw_task_form<S: Storage>(f: &mut Frame, app: &App<S>, form: &TaskForm) {
    let field = |name: &str, value: String, which: FormField| {
        let marker = if form.focus == which { "> " } else { "  " };
        let style = if form.focus == which {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(format!("{}{:<8}", marker, name), style),
            Span::raw(value),
        ])
    };

    let (r, g, b) = form.color.rgb();
    let column = app
        .kanban
        .board()
        .columns
        .get(form.column)
        .map_or("-", |c| c.title.as_str());

    let mut lines = vec![
        field("Title", form.title.clone(), FormField::Title),
        field("Start", form.start.clone(), FormField::Start),
        field("Due", form.due.clone(), FormField::Due),
    ];
    let mut color_line = field("Color", String::new(), FormField::Color);
    color_line.spans.push(Span::styled(
        format!(" {} ", form.color),
        Style::default().fg(Color::White).bg(Color::Rgb(r, g, b)),
    ));
    lines.push(color_line);
    lines.push(field("Column", format!("< {} >", column), FormField::Column));
    lines.push(Line::from(Span::styled(
        "Tab next field, arrows pick, Enter save, Esc cancel",
        Style::default().fg(Color::DarkGray),
    )));
    draw_popup(f, " New task ", lines, Color::Cyan);
}

fn draw_export<S: Storage>(f: &mut Frame, app: &App<S>) {
    let choices: Vec<Span> = [('j', "JSON"), ('t', "Text"), ('c', "CSV"), ('p', "PDF")]
        .into_iter()
        .map(|(key, name)| Span::raw(format!("[{}] {}  ", key, name)))
        .collect();
    let lines = vec![
        Line::from(choices),
        Line::from(format!("Writes into {}", app.export_dir.display())),
    ];
    draw_popup(f, " Export board ", lines, Color::Cyan);
}

fn draw_alert(f: &mut Frame, message: &str) {
    let lines = vec![
        Line::from(message.to_string()),
        Line::from(Span::styled("Press any key", Style::default().fg(Color::DarkGray))),
    ];
    draw_popup(f, " Error ", lines, Color::Red);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kanban_board::ColumnRole;
    use crate::storage::MemoryStorage;
    use ratatui::backend::TestBackend;

    fn app() -> App<MemoryStorage> {
        let kanban = KanbanBoard::open(MemoryStorage::default()).unwrap();
        App::new(kanban, std::env::temp_dir())
    }

    fn press(app: &mut App<MemoryStorage>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App<MemoryStorage>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn add_task(app: &mut App<MemoryStorage>, title: &str, start: &str, due: &str) {
        press(app, KeyCode::Char('a'));
        type_text(app, title);
        press(app, KeyCode::Tab);
        type_text(app, start);
        press(app, KeyCode::Tab);
        type_text(app, due);
        press(app, KeyCode::Enter);
    }

    fn screen(app: &App<MemoryStorage>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        let view = render::project(app.kanban.board(), Utc::now());
        terminal.draw(|f| draw(f, app, &view)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_add_then_progress_scenario() {
        let mut app = app();
        add_task(&mut app, "Draft spec", "2024-01-01", "2024-01-02");
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.kanban.board().columns[0].tasks.len(), 1);

        press(&mut app, KeyCode::Char('p'));
        let board = app.kanban.board();
        assert!(board.columns[0].tasks.is_empty());
        assert_eq!(board.columns[1].tasks.len(), 1);
        assert_eq!(board.columns[1].tasks[0].title, "Draft spec");
        assert!(!board.columns[1].tasks[0].completed);
    }

    #[test]
    fn test_incomplete_form_stays_open() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "No dates");
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::AddTask(_)));
        assert_eq!(app.kanban.board().task_count(), 0);
        assert!(app.status.is_none());

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_form_picks_color_and_column() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Styled");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "2024-01-01");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "2024-01-05");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        let task = &app.kanban.board().columns[1].tasks[0];
        assert_eq!(task.color, TaskColor::Green);
        assert_eq!(app.selected_column, 1);
    }

    #[test]
    fn test_progress_key_ignored_outside_todo() {
        let mut app = app();
        add_task(&mut app, "Draft spec", "2024-01-01", "2024-01-02");
        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.kanban.board().columns[1].tasks.len(), 1);

        press(&mut app, KeyCode::Char('d'));
        let done = &app.kanban.board().columns[2];
        assert_eq!(done.role, ColumnRole::Done);
        assert!(done.tasks[0].completed);

        // complete is not offered in Done
        press(&mut app, KeyCode::Right);
        let before = app.kanban.board().clone();
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.kanban.board(), &before);
    }

    #[test]
    fn test_delete_selected_task() {
        let mut app = app();
        add_task(&mut app, "One", "2024-01-01", "2024-01-02");
        add_task(&mut app, "Two", "2024-01-01", "2024-01-02");
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Char('x'));
        let todo = &app.kanban.board().columns[0];
        assert_eq!(todo.tasks.len(), 1);
        assert_eq!(todo.tasks[0].title, "Two");
        assert_eq!(app.selected_task, 0);
    }

    #[test]
    fn test_add_and_rename_column() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "Review");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.kanban.board().columns.len(), 4);
        assert_eq!(app.selected_column, 3);

        press(&mut app, KeyCode::Char('r'));
        for _ in 0.."Review".len() {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "QA");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.kanban.board().columns[3].title, "QA");
    }

    #[test]
    fn test_bad_import_raises_alert_and_keeps_board() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        std::fs::write(&path, r#"{"cols": []}"#).unwrap();

        let mut app = app();
        add_task(&mut app, "Keep me", "2024-01-01", "2024-01-02");
        let before = app.kanban.board().clone();

        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, &path.display().to_string());
        press(&mut app, KeyCode::Enter);
        assert!(matches!(&app.mode, Mode::Alert(msg) if msg.starts_with("Invalid FlowBoard file")));
        assert_eq!(app.kanban.board(), &before);
        assert!(screen(&app).contains("Invalid FlowBoard file"));

        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_export_writes_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut app = app();
        app.export_dir = temp.path().to_path_buf();
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.mode, Mode::Normal);
        assert!(temp.path().join("flowboard.csv").exists());
    }

    #[test]
    fn test_screen_shows_columns_and_overdue_card() {
        let mut app = app();
        add_task(&mut app, "Old chore", "2000-01-01", "2000-01-02");
        let text = screen(&app);
        assert!(text.contains("To Do"));
        assert!(text.contains("In Progress"));
        assert!(text.contains("Done"));
        assert!(text.contains("Old chore"));
        assert!(text.contains("DUE DATE PASSED"));
        assert!(text.contains("[p] Progress"));
    }

    #[test]
    fn test_quit() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
