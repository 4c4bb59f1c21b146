use crate::error::{BoardError, Result};
use crate::import;
use crate::storage::{self, Storage};
use crate::task::{display_timestamp, NewTask, Task};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Opaque unique id: millisecond timestamp plus random suffix.
pub fn new_id() -> String {
    ulid::Ulid::new().to_string().to_lowercase()
}

/// What a column does, independent of what it is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Todo,
    InProgress,
    Done,
    #[default]
    Custom,
}

impl ColumnRole {
    /// The columns every new board starts with, in board order
    pub const SYSTEM: [ColumnRole; 3] = [ColumnRole::Todo, ColumnRole::InProgress, ColumnRole::Done];

    pub fn default_title(self) -> Option<&'static str> {
        match self {
            ColumnRole::Todo => Some("To Do"),
            ColumnRole::InProgress => Some("In Progress"),
            ColumnRole::Done => Some("Done"),
            ColumnRole::Custom => None,
        }
    }

    /// Boards saved before roles existed only carry titles.
    pub fn from_legacy_title(title: &str) -> Self {
        Self::SYSTEM
            .into_iter()
            .find(|role| role.default_title() == Some(title))
            .unwrap_or(ColumnRole::Custom)
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_title().unwrap_or("custom"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredColumn")]
pub struct Column {
    pub id: String,
    pub title: String,
    pub role: ColumnRole,
    pub tasks: Vec<Task>,
}

#[derive(Deserialize)]
struct StoredColumn {
    id: String,
    title: String,
    #[serde(default)]
    role: Option<ColumnRole>,
    #[serde(default)]
    tasks: Vec<Task>,
}

impl From<StoredColumn> for Column {
    fn from(stored: StoredColumn) -> Self {
        let role = stored
            .role
            .unwrap_or_else(|| ColumnRole::from_legacy_title(&stored.title));
        Column {
            id: stored.id,
            title: stored.title,
            role,
            tasks: stored.tasks,
        }
    }
}

impl Column {
    pub fn new(title: impl Into<String>, role: ColumnRole) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            role,
            tasks: Vec::new(),
        }
    }
}

/// The root aggregate: columns in display order, each owning its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub columns: Vec<Column>,
}

impl Board {
    /// The first-run board: To Do, In Progress and Done, all empty.
    pub fn seeded() -> Self {
        let columns = ColumnRole::SYSTEM
            .into_iter()
            .filter_map(|role| role.default_title().map(|title| Column::new(title, role)))
            .collect();
        Self { columns }
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn column_with_role(&self, role: ColumnRole) -> Option<&Column> {
        self.columns.iter().find(|c| c.role == role)
    }

    /// Look a column up by id, falling back to a case-insensitive title match.
    pub fn resolve_column(&self, key: &str) -> Option<&Column> {
        self.column(key).or_else(|| {
            self.columns
                .iter()
                .find(|c| c.title.eq_ignore_ascii_case(key.trim()))
        })
    }

    pub fn find_task(&self, task_id: &str) -> Option<(&Column, &Task)> {
        self.columns.iter().find_map(|c| {
            c.tasks.iter().find(|t| t.id == task_id).map(|t| (c, t))
        })
    }

    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    pub fn add_column(&mut self, title: &str) -> Result<&Column> {
        if title.trim().is_empty() {
            return Err(BoardError::MissingField { field: "title" });
        }
        self.columns.push(Column::new(title, ColumnRole::Custom));
        Ok(&self.columns[self.columns.len() - 1])
    }

    /// Changes the display title only; the role stays put.
    pub fn rename_column(&mut self, column_id: &str, title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(BoardError::MissingField { field: "title" });
        }
        let column = self.column_mut(column_id)?;
        column.title = title.to_string();
        Ok(())
    }

    pub fn add_task(&mut self, draft: NewTask, created: String) -> Result<&Task> {
        draft.validate()?;
        let column = self.column_mut(&draft.column_id)?;
        column.tasks.push(Task {
            id: new_id(),
            title: draft.title,
            color: draft.color.unwrap_or_default(),
            created,
            start: draft.start,
            due: draft.due,
            completed: false,
        });
        Ok(&column.tasks[column.tasks.len() - 1])
    }

    /// Moves a task to the end of the first column with `target` role,
    /// optionally marking it completed. Nothing changes on error.
    pub fn move_task(&mut self, task_id: &str, target: ColumnRole, complete: bool) -> Result<()> {
        let dest = self
            .columns
            .iter()
            .position(|c| c.role == target)
            .ok_or(BoardError::RoleColumnMissing { role: target })?;

        let (source, index) = self
            .columns
            .iter()
            .enumerate()
            .find_map(|(ci, c)| c.tasks.iter().position(|t| t.id == task_id).map(|ti| (ci, ti)))
            .ok_or_else(|| BoardError::TaskNotFound {
                id: task_id.to_string(),
            })?;

        let mut task = self.columns[source].tasks.remove(index);
        if complete {
            task.completed = true;
        }
        self.columns[dest].tasks.push(task);
        Ok(())
    }

    pub fn delete_task(&mut self, column_id: &str, task_id: &str) -> Result<Task> {
        let column = self.column_mut(column_id)?;
        let index = column
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| BoardError::TaskNotFound {
                id: task_id.to_string(),
            })?;
        Ok(column.tasks.remove(index))
    }

    fn column_mut(&mut self, column_id: &str) -> Result<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.id == column_id)
            .ok_or_else(|| BoardError::ColumnNotFound {
                id: column_id.to_string(),
            })
    }
}

/// Sole owner of the live board. Every mutation runs against a copy that is
/// written to the storage slot first; the live board only changes once that
/// write has succeeded.
#[derive(Debug)]
pub struct KanbanBoard<S: Storage> {
    board: Board,
    storage: S,
}

impl<S: Storage> KanbanBoard<S> {
    /// Restores the board from `storage` (seeding it when the slot is empty
    /// or unreadable) and writes it straight back.
    pub fn open(mut storage: S) -> Result<Self> {
        let board = storage::load(&mut storage);
        storage::save(&mut storage, &board)?;
        Ok(Self { board, storage })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn add_column(&mut self, title: &str) -> Result<String> {
        let mut next = self.board.clone();
        let id = next.add_column(title)?.id.clone();
        self.commit(next)?;
        info!(column_id = %id, title, "added column");
        Ok(id)
    }

    pub fn rename_column(&mut self, column_id: &str, title: &str) -> Result<()> {
        let mut next = self.board.clone();
        next.rename_column(column_id, title)?;
        self.commit(next)?;
        info!(column_id, title, "renamed column");
        Ok(())
    }

    pub fn add_task(&mut self, draft: NewTask) -> Result<String> {
        let created = display_timestamp(Local::now());
        let mut next = self.board.clone();
        let id = next.add_task(draft, created)?.id.clone();
        self.commit(next)?;
        info!(task_id = %id, "added task");
        Ok(id)
    }

    pub fn send_to_progress(&mut self, task_id: &str) -> Result<()> {
        let mut next = self.board.clone();
        next.move_task(task_id, ColumnRole::InProgress, false)?;
        self.commit(next)?;
        info!(task_id, "task sent to progress");
        Ok(())
    }

    pub fn complete_task(&mut self, task_id: &str) -> Result<()> {
        let mut next = self.board.clone();
        next.move_task(task_id, ColumnRole::Done, true)?;
        self.commit(next)?;
        info!(task_id, "task completed");
        Ok(())
    }

    pub fn delete_task(&mut self, column_id: &str, task_id: &str) -> Result<()> {
        let mut next = self.board.clone();
        next.delete_task(column_id, task_id)?;
        self.commit(next)?;
        info!(column_id, task_id, "deleted task");
        Ok(())
    }

    /// Swaps in a whole new board, discarding the current one.
    pub fn replace(&mut self, board: Board) -> Result<()> {
        self.commit(board)?;
        info!(columns = self.board.columns.len(), "board replaced");
        Ok(())
    }

    pub fn import_file(&mut self, path: &Path) -> Result<()> {
        let board = import::read_import(path)?;
        self.replace(board)
    }

    /// Saves `next` and only then makes it the live board.
    fn commit(&mut self, next: Board) -> Result<()> {
        storage::save(&mut self.storage, &next)?;
        debug!(tasks = next.task_count(), "board saved");
        self.board = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn board_with_task() -> (Board, String) {
        let mut board = Board::seeded();
        let todo = board.columns[0].id.clone();
        let id = board
            .add_task(NewTask::new(todo, "Draft spec", "2024-01-01", "2024-01-02"), "now".into())
            .unwrap()
            .id
            .clone();
        (board, id)
    }

    #[test]
    fn test_seeded_board_has_three_system_columns() {
        let board = Board::seeded();
        let titles: Vec<_> = board.columns.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["To Do", "In Progress", "Done"]);
        let roles: Vec<_> = board.columns.iter().map(|c| c.role).collect();
        assert_eq!(roles, ColumnRole::SYSTEM);
        assert_eq!(board.task_count(), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let board = Board::seeded();
        assert_ne!(board.columns[0].id, board.columns[1].id);
        assert_ne!(board.columns[1].id, board.columns[2].id);
    }

    #[test]
    fn test_add_column_is_custom_and_allows_duplicates() {
        let mut board = Board::seeded();
        board.add_column("Review").unwrap();
        board.add_column("Review").unwrap();
        assert_eq!(board.columns.len(), 5);
        assert_eq!(board.columns[3].role, ColumnRole::Custom);
        assert!(board.columns[3].tasks.is_empty());
        assert!(matches!(
            board.add_column(""),
            Err(BoardError::MissingField { field: "title" })
        ));
    }

    #[test]
    fn test_custom_column_named_done_is_not_done() {
        let mut board = Board::seeded();
        board.add_column("Done").unwrap();
        assert_eq!(board.columns[3].role, ColumnRole::Custom);
        assert_eq!(board.column_with_role(ColumnRole::Done).unwrap().id, board.columns[2].id);
    }

    #[test]
    fn test_add_task_defaults() {
        let (board, id) = board_with_task();
        let (column, task) = board.find_task(&id).unwrap();
        assert_eq!(column.role, ColumnRole::Todo);
        assert_eq!(task.color, crate::task::TaskColor::PALETTE[0]);
        assert!(!task.completed);
        assert_eq!(task.created, "now");
    }

    #[test]
    fn test_add_task_to_unknown_column() {
        let mut board = Board::seeded();
        let err = board
            .add_task(NewTask::new("nope", "x", "2024-01-01", "2024-01-02"), String::new())
            .unwrap_err();
        assert!(matches!(err, BoardError::ColumnNotFound { .. }));
        assert_eq!(board.task_count(), 0);
    }

    #[test]
    fn test_add_task_missing_field_leaves_board() {
        let mut board = Board::seeded();
        let todo = board.columns[0].id.clone();
        let before = board.clone();
        assert!(board
            .add_task(NewTask::new(todo, "x", "", "2024-01-02"), String::new())
            .is_err());
        assert_eq!(board, before);
    }

    #[test]
    fn test_move_preserves_task_count() {
        let (mut board, id) = board_with_task();
        board.move_task(&id, ColumnRole::InProgress, false).unwrap();
        assert_eq!(board.task_count(), 1);
        board.move_task(&id, ColumnRole::Done, true).unwrap();
        assert_eq!(board.task_count(), 1);
        assert!(board.columns[0].tasks.is_empty());
        assert!(board.columns[1].tasks.is_empty());
        assert!(board.columns[2].tasks[0].completed);
    }

    #[test]
    fn test_move_appends_to_end() {
        let (mut board, first) = board_with_task();
        let todo = board.columns[0].id.clone();
        let second = board
            .add_task(NewTask::new(todo, "Second", "2024-01-01", "2024-01-02"), String::new())
            .unwrap()
            .id
            .clone();
        board.move_task(&second, ColumnRole::InProgress, false).unwrap();
        board.move_task(&first, ColumnRole::InProgress, false).unwrap();
        let ids: Vec<_> = board.columns[1].tasks.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, [second, first]);
    }

    #[test]
    fn test_move_survives_rename() {
        let (mut board, id) = board_with_task();
        let progress = board.columns[1].id.clone();
        board.rename_column(&progress, "Doing").unwrap();
        board.move_task(&id, ColumnRole::InProgress, false).unwrap();
        assert_eq!(board.columns[1].title, "Doing");
        assert_eq!(board.columns[1].tasks.len(), 1);
    }

    #[test]
    fn test_move_without_target_column_is_rejected() {
        let (mut board, id) = board_with_task();
        board.columns.retain(|c| c.role != ColumnRole::Done);
        let before = board.clone();
        let err = board.move_task(&id, ColumnRole::Done, true).unwrap_err();
        assert!(matches!(err, BoardError::RoleColumnMissing { role: ColumnRole::Done }));
        assert_eq!(board, before);
    }

    #[test]
    fn test_move_unknown_task() {
        let mut board = Board::seeded();
        assert!(matches!(
            board.move_task("ghost", ColumnRole::Done, true),
            Err(BoardError::TaskNotFound { .. })
        ));
    }

    #[test]
    fn test_delete_removes_exactly_one() {
        let (mut board, id) = board_with_task();
        let todo = board.columns[0].id.clone();
        board
            .add_task(NewTask::new(todo.clone(), "Keep", "2024-01-01", "2024-01-02"), String::new())
            .unwrap();
        let removed = board.delete_task(&todo, &id).unwrap();
        assert_eq!(removed.id, id);
        assert_eq!(board.task_count(), 1);
        assert_eq!(board.columns[0].tasks[0].title, "Keep");
    }

    #[test]
    fn test_delete_requires_matching_column() {
        let (mut board, id) = board_with_task();
        let done = board.columns[2].id.clone();
        assert!(matches!(
            board.delete_task(&done, &id),
            Err(BoardError::TaskNotFound { .. })
        ));
        assert_eq!(board.task_count(), 1);
    }

    #[test]
    fn test_legacy_columns_take_role_from_title() {
        let board: Board = serde_json::from_str(
            r#"{"columns":[
                {"id":"a","title":"To Do","tasks":[]},
                {"id":"b","title":"In Progress","tasks":[]},
                {"id":"c","title":"Done","tasks":[]},
                {"id":"d","title":"Later","tasks":[]}
            ]}"#,
        )
        .unwrap();
        let roles: Vec<_> = board.columns.iter().map(|c| c.role).collect();
        assert_eq!(
            roles,
            [ColumnRole::Todo, ColumnRole::InProgress, ColumnRole::Done, ColumnRole::Custom]
        );
    }

    #[test]
    fn test_stored_role_wins_over_title() {
        let board: Board = serde_json::from_str(
            r#"{"columns":[{"id":"a","title":"Backlog","role":"todo","tasks":[]}]}"#,
        )
        .unwrap();
        assert_eq!(board.columns[0].role, ColumnRole::Todo);
    }

    #[test]
    fn test_resolve_column() {
        let board = Board::seeded();
        let id = board.columns[1].id.clone();
        assert_eq!(board.resolve_column(&id).unwrap().title, "In Progress");
        assert_eq!(board.resolve_column("in progress").unwrap().id, id);
        assert!(board.resolve_column("nowhere").is_none());
    }

    #[test]
    fn test_kanban_board_persists_each_mutation() {
        let mut kanban = KanbanBoard::open(MemoryStorage::default()).unwrap();
        let todo = kanban.board().columns[0].id.clone();
        let id = kanban
            .add_task(NewTask::new(todo, "Draft spec", "2024-01-01", "2024-01-02"))
            .unwrap();
        kanban.send_to_progress(&id).unwrap();

        let stored: Board =
            serde_json::from_str(kanban.storage().contents().unwrap()).unwrap();
        assert_eq!(&stored, kanban.board());
        assert_eq!(stored.columns[1].tasks[0].id, id);
    }

    /// Accepts the first write, refuses every later one.
    #[derive(Debug, Default)]
    struct ReadOnlyAfterOpen {
        inner: MemoryStorage,
        writes: usize,
    }

    impl Storage for ReadOnlyAfterOpen {
        fn read(&self) -> std::io::Result<Option<String>> {
            self.inner.read()
        }

        fn write(&mut self, contents: &str) -> std::io::Result<()> {
            self.writes += 1;
            if self.writes > 1 {
                return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"));
            }
            self.inner.write(contents)
        }
    }

    #[test]
    fn test_failed_save_keeps_live_board_in_sync() {
        let mut kanban = KanbanBoard::open(ReadOnlyAfterOpen::default()).unwrap();
        let before = kanban.board().clone();
        let todo = before.columns[0].id.clone();

        assert!(matches!(kanban.add_column("Review"), Err(BoardError::Io(_))));
        assert!(kanban
            .add_task(NewTask::new(todo, "x", "2024-01-01", "2024-01-02"))
            .is_err());
        assert!(kanban.replace(Board { columns: Vec::new() }).is_err());
        assert_eq!(kanban.board(), &before);

        let stored: Board =
            serde_json::from_str(kanban.storage().inner.contents().unwrap()).unwrap();
        assert_eq!(&stored, kanban.board());
    }

    #[test]
    fn test_kanban_board_failed_mutation_does_not_write() {
        let mut kanban = KanbanBoard::open(MemoryStorage::default()).unwrap();
        let before = kanban.storage().contents().map(str::to_string);
        assert!(kanban.complete_task("ghost").is_err());
        assert!(kanban.add_column("   ").is_err());
        assert_eq!(kanban.storage().contents().map(str::to_string), before);
    }
}
