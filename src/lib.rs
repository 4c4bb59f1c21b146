//! FlowBoard: a single-user task board with local persistence, export and import.

pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod kanban_board;
pub mod pdf;
pub mod render;
pub mod storage;
pub mod task;
pub mod ui;

pub use error::{BoardError, ImportError, Result};
pub use kanban_board::{Board, Column, ColumnRole, KanbanBoard};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use task::{NewTask, Task, TaskColor};
