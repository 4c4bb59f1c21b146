//! Stateless projection of a board into what the screen shows.
//!
//! The view is rebuilt from scratch for every frame; nothing here is cached
//! between draws.

use crate::kanban_board::{Board, ColumnRole};
use crate::task::{Task, TaskColor};
use chrono::{DateTime, Utc};

/// Controls a card offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    SendToProgress,
    Complete,
    Delete,
}

impl TaskAction {
    pub fn label(self) -> &'static str {
        match self {
            TaskAction::SendToProgress => "Progress",
            TaskAction::Complete => "Done",
            TaskAction::Delete => "Delete",
        }
    }

    pub fn key(self) -> char {
        match self {
            TaskAction::SendToProgress => 'p',
            TaskAction::Complete => 'd',
            TaskAction::Delete => 'x',
        }
    }
}

/// Which controls a card gets depends only on the role of its column.
pub fn actions_for(role: ColumnRole) -> Vec<TaskAction> {
    let mut actions = Vec::with_capacity(3);
    if role == ColumnRole::Todo {
        actions.push(TaskAction::SendToProgress);
    }
    if role != ColumnRole::Done {
        actions.push(TaskAction::Complete);
    }
    actions.push(TaskAction::Delete);
    actions
}

/// Actions offered on a task where it currently sits, or `None` when no
/// column holds it.
pub fn offered_actions(board: &Board, task_id: &str) -> Option<Vec<TaskAction>> {
    board
        .find_task(task_id)
        .map(|(column, _)| actions_for(column.role))
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskCard {
    pub id: String,
    pub title: String,
    pub color: TaskColor,
    pub created: String,
    pub start: String,
    pub due: String,
    pub completed: bool,
    pub overdue: bool,
    pub actions: Vec<TaskAction>,
}

impl TaskCard {
    pub fn offers(&self, action: TaskAction) -> bool {
        self.actions.contains(&action)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnView {
    pub id: String,
    pub title: String,
    pub role: ColumnRole,
    pub cards: Vec<TaskCard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardView {
    pub columns: Vec<ColumnView>,
}

pub fn project(board: &Board, now: DateTime<Utc>) -> BoardView {
    let columns = board
        .columns
        .iter()
        .map(|column| {
            let actions = actions_for(column.role);
            ColumnView {
                id: column.id.clone(),
                title: column.title.clone(),
                role: column.role,
                cards: column
                    .tasks
                    .iter()
                    .map(|task| card(task, now, &actions))
                    .collect(),
            }
        })
        .collect();
    BoardView { columns }
}

fn card(task: &Task, now: DateTime<Utc>, actions: &[TaskAction]) -> TaskCard {
    TaskCard {
        id: task.id.clone(),
        title: task.title.clone(),
        color: task.color,
        created: task.created.clone(),
        start: task.start.clone(),
        due: task.due.clone(),
        completed: task.completed,
        overdue: task.is_overdue(now),
        actions: actions.to_vec(),
    }
}
