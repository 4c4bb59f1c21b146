use crate::error::ImportError;
use crate::kanban_board::Board;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Extension an import file must carry
pub const IMPORT_EXTENSION: &str = "json";

pub fn read_import(path: &Path) -> Result<Board, ImportError> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(IMPORT_EXTENSION) {
        warn!(path = %path.display(), "rejected import with wrong extension");
        return Err(ImportError::UnsupportedExtension {
            path: path.to_path_buf(),
        });
    }
    let raw = fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let board = parse_import(&raw).inspect_err(|err| warn!(path = %path.display(), "{}", err))?;
    info!(path = %path.display(), columns = board.columns.len(), "parsed import");
    Ok(board)
}

/// Only the top-level shape is checked up front: `columns` has to be an array.
pub fn parse_import(raw: &str) -> Result<Board, ImportError> {
    let value: Value = serde_json::from_str(raw).map_err(ImportError::Malformed)?;
    if !value.get("columns").is_some_and(Value::is_array) {
        return Err(ImportError::MissingColumns);
    }
    serde_json::from_value(value).map_err(ImportError::InvalidShape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kanban_board::ColumnRole;
    use crate::task::TaskColor;
    use std::fs;
    use tempfile::TempDir;

    const LEGACY: &str = r##"{
        "columns": [
            {"id": "c1", "title": "To Do", "tasks": [
                {"id": "t1", "title": "Draft spec", "color": "#065f46",
                 "created": "1/1/2024, 9:00:00 AM", "start": "2024-01-01",
                 "due": "2024-01-02", "completed": false}
            ]},
            {"id": "c2", "title": "In Progress", "tasks": []},
            {"id": "c3", "title": "Done", "tasks": []}
        ]
    }"##;

    #[test]
    fn test_parse_legacy_board() {
        let board = parse_import(LEGACY).unwrap();
        assert_eq!(board.columns.len(), 3);
        assert_eq!(board.columns[0].role, ColumnRole::Todo);
        assert_eq!(board.columns[0].tasks[0].title, "Draft spec");
    }

    #[test]
    fn test_rejects_non_json() {
        assert!(matches!(parse_import("hello"), Err(ImportError::Malformed(_))));
    }

    #[test]
    fn test_rejects_missing_or_non_array_columns() {
        assert!(matches!(parse_import("{}"), Err(ImportError::MissingColumns)));
        assert!(matches!(
            parse_import(r#"{"columns": {}}"#),
            Err(ImportError::MissingColumns)
        ));
        assert!(matches!(parse_import("[]"), Err(ImportError::MissingColumns)));
    }

    #[test]
    fn test_rejects_columns_with_wrong_shape() {
        assert!(matches!(
            parse_import(r#"{"columns": [{"title": "no id"}]}"#),
            Err(ImportError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_unknown_color_is_imported_with_default() {
        let board = parse_import(
            r##"{"columns": [{"id": "c1", "title": "To Do", "tasks": [
                {"id": "t1", "title": "Paint", "color": "#ffffff",
                 "start": "2024-01-01", "due": "2024-01-02"}
            ]}]}"##,
        )
        .unwrap();
        assert_eq!(board.columns[0].tasks[0].color, TaskColor::Blue);
    }

    #[test]
    fn test_task_without_start_or_due_is_imported() {
        let board = parse_import(
            r#"{"columns": [{"id": "c1", "title": "Done", "tasks": [
                {"id": "t1", "title": "Undated"}
            ]}]}"#,
        )
        .unwrap();
        let task = &board.columns[0].tasks[0];
        assert_eq!(task.title, "Undated");
        assert_eq!(task.start, "");
        assert_eq!(task.due, "");
    }

    #[test]
    fn test_empty_columns_array_is_accepted() {
        assert!(parse_import(r#"{"columns": []}"#).unwrap().columns.is_empty());
    }

    #[test]
    fn test_read_import_checks_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("board.txt");
        fs::write(&path, LEGACY).unwrap();
        assert!(matches!(
            read_import(&path),
            Err(ImportError::UnsupportedExtension { .. })
        ));

        let path = temp.path().join("board.json");
        fs::write(&path, LEGACY).unwrap();
        assert_eq!(read_import(&path).unwrap().columns.len(), 3);
    }

    #[test]
    fn test_read_import_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            read_import(&temp.path().join("gone.json")),
            Err(ImportError::Read { .. })
        ));
    }

    #[test]
    fn test_error_message_is_user_facing() {
        let err = parse_import("{}").unwrap_err();
        assert!(err.to_string().starts_with("Invalid FlowBoard file"));
    }
}
