use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{value_parser, Arg, ArgMatches, Command};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use flowboard::config::{Config, CONFIG_FILE};
use flowboard::export::{self, ExportFormat};
use flowboard::render::{self, TaskAction, TaskCard};
use flowboard::task::{NewTask, TaskColor};
use flowboard::ui::{self, App};
use flowboard::{FileStorage, KanbanBoard};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("flowboard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Terminal task board with local persistence, export and import")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default: ./flowboard_config.json)"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding the board and log file"),
        )
        .subcommand(Command::new("tui").about("Open the interactive board (default)"))
        .subcommand(Command::new("init").about("Write a default config file at the --config path"))
        .subcommand(Command::new("show").about("Print the board with ids"))
        .subcommand(
            Command::new("add-column")
                .about("Add a column")
                .arg(Arg::new("title").required(true).help("Column title")),
        )
        .subcommand(
            Command::new("rename-column")
                .about("Rename a column; its behaviour does not change")
                .arg(Arg::new("column").required(true).help("Column id or title"))
                .arg(Arg::new("title").required(true).help("New title")),
        )
        .subcommand(
            Command::new("add-task")
                .about("Add a task to a column")
                .arg(Arg::new("column").required(true).help("Column id or title"))
                .arg(Arg::new("title").required(true).help("Task title"))
                .arg(Arg::new("start").long("start").required(true).help("Start date (YYYY-MM-DD)"))
                .arg(Arg::new("due").long("due").required(true).help("Due date (YYYY-MM-DD)"))
                .arg(
                    Arg::new("color")
                        .long("color")
                        .value_parser(value_parser!(TaskColor))
                        .help("blue, green, amber, red, violet or slate"),
                ),
        )
        .subcommand(
            Command::new("progress")
                .about("Move a task to the in-progress column")
                .arg(Arg::new("task").required(true).help("Task id")),
        )
        .subcommand(
            Command::new("complete")
                .about("Move a task to the done column and mark it completed")
                .arg(Arg::new("task").required(true).help("Task id")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a task")
                .arg(Arg::new("column").required(true).help("Column id or title"))
                .arg(Arg::new("task").required(true).help("Task id")),
        )
        .subcommand(
            Command::new("export")
                .about("Export the board")
                .arg(
                    Arg::new("format")
                        .required(true)
                        .value_parser(value_parser!(ExportFormat))
                        .help("json, txt, csv or pdf"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf))
                        .help("Output directory (default: export_dir from config)"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Replace the board with a .json export")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(dir) = matches.get_one::<PathBuf>("data-dir") {
        config.data_dir = dir.clone();
    }
    init_logging(&config)?;

    match matches.subcommand() {
        None | Some(("tui", _)) => run_tui(&config)?,
        Some(("init", _)) => {
            if Config::init(&config_path)? {
                println!("Wrote {}", config_path.display());
            } else {
                println!("{} already exists", config_path.display());
            }
        }
        Some(("show", _)) => show(&open_board(&config)?),
        Some(("add-column", sub)) => {
            let mut kanban = open_board(&config)?;
            let id = kanban.add_column(arg(sub, "title")?)?;
            println!("Added column {}", id);
        }
        Some(("rename-column", sub)) => {
            let mut kanban = open_board(&config)?;
            let column_id = column_id(&kanban, arg(sub, "column")?)?;
            kanban.rename_column(&column_id, arg(sub, "title")?)?;
            println!("Renamed column {}", column_id);
        }
        Some(("add-task", sub)) => {
            let mut kanban = open_board(&config)?;
            let column_id = column_id(&kanban, arg(sub, "column")?)?;
            let mut draft = NewTask::new(
                column_id,
                arg(sub, "title")?,
                arg(sub, "start")?,
                arg(sub, "due")?,
            );
            if let Some(color) = sub.get_one::<TaskColor>("color") {
                draft = draft.with_color(*color);
            }
            let id = kanban.add_task(draft)?;
            println!("Added task {}", id);
        }
        Some(("progress", sub)) => {
            let mut kanban = open_board(&config)?;
            let task_id = arg(sub, "task")?;
            ensure_offered(&kanban, task_id, TaskAction::SendToProgress)?;
            kanban.send_to_progress(task_id)?;
            println!("Task is in progress");
        }
        Some(("complete", sub)) => {
            let mut kanban = open_board(&config)?;
            let task_id = arg(sub, "task")?;
            ensure_offered(&kanban, task_id, TaskAction::Complete)?;
            kanban.complete_task(task_id)?;
            println!("Task completed");
        }
        Some(("delete", sub)) => {
            let mut kanban = open_board(&config)?;
            let column_id = column_id(&kanban, arg(sub, "column")?)?;
            kanban.delete_task(&column_id, arg(sub, "task")?)?;
            println!("Task deleted");
        }
        Some(("export", sub)) => {
            let kanban = open_board(&config)?;
            let format = *sub
                .get_one::<ExportFormat>("format")
                .context("Missing export format")?;
            let dir = sub
                .get_one::<PathBuf>("out")
                .cloned()
                .unwrap_or_else(|| config.export_dir.clone());
            let path = export::write_export(kanban.board(), format, &dir)
                .with_context(|| format!("Failed to export {}", format))?;
            println!("Wrote {} ({})", path.display(), format.mime_type());
        }
        Some(("import", sub)) => {
            let mut kanban = open_board(&config)?;
            let file = sub.get_one::<PathBuf>("file").context("Missing import file")?;
            kanban.import_file(file)?;
            println!("Imported {}", file.display());
        }
        Some((other, _)) => bail!("Unknown command '{}'. Use --help for available commands.", other),
    }
    Ok(())
}

fn arg<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("Missing argument <{}>", name))
}

/// Logs go to a file in the data dir; the terminal belongs to the board.
fn init_logging(config: &Config) -> Result<()> {
    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create {}", config.data_dir.display()))?;
    let log_path = config.log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Column by id, falling back to a case-insensitive title match.
fn column_id(kanban: &KanbanBoard<FileStorage>, key: &str) -> Result<String> {
    kanban
        .board()
        .resolve_column(key)
        .map(|c| c.id.clone())
        .with_context(|| format!("No column matching '{}'", key))
}

/// The CLI offers the same controls the board shows on the task's card.
fn ensure_offered(kanban: &KanbanBoard<FileStorage>, task_id: &str, action: TaskAction) -> Result<()> {
    if let Some(actions) = render::offered_actions(kanban.board(), task_id) {
        if !actions.contains(&action) {
            bail!("'{}' is not offered for task {} in its current column", action.label(), task_id);
        }
    }
    Ok(())
}

fn open_board(config: &Config) -> Result<KanbanBoard<FileStorage>> {
    let storage = config.storage();
    let path = storage.path().to_path_buf();
    KanbanBoard::open(storage).with_context(|| format!("Failed to open board at {}", path.display()))
}

fn show(kanban: &KanbanBoard<FileStorage>) {
    let view = render::project(kanban.board(), Utc::now());
    for column in &view.columns {
        println!("{} [{}]", column.title, column.id);
        for card in &column.cards {
            println!("  {}", describe(card));
        }
    }
}

fn describe(card: &TaskCard) -> String {
    let mut line = format!(
        "- [{}] {} ({}) start {} due {}",
        card.id, card.title, card.color, card.start, card.due
    );
    if card.completed {
        line.push_str(" done");
    }
    if card.overdue {
        line.push_str(" DUE DATE PASSED");
    }
    line
}

fn run_tui(config: &Config) -> Result<()> {
    let kanban = open_board(config)?;
    let mut app = App::new(kanban, config.export_dir.clone());

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!("terminal loop failed: {}", err);
        eprintln!("{:?}", err);
    }
    Ok(())
}
