//! The single key-value slot the board lives in.

use crate::error::Result;
use crate::kanban_board::Board;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key of the slot the board is stored under
pub const STORAGE_KEY: &str = "flowboard_final_locked";

/// A single slot holding the serialized board.
pub trait Storage {
    /// Returns `None` when nothing has been stored yet.
    fn read(&self) -> io::Result<Option<String>>;

    /// Replaces the slot's contents in full.
    fn write(&mut self, contents: &str) -> io::Result<()>;

    /// Moves unreadable contents aside so the next write cannot clobber them.
    fn set_aside(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Slot backed by `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where unreadable contents end up: `<key>.json.bad`
    pub fn bad_path(&self) -> PathBuf {
        self.path.with_extension("json.bad")
    }
}

impl Storage for FileStorage {
    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&mut self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // write-then-rename so a crash never leaves half a board behind
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)
    }

    fn set_aside(&mut self) -> io::Result<()> {
        let bad = self.bad_path();
        fs::rename(&self.path, &bad)?;
        warn!(path = %bad.display(), "kept unreadable board");
        Ok(())
    }
}

/// Slot held in memory; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Option<String>,
}

impl MemoryStorage {
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Some(contents.into()),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.slot.as_deref()
    }
}

impl Storage for MemoryStorage {
    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.slot.clone())
    }

    fn write(&mut self, contents: &str) -> io::Result<()> {
        self.slot = Some(contents.to_string());
        Ok(())
    }
}

/// Restores the board, falling back to the seeded board when the slot is
/// empty, unreadable or holds something that is not a board. Contents that
/// fail to parse are set aside first.
pub fn load(storage: &mut impl Storage) -> Board {
    match storage.read() {
        Ok(Some(data)) => match serde_json::from_str(&data) {
            Ok(board) => board,
            Err(err) => {
                warn!("stored board is unreadable, starting fresh: {}", err);
                if let Err(err) = storage.set_aside() {
                    warn!("failed to set unreadable board aside: {}", err);
                }
                Board::seeded()
            }
        },
        Ok(None) => {
            debug!("no stored board, seeding defaults");
            Board::seeded()
        }
        Err(err) => {
            warn!("failed to read stored board, starting fresh: {}", err);
            Board::seeded()
        }
    }
}

pub fn save(storage: &mut impl Storage, board: &Board) -> Result<()> {
    let data = serde_json::to_string(board)?;
    storage.write(&data)?;
    Ok(())
}
