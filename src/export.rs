use crate::error::Result;
use crate::kanban_board::Board;
use crate::pdf::{PdfPages, PAGE_HEIGHT_MM};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

const FILE_STEM: &str = "flowboard";
const PDF_TOP_MM: f32 = 10.0;
const PDF_BOTTOM_MARGIN_MM: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
    Csv,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Json,
        ExportFormat::Text,
        ExportFormat::Csv,
        ExportFormat::Pdf,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.{}", FILE_STEM, self.extension())
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Text => "text/plain",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown export format '{}', expected json, txt, csv or pdf", s))
    }
}

pub fn export(board: &Board, format: ExportFormat) -> Result<Vec<u8>> {
    Ok(match format {
        ExportFormat::Json => to_json(board)?.into_bytes(),
        ExportFormat::Text => to_text(board).into_bytes(),
        ExportFormat::Csv => to_csv(board)?.into_bytes(),
        ExportFormat::Pdf => to_pdf(board).to_bytes()?,
    })
}

/// Writes `flowboard.<ext>` into `dir` and returns where it landed.
pub fn write_export(board: &Board, format: ExportFormat, dir: &Path) -> Result<PathBuf> {
    let data = export(board, format)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(format.file_name());
    fs::write(&path, &data)?;
    info!(path = %path.display(), bytes = data.len(), %format, "exported board");
    Ok(path)
}

/// Same shape as the stored board, pretty-printed.
pub fn to_json(board: &Board) -> Result<String> {
    Ok(serde_json::to_string_pretty(board)?)
}

/// Column titles, each followed by a bullet per task title.
pub fn to_text(board: &Board) -> String {
    let mut out = String::new();
    for column in &board.columns {
        out.push('\n');
        out.push_str(&column.title);
        out.push('\n');
        for task in &column.tasks {
            out.push_str("- ");
            out.push_str(&task.title);
            out.push('\n');
        }
    }
    out
}

/// One quoted row per task: column, task, start, due.
pub fn to_csv(board: &Board) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());
    for column in &board.columns {
        for task in &column.tasks {
            writer.write_record([&column.title, &task.title, &task.start, &task.due])?;
        }
    }
    let rows = writer.into_inner().map_err(|err| err.into_error())?;

    let mut out = String::from("Column,Task,Start,Due\n");
    out.push_str(&String::from_utf8_lossy(&rows));
    Ok(out)
}

/// Title, then each column and its tasks top to bottom, breaking onto a new
/// page whenever the next line would run into the bottom margin.
pub fn to_pdf(board: &Board) -> PdfPages {
    let mut layout = PdfLayout {
        doc: PdfPages::new(),
        y: PDF_TOP_MM,
    };
    layout.line("FlowBoard Export", 10.0, 10.0);
    for column in &board.columns {
        layout.line(&column.title, 10.0, 6.0);
        for task in &column.tasks {
            layout.line(&format!("- {}", task.title), 12.0, 5.0);
        }
        layout.y += 4.0;
    }
    layout.doc
}

struct PdfLayout {
    doc: PdfPages,
    y: f32,
}

impl PdfLayout {
    fn line(&mut self, text: &str, x: f32, advance: f32) {
        if self.y > PAGE_HEIGHT_MM - PDF_BOTTOM_MARGIN_MM {
            self.doc.add_page();
            self.y = PDF_TOP_MM;
        }
        self.doc.text(text, x, self.y);
        self.y += advance;
    }
}
