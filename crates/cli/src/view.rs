use alphabeta_api::{AnnotationIndex, Phase};
use alphabeta_core::presentation::AnnotationTree;
use clap::ValueEnum;
use nu_ansi_term::Color;
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Tree,
    Json,
}

#[derive(Tabled)]
pub struct AnnotationRow {
    #[tabled(rename = "File")]
    pub file: String,
    #[tabled(rename = "Line")]
    pub line: u32,
    #[tabled(rename = "Char")]
    pub character: u32,
    #[tabled(rename = "Phase")]
    pub phase: String,
    #[tabled(rename = "Symbol")]
    pub name: String,
}

pub fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Internal => Color::Red,
        Phase::Alpha => Color::Yellow,
        Phase::Beta => Color::Cyan,
        Phase::Deprecated => Color::DarkGray,
    }
}

pub fn rows(index: &AnnotationIndex, root: &Path) -> Vec<AnnotationRow> {
    index
        .iter()
        .flat_map(|(path, set)| {
            let file = path.strip_prefix(root).unwrap_or(path).display().to_string();
            set.annotations()
                .map(move |a| AnnotationRow {
                    file: file.clone(),
                    line: a.range.start.line + 1,
                    character: a.range.start.character + 1,
                    phase: a.phase.to_string(),
                    name: a.name.clone(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn render(index: &AnnotationIndex, root: &Path, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => {
            let rows = rows(index, root);
            if rows.is_empty() {
                return Ok("No prerelease usage found.".to_string());
            }
            Ok(Table::new(&rows).with(Style::psql()).to_string())
        }
        OutputFormat::Tree => Ok(AnnotationTree::for_index(index).to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(index),
    }
}

/// One-line summary for the watch loop.
pub fn summary(index: &AnnotationIndex, root: &Path) -> String {
    if index.total() == 0 {
        return Color::DarkGray.paint("no prerelease usage").to_string();
    }
    let mut parts = Vec::new();
    for (path, set) in index.iter().filter(|(_, set)| !set.is_empty()) {
        let file = path.strip_prefix(root).unwrap_or(path).display().to_string();
        let phases: Vec<String> = set
            .iter()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(phase, bucket)| phase_color(phase).paint(format!("{} {}", bucket.len(), phase)).to_string())
            .collect();
        parts.push(format!("{} ({})", file, phases.join(", ")));
    }
    format!("Prereleased: {}  {}", index.total(), parts.join("  "))
}
