//! Terminal rendering for search results and explained statements.

use ll_core::{Dialect, LogEntry, SqlStatement};
use serde::Deserialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

const MESSAGE_WIDTH: usize = 80;

/// Body of `GET /api/logs`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
    pub total: u64,
    pub count: u32,
    pub current_page: u32,
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "#")]
    row: u64,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Exc")]
    exception: &'static str,
}

impl From<&LogEntry> for Row {
    fn from(entry: &LogEntry) -> Self {
        Self {
            row: entry.row_number,
            timestamp: entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            level: entry.level.clone(),
            message: truncate(&entry.message, MESSAGE_WIDTH),
            exception: if entry.exception.is_some() { "yes" } else { "" },
        }
    }
}

pub fn logs_table(response: &LogsResponse) -> String {
    let rows: Vec<Row> = response.logs.iter().map(Row::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());

    let pages = response.total.div_ceil(u64::from(response.count.max(1)));
    format!(
        "{}\npage {} of {} ({} matching entries)",
        table, response.current_page, pages, response.total
    )
}

/// Statement text followed by its bindings, labelled with the dialect's
/// placeholder. Positional `?` bindings are labelled `#n` in order.
pub fn statement(title: &str, dialect: Dialect, stmt: &SqlStatement) -> String {
    let mut out = format!("-- {}\n{}\n", title, stmt.text);
    for (i, value) in stmt.bindings.iter().enumerate() {
        let label = match dialect.placeholder(i + 1) {
            positional if positional == "?" => format!("#{}", i + 1),
            numbered => numbered,
        };
        out.push_str(&format!("--   {} = {}\n", label, value));
    }
    out
}

/// Cut `text` to at most `width` characters, single line.
fn truncate(text: &str, width: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= width && line.len() == text.len() {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
