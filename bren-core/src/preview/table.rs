use crate::output::RenameResult;
use crate::scanner::EntryKind;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use std::io::{self, IsTerminal};
use std::path::Path;

/// Render planned renames as an Old / New / Kind table
pub fn render_table(result: &RenameResult, use_color: bool) -> String {
    let mut table = Table::new();

    if io::stdout().is_terminal() {
        table.set_content_arrangement(ContentArrangement::Dynamic);
    } else {
        table.set_content_arrangement(ContentArrangement::Disabled);
    }

    // Force styling even in non-TTY environments when colors are explicitly requested
    if use_color {
        table.enforce_styling();
        table.set_header(vec![
            Cell::new("Old").fg(Color::Cyan),
            Cell::new("New").fg(Color::Cyan),
            Cell::new("Kind").fg(Color::Cyan),
        ]);
    } else {
        table.set_header(vec!["Old", "New", "Kind"]);
    }

    for rename in &result.planned {
        let from = display_path(&rename.from);
        let to = display_path(&rename.to);
        let kind = match rename.kind {
            EntryKind::File => "File",
            EntryKind::Dir => "Dir",
            EntryKind::Other => "Other",
        };

        if use_color {
            table.add_row(vec![
                Cell::new(&from),
                Cell::new(format!("→ {to}")).fg(Color::Magenta),
                Cell::new(kind).fg(Color::Blue),
            ]);
        } else {
            table.add_row(vec![from, format!("→ {to}"), kind.to_string()]);
        }
    }

    let total = format!("{} items", result.planned.len());
    if use_color {
        table.add_row(vec![
            Cell::new("TOTAL").fg(Color::Cyan),
            Cell::new(total).fg(Color::Yellow),
            Cell::new(""),
        ]);
    } else {
        table.add_row(vec!["TOTAL".to_string(), total, String::new()]);
    }

    format!("{table}\n")
}

/// Paths under the working directory are shown relative to it
pub(crate) fn display_path(path: &Path) -> String {
    match std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok())
    {
        Some(relative_path) => relative_path.display().to_string(),
        None => path.display().to_string(),
    }
}
