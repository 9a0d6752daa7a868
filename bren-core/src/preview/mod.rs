mod list;
mod table;

pub use list::render_list;
pub use table::render_table;

use crate::output::RenameResult;
use std::io::{self, IsTerminal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preview {
    Table,
    List,
}

impl std::str::FromStr for Preview {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "list" => Ok(Self::List),
            _ => Err(format!("Invalid preview format: {}", s)),
        }
    }
}

/// Determine whether to use colors based on explicit preference or terminal detection
pub fn should_use_color_with_detector<F>(use_color: Option<bool>, is_terminal: F) -> bool
where
    F: Fn() -> bool,
{
    match use_color {
        Some(explicit_color) => explicit_color,
        None => is_terminal(),
    }
}

pub fn should_use_color(use_color: Option<bool>) -> bool {
    should_use_color_with_detector(use_color, || io::stdout().is_terminal())
}

/// Render the planned renames of a preview run
pub fn render_preview(result: &RenameResult, format: Preview, use_color: bool) -> String {
    if result.planned.is_empty() {
        return "No matching items\n".to_string();
    }
    match format {
        Preview::Table => render_table(result, use_color),
        Preview::List => render_list(result, use_color),
    }
}
