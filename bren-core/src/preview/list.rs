use super::table::display_path;
use crate::output::RenameResult;
use nu_ansi_term::{Color as AnsiColor, Style};
use std::fmt::Write;
use std::path::Path;

/// One `old -> new` line per rename, with the changed part of the name highlighted
pub fn render_list(result: &RenameResult, use_color: bool) -> String {
    let mut output = String::new();

    for rename in &result.planned {
        let from = display_path(&rename.from);
        let to_name = file_name(&rename.to);

        if use_color {
            let from_name = file_name(&rename.from);
            let (prefix, removed, added, suffix) = split_change(&from_name, &to_name);
            writeln!(
                output,
                "{} → {}{}{}  {}",
                AnsiColor::Green.paint(&from),
                prefix,
                AnsiColor::Black.on(AnsiColor::Yellow).paint(added),
                suffix,
                if removed.is_empty() {
                    String::new()
                } else {
                    AnsiColor::Red.strikethrough().paint(removed).to_string()
                },
            )
            .unwrap();
        } else {
            writeln!(output, "{from} → {to_name}").unwrap();
        }
    }

    let summary = format!("{} items would be renamed", result.planned.len());
    if use_color {
        writeln!(output, "{}", Style::new().bold().paint(summary)).unwrap();
    } else {
        writeln!(output, "{summary}").unwrap();
    }

    output
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Split two names into (shared prefix, removed middle, added middle, shared suffix)
pub(crate) fn split_change<'a>(old: &'a str, new: &'a str) -> (&'a str, &'a str, &'a str, &'a str) {
    let prefix = old
        .char_indices()
        .zip(new.chars())
        .take_while(|((_, a), b)| a == b)
        .last()
        .map_or(0, |((i, c), _)| i + c.len_utf8());

    let old_rest = &old[prefix..];
    let new_rest = &new[prefix..];
    let suffix = old_rest
        .chars()
        .rev()
        .zip(new_rest.chars().rev())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a.len_utf8())
        .sum::<usize>();

    (
        &old[..prefix],
        &old_rest[..old_rest.len() - suffix],
        &new_rest[..new_rest.len() - suffix],
        &new_rest[new_rest.len() - suffix..],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::PlannedRename;
    use crate::scanner::EntryKind;
    use std::path::PathBuf;

    #[test]
    fn test_split_change_append() {
        assert_eq!(
            split_change("report.txt", "report_old.txt"),
            ("report", "", "_old", ".txt")
        );
    }

    #[test]
    fn test_split_change_replace() {
        assert_eq!(
            split_change("IMG_001.jpg", "Photo_001.jpg"),
            ("", "IMG", "Photo", "_001.jpg")
        );
    }

    #[test]
    fn test_split_change_identical_and_unicode() {
        assert_eq!(split_change("same", "same"), ("same", "", "", ""));
        assert_eq!(split_change("été.md", "étéx.md"), ("été", "", "x", ".md"));
    }

    #[test]
    fn test_plain_list() {
        let result = RenameResult {
            planned: vec![PlannedRename {
                from: PathBuf::from("/data/a.txt"),
                to: PathBuf::from("/data/a_old.txt"),
                kind: EntryKind::File,
            }],
            ..Default::default()
        };
        let rendered = render_list(&result, false);
        assert_eq!(
            rendered,
            "/data/a.txt → a_old.txt\n1 items would be renamed\n"
        );
    }
}
