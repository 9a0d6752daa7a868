use crate::attributes::AttributeChange;
use crate::error::InvalidArgument;
use crate::placeholder::{expand, ExpansionContext, PlaceholderOptions};
use chrono::{DateTime, Local};
use regex::Regex;

/// The name edits requested for a run.
///
/// Edits always run in the order delete, replace, append, prepend; the
/// attribute change is applied to the item after it has been renamed.
#[derive(Debug, Clone, Default)]
pub struct RenameActions {
    pub delete: Option<Regex>,
    pub replace: Option<(String, String)>,
    pub append: Option<String>,
    pub prepend: Option<String>,
    pub attr: Option<AttributeChange>,
}

/// Values that vary per item
#[derive(Debug, Clone)]
pub struct ItemContext<'a> {
    pub index: usize,
    pub directory_name: &'a str,
    pub user: &'a str,
    pub now: DateTime<Local>,
}

impl RenameActions {
    pub fn new(
        delete: Option<&str>,
        replace: Option<(String, String)>,
        append: Option<String>,
        prepend: Option<String>,
        attr: Option<&str>,
    ) -> Result<Self, InvalidArgument> {
        let delete = delete
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| InvalidArgument::Regex {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()?;
        let attr = attr.map(AttributeChange::parse).transpose()?;

        let actions = Self {
            delete,
            replace,
            append,
            prepend,
            attr,
        };
        if actions.is_empty() {
            return Err(InvalidArgument::NoAction);
        }
        Ok(actions)
    }

    pub fn is_empty(&self) -> bool {
        self.delete.is_none()
            && self.replace.is_none()
            && self.append.is_none()
            && self.prepend.is_none()
            && self.attr.is_none()
    }

    /// Compute the new name for `name`
    pub fn transform(
        &self,
        name: &str,
        options: &PlaceholderOptions,
        item: &ItemContext<'_>,
    ) -> Result<String, InvalidArgument> {
        let mut new_name = name.to_string();
        let mut captures = Vec::new();

        if let Some(regex) = &self.delete {
            let (result, removed) = delete_matches(&new_name, regex);
            new_name = result;
            captures.push(removed);
        }

        if let Some((old, new)) = &self.replace {
            let (result, replaced) = replace_literal(&new_name, old, new);
            new_name = result;
            captures.push(replaced);
        }

        let ctx = ExpansionContext {
            index: item.index,
            directory_name: item.directory_name,
            user: item.user,
            captures: &captures,
            now: item.now,
        };

        if let Some(suffix) = &self.append {
            let suffix = expand(suffix, options, &ctx)?;
            let (stem, ext) = split_extension(&new_name);
            new_name = format!("{stem}{suffix}{ext}");
        }

        if let Some(prefix) = &self.prepend {
            let prefix = expand(prefix, options, &ctx)?;
            new_name = format!("{prefix}{new_name}");
        }

        if let Some(attr) = &self.attr {
            new_name = attr.visible_name(&new_name);
        }

        Ok(new_name)
    }
}

/// Remove every match of `regex`; also returns the removed text
pub fn delete_matches(name: &str, regex: &Regex) -> (String, String) {
    let removed: String = regex.find_iter(name).map(|m| m.as_str()).collect();
    (regex.replace_all(name, "").into_owned(), removed)
}

/// Replace every literal occurrence of `old`; also returns the replaced text
pub fn replace_literal(name: &str, old: &str, new: &str) -> (String, String) {
    if old.is_empty() {
        return (name.replace(old, new), String::new());
    }
    let replaced = old.repeat(name.matches(old).count());
    (name.replace(old, new), replaced)
}

/// Split at the last dot, ignoring leading dots: `a.tar.gz` gives
/// (`a.tar`, `.gz`), `.bashrc` gives (`.bashrc`, ``).
pub fn split_extension(name: &str) -> (&str, &str) {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(pos) => name.split_at(leading + pos),
        None => (name, ""),
    }
}
