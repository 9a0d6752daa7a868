//! Placeholder expansion for `--append` and `--prepend` text.
//!
//! | Placeholder        | Expands to                                        |
//! |--------------------|---------------------------------------------------|
//! | `$W`               | name of the containing directory (or archive)     |
//! | `$U`               | current user name                                 |
//! | `${date}`          | date in the default format                        |
//! | `${date:FMT}`      | date rendered with strftime `FMT`, `ms` for epoch |
//! | `${random}`        | random string of the default length               |
//! | `${random:N}`      | random string of `N` characters                   |
//! | `#`, `##`, ...     | sequence number, zero padded to the run width     |
//! | `$0`, `$1`, ...    | text removed by delete / replace, in order        |
//!
//! Expansion is a single left-to-right pass, so substituted text is never
//! expanded again.

use crate::error::InvalidArgument;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DATE_FORMAT: &str = "ms";
pub const DEFAULT_RANDOM_LENGTH: usize = 8;

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

/// Character set used by `${random}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RandomCase {
    #[default]
    Mixed,
    Lower,
    Upper,
}

impl RandomCase {
    pub fn charset(self) -> Vec<u8> {
        match self {
            Self::Mixed => [LOWER, UPPER, DIGITS].concat(),
            Self::Lower => [LOWER, DIGITS].concat(),
            Self::Upper => [UPPER, DIGITS].concat(),
        }
    }
}

/// Run-wide settings for placeholder expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderOptions {
    pub num_start: i64,
    pub num_step: i64,
    pub date_format: String,
    pub random_length: usize,
    pub random_case: RandomCase,
}

impl Default for PlaceholderOptions {
    fn default() -> Self {
        Self {
            num_start: 1,
            num_step: 1,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            random_length: DEFAULT_RANDOM_LENGTH,
            random_case: RandomCase::Mixed,
        }
    }
}

impl PlaceholderOptions {
    /// Number for the item at 1-based `index`
    pub fn sequence_number(&self, index: usize) -> i64 {
        let offset = i64::try_from(index.saturating_sub(1)).unwrap_or(i64::MAX);
        self.num_start
            .saturating_add(offset.saturating_mul(self.num_step))
    }
}

/// Per-item values
#[derive(Debug, Clone)]
pub struct ExpansionContext<'a> {
    /// 1-based position of the item in the run
    pub index: usize,
    pub directory_name: &'a str,
    pub user: &'a str,
    pub captures: &'a [String],
    pub now: DateTime<Local>,
}

pub fn expand(
    template: &str,
    options: &PlaceholderOptions,
    ctx: &ExpansionContext<'_>,
) -> Result<String, InvalidArgument> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(c) = rest.chars().next() {
        if c == '#' {
            let width = rest.len() - rest.trim_start_matches('#').len();
            out.push_str(&pad_number(options.sequence_number(ctx.index), width));
            rest = &rest[width..];
            continue;
        }

        if c != '$' {
            out.push(c);
            rest = &rest[c.len_utf8()..];
            continue;
        }

        let after = &rest[1..];
        if let Some(tail) = after.strip_prefix('W') {
            out.push_str(ctx.directory_name);
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('U') {
            out.push_str(ctx.user);
            rest = tail;
        } else if let Some((expanded, consumed)) = expand_braced(after, options, ctx)? {
            out.push_str(&expanded);
            rest = &after[consumed..];
        } else if let Some((capture, consumed)) = capture_ref(after, ctx.captures) {
            out.push_str(capture);
            rest = &after[consumed..];
        } else {
            out.push('$');
            rest = after;
        }
    }

    Ok(out)
}

/// `${date...}` or `${random...}` at the start of `s`; returns the expansion
/// and how many bytes of `s` it used.
fn expand_braced(
    s: &str,
    options: &PlaceholderOptions,
    ctx: &ExpansionContext<'_>,
) -> Result<Option<(String, usize)>, InvalidArgument> {
    let Some(body) = s.strip_prefix('{') else {
        return Ok(None);
    };
    let Some(close) = body.find('}') else {
        return Ok(None);
    };
    let inner = &body[..close];
    let consumed = close + 2;

    let (name, arg) = match inner.split_once(':') {
        Some((name, arg)) => (name, Some(arg)),
        None => (inner, None),
    };

    match (name, arg) {
        ("date", None) => Ok(Some((format_date(&options.date_format, ctx.now)?, consumed))),
        ("date", Some(fmt)) if !fmt.is_empty() => Ok(Some((format_date(fmt, ctx.now)?, consumed))),
        ("random", None) => Ok(Some((
            random_string(options.random_length, options.random_case)?,
            consumed,
        ))),
        ("random", Some(len)) if !len.is_empty() && len.bytes().all(|b| b.is_ascii_digit()) => {
            let len = len.parse().map_err(|_| InvalidArgument::RandomLength)?;
            Ok(Some((random_string(len, options.random_case)?, consumed)))
        },
        _ => Ok(None),
    }
}

/// `$N` where N indexes into the captures. Unknown indexes are left alone.
fn capture_ref<'c>(s: &str, captures: &'c [String]) -> Option<(&'c str, usize)> {
    let digits = s.len() - s.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let index: usize = s[..digits].parse().ok()?;
    captures.get(index).map(|c| (c.as_str(), digits))
}

fn pad_number(value: i64, width: usize) -> String {
    if value < 0 {
        format!("-{:0>width$}", value.unsigned_abs(), width = width.saturating_sub(1))
    } else {
        format!("{value:0>width$}")
    }
}

/// Render `now` with a strftime format; `ms` yields epoch milliseconds
pub fn format_date(format: &str, now: DateTime<Local>) -> Result<String, InvalidArgument> {
    if format == DEFAULT_DATE_FORMAT {
        return Ok(now.timestamp_millis().to_string());
    }

    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(InvalidArgument::DateFormat(format.to_string()));
    }
    Ok(now.format_with_items(items.into_iter()).to_string())
}

pub fn random_string(len: usize, case: RandomCase) -> Result<String, InvalidArgument> {
    if len == 0 {
        return Err(InvalidArgument::RandomLength);
    }
    let charset = case.charset();
    let mut rng = rand::thread_rng();
    Ok((0..len)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect())
}

/// Name of the user running the process
pub fn current_user() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 8, 15, 22, 10, 15).unwrap()
    }

    fn ctx<'a>(index: usize, captures: &'a [String]) -> ExpansionContext<'a> {
        ExpansionContext {
            index,
            directory_name: "Photos",
            user: "alice",
            captures,
            now: fixed_now(),
        }
    }

    fn run(template: &str, options: &PlaceholderOptions, index: usize) -> String {
        expand(template, options, &ctx(index, &[])).unwrap()
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        let options = PlaceholderOptions::default();
        assert_eq!(run("_old", &options, 1), "_old");
        assert_eq!(run("", &options, 1), "");
        assert_eq!(run("naïve $", &options, 1), "naïve $");
    }

    #[test]
    fn test_directory_and_user() {
        let options = PlaceholderOptions::default();
        assert_eq!(run("$W-$U_", &options, 1), "Photos-alice_");
    }

    #[test]
    fn test_numbering() {
        let options = PlaceholderOptions::default();
        assert_eq!(run("_####", &options, 1), "_0001");
        assert_eq!(run("_####", &options, 12), "_0012");
        assert_eq!(run("#", &options, 123), "123");
    }

    #[test]
    fn test_numbering_with_start_and_step() {
        let options = PlaceholderOptions {
            num_start: 1,
            num_step: 2,
            ..Default::default()
        };
        assert_eq!(run("_##", &options, 1), "_01");
        assert_eq!(run("_##", &options, 2), "_03");
        assert_eq!(run("_##", &options, 3), "_05");
    }

    #[test]
    fn test_each_hash_run_is_numbered() {
        let options = PlaceholderOptions::default();
        assert_eq!(run("#-###", &options, 4), "4-004");
    }

    #[test]
    fn test_negative_numbers_keep_width() {
        let options = PlaceholderOptions {
            num_start: -3,
            num_step: 1,
            ..Default::default()
        };
        assert_eq!(run("###", &options, 1), "-03");
    }

    #[test]
    fn test_date_default_is_epoch_millis() {
        let options = PlaceholderOptions::default();
        let expected = fixed_now().timestamp_millis().to_string();
        assert_eq!(run("${date}_", &options, 1), format!("{expected}_"));
    }

    #[test]
    fn test_date_with_format() {
        let options = PlaceholderOptions::default();
        assert_eq!(run("${date:%Y%m%d}_", &options, 1), "20240815_");

        let options = PlaceholderOptions {
            date_format: "%Y-%m".to_string(),
            ..Default::default()
        };
        assert_eq!(run("${date}", &options, 1), "2024-08");
    }

    #[test]
    fn test_invalid_date_format() {
        let options = PlaceholderOptions::default();
        let err = expand("${date:%Q}", &options, &ctx(1, &[])).unwrap_err();
        assert_eq!(err, InvalidArgument::DateFormat("%Q".to_string()));
    }

    #[test]
    fn test_random_lengths_and_charsets() {
        let options = PlaceholderOptions {
            random_length: 5,
            random_case: RandomCase::Lower,
            ..Default::default()
        };
        let out = run("${random}", &options, 1);
        assert_eq!(out.len(), 5);
        assert!(out
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));

        let out = run("x${random:12}", &options, 1);
        assert_eq!(out.len(), 13);
    }

    #[test]
    fn test_random_zero_length_fails() {
        let options = PlaceholderOptions::default();
        let err = expand("${random:0}", &options, &ctx(1, &[])).unwrap_err();
        assert_eq!(err, InvalidArgument::RandomLength);
    }

    #[test]
    fn test_unknown_braces_are_literal() {
        let options = PlaceholderOptions::default();
        assert_eq!(run("${random:abc}", &options, 1), "${random:abc}");
        assert_eq!(run("${other}", &options, 1), "${other}");
        assert_eq!(run("${date", &options, 1), "${date");
    }

    #[test]
    fn test_captures() {
        let options = PlaceholderOptions::default();
        let captures = vec!["draft".to_string(), "IMG_".to_string()];
        let out = expand("_$1$0_$2", &options, &ctx(1, &captures)).unwrap();
        assert_eq!(out, "_IMG_draft_$2");
    }

    #[test]
    fn test_substituted_text_is_not_reexpanded() {
        let options = PlaceholderOptions::default();
        let captures = vec!["##".to_string()];
        let out = expand("$0#", &options, &ctx(7, &captures)).unwrap();
        assert_eq!(out, "##7");
    }

    #[test]
    fn test_charsets() {
        assert_eq!(RandomCase::Mixed.charset().len(), 62);
        assert_eq!(RandomCase::Lower.charset().len(), 36);
        assert_eq!(RandomCase::Upper.charset().len(), 36);
    }

    proptest! {
        #[test]
        fn prop_sequence_number_is_linear(start in -1000i64..1000, step in -50i64..50, index in 1usize..500) {
            let options = PlaceholderOptions { num_start: start, num_step: step, ..Default::default() };
            let expected = start + (index as i64 - 1) * step;
            prop_assert_eq!(options.sequence_number(index), expected);
        }

        #[test]
        fn prop_padding_never_truncates(value in 0i64..1_000_000, width in 1usize..10) {
            let padded = pad_number(value, width);
            prop_assert!(padded.len() >= width);
            prop_assert_eq!(padded.parse::<i64>().unwrap(), value);
        }
    }
}
