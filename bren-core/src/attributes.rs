use crate::error::InvalidArgument;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// A parsed `--attr` value such as `rw`, `-x` or `h`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeChange {
    pub remove: bool,
    pub read: bool,
    pub write: bool,
    pub execute: bool,
    pub hidden: bool,
}

impl AttributeChange {
    pub fn parse(spec: &str) -> Result<Self, InvalidArgument> {
        let (remove, letters) = match spec.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, spec.strip_prefix('+').unwrap_or(spec)),
        };
        if letters.is_empty() {
            return Err(InvalidArgument::Attribute(spec.to_string()));
        }

        let mut change = Self {
            remove,
            ..Self::default()
        };
        for c in letters.chars() {
            match c {
                'r' => change.read = true,
                'w' => change.write = true,
                'x' => change.execute = true,
                'h' => change.hidden = true,
                _ => return Err(InvalidArgument::Attribute(spec.to_string())),
            }
        }
        Ok(change)
    }

    /// Permission bits this change touches, for everyone
    pub fn mode_bits(&self) -> u32 {
        let mut bits = 0;
        if self.read {
            bits |= 0o444;
        }
        if self.write {
            bits |= 0o222;
        }
        if self.execute {
            bits |= 0o111;
        }
        bits
    }

    /// New permission mode starting from `current`
    pub fn apply_to_mode(&self, current: u32) -> u32 {
        if self.remove {
            current & !self.mode_bits()
        } else {
            current | self.mode_bits()
        }
    }

    /// Whether hiding is done by renaming to a dot-name on this platform
    pub fn hides_by_renaming(&self) -> bool {
        self.hidden && cfg!(not(windows))
    }

    /// Name after a dot-name hide (`h`) or unhide (`-h`)
    pub fn visible_name(&self, name: &str) -> String {
        if !self.hides_by_renaming() {
            return name.to_string();
        }
        if self.remove {
            name.trim_start_matches('.').to_string()
        } else if name.starts_with('.') {
            name.to_string()
        } else {
            format!(".{name}")
        }
    }
}

/// Apply permission and hidden-attribute changes to `path`.
///
/// On Unix, hiding is a rename and is handled by the rename pipeline, not here.
pub fn apply_attributes(path: &Path, change: &AttributeChange) -> Result<()> {
    if change.mode_bits() != 0 {
        set_mode(path, change)?;
    }

    #[cfg(windows)]
    if change.hidden {
        set_hidden(path, !change.remove)?;
    }

    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, change: &AttributeChange) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read attributes for '{}'", path.display()))?;
    let mode = change.apply_to_mode(metadata.permissions().mode() & 0o7777);
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to modify attributes for '{}'", path.display()))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, change: &AttributeChange) -> Result<()> {
    // Only the write bit maps onto a portable permission
    if !change.write {
        return Ok(());
    }
    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read attributes for '{}'", path.display()))?;
    let mut permissions = metadata.permissions();
    permissions.set_readonly(change.remove);
    fs::set_permissions(path, permissions)
        .with_context(|| format!("Failed to modify attributes for '{}'", path.display()))
}

#[cfg(windows)]
fn set_hidden(path: &Path, hidden: bool) -> Result<()> {
    use std::os::windows::ffi::OsStrExt;
    use winapi::um::fileapi::{GetFileAttributesW, SetFileAttributesW, INVALID_FILE_ATTRIBUTES};
    use winapi::um::winnt::FILE_ATTRIBUTE_HIDDEN;

    let wide: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    unsafe {
        let current = GetFileAttributesW(wide.as_ptr());
        if current == INVALID_FILE_ATTRIBUTES {
            return Err(std::io::Error::last_os_error())
                .with_context(|| format!("Failed to read attributes for '{}'", path.display()));
        }
        let updated = if hidden {
            current | FILE_ATTRIBUTE_HIDDEN
        } else {
            current & !FILE_ATTRIBUTE_HIDDEN
        };
        if SetFileAttributesW(wide.as_ptr(), updated) == 0 {
            return Err(std::io::Error::last_os_error())
                .with_context(|| format!("Failed to modify attributes for '{}'", path.display()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let change = AttributeChange::parse("rw").unwrap();
        assert!(change.read && change.write && !change.execute && !change.remove);

        let change = AttributeChange::parse("-x").unwrap();
        assert!(change.remove && change.execute);

        let change = AttributeChange::parse("+h").unwrap();
        assert!(change.hidden && !change.remove);
    }

    #[test]
    fn test_parse_rejects_unknown_letters() {
        assert!(AttributeChange::parse("rz").is_err());
        assert!(AttributeChange::parse("-").is_err());
        assert!(AttributeChange::parse("").is_err());
    }

    #[test]
    fn test_mode_arithmetic() {
        let add_x = AttributeChange::parse("x").unwrap();
        assert_eq!(add_x.apply_to_mode(0o644), 0o755);

        let remove_w = AttributeChange::parse("-w").unwrap();
        assert_eq!(remove_w.apply_to_mode(0o664), 0o444);

        let hidden_only = AttributeChange::parse("h").unwrap();
        assert_eq!(hidden_only.apply_to_mode(0o640), 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("script.sh");
        fs::write(&file, "echo hi").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();

        apply_attributes(&file, &AttributeChange::parse("x").unwrap()).unwrap();
        let mode = fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);

        apply_attributes(&file, &AttributeChange::parse("-x").unwrap()).unwrap();
        let mode = fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_hides_by_renaming_on_unix() {
        let hide = AttributeChange::parse("h").unwrap();
        assert!(hide.hides_by_renaming());
        assert_eq!(hide.visible_name("notes.txt"), ".notes.txt");
        assert_eq!(hide.visible_name(".notes.txt"), ".notes.txt");

        let unhide = AttributeChange::parse("-h").unwrap();
        assert_eq!(unhide.visible_name(".notes.txt"), "notes.txt");

        let read = AttributeChange::parse("r").unwrap();
        assert!(!read.hides_by_renaming());
        assert_eq!(read.visible_name("notes.txt"), "notes.txt");
    }
}
