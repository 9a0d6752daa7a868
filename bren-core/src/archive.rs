use crate::error::InvalidArgument;
use crate::output::RenameResult;
use crate::rename::{rename_root, RenameOptions};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Datelike, Local, Timelike};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::SystemTime;
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    Gzip,
}

impl ArchiveFormat {
    /// Detect the format from the file extension, ignoring case
    pub fn detect(path: &Path) -> Result<Self, InvalidArgument> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "zip" => Ok(Self::Zip),
            "tar" => Ok(Self::Tar),
            "gz" => Ok(Self::Gzip),
            _ => Err(InvalidArgument::ArchiveFormat(path.to_path_buf())),
        }
    }
}

/// Name of the single member of a `.gz` archive: the archive name
/// without `.gz`
pub fn gzip_member_name(archive: &Path) -> String {
    archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `$W` inside an archive
pub fn archive_stem(archive: &Path) -> String {
    gzip_member_name(archive)
}

/// Rename the contents of `archive` in place.
///
/// The archive is unpacked into a temporary directory, renamed there and
/// packed back into the same file. Rollback logs are never written. Paths
/// in the result are reported relative to the archive.
pub fn process_archive(
    archive: &Path,
    options: &RenameOptions,
    interrupted: &AtomicBool,
) -> Result<RenameResult> {
    let format = ArchiveFormat::detect(archive)?;
    let workdir = TempDir::new().context("Failed to create temporary directory")?;
    info!("Extracting {} to {}", archive.display(), workdir.path().display());
    extract(archive, format, workdir.path())?;

    if options.write_log {
        warn!("Log and rollback features are disabled when processing archives.");
    }
    let options = RenameOptions {
        write_log: false,
        directory_name: Some(archive_stem(archive)),
        ..options.clone()
    };

    let mut result = rename_root(workdir.path(), &options, interrupted)?;

    // Attribute changes leave names alone, so repack after every real run
    if !options.dry_run {
        repack(workdir.path(), format, archive)?;
        info!("Repacked {}", archive.display());
    }

    let base = workdir
        .path()
        .canonicalize()
        .unwrap_or_else(|_| workdir.path().to_path_buf());
    let inside = |path: &Path| match path.strip_prefix(&base) {
        Ok(rest) => archive.join(rest),
        Err(_) => path.to_path_buf(),
    };
    for planned in &mut result.planned {
        planned.from = inside(&planned.from);
        planned.to = inside(&planned.to);
    }
    for item in &mut result.failed {
        item.path = inside(&item.path);
    }
    result.renamed = result.renamed.iter().map(|p| inside(p)).collect();

    Ok(result)
}

pub fn extract(archive: &Path, format: ArchiveFormat, dest: &Path) -> Result<()> {
    let file = File::open(archive)
        .with_context(|| format!("Failed to open archive: {}", archive.display()))?;

    match format {
        ArchiveFormat::Zip => {
            let mut zip = zip::ZipArchive::new(BufReader::new(file))
                .with_context(|| format!("Failed to read zip archive: {}", archive.display()))?;
            zip.extract(dest)
                .with_context(|| format!("Failed to extract {}", archive.display()))?;
        },
        ArchiveFormat::Tar => {
            tar::Archive::new(BufReader::new(file))
                .unpack(dest)
                .with_context(|| format!("Failed to extract {}", archive.display()))?;
        },
        ArchiveFormat::Gzip => {
            let member = dest.join(gzip_member_name(archive));
            let mut decoder = GzDecoder::new(BufReader::new(file));
            let mut out = File::create(&member)
                .with_context(|| format!("Failed to create {}", member.display()))?;
            io::copy(&mut decoder, &mut out)
                .with_context(|| format!("Failed to decompress {}", archive.display()))?;
        },
    }
    Ok(())
}

/// Pack the contents of `src` into `archive`, replacing it atomically
pub fn repack(src: &Path, format: ArchiveFormat, archive: &Path) -> Result<()> {
    let parent = match archive.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;

    {
        let writer = BufWriter::new(temp.as_file());
        match format {
            ArchiveFormat::Zip => write_zip(src, writer)?,
            ArchiveFormat::Tar => write_tar(src, writer)?,
            ArchiveFormat::Gzip => write_gzip(src, writer)?,
        }
    }

    if let Ok(metadata) = fs::metadata(archive) {
        fs::set_permissions(temp.path(), metadata.permissions())
            .with_context(|| format!("Failed to copy permissions of {}", archive.display()))?;
    }
    temp.persist(archive)
        .with_context(|| format!("Failed to replace archive {}", archive.display()))?;
    Ok(())
}

/// Entries below `src` with their archive names, parents first
fn members(src: &Path) -> Result<Vec<(PathBuf, String, bool)>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("Unexpected path {}", entry.path().display()))?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        found.push((entry.path().to_path_buf(), name, entry.file_type().is_dir()));
    }
    Ok(found)
}

fn write_zip<W: Write + io::Seek>(src: &Path, writer: W) -> Result<()> {
    let mut zip = zip::ZipWriter::new(writer);

    for (path, name, is_dir) in members(src)? {
        debug!("Adding {name}");
        let options = zip_entry_options(&path);
        if is_dir {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut file = File::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            io::copy(&mut file, &mut zip)?;
        }
    }

    zip.finish().context("Failed to finish zip archive")?.flush()?;
    Ok(())
}

/// Entry options carrying the member's mode and modification time
fn zip_entry_options(path: &Path) -> SimpleFileOptions {
    let mut options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return options;
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        options = options.unix_permissions(metadata.permissions().mode() & 0o7777);
    }

    if let Some(time) = metadata.modified().ok().and_then(zip_time) {
        options = options.last_modified_time(time);
    }
    options
}

/// Local time in DOS format; None outside the 1980-2107 range
fn zip_time(time: SystemTime) -> Option<zip::DateTime> {
    let local: DateTime<Local> = time.into();
    zip::DateTime::from_date_and_time(
        u16::try_from(local.year()).ok()?,
        u8::try_from(local.month()).ok()?,
        u8::try_from(local.day()).ok()?,
        u8::try_from(local.hour()).ok()?,
        u8::try_from(local.minute()).ok()?,
        u8::try_from(local.second()).ok()?,
    )
    .ok()
}

fn write_tar<W: Write>(src: &Path, writer: W) -> Result<()> {
    let mut builder = tar::Builder::new(writer);
    builder.follow_symlinks(false);

    for (path, name, _) in members(src)? {
        debug!("Adding {name}");
        builder
            .append_path_with_name(&path, &name)
            .with_context(|| format!("Failed to add {} to archive", path.display()))?;
    }

    builder
        .into_inner()
        .context("Failed to finish tar archive")?
        .flush()?;
    Ok(())
}

fn write_gzip<W: Write>(src: &Path, writer: W) -> Result<()> {
    let entries = members(src)?;
    let [(path, name, false)] = entries.as_slice() else {
        return Err(anyhow!(
            "A .gz archive must contain exactly one file, found {} entries",
            entries.len()
        ));
    };

    let mut encoder: GzEncoder<W> = GzBuilder::new()
        .filename(name.as_bytes())
        .write(writer, Compression::default());
    let mut file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    io::copy(&mut file, &mut encoder)?;
    encoder.finish().context("Failed to finish gzip stream")?.flush()?;
    Ok(())
}
