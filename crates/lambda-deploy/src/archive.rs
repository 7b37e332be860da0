//! Directory archiving
//!
//! Turns a local directory into a single zip artifact at a caller-specified
//! path. The archive is staged as a temporary file next to the destination
//! and renamed into place, so a reader never observes a partially written
//! artifact and nothing is left behind outside the destination path.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{DeployError, Result};

/// Archive the contents of `source_dir` into a zip file at `destination`.
///
/// The archive's root corresponds exactly to `source_dir`'s contents.
/// Entries are written in sorted order with a fixed timestamp, so archiving
/// the same tree twice yields byte-identical artifacts.
///
/// If `destination` already exists the call fails with
/// [`DeployError::AlreadyExists`] unless `overwrite` is set, in which case
/// the existing file is removed before the staged archive is moved in.
/// `destination`'s parent directory must already exist.
///
/// Returns the canonical path of the written archive.
pub fn archive(source_dir: &Path, destination: &Path, overwrite: bool) -> Result<PathBuf> {
    if !source_dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source directory not found: {}", source_dir.display()),
        )
        .into());
    }

    if destination.exists() && !overwrite {
        return Err(DeployError::AlreadyExists(destination.to_path_buf()));
    }

    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    // Staged next to the destination so the final rename stays on one
    // filesystem. Dropped (and removed) automatically if anything below fails.
    let mut staged = NamedTempFile::new_in(parent)?;
    write_zip(source_dir, staged.as_file_mut())?;

    if overwrite && destination.exists() {
        fs::remove_file(destination)?;
    }
    staged
        .persist(destination)
        .map_err(|e| DeployError::Io(e.error))?;

    tracing::info!(
        "Archived {} to {}",
        source_dir.display(),
        destination.display()
    );
    Ok(fs::canonicalize(destination)?)
}

fn write_zip(source_dir: &Path, file: &mut File) -> Result<()> {
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    add_dir_entries(&mut zip, source_dir, Path::new(""), options)?;
    zip.finish()?;
    Ok(())
}

fn add_dir_entries(
    zip: &mut ZipWriter<&mut File>,
    dir: &Path,
    prefix: &Path,
    options: SimpleFileOptions,
) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let rel = prefix.join(entry.file_name());
        let name = rel.to_string_lossy().replace('\\', "/");

        if path.is_dir() {
            zip.add_directory(format!("{}/", name), options)?;
            add_dir_entries(zip, &path, &rel, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut source = File::open(&path)?;
            io::copy(&mut source, zip)?;
        }
    }
    Ok(())
}
