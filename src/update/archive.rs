//! update::archive
//!
//! Extraction of release archives and location of the binary inside.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use zip::ZipArchive;

use crate::error::{codes, Error, Result};

/// Extract a `.zip` or `.tar.gz` archive into `dest` and return the path
/// of the binary it contains.
pub fn extract_archive(src: &Path, dest: &Path) -> Result<PathBuf> {
    let name = src.to_string_lossy();
    let extracted = if name.ends_with(".zip") {
        unzip(src, dest)?
    } else if name.ends_with(".tar.gz") {
        untar_gzip(src, dest)?
    } else {
        return Err(Error::new(codes::CLI_AUTOUPDATE)
            .with_message(format!("Unrecognized extension for file: {}", src.display())));
    };
    find_binary(dest, &extracted)
}

fn unzip(src: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(src)?;
    let mut archive = ZipArchive::new(file).map_err(|err| extraction_failed(src, err))?;
    let mut extracted = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| extraction_failed(src, err))?;
        // enclosed_name rejects entries that would escape dest
        let relative = match entry.enclosed_name() {
            Some(relative) => relative.to_path_buf(),
            None => continue,
        };
        let target = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&target, fs::Permissions::from_mode(mode))?;
            }
        }
        extracted.push(target);
    }
    Ok(extracted)
}

fn untar_gzip(src: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(src)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    fs::create_dir_all(dest)?;
    let mut extracted = Vec::new();
    for entry in archive.entries().map_err(|err| extraction_failed(src, err))? {
        let mut entry = entry.map_err(|err| extraction_failed(src, err))?;
        let relative = entry
            .path()
            .map_err(|err| extraction_failed(src, err))?
            .into_owned();
        let is_file = entry.header().entry_type().is_file();
        // unpack_in returns false for paths that would escape dest; those
        // entries never land on disk and must not be reported as extracted
        let unpacked = entry
            .unpack_in(dest)
            .map_err(|err| extraction_failed(src, err))?;
        if is_file && unpacked {
            extracted.push(dest.join(relative));
        }
    }
    Ok(extracted)
}

fn extraction_failed(src: &Path, err: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::new(codes::CLI_AUTOUPDATE)
        .with_message(format!("Could not extract file: {}", src.display()))
        .with_source(err)
}

/// Pick the binary out of the extracted files.
///
/// A single-file archive is the binary itself; otherwise the file under a
/// path containing `bin` wins.
fn find_binary(dest: &Path, extracted: &[PathBuf]) -> Result<PathBuf> {
    match extracted {
        [] => Err(Error::new(codes::CLI_AUTOUPDATE).with_message("The archive contained no files")),
        [only] => Ok(only.clone()),
        many => many
            .iter()
            .find(|path| {
                path.strip_prefix(dest)
                    .map(|relative| relative.to_string_lossy().contains("bin"))
                    .unwrap_or(false)
            })
            .cloned()
            .ok_or_else(|| {
                Error::new(codes::CLI_AUTOUPDATE)
                    .with_message("Could not detect the binary among the extracted files")
            }),
    }
}
