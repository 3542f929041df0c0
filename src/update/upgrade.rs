//! update::upgrade
//!
//! In-place replacement of the running binary with a newer release.
//!
//! # Design
//!
//! The new release is downloaded and extracted under `bin/{version}` in
//! the config directory, the current binary is moved into
//! `bin/backups/{current-version}`, and a hard link from the original
//! install path to the new binary takes its place. The swapped-in binary
//! is then asked for its version; a mismatch restores the backup.

use std::env::consts;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{codes, Error, Result};
use crate::ui::IoStreams;
use crate::update::archive::extract_archive;
use crate::update::metadata::Release;

/// Where release archives are published.
const DOWNLOADS_BASE_URL: &str = "https://downloads.slack-edge.com/slack-cli";

const BIN_DIR: &str = "bin";
const BACKUPS_DIR: &str = "backups";

/// Mock versions must not leak into the post-upgrade version check.
const TEST_VERSION_ENV: &str = "SLACK_TEST_VERSION";

/// Archive name published for a version on a given platform.
fn archive_file_name(version: &str, os: &str, arch: &str) -> Result<String> {
    match os {
        "macos" => Ok(match arch {
            "x86_64" => format!("slack_cli_{}_macOS_amd64.zip", version),
            "aarch64" => format!("slack_cli_{}_macOS_arm64.zip", version),
            _ => format!("slack_cli_{}_macOS_64-bit.zip", version),
        }),
        "linux" => Ok(format!("slack_cli_{}_linux_64-bit.tar.gz", version)),
        "windows" => Ok(format!("slack_cli_{}_windows_64-bit.zip", version)),
        other => Err(Error::new(codes::CLI_AUTOUPDATE)
            .with_message(format!("No release archives are published for {}", other))),
    }
}

/// Installs a release over the running binary.
pub struct Upgrader {
    io: IoStreams,
    config_dir: PathBuf,
    current_version: String,
}

impl Upgrader {
    pub fn new(io: IoStreams, config_dir: &Path, current_version: &str) -> Self {
        Self {
            io,
            config_dir: config_dir.to_path_buf(),
            current_version: current_version.to_string(),
        }
    }

    /// Download and install a release, replacing the running binary.
    pub async fn upgrade(&self, release: &Release) -> Result<()> {
        self.io.section("Starting the auto-update...");
        let file_name = archive_file_name(&release.version, consts::OS, consts::ARCH)?;
        let url = format!("{}/{}", DOWNLOADS_BASE_URL, file_name);

        let bin_dir = self.config_dir.join(BIN_DIR);
        fs::create_dir_all(&bin_dir)?;
        let archive_path = bin_dir.join(&file_name);

        self.io
            .section(format!("Downloading version {}...", release.version));
        self.io.debug(format!("downloading from {}", url));
        download(&url, &archive_path).await?;

        let exe_path = current_binary_path()?;
        self.io
            .section(format!("Found current install path: {}", exe_path.display()));
        self.install(&archive_path, &release.version, &exe_path)
    }

    /// Extract an already downloaded archive and swap the binary at
    /// `exe_path` for the one inside it.
    fn install(&self, archive_path: &Path, version: &str, exe_path: &Path) -> Result<()> {
        let bin_dir = self.config_dir.join(BIN_DIR);
        let version_dir = bin_dir.join(version);
        let new_binary = extract_archive(archive_path, &version_dir)?;
        fs::remove_file(archive_path)?;

        let backup_path = self.backup_binary(exe_path, &bin_dir)?;

        self.io.section(format!(
            "Updating to version {}: {}",
            version,
            exe_path.display()
        ));
        if let Err(err) = self.swap_and_verify(&new_binary, exe_path, version) {
            self.restore_binary(&backup_path, exe_path)?;
            return Err(err);
        }

        self.io
            .section(format!("Successfully updated to version {}", version));
        Ok(())
    }

    /// Move the current binary into the backups folder.
    fn backup_binary(&self, exe_path: &Path, bin_dir: &Path) -> Result<PathBuf> {
        let backup_dir = bin_dir.join(BACKUPS_DIR).join(&self.current_version);
        self.io
            .section(format!("Backing up current install: {}", backup_dir.display()));
        fs::create_dir_all(&backup_dir)?;
        let file_name = exe_path.file_name().ok_or_else(|| {
            Error::new(codes::CLI_AUTOUPDATE)
                .with_message(format!("Invalid binary path: {}", exe_path.display()))
        })?;
        let backup_path = backup_dir.join(file_name);
        fs::rename(exe_path, &backup_path).map_err(|err| {
            Error::new(codes::CLI_AUTOUPDATE)
                .with_message("Failed to move the current binary to the backup directory")
                .with_source(err)
        })?;
        Ok(backup_path)
    }

    fn swap_and_verify(&self, new_binary: &Path, exe_path: &Path, version: &str) -> Result<()> {
        fs::hard_link(new_binary, exe_path).map_err(|err| {
            Error::new(codes::CLI_AUTOUPDATE)
                .with_message("Failed to link the new binary into place")
                .with_source(err)
        })?;
        self.io.section("Verifying the update...");
        verify_version(exe_path, version)
    }

    /// Put the backed-up binary back after a failed swap or verify.
    fn restore_binary(&self, backup_path: &Path, exe_path: &Path) -> Result<()> {
        self.io.warn("Update failed, restoring the previous binary");
        if exe_path.exists() {
            fs::remove_file(exe_path)?;
        }
        fs::rename(backup_path, exe_path).map_err(|err| {
            Error::new(codes::CLI_AUTOUPDATE)
                .with_message("Failed to restore the previous binary")
                .with_source(err)
        })
    }
}

/// Run `--version` on the new binary and confirm it reports `version`.
fn verify_version(exe_path: &Path, version: &str) -> Result<()> {
    let output = Command::new(exe_path)
        .arg("--version")
        .env_remove(TEST_VERSION_ENV)
        .output()
        .map_err(|err| {
            Error::new(codes::CLI_AUTOUPDATE)
                .with_message(format!(
                    "Running {} --version after the update failed",
                    exe_path.display()
                ))
                .with_source(err)
        })?;
    let reported = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() || !reported.contains(version) {
        return Err(Error::new(codes::CLI_AUTOUPDATE).with_message(format!(
            "Expected version {} was not in the version output: {}",
            version,
            reported.trim()
        )));
    }
    Ok(())
}

/// The path of the running binary with symlinks resolved, so an install
/// reached through a symlink updates the real file.
fn current_binary_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(|err| {
        Error::new(codes::CLI_AUTOUPDATE)
            .with_message("Failed to locate the running binary")
            .with_source(err)
    })?;
    Ok(fs::canonicalize(&exe).unwrap_or(exe))
}

async fn download(url: &str, dst: &Path) -> Result<()> {
    let response = reqwest::get(url).await.map_err(|err| {
        Error::new(codes::CLI_AUTOUPDATE)
            .with_message(format!("Failed to download {}", url))
            .with_source(err)
    })?;
    if !response.status().is_success() {
        return Err(Error::new(codes::CLI_AUTOUPDATE).with_message(format!(
            "Download of {} responded with status {}",
            url,
            response.status()
        )));
    }
    let bytes = response.bytes().await.map_err(|err| {
        Error::new(codes::CLI_AUTOUPDATE)
            .with_message(format!("Failed to download {}", url))
            .with_source(err)
    })?;
    fs::write(dst, &bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    mod archive_names {
        use super::*;

        #[test]
        fn linux_releases_are_tarballs() {
            assert_eq!(
                archive_file_name("3.2.0", "linux", "x86_64").unwrap(),
                "slack_cli_3.2.0_linux_64-bit.tar.gz"
            );
        }

        #[test]
        fn macos_releases_are_per_architecture_zips() {
            assert_eq!(
                archive_file_name("3.2.0", "macos", "aarch64").unwrap(),
                "slack_cli_3.2.0_macOS_arm64.zip"
            );
            assert_eq!(
                archive_file_name("3.2.0", "macos", "x86_64").unwrap(),
                "slack_cli_3.2.0_macOS_amd64.zip"
            );
        }

        #[test]
        fn windows_releases_are_zips() {
            assert_eq!(
                archive_file_name("3.2.0", "windows", "x86_64").unwrap(),
                "slack_cli_3.2.0_windows_64-bit.zip"
            );
        }

        #[test]
        fn unsupported_platforms_are_an_error() {
            assert!(archive_file_name("3.2.0", "freebsd", "x86_64").is_err());
        }
    }

    #[cfg(unix)]
    mod install {
        use super::*;
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::os::unix::fs::PermissionsExt;

        /// A stand-in binary: a script that reports a fixed version.
        fn write_fake_binary(path: &Path, version: &str) {
            fs::write(path, format!("#!/bin/sh\necho {}\n", version)).unwrap();
            fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
        }

        fn release_tarball(dir: &Path, version: &str) -> PathBuf {
            let archive_path = dir.join(format!("slack_cli_{}_linux_64-bit.tar.gz", version));
            let script = format!("#!/bin/sh\necho {}\n", version);
            let file = fs::File::create(&archive_path).unwrap();
            let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
            let mut header = tar::Header::new_gnu();
            header.set_size(script.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder
                .append_data(&mut header, "bin/slack", script.as_bytes())
                .unwrap();
            builder.into_inner().unwrap().finish().unwrap();
            archive_path
        }

        #[test]
        fn install_swaps_backs_up_and_verifies() {
            let dir = TempDir::new().unwrap();
            let exe_path = dir.path().join("slack");
            write_fake_binary(&exe_path, "3.1.0");
            let archive = release_tarball(dir.path(), "3.2.0");

            let upgrader = Upgrader::new(IoStreams::default(), dir.path(), "3.1.0");
            upgrader.install(&archive, "3.2.0", &exe_path).unwrap();

            // The install path now reports the new version.
            let output = Command::new(&exe_path).output().unwrap();
            assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "3.2.0");

            // The old binary is kept under backups, the archive is gone.
            let backup = dir.path().join("bin/backups/3.1.0/slack");
            assert!(backup.exists());
            assert!(!archive.exists());
        }

        #[test]
        fn failed_verification_restores_the_backup() {
            let dir = TempDir::new().unwrap();
            let exe_path = dir.path().join("slack");
            write_fake_binary(&exe_path, "3.1.0");
            // The archive claims 3.2.0 but its binary reports 0.0.0.
            let archive = release_tarball(dir.path(), "0.0.0");
            let renamed = dir.path().join("slack_cli_3.2.0_linux_64-bit.tar.gz");
            fs::rename(&archive, &renamed).unwrap();

            let upgrader = Upgrader::new(IoStreams::default(), dir.path(), "3.1.0");
            let err = upgrader.install(&renamed, "3.2.0", &exe_path).unwrap_err();
            assert_eq!(err.code(), codes::CLI_AUTOUPDATE);

            let output = Command::new(&exe_path).output().unwrap();
            assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "3.1.0");
        }
    }

    #[test]
    fn version_check_rejects_a_mismatch() {
        let dir = TempDir::new().unwrap();
        let exe_path = dir.path().join("slack");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::write(&exe_path, "#!/bin/sh\necho 1.0.0\n").unwrap();
            fs::set_permissions(&exe_path, fs::Permissions::from_mode(0o755)).unwrap();
            assert!(verify_version(&exe_path, "1.0.0").is_ok());
            assert!(verify_version(&exe_path, "2.0.0").is_err());
        }
    }
}
