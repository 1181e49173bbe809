//! Installation type detection and in-place binary replacement.

use std::path::{Path, PathBuf};

/// How webnest is running; determines relaunch and update strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallationType {
    /// Running from a Cargo build directory (`target/debug`, `target/release`)
    Development,
    /// Running from a macOS .app bundle (path contains ".app/Contents/MacOS")
    MacOSBundle,
    /// Standalone binary (Linux, Windows, or custom location)
    StandaloneBinary,
}

impl InstallationType {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Development => "development build",
            Self::MacOSBundle => "macOS app bundle",
            Self::StandaloneBinary => "standalone binary",
        }
    }

    /// Whether this is a distribution-built run.
    pub fn is_packaged(&self) -> bool {
        !matches!(self, Self::Development)
    }
}

/// Detect the installation method based on the current executable path.
pub fn detect_installation() -> InstallationType {
    detect_installation_from_path(
        std::env::current_exe()
            .unwrap_or_default()
            .to_string_lossy()
            .as_ref(),
    )
}

/// Detect installation type from a given path string (testable).
pub fn detect_installation_from_path(path: &str) -> InstallationType {
    let path_lower = path.to_lowercase().replace('\\', "/");

    if path_lower.contains("/target/debug/") || path_lower.contains("/target/release/") {
        InstallationType::Development
    } else if path_lower.contains(".app/contents/macos/") {
        InstallationType::MacOSBundle
    } else {
        InstallationType::StandaloneBinary
    }
}

/// Replace `current_exe` with the binary at `staged`.
pub fn install_standalone(current_exe: &Path, staged: &Path) -> Result<PathBuf, String> {
    let new_path = current_exe.with_extension("new");

    std::fs::copy(staged, &new_path)
        .map_err(|e| format!("Failed to stage new binary: {}", e))?;

    // Set executable permission on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&new_path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| format!("Failed to set permissions: {}", e))?;
    }

    #[cfg(unix)]
    {
        // Atomic on the same filesystem; the running binary's inode stays valid.
        std::fs::rename(&new_path, current_exe)
            .map_err(|e| format!("Failed to replace binary: {}", e))?;
    }

    #[cfg(windows)]
    {
        // Windows cannot overwrite a running exe: move it aside first
        let old_path = current_exe.with_extension("old");
        let _ = std::fs::remove_file(&old_path);
        std::fs::rename(current_exe, &old_path)
            .map_err(|e| format!("Failed to rename current binary: {}", e))?;
        std::fs::rename(&new_path, current_exe)
            .map_err(|e| format!("Failed to rename new binary: {}", e))?;
    }

    Ok(current_exe.to_path_buf())
}

/// Remove a leftover `.old` binary from a previous update (Windows).
pub fn cleanup_old_binary() {
    if let Ok(current_exe) = std::env::current_exe() {
        let old_path = current_exe.with_extension("old");
        if old_path.exists() {
            match std::fs::remove_file(&old_path) {
                Ok(()) => log::info!("Removed old binary {:?}", old_path),
                Err(e) => log::warn!("Failed to remove old binary {:?}: {}", old_path, e),
            }
        }
    }
}
