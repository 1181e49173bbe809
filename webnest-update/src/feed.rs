//! Release-manifest backed update delivery.
//!
//! [`ReleaseFeed`] polls a JSON manifest (`{"version", "url", "notes"?,
//! "published_at"?}`), downloads a newer artifact to a staging path and
//! reports progress as [`UpdateEvent`]s over a channel. Checks run on a
//! background thread so [`UpdateDelivery::check_for_updates_and_notify`]
//! returns immediately.

use crate::http;
use crate::install;
use crate::lifecycle::{UpdateDelivery, UpdateEvent};
use crate::update_checker::{self, UpdateInfo};
use anyhow::{Context, bail};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

type RestartHook = Box<dyn Fn() + Send + Sync>;

/// Polls a release manifest and stages newer builds.
pub struct ReleaseFeed {
    feed_url: String,
    current_version: String,
    staging_path: PathBuf,
    events: Mutex<Sender<UpdateEvent>>,
    in_progress: Arc<AtomicBool>,
    staged: Arc<Mutex<Option<UpdateInfo>>>,
    on_restart: RestartHook,
}

impl ReleaseFeed {
    /// `on_restart` runs after the staged binary has been installed. It is
    /// expected to start the new binary and terminate the current process.
    pub fn new(
        feed_url: impl Into<String>,
        current_version: impl Into<String>,
        staging_path: impl Into<PathBuf>,
        events: Sender<UpdateEvent>,
        on_restart: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            feed_url: feed_url.into(),
            current_version: current_version.into(),
            staging_path: staging_path.into(),
            events: Mutex::new(events),
            in_progress: Arc::new(AtomicBool::new(false)),
            staged: Arc::new(Mutex::new(None)),
            on_restart: Box::new(on_restart),
        }
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    /// The release currently staged for installation, if any.
    pub fn staged_release(&self) -> Option<UpdateInfo> {
        self.staged.lock().clone()
    }
}

impl UpdateDelivery for ReleaseFeed {
    fn check_for_updates_and_notify(&self) -> anyhow::Result<()> {
        http::validate_update_url(&self.feed_url).map_err(anyhow::Error::msg)?;

        if self.in_progress.swap(true, Ordering::SeqCst) {
            log::debug!("Update check already in progress");
            return Ok(());
        }

        let feed_url = self.feed_url.clone();
        let current_version = self.current_version.clone();
        let staging_path = self.staging_path.clone();
        let events = self.events.lock().clone();
        let in_progress = Arc::clone(&self.in_progress);
        let staged = Arc::clone(&self.staged);

        std::thread::Builder::new()
            .name("webnest-update-check".to_string())
            .spawn(move || {
                let result = run_check(&feed_url, &current_version, &staging_path, &events);
                match result {
                    Ok(Some(info)) => {
                        *staged.lock() = Some(info.clone());
                        let _ = events.send(UpdateEvent::UpdateDownloaded(info));
                    }
                    Ok(None) => {
                        let _ = events.send(UpdateEvent::UpdateNotAvailable);
                    }
                    Err(e) => {
                        let _ = events.send(UpdateEvent::Error(e));
                    }
                }
                in_progress.store(false, Ordering::SeqCst);
            })
            .context("Failed to spawn update check thread")?;

        Ok(())
    }

    fn quit_and_install(&self) -> anyhow::Result<()> {
        let Some(info) = self.staged_release() else {
            bail!("No downloaded update is staged");
        };

        let installation = install::detect_installation();
        if !installation.is_packaged() {
            bail!(
                "Refusing to install update {} over a {}",
                info.version,
                installation.description()
            );
        }

        let current_exe =
            std::env::current_exe().context("Failed to determine current executable")?;
        install::install_standalone(&current_exe, &self.staging_path)
            .map_err(anyhow::Error::msg)?;
        log::info!("Installed update {} to {:?}", info.version, current_exe);

        (self.on_restart)();
        Ok(())
    }
}

/// Fetch the manifest and stage a newer artifact.
///
/// Returns `Ok(None)` when the running version is current.
fn run_check(
    feed_url: &str,
    current_version: &str,
    staging_path: &Path,
    events: &Sender<UpdateEvent>,
) -> Result<Option<UpdateInfo>, String> {
    let body = http::fetch_text(feed_url)?;
    let info = update_checker::parse_manifest(&body)?;

    if !update_checker::is_newer(current_version, &info.version)? {
        log::debug!(
            "Running version {} is current (feed offers {})",
            current_version,
            info.version
        );
        return Ok(None);
    }

    let _ = events.send(UpdateEvent::UpdateAvailable(info.clone()));

    let bytes = http::download_file(&info.url)?;
    stage_artifact(staging_path, &bytes)?;
    Ok(Some(info))
}

fn stage_artifact(staging_path: &Path, bytes: &[u8]) -> Result<(), String> {
    if bytes.is_empty() {
        return Err("Downloaded artifact is empty".to_string());
    }
    if let Some(parent) = staging_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create staging directory {:?}: {}", parent, e))?;
    }
    std::fs::write(staging_path, bytes)
        .map_err(|e| format!("Failed to write staged artifact {:?}: {}", staging_path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn feed(url: &str, staging: PathBuf) -> (ReleaseFeed, mpsc::Receiver<UpdateEvent>) {
        let (tx, rx) = mpsc::channel();
        (ReleaseFeed::new(url, "0.4.0", staging, tx, || {}), rx)
    }

    #[test]
    fn test_check_rejects_insecure_feed() {
        let temp = tempfile::tempdir().unwrap();
        let (feed, _rx) = feed("http://releases.example.com/latest.json", temp.path().join("s"));
        assert!(feed.check_for_updates_and_notify().is_err());
    }

    #[test]
    fn test_quit_and_install_without_staged_release() {
        let temp = tempfile::tempdir().unwrap();
        let (feed, _rx) = feed("https://releases.example.com/latest.json", temp.path().join("s"));
        assert!(feed.staged_release().is_none());
        assert!(feed.quit_and_install().is_err());
    }

    #[test]
    fn test_stage_artifact() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested").join("webnest.staged");
        assert!(stage_artifact(&path, b"").is_err());
        stage_artifact(&path, b"binary").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"binary");
    }
}
