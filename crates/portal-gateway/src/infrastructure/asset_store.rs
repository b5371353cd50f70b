//! Captive-page storage.
//!
//! The page is read once at startup and then served from memory; there is
//! no per-request filesystem access.  A built-in page compiled into the
//! binary is the fallback, so a missing or unreadable file downgrades the
//! deployment to the default chat page instead of failing bootstrap.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// The chat page compiled into the binary.
pub const DEFAULT_PAGE: &str = include_str!("../../assets/index.html");

/// Source of static assets served by the HTTP greeter.
pub trait StaticAssetStore: Send + Sync {
    /// Reads one asset in full.
    fn read(&self, path: &Path) -> std::io::Result<String>;
}

/// Asset store backed by the host filesystem.
pub struct FileAssetStore;

impl StaticAssetStore for FileAssetStore {
    fn read(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Loads the captive page, falling back to [`DEFAULT_PAGE`].
///
/// `path` of `None` means the operator did not override the page.  An
/// unreadable override is logged and falls back too; serving *something*
/// matters more than serving the custom page.
pub fn load_captive_page(store: &dyn StaticAssetStore, path: Option<&PathBuf>) -> String {
    match path {
        Some(path) => match store.read(path) {
            Ok(page) => {
                info!("serving captive page from {}", path.display());
                page
            }
            Err(e) => {
                warn!(
                    "cannot read captive page {}: {e}; using built-in page",
                    path.display()
                );
                DEFAULT_PAGE.to_string()
            }
        },
        None => DEFAULT_PAGE.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
