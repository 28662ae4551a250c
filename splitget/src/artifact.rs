//! Side artifacts produced next to a placed download.
//!
//! A renderer receives the published URL after placement and may write an
//! extra file derived from it (a QR code image, a link file). Rendering is
//! best-effort; failures are logged by the caller and never fail a download.

use std::io;
use std::path::{Path, PathBuf};

/// Produces an optional companion file for a published artifact.
pub trait SideArtifactRenderer: Send + Sync {
    /// Render into `dest_dir`, returning the written path, or `None` if
    /// nothing was produced.
    fn render(
        &self,
        published_url: &str,
        target_name: &str,
        dest_dir: &Path,
    ) -> io::Result<Option<PathBuf>>;
}

/// Renderer that produces nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSideArtifact;

impl SideArtifactRenderer for NoSideArtifact {
    fn render(&self, _: &str, _: &str, _: &Path) -> io::Result<Option<PathBuf>> {
        Ok(None)
    }
}
