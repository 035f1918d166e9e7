//! A tempdir-backed `Mirror` fixture so tests don't each hand-roll
//! `tempfile::tempdir()` plus `MirrorConfig` wiring.

use codaph_mirror::{IndexWriteMode, Mirror, MirrorConfig};

/// Owns the tempdir alongside the `Mirror` it backs, so the directory isn't
/// dropped (and deleted) while the mirror is still in use.
pub struct MirrorFixture {
    pub dir: tempfile::TempDir,
    pub mirror: Mirror,
}

impl MirrorFixture {
    /// An immediate-write mirror rooted in a fresh tempdir.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create tempdir for mirror fixture");
        let mirror = Mirror::new(MirrorConfig::new(dir.path()));
        Self { dir, mirror }
    }

    /// A batch-write mirror, auto-flushing every `auto_flush_every_events`
    /// events, matching the orchestrator's own mirror configuration.
    pub fn batched(auto_flush_every_events: u64) -> Self {
        let dir = tempfile::tempdir().expect("create tempdir for mirror fixture");
        let config = MirrorConfig::new(dir.path())
            .with_index_write_mode(IndexWriteMode::Batch)
            .with_auto_flush_every_events(auto_flush_every_events);
        let mirror = Mirror::new(config);
        Self { dir, mirror }
    }

    pub fn root(&self) -> &std::path::Path {
        self.dir.path()
    }
}

impl Default for MirrorFixture {
    fn default() -> Self {
        Self::new()
    }
}
