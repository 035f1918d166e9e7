use std::collections::{HashMap, HashSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use codaph_types::CapturedEvent;
use sha2::{Digest, Sha256};

use crate::cache::{RepoCache, SEGMENT_FLUSH_THRESHOLD_BYTES};
use crate::error::{Error, Result};
use crate::segment::SegmentId;

pub const DEFAULT_MIRROR_DIR: &str = ".codaph";

/// When index files (manifest/sparse/event-ids) are persisted to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWriteMode {
    /// Persist all three index files after every `appendEvent`.
    Immediate,
    /// Buffer index mutations; persist only on `flush()` or when
    /// `autoFlushEveryEvents` is crossed.
    Batch,
}

/// The result of `Mirror::append_event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendResult {
    pub segment: String,
    pub offset: u64,
    pub checksum: String,
    pub deduplicated: bool,
}

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub root: PathBuf,
    pub index_write_mode: IndexWriteMode,
    /// 0 = never auto-flush within a batch; only explicit `flush()` persists.
    pub auto_flush_every_events: u64,
}

impl MirrorConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_write_mode: IndexWriteMode::Immediate,
            auto_flush_every_events: 0,
        }
    }

    pub fn with_index_write_mode(mut self, mode: IndexWriteMode) -> Self {
        self.index_write_mode = mode;
        self
    }

    pub fn with_auto_flush_every_events(mut self, n: u64) -> Self {
        self.auto_flush_every_events = n;
        self
    }
}

struct State {
    repos: HashMap<String, RepoCache>,
    ensured_dirs: HashSet<PathBuf>,
}

/// The append-only JSONL mirror: one per-day segment file per repo, backed
/// by a manifest, a sparse session/thread/actor index, and an event-id
/// dedup index. One `Mirror` instance is the sole authoritative writer for
/// every repoId it touches for as long as it lives.
pub struct Mirror {
    config: MirrorConfig,
    state: Mutex<State>,
}

impl Mirror {
    pub fn new(config: MirrorConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State {
                repos: HashMap::new(),
                ensured_dirs: HashSet::new(),
            }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Append one captured event. Returns `deduplicated = true` without
    /// touching the segment file or indexes if `event.eventId` is already
    /// known for this repo.
    pub fn append_event(&self, event: &CapturedEvent) -> Result<AppendResult> {
        let segment_id = SegmentId::from_ts(&event.ts)
            .ok_or_else(|| Error::Io(std::io::Error::other(format!("unparseable timestamp: {}", event.ts))))?;
        let relative_path = segment_id.relative_path(&event.repo_id);

        let mut state = self.state.lock().expect("mirror state mutex poisoned");
        let root = self.config.root.clone();
        let repo_id = event.repo_id.clone();

        if !state.repos.contains_key(&repo_id) {
            let cache = RepoCache::load(&root, &repo_id);
            state.repos.insert(repo_id.clone(), cache);
        }
        let cache = state.repos.get_mut(&repo_id).expect("just inserted");

        if let Some(existing) = cache.event_ids.events.get(&event.event_id) {
            return Ok(AppendResult {
                segment: existing.segment.clone(),
                offset: 0,
                checksum: hash_hex(event.event_id.as_bytes()),
                deduplicated: true,
            });
        }

        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        let checksum = hash_hex(&line);

        let segment_dir = crate::segment::segment_dir(&root, &repo_id, &segment_id);
        ensure_dir(&mut state.ensured_dirs, &segment_dir)?;
        let cache = state.repos.get_mut(&repo_id).expect("present");

        let segment_file_path = root.join(&relative_path);
        match self.config.index_write_mode {
            IndexWriteMode::Immediate => {
                append_bytes_to_file(&segment_file_path, &line)?;
            }
            IndexWriteMode::Batch => {
                let buffer = cache.segment_buffers.entry(relative_path.clone()).or_default();
                buffer.pending.extend_from_slice(&line);
                if buffer.pending.len() >= SEGMENT_FLUSH_THRESHOLD_BYTES {
                    let pending = std::mem::take(&mut buffer.pending);
                    append_bytes_to_file(&segment_file_path, &pending)?;
                }
            }
        }

        let segment_meta = cache
            .manifest
            .segments
            .entry(segment_id.compact())
            .or_insert_with(|| codaph_types::SegmentMeta {
                id: segment_id.compact(),
                relative_path: relative_path.clone(),
                from: event.ts.clone(),
                to: event.ts.clone(),
                event_count: 0,
            });
        segment_meta.event_count += 1;
        if event.ts < segment_meta.from {
            segment_meta.from = event.ts.clone();
        }
        if event.ts > segment_meta.to {
            segment_meta.to = event.ts.clone();
        }
        let offset = segment_meta.event_count;

        cache
            .sparse
            .sessions
            .entry(event.session_id.clone())
            .or_default()
            .absorb(&event.ts, &relative_path);
        if let Some(thread_id) = &event.thread_id {
            cache.sparse.threads.entry(thread_id.clone()).or_default().absorb(&event.ts, &relative_path);
            cache
                .sparse
                .sessions
                .get_mut(&event.session_id)
                .expect("inserted above")
                .threads
                .insert(thread_id.clone());
        }
        if let Some(actor_id) = &event.actor_id {
            cache.sparse.actors.entry(actor_id.clone()).or_default().absorb(&event.ts, &relative_path);
            cache
                .sparse
                .sessions
                .get_mut(&event.session_id)
                .expect("inserted above")
                .actors
                .insert(actor_id.clone());
            cache
                .sparse
                .actors
                .get_mut(actor_id)
                .expect("inserted above")
                .sessions
                .insert(event.session_id.clone());
        }

        cache.event_ids.events.insert(
            event.event_id.clone(),
            codaph_types::EventIdEntry {
                segment: relative_path.clone(),
                ts: event.ts.clone(),
                session_id: event.session_id.clone(),
                actor_id: event.actor_id.clone(),
            },
        );

        cache.dirty = true;
        cache.dirty_event_count += 1;

        let should_persist = match self.config.index_write_mode {
            IndexWriteMode::Immediate => true,
            IndexWriteMode::Batch => {
                self.config.auto_flush_every_events > 0 && cache.dirty_event_count >= self.config.auto_flush_every_events
            }
        };
        if should_persist {
            cache.persist_indexes(&root, &repo_id)?;
        }

        Ok(AppendResult {
            segment: relative_path,
            offset,
            checksum,
            deduplicated: false,
        })
    }

    /// Append an opaque line to a session's raw passthrough file.
    pub fn append_raw_line(&self, session_id: &str, line: &str) -> Result<()> {
        let path = self.config.root.join("runs").join(session_id).join("raw-codex.ndjson");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut bytes = line.as_bytes().to_vec();
        if !bytes.ends_with(b"\n") {
            bytes.push(b'\n');
        }
        append_bytes_to_file(&path, &bytes)
    }

    /// Drain buffered segment writes and persist all dirty indexes.
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.lock().expect("mirror state mutex poisoned");
        let root = self.config.root.clone();
        let repo_ids: Vec<String> = state.repos.keys().cloned().collect();
        for repo_id in repo_ids {
            let cache = state.repos.get_mut(&repo_id).expect("present");
            let pending_segments: Vec<(String, Vec<u8>)> = cache
                .segment_buffers
                .iter_mut()
                .filter(|(_, buf)| !buf.pending.is_empty())
                .map(|(path, buf)| (path.clone(), std::mem::take(&mut buf.pending)))
                .collect();
            for (relative_path, bytes) in pending_segments {
                append_bytes_to_file(&root.join(&relative_path), &bytes)?;
            }
            cache.persist_indexes(&root, &repo_id)?;
        }
        Ok(())
    }
}

fn ensure_dir(ensured: &mut HashSet<PathBuf>, dir: &Path) -> Result<()> {
    if ensured.contains(dir) {
        return Ok(());
    }
    std::fs::create_dir_all(dir)?;
    ensured.insert(dir.to_path_buf());
    Ok(())
}

fn append_bytes_to_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(bytes)?;
    Ok(())
}

fn hash_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
