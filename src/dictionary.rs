//! Dictionary loading and folder batch processing
//!
//! A dictionary file is memory-mapped, cut into line-aligned chunks and
//! scanned on the rayon pool into one shared deduplicating set. Every raw
//! entry is then expanded through the [`TransformRules`] and the variants are
//! unioned into the final entry set. Entry order is unspecified.

use crate::context::RunContext;
use crate::dedup::ShardedDeduplicator;
use crate::encoding::{for_each_entry, split_chunks, strip_bom, CHUNK_SIZE};
use crate::error::{GeneratorError, Result};
use crate::transform::TransformRules;

use ahash::RandomState;
use bytesize::ByteSize;
use hashbrown::HashMap;
use log::Level;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// Maximum number of cached dictionaries
pub const DICT_CACHE_SIZE: usize = 10;
/// Cached dictionaries expire after five minutes
pub const DICT_CACHE_TIMEOUT: Duration = Duration::from_secs(300);

/// Folder-mode output directory for transformed files
pub const NEW_DIR: &str = "new";
/// Folder-mode destination for processed originals
pub const DONE_DIR: &str = "done";

/// Transformed, deduplicated dictionary entries
pub type Entries = Arc<Vec<String>>;

struct CachedEntries {
    loaded_at: Instant,
    entries: Entries,
}

/// Time-bounded, size-bounded cache of transformed dictionaries
///
/// Keyed by source path. When full, the oldest entry is evicted.
pub struct DictionaryCache {
    entries: Mutex<HashMap<PathBuf, CachedEntries, RandomState>>,
    capacity: usize,
    ttl: Duration,
}

impl DictionaryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::with_hasher(RandomState::new())),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn get(&self, path: &Path) -> Option<Entries> {
        let mut entries = self.entries.lock();
        let cached = entries
            .get(path)
            .map(|cached| (cached.loaded_at.elapsed() < self.ttl, Arc::clone(&cached.entries)));

        match cached {
            Some((true, loaded)) => Some(loaded),
            Some((false, _)) => {
                entries.remove(path);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, path: &Path, loaded: Entries) {
        let mut entries = self.entries.lock();
        entries.insert(
            path.to_path_buf(),
            CachedEntries {
                loaded_at: Instant::now(),
                entries: loaded,
            },
        );

        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, cached)| cached.loaded_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

impl Default for DictionaryCache {
    fn default() -> Self {
        Self::new(DICT_CACHE_SIZE, DICT_CACHE_TIMEOUT)
    }
}

/// Outcome of folder-mode processing
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FolderSummary {
    pub files_found: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub entries_written: u64,
    /// Transformed files written under `new/`
    pub outputs: Vec<PathBuf>,
}

/// Loads dictionaries and applies transforms
pub struct DictionarySource<'a> {
    rules: &'a TransformRules,
    ctx: &'a RunContext,
}

impl<'a> DictionarySource<'a> {
    pub fn new(rules: &'a TransformRules, ctx: &'a RunContext) -> Self {
        Self { rules, ctx }
    }

    /// Load and transform a dictionary file, served from the run cache if fresh
    pub fn load(&self, path: &Path) -> Result<Entries> {
        if let Some(entries) = self.ctx.cache.get(path) {
            self.ctx
                .reporter
                .log(Level::Info, &format!("Using cached dictionary: {:?}", path));
            return Ok(entries);
        }

        let entries = Arc::new(self.load_uncached(path)?);
        if !self.ctx.is_cancelled() {
            self.ctx.cache.insert(path, Arc::clone(&entries));
        }
        Ok(entries)
    }

    /// Load and transform a dictionary file without touching the cache
    pub fn load_uncached(&self, path: &Path) -> Result<Vec<String>> {
        let raw = self.scan_raw(path)?;
        log::debug!("Scanned {} unique raw entries from {:?}", raw.len(), path);

        let entries = self.transform_all(raw);
        self.ctx.reporter.log(
            Level::Info,
            &format!("Dictionary {:?}: {} entries after transforms", path, entries.len()),
        );
        Ok(entries)
    }

    /// Read the file's unique trimmed lines, in no particular order
    pub fn scan_raw(&self, path: &Path) -> Result<Vec<String>> {
        let file = File::open(path).map_err(|e| GeneratorError::io(path, e))?;
        let size = file.metadata().map_err(|e| GeneratorError::io(path, e))?.len();
        if size == 0 {
            return Ok(Vec::new());
        }
        log::debug!("Scanning {:?} ({})", path, ByteSize(size));

        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| GeneratorError::io(path, e))?;
        let data = strip_bom(&mmap);
        let chunks = split_chunks(data, CHUNK_SIZE);

        let estimated_per_shard = (size / 10) as usize / (num_cpus::get() * 4);
        let entries = ShardedDeduplicator::with_capacity(num_cpus::get() * 4, estimated_per_shard);

        chunks.par_iter().for_each(|chunk| {
            if self.ctx.is_cancelled() {
                return;
            }
            for_each_entry(chunk, |entry| {
                entries.insert(entry);
            });
        });

        Ok(entries.into_entries())
    }

    /// Expand every raw entry and union the variants
    pub fn transform_all(&self, raw: Vec<String>) -> Vec<String> {
        if !self.rules.is_active() {
            return raw;
        }

        let transformed = ShardedDeduplicator::for_workers();
        raw.par_iter().for_each(|entry| {
            if self.ctx.is_cancelled() {
                return;
            }
            for variant in self.rules.apply(entry) {
                transformed.insert_owned(variant);
            }
        });

        transformed.into_entries()
    }

    /// Batch-process every matching file in a folder
    ///
    /// Each file is transformed into `new/new_<name>` and then moved into
    /// `done/`. A failing file is logged and skipped. Nothing is returned for
    /// downstream enumeration.
    pub fn process_folder(&self, dir: &Path, extensions: &[String]) -> Result<FolderSummary> {
        if !dir.is_dir() {
            return Err(GeneratorError::io(
                dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "dictionary folder not found"),
            ));
        }

        let new_dir = dir.join(NEW_DIR);
        let done_dir = dir.join(DONE_DIR);
        fs::create_dir_all(&new_dir).map_err(|e| GeneratorError::io(&new_dir, e))?;
        fs::create_dir_all(&done_dir).map_err(|e| GeneratorError::io(&done_dir, e))?;

        let files = collect_dictionary_files(dir, extensions);
        let mut summary = FolderSummary {
            files_found: files.len(),
            ..Default::default()
        };
        self.ctx.reporter.log(
            Level::Info,
            &format!("Found {} dictionary files in {:?}", files.len(), dir),
        );

        for (index, path) in files.iter().enumerate() {
            if self.ctx.is_cancelled() {
                break;
            }

            match self.process_folder_file(dir, path, &new_dir, &done_dir) {
                Ok((output, count)) => {
                    summary.files_processed += 1;
                    summary.entries_written += count;
                    self.ctx.reporter.log(
                        Level::Info,
                        &format!(
                            "[{}/{}] {:?}: {} entries -> {:?}",
                            index + 1,
                            files.len(),
                            path.file_name().unwrap_or_default(),
                            count,
                            output
                        ),
                    );
                    summary.outputs.push(output);
                }
                Err(_) if self.ctx.is_cancelled() => break,
                Err(e) => {
                    summary.files_failed += 1;
                    self.ctx
                        .reporter
                        .log(Level::Warn, &format!("Failed to process {:?}: {}", path, e));
                }
            }
        }

        Ok(summary)
    }

    /// `root/sub/a.txt` becomes `new/sub/new_a.txt` and moves to `done/sub/a.txt`
    fn process_folder_file(
        &self,
        root: &Path,
        path: &Path,
        new_dir: &Path,
        done_dir: &Path,
    ) -> Result<(PathBuf, u64)> {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let file_name = relative
            .file_name()
            .ok_or_else(|| GeneratorError::config(format!("Not a file: {:?}", path)))?;
        let parent = relative.parent().unwrap_or_else(|| Path::new(""));

        let output = new_dir
            .join(parent)
            .join(format!("new_{}", file_name.to_string_lossy()));
        let done = done_dir.join(relative);
        if done.exists() {
            return Err(GeneratorError::config(format!(
                "{:?} was already processed; {:?} is left in place",
                done, path
            )));
        }

        let entries = self.load_uncached(path)?;
        if self.ctx.is_cancelled() {
            return Err(GeneratorError::config("folder processing cancelled"));
        }

        ensure_parent(&output)?;
        write_entries(&output, &entries)?;
        ensure_parent(&done)?;
        move_into(path, &done)?;

        Ok((output, entries.len() as u64))
    }
}

/// Files under `dir` whose names end with one of `extensions`
///
/// `new/` and `done/` directories are skipped at any depth. Extensions may be
/// given as `txt`, `.txt` or `*.txt`.
pub fn collect_dictionary_files(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let suffixes: Vec<String> = extensions
        .iter()
        .map(|ext| ext.trim().trim_start_matches('*').trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .collect();

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|entry| {
            !(entry.depth() > 0
                && entry.file_type().is_dir()
                && matches!(entry.file_name().to_str(), Some(NEW_DIR) | Some(DONE_DIR)))
        })
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| GeneratorError::io(parent, e)),
        None => Ok(()),
    }
}

fn write_entries(path: &Path, entries: &[String]) -> Result<()> {
    let file = File::create(path).map_err(|e| GeneratorError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for entry in entries {
        writeln!(writer, "{}", entry).map_err(|e| GeneratorError::io(path, e))?;
    }
    writer.flush().map_err(|e| GeneratorError::io(path, e))
}

/// Move `src` to `dest`, safe to repeat
///
/// A missing source means the move already happened. An existing destination
/// is never overwritten. Falls back to copy-and-delete across filesystems.
pub fn move_into(src: &Path, dest: &Path) -> Result<()> {
    if !src.exists() {
        log::debug!("{:?} already moved", src);
        return Ok(());
    }

    if dest.exists() {
        return Err(GeneratorError::io(
            dest,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "destination already exists"),
        ));
    }

    if fs::rename(src, dest).is_err() {
        fs::copy(src, dest).map_err(|e| GeneratorError::io(dest, e))?;
        fs::remove_file(src).map_err(|e| GeneratorError::io(src, e))?;
    }

    Ok(())
}
