//! Output management module
//!
//! Candidates are batched in memory and handed to a dedicated writer thread
//! through a bounded channel, so a slow disk blocks the producer instead of
//! growing the queue. Output is split into numbered files.

use crate::error::{GeneratorError, Result};

use bzip2::write::BzEncoder;
use crossbeam_channel::{bounded, Sender};
use flate2::write::GzEncoder;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

/// Entries per batch handed to the writer thread
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Batches allowed in flight before the producer blocks
pub const DEFAULT_QUEUE_DEPTH: usize = 8;

/// Default buffer size for file writing (8MB)
const DEFAULT_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// Tuning knobs for [`BufferedSplitWriter`]
#[derive(Debug, Clone, Copy)]
pub struct WriterOptions {
    pub batch_size: usize,
    pub queue_depth: usize,
    pub buffer_size: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// One output file and the entries routed to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub entries: u64,
}

/// Result of a completed write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub entries_written: u64,
    pub files: Vec<OutputFile>,
}

impl WriteSummary {
    pub fn paths(&self) -> Vec<&Path> {
        self.files.iter().map(|f| f.path.as_path()).collect()
    }
}

/// Split a file name into stem and extension
///
/// The extension starts at the last dot; leading dots belong to the stem, so
/// `.hidden` has no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if name[..dot].chars().any(|c| c != '.') => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    }
}

/// Path of the `n`th output file: the base itself for 1, `<stem>_<n><ext>` after
pub fn numbered_path(base: &Path, n: u64) -> PathBuf {
    if n <= 1 {
        return base.to_path_buf();
    }

    let name = base
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let (stem, ext) = split_extension(&name);
    base.with_file_name(format!("{}_{}{}", stem, n, ext))
}

/// Ensure the directory holding `path` exists
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| GeneratorError::io(parent, e))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None,
    Gzip,
    Bzip2,
}

impl Compression {
    /// Chosen by the last extension: `.gz` or `.bz2`
    fn for_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => Self::Gzip,
            Some(ext) if ext.eq_ignore_ascii_case("bz2") => Self::Bzip2,
            _ => Self::None,
        }
    }
}

/// An open output file, plain or compressed
enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Bzip2(BzEncoder<BufWriter<File>>),
}

impl Sink {
    fn open(path: &Path, buffer_size: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| GeneratorError::io(path, e))?;

        let writer = BufWriter::with_capacity(buffer_size, file);
        Ok(match Compression::for_path(path) {
            Compression::None => Self::Plain(writer),
            Compression::Gzip => Self::Gzip(GzEncoder::new(writer, flate2::Compression::default())),
            Compression::Bzip2 => {
                Self::Bzip2(BzEncoder::new(writer, bzip2::Compression::default()))
            }
        })
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.write_all(data),
            Self::Gzip(w) => w.write_all(data),
            Self::Bzip2(w) => w.write_all(data),
        }
    }

    fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut w) => w.flush(),
            Self::Gzip(w) => w.finish()?.flush(),
            Self::Bzip2(w) => w.finish()?.flush(),
        }
    }
}

enum WriteCommand {
    /// Newline-terminated entries for the current file
    Batch(String),
    /// Close the current file and continue in this one
    Rotate(PathBuf),
}

/// Writer thread body: drains commands until the producer hangs up
fn run_worker(
    commands: crossbeam_channel::Receiver<WriteCommand>,
    mut path: PathBuf,
    mut sink: Sink,
    buffer_size: usize,
) -> Result<()> {
    for command in commands {
        match command {
            WriteCommand::Batch(data) => {
                sink.write_all(data.as_bytes())
                    .map_err(|e| GeneratorError::io(&path, e))?;
            }
            WriteCommand::Rotate(next) => {
                sink.finish().map_err(|e| GeneratorError::io(&path, e))?;
                log::debug!("Rotating output to {:?}", next);
                sink = Sink::open(&next, buffer_size)?;
                path = next;
            }
        }
    }

    sink.finish().map_err(|e| GeneratorError::io(&path, e))
}

/// Batching, backpressured, file-splitting writer
///
/// Entries are written in push order, one per line. After `split_size`
/// entries the writer moves on to the next numbered file; a new file is only
/// opened once an entry is actually destined for it.
pub struct BufferedSplitWriter {
    base: PathBuf,
    split_size: u64,
    options: WriterOptions,
    batch: String,
    batch_len: usize,
    file_index: u64,
    written: u64,
    outputs: Vec<OutputFile>,
    sender: Option<Sender<WriteCommand>>,
    worker: Option<JoinHandle<Result<()>>>,
}

impl BufferedSplitWriter {
    /// Open the first output file and start the writer thread
    pub fn new(base: PathBuf, split_size: u64, options: WriterOptions) -> Result<Self> {
        if split_size == 0 {
            return Err(GeneratorError::config("Split size must be a positive integer"));
        }
        let options = WriterOptions {
            batch_size: options.batch_size.max(1),
            queue_depth: options.queue_depth.max(1),
            buffer_size: options.buffer_size.max(1),
        };

        ensure_parent_dir(&base)?;
        let sink = Sink::open(&base, options.buffer_size)?;
        let (sender, receiver) = bounded(options.queue_depth);

        let worker_path = base.clone();
        let buffer_size = options.buffer_size;
        let worker = thread::Builder::new()
            .name("wordlist-writer".to_string())
            .spawn(move || run_worker(receiver, worker_path, sink, buffer_size))
            .map_err(|e| GeneratorError::io(&base, e))?;

        Ok(Self {
            outputs: vec![OutputFile {
                path: base.clone(),
                entries: 0,
            }],
            base,
            split_size,
            options,
            batch: String::new(),
            batch_len: 0,
            file_index: 1,
            written: 0,
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Append one entry
    ///
    /// Blocks when the writer thread is `queue_depth` batches behind.
    pub fn push(&mut self, entry: &str) -> Result<()> {
        if self.current_entries() >= self.split_size {
            self.rotate()?;
        }

        self.batch.push_str(entry);
        self.batch.push('\n');
        self.batch_len += 1;
        self.written += 1;
        if let Some(current) = self.outputs.last_mut() {
            current.entries += 1;
        }

        if self.batch_len >= self.options.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Hand the pending partial batch to the writer thread
    pub fn flush(&mut self) -> Result<()> {
        if self.batch_len == 0 {
            return Ok(());
        }
        let data = std::mem::take(&mut self.batch);
        self.batch_len = 0;
        self.send(WriteCommand::Batch(data))
    }

    /// Flush, drain the queue and wait for the writer thread
    pub fn finish(mut self) -> Result<WriteSummary> {
        self.flush()?;
        self.sender.take();
        self.join_worker()?;

        Ok(WriteSummary {
            entries_written: self.written,
            files: std::mem::take(&mut self.outputs),
        })
    }

    /// File currently receiving entries
    pub fn current_path(&self) -> &Path {
        self.outputs.last().map(|f| f.path.as_path()).unwrap_or(&self.base)
    }

    fn current_entries(&self) -> u64 {
        self.outputs.last().map_or(0, |f| f.entries)
    }

    /// 1-based index of the current file
    pub fn file_index(&self) -> u64 {
        self.file_index
    }

    /// Entries accepted so far, across all files
    pub fn written(&self) -> u64 {
        self.written
    }

    fn rotate(&mut self) -> Result<()> {
        self.flush()?;
        self.file_index += 1;
        let next = numbered_path(&self.base, self.file_index);
        self.outputs.push(OutputFile {
            path: next.clone(),
            entries: 0,
        });
        self.send(WriteCommand::Rotate(next))
    }

    fn send(&mut self, command: WriteCommand) -> Result<()> {
        let sent = match &self.sender {
            Some(sender) => sender.send(command).is_ok(),
            None => false,
        };
        if sent {
            return Ok(());
        }

        // The worker hung up; its own error explains why.
        self.sender.take();
        match self.join_worker() {
            Err(e) => Err(e),
            Ok(()) => Err(GeneratorError::WriterDisconnected(
                "writer thread exited before the stream ended".to_string(),
            )),
        }
    }

    fn join_worker(&mut self) -> Result<()> {
        match self.worker.take() {
            Some(handle) => handle.join().map_err(|_| {
                GeneratorError::WriterDisconnected("writer thread panicked".to_string())
            })?,
            None => Ok(()),
        }
    }
}

impl Drop for BufferedSplitWriter {
    fn drop(&mut self) {
        if self.worker.is_none() {
            return;
        }
        if let Err(e) = self.flush() {
            log::warn!("Failed to flush pending entries: {}", e);
        }
        self.sender.take();
        if let Err(e) = self.join_worker() {
            log::warn!("Writer thread failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn small_batches() -> WriterOptions {
        WriterOptions {
            batch_size: 2,
            queue_depth: 1,
            buffer_size: 64,
        }
    }

    #[test]
    fn test_numbered_path() {
        let base = Path::new("/out/words.txt");
        assert_eq!(numbered_path(base, 1), PathBuf::from("/out/words.txt"));
        assert_eq!(numbered_path(base, 2), PathBuf::from("/out/words_2.txt"));
        assert_eq!(numbered_path(Path::new("list"), 3), PathBuf::from("list_3"));
        assert_eq!(numbered_path(Path::new(".hidden"), 2), PathBuf::from(".hidden_2"));
        assert_eq!(
            numbered_path(Path::new("words.txt.bz2"), 2),
            PathBuf::from("words.txt_2.bz2")
        );
    }

    #[test]
    fn test_split_into_numbered_files() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("out.txt");

        let mut writer = BufferedSplitWriter::new(base.clone(), 3, small_batches()).unwrap();
        for i in 0..7 {
            writer.push(&format!("w{}", i)).unwrap();
        }
        let summary = writer.finish().unwrap();

        assert_eq!(summary.entries_written, 7);
        let out_2 = temp_dir.path().join("out_2.txt");
        let out_3 = temp_dir.path().join("out_3.txt");
        assert_eq!(summary.paths(), vec![base.as_path(), out_2.as_path(), out_3.as_path()]);
        let counts: Vec<u64> = summary.files.iter().map(|f| f.entries).collect();
        assert_eq!(counts, vec![3, 3, 1]);
        assert_eq!(fs::read_to_string(&base).unwrap(), "w0\nw1\nw2\n");
        assert_eq!(fs::read_to_string(&out_2).unwrap(), "w3\nw4\nw5\n");
        assert_eq!(fs::read_to_string(&out_3).unwrap(), "w6\n");
    }

    #[test]
    fn test_exact_split_leaves_no_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("out.txt");

        let mut writer = BufferedSplitWriter::new(base, 2, small_batches()).unwrap();
        for entry in ["a", "b", "c", "d"] {
            writer.push(entry).unwrap();
        }
        let summary = writer.finish().unwrap();

        assert_eq!(summary.files.len(), 2);
        assert!(!temp_dir.path().join("out_3.txt").exists());
    }

    #[test]
    fn test_partial_batch_flushed_on_finish() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("out.txt");

        let options = WriterOptions {
            batch_size: 1000,
            ..WriterOptions::default()
        };
        let mut writer = BufferedSplitWriter::new(base.clone(), 1_000_000, options).unwrap();
        writer.push("alpha").unwrap();
        writer.push("beta").unwrap();
        assert_eq!(writer.written(), 2);
        writer.finish().unwrap();

        assert_eq!(fs::read_to_string(&base).unwrap(), "alpha\nbeta\n");
    }

    #[test]
    fn test_drop_flushes_pending() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("out.txt");

        {
            let mut writer =
                BufferedSplitWriter::new(base.clone(), 10, WriterOptions::default()).unwrap();
            writer.push("kept").unwrap();
        }

        assert_eq!(fs::read_to_string(&base).unwrap(), "kept\n");
    }

    #[test]
    fn test_many_batches_through_small_queue() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("out.txt");

        let mut writer = BufferedSplitWriter::new(base.clone(), 100_000, small_batches()).unwrap();
        for i in 0..5_000 {
            writer.push(&i.to_string()).unwrap();
        }
        writer.finish().unwrap();

        let content = fs::read_to_string(&base).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 5_000);
        assert_eq!(lines[0], "0");
        assert_eq!(lines[4_999], "4999");
    }

    #[test]
    fn test_bzip2_output() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("words.txt.bz2");

        let mut writer = BufferedSplitWriter::new(base.clone(), 2, small_batches()).unwrap();
        for entry in ["one", "two", "three"] {
            writer.push(entry).unwrap();
        }
        let summary = writer.finish().unwrap();
        assert_eq!(summary.files[1].path, temp_dir.path().join("words.txt_2.bz2"));

        let mut decoded = String::new();
        bzip2::read::BzDecoder::new(File::open(&base).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "one\ntwo\n");
    }

    #[test]
    fn test_gzip_output() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("o.txt.gz");

        let mut writer = BufferedSplitWriter::new(base.clone(), 2, small_batches()).unwrap();
        for entry in ["0", "1", "2"] {
            writer.push(entry).unwrap();
        }
        let summary = writer.finish().unwrap();
        assert_eq!(summary.files[1].path, temp_dir.path().join("o.txt_2.gz"));

        let raw = fs::read(&base).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);

        let mut decoded = String::new();
        flate2::read::GzDecoder::new(File::open(&base).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "0\n1\n");

        let mut second = String::new();
        flate2::read::GzDecoder::new(File::open(&summary.files[1].path).unwrap())
            .read_to_string(&mut second)
            .unwrap();
        assert_eq!(second, "2\n");
    }

    #[test]
    fn test_compression_chosen_by_extension() {
        assert_eq!(Compression::for_path(Path::new("a.txt.GZ")), Compression::Gzip);
        assert_eq!(Compression::for_path(Path::new("a.bz2")), Compression::Bzip2);
        assert_eq!(Compression::for_path(Path::new("a.txt")), Compression::None);
        assert_eq!(Compression::for_path(Path::new("gz")), Compression::None);
    }

    #[test]
    fn test_zero_split_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let result =
            BufferedSplitWriter::new(temp_dir.path().join("x.txt"), 0, WriterOptions::default());
        assert!(matches!(result, Err(GeneratorError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("nested").join("out.txt");

        let mut writer =
            BufferedSplitWriter::new(base.clone(), 10, WriterOptions::default()).unwrap();
        writer.push("x").unwrap();
        writer.finish().unwrap();
        assert!(base.exists());
    }
}
