//! Progress reporting and terminal output
//!
//! The generation core reports through the [`ProgressReporter`] trait; the
//! binary plugs in an indicatif bar, tests use [`NullReporter`] or a recorder.
//! Also holds the colored print helpers used for the pentesting aesthetic.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::Level;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Print the application banner
pub fn print_banner() {
    let banner = r#"
╔══════════════════════════════════════════════════════════════════════════════╗
║                                                                              ║
║   ██╗    ██╗ ██████╗ ██████╗ ██████╗ ██╗     ██╗███████╗████████╗           ║
║   ██║    ██║██╔═══██╗██╔══██╗██╔══██╗██║     ██║██╔════╝╚══██╔══╝           ║
║   ██║ █╗ ██║██║   ██║██████╔╝██║  ██║██║     ██║███████╗   ██║              ║
║   ██║███╗██║██║   ██║██╔══██╗██║  ██║██║     ██║╚════██║   ██║              ║
║   ╚███╔███╔╝╚██████╔╝██║  ██║██████╔╝███████╗██║███████║   ██║              ║
║    ╚══╝╚══╝  ╚═════╝ ╚═╝  ╚═╝╚═════╝ ╚══════╝╚═╝╚══════╝   ╚═╝              ║
║                                                                              ║
║    ██████╗ ███████╗███╗   ██╗                                                ║
║   ██╔════╝ ██╔════╝████╗  ██║                                                ║
║   ██║  ███╗█████╗  ██╔██╗ ██║                                                ║
║   ██║   ██║██╔══╝  ██║╚██╗██║                                                ║
║   ╚██████╔╝███████╗██║ ╚████║                                                ║
║    ╚═════╝ ╚══════╝╚═╝  ╚═══╝                                                ║
║                                                                              ║
║                  Masks · Charsets · Tokens · Dictionaries                    ║
║                         For Penetration Testing                               ║
║                                                              v1.0.0          ║
╚══════════════════════════════════════════════════════════════════════════════╝
"#;

    println!("{}", banner.green());
}

/// Print a section header
pub fn print_header(text: &str) {
    println!("\n{} {}", "▶".green(), text.green().bold());
}

/// Print an info message
pub fn print_info(text: &str) {
    println!("  {} {}", "ℹ".cyan(), text);
}

/// Print a success message
pub fn print_success(text: &str) {
    println!("  {} {}", "✔".green(), text.green());
}

/// Print a warning message
pub fn print_warning(text: &str) {
    println!("  {} {}", "⚠".yellow(), text.yellow());
}

/// Print an error message
pub fn print_error(text: &str) {
    eprintln!("  {} {}", "✖".red(), text.red());
}

/// Print a bullet point
pub fn print_bullet(text: &str) {
    println!("  {} {}", "•".green(), text);
}

/// Create a styled progress bar
pub fn create_progress_bar(total: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);

    if let Ok(style) = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.green/dim}] {pos}/{len} ({percent}%) {per_sec} {msg}",
        )
    {
        pb.set_style(style.progress_chars("█▓░"));
    }

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// A progress event: `(processedCount, estimatedTotal, currentFilePath)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub processed: u64,
    pub estimated_total: BigUint,
    pub current_file: PathBuf,
}

impl ProgressEvent {
    /// `processed / estimated_total`, clamped to `[0, 1]`
    pub fn fraction(&self) -> f64 {
        if self.estimated_total.is_zero() {
            return 1.0;
        }
        let total = self.estimated_total.to_f64().unwrap_or(f64::INFINITY);
        (self.processed as f64 / total).min(1.0)
    }
}

/// Sink for progress and log events coming out of a run
pub trait ProgressReporter: Send + Sync {
    fn progress(&self, event: &ProgressEvent);

    fn log(&self, level: Level, message: &str) {
        log::log!(level, "{}", message);
    }

    /// Called once when the run stops, cancelled or not
    fn finish(&self, _cancelled: bool) {}
}

/// Discards progress, forwards log events to the `log` facade
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn progress(&self, _event: &ProgressEvent) {}
}

/// Drives an indicatif bar from progress events
pub struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    pub fn new(length: u64, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            create_progress_bar(length, "Generating...")
        };
        Self { bar }
    }
}

impl ProgressReporter for BarReporter {
    fn progress(&self, event: &ProgressEvent) {
        self.bar.set_length(clamp_u64(&event.estimated_total));
        self.bar.set_position(event.processed);
        if let Some(name) = event.current_file.file_name() {
            self.bar.set_message(name.to_string_lossy().into_owned());
        }
    }

    fn log(&self, level: Level, message: &str) {
        self.bar.suspend(|| log::log!(level, "{}", message));
    }

    fn finish(&self, cancelled: bool) {
        if cancelled {
            self.bar.abandon_with_message("Stopped".yellow().to_string());
        } else {
            self.bar.finish_with_message("Complete".green().to_string());
        }
    }
}

/// Decides when a progress event is due
///
/// Events fire every `interval` entries rather than on every entry.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    interval: u64,
    estimated_total: BigUint,
}

impl ProgressTracker {
    pub fn new(interval: u64, estimated_total: BigUint) -> Self {
        Self {
            interval: interval.max(1),
            estimated_total,
        }
    }

    #[inline]
    pub fn is_due(&self, processed: u64) -> bool {
        processed > 0 && processed % self.interval == 0
    }

    pub fn event(&self, processed: u64, current_file: &Path) -> ProgressEvent {
        ProgressEvent {
            processed,
            estimated_total: self.estimated_total.clone(),
            current_file: current_file.to_path_buf(),
        }
    }
}

/// Snapshot written to the checkpoint file
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckpointState {
    pub processed: u64,
    /// Decimal string; the estimate can exceed every JSON number type
    pub total: String,
    pub file_index: u64,
    pub current_file: PathBuf,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
}

impl CheckpointState {
    pub fn from_event(event: &ProgressEvent, file_index: u64) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            processed: event.processed,
            total: event.estimated_total.to_string(),
            file_index,
            current_file: event.current_file.clone(),
            timestamp,
        }
    }
}

/// Coarse JSON progress checkpoint
///
/// Overwritten on every progress event, removed after a clean run. It records
/// how far a run got; it is not used to resume.
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Failures are logged; a checkpoint never stops a run
    pub fn save(&self, event: &ProgressEvent, file_index: u64) {
        let state = CheckpointState::from_event(event, file_index);
        if let Err(e) = self.write(&state) {
            log::warn!("Failed to save checkpoint {:?}: {}", self.path, e);
        }
    }

    fn write(&self, state: &CheckpointState) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, state)?;
        writer.flush()
    }

    pub fn clear(&self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                log::warn!("Failed to remove checkpoint {:?}: {}", self.path, e);
            }
        }
    }
}

fn clamp_u64(n: &BigUint) -> u64 {
    n.to_u64().unwrap_or(u64::MAX)
}

/// Format a number with thousand separators
pub fn format_number<N: ToString>(n: N) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0u64), "0");
        assert_eq!(format_number(123u64), "123");
        assert_eq!(format_number(1234u64), "1,234");
        assert_eq!(format_number(1234567u128), "1,234,567");
        assert_eq!(format_number(BigUint::from(1_000_000u32)), "1,000,000");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30.0s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m");
    }

    #[test]
    fn test_tracker_cadence() {
        let tracker = ProgressTracker::new(100, BigUint::from(1000u32));

        assert!(!tracker.is_due(0));
        assert!(!tracker.is_due(99));
        assert!(tracker.is_due(100));
        assert!(tracker.is_due(300));

        let event = tracker.event(250, Path::new("out.txt"));
        assert!((event.fraction() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fraction_zero_total() {
        let event = ProgressEvent {
            processed: 0,
            estimated_total: BigUint::zero(),
            current_file: PathBuf::from("x"),
        };
        assert_eq!(event.fraction(), 1.0);
    }

    #[test]
    fn test_fraction_huge_total() {
        let event = ProgressEvent {
            processed: 10,
            estimated_total: BigUint::from(u128::MAX) * 94u32,
            current_file: PathBuf::from("x"),
        };
        assert!(event.fraction() < 1e-30);
        assert_eq!(clamp_u64(&event.estimated_total), u64::MAX);
    }

    #[test]
    fn test_checkpoint_save_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let checkpoint = Checkpoint::new(temp_dir.path().join("progress.json"));
        let event = ProgressEvent {
            processed: 50,
            estimated_total: BigUint::from(200u32),
            current_file: PathBuf::from("out_2.txt"),
        };

        checkpoint.save(&event, 2);
        let content = fs::read_to_string(checkpoint.path()).unwrap();
        let state: CheckpointState = serde_json::from_str(&content).unwrap();
        assert_eq!(state.processed, 50);
        assert_eq!(state.total, "200");
        assert_eq!(state.file_index, 2);
        assert_eq!(state.current_file, PathBuf::from("out_2.txt"));
        assert!(state.timestamp > 0);

        checkpoint.clear();
        assert!(!checkpoint.path().exists());
    }

    #[test]
    fn test_checkpoint_total_beyond_u64() {
        let temp_dir = TempDir::new().unwrap();
        let checkpoint = Checkpoint::new(temp_dir.path().join("progress.json"));
        let total = BigUint::from(u128::MAX) * 94u32;
        let event = ProgressEvent {
            processed: 1,
            estimated_total: total.clone(),
            current_file: PathBuf::from("out.txt"),
        };

        checkpoint.save(&event, 1);
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(checkpoint.path()).unwrap()).unwrap();
        assert_eq!(value["total"], serde_json::Value::String(total.to_string()));
    }
}
