//! Core generation engine
//!
//! Resolves a configuration into a plan, loads the dictionaries it needs,
//! estimates the output size and drives the enumerator into the split writer.

use crate::context::RunContext;
use crate::dictionary::{DictionarySource, FolderSummary};
use crate::error::{GeneratorError, Result};
use crate::estimate::{expected_files, CountEstimator, LARGE_ESTIMATE};
use crate::generator::{CombinationEnumerator, DictionarySet};
use crate::output::{BufferedSplitWriter, WriteSummary, WriterOptions};
use crate::plan::{CombinationPlan, GenerationConfig};
use crate::progress::{
    format_duration, format_number, print_bullet, print_header, print_info, print_success,
    print_warning, Checkpoint, ProgressTracker,
};
use crate::transform::TransformRules;

use colored::*;
use log::Level;
use num_bigint::BigUint;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Default entries per output file
pub const DEFAULT_SPLIT_SIZE: u64 = 1_000_000;

/// Where and how a run writes its output
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Base output path; later files are numbered from it
    pub output: PathBuf,
    pub split_size: u64,
    pub writer: WriterOptions,
    /// Extension filter for folder mode
    pub extensions: Vec<String>,
    pub checkpoint: Option<PathBuf>,
    pub dry_run: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            output: PathBuf::from("wordlist.txt"),
            split_size: DEFAULT_SPLIT_SIZE,
            writer: WriterOptions::default(),
            extensions: vec!["txt".to_string()],
            checkpoint: None,
            dry_run: false,
        }
    }
}

/// Summary of a completed generation run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub mode: &'static str,
    pub estimated: BigUint,
    pub written: WriteSummary,
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// What a run did
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Generated(GenerationReport),
    FolderProcessed(FolderSummary),
    DryRun {
        mode: &'static str,
        estimated: BigUint,
        expected_files: BigUint,
        charset_preview: Option<String>,
    },
}

/// Main generator
pub struct Generator {
    config: GenerationConfig,
    rules: TransformRules,
    settings: RunSettings,
}

impl Generator {
    pub fn new(config: GenerationConfig, rules: TransformRules, settings: RunSettings) -> Self {
        Self {
            config,
            rules,
            settings,
        }
    }

    /// Run to completion or cancellation
    pub fn run(&self, ctx: &RunContext) -> Result<RunOutcome> {
        if let Some(dir) = self.config.dictionary.as_deref().filter(|p| p.is_dir()) {
            return self.run_folder(dir, ctx);
        }

        let plan = CombinationPlan::from_config(&self.config)?;
        let mode = plan.primary.name();
        ctx.reporter
            .log(Level::Debug, &format!("Plan: {} with {:?}", mode, plan.wrapping));

        let dictionaries = self.load_dictionaries(&plan, ctx)?;
        let estimated = CountEstimator::estimate(&plan, &dictionaries);
        if estimated > BigUint::from(LARGE_ESTIMATE) {
            ctx.reporter.log(
                Level::Warn,
                &format!(
                    "Estimated {} candidates; this run will take a very long time",
                    format_number(&estimated)
                ),
            );
        }

        if self.settings.dry_run {
            return Ok(RunOutcome::DryRun {
                mode,
                expected_files: expected_files(&estimated, self.settings.split_size),
                estimated,
                charset_preview: plan.charset().map(|c| c.preview()),
            });
        }

        let enumerator = CombinationEnumerator::new(plan, dictionaries)?;
        self.write_candidates(&enumerator, estimated, ctx).map(RunOutcome::Generated)
    }

    fn run_folder(&self, dir: &Path, ctx: &RunContext) -> Result<RunOutcome> {
        ctx.reporter.log(
            Level::Info,
            &format!("Folder mode: processing dictionaries in {:?}", dir),
        );
        let source = DictionarySource::new(&self.rules, ctx);
        let summary = source.process_folder(dir, &self.settings.extensions)?;
        ctx.reporter.finish(ctx.is_cancelled());
        Ok(RunOutcome::FolderProcessed(summary))
    }

    fn load_dictionaries(&self, plan: &CombinationPlan, ctx: &RunContext) -> Result<DictionarySet> {
        if !plan.uses_dictionary() {
            return Ok(DictionarySet::default());
        }

        let source = DictionarySource::new(&self.rules, ctx);
        let load = |path: Option<&Path>, label: &str| -> Result<_> {
            let path = path
                .ok_or_else(|| GeneratorError::config(format!("{} dictionary is not set", label)))?;
            let entries = source.load(path)?;
            if entries.is_empty() && !ctx.is_cancelled() {
                return Err(GeneratorError::config(format!(
                    "{} dictionary {:?} has no entries",
                    label, path
                )));
            }
            Ok(entries)
        };

        let primary = load(plan.dictionary.as_deref(), "Primary")?;
        let secondary = if plan.uses_secondary() {
            Some(load(plan.secondary_dictionary.as_deref(), "Second")?)
        } else {
            None
        };

        Ok(DictionarySet::new(primary, secondary))
    }

    fn write_candidates(
        &self,
        enumerator: &CombinationEnumerator,
        estimated: BigUint,
        ctx: &RunContext,
    ) -> Result<GenerationReport> {
        let start = Instant::now();
        let mut writer = BufferedSplitWriter::new(
            self.settings.output.clone(),
            self.settings.split_size,
            self.settings.writer,
        )?;
        let tracker = ProgressTracker::new(ctx.progress_interval, estimated.clone());
        let checkpoint = self.settings.checkpoint.clone().map(Checkpoint::new);

        let mut processed = 0u64;
        for candidate in enumerator.enumerate(&ctx.token) {
            writer.push(&candidate)?;
            processed += 1;

            if tracker.is_due(processed) {
                let event = tracker.event(processed, writer.current_path());
                ctx.reporter.progress(&event);
                if let Some(checkpoint) = &checkpoint {
                    checkpoint.save(&event, writer.file_index());
                }
            }
        }

        let last_path = writer.current_path().to_path_buf();
        let written = writer.finish()?;
        let cancelled = ctx.is_cancelled();

        ctx.reporter.progress(&tracker.event(processed, &last_path));
        ctx.reporter.finish(cancelled);

        if cancelled {
            ctx.reporter.log(
                Level::Warn,
                &format!("Generation stopped after {} candidates", format_number(processed)),
            );
        } else if let Some(checkpoint) = &checkpoint {
            checkpoint.clear();
        }

        Ok(GenerationReport {
            mode: enumerator.plan().primary.name(),
            estimated,
            written,
            cancelled,
            elapsed: start.elapsed(),
        })
    }
}

/// Print the human-readable summary of a run
pub fn print_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Generated(report) => {
            print_header("Generation Summary");
            print_info(&format!("Mode:            {}", report.mode));
            print_info(&format!("Estimated:       {}", format_number(&report.estimated)));
            print_info(&format!(
                "Written:         {}",
                format_number(report.written.entries_written).green()
            ));
            print_info(&format!("Time elapsed:    {}", format_duration(report.elapsed)));

            let secs = report.elapsed.as_secs_f64();
            if secs > 0.0 {
                let rate = report.written.entries_written as f64 / secs;
                print_info(&format!("Speed:           {}/s", format_number(rate as u64)));
            }

            print_header("Output Files");
            for file in &report.written.files {
                print_bullet(&format!(
                    "{:?} ({} entries)",
                    file.path,
                    format_number(file.entries)
                ));
            }

            if report.cancelled {
                print_warning(
                    "Generation was cancelled; output files hold everything produced before the stop",
                );
            } else {
                print_success("Generation complete!");
            }
        }
        RunOutcome::FolderProcessed(summary) => {
            print_header("Folder Summary");
            print_info(&format!("Files found:     {}", summary.files_found));
            print_info(&format!("Processed:       {}", summary.files_processed));
            print_info(&format!("Entries written: {}", format_number(summary.entries_written)));
            for output in &summary.outputs {
                print_bullet(&format!("{:?}", output));
            }
            if summary.files_failed > 0 {
                print_warning(&format!("{} files failed", summary.files_failed));
            } else {
                print_success("Folder processing complete!");
            }
        }
        RunOutcome::DryRun {
            mode,
            estimated,
            expected_files,
            charset_preview,
        } => {
            print_header("Dry Run");
            print_info(&format!("Mode:            {}", mode));
            print_info(&format!("Estimated:       {}", format_number(estimated)));
            print_info(&format!("Output files:    {}", format_number(expected_files)));
            if let Some(preview) = charset_preview {
                print_info(&format!("Charset:         {}", preview));
            }
            print_warning("Dry run - no files were written");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancellationToken;
    use crate::plan::{AppendPosition, DictionaryCombineMode};
    use crate::progress::{CheckpointState, ProgressEvent, ProgressReporter};
    use parking_lot::Mutex;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<ProgressEvent>>,
        finished: Mutex<Option<bool>>,
    }

    impl ProgressReporter for Recorder {
        fn progress(&self, event: &ProgressEvent) {
            self.events.lock().push(event.clone());
        }

        fn finish(&self, cancelled: bool) {
            *self.finished.lock() = Some(cancelled);
        }
    }

    /// Cancels the run once a given number of entries went out
    struct CancelAt {
        after: u64,
        token: CancellationToken,
    }

    impl ProgressReporter for CancelAt {
        fn progress(&self, event: &ProgressEvent) {
            if event.processed >= self.after {
                self.token.cancel();
            }
        }
    }

    fn base_config() -> GenerationConfig {
        GenerationConfig {
            token_length: 3,
            connector: "-".to_string(),
            pattern_length: 3,
            repeat_count: 2,
            ..Default::default()
        }
    }

    fn settings(dir: &TempDir, split_size: u64) -> RunSettings {
        RunSettings {
            output: dir.path().join("out.txt"),
            split_size,
            writer: WriterOptions {
                batch_size: 7,
                queue_depth: 2,
                buffer_size: 1024,
            },
            ..Default::default()
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_mask_run_splits_files() {
        let temp_dir = TempDir::new().unwrap();
        let config = GenerationConfig {
            mask: Some("?l?d".to_string()),
            ..base_config()
        };
        let recorder = Arc::new(Recorder::default());
        let ctx = RunContext::new(recorder.clone()).with_progress_interval(100);

        let outcome = Generator::new(config, TransformRules::default(), settings(&temp_dir, 100))
            .run(&ctx)
            .unwrap();

        let RunOutcome::Generated(report) = outcome else {
            panic!("expected a generation run");
        };
        assert_eq!(report.estimated, BigUint::from(260u32));
        assert_eq!(report.written.entries_written, 260);
        assert!(!report.cancelled);
        assert_eq!(report.written.files.len(), 3);

        let first = read_lines(&temp_dir.path().join("out.txt"));
        assert_eq!(first.len(), 100);
        assert_eq!(first[0], "a0");
        let last = read_lines(&temp_dir.path().join("out_3.txt"));
        assert_eq!(last.len(), 60);
        assert_eq!(last.last().map(String::as_str), Some("z9"));

        let events = recorder.events.lock();
        let processed: Vec<u64> = events.iter().map(|e| e.processed).collect();
        assert_eq!(processed, vec![100, 200, 260]);
        assert_eq!(*recorder.finished.lock(), Some(false));
    }

    #[test]
    fn test_cancellation_keeps_partial_output() {
        let temp_dir = TempDir::new().unwrap();
        let config = GenerationConfig {
            mask: Some("?a?a?a".to_string()),
            ..base_config()
        };
        let token = CancellationToken::new();
        let reporter = Arc::new(CancelAt {
            after: 50,
            token: token.clone(),
        });
        let ctx = RunContext::new(reporter)
            .with_token(token)
            .with_progress_interval(50);

        let settings = settings(&temp_dir, 1_000_000);
        let outcome = Generator::new(config, TransformRules::default(), settings)
            .run(&ctx)
            .unwrap();

        let RunOutcome::Generated(report) = outcome else {
            panic!("expected a generation run");
        };
        assert!(report.cancelled);
        assert_eq!(report.written.entries_written, 50);
        assert_eq!(read_lines(&temp_dir.path().join("out.txt")).len(), 50);
    }

    #[test]
    fn test_dictionary_append_after() {
        let temp_dir = TempDir::new().unwrap();
        let dict = temp_dir.path().join("dict.txt");
        fs::write(&dict, "admin\nadmin\nroot\n").unwrap();

        let config = GenerationConfig {
            charset: Some("x".to_string()),
            length_range: Some((1, 2)),
            dictionary: Some(dict),
            append: AppendPosition::After,
            ..base_config()
        };
        let outcome = Generator::new(config, TransformRules::default(), settings(&temp_dir, 1000))
            .run(&RunContext::default())
            .unwrap();

        let RunOutcome::Generated(report) = outcome else {
            panic!("expected a generation run");
        };
        assert_eq!(report.estimated, BigUint::from(4u32));
        let lines = read_lines(&temp_dir.path().join("out.txt"));
        assert_eq!(&lines[..2], &["x".to_string(), "xx".to_string()]);
        let mut tail = lines[2..].to_vec();
        tail.sort();
        assert_eq!(tail, vec!["admin", "root"]);
    }

    #[test]
    fn test_dict_first_with_transforms() {
        let temp_dir = TempDir::new().unwrap();
        let dict = temp_dir.path().join("dict.txt");
        fs::write(&dict, "pass\n").unwrap();

        let config = GenerationConfig {
            mask: Some("?d".to_string()),
            dictionary: Some(dict),
            combine: DictionaryCombineMode::DictFirst,
            ..base_config()
        };
        let rules = TransformRules {
            uppercase: true,
            ..Default::default()
        };
        let outcome = Generator::new(config, rules, settings(&temp_dir, 1000))
            .run(&RunContext::default())
            .unwrap();

        let RunOutcome::Generated(report) = outcome else {
            panic!("expected a generation run");
        };
        assert_eq!(report.estimated, BigUint::from(10u32));
        let lines = read_lines(&temp_dir.path().join("out.txt"));
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "PASS0");
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = GenerationConfig {
            charset: Some("cba".to_string()),
            length_range: Some((1, 3)),
            ..base_config()
        };
        let settings = RunSettings {
            dry_run: true,
            ..settings(&temp_dir, 10)
        };

        let outcome = Generator::new(config, TransformRules::default(), settings)
            .run(&RunContext::default())
            .unwrap();

        match outcome {
            RunOutcome::DryRun {
                estimated,
                expected_files,
                charset_preview,
                ..
            } => {
                assert_eq!(estimated, BigUint::from(39u32));
                assert_eq!(expected_files, BigUint::from(4u32));
                assert_eq!(charset_preview.as_deref(), Some("abc"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!temp_dir.path().join("out.txt").exists());
    }

    #[test]
    fn test_empty_dictionary_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let dict = temp_dir.path().join("empty.txt");
        fs::write(&dict, "\n  \n").unwrap();

        let config = GenerationConfig {
            dictionary: Some(dict),
            ..base_config()
        };
        let result = Generator::new(config, TransformRules::default(), settings(&temp_dir, 10))
            .run(&RunContext::default());
        assert!(matches!(result, Err(GeneratorError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_folder_mode_is_terminal() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("dicts");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("a.txt"), "one\ntwo\n").unwrap();

        let config = GenerationConfig {
            mask: Some("?d".to_string()),
            dictionary: Some(folder.clone()),
            ..base_config()
        };
        let outcome = Generator::new(config, TransformRules::default(), settings(&temp_dir, 10))
            .run(&RunContext::default())
            .unwrap();

        match outcome {
            RunOutcome::FolderProcessed(summary) => {
                assert_eq!(summary.files_processed, 1);
                assert_eq!(summary.entries_written, 2);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!temp_dir.path().join("out.txt").exists());
        assert!(folder.join("done").join("a.txt").exists());
    }

    #[test]
    fn test_checkpoint_removed_after_clean_run() {
        let temp_dir = TempDir::new().unwrap();
        let checkpoint = temp_dir.path().join("progress.json");
        let config = GenerationConfig {
            mask: Some("?d?d".to_string()),
            ..base_config()
        };
        let settings = RunSettings {
            checkpoint: Some(checkpoint.clone()),
            ..settings(&temp_dir, 1000)
        };
        let ctx = RunContext::default().with_progress_interval(10);

        Generator::new(config, TransformRules::default(), settings)
            .run(&ctx)
            .unwrap();
        assert!(!checkpoint.exists());
    }

    #[test]
    fn test_checkpoint_kept_after_cancel() {
        let temp_dir = TempDir::new().unwrap();
        let checkpoint = temp_dir.path().join("progress.json");
        let config = GenerationConfig {
            mask: Some("?d?d?d".to_string()),
            ..base_config()
        };
        let settings = RunSettings {
            checkpoint: Some(checkpoint.clone()),
            ..settings(&temp_dir, 1000)
        };
        let token = CancellationToken::new();
        let ctx = RunContext::new(Arc::new(CancelAt {
            after: 20,
            token: token.clone(),
        }))
        .with_token(token)
        .with_progress_interval(10);

        Generator::new(config, TransformRules::default(), settings)
            .run(&ctx)
            .unwrap();

        let content = fs::read_to_string(&checkpoint).unwrap();
        let state: CheckpointState = serde_json::from_str(&content).unwrap();
        assert_eq!(state.processed, 20);
        assert_eq!(state.total, "1000");
        assert_eq!(state.file_index, 1);
        assert_eq!(state.current_file, temp_dir.path().join("out.txt"));
    }

    #[test]
    fn test_dry_run_counts_beyond_u128() {
        let temp_dir = TempDir::new().unwrap();
        let config = GenerationConfig {
            mask: Some("?a".repeat(20)),
            ..base_config()
        };
        let settings = RunSettings {
            dry_run: true,
            ..settings(&temp_dir, 1_000_000)
        };

        let outcome = Generator::new(config, TransformRules::default(), settings)
            .run(&RunContext::default())
            .unwrap();

        let RunOutcome::DryRun { estimated, expected_files, .. } = outcome else {
            panic!("expected a dry run");
        };
        assert_eq!(estimated, num_traits::Pow::pow(&BigUint::from(94u32), 20usize));
        assert_eq!(expected_files, (&estimated + 999_999u32) / 1_000_000u32);
    }

    #[test]
    fn test_pure_dictionary_ignores_append() {
        let temp_dir = TempDir::new().unwrap();
        let dict = temp_dir.path().join("dict.txt");
        fs::write(&dict, "alpha
beta
").unwrap();

        let config = GenerationConfig {
            dictionary: Some(dict),
            append: AppendPosition::Before,
            ..base_config()
        };
        let outcome = Generator::new(config, TransformRules::default(), settings(&temp_dir, 100))
            .run(&RunContext::default())
            .unwrap();

        let RunOutcome::Generated(report) = outcome else {
            panic!("expected a generation run");
        };
        assert_eq!(report.mode, "dictionary");
        assert_eq!(report.estimated, BigUint::from(2u32));
        let mut lines = read_lines(&temp_dir.path().join("out.txt"));
        lines.sort();
        assert_eq!(lines, vec!["alpha", "beta"]);
    }
}
