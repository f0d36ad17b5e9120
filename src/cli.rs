//! Command-line interface definition for wordlist-generator
//!
//! Provides argument parsing and conversion into the library's config types.

use crate::output::WriterOptions;
use crate::plan::{
    AppendPosition, CustomDictMode, DictionaryCombineMode, GenerationConfig, PatternType,
};
use crate::processor::RunSettings;
use crate::transform::{ProcessMode, TransformRules};

use clap::Parser;
use std::path::PathBuf;

/// High-performance wordlist generator for penetration testing
///
/// Generate candidate lists from masks, charsets, custom tokens, repeat
/// patterns and dictionaries, streamed into size-bounded output files.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wordlist-generator",
    author = "m0h1nd4",
    version,
    about = "High-performance wordlist generator for penetration testing",
    long_about = r#"
╔══════════════════════════════════════════════════════════════════════════════╗
║                         WORDLIST-GENERATOR v1.0.0                            ║
║                  Masks · Charsets · Tokens · Dictionaries                     ║
║                         For Penetration Testing                               ║
╚══════════════════════════════════════════════════════════════════════════════╝

Enumerate very large candidate spaces lazily and stream them to disk, split
into numbered files. Only one generation mode is active per run; dictionaries
can be combined with or appended to it.

EXAMPLES:
    # Every lowercase letter followed by a digit
    wordlist-generator -m "?l?d" -o out.txt

    # All strings of length 4-6 over a charset, plus special characters
    wordlist-generator -c abc123 -l 4-6 --include-special

    # Permutations of custom tokens joined with "_"
    wordlist-generator --tokens admin,2024,corp --token-mode permutation2 --connector _

    # Dictionary entries followed by two digits
    wordlist-generator -m "?d?d" -d names.txt --combine dict-first --capitalize

    # Transform every dictionary in a folder (writes new/ and done/)
    wordlist-generator -d /wordlists/ --upper --lower

MASK CHARSETS:
    ?l  lowercase a-z          ?u  uppercase A-Z
    ?d  digits 0-9             ?s  special characters
    ?a  ?l?u?d?s               ?b  binary 0-1
    ??  literal question mark
"#
)]
pub struct Args {
    /// Mask such as "?u?l?l?d?d"
    #[arg(short, long, value_name = "MASK")]
    pub mask: Option<String>,

    /// Charset for length-range generation
    #[arg(short, long, value_name = "CHARS")]
    pub charset: Option<String>,

    /// Append the special character set to the charset
    #[arg(long, default_value_t = false)]
    pub include_special: bool,

    /// Remove repeated characters from the charset
    #[arg(long, default_value_t = false)]
    pub dedup_charset: bool,

    /// Length range for charset mode: single (8) or range (1-8)
    #[arg(short, long, value_name = "LENGTH", default_value = "1-8")]
    pub length: String,

    /// Comma-separated custom tokens
    #[arg(long, value_name = "TOKENS")]
    pub tokens: Option<String>,

    /// How custom tokens are combined
    #[arg(long, value_enum, default_value_t = CustomDictMode::Combination)]
    pub token_mode: CustomDictMode,

    /// Number of tokens per candidate
    #[arg(long, value_name = "NUM", default_value_t = 3)]
    pub token_length: usize,

    /// Connector between tokens in permutation2 mode
    #[arg(long, value_name = "STR", default_value = "-")]
    pub connector: String,

    /// Charset for repeat-pattern generation
    #[arg(long, value_name = "CHARS")]
    pub pattern_charset: Option<String>,

    /// Repeat-pattern type
    #[arg(long, value_enum, default_value_t = PatternType::Repeat)]
    pub pattern_type: PatternType,

    /// Characters per pattern
    #[arg(long, value_name = "NUM", default_value_t = 3)]
    pub pattern_length: usize,

    /// How often each pattern element is repeated
    #[arg(long, value_name = "NUM", default_value_t = 2)]
    pub repeat_count: usize,

    /// Dictionary file, or a folder to batch-process
    #[arg(short, long, value_name = "PATH")]
    pub dictionary: Option<PathBuf>,

    /// Second dictionary for dict-ab / dict-ba
    #[arg(long, value_name = "PATH")]
    pub dictionary_b: Option<PathBuf>,

    /// Cross-product between the dictionary and the generator
    #[arg(long, value_enum, default_value_t = DictionaryCombineMode::None)]
    pub combine: DictionaryCombineMode,

    /// Emit the dictionary before or after the generator output
    #[arg(long, value_enum, default_value_t = AppendPosition::None)]
    pub append: AppendPosition,

    /// File extensions to process in folder mode (default: txt)
    #[arg(long, value_name = "EXT", default_value = "txt")]
    pub extensions: String,

    /// Add an uppercase variant of each dictionary entry
    #[arg(long, default_value_t = false)]
    pub upper: bool,

    /// Add a lowercase variant
    #[arg(long, default_value_t = false)]
    pub lower: bool,

    /// Add a capitalized variant
    #[arg(long, default_value_t = false)]
    pub capitalize: bool,

    /// Add a reversed variant
    #[arg(long, default_value_t = false)]
    pub reverse: bool,

    /// Characters to remove from the start
    #[arg(long, value_name = "NUM", default_value_t = 0)]
    pub remove_start: usize,

    /// Characters to remove from the end
    #[arg(long, value_name = "NUM", default_value_t = 0)]
    pub remove_end: usize,

    /// Emit the start-trimmed variant
    #[arg(long, default_value_t = false)]
    pub remove_start_independent: bool,

    /// Emit the end-trimmed variant
    #[arg(long, default_value_t = false)]
    pub remove_end_independent: bool,

    /// Emit the variant trimmed at both ends
    #[arg(long, default_value_t = false)]
    pub remove_combined: bool,

    /// Prefix to add
    #[arg(long, value_name = "STR", default_value = "")]
    pub prefix: String,

    /// Suffix to add
    #[arg(long, value_name = "STR", default_value = "")]
    pub suffix: String,

    /// Emit the prefixed variant
    #[arg(long, default_value_t = false)]
    pub prefix_independent: bool,

    /// Emit the suffixed variant
    #[arg(long, default_value_t = false)]
    pub suffix_independent: bool,

    /// Emit the variant with both prefix and suffix
    #[arg(long, default_value_t = false)]
    pub add_combined: bool,

    /// Emit each entry repeated this many times
    #[arg(long, value_name = "NUM", default_value_t = 1)]
    pub repeat_word: usize,

    /// Emit each entry repeated this many times, space-separated
    #[arg(long, value_name = "NUM", default_value_t = 1)]
    pub repeat_word_space: usize,

    /// Repeat every transformed variant as well
    #[arg(long, default_value_t = false)]
    pub repeat_processed: bool,

    /// Repetitions for the repeat-processed pass
    #[arg(long, value_name = "NUM", default_value_t = 2)]
    pub repeat_processed_count: usize,

    /// Space-separated repetitions for the repeat-processed pass
    #[arg(long, value_name = "NUM", default_value_t = 2)]
    pub repeat_processed_space_count: usize,

    /// How the transform rules are applied
    #[arg(long, value_enum, default_value_t = ProcessMode::Independent)]
    pub process_mode: ProcessMode,

    /// Output file; later files are numbered (out_2.txt, ...). A .gz or .bz2 suffix compresses
    #[arg(short, long, value_name = "FILE", default_value = "wordlist.txt")]
    pub output: PathBuf,

    /// Entries per output file (e.g. "1000000", "500K", "1M")
    #[arg(short, long, value_name = "COUNT", default_value = "1000000")]
    pub split_size: String,

    /// Entries per write batch
    #[arg(long, value_name = "COUNT", default_value = "10000")]
    pub batch_size: String,

    /// Write batches allowed in flight before generation blocks
    #[arg(long, value_name = "NUM", default_value_t = 8)]
    pub queue_depth: usize,

    /// Buffer size for file operations (default: 8MB)
    #[arg(long, value_name = "SIZE", default_value = "8MB")]
    pub buffer_size: String,

    /// Entries between progress updates
    #[arg(long, value_name = "COUNT", default_value = "50000")]
    pub progress_interval: String,

    /// Write a progress checkpoint to this file during the run
    #[arg(long, value_name = "FILE")]
    pub checkpoint: Option<PathBuf>,

    /// Number of threads for dictionary scanning (default: auto-detect)
    #[arg(short = 't', long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Quiet mode - minimal output
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Verbose mode - detailed logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Dry run - show the estimate without writing files
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

impl Args {
    /// Parse the length argument: "8" or "1-8"
    pub fn parse_length_range(&self) -> anyhow::Result<(usize, usize)> {
        let part = self.length.trim();

        if let Some((start, end)) = part.split_once('-') {
            let start: usize = start
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid start value in range: '{}'", start))?;
            let end: usize = end
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid end value in range: '{}'", end))?;

            if start > end {
                anyhow::bail!("Invalid range: start ({}) must be <= end ({})", start, end);
            }
            Ok((start, end))
        } else {
            let len: usize = part
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid length value: '{}'. Use 8 or 1-8", part))?;
            Ok((len, len))
        }
    }

    /// Parse buffer size string to bytes
    pub fn parse_buffer_size(&self) -> anyhow::Result<usize> {
        parse_size(&self.buffer_size)
    }

    /// Parse file extensions to process
    pub fn get_extensions(&self) -> Vec<String> {
        self.extensions
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn generation_config(&self) -> anyhow::Result<GenerationConfig> {
        Ok(GenerationConfig {
            mask: self.mask.clone(),
            charset: self.charset.clone(),
            include_special: self.include_special,
            dedup_charset: self.dedup_charset,
            length_range: Some(self.parse_length_range()?),
            tokens: self.tokens.clone(),
            token_mode: self.token_mode,
            token_length: self.token_length,
            connector: self.connector.clone(),
            pattern_charset: self.pattern_charset.clone(),
            pattern_type: self.pattern_type,
            pattern_length: self.pattern_length,
            repeat_count: self.repeat_count,
            dictionary: self.dictionary.clone(),
            secondary_dictionary: self.dictionary_b.clone(),
            combine: self.combine,
            append: self.append,
        })
    }

    pub fn transform_rules(&self) -> TransformRules {
        TransformRules {
            uppercase: self.upper,
            lowercase: self.lower,
            capitalize: self.capitalize,
            reverse: self.reverse,
            remove_start: self.remove_start,
            remove_end: self.remove_end,
            remove_start_independent: self.remove_start_independent,
            remove_end_independent: self.remove_end_independent,
            remove_combined: self.remove_combined,
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            prefix_independent: self.prefix_independent,
            suffix_independent: self.suffix_independent,
            add_combined: self.add_combined,
            repeat_count: self.repeat_word,
            repeat_space_count: self.repeat_word_space,
            repeat_processed: self.repeat_processed,
            repeat_processed_count: self.repeat_processed_count,
            repeat_processed_space_count: self.repeat_processed_space_count,
            mode: self.process_mode,
        }
    }

    pub fn run_settings(&self) -> anyhow::Result<RunSettings> {
        let split_size = parse_count(&self.split_size)?;
        if split_size == 0 {
            anyhow::bail!("Split size must be a positive integer");
        }

        Ok(RunSettings {
            output: self.output.clone(),
            split_size,
            writer: WriterOptions {
                batch_size: parse_count(&self.batch_size)?.max(1) as usize,
                queue_depth: self.queue_depth.max(1),
                buffer_size: self.parse_buffer_size()?,
            },
            extensions: self.get_extensions(),
            checkpoint: self.checkpoint.clone(),
            dry_run: self.dry_run,
        })
    }

    pub fn parse_progress_interval(&self) -> anyhow::Result<u64> {
        Ok(parse_count(&self.progress_interval)?.max(1))
    }
}

/// Parse human-readable size string to bytes
fn parse_size(size_str: &str) -> anyhow::Result<usize> {
    let size_str = size_str.trim().to_uppercase();

    let (num_str, multiplier) = if let Some(n) = size_str.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = size_str.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = size_str.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = size_str.strip_suffix('B') {
        (n, 1)
    } else {
        (size_str.as_str(), 1)
    };

    let num: usize = num_str
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size format: '{}'", size_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Size too large: '{}'", size_str))
}

/// Parse a count with an optional decimal suffix: "500", "10K", "1M", "2G"
fn parse_count(count_str: &str) -> anyhow::Result<u64> {
    let count_str = count_str.trim().replace('_', "").to_uppercase();

    let (num_str, multiplier) = if let Some(n) = count_str.strip_suffix('G') {
        (n, 1_000_000_000)
    } else if let Some(n) = count_str.strip_suffix('M') {
        (n, 1_000_000)
    } else if let Some(n) = count_str.strip_suffix('K') {
        (n, 1_000)
    } else {
        (count_str.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid count format: '{}'", count_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Count too large: '{}'", count_str))
}
