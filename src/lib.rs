//! # Wordlist Generator
//!
//! High-performance candidate list generation for penetration testing.
//!
//! ## Features
//!
//! - **Masks**: hashcat-style masks such as `?u?l?l?d?d`
//! - **Charsets**: every string over a charset within a length range
//! - **Custom tokens**: combinations and permutations of user tokens
//! - **Repeat patterns**: repeated and sliding-window patterns over a charset
//! - **Dictionaries**: memory-mapped, parallel import with entry transforms
//! - **Streaming output**: lazy enumeration, batched background writes and
//!   numbered file splitting; runs can be cancelled at any point
//!
//! ## Usage
//!
//! ```bash
//! # Every lowercase letter followed by a digit
//! wordlist-generator -m "?l?d" -o out.txt
//!
//! # Dictionary entries followed by two digits
//! wordlist-generator -m "?d?d" -d names.txt --combine dict-first
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use wordlist_generator::context::RunContext;
//! use wordlist_generator::plan::GenerationConfig;
//! use wordlist_generator::processor::{Generator, RunSettings};
//! use wordlist_generator::transform::TransformRules;
//! use std::path::PathBuf;
//!
//! let config = GenerationConfig {
//!     mask: Some("?l?l?d".to_string()),
//!     ..Default::default()
//! };
//! let settings = RunSettings {
//!     output: PathBuf::from("./output/words.txt"),
//!     split_size: 100_000,
//!     ..Default::default()
//! };
//!
//! let generator = Generator::new(config, TransformRules::default(), settings);
//! // generator.run(&RunContext::default()).unwrap();
//! ```

pub mod charset;
pub mod cli;
pub mod context;
pub mod dedup;
pub mod dictionary;
pub mod encoding;
pub mod error;
pub mod estimate;
pub mod generator;
pub mod output;
pub mod plan;
pub mod processor;
pub mod progress;
pub mod transform;

pub use cli::Args;
pub use context::{CancellationToken, RunContext};
pub use error::{GeneratorError, Result};
pub use estimate::CountEstimator;
pub use generator::{CombinationEnumerator, DictionarySet};
pub use output::BufferedSplitWriter;
pub use plan::{CombinationPlan, GenerationConfig};
pub use processor::{Generator, RunOutcome, RunSettings};
pub use transform::TransformRules;
