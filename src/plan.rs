//! Generation plans
//!
//! [`GenerationConfig`] is the raw configuration surface; [`CombinationPlan`]
//! is its validated form, built once per run and read-only afterwards.

use crate::charset::{parse_mask, resolve_charset, Charset, ParsedMask};
use crate::error::{GeneratorError, Result};

use clap::ValueEnum;
use std::path::PathBuf;

/// How custom tokens are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CustomDictMode {
    /// Cartesian product, repetition allowed
    #[default]
    Combination,
    /// k-permutations, no token used twice
    Permutation,
    /// k-permutations joined with the connector
    #[value(name = "permutation2")]
    Permutation2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PatternType {
    /// Each tuple element repeated in place: `(A,B)` -> `AABB`
    #[default]
    Repeat,
    /// Sliding window repeated as a whole: `ABC` -> `ABCABC`
    Sequential,
    /// Sliding window, each character repeated: `ABC` -> `AABBCC`
    SequentialRepeat,
}

/// Cross-product strategy between a dictionary and the base generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DictionaryCombineMode {
    #[default]
    None,
    /// `entry + base`
    DictFirst,
    /// `base + entry`
    MaskFirst,
    /// `a + b` over two dictionaries
    #[value(name = "dict-ab")]
    DictAb,
    /// `b + a` over two dictionaries
    #[value(name = "dict-ba")]
    DictBa,
}

/// Concatenation strategy: the dictionary before or after the base sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AppendPosition {
    #[default]
    None,
    Before,
    After,
}

/// Inclusive length range, `1 <= min <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthRange {
    pub min: usize,
    pub max: usize,
}

impl LengthRange {
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if min == 0 {
            return Err(GeneratorError::config("Minimum length must be at least 1"));
        }
        if max < min {
            return Err(GeneratorError::config(format!(
                "Invalid length range: min ({}) must be <= max ({})",
                min, max
            )));
        }
        Ok(Self { min, max })
    }
}

/// The primary generation mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryMode {
    Mask(ParsedMask),
    CharsetRange {
        charset: Charset,
        range: LengthRange,
    },
    CustomDict {
        tokens: Vec<String>,
        mode: CustomDictMode,
        length: usize,
        connector: String,
    },
    RepeatPattern {
        repeat_count: usize,
        pattern_length: usize,
        charset: Charset,
        pattern_type: PatternType,
    },
    PureDictionary,
}

impl PrimaryMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mask(_) => "mask",
            Self::CharsetRange { .. } => "charset",
            Self::CustomDict { .. } => "custom tokens",
            Self::RepeatPattern { .. } => "repeat pattern",
            Self::PureDictionary => "dictionary",
        }
    }
}

/// Cross-product wrapping modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    DictFirst,
    MaskFirst,
    DictAb,
    DictBa,
}

impl CombineMode {
    pub fn needs_secondary(&self) -> bool {
        matches!(self, Self::DictAb | Self::DictBa)
    }
}

/// Dictionary wrapping around the base generator
///
/// Cross-product and append are mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapping {
    None,
    Combine(CombineMode),
    Append(AppendPosition),
}

/// Raw generation settings, as collected from the CLI or another front end
#[derive(Debug, Clone, Default)]
pub struct GenerationConfig {
    pub mask: Option<String>,

    pub charset: Option<String>,
    pub include_special: bool,
    pub dedup_charset: bool,
    pub length_range: Option<(usize, usize)>,

    pub tokens: Option<String>,
    pub token_mode: CustomDictMode,
    pub token_length: usize,
    pub connector: String,

    pub pattern_charset: Option<String>,
    pub pattern_type: PatternType,
    pub pattern_length: usize,
    pub repeat_count: usize,

    pub dictionary: Option<PathBuf>,
    pub secondary_dictionary: Option<PathBuf>,
    pub combine: DictionaryCombineMode,
    pub append: AppendPosition,
}

/// Validated, immutable generation plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationPlan {
    pub primary: PrimaryMode,
    pub wrapping: Wrapping,
    pub dictionary: Option<PathBuf>,
    pub secondary_dictionary: Option<PathBuf>,
}

impl CombinationPlan {
    /// Validate the configuration and select exactly one primary mode
    ///
    /// Priority: custom tokens, repeat pattern, mask, charset, pure dictionary.
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let dictionary = config.dictionary.clone();
        let secondary_dictionary = config.secondary_dictionary.clone();

        let primary = if let Some(tokens) = config.tokens.as_deref() {
            custom_dict_mode(config, tokens)?
        } else if let Some(charset) = config.pattern_charset.as_deref() {
            repeat_pattern_mode(config, charset)?
        } else if let Some(mask) = config.mask.as_deref().filter(|m| !m.is_empty()) {
            PrimaryMode::Mask(parse_mask(mask)?)
        } else if let Some(charset) = config.charset.as_deref().filter(|c| !c.is_empty()) {
            let (min, max) = config.length_range.unwrap_or((1, 8));
            PrimaryMode::CharsetRange {
                charset: resolve_charset(charset, config.include_special, config.dedup_charset),
                range: LengthRange::new(min, max)?,
            }
        } else if config.include_special {
            let (min, max) = config.length_range.unwrap_or((1, 8));
            PrimaryMode::CharsetRange {
                charset: resolve_charset("", true, config.dedup_charset),
                range: LengthRange::new(min, max)?,
            }
        } else if dictionary.is_some() {
            PrimaryMode::PureDictionary
        } else {
            return Err(GeneratorError::config(
                "Nothing to generate: provide a mask, charset, tokens, pattern charset or dictionary",
            ));
        };

        let mut wrapping = select_wrapping(config);
        if primary == PrimaryMode::PureDictionary {
            // AB/BA never consult the base generator; everything else wraps nothing
            match wrapping {
                Wrapping::None => {}
                Wrapping::Combine(mode) if mode.needs_secondary() => {}
                ignored => {
                    log::warn!(
                        "No mask, charset, tokens or pattern charset given; ignoring {:?}",
                        ignored
                    );
                    wrapping = Wrapping::None;
                }
            }
        }

        match wrapping {
            Wrapping::Combine(mode) => {
                if dictionary.is_none() {
                    return Err(GeneratorError::config(
                        "Dictionary combine mode requires a dictionary",
                    ));
                }
                if mode.needs_secondary() && secondary_dictionary.is_none() {
                    return Err(GeneratorError::config(
                        "dict-ab/dict-ba modes require a second dictionary",
                    ));
                }
            }
            Wrapping::Append(_) if dictionary.is_none() => {
                return Err(GeneratorError::config("Dictionary append requires a dictionary"));
            }
            _ => {}
        }

        Ok(Self {
            primary,
            wrapping,
            dictionary,
            secondary_dictionary,
        })
    }

    /// Whether the run needs the primary dictionary loaded
    pub fn uses_dictionary(&self) -> bool {
        self.primary == PrimaryMode::PureDictionary || self.wrapping != Wrapping::None
    }

    /// Whether the run needs the second dictionary loaded
    pub fn uses_secondary(&self) -> bool {
        matches!(self.wrapping, Wrapping::Combine(mode) if mode.needs_secondary())
    }

    /// Characters of the charset-based modes, for display
    pub fn charset(&self) -> Option<&Charset> {
        match &self.primary {
            PrimaryMode::CharsetRange { charset, .. }
            | PrimaryMode::RepeatPattern { charset, .. } => Some(charset),
            _ => None,
        }
    }
}

fn select_wrapping(config: &GenerationConfig) -> Wrapping {
    let combine = match config.combine {
        DictionaryCombineMode::None => None,
        DictionaryCombineMode::DictFirst => Some(CombineMode::DictFirst),
        DictionaryCombineMode::MaskFirst => Some(CombineMode::MaskFirst),
        DictionaryCombineMode::DictAb => Some(CombineMode::DictAb),
        DictionaryCombineMode::DictBa => Some(CombineMode::DictBa),
    };

    match (combine, config.append) {
        (Some(mode), AppendPosition::None) => Wrapping::Combine(mode),
        (Some(mode), _) => {
            log::warn!("Both combine and append are set; using combine mode {:?}", mode);
            Wrapping::Combine(mode)
        }
        (None, AppendPosition::None) => Wrapping::None,
        (None, position) => Wrapping::Append(position),
    }
}

/// Split a comma-separated token list, trimming and dropping empty tokens
pub fn parse_tokens(tokens: &str) -> Vec<String> {
    tokens
        .split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn custom_dict_mode(config: &GenerationConfig, tokens: &str) -> Result<PrimaryMode> {
    let tokens = parse_tokens(tokens);
    if tokens.is_empty() {
        return Err(GeneratorError::config("Custom token list must not be empty"));
    }
    if config.token_length == 0 {
        return Err(GeneratorError::config("Token length must be a positive integer"));
    }

    Ok(PrimaryMode::CustomDict {
        tokens,
        mode: config.token_mode,
        length: config.token_length,
        connector: config.connector.clone(),
    })
}

fn repeat_pattern_mode(config: &GenerationConfig, charset: &str) -> Result<PrimaryMode> {
    let charset = Charset::new(charset);
    if charset.is_empty() {
        return Err(GeneratorError::config("Pattern charset must not be empty"));
    }
    if config.repeat_count == 0 {
        return Err(GeneratorError::config("Repeat count must be a positive integer"));
    }
    if config.pattern_length == 0 {
        return Err(GeneratorError::config("Pattern length must be a positive integer"));
    }
    if config.pattern_length > charset.len() {
        return Err(GeneratorError::config(format!(
            "Pattern charset length ({}) is shorter than pattern length ({})",
            charset.len(),
            config.pattern_length
        )));
    }

    Ok(PrimaryMode::RepeatPattern {
        repeat_count: config.repeat_count,
        pattern_length: config.pattern_length,
        charset,
        pattern_type: config.pattern_type,
    })
}
