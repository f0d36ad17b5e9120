//! Dictionary entry transforms
//!
//! Each raw entry expands into a small set of variants (case changes,
//! reversal, trimming, affixes, repetition). Variants from different rules
//! that happen to be equal collapse into one.

use clap::ValueEnum;

/// How the rule set is applied to an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProcessMode {
    /// Every rule is applied to the original entry
    #[default]
    Independent,
    /// Same rule set as `Independent`; rules are not chained
    Combined,
}

/// Transform catalog for dictionary entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRules {
    pub uppercase: bool,
    pub lowercase: bool,
    pub capitalize: bool,
    pub reverse: bool,

    pub remove_start: usize,
    pub remove_end: usize,
    pub remove_start_independent: bool,
    pub remove_end_independent: bool,
    pub remove_combined: bool,

    pub prefix: String,
    pub suffix: String,
    pub prefix_independent: bool,
    pub suffix_independent: bool,
    pub add_combined: bool,

    pub repeat_count: usize,
    pub repeat_space_count: usize,

    pub repeat_processed: bool,
    pub repeat_processed_count: usize,
    pub repeat_processed_space_count: usize,

    pub mode: ProcessMode,
}

impl Default for TransformRules {
    fn default() -> Self {
        Self {
            uppercase: false,
            lowercase: false,
            capitalize: false,
            reverse: false,
            remove_start: 0,
            remove_end: 0,
            remove_start_independent: false,
            remove_end_independent: false,
            remove_combined: false,
            prefix: String::new(),
            suffix: String::new(),
            prefix_independent: false,
            suffix_independent: false,
            add_combined: false,
            repeat_count: 1,
            repeat_space_count: 1,
            repeat_processed: false,
            repeat_processed_count: 2,
            repeat_processed_space_count: 2,
            mode: ProcessMode::Independent,
        }
    }
}

impl TransformRules {
    /// Whether any option that changes the output is set
    ///
    /// The removal/affix toggles and the repeat-processed pass do not count on
    /// their own; they only refine options that do.
    pub fn is_active(&self) -> bool {
        self.uppercase
            || self.lowercase
            || self.capitalize
            || self.reverse
            || self.remove_start > 0
            || self.remove_end > 0
            || !self.prefix.is_empty()
            || !self.suffix.is_empty()
            || self.repeat_count > 1
            || self.repeat_space_count > 1
    }

    /// Expand one entry into its deduplicated variants
    ///
    /// The entry is trimmed first; an empty entry yields nothing. Without any
    /// active option the only variant is the entry itself. Variants keep the
    /// order in which rules produced them.
    pub fn apply(&self, entry: &str) -> Vec<String> {
        let original = entry.trim();
        if original.is_empty() {
            return Vec::new();
        }

        if !self.is_active() {
            return vec![original.to_string()];
        }

        let mut variants = VariantSet::default();

        // Combined shares the independent rule set.
        match self.mode {
            ProcessMode::Independent | ProcessMode::Combined => {
                self.apply_rules(original, &mut variants)
            }
        }

        if self.repeat_processed {
            let current = variants.items.clone();
            for variant in &current {
                if self.repeat_processed_count > 1 {
                    variants.insert(variant.repeat(self.repeat_processed_count));
                }
                if self.repeat_processed_space_count > 1 {
                    variants.insert(join_repeated(variant, self.repeat_processed_space_count));
                }
            }
        }

        variants.items
    }

    fn apply_rules(&self, original: &str, out: &mut VariantSet) {
        if self.uppercase {
            out.insert(original.to_uppercase());
        }
        if self.lowercase {
            out.insert(original.to_lowercase());
        }
        if self.capitalize {
            out.insert(capitalize(original));
        }
        if self.reverse {
            out.insert(original.chars().rev().collect());
        }

        let len = original.chars().count();

        if self.remove_start_independent && self.remove_start > 0 && len > self.remove_start {
            out.insert(original.chars().skip(self.remove_start).collect());
        }
        if self.remove_end_independent && self.remove_end > 0 && len > self.remove_end {
            out.insert(original.chars().take(len - self.remove_end).collect());
        }
        if self.remove_combined && len > self.remove_start + self.remove_end {
            out.insert(
                original
                    .chars()
                    .skip(self.remove_start)
                    .take(len - self.remove_start - self.remove_end)
                    .collect(),
            );
        }

        if self.prefix_independent && !self.prefix.is_empty() {
            out.insert(format!("{}{}", self.prefix, original));
        }
        if self.suffix_independent && !self.suffix.is_empty() {
            out.insert(format!("{}{}", original, self.suffix));
        }
        if self.add_combined {
            out.insert(format!("{}{}{}", self.prefix, original, self.suffix));
        }

        if self.repeat_count > 1 {
            out.insert(original.repeat(self.repeat_count));
        }
        if self.repeat_space_count > 1 {
            out.insert(join_repeated(original, self.repeat_space_count));
        }
    }
}

/// Insertion-ordered set for the handful of variants one entry produces
#[derive(Default)]
struct VariantSet {
    items: Vec<String>,
}

impl VariantSet {
    fn insert(&mut self, item: String) {
        if !item.is_empty() && !self.items.contains(&item) {
            self.items.push(item);
        }
    }
}

/// First character upper-cased, the rest lower-cased
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

fn join_repeated(s: &str, count: usize) -> String {
    vec![s; count].join(" ")
}
