//! Lazy candidate enumerators
//!
//! Every mode yields a boxed iterator of owned strings. Nothing is
//! materialised except dictionary entry sets; wrapped modes re-create the
//! base generator from a factory for each dictionary entry.

use crate::charset::{Charset, ParsedMask};
use crate::context::CancellationToken;
use crate::dictionary::Entries;
use crate::error::{GeneratorError, Result};
use crate::plan::{
    AppendPosition, CombinationPlan, CombineMode, CustomDictMode, PatternType, PrimaryMode,
    Wrapping,
};

use std::sync::Arc;

/// A lazy, single-pass sequence of candidate strings
pub type Candidates = Box<dyn Iterator<Item = String> + Send>;

type BaseFactory = Arc<dyn Fn() -> Candidates + Send + Sync>;

/// Transformed dictionary entries a plan runs against
#[derive(Debug, Clone, Default)]
pub struct DictionarySet {
    pub primary: Entries,
    pub secondary: Option<Entries>,
}

impl DictionarySet {
    pub fn new(primary: Entries, secondary: Option<Entries>) -> Self {
        Self { primary, secondary }
    }
}

/// Mixed-radix counter, last position fastest
#[derive(Debug, Clone)]
struct Odometer {
    radices: Vec<usize>,
    indices: Vec<usize>,
    started: bool,
    exhausted: bool,
}

impl Odometer {
    fn new(radices: Vec<usize>) -> Self {
        let exhausted = radices.iter().any(|&r| r == 0);
        Self {
            indices: vec![0; radices.len()],
            radices,
            started: false,
            exhausted,
        }
    }

    fn advance(&mut self) -> Option<&[usize]> {
        if self.exhausted {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.as_slice());
        }

        for pos in (0..self.radices.len()).rev() {
            self.indices[pos] += 1;
            if self.indices[pos] < self.radices[pos] {
                return Some(self.indices.as_slice());
            }
            self.indices[pos] = 0;
        }

        self.exhausted = true;
        None
    }
}

/// Cartesian product over per-position alphabets
pub struct MaskCandidates {
    positions: Vec<Vec<char>>,
    odometer: Odometer,
}

impl MaskCandidates {
    pub fn new(mask: &ParsedMask) -> Self {
        Self::from_positions(mask.positions().iter().map(|c| c.chars().to_vec()).collect())
    }

    /// Every string of exactly `length` characters from `charset`
    pub fn uniform(charset: &Charset, length: usize) -> Self {
        Self::from_positions(vec![charset.chars().to_vec(); length])
    }

    fn from_positions(positions: Vec<Vec<char>>) -> Self {
        let odometer = Odometer::new(positions.iter().map(Vec::len).collect());
        Self { positions, odometer }
    }
}

impl Iterator for MaskCandidates {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let indices = self.odometer.advance()?;
        Some(
            indices
                .iter()
                .zip(&self.positions)
                .map(|(&i, alphabet)| alphabet[i])
                .collect(),
        )
    }
}

/// Tuples of tokens with repetition, each token joined by `connector`
pub struct TokenProduct {
    tokens: Arc<Vec<String>>,
    connector: String,
    odometer: Odometer,
}

impl TokenProduct {
    pub fn new(tokens: Arc<Vec<String>>, length: usize, connector: impl Into<String>) -> Self {
        let odometer = Odometer::new(vec![tokens.len(); length]);
        Self {
            tokens,
            connector: connector.into(),
            odometer,
        }
    }
}

impl Iterator for TokenProduct {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let indices = self.odometer.advance()?;
        Some(join_indexed(&self.tokens, indices, &self.connector))
    }
}

/// Ordered selections of `k` distinct items
///
/// Yields index tuples in lexicographic order of positions, e.g. for
/// `[a, b, c]` and `k = 2`: `ab, ac, ba, bc, ca, cb`.
pub struct KPermutations {
    tokens: Arc<Vec<String>>,
    connector: String,
    indices: Vec<usize>,
    cycles: Vec<usize>,
    k: usize,
    started: bool,
    exhausted: bool,
}

impl KPermutations {
    pub fn new(tokens: Arc<Vec<String>>, k: usize, connector: impl Into<String>) -> Self {
        let n = tokens.len();
        Self {
            indices: (0..n).collect(),
            cycles: (0..k.min(n)).map(|i| n - i).collect(),
            exhausted: k > n,
            tokens,
            connector: connector.into(),
            k,
            started: false,
        }
    }

    fn render(&self) -> String {
        join_indexed(&self.tokens, &self.indices[..self.k], &self.connector)
    }

    fn step(&mut self) -> bool {
        let n = self.indices.len();
        for i in (0..self.k).rev() {
            self.cycles[i] -= 1;
            if self.cycles[i] == 0 {
                self.indices[i..].rotate_left(1);
                self.cycles[i] = n - i;
            } else {
                let j = n - self.cycles[i];
                self.indices.swap(i, j);
                return true;
            }
        }
        false
    }
}

impl Iterator for KPermutations {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.exhausted {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.render());
        }
        if self.step() {
            Some(self.render())
        } else {
            self.exhausted = true;
            None
        }
    }
}

fn join_indexed(tokens: &[String], indices: &[usize], connector: &str) -> String {
    let mut out = String::new();
    for (n, &i) in indices.iter().enumerate() {
        if n > 0 {
            out.push_str(connector);
        }
        out.push_str(&tokens[i]);
    }
    out
}

/// `repeat` pattern: every tuple, each element repeated in place
pub struct RepeatTuples {
    chars: Vec<char>,
    repeat_count: usize,
    odometer: Odometer,
}

impl RepeatTuples {
    pub fn new(charset: &Charset, pattern_length: usize, repeat_count: usize) -> Self {
        Self {
            chars: charset.chars().to_vec(),
            repeat_count,
            odometer: Odometer::new(vec![charset.len(); pattern_length]),
        }
    }
}

impl Iterator for RepeatTuples {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let indices = self.odometer.advance()?;
        let mut out = String::with_capacity(indices.len() * self.repeat_count);
        for &i in indices {
            for _ in 0..self.repeat_count {
                out.push(self.chars[i]);
            }
        }
        Some(out)
    }
}

/// Sliding windows of `width` contiguous characters
fn windows(chars: Vec<char>, width: usize) -> impl Iterator<Item = Vec<char>> + Send {
    let count = (chars.len() + 1).saturating_sub(width);
    (0..count).map(move |start| chars[start..start + width].to_vec())
}

/// Yields a shared entry list in order
pub struct EntryCandidates {
    entries: Entries,
    next: usize,
}

impl EntryCandidates {
    pub fn new(entries: Entries) -> Self {
        Self { entries, next: 0 }
    }
}

impl Iterator for EntryCandidates {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let entry = self.entries.get(self.next)?.clone();
        self.next += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.entries.len().saturating_sub(self.next);
        (left, Some(left))
    }
}

/// Stops the wrapped sequence once the token is cancelled
pub struct Cancellable {
    inner: Candidates,
    token: CancellationToken,
}

impl Iterator for Cancellable {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.token.is_cancelled() {
            return None;
        }
        self.inner.next()
    }
}

/// Build the unwrapped sequence of a primary mode
pub fn primary_candidates(primary: &PrimaryMode, dictionaries: &DictionarySet) -> Candidates {
    match primary {
        PrimaryMode::Mask(mask) => Box::new(MaskCandidates::new(mask)),
        PrimaryMode::CharsetRange { charset, range } => {
            let charset = charset.clone();
            Box::new(
                (range.min..=range.max)
                    .flat_map(move |len| MaskCandidates::uniform(&charset, len)),
            )
        }
        PrimaryMode::CustomDict {
            tokens,
            mode,
            length,
            connector,
        } => {
            let tokens = Arc::new(tokens.clone());
            match mode {
                CustomDictMode::Combination => Box::new(TokenProduct::new(tokens, *length, "")),
                CustomDictMode::Permutation => Box::new(KPermutations::new(tokens, *length, "")),
                CustomDictMode::Permutation2 => {
                    Box::new(KPermutations::new(tokens, *length, connector.clone()))
                }
            }
        }
        PrimaryMode::RepeatPattern {
            repeat_count,
            pattern_length,
            charset,
            pattern_type,
        } => {
            let repeat_count = *repeat_count;
            match pattern_type {
                PatternType::Repeat => {
                    Box::new(RepeatTuples::new(charset, *pattern_length, repeat_count))
                }
                PatternType::Sequential => Box::new(
                    windows(charset.chars().to_vec(), *pattern_length)
                        .map(move |w| w.iter().collect::<String>().repeat(repeat_count)),
                ),
                PatternType::SequentialRepeat => Box::new(
                    windows(charset.chars().to_vec(), *pattern_length).map(move |w| {
                        w.iter()
                            .flat_map(|&c| std::iter::repeat(c).take(repeat_count))
                            .collect::<String>()
                    }),
                ),
            }
        }
        PrimaryMode::PureDictionary => Box::new(EntryCandidates::new(dictionaries.primary.clone())),
    }
}

/// Composes a plan and its dictionaries into one candidate stream
pub struct CombinationEnumerator {
    plan: CombinationPlan,
    dictionaries: DictionarySet,
}

impl CombinationEnumerator {
    pub fn new(plan: CombinationPlan, dictionaries: DictionarySet) -> Result<Self> {
        if plan.uses_secondary() && dictionaries.secondary.is_none() {
            return Err(GeneratorError::config(
                "dict-ab/dict-ba modes require a second dictionary",
            ));
        }
        Ok(Self { plan, dictionaries })
    }

    pub fn plan(&self) -> &CombinationPlan {
        &self.plan
    }

    /// A fresh stream of every candidate, stopping early once `token` fires
    pub fn enumerate(&self, token: &CancellationToken) -> Candidates {
        let inner = self.wrapped();
        Box::new(Cancellable {
            inner,
            token: token.clone(),
        })
    }

    fn base_factory(&self) -> BaseFactory {
        let primary = self.plan.primary.clone();
        let dictionaries = self.dictionaries.clone();
        Arc::new(move || primary_candidates(&primary, &dictionaries))
    }

    fn wrapped(&self) -> Candidates {
        let entries = self.dictionaries.primary.clone();

        match self.plan.wrapping {
            Wrapping::None => primary_candidates(&self.plan.primary, &self.dictionaries),
            Wrapping::Combine(mode @ (CombineMode::DictFirst | CombineMode::MaskFirst)) => {
                let factory = self.base_factory();
                let entry_first = mode == CombineMode::DictFirst;
                Box::new(EntryCandidates::new(entries).flat_map(move |entry| {
                    factory().map(move |base| {
                        if entry_first {
                            format!("{}{}", entry, base)
                        } else {
                            format!("{}{}", base, entry)
                        }
                    })
                }))
            }
            Wrapping::Combine(mode @ (CombineMode::DictAb | CombineMode::DictBa)) => {
                let secondary = self.dictionaries.secondary.clone().unwrap_or_default();
                let a_first = mode == CombineMode::DictAb;
                Box::new(EntryCandidates::new(entries).flat_map(move |a| {
                    EntryCandidates::new(secondary.clone()).map(move |b| {
                        if a_first {
                            format!("{}{}", a, b)
                        } else {
                            format!("{}{}", b, a)
                        }
                    })
                }))
            }
            Wrapping::Append(AppendPosition::Before) => {
                let base = primary_candidates(&self.plan.primary, &self.dictionaries);
                Box::new(EntryCandidates::new(entries).chain(base))
            }
            Wrapping::Append(AppendPosition::After) => {
                let base = primary_candidates(&self.plan.primary, &self.dictionaries);
                Box::new(base.chain(EntryCandidates::new(entries)))
            }
            Wrapping::Append(AppendPosition::None) => {
                primary_candidates(&self.plan.primary, &self.dictionaries)
            }
        }
    }
}
