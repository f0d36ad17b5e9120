//! Exact candidate counts
//!
//! Closed forms over the plan, evaluated as arbitrary-precision integers so
//! that spaces far beyond any practical run are still counted exactly. The
//! result always equals the number of strings the enumerator yields.

use crate::generator::DictionarySet;
use crate::plan::{
    AppendPosition, CombinationPlan, CombineMode, CustomDictMode, PatternType, PrimaryMode,
    Wrapping,
};

use num_bigint::BigUint;
use num_traits::{One, Pow, Zero};

/// Above this many candidates a run is flagged as very large
pub const LARGE_ESTIMATE: u64 = 1_000_000_000_000;

pub struct CountEstimator;

impl CountEstimator {
    /// Number of candidates the plan produces against `dictionaries`
    pub fn estimate(plan: &CombinationPlan, dictionaries: &DictionarySet) -> BigUint {
        let entries = BigUint::from(dictionaries.primary.len());

        match plan.wrapping {
            Wrapping::None | Wrapping::Append(AppendPosition::None) => {
                Self::primary(&plan.primary, dictionaries)
            }
            Wrapping::Combine(CombineMode::DictFirst | CombineMode::MaskFirst) => {
                entries * Self::primary(&plan.primary, dictionaries)
            }
            Wrapping::Combine(CombineMode::DictAb | CombineMode::DictBa) => {
                let secondary = dictionaries.secondary.as_ref().map_or(0, |s| s.len());
                entries * BigUint::from(secondary)
            }
            Wrapping::Append(_) => entries + Self::primary(&plan.primary, dictionaries),
        }
    }

    /// Count of the unwrapped primary mode
    pub fn primary(primary: &PrimaryMode, dictionaries: &DictionarySet) -> BigUint {
        match primary {
            PrimaryMode::Mask(mask) => mask
                .positions()
                .iter()
                .fold(BigUint::one(), |acc, c| acc * BigUint::from(c.len())),
            PrimaryMode::CharsetRange { charset, range } => {
                let n = BigUint::from(charset.len());
                (range.min..=range.max).fold(BigUint::zero(), |acc, len| acc + Pow::pow(&n, len))
            }
            PrimaryMode::CustomDict {
                tokens, mode, length, ..
            } => match mode {
                CustomDictMode::Combination => Pow::pow(&BigUint::from(tokens.len()), *length),
                CustomDictMode::Permutation | CustomDictMode::Permutation2 => {
                    falling_factorial(tokens.len(), *length)
                }
            },
            PrimaryMode::RepeatPattern {
                pattern_length,
                charset,
                pattern_type,
                ..
            } => match pattern_type {
                PatternType::Repeat => Pow::pow(&BigUint::from(charset.len()), *pattern_length),
                PatternType::Sequential | PatternType::SequentialRepeat => {
                    BigUint::from((charset.len() + 1).saturating_sub(*pattern_length))
                }
            },
            PrimaryMode::PureDictionary => BigUint::from(dictionaries.primary.len()),
        }
    }
}

/// `n! / (n - k)!`, zero when `k > n`
fn falling_factorial(n: usize, k: usize) -> BigUint {
    if k > n {
        return BigUint::zero();
    }
    ((n - k + 1)..=n).fold(BigUint::one(), |acc, i| acc * BigUint::from(i))
}

/// Number of output files a run of `total` candidates splits into
pub fn expected_files(total: &BigUint, split_size: u64) -> BigUint {
    if total.is_zero() {
        return BigUint::one();
    }
    let split = BigUint::from(split_size.max(1));
    (total + &split - 1u32) / split
}
