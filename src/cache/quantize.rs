//! Lossy vector → bucket key projection.
//!
//! Keys are built from the first `dim_prefix` components, each rendered with
//! `decimals` fixed digits and joined by `,`. Two vectors that agree on that
//! prefix at that resolution share a bucket, whatever their remaining
//! components are. Collisions are what make near-duplicate queries hit.
//!
//! Components render like JavaScript's `Number.prototype.toFixed`: exact ties
//! round away from zero (`0.125` → `0.13`), small negatives keep their sign
//! (`-0.001` → `-0.00`) and only an exact `-0.0` renders unsigned. Keys written
//! by earlier deployments of the service therefore stay addressable.

use std::fmt;

use crate::constants::{CACHE_KEY_PREFIX, DEFAULT_QUANTIZE_DECIMALS, DEFAULT_QUANTIZE_DIM_PREFIX};

/// Semantic bucket identifier. Not a unique fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuantizedKey(String);

impl QuantizedKey {
    /// The bare joined components, e.g. `0.12,-0.40,0.00`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespaced key used in the shared backend, e.g. `semcache:0.12,-0.40`.
    pub fn storage_key(&self) -> String {
        format!("{}{}", CACHE_KEY_PREFIX, self.0)
    }
}

impl fmt::Display for QuantizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rounds a vector prefix into a [`QuantizedKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantizer {
    decimals: usize,
    dim_prefix: usize,
}

impl Default for Quantizer {
    fn default() -> Self {
        Self::new(DEFAULT_QUANTIZE_DECIMALS, DEFAULT_QUANTIZE_DIM_PREFIX)
    }
}

impl Quantizer {
    /// `decimals` digits per component over the first `dim_prefix` components.
    pub fn new(decimals: usize, dim_prefix: usize) -> Self {
        Self {
            decimals,
            dim_prefix,
        }
    }

    pub fn decimals(&self) -> usize {
        self.decimals
    }

    pub fn dim_prefix(&self) -> usize {
        self.dim_prefix
    }

    /// Deterministic: equal inputs always produce equal keys.
    pub fn quantize(&self, vector: &[f32]) -> QuantizedKey {
        let take = self.dim_prefix.min(vector.len());
        let mut key = String::with_capacity(take * (self.decimals + 4));

        for (i, value) in vector[..take].iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            key.push_str(&to_fixed(*value, self.decimals));
        }

        QuantizedKey(key)
    }
}

/// Fractional digits needed to print any `f32` exactly (smallest subnormal is 2^-149).
const F32_EXACT_DIGITS: usize = 149;

/// `toFixed` rendering. `format!` rounds exact ties to even, so a value sitting
/// exactly on a tie is nudged one ulp away from zero first.
fn to_fixed(value: f32, decimals: usize) -> String {
    // -0.0 < 0 is false in `toFixed`, so it prints unsigned.
    let value = if value == 0.0 { 0.0 } else { value };

    let exact = format!("{:.*}", F32_EXACT_DIGITS, value);
    let is_tie = exact.split_once('.').is_some_and(|(_, frac)| {
        frac.get(decimals..)
            .and_then(|tail| tail.strip_prefix('5'))
            .is_some_and(|rest| rest.bytes().all(|b| b == b'0'))
    });

    let value = match (is_tie, value > 0.0) {
        (true, true) => value.next_up(),
        (true, false) => value.next_down(),
        (false, _) => value,
    };
    format!("{:.*}", decimals, value)
}
