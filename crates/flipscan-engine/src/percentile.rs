//! Sales-rank distributions per marketplace category.

use std::collections::HashMap;

use flipscan_core::normalize_category;

/// Approximate listing counts per category. A category uses the first entry
/// it equals or contains, ignoring case, so "Toys & Games" takes the "Toys"
/// size.
pub const DEFAULT_CATEGORY_SIZES: &[(&str, u64)] = &[
    ("Books", 2_000_000),
    ("Electronics", 500_000),
    ("Toys", 400_000),
    ("Video Games", 150_000),
    ("Kitchen", 600_000),
    ("Home & Garden", 800_000),
    ("Beauty", 300_000),
    ("Clothing", 1_000_000),
    ("Sports & Outdoors", 400_000),
    ("Office Products", 300_000),
];

/// Listing count assumed for a category that matches no size entry.
pub const DEFAULT_UNMAPPED_CATEGORY_SIZE: u64 = 500_000;

/// Approximate listing counts, used where observed ranks are too few.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySizes {
    entries: Vec<(String, u64)>,
    unmapped: Option<u64>,
}

impl CategorySizes {
    /// Set the size for `category`, replacing any earlier value.
    pub fn insert(&mut self, category: &str, size: u64) {
        let key = normalize_category(category);
        if key.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|(name, _)| *name == key) {
            Some(entry) => entry.1 = size,
            None => self.entries.push((key, size)),
        }
    }

    /// Size for `category`: an exact match, else the first entry whose name
    /// the category contains, else the unmapped size.
    #[must_use]
    pub fn size_for(&self, category: &str) -> Option<u64> {
        let wanted = normalize_category(category);
        self.entries
            .iter()
            .find(|(name, _)| *name == wanted)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(name, _)| wanted.contains(name.as_str()))
            })
            .map(|(_, size)| *size)
            .or(self.unmapped)
    }

    /// `floor(size * p / 100)` for `category`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn boundary(&self, category: &str, percentile: f64) -> Option<u64> {
        let p = percentile.clamp(0.0, 100.0);
        self.size_for(category)
            .map(|size| (size as f64 * p / 100.0).floor() as u64)
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.unmapped.is_none()
    }
}

/// Sales ranks per category, sorted ascending once on construction, with
/// approximate category sizes behind them.
#[derive(Debug, Clone, Default)]
pub struct RankDistribution {
    observed: HashMap<String, Vec<u64>>,
    sizes: CategorySizes,
}

impl RankDistribution {
    /// Build from `(category, rank)` observations.
    pub fn from_observations<'a, I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        let mut observed: HashMap<String, Vec<u64>> = HashMap::new();
        for (category, rank) in observations {
            observed
                .entry(normalize_category(category))
                .or_default()
                .push(rank);
        }
        for ranks in observed.values_mut() {
            ranks.sort_unstable();
        }
        Self {
            observed,
            sizes: CategorySizes::default(),
        }
    }

    /// Attach approximate category sizes.
    #[must_use]
    pub fn with_category_sizes<'a, I>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        for (category, size) in sizes {
            self.sizes.insert(category, size);
        }
        self
    }

    /// Size assumed for categories no size entry matches.
    #[must_use]
    pub fn with_unmapped_size(mut self, size: u64) -> Self {
        self.sizes.unmapped = Some(size);
        self
    }

    #[must_use]
    pub fn sizes(&self) -> &CategorySizes {
        &self.sizes
    }

    /// Rank at `percentile` (0..=100) within `category`.
    ///
    /// Observed ranks are used once the category has at least `ceil(100 / p)`
    /// of them, so the top `p` percent holds at least one observation. The
    /// boundary is then the nearest rank, index `ceil(p * n / 100) - 1`.
    /// Otherwise the boundary comes from the category size. `None` when
    /// neither applies.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn boundary(&self, category: &str, percentile: f64) -> Option<u64> {
        let key = normalize_category(category);
        let p = percentile.clamp(0.0, 100.0);

        if let Some(ranks) = self.observed.get(&key) {
            let n = ranks.len();
            if p > 0.0 && n as f64 * p >= 100.0 {
                let nearest = (p * n as f64 / 100.0).ceil() as usize;
                let idx = nearest.saturating_sub(1).min(n - 1);
                return Some(ranks[idx]);
            }
        }

        self.sizes.boundary(&key, p)
    }

    /// Normalized names of every category with observations or a size entry.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = self
            .observed
            .keys()
            .map(String::as_str)
            .chain(self.sizes.names())
            .collect();
        seen.sort_unstable();
        seen.dedup();
        seen
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observed.is_empty() && self.sizes.is_empty()
    }
}
