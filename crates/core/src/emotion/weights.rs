use crate::emotion::Emotion;
use std::collections::BTreeMap;

/// Weight applied to labels missing from the table.
pub const DEFAULT_WEIGHT: f64 = 0.5;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum WeightError {
    #[error("weight for '{label}' must be within [0, 1], got {weight}")]
    OutOfRange { label: String, weight: f64 },
}

/// Immutable label -> stress weight table.
///
/// Keys are stored lower-cased and looked up case-insensitively. Build one
/// per process and share it; tests construct their own.
#[derive(Clone, Debug, PartialEq)]
pub struct EmotionWeights {
    table: BTreeMap<String, f64>,
    fallback: f64,
}

impl EmotionWeights {
    pub fn new<I, S>(entries: I) -> Result<Self, WeightError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut table = BTreeMap::new();
        for (label, weight) in entries {
            let label = label.as_ref().to_lowercase();
            check_range(&label, weight)?;
            table.insert(label, weight);
        }
        Ok(Self {
            table,
            fallback: DEFAULT_WEIGHT,
        })
    }

    pub fn with_fallback(mut self, weight: f64) -> Result<Self, WeightError> {
        check_range("<unknown>", weight)?;
        self.fallback = weight;
        Ok(self)
    }

    pub fn weight(&self, label: &str) -> f64 {
        self.table
            .get(&label.to_lowercase())
            .copied()
            .unwrap_or(self.fallback)
    }
}

impl Default for EmotionWeights {
    fn default() -> Self {
        Self {
            table: Emotion::ALL
                .into_iter()
                .map(|e| (e.label().to_owned(), e.stress_weight()))
                .collect(),
            fallback: DEFAULT_WEIGHT,
        }
    }
}

fn check_range(label: &str, weight: f64) -> Result<(), WeightError> {
    if (0.0..=1.0).contains(&weight) {
        Ok(())
    } else {
        Err(WeightError::OutOfRange {
            label: label.to_owned(),
            weight,
        })
    }
}
