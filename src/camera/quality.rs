// Recording quality selection
//
// The recorder is configured with an ordered list of preferred qualities and
// a fallback strategy. At bind time the selector is resolved against the
// qualities the chosen camera supports.

use serde::{Deserialize, Serialize};

/// Video quality presets, ordered from lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// 480p
    Sd,
    /// 720p
    Hd,
    /// 1080p
    Fhd,
    /// 2160p
    Uhd,
}

/// What to do when none of the preferred qualities is supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "strategy", content = "quality")]
pub enum FallbackStrategy {
    /// Nothing is selected
    None,
    /// Closest quality above the given one, else closest below it
    HigherQualityOrLowerThan(Quality),
    /// Closest quality below the given one, else closest above it
    LowerQualityOrHigherThan(Quality),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitySelector {
    pub preferred: Vec<Quality>,
    pub fallback: FallbackStrategy,
}

impl QualitySelector {
    pub fn from_ordered_list(preferred: Vec<Quality>, fallback: FallbackStrategy) -> Self {
        Self { preferred, fallback }
    }

    /// Resolve against the qualities a camera supports
    pub fn select(&self, supported: &[Quality]) -> Option<Quality> {
        if let Some(quality) = self.preferred.iter().find(|q| supported.contains(q)) {
            return Some(*quality);
        }

        let closest_above = |q: Quality| supported.iter().filter(|s| **s > q).min().copied();
        let closest_below = |q: Quality| supported.iter().filter(|s| **s < q).max().copied();

        match self.fallback {
            FallbackStrategy::None => None,
            FallbackStrategy::HigherQualityOrLowerThan(q) => {
                closest_above(q).or_else(|| closest_below(q))
            }
            FallbackStrategy::LowerQualityOrHigherThan(q) => {
                closest_below(q).or_else(|| closest_above(q))
            }
        }
    }
}

impl Default for QualitySelector {
    fn default() -> Self {
        Self::from_ordered_list(
            vec![Quality::Sd, Quality::Hd, Quality::Fhd, Quality::Uhd],
            FallbackStrategy::HigherQualityOrLowerThan(Quality::Sd),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_supported_preference_wins() {
        let selector = QualitySelector::default();
        assert_eq!(selector.select(&[Quality::Fhd, Quality::Hd]), Some(Quality::Hd));
        assert_eq!(selector.select(&[Quality::Uhd]), Some(Quality::Uhd));
    }

    #[test]
    fn test_fallback_higher_then_lower() {
        let selector = QualitySelector::from_ordered_list(
            vec![Quality::Hd],
            FallbackStrategy::HigherQualityOrLowerThan(Quality::Hd),
        );
        assert_eq!(selector.select(&[Quality::Sd, Quality::Uhd, Quality::Fhd]), Some(Quality::Fhd));
        assert_eq!(selector.select(&[Quality::Sd]), Some(Quality::Sd));
    }

    #[test]
    fn test_fallback_lower_then_higher() {
        let selector = QualitySelector::from_ordered_list(
            vec![Quality::Fhd],
            FallbackStrategy::LowerQualityOrHigherThan(Quality::Fhd),
        );
        assert_eq!(selector.select(&[Quality::Sd, Quality::Hd]), Some(Quality::Hd));
        assert_eq!(selector.select(&[Quality::Uhd]), Some(Quality::Uhd));
    }

    #[test]
    fn test_no_fallback() {
        let selector = QualitySelector::from_ordered_list(vec![Quality::Uhd], FallbackStrategy::None);
        assert_eq!(selector.select(&[Quality::Sd]), None);
        assert_eq!(selector.select(&[]), None);
    }
}
