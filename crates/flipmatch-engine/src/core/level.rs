use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{InvalidConfiguration, NoNextLevel};

/// Difficulty classification of a level.
///
/// Tiers drive theming only; scoring ignores them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(try_from = "String", into = "String")]
pub enum Tier {
    #[display("easy")]
    Easy,
    #[display("medium")]
    Medium,
    #[display("hard")]
    Hard,
    #[display("very hard")]
    VeryHard,
    #[display("extreme")]
    Extreme,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Easy,
        Tier::Medium,
        Tier::Hard,
        Tier::VeryHard,
        Tier::Extreme,
    ];
}

impl FromStr for Tier {
    type Err = InvalidConfiguration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Tier::Easy),
            "medium" => Ok(Tier::Medium),
            "hard" => Ok(Tier::Hard),
            "very hard" | "very_hard" | "very-hard" | "veryhard" => Ok(Tier::VeryHard),
            "extreme" => Ok(Tier::Extreme),
            _ => Err(InvalidConfiguration::UnknownTier { name: s.to_owned() }),
        }
    }
}

impl TryFrom<String> for Tier {
    type Error = InvalidConfiguration;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Tier> for String {
    fn from(value: Tier) -> Self {
        value.to_string()
    }
}

/// Immutable description of one level.
///
/// The card count is always `rows * cols` and always even.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLevelConfig")]
pub struct LevelConfig {
    id: u32,
    rows: u32,
    cols: u32,
    card_count: usize,
    tier: Tier,
}

#[derive(Deserialize)]
struct RawLevelConfig {
    id: u32,
    rows: u32,
    cols: u32,
    card_count: Option<usize>,
    tier: Tier,
}

impl TryFrom<RawLevelConfig> for LevelConfig {
    type Error = InvalidConfiguration;

    fn try_from(raw: RawLevelConfig) -> Result<Self, Self::Error> {
        let level = LevelConfig::new(raw.id, raw.rows, raw.cols, raw.tier)?;
        if let Some(card_count) = raw.card_count
            && card_count != level.card_count
        {
            return Err(InvalidConfiguration::DimensionMismatch {
                id: raw.id,
                rows: raw.rows,
                cols: raw.cols,
                card_count,
            });
        }
        Ok(level)
    }
}

impl LevelConfig {
    /// Builds a validated level.
    ///
    /// # Example
    ///
    /// ```
    /// use flipmatch_engine::{InvalidConfiguration, LevelConfig, Tier};
    ///
    /// let level = LevelConfig::new(13, 6, 6, Tier::Hard).unwrap();
    /// assert_eq!(level.card_count(), 36);
    /// assert_eq!(level.total_pairs(), 18);
    ///
    /// let err = LevelConfig::new(1, 3, 3, Tier::Easy).unwrap_err();
    /// assert_eq!(err, InvalidConfiguration::OddCardCount { card_count: 9 });
    /// ```
    pub fn new(id: u32, rows: u32, cols: u32, tier: Tier) -> Result<Self, InvalidConfiguration> {
        if id == 0 {
            return Err(InvalidConfiguration::InvalidLevelId);
        }
        if rows == 0 || cols == 0 {
            return Err(InvalidConfiguration::ZeroDimension { id, rows, cols });
        }
        let card_count = rows as usize * cols as usize;
        if card_count % 2 != 0 {
            return Err(InvalidConfiguration::OddCardCount { card_count });
        }
        Ok(Self {
            id,
            rows,
            cols,
            card_count,
            tier,
        })
    }

    const fn standard(id: u32, rows: u32, cols: u32, tier: Tier) -> Self {
        Self {
            id,
            rows,
            cols,
            card_count: rows as usize * cols as usize,
            tier,
        }
    }

    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    #[must_use]
    pub const fn card_count(&self) -> usize {
        self.card_count
    }

    #[must_use]
    pub const fn total_pairs(&self) -> usize {
        self.card_count / 2
    }

    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }
}

const STANDARD_LEVELS: [LevelConfig; 25] = [
    LevelConfig::standard(1, 2, 1, Tier::Easy),
    LevelConfig::standard(2, 2, 2, Tier::Easy),
    LevelConfig::standard(3, 3, 2, Tier::Easy),
    LevelConfig::standard(4, 4, 2, Tier::Easy),
    LevelConfig::standard(5, 4, 3, Tier::Easy),
    LevelConfig::standard(6, 4, 4, Tier::Medium),
    LevelConfig::standard(7, 6, 3, Tier::Medium),
    LevelConfig::standard(8, 5, 4, Tier::Medium),
    LevelConfig::standard(9, 6, 4, Tier::Medium),
    LevelConfig::standard(10, 7, 4, Tier::Medium),
    LevelConfig::standard(11, 6, 5, Tier::Hard),
    LevelConfig::standard(12, 8, 4, Tier::Hard),
    LevelConfig::standard(13, 6, 6, Tier::Hard),
    LevelConfig::standard(14, 8, 5, Tier::Hard),
    LevelConfig::standard(15, 7, 6, Tier::Hard),
    LevelConfig::standard(16, 8, 6, Tier::VeryHard),
    LevelConfig::standard(17, 10, 5, Tier::VeryHard),
    LevelConfig::standard(18, 9, 6, Tier::VeryHard),
    LevelConfig::standard(19, 8, 7, Tier::VeryHard),
    LevelConfig::standard(20, 10, 6, Tier::VeryHard),
    LevelConfig::standard(21, 8, 8, Tier::Extreme),
    LevelConfig::standard(22, 11, 6, Tier::Extreme),
    LevelConfig::standard(23, 10, 7, Tier::Extreme),
    LevelConfig::standard(24, 9, 8, Tier::Extreme),
    LevelConfig::standard(25, 13, 6, Tier::Extreme),
];

/// Read-only lookup of levels by id.
///
/// Ids are consecutive and start at 1, so the catalog doubles as the level
/// progression order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCatalog {
    levels: Vec<LevelConfig>,
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl LevelCatalog {
    /// Number of levels in the standard catalog.
    pub const STANDARD_LEN: u32 = 25;

    /// The fixed 25-level catalog grouped into five tiers of five levels.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            levels: STANDARD_LEVELS.to_vec(),
        }
    }

    /// Builds a custom catalog.
    ///
    /// Ids must be `1, 2, ..., n` in order and the catalog must not be empty.
    pub fn from_levels(levels: Vec<LevelConfig>) -> Result<Self, InvalidConfiguration> {
        if levels.is_empty() {
            return Err(InvalidConfiguration::InvalidCatalog {
                reason: "catalog is empty".to_owned(),
            });
        }
        for (expected, level) in (1..).zip(&levels) {
            if level.id != expected {
                return Err(InvalidConfiguration::InvalidCatalog {
                    reason: format!("expected level id {expected}, found {}", level.id),
                });
            }
        }
        Ok(Self { levels })
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&LevelConfig> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.levels.get(index)
    }

    pub fn next_after(&self, id: u32) -> Result<&LevelConfig, NoNextLevel> {
        id.checked_add(1)
            .and_then(|next| self.get(next))
            .ok_or(NoNextLevel { level_id: id })
    }

    #[must_use]
    pub fn last_level_id(&self) -> u32 {
        self.levels.last().map_or(0, LevelConfig::id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelConfig> + '_ {
        self.levels.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_is_valid() {
        let catalog = LevelCatalog::standard();
        assert_eq!(catalog.len(), 25);
        assert_eq!(catalog.last_level_id(), LevelCatalog::STANDARD_LEN);
        for level in catalog.iter() {
            let rebuilt = LevelConfig::new(level.id(), level.rows(), level.cols(), level.tier());
            assert_eq!(rebuilt.as_ref(), Ok(level));
        }
        assert!(LevelCatalog::from_levels(catalog.iter().copied().collect()).is_ok());
    }

    #[test]
    fn test_standard_catalog_grows_and_groups_tiers() {
        let catalog = LevelCatalog::standard();
        let counts = catalog.iter().map(LevelConfig::card_count).collect::<Vec<_>>();
        assert!(counts.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(counts.first(), Some(&2));
        assert_eq!(counts.last(), Some(&78));
        for (i, tier) in Tier::ALL.iter().enumerate() {
            let ids = catalog
                .iter()
                .filter(|level| level.tier() == *tier)
                .map(LevelConfig::id)
                .collect::<Vec<_>>();
            let first = u32::try_from(i).unwrap() * 5 + 1;
            assert_eq!(ids, (first..first + 5).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_lookup_and_next() {
        let catalog = LevelCatalog::standard();
        assert!(catalog.get(0).is_none());
        assert!(catalog.get(26).is_none());
        assert_eq!(catalog.get(9).map(LevelConfig::card_count), Some(24));
        assert_eq!(catalog.next_after(9).map(LevelConfig::id), Ok(10));
        assert_eq!(
            catalog.next_after(25),
            Err(NoNextLevel { level_id: 25 })
        );
    }

    #[test]
    fn test_rejects_invalid_levels() {
        assert_eq!(
            LevelConfig::new(0, 2, 2, Tier::Easy),
            Err(InvalidConfiguration::InvalidLevelId)
        );
        assert_eq!(
            LevelConfig::new(3, 0, 2, Tier::Easy),
            Err(InvalidConfiguration::ZeroDimension {
                id: 3,
                rows: 0,
                cols: 2
            })
        );
        assert_eq!(
            LevelConfig::new(3, 5, 3, Tier::Easy),
            Err(InvalidConfiguration::OddCardCount { card_count: 15 })
        );
    }

    #[test]
    fn test_catalog_ids_must_be_consecutive() {
        let levels = vec![
            LevelConfig::new(1, 2, 1, Tier::Easy).unwrap(),
            LevelConfig::new(3, 2, 2, Tier::Easy).unwrap(),
        ];
        assert!(matches!(
            LevelCatalog::from_levels(levels),
            Err(InvalidConfiguration::InvalidCatalog { .. })
        ));
        assert!(LevelCatalog::from_levels(vec![]).is_err());
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("very hard".parse::<Tier>(), Ok(Tier::VeryHard));
        assert_eq!("Very_Hard".parse::<Tier>(), Ok(Tier::VeryHard));
        assert_eq!(" Extreme ".parse::<Tier>(), Ok(Tier::Extreme));
        assert_eq!(
            "nightmare".parse::<Tier>(),
            Err(InvalidConfiguration::UnknownTier {
                name: "nightmare".to_owned()
            })
        );
    }

    #[test]
    fn test_level_deserialization_validates() {
        let level: LevelConfig =
            serde_json::from_str(r#"{"id":7,"rows":6,"cols":3,"tier":"medium"}"#).unwrap();
        assert_eq!(level.card_count(), 18);

        let level: LevelConfig = serde_json::from_str(
            r#"{"id":16,"rows":8,"cols":6,"card_count":48,"tier":"very hard"}"#,
        )
        .unwrap();
        assert_eq!(level.tier(), Tier::VeryHard);

        let odd = serde_json::from_str::<LevelConfig>(r#"{"id":1,"rows":3,"cols":3,"tier":"easy"}"#);
        assert!(odd.is_err());
        let mismatch = serde_json::from_str::<LevelConfig>(
            r#"{"id":1,"rows":2,"cols":2,"card_count":6,"tier":"easy"}"#,
        );
        assert!(mismatch.is_err());
        let tier = serde_json::from_str::<LevelConfig>(
            r#"{"id":1,"rows":2,"cols":2,"tier":"legendary"}"#,
        );
        assert!(tier.unwrap_err().to_string().contains("unknown tier"));
    }
}
