use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Rank given to any category outside the known set.
pub const UNRANKED: u8 = 99;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GroupCategory {
    Station,
    Constellation,
    Debris,
    #[serde(alias = "rocket-body")]
    RocketBody,
    #[serde(alias = "generic-active")]
    GenericActive,
    #[serde(other)]
    Other,
}

impl GroupCategory {
    /// Specificity rank, lower wins ownership of a shared catalog id.
    pub fn rank(self) -> u8 {
        match self {
            GroupCategory::Station => 0,
            GroupCategory::Constellation => 1,
            GroupCategory::Debris => 2,
            GroupCategory::RocketBody => 3,
            GroupCategory::GenericActive => 4,
            GroupCategory::Other => UNRANKED,
        }
    }
}

/// A named feed of element sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ObjectGroup {
    pub id: String,
    pub label: String,
    #[schema(value_type = String)]
    pub category: GroupCategory,
    /// Rendering hint passed through to consumers.
    #[serde(default)]
    pub color: Option<String>,
    pub source: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ObjectGroup {
    fn celestrak(
        id: &str,
        label: &str,
        category: GroupCategory,
        color: &str,
        enabled: bool,
    ) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            category,
            color: Some(color.to_string()),
            source: format!(
                "https://celestrak.org/NORAD/elements/gp.php?GROUP={}&FORMAT=json",
                id
            ),
            enabled,
        }
    }
}

/// Groups used when the configuration file does not list any.
pub fn default_groups() -> Vec<ObjectGroup> {
    use GroupCategory::*;
    vec![
        ObjectGroup::celestrak("stations", "Space Stations", Station, "#ff5555", true),
        ObjectGroup::celestrak("starlink", "Starlink", Constellation, "#5599ff", true),
        ObjectGroup::celestrak("oneweb", "OneWeb", Constellation, "#55ddff", false),
        ObjectGroup::celestrak("gps-ops", "GPS", Constellation, "#ffcc33", true),
        ObjectGroup::celestrak("galileo", "Galileo", Constellation, "#ffaa33", false),
        ObjectGroup::celestrak(
            "cosmos-1408-debris",
            "Cosmos 1408 Debris",
            Debris,
            "#aaaaaa",
            false,
        ),
        ObjectGroup::celestrak(
            "fengyun-1c-debris",
            "Fengyun 1C Debris",
            Debris,
            "#999999",
            false,
        ),
        ObjectGroup::celestrak("active", "Active Satellites", GenericActive, "#77ee77", true),
    ]
}
