//! Response bodies returned by the Lodestone endpoints.
//!
//! Only the fields the bot reads are modelled; everything else in the
//! payload is ignored. XIVAPI uses PascalCase keys.

use serde::{Deserialize, Serialize};

/// A mount owned by a character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Mount {
    pub name: String,
    pub icon: String,
}

/// A minion owned by a character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Minion {
    pub name: String,
    pub icon: String,
}

/// Abbreviated profile used in search results and free company rosters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ReducedCharacterProfile {
    pub avatar: String,
    pub feast_matches: u32,
    #[serde(rename = "ID", alias = "Id")]
    pub id: u64,
    pub lang: String,
    pub name: String,
    pub rank: Option<String>,
    pub rank_icon: Option<String>,
    pub server: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CharacterProfile {
    pub name: String,
    #[serde(rename = "ID", alias = "Id")]
    pub id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Pagination {
    pub page: u32,
    pub page_next: Option<u32>,
    pub page_prev: Option<u32>,
    pub page_total: u32,
    pub results: u32,
    pub results_per_page: u32,
    pub results_total: u32,
}

/// Body of `GET /character/search`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CharacterSearch {
    pub pagination: Pagination,
    pub results: Vec<ReducedCharacterProfile>,
}

impl CharacterSearch {
    /// The result whose name equals `name` exactly, if any.
    pub fn exact_match(&self, name: &str) -> Option<&ReducedCharacterProfile> {
        self.results.iter().find(|profile| profile.name == name)
    }
}

/// Body of `GET /character/{id}`.
///
/// The optional sections are only populated when requested through
/// [`crate::CharacterData`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Character {
    pub character: CharacterProfile,
    #[serde(deserialize_with = "null_as_empty")]
    pub free_company_members: Vec<ReducedCharacterProfile>,
    #[serde(deserialize_with = "null_as_empty")]
    pub minions: Vec<Minion>,
    #[serde(deserialize_with = "null_as_empty")]
    pub mounts: Vec<Mount>,
}

// Sections that were not requested come back as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
