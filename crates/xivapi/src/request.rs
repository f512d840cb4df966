//! Payloads accepted by the Lodestone gateway and the results it returns.
//!
//! A single dispatcher serves both endpoints, so payloads and results are
//! closed sum types matched exhaustively rather than inspected at runtime.

use std::str::FromStr;

use crate::{Character, CharacterSearch, XivApiError};

/// Optional sections of a character profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterData {
    Achievements,
    FriendsList,
    FreeCompany,
    FreeCompanyMembers,
    MountsMinions,
    PvpTeam,
}

impl CharacterData {
    /// Code used in the `data` query parameter.
    pub fn code(self) -> &'static str {
        match self {
            Self::Achievements => "AC",
            Self::FriendsList => "FR",
            Self::FreeCompany => "FC",
            Self::FreeCompanyMembers => "FCM",
            Self::MountsMinions => "MIMO",
            Self::PvpTeam => "PVP",
        }
    }
}

impl FromStr for CharacterData {
    type Err = XivApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AC" => Ok(Self::Achievements),
            "FR" => Ok(Self::FriendsList),
            "FC" => Ok(Self::FreeCompany),
            "FCM" => Ok(Self::FreeCompanyMembers),
            "MIMO" => Ok(Self::MountsMinions),
            "PVP" => Ok(Self::PvpTeam),
            _ => Err(XivApiError::UnknownCharacterData {
                code: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for CharacterData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Extra query parameter of a character search (e.g. `server=Behemoth`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

impl QueryParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Restricts a search to one world.
    pub fn server(world: impl Into<String>) -> Self {
        Self::new("server", world)
    }
}

/// Search for characters by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSearchRequest {
    pub name: String,
    pub params: Vec<QueryParam>,
}

impl CharacterSearchRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, param: QueryParam) -> Self {
        self.params.push(param);
        self
    }
}

/// Fetch one character by Lodestone id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRequest {
    pub id: String,
    pub data: Vec<CharacterData>,
}

impl CharacterRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: CharacterData) -> Self {
        self.data.push(data);
        self
    }
}

/// Every payload the Lodestone gateway dispatches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LodestoneRequest {
    Search(CharacterSearchRequest),
    Character(CharacterRequest),
}

impl From<CharacterSearchRequest> for LodestoneRequest {
    fn from(request: CharacterSearchRequest) -> Self {
        Self::Search(request)
    }
}

impl From<CharacterRequest> for LodestoneRequest {
    fn from(request: CharacterRequest) -> Self {
        Self::Character(request)
    }
}

/// Every result the Lodestone gateway delivers. Mirrors [`LodestoneRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LodestoneResult {
    Search(CharacterSearch),
    Character(Character),
}

impl LodestoneResult {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Search(_) => "search",
            Self::Character(_) => "character",
        }
    }
}
