//! XIVAPI Lodestone infrastructure adapter.
//!
//! Implements the [`gateway::Service`] port for the character search and
//! character detail endpoints, and wraps the resulting [`gateway::Gateway`]
//! in the typed [`Lodestone`] facade.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL assembly, HTTP transport and JSON decoding live
//! here. Throttling, retry and correlation are inherited from the [`gateway`]
//! crate, which knows nothing about XIVAPI.
//!
//! ## Module Layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | `client`    | [`XivApiClient`]: reqwest-backed `Service` implementation   |
//! | `error`     | [`XivApiError`]                                             |
//! | `lodestone` | [`Lodestone`]: typed `search_characters` / `get_characters` |
//! | `models`    | serde response bodies                                       |
//! | `request`   | [`LodestoneRequest`] / [`LodestoneResult`] and their parts  |

mod client;
mod error;
mod lodestone;
mod models;
mod request;

pub use client::{XivApiClient, XIVAPI_BASE_URL};
pub use error::XivApiError;
pub use lodestone::{Lodestone, SERVICE_NAME};
pub use models::{
    Character, CharacterProfile, CharacterSearch, Minion, Mount, Pagination,
    ReducedCharacterProfile,
};
pub use request::{
    CharacterData, CharacterRequest, CharacterSearchRequest, LodestoneRequest, LodestoneResult,
    QueryParam,
};
