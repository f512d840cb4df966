//! Typed facade over the correlated Lodestone gateway.

use gateway::{Gateway, GatewayConfig, Service, ServiceName};
use tracing::debug;

use crate::{
    Character, CharacterRequest, CharacterSearch, CharacterSearchRequest, LodestoneRequest,
    LodestoneResult, QueryParam, ReducedCharacterProfile, XivApiClient, XivApiError,
};

/// Default service name used in logs and spans.
pub const SERVICE_NAME: &str = "xivapi";

/// Rate-limited access to the Lodestone endpoints.
///
/// Owns a [`Gateway`]; share it between tasks behind an `Arc`.
pub struct Lodestone<S = XivApiClient>
where
    S: Service<Payload = LodestoneRequest, Output = LodestoneResult>,
{
    gateway: Gateway<S>,
}

impl<S> Lodestone<S>
where
    S: Service<Payload = LodestoneRequest, Output = LodestoneResult>,
{
    /// Spawns the dispatcher for `service`. Must be called inside a tokio runtime.
    pub fn spawn(name: ServiceName, service: S, config: GatewayConfig) -> Self {
        Self {
            gateway: Gateway::spawn(name, service, config),
        }
    }

    pub fn gateway(&self) -> &Gateway<S> {
        &self.gateway
    }

    /// Runs every search and returns the results in request order.
    pub async fn search_characters(
        &self,
        requests: Vec<CharacterSearchRequest>,
    ) -> Result<Vec<Option<CharacterSearch>>, XivApiError> {
        let payloads = requests.into_iter().map(LodestoneRequest::from).collect();
        self.gateway
            .request_all(payloads)
            .await?
            .into_iter()
            .map(|result| match result {
                None => Ok(None),
                Some(LodestoneResult::Search(search)) => Ok(Some(search)),
                Some(other) => Err(mismatch("search", &other)),
            })
            .collect()
    }

    /// Fetches every character and returns the results in request order.
    ///
    /// Unknown ids yield `None`.
    pub async fn get_characters(
        &self,
        requests: Vec<CharacterRequest>,
    ) -> Result<Vec<Option<Character>>, XivApiError> {
        let payloads = requests.into_iter().map(LodestoneRequest::from).collect();
        self.gateway
            .request_all(payloads)
            .await?
            .into_iter()
            .map(|result| match result {
                None => Ok(None),
                Some(LodestoneResult::Character(character)) => Ok(Some(character)),
                Some(other) => Err(mismatch("character", &other)),
            })
            .collect()
    }

    /// Resolves each name to the profile whose name matches it exactly.
    pub async fn resolve_names(
        &self,
        names: &[String],
        server: Option<&str>,
    ) -> Result<Vec<Option<ReducedCharacterProfile>>, XivApiError> {
        let requests = names
            .iter()
            .map(|name| {
                let request = CharacterSearchRequest::new(name.as_str());
                match server {
                    Some(server) => request.with_param(QueryParam::server(server)),
                    None => request,
                }
            })
            .collect();
        let searches = self.search_characters(requests).await?;

        Ok(names
            .iter()
            .zip(searches)
            .map(|(name, search)| {
                let found = search.and_then(|s| s.exact_match(name).cloned());
                debug!(%name, found = found.is_some(), "resolved character name");
                found
            })
            .collect())
    }

    /// Stops accepting requests and waits for in-flight ones to finish.
    pub async fn shutdown(self) {
        self.gateway.shutdown().await;
    }
}

fn mismatch(expected: &'static str, actual: &LodestoneResult) -> XivApiError {
    XivApiError::MismatchedResult {
        expected,
        actual: actual.kind(),
    }
}
