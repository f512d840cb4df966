//! reqwest implementation of the Lodestone [`Service`].

use std::time::Duration;

use async_trait::async_trait;
use gateway::{DispatchError, ResponseHeaders, Service, ServiceResponse};
use reqwest::Url;
use tracing::debug;

use crate::{
    Character, CharacterRequest, CharacterSearch, CharacterSearchRequest, LodestoneRequest,
    LodestoneResult, XivApiError,
};

/// Public XIVAPI endpoint.
pub const XIVAPI_BASE_URL: &str = "https://xivapi.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for the Lodestone character endpoints.
///
/// Every call carries the account's `private_key`. The key is treated as an
/// opaque string.
#[derive(Clone)]
pub struct XivApiClient {
    http: reqwest::Client,
    base_url: Url,
    private_key: String,
}

impl std::fmt::Debug for XivApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XivApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl XivApiClient {
    /// Creates a client for the public XIVAPI endpoint.
    pub fn new(private_key: impl Into<String>) -> Result<Self, XivApiError> {
        Self::with_base_url(XIVAPI_BASE_URL, private_key)
    }

    /// Creates a client for an alternative endpoint (mirrors, local fakes).
    pub fn with_base_url(
        base_url: &str,
        private_key: impl Into<String>,
    ) -> Result<Self, XivApiError> {
        let base_url = Url::parse(base_url).map_err(|err| XivApiError::InvalidUrl {
            message: format!("{base_url}: {err}"),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(XivApiError::InvalidUrl {
                message: format!("{base_url} cannot carry a path"),
            });
        }
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url,
            private_key: private_key.into(),
        })
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, XivApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| XivApiError::InvalidUrl {
                message: format!("{} cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("private_key", &self.private_key);
        Ok(url)
    }

    /// `GET /character/search?private_key=K&name=N[&k=v]...`
    pub fn search_url(&self, request: &CharacterSearchRequest) -> Result<Url, XivApiError> {
        let mut url = self.endpoint(["character", "search"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("name", &request.name);
            for param in &request.params {
                query.append_pair(&param.name, &param.value);
            }
        }
        Ok(url)
    }

    /// `GET /character/{id}?private_key=K[&data=A,B]`
    pub fn character_url(&self, request: &CharacterRequest) -> Result<Url, XivApiError> {
        let mut url = self.endpoint(["character", request.id.as_str()])?;
        if !request.data.is_empty() {
            let data = request
                .data
                .iter()
                .map(|d| d.code())
                .collect::<Vec<_>>()
                .join(",");
            url.query_pairs_mut().append_pair("data", &data);
        }
        Ok(url)
    }

    fn url_for(&self, payload: &LodestoneRequest) -> Result<Url, XivApiError> {
        match payload {
            LodestoneRequest::Search(request) => {
                debug!(name = %request.name, "sending character search request");
                self.search_url(request)
            }
            LodestoneRequest::Character(request) => {
                debug!(id = %request.id, "sending character request");
                self.character_url(request)
            }
        }
    }
}

#[async_trait]
impl Service for XivApiClient {
    type Payload = LodestoneRequest;
    type Output = LodestoneResult;

    async fn invoke(&self, payload: &LodestoneRequest) -> Result<ServiceResponse, DispatchError> {
        let url = self.url_for(payload).map_err(DispatchError::transport)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(DispatchError::transport)?;

        let status = response.status().as_u16();
        let mut headers = ResponseHeaders::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str(), value);
            }
        }
        let body = response
            .bytes()
            .await
            .map_err(DispatchError::transport)?
            .to_vec();

        Ok(ServiceResponse {
            status,
            headers,
            body,
        })
    }

    fn decode(&self, payload: &LodestoneRequest, body: &[u8]) -> Result<LodestoneResult, DispatchError> {
        match payload {
            LodestoneRequest::Search(_) => serde_json::from_slice::<CharacterSearch>(body)
                .map(LodestoneResult::Search)
                .map_err(DispatchError::decode),
            LodestoneRequest::Character(_) => serde_json::from_slice::<Character>(body)
                .map(LodestoneResult::Character)
                .map_err(DispatchError::decode),
        }
    }

    /// Unknown character ids are a normal outcome; an unknown search route is not.
    fn absent_on_not_found(&self, payload: &LodestoneRequest) -> bool {
        matches!(payload, LodestoneRequest::Character(_))
    }
}
