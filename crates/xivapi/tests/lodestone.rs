use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gateway::{
    CorrelationMode, DispatchError, GatewayConfig, GatewayError, RateLimitConfig, Service,
    ServiceName, ServiceResponse,
};
use xivapi::{
    CharacterData, CharacterRequest, Lodestone, LodestoneRequest, LodestoneResult, XivApiClient,
    XivApiError,
};

/// Answers from canned JSON bodies keyed by search name or character id.
#[derive(Clone)]
struct CannedLodestone {
    decoder: XivApiClient,
    seen: Arc<Mutex<Vec<LodestoneRequest>>>,
}

impl CannedLodestone {
    fn new() -> Self {
        Self {
            decoder: XivApiClient::new("unused").unwrap(),
            seen: Arc::default(),
        }
    }

    fn seen(&self) -> Vec<LodestoneRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Service for CannedLodestone {
    type Payload = LodestoneRequest;
    type Output = LodestoneResult;

    async fn invoke(&self, payload: &LodestoneRequest) -> Result<ServiceResponse, DispatchError> {
        self.seen.lock().unwrap().push(payload.clone());
        let response = match payload {
            LodestoneRequest::Search(request) if request.name == "Nobody" => {
                ServiceResponse::new(200, r#"{"Results": []}"#)
            }
            LodestoneRequest::Search(request) => ServiceResponse::new(
                200,
                format!(
                    r#"{{"Results": [
                        {{"ID": 2, "Name": "{0}s"}},
                        {{"ID": 1, "Name": "{0}"}}
                    ]}}"#,
                    request.name
                ),
            ),
            LodestoneRequest::Character(request) if request.id == "404" => {
                ServiceResponse::new(404, "")
            }
            LodestoneRequest::Character(request) => ServiceResponse::new(
                200,
                format!(
                    r#"{{"Character": {{"ID": {0}, "Name": "C{0}"}},
                        "Mounts": [{{"Name": "Chocobo", "Icon": ""}}],
                        "Minions": null}}"#,
                    request.id
                ),
            ),
        };
        Ok(response)
    }

    fn decode(&self, payload: &LodestoneRequest, body: &[u8]) -> Result<LodestoneResult, DispatchError> {
        self.decoder.decode(payload, body)
    }

    fn absent_on_not_found(&self, payload: &LodestoneRequest) -> bool {
        matches!(payload, LodestoneRequest::Character(_))
    }
}

fn lodestone(service: CannedLodestone) -> Lodestone<CannedLodestone> {
    let config = GatewayConfig {
        rate_limit: RateLimitConfig::new(10.0, 60.0).unwrap(),
        mode: CorrelationMode::Reply,
        ..GatewayConfig::default()
    };
    Lodestone::spawn(ServiceName::new("xivapi").unwrap(), service, config)
}

#[tokio::test(start_paused = true)]
async fn characters_come_back_in_request_order_with_unknown_ids_absent() {
    let service = CannedLodestone::new();
    let lodestone = lodestone(service.clone());

    let characters = lodestone
        .get_characters(vec![
            CharacterRequest::new("7").with_data(CharacterData::MountsMinions),
            CharacterRequest::new("404"),
            CharacterRequest::new("9"),
        ])
        .await
        .unwrap();

    let ids: Vec<_> = characters
        .iter()
        .map(|c| c.as_ref().map(|c| c.character.id))
        .collect();
    assert_eq!(ids, vec![Some(7), None, Some(9)]);
    let first = characters[0].as_ref().unwrap();
    assert_eq!(first.mounts.len(), 1);
    assert!(first.minions.is_empty());
    assert_eq!(service.seen().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn names_resolve_only_on_exact_match() {
    let service = CannedLodestone::new();
    let lodestone = lodestone(service.clone());

    let names = vec!["Warrior Of Light".to_string(), "Nobody".to_string()];
    let profiles = lodestone.resolve_names(&names, Some("Behemoth")).await.unwrap();

    assert_eq!(profiles[0].as_ref().map(|p| p.id), Some(1));
    assert!(profiles[1].is_none());
    match &service.seen()[0] {
        LodestoneRequest::Search(request) => {
            assert_eq!(request.params[0].name, "server");
            assert_eq!(request.params[0].value, "Behemoth");
        }
        other => panic!("unexpected payload {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn searches_decode_through_the_facade() {
    let lodestone = lodestone(CannedLodestone::new());
    assert_eq!(lodestone.gateway().name().as_str(), "xivapi");

    let searches = lodestone
        .search_characters(vec![xivapi::CharacterSearchRequest::new("Y'shtola Rhul")])
        .await
        .unwrap();

    assert_eq!(searches[0].as_ref().map(|s| s.results.len()), Some(2));
    lodestone.shutdown().await;
}

#[test]
fn gateway_errors_convert_into_adapter_errors() {
    let err: XivApiError = GatewayError::Closed.into();
    assert!(matches!(err, XivApiError::Gateway(GatewayError::Closed)));
}
