//! Scripted in-process service shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gateway::{
    CorrelationConfig, CorrelationMode, DispatchError, GatewayConfig, RateLimitConfig, Service,
    ServiceResponse,
};
use tokio::time::Instant;
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Payload of the fake service. Lookups treat 404 as absent, searches do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Lookup(u32),
    Search(u32),
}

impl Call {
    pub fn id(self) -> u32 {
        match self {
            Self::Lookup(id) | Self::Search(id) => id,
        }
    }
}

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Scripted {
    Respond(ServiceResponse),
    TransportFailure,
}

#[derive(Default)]
struct State {
    scripts: HashMap<u32, VecDeque<Scripted>>,
    calls: Vec<(u32, Instant)>,
}

/// Answers 200 with the request id as body unless a script says otherwise.
#[derive(Clone, Default)]
pub struct FakeService {
    state: Arc<Mutex<State>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues answers for `id`; once exhausted the default 200 applies.
    pub fn script(&self, id: u32, answers: impl IntoIterator<Item = Scripted>) {
        let mut state = self.state.lock().unwrap();
        state.scripts.entry(id).or_default().extend(answers);
    }

    /// Ids in invocation order, with the (paused) time of each call.
    pub fn calls(&self) -> Vec<(u32, Instant)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_ids(&self) -> Vec<u32> {
        self.calls().into_iter().map(|(id, _)| id).collect()
    }

    /// Gaps between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        self.calls()
            .windows(2)
            .map(|pair| pair[1].1 - pair[0].1)
            .collect()
    }
}

#[async_trait]
impl Service for FakeService {
    type Payload = Call;
    type Output = u32;

    async fn invoke(&self, payload: &Call) -> Result<ServiceResponse, DispatchError> {
        let next = {
            let mut state = self.state.lock().unwrap();
            state.calls.push((payload.id(), Instant::now()));
            state
                .scripts
                .get_mut(&payload.id())
                .and_then(VecDeque::pop_front)
        };
        match next {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::TransportFailure) => Err(DispatchError::transport("connection reset")),
            None => Ok(ServiceResponse::new(200, payload.id().to_string())),
        }
    }

    fn decode(&self, _payload: &Call, body: &[u8]) -> Result<u32, DispatchError> {
        std::str::from_utf8(body)
            .map_err(DispatchError::decode)?
            .parse()
            .map_err(DispatchError::decode)
    }

    fn absent_on_not_found(&self, payload: &Call) -> bool {
        matches!(payload, Call::Lookup(_))
    }
}

pub fn rate_limited() -> Scripted {
    Scripted::Respond(ServiceResponse::new(429, ""))
}

pub fn rate_limited_for(seconds: &str) -> Scripted {
    Scripted::Respond(ServiceResponse::new(429, "").with_header("Retry-After", seconds))
}

pub fn status(code: u16) -> Scripted {
    Scripted::Respond(ServiceResponse::new(code, ""))
}

pub fn config(rate: f64, max_wait: f64, mode: CorrelationMode) -> GatewayConfig {
    GatewayConfig {
        rate_limit: RateLimitConfig::new(rate, max_wait).unwrap(),
        max_retries: None,
        correlation: CorrelationConfig::default(),
        mode,
    }
}

/// Counts `error`-level events emitted while installed on the current thread.
///
/// The paused-clock tests run on a current-thread runtime, so the dispatcher
/// task logs through the same thread-local subscriber.
#[derive(Clone, Default)]
pub struct ErrorEvents(Arc<AtomicUsize>);

impl ErrorEvents {
    pub fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
