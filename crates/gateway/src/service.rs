//! The port every wrapped external service implements.

use async_trait::async_trait;

use crate::{DispatchError, ServiceResponse};

/// An external quota-limited service the dispatcher can call.
///
/// Implemented by infrastructure crates. The dispatcher owns its service
/// exclusively, so at most one call is in flight at any time.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Request payload accepted by the service.
    type Payload: std::fmt::Debug + Send + Sync + 'static;

    /// Typed result decoded from a successful response.
    type Output: Send + 'static;

    /// Performs one call.
    ///
    /// Only transport failures are errors; every HTTP status, including 429,
    /// is returned as a [`ServiceResponse`] for the dispatcher to classify.
    async fn invoke(&self, payload: &Self::Payload) -> Result<ServiceResponse, DispatchError>;

    /// Decodes the body of a 2xx response.
    fn decode(&self, payload: &Self::Payload, body: &[u8]) -> Result<Self::Output, DispatchError>;

    /// Whether a 404 for `payload` means "absent" rather than failure.
    fn absent_on_not_found(&self, _payload: &Self::Payload) -> bool {
        false
    }
}
