//! Newtype identifiers used to correlate requests with their results.
//!
//! A [`RequestToken`] is minted by the caller when a request is submitted. A
//! [`ResponseToken`] is minted by the dispatcher when the request is admitted.
//! The pair forms a [`TokenMap`], the key under which the result is published.
//! Keeping the two tokens as distinct types prevents handing a response token
//! to code that expects a request token even though both wrap a UUID.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for UUID-wrapped tokens.
// Generates: struct (Copy), new_random(), from_uuid(), as_uuid(), Display.
// ---------------------------------------------------------------------------
macro_rules! uuid_token {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random token.
            pub fn new_random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the underlying [`Uuid`].
            pub fn as_uuid(self) -> Uuid {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_token! {
    /// Identity of one submitted request.
    ///
    /// Generated by the gateway at submission time and returned to the caller
    /// inside its ticket.
    RequestToken
}

uuid_token! {
    /// Delivery identity minted by the dispatcher when it admits a request.
    ResponseToken
}

// ---------------------------------------------------------------------------
// Token map
// ---------------------------------------------------------------------------

/// Pairing of a caller's request identity with the delivery identity the
/// dispatcher minted for it.
///
/// Published at most once per admitted request. Collectors recognise their
/// own map by [`TokenMap::request`] and then use the whole map as the key of
/// the matching response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenMap {
    request: RequestToken,
    response: ResponseToken,
}

impl TokenMap {
    /// Pairs `request` with a freshly generated response token.
    pub fn mint(request: RequestToken) -> Self {
        Self {
            request,
            response: ResponseToken::new_random(),
        }
    }

    /// Creates a map from two existing tokens.
    pub fn new(request: RequestToken, response: ResponseToken) -> Self {
        Self { request, response }
    }

    /// The caller's request token.
    pub fn request(&self) -> RequestToken {
        self.request
    }

    /// The dispatcher's response token.
    pub fn response(&self) -> ResponseToken {
        self.response
    }
}

impl std::fmt::Display for TokenMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.request, self.response)
    }
}

// ---------------------------------------------------------------------------
// Service names
// ---------------------------------------------------------------------------

/// Human-readable name of a wrapped external service (e.g. `"xivapi"`).
///
/// Only used for logging and span fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceName(String);

impl ServiceName {
    /// Creates a service name, returning `None` if the value is empty.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ServiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_maps_keep_the_request_and_differ_in_response() {
        let request = RequestToken::new_random();
        let first = TokenMap::mint(request);
        let second = TokenMap::mint(request);

        assert_eq!(first.request(), request);
        assert_eq!(second.request(), request);
        assert_ne!(first, second);
    }

    #[test]
    fn empty_service_name_is_rejected() {
        assert!(ServiceName::new("").is_none());
        assert_eq!(ServiceName::new("xivapi").unwrap().as_str(), "xivapi");
    }
}
