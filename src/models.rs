use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderMap, Method},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

pub const FORWARDED_FOR: &str = "x-forwarded-for";
// identity headers set by the auth layer in front of us
pub const AUTHENTICATED_USER: &str = "x-authenticated-user";
pub const USER_ROLE: &str = "x-user-role";

/// Identifier of a request's origin; scopes the rate quota.
///
/// The empty key is the shared bucket for requests whose origin is unknown.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    // forwarded-for first entry wins, then the peer address, then the empty sentinel
    pub fn resolve(forwarded_for: Option<&str>, peer: Option<IpAddr>) -> Self {
        let forwarded = forwarded_for
            .filter(|value| !value.trim().is_empty())
            .and_then(|value| value.split(',').next())
            .map(str::trim);

        match (forwarded, peer) {
            (Some(first), _) => Self(first.to_string()),
            (None, Some(ip)) => Self(ip.to_string()),
            (None, None) => Self::default(),
        }
    }

    pub fn from_headers(headers: &HeaderMap, peer: Option<IpAddr>) -> Self {
        // non-UTF-8 header values count as absent
        let forwarded = headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok());
        Self::resolve(forwarded, peer)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Moderator,
    Staff,
    Superuser,
    Member,
}

impl Role {
    // unknown roles fall back to Member
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "moderator" => Role::Moderator,
            "staff" => Role::Staff,
            "superuser" => Role::Superuser,
            _ => Role::Member,
        }
    }

    pub fn can_moderate(self) -> bool {
        !matches!(self, Role::Member)
    }
}

/// An already-authenticated user, as reported by the surrounding auth layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let username = headers
            .get(AUTHENTICATED_USER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())?;
        let role = headers
            .get(USER_ROLE)
            .and_then(|value| value.to_str().ok())
            .map(Role::parse)
            .unwrap_or(Role::Member);

        Some(Self {
            username: username.to_string(),
            role,
        })
    }
}

/// Everything a gate stage may look at.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub client: ClientKey,
    pub principal: Option<Principal>,
    pub received_at: DateTime<FixedOffset>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>, received_at: DateTime<FixedOffset>) -> Self {
        Self {
            method,
            path: path.into(),
            client: ClientKey::default(),
            principal: None,
            received_at,
        }
    }

    pub fn with_client(mut self, client: impl Into<ClientKey>) -> Self {
        self.client = client.into();
        self
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    // peer address comes from ConnectInfo when the server was started with it
    pub fn from_request(request: &Request, received_at: DateTime<FixedOffset>) -> Self {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            client: ClientKey::from_headers(request.headers(), peer),
            principal: Principal::from_headers(request.headers()),
            received_at,
        }
    }
}

// Stored chat message
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ChatMessage {
    pub id: u64,
    pub sender: String,
    pub body: String,
    pub sent_at: DateTime<FixedOffset>,
}

// POST /api/messages payload
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct NewMessage {
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<IpAddr> {
        Some("10.0.0.7".parse().unwrap())
    }

    #[test]
    fn forwarded_for_first_entry_wins() {
        let key = ClientKey::resolve(Some("1.1.1.1, 2.2.2.2, 3.3.3.3"), peer());
        assert_eq!(key.as_str(), "1.1.1.1");
    }

    #[test]
    fn falls_back_to_peer_address() {
        assert_eq!(ClientKey::resolve(None, peer()).as_str(), "10.0.0.7");
        assert_eq!(ClientKey::resolve(Some(""), peer()).as_str(), "10.0.0.7");
    }

    #[test]
    fn unknown_origin_is_the_empty_sentinel() {
        assert_eq!(ClientKey::resolve(None, None), ClientKey::default());
        assert_eq!(ClientKey::resolve(None, None).as_str(), "");
    }

    #[test]
    fn non_utf8_forwarded_for_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_bytes(b"\xff\xfe").unwrap());
        assert_eq!(ClientKey::from_headers(&headers, peer()).as_str(), "10.0.0.7");
    }

    #[test]
    fn principal_needs_a_username() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ROLE, HeaderValue::from_static("admin"));
        assert!(Principal::from_headers(&headers).is_none());

        headers.insert(AUTHENTICATED_USER, HeaderValue::from_static("alice"));
        let principal = Principal::from_headers(&headers).unwrap();
        assert_eq!(principal.username, "alice");
        assert_eq!(principal.role, Role::Admin);
    }

    #[test]
    fn unknown_role_is_member() {
        assert_eq!(Role::parse("Moderator"), Role::Moderator);
        assert_eq!(Role::parse("guest"), Role::Member);
        assert!(!Role::Member.can_moderate());
        assert!(Role::Staff.can_moderate());
    }
}
