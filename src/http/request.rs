//! Request classification.
//!
//! # Responsibilities
//! - Derive read/write class from the HTTP method (selects the throttle budget)
//! - Derive file-transfer class from the path (selects the timeout)
//!
//! # Design Decisions
//! - Classification is a pure function of method + path
//! - Path matching is segment based and case-insensitive, query string ignored
//! - No regex to guarantee O(n) matching

use http::{Method, Request};

/// Derived metadata about a request. Never stored, always recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RequestClassification {
    /// True for mutating methods (POST, PUT, PATCH, DELETE).
    pub is_write: bool,
    /// True for content downloads and file upload chunks.
    pub is_file_transfer: bool,
}

impl RequestClassification {
    pub fn traffic(&self) -> TrafficClass {
        if self.is_write {
            TrafficClass::Publish
        } else {
            TrafficClass::Read
        }
    }

    pub fn transfer(&self) -> TransferClass {
        if self.is_file_transfer {
            TransferClass::FileTransfer
        } else {
            TransferClass::Standard
        }
    }
}

/// Which client throttle budget a request draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrafficClass {
    Read,
    Publish,
}

impl TrafficClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficClass::Read => "read",
            TrafficClass::Publish => "publish",
        }
    }
}

impl std::fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which timeout a request gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferClass {
    Standard,
    FileTransfer,
}

impl TransferClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferClass::Standard => "standard",
            TransferClass::FileTransfer => "file_transfer",
        }
    }
}

impl std::fmt::Display for TransferClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a request from its method and path.
///
/// `path` may carry a query string; it is ignored.
pub fn classify(method: &Method, path: &str) -> RequestClassification {
    RequestClassification {
        is_write: is_write_method(method),
        is_file_transfer: is_file_transfer_path(path),
    }
}

/// Classify a pending request.
pub fn classify_request<B>(request: &Request<B>) -> RequestClassification {
    classify(request.method(), request.uri().path())
}

fn is_write_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn is_file_transfer_path(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        // .../{contentType}/{id}/content
        [.., _content_type, _id, last] if last.eq_ignore_ascii_case("content") => true,
        // .../fileUploads/{id}
        [.., uploads, _id] if uploads.eq_ignore_ascii_case("fileUploads") => true,
        _ => false,
    }
}
