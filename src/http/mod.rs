//! HTTP-facing types.
//!
//! # Data Flow
//! ```text
//! PendingRequest (method, uri, headers, body)
//!     → request.rs (classify: read/write, file transfer)
//!     → pipeline picks component policies by classification
//!     → transport.rs (Transport::send, wrapped by the composed policy)
//! ```
//!
//! # Design Decisions
//! - Requests are fully buffered (`Bytes`) so every retry resends the same payload
//! - The transport is a collaborator; only the reqwest adapter lives here

pub mod request;
pub mod transport;

pub use request::{classify, classify_request, RequestClassification, TrafficClass, TransferClass};
pub use transport::{PendingRequest, ReqwestTransport, Response, Transport};
