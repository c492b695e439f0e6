//! HTTP adapters for the chat backend
//!
//! All adapters share one [`BackendClient`] (base URL, connection pool,
//! request timeout) and map [`BackendError`] into the error type of the
//! port they implement.
//!
//! | Endpoint | Adapter |
//! |----------|---------|
//! | `POST /api/chat/stream` (SSE) | [`HttpChatTransport`] |
//! | `POST /api/confirmation/respond` | [`HttpConfirmationGateway`] |
//! | `POST /api/upload/image` (multipart) | [`HttpAttachmentUploader`] |
//! | `/api/sessions` | [`HttpSessionGateway`] |

pub mod client;
pub mod confirmation;
pub mod error;
pub mod sessions;
pub mod sse;
pub mod transport;
pub mod upload;

pub use client::BackendClient;
pub use confirmation::HttpConfirmationGateway;
pub use error::BackendError;
pub use sessions::{HttpSessionGateway, InMemorySessionGateway};
pub use sse::parse_frame;
pub use transport::HttpChatTransport;
pub use upload::HttpAttachmentUploader;
