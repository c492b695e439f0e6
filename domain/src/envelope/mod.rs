//! Outgoing chat request.
//!
//! - [`entities::OutgoingEnvelope`]: the JSON body of a streaming chat request
//! - [`routing::RoutingHint`]: steering toward the search or image specialist

pub mod entities;
pub mod routing;
