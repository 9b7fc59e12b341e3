//! Middleware stack para el servidor HTTP.
//!
//! Tower middleware applied to every request:
//! - `RequestIdLayer`: generates or propagates X-Request-Id
//! - `LoggingLayer`: opens the `http_request` span and logs completion

mod logging;
mod request_id;

pub use logging::{LoggingLayer, LoggingMiddleware};
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer, RequestIdMiddleware};
