//! Test helpers para permahost-server.

#![allow(dead_code, unused_imports)]

pub mod client;
pub mod mock;

pub use client::{TestClient, TestResponse};
pub use mock::{FakeMirror, TestApp, app, app_with};
