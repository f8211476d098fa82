//! Companion web application client

pub mod client;

pub use client::WebappClient;
