// ABOUTME: OAuth 2.0 client module for connecting patients to health providers
// ABOUTME: Authorization-code grant, refresh and revocation against the provider token endpoints
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # OAuth 2.0 Client Module
//!
//! The engine acts as an OAuth 2.0 client of the provider on behalf of patients:
//! - building the authorize URL for a connection link
//! - exchanging the callback code for tokens
//! - refreshing access tokens near expiry
//! - revoking tokens on disconnect

/// Core OAuth 2.0 client implementation
pub mod client;

pub use client::{OAuth2Client, TokenGrant};
