//! F5 XC API interaction module
//!
//! This module provides the core functionality for talking to an F5
//! Distributed Cloud tenant: the HTTP layer, the authenticated client,
//! and the resource URI catalog.
//!
//! # Module Structure
//!
//! - [`client`] - Main XC client with per-kind URL builders
//! - [`http`] - HTTP utilities for REST API calls
//! - [`uris`] - Resource path templates and object-kind constants

pub mod client;
pub mod http;
pub mod uris;
