//! Essaymark Engine Library
//!
//! This library provides the core functionality of the Essaymark server.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Engine wiring for services
pub mod context;

/// Password storage and comparison
pub mod credentials;

/// Essay feedback generation
pub mod feedback;

/// Secret management module
pub mod secrets;

/// Flat-file record persistence
pub mod store;

/// LLM provider abstraction layer
pub mod llm;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
