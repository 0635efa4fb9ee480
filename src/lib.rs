//! Translation manager for a React/Next.js frontend.
//!
//! Reconciles the JSON locale files in a messages directory against the
//! reference locale, scans the frontend for translation key usage, and
//! batch-translates missing or untranslated strings through an external
//! command, streaming progress over WebSocket.

pub mod broadcast;
pub mod compare;
pub mod config;
pub mod error;
pub mod events;
pub mod locale;
pub mod metrics;
pub mod retry;
pub mod scanner;
pub mod server;
pub mod translate;
