//! Florify Server - HTTP REST API for garden blueprint processing
//!
//! This crate exposes the Florify pipeline over HTTP:
//!
//! - **Blueprint Matching**: Find the best reference blueprint by embedding
//!   similarity
//! - **Symbol Detection**: Detect and classify planting symbols in a
//!   blueprint image
//! - **Full Pipeline**: Match, then detect on the matched reference, with
//!   summary, CSV export, and overlay markers
//! - **Label Parsing**: Decode detector class labels into structured
//!   properties
//!
//! # Degraded mode
//!
//! When the reference corpus or embedding index is missing at startup the
//! server still comes up: matching serves a fixed sentinel pairing that is
//! flagged `degraded` in every response, and detection uses the bundled
//! deterministic stand-in detector. Real providers are injected through
//! [`state::ServerState::with_pipeline`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe (reports degraded components)
//! - `POST /api/v1/blueprint/match` - Match a blueprint to the corpus
//! - `GET /api/v1/blueprint/samples` - Sample reference pairs
//! - `POST /api/v1/symbols/detect` - Detect symbols in an image
//! - `POST /api/v1/pipeline` - Full match + detect pipeline
//! - `POST /api/v1/labels/parse` - Parse a class label
//! - `GET /api/v1/metadata` - Server metadata

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use crate::config::ServerConfig;
pub use crate::error::{ServerError, ServerResult};
pub use crate::server::{build_router, start_server};
pub use crate::state::ServerState;
