//! Packmule - package manager core for game content bundles.
//!
//! This library maintains a persisted dependency graph of remote content
//! projects, materializes the binary artifacts those projects resolve to,
//! and keeps a local output tree synchronized with the graph.
//!
//! # High-Level API
//!
//! ```ignore
//! use packmule::config::OutputLayout;
//! use packmule::fetch::{AsyncReqwestClient, FetchItem, FetchPipeline};
//! use packmule::store::GraphStore;
//! use std::sync::Arc;
//!
//! let store = GraphStore::load("packmule-lock.json")?;
//! let layout = OutputLayout::new(".");
//!
//! let client = AsyncReqwestClient::new()?;
//! let pipeline = FetchPipeline::new(Arc::new(client), layout).with_retries(2);
//! let summary = pipeline.run(FetchItem::from_store(&store), observer).await;
//! ```
//!
//! The platform API clients that populate the graph, the export pipeline
//! that repackages it, and the interactive front end all live outside this
//! crate; they interact with the core through the [`platform`] seam and the
//! read accessors on [`store::GraphStore`].

pub mod config;
pub mod fetch;
pub mod integrity;
pub mod logging;
pub mod platform;
pub mod project;
pub mod store;
pub mod sweep;

/// Version of the Packmule library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
