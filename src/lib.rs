//! Launchpad Build Lane
//!
//! Client-side orchestration for Canonical's Launchpad build farm:
//! resolves board/system identifiers into distro coordinates, registers
//! build webhooks idempotently, drives snap recipe lifecycles and
//! aggregates build/queue status across architectures.

pub mod auth;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod image;
pub mod mock;
pub mod resolver;
pub mod session;
pub mod snap;
pub mod status;
pub mod webhook;

pub use auth::Credentials;
pub use client::{ApiClient, RequestError};
pub use config::{ConfigError, LaneConfig};
pub use crypto::{CipherError, GpgCipher, MetadataCipher};
pub use error::Error;
pub use image::{AuthorInfo, ImageBuildOptions, ImageBuilder};
pub use resolver::{
    ArchSpec, BoardCatalog, BuildTarget, Codename, Project, ResolveError, Resolver,
};
pub use session::{ApiRequest, ApiResponse, HttpSession, Method, Session, TransportError};
pub use snap::{recipe_name, SnapBuilder};
pub use status::{ArchBuildStatus, BuildStatusAggregator, BuilderQueue};
pub use webhook::{WebhookManager, WebhookOutcome};
