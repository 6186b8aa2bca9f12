//! Organizer library
//!
//! Bundles ordered lists of stylesheet or script fragments into single
//! cached artifacts served through a deterministic URL.

pub mod cli;
pub mod config;
pub mod bundler;
pub mod cache;
pub mod error;
pub mod organizer;
pub mod resolver;
pub mod transform;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use bundler::{BundleKind, Bundler};
pub use cache::{Cache, CacheKey};
pub use error::{OrganizerError, Result};
pub use organizer::Organizer;
