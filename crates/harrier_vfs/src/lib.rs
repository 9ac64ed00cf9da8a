//! # Harrier VFS
//!
//! The asset resolution facade: one read surface over a fast local mirror, a
//! bulk remote store and an optional gamedata override, with a two-tier
//! cache in front of every backend call and a fallback search across
//! historical version directories when the current version lacks an asset.

pub mod config;
pub mod overlay;
pub mod paths;
pub mod version;

mod smart;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::overlay::{AssetFs, PurgePolicy};
    pub use crate::paths::{LATEST, STAGING_PREFIX};
    pub use crate::version::{MANIFEST_TTL, VersionService};

    pub use harrier_cache::{CacheClient, CacheOptions};
    pub use harrier_core::prelude::*;
}
