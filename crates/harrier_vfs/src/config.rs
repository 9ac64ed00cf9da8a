//! Startup configuration, read once from the environment.
//!
//! All variables carry the `HARRIER_` prefix. A `.env` file in the working
//! directory is loaded first when present.

use std::env;
use std::path::PathBuf;

/// Subtree served by the gamedata override unless configured otherwise.
pub const DEFAULT_GAMEDATA_SUBTREE: &str =
    "unpacked_assetbundle/assets/torappu/dynamicassets/gamedata";

#[derive(Clone, Debug)]
pub struct Config {
    /// Root directory of the local asset mirror.
    pub local_root: PathBuf,

    /// Shared cache connection string.
    pub redis_url: String,

    /// Serve gamedata tables from a version-controlled repository.
    pub use_github_gamedata: bool,
    pub github_token: Option<String>,
    /// `https://github.com/{owner}/{repo}/{ref}/{base…}` form.
    pub github_gamedata_repo: Option<String>,
    pub gamedata_subtree: String,

    /// Probability, in percent, of purging the remote backend's directory
    /// metadata after a remote-served open. Zero disables the policy.
    pub purge_percent: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            local_root: PathBuf::from("./AK_AB_DATA"),
            redis_url: "redis://127.0.0.1:6379/1".to_string(),
            use_github_gamedata: false,
            github_token: None,
            github_gamedata_repo: None,
            gamedata_subtree: DEFAULT_GAMEDATA_SUBTREE.to_string(),
            purge_percent: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            local_root: env::var("HARRIER_LOCAL_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.local_root),
            redis_url: env::var("HARRIER_REDIS_URL").unwrap_or(defaults.redis_url),
            use_github_gamedata: env::var("HARRIER_USE_GITHUB_GAMEDATA")
                .map(|v| flag(&v))
                .unwrap_or(defaults.use_github_gamedata),
            github_token: env::var("HARRIER_GITHUB_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            github_gamedata_repo: env::var("HARRIER_GITHUB_GAMEDATA_REPO").ok(),
            gamedata_subtree: env::var("HARRIER_GAMEDATA_SUBTREE")
                .unwrap_or(defaults.gamedata_subtree),
            purge_percent: env::var("HARRIER_PURGE_PERCENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.purge_percent),
        }
    }
}

fn flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "True")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_conventions() {
        let config = Config::default();
        assert_eq!(config.local_root, PathBuf::from("./AK_AB_DATA"));
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379/1");
        assert!(!config.use_github_gamedata);
        assert_eq!(config.purge_percent, 5);
    }

    #[test]
    fn flag_parsing() {
        assert!(flag("1"));
        assert!(flag("true"));
        assert!(!flag("0"));
        assert!(!flag("yes"));
    }
}
