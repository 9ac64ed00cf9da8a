use harrier_core::prelude::*;

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::debug;

/// Location of the gamedata tables inside a GitHub repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GamedataRepo {
    owner: String,
    repo: String,
    refspec: String,
    base_path: String,
}

impl GamedataRepo {
    /// Parse the `https://github.com/{owner}/{repo}/{ref}/{base...}` form
    /// used in configuration. The base path may be empty.
    pub fn parse(url: &str) -> Result<Self, BackendError> {
        let trimmed = url
            .strip_prefix("https://github.com/")
            .unwrap_or(url)
            .trim_matches('/');

        let mut segments = trimmed.splitn(4, '/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(owner), Some(repo), Some(refspec))
                if !owner.is_empty() && !repo.is_empty() && !refspec.is_empty() =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    refspec: refspec.to_string(),
                    base_path: segments.next().unwrap_or_default().to_string(),
                })
            }
            _ => Err(BackendError::Unavailable(format!(
                "invalid gamedata repo url: {url}"
            ))),
        }
    }

    fn raw_url(&self, rel: &str) -> String {
        let rel = rel.trim_start_matches('/');
        if self.base_path.is_empty() {
            format!(
                "https://raw.githubusercontent.com/{}/{}/{}/{rel}",
                self.owner, self.repo, self.refspec
            )
        } else {
            format!(
                "https://raw.githubusercontent.com/{}/{}/{}/{}/{rel}",
                self.owner, self.repo, self.refspec, self.base_path
            )
        }
    }
}

/// Gamedata override backend.
///
/// Serves only paths under the configured subtree, reading file content from
/// a version-controlled repository instead of the asset mirrors. Game-data
/// tables on the repository are typically fresher than the unpacked bundles
/// on either mirror.
#[derive(Clone)]
pub struct GithubStore {
    client: Client,
    repo: GamedataRepo,
    subtree: String,
}

impl GithubStore {
    pub fn new(
        repo: GamedataRepo,
        subtree: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| BackendError::Unavailable(format!("invalid github token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(concat!("harrier/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            repo,
            subtree: subtree.into(),
        })
    }

    /// Path remainder below the configured subtree, if the path is served.
    fn relative<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.split_once(self.subtree.as_str())
            .map(|(_, rest)| rest)
    }
}

impl Backend for GithubStore {
    async fn list(&self, path: &str) -> Result<Vec<DirEntry>, BackendError> {
        Err(BackendError::Unavailable(format!(
            "gamedata override cannot list {path}"
        )))
    }

    async fn open(&self, path: &str) -> Result<Bytes, BackendError> {
        let Some(rel) = self.relative(path) else {
            return Err(BackendError::NotFound(path.to_string()));
        };

        let url = self.repo.raw_url(rel);
        debug!(%url, "fetching gamedata override");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(path.to_string())),
            status if status.is_success() => response
                .bytes()
                .await
                .map_err(|e| BackendError::Unavailable(e.to_string())),
            status => Err(BackendError::Unavailable(format!(
                "github returned {status} for {url}"
            ))),
        }
    }
}

impl OverrideBackend for GithubStore {
    fn serves(&self, path: &str) -> bool {
        path.contains(self.subtree.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBTREE: &str = "unpacked_assetbundle/assets/torappu/dynamicassets/gamedata";

    fn store() -> GithubStore {
        let repo =
            GamedataRepo::parse("https://github.com/example/GameData/master/zh_CN/gamedata")
                .unwrap();
        GithubStore::new(repo, SUBTREE, None).unwrap()
    }

    #[test]
    fn parses_repo_url() {
        let repo =
            GamedataRepo::parse("https://github.com/example/GameData/master/zh_CN/gamedata")
                .unwrap();
        assert_eq!(
            repo,
            GamedataRepo {
                owner: "example".to_string(),
                repo: "GameData".to_string(),
                refspec: "master".to_string(),
                base_path: "zh_CN/gamedata".to_string(),
            }
        );

        let repo = GamedataRepo::parse("example/GameData/main").unwrap();
        assert_eq!(repo.base_path, "");

        assert!(GamedataRepo::parse("https://github.com/example").is_err());
    }

    #[test]
    fn builds_raw_content_urls() {
        let repo = GamedataRepo::parse("example/GameData/master/zh_CN/gamedata").unwrap();
        assert_eq!(
            repo.raw_url("/excel/item_table.json"),
            "https://raw.githubusercontent.com/example/GameData/master/zh_CN/gamedata/excel/item_table.json"
        );

        let bare = GamedataRepo::parse("example/GameData/master").unwrap();
        assert_eq!(
            bare.raw_url("/excel/item_table.json"),
            "https://raw.githubusercontent.com/example/GameData/master/excel/item_table.json"
        );
    }

    #[test]
    fn serves_only_subtree_paths() {
        let store = store();

        let physical =
            format!("AK/en/android/assets/v1/{SUBTREE}/excel/item_table.json");
        assert!(store.serves(&physical));
        assert!(store.serves(&format!("{SUBTREE}/excel/item_table.json")));
        assert!(!store.serves("AK/en/android/assets/v1/audio/bgm.wav"));

        assert_eq!(
            store.relative(&physical),
            Some("/excel/item_table.json")
        );
    }
}
