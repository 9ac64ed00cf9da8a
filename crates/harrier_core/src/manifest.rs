use serde::{Deserialize, Serialize};

/// The version manifest announcing the currently published asset snapshot
/// for a (server, platform) pair.
///
/// Lives at `AK/{server}/{platform}/version.json`. `res_version` names the
/// snapshot directory under `assets/` and is used verbatim when building
/// physical paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionManifest {
    pub res_version: String,

    /// The client build this snapshot was published for.
    #[serde(default)]
    pub client_version: String,

    /// Upstream hash over the published bundle set.
    #[serde(rename = "_AK_AB_HASH", default)]
    pub content_hash: String,
}

/// A single entry of a directory listing, in the `{name, isDir}` wire form
/// consumed by the layers above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_parses_upstream_field_names() {
        let raw = r#"{
            "resVersion": "24-01-01-10-30-00-abcdef",
            "clientVersion": "2.0.01",
            "_AK_AB_HASH": "9f2c1a"
        }"#;

        let manifest: VersionManifest = serde_json::from_str(raw).unwrap();
        assert_eq!(manifest.res_version, "24-01-01-10-30-00-abcdef");
        assert_eq!(manifest.client_version, "2.0.01");
        assert_eq!(manifest.content_hash, "9f2c1a");
    }

    #[test]
    fn manifest_tolerates_missing_hash() {
        let manifest: VersionManifest =
            serde_json::from_str(r#"{"resVersion": "v1", "clientVersion": "c1"}"#).unwrap();
        assert_eq!(manifest.res_version, "v1");
        assert_eq!(manifest.content_hash, "");
    }

    #[test]
    fn dir_entry_uses_camel_case_wire_form() {
        let entry = DirEntry {
            name: "assets".to_string(),
            is_dir: true,
        };
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"name":"assets","isDir":true}"#
        );
    }
}
