//! Layout of the asset tree: `AK/{server}/{platform}/assets/{resVersion}/…`.

/// Version sentinel resolving to the currently published version.
pub const LATEST: &str = "latest";

/// Directory-name prefix marking staging version folders. Excluded from
/// fallback search.
pub const STAGING_PREFIX: &str = "_next";

/// Collapse doubled separators and strip the leading slash controllers tend
/// to pass through.
pub fn normalize(path: &str) -> String {
    path.replace("//", "/").trim_start_matches('/').to_string()
}

pub fn version_manifest_path(server: &str, platform: &str) -> String {
    format!("AK/{server}/{platform}/version.json")
}

pub fn asset_root(server: &str, platform: &str) -> String {
    format!("AK/{server}/{platform}/assets")
}

pub fn asset_path(server: &str, platform: &str, res_version: &str, logical: &str) -> String {
    format!("AK/{server}/{platform}/assets/{res_version}/{logical}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/a/b.png", "a/b.png")]
    #[case("a//b.png", "a/b.png")]
    #[case("//a/b.png", "a/b.png")]
    #[case("a/b.png", "a/b.png")]
    fn normalize_strips_leading_and_doubled_separators(
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn layout() {
        assert_eq!(
            version_manifest_path("en", "android"),
            "AK/en/android/version.json"
        );
        assert_eq!(asset_root("en", "android"), "AK/en/android/assets");
        assert_eq!(
            asset_path("en", "android", "v1", "foo/bar.png"),
            "AK/en/android/assets/v1/foo/bar.png"
        );
    }
}
