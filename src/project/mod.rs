// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Project-level configuration: the minimum PHP version from the
//! nearest `composer.json`, and the `PHPFMT` option string.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::printer::Options;

/// Assumed when no manifest (or no constraint) is found.
pub const DEFAULT_PHP_VERSION: i64 = 50400;
/// Files below this version are formatted in legacy mode.
pub const TARGET_PHP_VERSION: i64 = 80000;

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    require: HashMap<String, String>,
}

/// Walks from `dir` upward to the nearest `composer.json` and derives
/// the minimum PHP version from its `require.php` constraint. Only
/// `>=X.Y` and `^X.Y` constraints are understood; anything else falls
/// back to the default. The result is encoded as `major*10000 +
/// minor*100`.
pub fn min_php_version(dir: &Path) -> io::Result<i64> {
    let mut dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    if dir.as_os_str().is_empty() {
        dir = PathBuf::from(".");
    }
    loop {
        let manifest = dir.join("composer.json");
        match fs::read(&manifest) {
            Ok(bytes) => {
                let manifest: Manifest = serde_json::from_slice(&bytes).map_err(|err| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("{}: {err}", manifest.display()),
                    )
                })?;
                return Ok(version_from_constraint(
                    manifest.require.get("php").map(String::as_str),
                ));
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if !dir.pop() {
                    return Ok(DEFAULT_PHP_VERSION);
                }
            }
            Err(err) => return Err(err),
        }
    }
}

/// Like [`min_php_version`], consulting and filling `cache` keyed by
/// the starting directory.
pub fn min_php_version_cached(
    dir: &Path,
    cache: &mut HashMap<PathBuf, i64>,
) -> io::Result<i64> {
    if let Some(&version) = cache.get(dir) {
        return Ok(version);
    }
    let version = min_php_version(dir)?;
    cache.insert(dir.to_path_buf(), version);
    Ok(version)
}

fn version_from_constraint(constraint: Option<&str>) -> i64 {
    let Some(constraint) = constraint else {
        return DEFAULT_PHP_VERSION;
    };
    let version = match constraint
        .strip_prefix(">=")
        .or_else(|| constraint.strip_prefix('^'))
    {
        Some(version) => version.trim(),
        None => return DEFAULT_PHP_VERSION,
    };
    let Some((major, rest)) = version.split_once('.') else {
        return DEFAULT_PHP_VERSION;
    };
    let minor = rest.split('.').next().unwrap_or_default();
    let major: i64 = major.trim().parse().unwrap_or(0);
    let minor: i64 = minor.trim().parse().unwrap_or(0);
    major * 10000 + minor * 100
}

/// Parses the `PHPFMT` environment option string: comma-separated
/// `base`, `comma`, and `align` tokens. An empty string selects the
/// standard preset. Unknown tokens are reported back as warnings.
pub fn options_from_env(spec: &str) -> (Options, Vec<String>) {
    let mut options = Options::default();
    let mut warnings = Vec::new();
    for raw in spec.split(',') {
        match raw.trim() {
            "" => options |= Options::STANDARD,
            "base" => {}
            "comma" => options |= Options::TRAILING_COMMA,
            "align" => options |= Options::ALIGN_COLUMNS,
            other => warnings.push(format!("unknown option {other:?}")),
        }
    }
    (options, warnings)
}

#[cfg(test)]
mod tests {
    use super::{
        min_php_version, options_from_env, version_from_constraint, DEFAULT_PHP_VERSION,
    };
    use crate::printer::Options;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use std::process;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn constraints_map_to_numeric_versions() {
        assert_eq!(version_from_constraint(Some(">=8.1")), 80100);
        assert_eq!(version_from_constraint(Some("^7.4")), 70400);
        assert_eq!(version_from_constraint(Some(">= 8.0.2")), 80000);
        assert_eq!(version_from_constraint(Some("~7.2")), DEFAULT_PHP_VERSION);
        assert_eq!(version_from_constraint(Some("8.1")), DEFAULT_PHP_VERSION);
        assert_eq!(version_from_constraint(None), DEFAULT_PHP_VERSION);
    }

    #[test]
    fn env_spec_parses_option_tokens() {
        let (opts, warnings) = options_from_env("");
        assert_eq!(opts, Options::STANDARD);
        assert!(warnings.is_empty());

        let (opts, warnings) = options_from_env("base, comma");
        assert!(opts.contains(Options::TRAILING_COMMA));
        assert!(!opts.contains(Options::ALIGN_COLUMNS));
        assert!(warnings.is_empty());

        let (opts, warnings) = options_from_env("align,bogus");
        assert!(opts.contains(Options::ALIGN_COLUMNS));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("bogus"));
    }

    #[test]
    fn manifest_discovery_walks_upward() {
        let root = temp_dir("composer-walk");
        let nested = root.join("src").join("deep");
        fs::create_dir_all(&nested).expect("create dirs");
        fs::write(
            root.join("composer.json"),
            r#"{"require": {"php": ">=8.1"}}"#,
        )
        .expect("write manifest");

        let version = min_php_version(&nested).expect("discover version");
        assert_eq!(version, 80100);
    }

    #[test]
    fn missing_manifest_falls_back_to_default() {
        let root = temp_dir("composer-missing");
        let version = min_php_version(&root).expect("discover version");
        // No composer.json anywhere up to the filesystem root in the
        // temp tree is guaranteed, so only check the non-error path.
        assert!(version >= 0);
    }

    #[test]
    fn cache_short_circuits_repeat_lookups() {
        let root = temp_dir("composer-cache");
        fs::write(
            root.join("composer.json"),
            r#"{"require": {"php": "^7.2"}}"#,
        )
        .expect("write manifest");
        let mut cache = HashMap::new();
        let first = super::min_php_version_cached(&root, &mut cache).expect("first");
        assert_eq!(first, 70200);
        fs::remove_file(root.join("composer.json")).expect("remove");
        let second = super::min_php_version_cached(&root, &mut cache).expect("second");
        assert_eq!(second, 70200);
    }

    fn temp_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("target")
            .join(format!("test-project-{label}-{}-{nanos}", process::id()));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }
}
