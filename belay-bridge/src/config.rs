// belay-bridge - Bridge configuration
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Configuration for a [`Bridge`](crate::Bridge).

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use belay_core::DEFAULT_MAX_EVAL_DEPTH;

/// Environment variable holding extra load paths, separated like `PATH`.
pub const LOAD_PATH_VAR: &str = "BELAY_LOAD_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Directories searched for `a/b.bel` when namespace `a.b` is required.
    pub load_paths: Vec<PathBuf>,
    /// In-memory namespace sources, as `(namespace, text)`.
    pub embedded_sources: Vec<(String, String)>,
    pub max_eval_depth: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            load_paths: vec![PathBuf::from("src"), PathBuf::from("lib")],
            embedded_sources: Vec::new(),
            max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
        }
    }
}

impl BridgeConfig {
    /// Defaults, with `BELAY_LOAD_PATH` entries searched first.
    pub fn from_env() -> Self {
        Self::with_load_path_var(env::var_os(LOAD_PATH_VAR))
    }

    pub(crate) fn with_load_path_var(value: Option<OsString>) -> Self {
        let mut config = Self::default();
        if let Some(value) = value {
            let mut paths: Vec<PathBuf> = env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            paths.append(&mut config.load_paths);
            config.load_paths = paths;
        }
        config
    }

    /// Replace the load paths.
    pub fn load_paths(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.load_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn load_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.load_paths.push(path.into());
        self
    }

    /// Make `text` the source of namespace `ns`.
    pub fn embed(mut self, ns: impl Into<String>, text: impl Into<String>) -> Self {
        self.embedded_sources.push((ns.into(), text.into()));
        self
    }

    pub fn max_eval_depth(mut self, depth: usize) -> Self {
        self.max_eval_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(
            config.load_paths,
            vec![PathBuf::from("src"), PathBuf::from("lib")]
        );
        assert_eq!(config.max_eval_depth, DEFAULT_MAX_EVAL_DEPTH);
    }

    #[test]
    fn test_load_path_var_prepends() {
        let value = env::join_paths(["/opt/belay", "/srv/bench"]).unwrap();
        let config = BridgeConfig::with_load_path_var(Some(value));
        assert_eq!(
            config.load_paths,
            vec![
                PathBuf::from("/opt/belay"),
                PathBuf::from("/srv/bench"),
                PathBuf::from("src"),
                PathBuf::from("lib"),
            ]
        );
        assert_eq!(BridgeConfig::with_load_path_var(None), BridgeConfig::default());
    }

    #[test]
    fn test_builders() {
        let config = BridgeConfig::default()
            .load_paths(["a"])
            .load_path("b")
            .embed("x.y", "(ns x.y)")
            .max_eval_depth(50);
        assert_eq!(config.load_paths, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(
            config.embedded_sources,
            vec![("x.y".to_string(), "(ns x.y)".to_string())]
        );
        assert_eq!(config.max_eval_depth, 50);
    }
}
