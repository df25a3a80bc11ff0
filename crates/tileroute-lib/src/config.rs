use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::costing::normalize_mode;
use crate::error::{Error, Result};
use crate::graph::{load_graph, Graph};

/// Parsed configuration tree.
///
/// ```json
/// {
///   "graph":   { "path": "graph.json" },
///   "logging": { "level": "info" },
///   "costing_options": { "auto": { "top_speed": 120 } }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RouteConfig {
    tree: Value,
    base_dir: PathBuf,
}

impl RouteConfig {
    /// Read a configuration file. Relative paths inside it resolve against
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let tree: Value = serde_json::from_str(&contents)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        debug!(path = %path.display(), "loaded configuration");
        Ok(Self::from_value(tree, base_dir))
    }

    pub fn from_value(tree: Value, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            tree,
            base_dir: base_dir.into(),
        }
    }

    /// Base `costing_options.<mode>` subtree.
    pub fn costing_options(&self, mode: &str) -> Option<&Value> {
        self.tree
            .get("costing_options")
            .and_then(|options| options.get(normalize_mode(mode)))
    }

    pub fn graph_path(&self) -> Option<PathBuf> {
        let path = self.tree.get("graph")?.get("path")?.as_str()?;
        let path = Path::new(path);
        Some(if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        })
    }

    /// Default log filter directive, used when `RUST_LOG` is unset.
    pub fn logging_level(&self) -> Option<&str> {
        self.tree.get("logging")?.get("level")?.as_str()
    }

    /// Load the graph named by `graph.path`.
    pub fn load_graph(&self) -> Result<Graph> {
        let path = self.graph_path().ok_or_else(|| Error::GraphLoad {
            path: self.base_dir.clone(),
            message: "configuration has no 'graph.path' entry".to_string(),
        })?;
        load_graph(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn relative_graph_path_resolves_against_config_dir() {
        let config =
            RouteConfig::from_value(json!({"graph": {"path": "g.json"}}), "/etc/tileroute");
        assert_eq!(
            config.graph_path(),
            Some(PathBuf::from("/etc/tileroute/g.json"))
        );
    }

    #[test]
    fn accessors_read_the_tree() {
        let config = RouteConfig::from_value(
            json!({
                "logging": {"level": "debug"},
                "costing_options": {"auto_shorter": {"top_speed": 90}}
            }),
            ".",
        );
        assert_eq!(config.logging_level(), Some("debug"));
        assert_eq!(
            config.costing_options("auto-shorter"),
            Some(&json!({"top_speed": 90}))
        );
        assert!(config.costing_options("auto").is_none());
        assert!(matches!(config.load_graph(), Err(Error::GraphLoad { .. })));
    }

    #[test]
    fn load_reads_file_and_graph() {
        let dir = tempfile::tempdir().expect("temp dir");
        let graph_path = dir.path().join("graph.json");
        fs::write(
            &graph_path,
            r#"{"nodes": [{"id": 1, "lat": 0.0, "lon": 0.0}, {"id": 2, "lat": 0.0, "lon": 0.01}],
                "edges": [{"id": 1, "from": 1, "to": 2}]}"#,
        )
        .expect("write graph");
        let config_path = dir.path().join("config.json");
        let mut file = fs::File::create(&config_path).expect("create config");
        write!(file, r#"{{"graph": {{"path": "graph.json"}}, "costing_options": {{}}}}"#)
            .expect("write config");

        let config = RouteConfig::load(&config_path).expect("loads");
        let graph = config.load_graph().expect("graph loads");
        assert_eq!(graph.edges().len(), 1);
    }
}
