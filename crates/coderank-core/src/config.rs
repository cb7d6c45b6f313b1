//! Engine configuration, loadable from TOML.

use crate::error::{CodeRankError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub pagerank: PageRankConfig,
    pub hits: HitsConfig,
    pub resolver: ResolverConfig,
    pub export: ExportConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!("loading configuration from {}", path.display());
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| CodeRankError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CodeRankError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let pr = &self.pagerank;
        if !(pr.damping > 0.0 && pr.damping < 1.0) {
            return Err(CodeRankError::Config(format!(
                "pagerank.damping must be in (0, 1), got {}",
                pr.damping
            )));
        }
        if pr.max_iterations == 0 || self.hits.max_iterations == 0 {
            return Err(CodeRankError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if pr.tolerance <= 0.0 || self.hits.tolerance <= 0.0 {
            return Err(CodeRankError::Config(
                "tolerance must be positive".to_string(),
            ));
        }
        let w = self.resolver.ambiguous_weight;
        if !(w > 0.0 && w <= 1.0) {
            return Err(CodeRankError::Config(format!(
                "resolver.ambiguous_weight must be in (0, 1], got {w}"
            )));
        }
        if self.resolver.max_ambiguous_fanout == Some(0) {
            return Err(CodeRankError::Config(
                "resolver.max_ambiguous_fanout must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the rank of nodes without outgoing edges goes each iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingPolicy {
    /// Spread uniformly over all nodes.
    #[default]
    Uniform,
    /// Keep it on the dangling node, as if it linked to itself.
    SelfLoop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    pub damping: f64,
    /// Convergence threshold on the L1 change between iterations.
    pub tolerance: f64,
    pub max_iterations: usize,
    pub dangling: DanglingPolicy,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-8,
            max_iterations: 100,
            dangling: DanglingPolicy::Uniform,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitsConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for HitsConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 100,
        }
    }
}

/// Call-site disambiguation knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Weight of each edge created for an unresolved name collision.
    pub ambiguous_weight: f64,
    /// Resolve to a unique candidate in the caller's own file before
    /// looking at the directory.
    pub prefer_same_file: bool,
    /// Cap on the number of reduced-weight edges per call site. `None`
    /// creates one per candidate.
    pub max_ambiguous_fanout: Option<usize>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ambiguous_weight: 0.3,
            prefer_same_file: true,
            max_ambiguous_fanout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Node cap for whole-graph subgraph queries.
    pub max_subgraph_nodes: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_subgraph_nodes: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrips_through_toml() {
        let config = EngineConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = EngineConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = EngineConfig::from_toml(
            r#"
[pagerank]
damping = 0.9
dangling = "self_loop"

[resolver]
ambiguous_weight = 0.5
max_ambiguous_fanout = 3
"#,
        )
        .unwrap();
        assert_eq!(config.pagerank.damping, 0.9);
        assert_eq!(config.pagerank.dangling, DanglingPolicy::SelfLoop);
        assert_eq!(config.pagerank.max_iterations, 100);
        assert_eq!(config.resolver.max_ambiguous_fanout, Some(3));
        assert!(config.resolver.prefer_same_file);
        assert_eq!(config.export.max_subgraph_nodes, 100);
    }

    #[test]
    fn rejects_out_of_range_damping() {
        let err = EngineConfig::from_toml("[pagerank]\ndamping = 1.0\n").unwrap_err();
        assert!(matches!(err, CodeRankError::Config(_)));
    }

    #[test]
    fn rejects_zero_ambiguous_weight() {
        let err = EngineConfig::from_toml("[resolver]\nambiguous_weight = 0.0\n").unwrap_err();
        assert!(matches!(err, CodeRankError::Config(_)));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coderank.toml");
        std::fs::write(&path, "[export]\nmax_subgraph_nodes = 7\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.export.max_subgraph_nodes, 7);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = EngineConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, CodeRankError::Io(_)));
    }
}
