//! Graph construction, importance scoring and read-only queries

pub mod builder;
pub mod bundle;
pub mod centrality;
pub mod exporter;
pub mod hits;
pub mod imports;
pub mod pagerank;
pub mod pipeline;
pub mod resolver;
pub mod session;

#[cfg(test)]
pub mod tests;

pub use builder::{CodeGraphs, GraphBuilder, ImportStats};
pub use bundle::{FileMetrics, GraphBundle, RepoStats};
pub use centrality::betweenness;
pub use exporter::{Exporter, Focus, ScoredEntity, Subgraph, SubgraphNode, TopN, boost};
pub use hits::{HubAuthority, HubAuthorityClassifier};
pub use imports::{FileIndex, ImportResolution, ImportResolver};
pub use pagerank::{ImportanceEngine, Ranking};
pub use pipeline::Analyzer;
pub use resolver::{CallResolution, CallResolver, ResolutionStats};
pub use session::Session;
