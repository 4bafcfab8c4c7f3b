//! Node configuration, populated from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime configuration for an LDP node.
///
/// All fields are populated from environment variables with sensible
/// defaults, so a node can be started with zero configuration.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `LDP_BIND` | `0.0.0.0:3000` | TCP socket address to listen on |
/// | `LDP_BASE_IRI` | `http://localhost` | Prefix joined with the request path to form the target IRI |
/// | `LDP_DEFAULT_AGENT` | (absent) | Agent assumed when no session agent is attached |
/// | `LDP_DEFAULT_TYPE` | `text/turtle` | Fallback serialization for `GET`; empty disables it |
/// | `LDP_GRAPH_DB` | (absent = in-memory) | Path to the SQLite graph database |
/// | `LDP_BLOB_DIR` | (absent = in-memory) | Root directory for blob files |
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Socket address the server binds to.
    pub bind_addr: SocketAddr,

    /// Scheme and authority prepended to every request path.
    /// Example: `"https://data.example.com"`.
    pub base_iri: String,

    /// Agent used when the transport attaches no session agent.
    pub default_agent: Option<String>,

    /// Media type served when `Accept` negotiation finds nothing.
    /// `None` makes such reads fail with 406.
    pub default_type: Option<String>,

    /// SQLite file for graphs. `None` keeps graphs in memory.
    pub graph_db: Option<String>,

    /// Directory for blobs. `None` keeps blobs in memory.
    pub blob_dir: Option<PathBuf>,
}

impl NodeConfig {
    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = std::env::var("LDP_BIND")
            .unwrap_or_else(|_| "0.0.0.0:3000".into())
            .parse()
            .expect("LDP_BIND must be a valid socket address (e.g. 0.0.0.0:3000)");

        let default_type = match std::env::var("LDP_DEFAULT_TYPE") {
            Ok(v) if v.trim().is_empty() => None,
            Ok(v) => Some(v.trim().to_ascii_lowercase()),
            Err(_) => Some(ldp::codec::TURTLE.to_string()),
        };

        Self {
            bind_addr,
            base_iri: std::env::var("LDP_BASE_IRI")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost".into()),
            default_agent: std::env::var("LDP_DEFAULT_AGENT").ok(),
            default_type,
            graph_db: std::env::var("LDP_GRAPH_DB").ok(),
            blob_dir: std::env::var("LDP_BLOB_DIR").ok().map(PathBuf::from),
        }
    }

    /// The target IRI for a request path. Query strings never name a
    /// resource, so callers pass the path alone.
    pub fn request_iri(&self, path: &str) -> String {
        format!("{}{}", self.base_iri, path)
    }
}

impl Default for NodeConfig {
    /// In-memory node on `127.0.0.1:0` serving `http://localhost`.
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            base_iri: "http://localhost".into(),
            default_agent: None,
            default_type: Some(ldp::codec::TURTLE.to_string()),
            graph_db: None,
            blob_dir: None,
        }
    }
}
