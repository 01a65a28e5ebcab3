//! Error types for steamchain.

use crate::types::NodeId;

/// Where the data being processed came from when an error was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseContext {
    /// Nothing had been fetched yet for the node.
    None,
    /// The friend list was read from the cache.
    FromCache,
    /// The friend list came from the network; `body` is the raw payload.
    Network { body: String },
}

impl std::fmt::Display for ResponseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("<no response>"),
            Self::FromCache => f.write_str("<from cache>"),
            Self::Network { body } => write!(f, "{body}"),
        }
    }
}

/// Failures talking to the graph data provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response ({source}): {body}")]
    Malformed {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SteamChainError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("configuration error: {0}")]
    Config(String),

    /// A failure while visiting `node_id`, with the response being processed.
    #[error("failed while visiting {node_id} (response: {context}): {source}")]
    Traversal {
        node_id: NodeId,
        context: ResponseContext,
        #[source]
        source: Box<SteamChainError>,
    },

    /// The run was cancelled by ctrl-c.
    #[error("interrupted")]
    Interrupted,

    #[error("{0}")]
    Other(String),
}

impl SteamChainError {
    /// Attach the node being visited and its response context.
    ///
    /// Errors that already carry a node, and interruptions, pass through
    /// unchanged so the innermost failing node is the one reported.
    pub fn at_node(self, node_id: &str, context: ResponseContext) -> Self {
        match self {
            Self::Traversal { .. } | Self::Interrupted => self,
            other => Self::Traversal {
                node_id: node_id.to_string(),
                context,
                source: Box::new(other),
            },
        }
    }

    /// Process exit status for a run that ended with this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Interrupted => 130,
            _ => 1,
        }
    }

    /// The node id of the innermost failing visit, if any.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::Traversal { node_id, .. } => Some(node_id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SteamChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_node_wraps_plain_errors() {
        let err = SteamChainError::Other("boom".into()).at_node("42", ResponseContext::FromCache);
        assert_eq!(err.node_id(), Some("42"));
        assert!(err.to_string().contains("<from cache>"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn at_node_keeps_innermost_node() {
        let inner = SteamChainError::Other("boom".into()).at_node("leaf", ResponseContext::None);
        let outer = inner.at_node("root", ResponseContext::FromCache);
        assert_eq!(outer.node_id(), Some("leaf"));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(SteamChainError::Interrupted.exit_code(), 130);
        assert_eq!(SteamChainError::Config("x".into()).exit_code(), 1);
        let wrapped = SteamChainError::Other("boom".into()).at_node("1", ResponseContext::None);
        assert_eq!(wrapped.exit_code(), 1);
    }

    #[test]
    fn interruption_is_never_wrapped() {
        let err = SteamChainError::Interrupted.at_node("1", ResponseContext::None);
        assert!(matches!(err, SteamChainError::Interrupted));
    }
}
