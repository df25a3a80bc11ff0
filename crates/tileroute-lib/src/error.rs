use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the tileroute library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// Only fatal problems are errors. Search failures (unreachable locations, no
/// route, no connectivity) are reported through [`crate::stats::Outcome`].
#[derive(Debug, Error)]
pub enum Error {
    /// The base configuration has no `costing_options.<mode>` subtree.
    #[error("no costing method found for '{mode}'")]
    ConfigMissing { mode: String },

    /// The costing name is configured but no constructor is registered for it.
    #[error("unknown costing method: {mode}{}", format_suggestions(.suggestions))]
    UnknownCosting {
        mode: String,
        suggestions: Vec<String>,
    },

    /// Costing options could not be interpreted by the mode constructor.
    #[error("invalid costing options for '{mode}': {message}")]
    InvalidCostingOptions { mode: String, message: String },

    /// Malformed coordinate, address or location list.
    #[error("invalid location '{input}': {reason}")]
    InvalidLocationSpec { input: String, reason: String },

    /// Structurally invalid request (missing costing, bad date_time, ...).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// The graph file could not be interpreted.
    #[error("failed to load graph from {path}: {message}")]
    GraphLoad { path: PathBuf, message: String },

    /// An edge references a node that is not part of the graph.
    #[error("edge {edge} references unknown node {node}")]
    UnknownNode { edge: u64, node: u32 },

    /// No admissible edge lies near the location.
    #[error("no suitable edges near location {lat},{lng}")]
    NoCandidateEdges { lat: f64, lng: f64 },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for CSV parsing errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn invalid_location(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidLocationSpec {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest {
            message: message.into(),
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_costing_lists_suggestions() {
        let err = Error::UnknownCosting {
            mode: "atuo".to_string(),
            suggestions: vec!["auto".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unknown costing method: atuo. Did you mean 'auto'?"
        );
    }

    #[test]
    fn config_missing_names_mode() {
        let err = Error::ConfigMissing {
            mode: "pedestrian".to_string(),
        };
        assert!(err.to_string().contains("'pedestrian'"));
    }
}
