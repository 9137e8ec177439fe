//! Error types for rule configuration, URL generation and component loading

use std::sync::Arc;

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, RouteError>;

/// Everything that can go wrong while configuring or using a [`RuleSet`](crate::RuleSet)
///
/// Failing to match a URL is **not** an error: matching returns `Option::None`
/// and the caller moves on to the next candidate.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Route names are CamelCase
    #[error(
        "Route \"{path}\" with name \"{name}\" does not begin with an uppercase letter. \
         Route names should be CamelCase like \"{suggested}\"."
    )]
    InvalidRouteName {
        path: String,
        name: String,
        suggested: String,
    },

    #[error("Path \"{path}\" should not include \"#\". Use hash-based location handling instead.")]
    HashInPath { path: String },

    #[error("Path \"{path}\" contains \"{character}\" which is not allowed in a route config.")]
    ReservedCharacter { path: String, character: String },

    #[error("Unexpected \"...\" before the end of the path for \"{path}\".")]
    MisplacedContinuation { path: String },

    /// Two primary rules share the same structural hash
    #[error("Configuration '{path}' conflicts with existing route '{existing}'")]
    RouteCollision { path: String, existing: String },

    #[error("Only one route can be default (\"{path}\" conflicts with \"{existing}\")")]
    MultipleDefaults { path: String, existing: String },

    #[error("Route must provide either a path or regex property")]
    MissingPathOrRegex,

    #[error("Route provides a regex property, '{regex}', but no serializer property")]
    MissingSerializer { regex: String },

    #[error("Route regex '{regex}' is invalid: {reason}")]
    InvalidRegex { regex: String, reason: String },

    /// A positional parameter was absent (or value-less) during generation
    #[error("Route generator for '{name}' was not included in parameters passed.")]
    MissingParameter { name: String },

    #[error("Tried to get instruction for \"{path}\" before the type was loaded.")]
    ComponentNotLoaded { path: String },

    #[error("Tried to generate a redirect (\"{path}\").")]
    RedirectGeneration { path: String },

    #[error("Failed to load component: {reason}")]
    ComponentLoad { reason: Arc<anyhow::Error> },

    #[error("No route named \"{name}\"")]
    UnknownRoute { name: String },

    #[error("Expected \"{expected}\" while parsing URL, found \"{remaining}\".")]
    MalformedUrl { expected: String, remaining: String },

    #[error("URL nests auxiliary routes deeper than {limit} levels.")]
    AuxiliaryTooDeep { limit: usize },
}

impl RouteError {
    /// Returns true for errors raised while configuring rules
    ///
    /// These are meant to abort bootstrap rather than be handled.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RouteError::InvalidRouteName { .. }
                | RouteError::HashInPath { .. }
                | RouteError::ReservedCharacter { .. }
                | RouteError::MisplacedContinuation { .. }
                | RouteError::RouteCollision { .. }
                | RouteError::MultipleDefaults { .. }
                | RouteError::MissingPathOrRegex
                | RouteError::MissingSerializer { .. }
                | RouteError::InvalidRegex { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_message_quotes_both_paths() {
        let err = RouteError::RouteCollision {
            path: "/foo/:name".to_string(),
            existing: "/foo/:id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Configuration '/foo/:name' conflicts with existing route '/foo/:id'"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_parameter_is_not_configuration() {
        let err = RouteError::MissingParameter {
            name: "id".to_string(),
        };
        assert!(err.to_string().contains("'id'"));
        assert!(!err.is_configuration());
    }
}
