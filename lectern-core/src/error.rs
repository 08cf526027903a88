//! Error types for Lectern operations

use crate::EntityKind;
use std::sync::Arc;
use thiserror::Error;

/// Primary-store errors.
///
/// These are the only failures the data-access layer surfaces to callers
/// unchanged. Cache transport and serialization problems are absorbed at
/// the cache boundary and never appear here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Entity not found: {kind:?} with key {key}")]
    NotFound { kind: EntityKind, key: String },

    #[error("Query failed for {kind:?}: {reason}")]
    QueryFailed { kind: EntityKind, reason: String },

    #[error("Store connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Batch-loader errors.
///
/// Delivered to every caller waiting on a key, so the type is `Clone` and
/// a failed bulk fetch is shared behind an `Arc` rather than duplicated.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LoadError {
    /// The bulk fetch reported this key as absent from the primary store.
    #[error("Entity not found for key {key}")]
    NotFound { key: String },

    /// The bulk fetch itself failed; every key in the batch receives this.
    #[error("Bulk fetch failed: {0}")]
    Fetch(Arc<StoreError>),

    /// The bulk fetch broke its alignment contract.
    #[error("Bulk fetch returned {got} results for {expected} keys")]
    Misaligned { expected: usize, got: usize },

    /// The batch dispatch was dropped before delivering a result.
    #[error("Batch dispatch aborted before delivering a result")]
    Aborted,
}

impl LoadError {
    /// True when the failure is the per-key "no such entity" condition
    /// rather than an infrastructure problem with the whole batch.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound { .. })
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Lectern operations.
#[derive(Debug, Clone, Error)]
pub enum LecternError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for primary-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for Lectern operations.
pub type LecternResult<T> = Result<T, LecternError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_not_found() {
        let err = StoreError::NotFound {
            kind: EntityKind::Course,
            key: "abc".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("Course"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_store_error_display_query_failed() {
        let err = StoreError::QueryFailed {
            kind: EntityKind::Enrollment,
            reason: "relation missing".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Query failed"));
        assert!(msg.contains("relation missing"));
    }

    #[test]
    fn test_load_error_not_found_is_distinguishable() {
        let not_found = LoadError::NotFound {
            key: "k1".to_string(),
        };
        let fetch = LoadError::Fetch(Arc::new(StoreError::LockPoisoned));

        assert!(not_found.is_not_found());
        assert!(!fetch.is_not_found());
    }

    #[test]
    fn test_load_error_fetch_is_cheaply_cloneable() {
        let inner = Arc::new(StoreError::ConnectionFailed {
            reason: "refused".to_string(),
        });
        let a = LoadError::Fetch(Arc::clone(&inner));
        let b = a.clone();
        assert_eq!(a, b);
        assert!(format!("{}", b).contains("refused"));
    }

    #[test]
    fn test_load_error_display_misaligned() {
        let err = LoadError::Misaligned {
            expected: 4,
            got: 2,
        };
        let msg = format!("{}", err);
        assert!(msg.contains('4'));
        assert!(msg.contains('2'));
    }

    #[test]
    fn test_lectern_error_from_variants() {
        let store = LecternError::from(StoreError::LockPoisoned);
        assert!(matches!(store, LecternError::Store(_)));

        let load = LecternError::from(LoadError::Aborted);
        assert!(matches!(load, LecternError::Load(_)));

        let config = LecternError::from(ConfigError::InvalidValue {
            field: "redis_url".to_string(),
            value: "not-a-url".to_string(),
            reason: "scheme missing".to_string(),
        });
        assert!(matches!(config, LecternError::Config(_)));
    }
}
