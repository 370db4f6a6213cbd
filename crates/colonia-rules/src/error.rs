//! Error types for the `colonia-rules` crate.
//!
//! Every variant here is a configuration error: it is raised while a
//! ruleset or game configuration is being loaded and aborts startup. Nothing
//! in this crate produces errors once the registry has been built.

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    /// Failed to read a configuration file from disk.
    #[error("failed to read configuration file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A probability lies outside `[0, 100]`.
    #[error("invalid probability {probability} in {context} (expected 0..=100)")]
    InvalidProbability {
        /// Where the probability was found.
        context: String,
        /// The offending value.
        probability: i64,
    },

    /// A random range has its minimum above its maximum.
    #[error("inverted range in {context}: min {min} > max {max}")]
    InvertedRange {
        /// Where the range was found.
        context: String,
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },

    /// A weighted choice has a weight that is zero or negative.
    #[error("non-positive weight {weight} in {context}")]
    NonPositiveWeight {
        /// Where the weight was found.
        context: String,
        /// The offending weight.
        weight: i64,
    },

    /// Two registry entries share an identifier.
    #[error("duplicate {kind} id: {id}")]
    DuplicateId {
        /// Registry section.
        kind: &'static str,
        /// The repeated id.
        id: String,
    },

    /// An entry refers to an id that is not registered.
    #[error("{referenced_by} refers to unknown {kind} {id}")]
    UnknownReference {
        /// Registry section the id should exist in.
        kind: &'static str,
        /// The missing id.
        id: String,
        /// The entry holding the dangling reference.
        referenced_by: String,
    },

    /// A disaster's weighted effect entry disagrees with the effect itself.
    #[error(
        "disaster {disaster} lists effect {effect} with probability {choice_probability}, \
         but the effect declares {effect_probability}"
    )]
    EffectProbabilityMismatch {
        /// The disaster.
        disaster: String,
        /// The effect.
        effect: String,
        /// Probability recorded in the disaster's choice.
        choice_probability: u32,
        /// Probability recorded on the effect.
        effect_probability: u32,
    },

    /// A disaster without any effect.
    #[error("disaster {0} has no effects")]
    EmptyDisaster(String),

    /// A building definition is internally inconsistent.
    #[error("invalid building {building}: {reason}")]
    InvalidBuilding {
        /// The building chain.
        building: String,
        /// Description of the inconsistency.
        reason: String,
    },

    /// Any other out-of-range configuration value.
    #[error("invalid value in {context}: {reason}")]
    InvalidValue {
        /// Where the value was found.
        context: String,
        /// Description of the problem.
        reason: String,
    },
}

impl From<serde_yml::Error> for RulesError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}
