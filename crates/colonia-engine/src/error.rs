//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the turn loop so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration or ruleset loading failed.
    #[error("rules error: {source}")]
    Rules {
        /// The underlying rules error.
        #[from]
        source: colonia_rules::RulesError,
    },

    /// Map construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: colonia_world::WorldError,
    },

    /// The simulation failed.
    #[error("simulation error: {source}")]
    Sim {
        /// The underlying simulation error.
        #[from]
        source: colonia_sim::SimError,
    },

    /// A turn summary could not be serialized.
    #[error("serialization error: {source}")]
    Json {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },

    /// The scenario could not be laid out on the configured map.
    #[error("scenario error: {message}")]
    Scenario {
        /// What went wrong.
        message: String,
    },
}
