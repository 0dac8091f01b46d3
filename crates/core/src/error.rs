use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompanionError {
    /// The appointment store rejected a confirmed booking. No confirmation
    /// turn is produced and the dialogue state is left as it was.
    #[error("failed to persist appointment at {center}: {source}")]
    PersistenceFailure {
        center: String,
        #[source]
        source: anyhow::Error,
    },
}
