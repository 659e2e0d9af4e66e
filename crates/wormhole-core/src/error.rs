use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    /// A write conflicted on the url hash but the winning row could not be read back.
    #[error("storage invariant violated: {0}")]
    InvariantViolation(String),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Reasons a short code string cannot be turned back into an id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("short code is empty")]
    Empty,
    #[error("short code is {len} symbols long, at most {max} are allowed")]
    TooLong { len: usize, max: usize },
    #[error("short code contains unknown symbol {0:?}")]
    UnknownSymbol(char),
    #[error("short code exceeds the id range")]
    Overflow,
}

/// Codec configuration that cannot produce a usable bijection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("alphabet needs at least 2 symbols, got {0}")]
    AlphabetTooShort(usize),
    #[error("alphabet contains {0:?} more than once")]
    DuplicateSymbol(char),
    #[error("alt prefix {0:?} cannot be contained in the alphabet")]
    AltPrefixInAlphabet(char),
    #[error("alt prefix {0:?} cannot be contained in the confusable mapping")]
    AltPrefixInMapping(char),
    #[error("confusable {0:?} is already an alphabet symbol")]
    MappingShadowsSymbol(char),
    #[error("confusable {from:?} maps to {to:?}, which is not in the alphabet")]
    UnknownMappingTarget { from: char, to: char },
}
