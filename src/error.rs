use thiserror::Error;

#[derive(Error, Debug)]
/// Batch error
pub enum BatchError {
    #[error("ItemWriter from: {0}")]
    ItemWriter(String),

    #[error("ItemReader from: {0}")]
    ItemReader(String),

    /// A delimited record did not split into the expected number of tokens.
    #[error("Incorrect token count: expected {expected}, actual {actual}")]
    IncorrectTokenCount { expected: usize, actual: usize },

    /// A line of a flat file could not be mapped to an item.
    #[error(
        "Parsing error at line: {line_number} in resource={resource}, input=[{input}]: {source}"
    )]
    FlatFileParse {
        resource: String,
        line_number: usize,
        input: String,
        #[source]
        source: Box<BatchError>,
    },

    #[error("Step {name} failed: {source}")]
    Step {
        name: String,
        #[source]
        source: Box<BatchError>,
    },

    #[error("Configuration: {0}")]
    Configuration(String),

    /// The restart cursor could not be loaded, saved or applied.
    #[error("Restart: {0}")]
    Restart(String),
}
