use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building, feeding or querying a topic model.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Number of topics must be positive")]
    InvalidTopicCount,

    #[error("Invalid hyperparameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to load stoplist {path}: {source}")]
    Stoplist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Corpus contains no tokens to train on")]
    EmptyCorpus,

    #[error("Model not trained yet")]
    NotTrained,

    #[error("Topic {topic} out of range, model has {num_topics} topics")]
    TopicOutOfRange { topic: usize, num_topics: usize },

    #[error("Failed to start sampler threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
