use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::TopicModel;

/// Stoplist looked up relative to the working directory unless told otherwise.
pub const DEFAULT_STOPLIST_PATH: &str = "stoplists/en.txt";

pub const DEFAULT_ALPHA_SUM: f64 = 1.0;
pub const DEFAULT_BETA: f64 = 0.01;
pub const DEFAULT_NUM_THREADS: usize = 2;
pub const DEFAULT_NUM_ITERATIONS: usize = 1000;
pub const DEFAULT_SHOW_TOPICS_INTERVAL: usize = 50;
/// Top words per topic scored by the coherence and exclusivity diagnostics.
pub const DEFAULT_DIAGNOSTICS_TOP_WORDS: usize = 20;

/// Where the stopword list comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum StoplistSource {
    /// One word per line, UTF-8.
    File(PathBuf),
    /// English list bundled with the `stop-words` crate.
    English,
    /// No stopword removal.
    None,
}

impl Default for StoplistSource {
    fn default() -> Self {
        StoplistSource::File(PathBuf::from(DEFAULT_STOPLIST_PATH))
    }
}

#[derive(Debug, Clone)]
pub struct TopicModelConfig {
    // Number of topics
    pub num_topics: usize,
    // Concentration of the symmetric document-topic prior, split evenly across topics
    pub alpha_sum: f64,
    // Topic-word prior
    pub beta: f64,
    pub num_threads: usize,
    pub num_iterations: usize,
    // Fixed sampler seed, drawn from the clock when absent
    pub seed: Option<u32>,
    // Log the likelihood every this many iterations, 0 disables
    pub show_topics_interval: usize,
    pub stoplist: StoplistSource,
    pub extra_stopwords: Vec<String>,
    pub lowercase: bool,
}

impl TopicModelConfig {
    pub fn new(num_topics: usize) -> Self {
        Self {
            num_topics,
            alpha_sum: DEFAULT_ALPHA_SUM,
            beta: DEFAULT_BETA,
            num_threads: DEFAULT_NUM_THREADS,
            num_iterations: DEFAULT_NUM_ITERATIONS,
            seed: None,
            show_topics_interval: DEFAULT_SHOW_TOPICS_INTERVAL,
            stoplist: StoplistSource::default(),
            extra_stopwords: Vec::new(),
            lowercase: true,
        }
    }

    /// Per-topic document-topic prior.
    pub fn alpha(&self) -> f64 {
        self.alpha_sum / self.num_topics as f64
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_topics == 0 {
            return Err(Error::InvalidTopicCount);
        }
        if !(self.alpha_sum > 0.0 && self.alpha_sum.is_finite()) {
            return Err(Error::InvalidParameter(
                "alpha_sum must be positive and finite".into(),
            ));
        }
        if !(self.beta > 0.0 && self.beta.is_finite()) {
            return Err(Error::InvalidParameter("beta must be positive and finite".into()));
        }
        if self.num_threads == 0 {
            return Err(Error::InvalidParameter("num_threads must be at least 1".into()));
        }
        Ok(())
    }
}

pub struct TopicModelBuilder {
    config: TopicModelConfig,
}

impl TopicModelBuilder {
    pub fn new(num_topics: usize) -> Self {
        Self {
            config: TopicModelConfig::new(num_topics),
        }
    }

    pub fn alpha_sum(&mut self, alpha_sum: f64) -> &mut Self {
        self.config.alpha_sum = alpha_sum;
        self
    }

    pub fn beta(&mut self, beta: f64) -> &mut Self {
        self.config.beta = beta;
        self
    }

    pub fn num_threads(&mut self, num_threads: usize) -> &mut Self {
        self.config.num_threads = num_threads;
        self
    }

    pub fn num_iterations(&mut self, num_iterations: usize) -> &mut Self {
        self.config.num_iterations = num_iterations;
        self
    }

    pub fn seed(&mut self, seed: u32) -> &mut Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn show_topics_interval(&mut self, interval: usize) -> &mut Self {
        self.config.show_topics_interval = interval;
        self
    }

    pub fn stoplist(&mut self, stoplist: StoplistSource) -> &mut Self {
        self.config.stoplist = stoplist;
        self
    }

    pub fn extra_stopwords<I, S>(&mut self, words: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.extra_stopwords.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn lowercase(&mut self, lowercase: bool) -> &mut Self {
        self.config.lowercase = lowercase;
        self
    }

    pub fn config(&self) -> &TopicModelConfig {
        &self.config
    }

    /// Validates the settings, loads the stoplist and returns an empty model.
    pub fn build(&self) -> Result<TopicModel> {
        TopicModel::from_config(self.config.clone())
    }
}
