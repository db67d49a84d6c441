//! Latent Dirichlet allocation by collapsed Gibbs sampling.
//!
//! [`TopicModel`] runs raw text through a fixed pipeline (lowercase, tokenize,
//! drop stopwords, encode against a shared vocabulary), trains an LDA model on
//! the resulting documents and reads the top words of each topic back out.
//!
//! ```no_run
//! let mut model = lda_topics::TopicModel::new(10)?;
//! model.add_data_from_file("data/statements.txt")?;
//! model.train_model()?;
//! for topic in 0..10 {
//!     println!("{}: {}", topic, model.top_words(topic, 8)?.join(" "));
//! }
//! # Ok::<(), lda_topics::Error>(())
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::info;

pub mod alphabet;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod instance;
mod math;
pub mod pipeline;
pub mod reader;
pub mod sampler;
pub mod topics;

pub use alphabet::Alphabet;
pub use config::{StoplistSource, TopicModelBuilder, TopicModelConfig};
pub use diagnostics::{DiagnosticScores, Diagnostics, TopicDiagnostics};
pub use error::{Error, Result};
pub use instance::{FeatureSequence, Instance, InstanceList};
pub use pipeline::{Pipeline, StopList};
pub use sampler::GibbsLda;
pub use topics::TopicSummary;

pub struct TopicModel {
    config: TopicModelConfig,
    instances: InstanceList,
    model: Option<GibbsLda>,
}

impl TopicModel {
    /// Model with default settings and the stoplist at `stoplists/en.txt`.
    pub fn new(num_topics: usize) -> Result<Self> {
        TopicModelBuilder::new(num_topics).build()
    }

    pub fn builder(num_topics: usize) -> TopicModelBuilder {
        TopicModelBuilder::new(num_topics)
    }

    pub fn from_config(config: TopicModelConfig) -> Result<Self> {
        config.validate()?;
        let pipeline = Pipeline::from_config(&config)?;
        Ok(Self {
            config,
            instances: InstanceList::new(pipeline),
            model: None,
        })
    }

    /// Adds every line of a delimited `id label text` file.
    pub fn add_data_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let io_error = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_error)?;
        let added = reader::read_delimited(BufReader::new(file), &mut self.instances).map_err(io_error)?;
        info!(
            path = %path.display(),
            added,
            documents = self.instances.len(),
            types = self.instances.alphabet().len(),
            "Loaded documents"
        );
        Ok(added)
    }

    /// Adds one document per statement, named by its position in the corpus.
    pub fn add_data_from_statements<S: AsRef<str>>(&mut self, statements: &[S]) -> usize {
        for statement in statements {
            let name = self.instances.len().to_string();
            self.instances.add_thru_pipe(name, "", statement.as_ref());
        }
        info!(
            added = statements.len(),
            documents = self.instances.len(),
            types = self.instances.alphabet().len(),
            "Loaded statements"
        );
        statements.len()
    }

    /// Trains on everything added so far, replacing any previous model.
    pub fn train_model(&mut self) -> Result<()> {
        let mut model = GibbsLda::new(&self.instances, &self.config)?;
        model.train(self.config.num_iterations, self.config.show_topics_interval);
        self.model = Some(model);
        Ok(())
    }

    /// At most `num_words` words of `topic`, most frequent first.
    pub fn top_words(&self, topic: usize, num_words: usize) -> Result<Vec<String>> {
        self.model()?.top_words(topic, num_words)
    }

    pub fn model(&self) -> Result<&GibbsLda> {
        self.model.as_ref().ok_or(Error::NotTrained)
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    pub fn num_topics(&self) -> usize {
        self.config.num_topics
    }

    pub fn config(&self) -> &TopicModelConfig {
        &self.config
    }

    pub fn instances(&self) -> &InstanceList {
        &self.instances
    }
}
