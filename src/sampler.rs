//! Collapsed Gibbs sampling for LDA.
//!
//! With a single thread every token is resampled against the exact current
//! counts. With more threads the documents are cut into contiguous shards; each
//! shard samples against a private copy of the topic-word counts taken at the
//! start of the iteration, and the global counts are re-tallied from all
//! assignments once every shard is done. Each shard owns its own random
//! stream, so a fixed seed and thread count always give the same model.

use std::time::{SystemTime, UNIX_EPOCH};

use ndarray::{Array1, Array2};
use randomkit::dist::Uniform;
use randomkit::Rng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info};

use crate::alphabet::Alphabet;
use crate::config::TopicModelConfig;
use crate::error::{Error, Result};
use crate::instance::InstanceList;
use crate::math;

/// Topic assignments of one document.
#[derive(Debug, Clone)]
pub(crate) struct DocumentTopics {
    pub(crate) tokens: Vec<usize>,
    pub(crate) topics: Vec<usize>,
    pub(crate) topic_counts: Array1<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TopicCounts {
    // [word, topic]: occurrences of word assigned to topic
    pub(crate) type_topic: Array2<u32>,
    // [topic]: tokens assigned to topic
    pub(crate) tokens_per_topic: Array1<u32>,
}

impl TopicCounts {
    fn zeros(num_types: usize, num_topics: usize) -> Self {
        Self {
            type_topic: Array2::zeros((num_types, num_topics)),
            tokens_per_topic: Array1::zeros(num_topics),
        }
    }

    pub(crate) fn tally(docs: &[DocumentTopics], num_types: usize, num_topics: usize) -> Self {
        let mut counts = Self::zeros(num_types, num_topics);
        for doc in docs {
            for (&word, &topic) in doc.tokens.iter().zip(doc.topics.iter()) {
                counts.add(word, topic);
            }
        }
        counts
    }

    #[inline]
    fn add(&mut self, word: usize, topic: usize) {
        self.type_topic[[word, topic]] += 1;
        self.tokens_per_topic[topic] += 1;
    }

    #[inline]
    fn remove(&mut self, word: usize, topic: usize) {
        self.type_topic[[word, topic]] -= 1;
        self.tokens_per_topic[topic] -= 1;
    }
}

struct Prior {
    alpha: f64,
    beta: f64,
    beta_sum: f64,
}

pub struct GibbsLda {
    // Number of topics
    pub(crate) k: usize,
    // Vocabulary size
    pub(crate) v: usize,
    // Per-topic document-topic prior, alpha_sum / k
    pub(crate) alpha: f64,
    pub(crate) alpha_sum: f64,
    // Topic-word prior
    pub(crate) beta: f64,
    // v * beta
    pub(crate) beta_sum: f64,

    pub(crate) alphabet: Alphabet,
    pub(crate) names: Vec<String>,
    pub(crate) documents: Vec<DocumentTopics>,
    pub(crate) counts: TopicCounts,
    pub(crate) num_tokens: usize,
    iterations: usize,

    // One random stream per shard
    rngs: Vec<Rng>,
    uniform: Uniform,
    shard_len: usize,
    pool: Option<ThreadPool>,
}

impl GibbsLda {
    /// Assigns a random topic to every token of `instances`.
    pub fn new(instances: &InstanceList, config: &TopicModelConfig) -> Result<Self> {
        config.validate()?;

        let num_tokens = instances.num_tokens();
        if num_tokens == 0 {
            return Err(Error::EmptyCorpus);
        }

        let k = config.num_topics;
        let v = instances.alphabet().len();
        let d = instances.len();

        let beta_sum = config.beta * v as f64;
        if !beta_sum.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "beta {} times {} word types overflows",
                config.beta, v
            )));
        }

        let seed = config.seed.unwrap_or_else(clock_seed);
        let num_shards = config.num_threads.min(d).max(1);
        let shard_len = (d + num_shards - 1) / num_shards;
        let mut rngs: Vec<Rng> = (0..num_shards)
            .map(|shard| Rng::from_seed(seed.wrapping_add(shard as u32)))
            .collect();
        let uniform = math::unit_uniform()?;

        let mut documents = Vec::with_capacity(d);
        for inst in instances.iter() {
            let tokens = inst.data.features.clone();
            let mut topic_counts = Array1::<u32>::zeros(k);
            let topics: Vec<usize> = tokens
                .iter()
                .map(|_| {
                    let topic = math::random_index(k, &uniform, &mut rngs[0]);
                    topic_counts[topic] += 1;
                    topic
                })
                .collect();
            documents.push(DocumentTopics {
                tokens,
                topics,
                topic_counts,
            });
        }
        let counts = TopicCounts::tally(&documents, v, k);

        let pool = if num_shards > 1 {
            Some(ThreadPoolBuilder::new().num_threads(num_shards).build()?)
        } else {
            None
        };

        info!(
            documents = d,
            tokens = num_tokens,
            types = v,
            topics = k,
            threads = num_shards,
            seed,
            "Initialised Gibbs sampler"
        );
        debug!(shard_len, "Document shards");

        Ok(Self {
            k,
            v,
            alpha: config.alpha(),
            alpha_sum: config.alpha_sum,
            beta: config.beta,
            beta_sum,
            alphabet: instances.alphabet().clone(),
            names: instances.iter().map(|inst| inst.name.clone()).collect(),
            documents,
            counts,
            num_tokens,
            iterations: 0,
            rngs,
            uniform,
            shard_len,
            pool,
        })
    }

    /// Runs `iterations` sweeps, logging the likelihood every `show_interval`.
    pub fn train(&mut self, iterations: usize, show_interval: usize) {
        for it in 1..=iterations {
            self.sweep();
            self.iterations += 1;

            if (show_interval > 0 && it % show_interval == 0) || it == iterations {
                info!(
                    iteration = self.iterations,
                    ll_per_token = self.model_log_likelihood() / self.num_tokens as f64,
                    "Gibbs sweep"
                );
            }
        }
    }

    fn sweep(&mut self) {
        let prior = Prior {
            alpha: self.alpha,
            beta: self.beta,
            beta_sum: self.beta_sum,
        };
        let k = self.k;

        match &self.pool {
            None => {
                let mut weights = vec![0.0; k];
                for doc in self.documents.iter_mut() {
                    sample_document(
                        doc,
                        &mut self.counts,
                        &prior,
                        &self.uniform,
                        &mut self.rngs[0],
                        &mut weights,
                    );
                }
            }
            Some(pool) => {
                let snapshot = &self.counts;
                let uniform = &self.uniform;
                let shard_len = self.shard_len;
                let documents = &mut self.documents;
                let rngs = &mut self.rngs;

                pool.install(|| {
                    documents
                        .par_chunks_mut(shard_len)
                        .zip(rngs.par_iter_mut())
                        .for_each(|(shard, rng)| {
                            let mut local = snapshot.clone();
                            let mut weights = vec![0.0; k];
                            for doc in shard.iter_mut() {
                                sample_document(doc, &mut local, &prior, uniform, rng, &mut weights);
                            }
                        });
                });

                self.counts = TopicCounts::tally(&self.documents, self.v, k);
            }
        }
    }

    /// Joint log-likelihood of words and topic assignments, priors integrated out.
    pub fn model_log_likelihood(&self) -> f64 {
        let mut ll = 0.0;

        let topic_log_gamma = math::gammaln(self.alpha);
        for doc in &self.documents {
            for &count in doc.topic_counts.iter().filter(|&&c| c > 0) {
                ll += math::gammaln(self.alpha + count as f64) - topic_log_gamma;
            }
            ll -= math::gammaln(self.alpha_sum + doc.tokens.len() as f64);
        }
        ll += self.documents.len() as f64 * math::gammaln(self.alpha_sum);

        let mut non_zero_type_topics = 0usize;
        for &count in self.counts.type_topic.iter().filter(|&&c| c > 0) {
            non_zero_type_topics += 1;
            ll += math::gammaln(self.beta + count as f64);
        }
        for &tokens in self.counts.tokens_per_topic.iter() {
            ll -= math::gammaln(self.beta_sum + tokens as f64);
        }
        ll += self.k as f64 * math::gammaln(self.beta_sum);
        ll -= non_zero_type_topics as f64 * math::gammaln(self.beta);

        ll
    }

    pub fn num_topics(&self) -> usize {
        self.k
    }

    pub fn num_types(&self) -> usize {
        self.v
    }

    pub fn num_documents(&self) -> usize {
        self.documents.len()
    }

    pub fn num_tokens(&self) -> usize {
        self.num_tokens
    }

    /// Completed sweeps.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Topic assignment of every token of document `doc`.
    pub fn document_topics(&self, doc: usize) -> Option<&[usize]> {
        self.documents.get(doc).map(|d| d.topics.as_slice())
    }
}

fn sample_document(
    doc: &mut DocumentTopics,
    counts: &mut TopicCounts,
    prior: &Prior,
    uniform: &Uniform,
    rng: &mut Rng,
    weights: &mut [f64],
) {
    for (pos, &word) in doc.tokens.iter().enumerate() {
        let old_topic = doc.topics[pos];
        doc.topic_counts[old_topic] -= 1;
        counts.remove(word, old_topic);

        // p(t) ∝ (n_dt + alpha) * (n_wt + beta) / (n_t + V * beta)
        let mut total = 0.0;
        for (topic, weight) in weights.iter_mut().enumerate() {
            *weight = (doc.topic_counts[topic] as f64 + prior.alpha)
                * (counts.type_topic[[word, topic]] as f64 + prior.beta)
                / (counts.tokens_per_topic[topic] as f64 + prior.beta_sum);
            total += *weight;
        }

        let new_topic = math::sample_discrete(weights, total, uniform, rng);
        doc.topics[pos] = new_topic;
        doc.topic_counts[new_topic] += 1;
        counts.add(word, new_topic);
    }
}

fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Pipeline, StopList};

    fn corpus() -> InstanceList {
        let mut list = InstanceList::new(Pipeline::new(true, StopList::empty()));
        for text in [
            "bitcoin trading price bitcoin trading",
            "price bitcoin trading price",
            "ethereum contract smart ethereum",
            "smart contract ethereum contract",
            "",
        ] {
            list.add_thru_pipe("", "", text);
        }
        list
    }

    fn config(threads: usize) -> TopicModelConfig {
        let mut config = TopicModelConfig::new(2);
        config.num_threads = threads;
        config.seed = Some(42);
        config
    }

    fn assert_consistent(lda: &GibbsLda) {
        assert_eq!(
            lda.counts,
            TopicCounts::tally(&lda.documents, lda.v, lda.k)
        );
        assert_eq!(lda.counts.tokens_per_topic.sum() as usize, lda.num_tokens);
        for doc in &lda.documents {
            assert_eq!(doc.topic_counts.sum() as usize, doc.tokens.len());
            for (t, &count) in doc.topic_counts.iter().enumerate() {
                assert_eq!(count as usize, doc.topics.iter().filter(|&&z| z == t).count());
            }
        }
    }

    #[test]
    fn counts_match_assignments_after_training() {
        for threads in [1, 2, 3] {
            let mut lda = GibbsLda::new(&corpus(), &config(threads)).unwrap();
            assert_consistent(&lda);
            lda.train(20, 0);
            assert_consistent(&lda);
            assert_eq!(lda.iterations(), 20);
        }
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let list = InstanceList::new(Pipeline::new(true, StopList::empty()));
        assert!(matches!(
            GibbsLda::new(&list, &config(1)),
            Err(Error::EmptyCorpus)
        ));

        let mut list = InstanceList::new(Pipeline::new(true, StopList::empty()));
        list.add_thru_pipe("", "", "a an to");
        assert!(matches!(
            GibbsLda::new(&list, &config(1)),
            Err(Error::EmptyCorpus)
        ));
    }

    #[test]
    fn overflowing_topic_word_prior_is_rejected() {
        let mut config = config(1);
        config.beta = 1e308;
        assert!(config.validate().is_ok());
        assert!(matches!(
            GibbsLda::new(&corpus(), &config),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn same_seed_gives_same_assignments() {
        for threads in [1, 2] {
            let mut a = GibbsLda::new(&corpus(), &config(threads)).unwrap();
            let mut b = GibbsLda::new(&corpus(), &config(threads)).unwrap();
            a.train(30, 0);
            b.train(30, 0);
            for doc in 0..a.num_documents() {
                assert_eq!(a.document_topics(doc), b.document_topics(doc));
            }
        }
    }

    #[test]
    fn likelihood_improves_on_separable_corpus() {
        let mut lda = GibbsLda::new(&corpus(), &config(1)).unwrap();
        let initial = lda.model_log_likelihood();
        lda.train(200, 0);
        assert!(lda.model_log_likelihood() > initial);
        assert!(lda.model_log_likelihood() < 0.0);
    }
}
