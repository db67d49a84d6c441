//! Reading results back out of a trained sampler.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::{self, Write};

use ndarray::{Array2, Axis};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::sampler::GibbsLda;

/// Top words of one topic, ready for display or JSON.
#[derive(Debug, Clone, Serialize)]
pub struct TopicSummary {
    pub index: usize,
    pub tokens: u32,
    // Share of all corpus tokens assigned to this topic
    pub prevalence: f64,
    pub words: Vec<(String, f64)>,
}

impl Display for TopicSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Topic {} ({:.2}%, {} tokens):",
            self.index,
            self.prevalence * 100.0,
            self.tokens
        )?;
        for (word, _) in &self.words {
            write!(f, " {}", word)?;
        }
        Ok(())
    }
}

impl GibbsLda {
    fn check_topic(&self, topic: usize) -> Result<()> {
        if topic >= self.k {
            return Err(Error::TopicOutOfRange {
                topic,
                num_topics: self.k,
            });
        }
        Ok(())
    }

    /// (word id, count) pairs of a topic with non-zero count, most frequent first.
    ///
    /// Ties keep vocabulary order.
    pub fn sorted_words(&self, topic: usize) -> Result<Vec<(usize, u32)>> {
        self.check_topic(topic)?;
        Ok(self.ranked_words(topic))
    }

    pub(crate) fn ranked_words(&self, topic: usize) -> Vec<(usize, u32)> {
        let mut words: Vec<(usize, u32)> = self
            .counts
            .type_topic
            .column(topic)
            .iter()
            .cloned()
            .enumerate()
            .filter(|&(_, count)| count > 0)
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        words
    }

    /// At most `n` words of `topic`, most frequent first.
    pub fn top_words(&self, topic: usize, n: usize) -> Result<Vec<String>> {
        Ok(self
            .sorted_words(topic)?
            .into_iter()
            .take(n)
            .filter_map(|(idx, _)| self.alphabet.lookup_token(idx).map(str::to_owned))
            .collect())
    }

    /// Like [`top_words`](Self::top_words) with each word's smoothed probability.
    pub fn top_words_with_weights(&self, topic: usize, n: usize) -> Result<Vec<(String, f64)>> {
        let words = self.sorted_words(topic)?;
        let denom = self.counts.tokens_per_topic[topic] as f64 + self.beta_sum;
        Ok(words
            .into_iter()
            .take(n)
            .filter_map(|(idx, count)| {
                self.alphabet
                    .lookup_token(idx)
                    .map(|word| (word.to_owned(), (count as f64 + self.beta) / denom))
            })
            .collect())
    }

    /// phi: topics x words, (n_wt + beta) / (n_t + V * beta).
    pub fn topic_word_distribution(&self) -> Array2<f64> {
        let mut phi = self.counts.type_topic.t().mapv(|c| c as f64 + self.beta);
        for (mut row, &total) in phi
            .axis_iter_mut(Axis(0))
            .zip(self.counts.tokens_per_topic.iter())
        {
            let denom = total as f64 + self.beta_sum;
            row.mapv_inplace(|x| x / denom);
        }
        phi
    }

    /// theta: documents x topics, (n_dt + alpha) / (N_d + alpha_sum).
    pub fn document_topic_distribution(&self) -> Array2<f64> {
        let mut theta = Array2::<f64>::zeros((self.documents.len(), self.k));
        for (mut row, doc) in theta.axis_iter_mut(Axis(0)).zip(self.documents.iter()) {
            let denom = doc.tokens.len() as f64 + self.alpha_sum;
            for (p, &count) in row.iter_mut().zip(doc.topic_counts.iter()) {
                *p = (count as f64 + self.alpha) / denom;
            }
        }
        theta
    }

    /// Most probable topic of every document; the lowest index wins ties.
    pub fn dominant_topics(&self) -> Vec<usize> {
        self.documents
            .iter()
            .map(|doc| {
                let mut best = 0;
                for (topic, &count) in doc.topic_counts.iter().enumerate() {
                    if count > doc.topic_counts[best] {
                        best = topic;
                    }
                }
                best
            })
            .collect()
    }

    /// exp of the negative mean log-probability of the training tokens
    /// under the point estimates of theta and phi.
    pub fn perplexity(&self) -> f64 {
        let theta = self.document_topic_distribution();
        let phi = self.topic_word_distribution();

        let mut log_likelihood = 0.0;
        for (doc, theta_d) in self.documents.iter().zip(theta.axis_iter(Axis(0))) {
            for &word in &doc.tokens {
                let prob: f64 = theta_d
                    .iter()
                    .zip(phi.column(word).iter())
                    .map(|(t, p)| t * p)
                    .sum();
                log_likelihood += prob.ln();
            }
        }

        (-log_likelihood / self.num_tokens as f64).exp()
    }

    pub fn summary(&self, n: usize) -> Result<Vec<TopicSummary>> {
        (0..self.k)
            .map(|topic| {
                let tokens = self.counts.tokens_per_topic[topic];
                Ok(TopicSummary {
                    index: topic,
                    tokens,
                    prevalence: tokens as f64 / self.num_tokens as f64,
                    words: self.top_words_with_weights(topic, n)?,
                })
            })
            .collect()
    }

    /// One line per topic: `topic<TAB>alpha<TAB>word word ...`.
    pub fn write_topic_keys<W: Write>(&self, writer: &mut W, n: usize) -> io::Result<()> {
        for topic in 0..self.k {
            let words: Vec<&str> = self
                .ranked_words(topic)
                .into_iter()
                .take(n)
                .filter_map(|(idx, _)| self.alphabet.lookup_token(idx))
                .collect();
            writeln!(writer, "{}\t{}\t{}", topic, self.alpha, words.join(" "))?;
        }
        Ok(())
    }

    /// One line per document: `doc<TAB>name<TAB>p_0<TAB>p_1 ...`.
    pub fn write_doc_topics<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let theta = self.document_topic_distribution();
        for (doc, (name, row)) in self.names.iter().zip(theta.axis_iter(Axis(0))).enumerate() {
            write!(writer, "{}\t{}", doc, name)?;
            for p in row.iter() {
                write!(writer, "\t{}", p)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}
