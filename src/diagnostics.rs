//! Per-topic quality scores in the manner of MALLET's topic diagnostics.

use std::collections::HashSet;

use serde::Serialize;

use crate::sampler::GibbsLda;

/// Scores of one topic, or their mean over all topics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiagnosticScores {
    pub tokens: f64,
    // Entropy of the topic's token distribution over documents
    pub document_entropy: f64,
    // Mean character length of the top words
    pub word_length: f64,
    // Co-document log ratio summed over pairs of top words
    pub coherence: f64,
    // KL divergence from the uniform word distribution
    pub uniform_dist: f64,
    // KL divergence from the corpus word distribution
    pub corpus_dist: f64,
    // Inverse of the sum of squared word probabilities
    pub eff_num_words: f64,
    // Share of the documents using the topic where it is the dominant one
    pub rank_1_docs: f64,
    // Mean share of each top word's probability held by this topic
    pub exclusivity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicDiagnostics {
    pub topic: usize,
    #[serde(flatten)]
    pub scores: DiagnosticScores,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub num_top_words: usize,
    pub topics: Vec<TopicDiagnostics>,
    pub means: DiagnosticScores,
}

impl Diagnostics {
    fn new(num_top_words: usize, topics: Vec<TopicDiagnostics>) -> Self {
        let mut means = DiagnosticScores::default();
        for t in &topics {
            let s = &t.scores;
            means.tokens += s.tokens;
            means.document_entropy += s.document_entropy;
            means.word_length += s.word_length;
            means.coherence += s.coherence;
            means.uniform_dist += s.uniform_dist;
            means.corpus_dist += s.corpus_dist;
            means.eff_num_words += s.eff_num_words;
            means.rank_1_docs += s.rank_1_docs;
            means.exclusivity += s.exclusivity;
        }
        if !topics.is_empty() {
            let n = topics.len() as f64;
            means.tokens /= n;
            means.document_entropy /= n;
            means.word_length /= n;
            means.coherence /= n;
            means.uniform_dist /= n;
            means.corpus_dist /= n;
            means.eff_num_words /= n;
            means.rank_1_docs /= n;
            means.exclusivity /= n;
        }
        Self {
            num_top_words,
            topics,
            means,
        }
    }
}

impl GibbsLda {
    /// Scores every topic, using its `num_top_words` most frequent words for
    /// coherence, word length and exclusivity.
    pub fn topic_diagnostics(&self, num_top_words: usize) -> Diagnostics {
        let doc_words: Vec<HashSet<usize>> = self
            .documents
            .iter()
            .map(|doc| doc.tokens.iter().cloned().collect())
            .collect();
        let dominant = self.dominant_topics();

        // Corpus frequency of every word type
        let word_totals: Vec<u32> = self
            .counts
            .type_topic
            .rows()
            .into_iter()
            .map(|row| row.sum())
            .collect();

        let topics = (0..self.k)
            .map(|topic| {
                let top: Vec<usize> = self
                    .ranked_words(topic)
                    .into_iter()
                    .take(num_top_words)
                    .map(|(word, _)| word)
                    .collect();
                TopicDiagnostics {
                    topic,
                    scores: DiagnosticScores {
                        tokens: self.counts.tokens_per_topic[topic] as f64,
                        document_entropy: self.document_entropy(topic),
                        word_length: self.word_length(&top),
                        coherence: self.coherence(&top, &doc_words),
                        uniform_dist: self.word_divergence(topic, |_| 1.0 / self.v as f64),
                        corpus_dist: self.word_divergence(topic, |word| {
                            word_totals[word] as f64 / self.num_tokens as f64
                        }),
                        eff_num_words: self.effective_num_words(topic),
                        rank_1_docs: self.rank_1_share(topic, &dominant),
                        exclusivity: self.exclusivity(topic, &top),
                    },
                }
            })
            .collect();

        Diagnostics::new(num_top_words, topics)
    }

    fn document_entropy(&self, topic: usize) -> f64 {
        let total = self.counts.tokens_per_topic[topic] as f64;
        if total == 0.0 {
            return 0.0;
        }
        self.documents
            .iter()
            .map(|doc| doc.topic_counts[topic])
            .filter(|&count| count > 0)
            .map(|count| {
                let p = count as f64 / total;
                -p * p.ln()
            })
            .sum()
    }

    fn word_length(&self, top: &[usize]) -> f64 {
        if top.is_empty() {
            return 0.0;
        }
        let chars: usize = top
            .iter()
            .filter_map(|&word| self.alphabet.lookup_token(word))
            .map(|token| token.chars().count())
            .sum();
        chars as f64 / top.len() as f64
    }

    fn coherence(&self, top: &[usize], doc_words: &[HashSet<usize>]) -> f64 {
        let mut score = 0.0;
        for i in 1..top.len() {
            for j in 0..i {
                let mut both = 0u32;
                let mut higher = 0u32;
                for words in doc_words {
                    if words.contains(&top[j]) {
                        higher += 1;
                        if words.contains(&top[i]) {
                            both += 1;
                        }
                    }
                }
                if higher > 0 {
                    score += ((both as f64 + self.beta) / higher as f64).ln();
                }
            }
        }
        score
    }

    /// KL divergence of the topic's empirical word distribution from `reference`.
    fn word_divergence<F: Fn(usize) -> f64>(&self, topic: usize, reference: F) -> f64 {
        let total = self.counts.tokens_per_topic[topic] as f64;
        if total == 0.0 {
            return 0.0;
        }
        self.ranked_words(topic)
            .into_iter()
            .map(|(word, count)| {
                let p = count as f64 / total;
                p * (p / reference(word)).ln()
            })
            .sum()
    }

    fn effective_num_words(&self, topic: usize) -> f64 {
        let total = self.counts.tokens_per_topic[topic] as f64;
        if total == 0.0 {
            return 0.0;
        }
        let squares: f64 = self
            .counts
            .type_topic
            .column(topic)
            .iter()
            .map(|&count| (count as f64 / total).powi(2))
            .sum();
        1.0 / squares
    }

    fn rank_1_share(&self, topic: usize, dominant: &[usize]) -> f64 {
        let mut using = 0usize;
        let mut first = 0usize;
        for (doc, &best) in self.documents.iter().zip(dominant) {
            if doc.topic_counts[topic] > 0 {
                using += 1;
                if best == topic {
                    first += 1;
                }
            }
        }
        if using == 0 {
            0.0
        } else {
            first as f64 / using as f64
        }
    }

    fn exclusivity(&self, topic: usize, top: &[usize]) -> f64 {
        if top.is_empty() {
            return 0.0;
        }
        let prob = |word: usize, t: usize| {
            (self.counts.type_topic[[word, t]] as f64 + self.beta)
                / (self.counts.tokens_per_topic[t] as f64 + self.beta_sum)
        };
        let total: f64 = top
            .iter()
            .map(|&word| {
                let across: f64 = (0..self.k).map(|t| prob(word, t)).sum();
                prob(word, topic) / across
            })
            .sum();
        total / top.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use crate::config::TopicModelConfig;
    use crate::instance::InstanceList;
    use crate::pipeline::{Pipeline, StopList};
    use crate::sampler::GibbsLda;
    use approx::assert_relative_eq;

    fn trained() -> GibbsLda {
        let mut list = InstanceList::new(Pipeline::new(true, StopList::empty()));
        list.add_thru_pipe("a", "", "bitcoin trading price bitcoin trading bitcoin");
        list.add_thru_pipe("b", "", "price bitcoin trading price bitcoin");
        list.add_thru_pipe("c", "", "ethereum contract smart ethereum smart");
        list.add_thru_pipe("d", "", "smart contract ethereum contract ethereum");

        let mut config = TopicModelConfig::new(2);
        config.num_threads = 1;
        config.seed = Some(3);
        let mut lda = GibbsLda::new(&list, &config).unwrap();
        lda.train(300, 0);
        lda
    }

    #[test]
    fn scores_stay_within_their_ranges() {
        let lda = trained();
        let diagnostics = lda.topic_diagnostics(20);
        assert_eq!(diagnostics.topics.len(), 2);

        let tokens: f64 = diagnostics.topics.iter().map(|t| t.scores.tokens).sum();
        assert_eq!(tokens as usize, lda.num_tokens());

        for t in &diagnostics.topics {
            let s = &t.scores;
            assert!(s.eff_num_words >= 1.0 && s.eff_num_words <= lda.num_types() as f64);
            assert!(s.document_entropy >= 0.0);
            assert!(s.document_entropy <= (lda.num_documents() as f64).ln() + 1e-12);
            assert!(s.uniform_dist >= 0.0 && s.corpus_dist >= 0.0);
            assert!(s.exclusivity > 0.0 && s.exclusivity <= 1.0);
            assert!(s.rank_1_docs >= 0.0 && s.rank_1_docs <= 1.0);
            assert!(s.coherence.is_finite());
        }
    }

    #[test]
    fn separated_topics_are_exclusive() {
        let lda = trained();
        let diagnostics = lda.topic_diagnostics(3);
        for t in &diagnostics.topics {
            assert!(t.scores.exclusivity > 0.9, "{:?}", t.scores);
            assert!(t.scores.rank_1_docs >= 0.5);
            // three distinct words of length 5 to 8
            assert!(t.scores.word_length >= 5.0 && t.scores.word_length <= 8.0);
        }
    }

    #[test]
    fn means_average_the_topics() {
        let lda = trained();
        let diagnostics = lda.topic_diagnostics(5);
        let topics = &diagnostics.topics;
        assert_relative_eq!(
            diagnostics.means.coherence,
            (topics[0].scores.coherence + topics[1].scores.coherence) / 2.0
        );
        assert_relative_eq!(
            diagnostics.means.eff_num_words,
            (topics[0].scores.eff_num_words + topics[1].scores.eff_num_words) / 2.0
        );
        assert_relative_eq!(diagnostics.means.tokens, lda.num_tokens() as f64 / 2.0);

        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(json["num_top_words"], 5);
        assert_eq!(json["topics"][1]["topic"], 1);
        assert!(json["topics"][0]["exclusivity"].is_number());
        assert!(json["means"]["document_entropy"].is_number());
    }
}
