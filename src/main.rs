use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use lda_topics::config::{
    DEFAULT_ALPHA_SUM, DEFAULT_BETA, DEFAULT_DIAGNOSTICS_TOP_WORDS, DEFAULT_NUM_ITERATIONS,
    DEFAULT_NUM_THREADS, DEFAULT_SHOW_TOPICS_INTERVAL, DEFAULT_STOPLIST_PATH,
};
use lda_topics::{Diagnostics, StoplistSource, TopicModel, TopicSummary};

/// Topic modeling with latent Dirichlet allocation.
#[derive(Parser)]
#[command(name = "lda-topics", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and print the top words of every topic
    Train(TrainArgs),
}

#[derive(clap::Args)]
struct TrainArgs {
    /// Delimited corpus, one `id label text` document per line
    #[arg(long, env = "LDA_INPUT")]
    input: Option<PathBuf>,

    /// Extra document given inline (repeatable)
    #[arg(long = "statement")]
    statements: Vec<String>,

    #[arg(long, env = "LDA_TOPICS", default_value_t = 10)]
    topics: usize,

    /// Words to print per topic
    #[arg(long, env = "LDA_WORDS", default_value_t = 10)]
    words: usize,

    #[arg(long, env = "LDA_ITERATIONS", default_value_t = DEFAULT_NUM_ITERATIONS)]
    iterations: usize,

    #[arg(long, env = "LDA_THREADS", default_value_t = DEFAULT_NUM_THREADS)]
    threads: usize,

    #[arg(long, env = "LDA_SEED")]
    seed: Option<u32>,

    #[arg(long, env = "LDA_ALPHA_SUM", default_value_t = DEFAULT_ALPHA_SUM)]
    alpha_sum: f64,

    #[arg(long, env = "LDA_BETA", default_value_t = DEFAULT_BETA)]
    beta: f64,

    /// Log the model likelihood every N iterations (0 = only at the end)
    #[arg(long, env = "LDA_SHOW_INTERVAL", default_value_t = DEFAULT_SHOW_TOPICS_INTERVAL)]
    show_interval: usize,

    /// Stoplist file [default: stoplists/en.txt]
    #[arg(long, env = "LDA_STOPLIST")]
    stoplist: Option<PathBuf>,

    /// Use the bundled English stoplist instead of a file
    #[arg(long)]
    builtin_stoplist: bool,

    /// Keep stopwords
    #[arg(long)]
    no_stoplist: bool,

    /// Top words per topic scored by the diagnostics
    #[arg(long, env = "LDA_DIAGNOSTICS_WORDS", default_value_t = DEFAULT_DIAGNOSTICS_TOP_WORDS)]
    diagnostics_words: usize,

    /// Write `topic<TAB>alpha<TAB>words` lines here
    #[arg(long)]
    topic_keys: Option<PathBuf>,

    /// Write per-document topic proportions here
    #[arg(long)]
    doc_topics: Option<PathBuf>,

    /// Print topics and diagnostics as JSON
    #[arg(long)]
    json: bool,
}

impl TrainArgs {
    // --no-stoplist, then --builtin-stoplist, then --stoplist, then the default file
    fn stoplist_source(&self) -> StoplistSource {
        if self.no_stoplist {
            StoplistSource::None
        } else if self.builtin_stoplist {
            StoplistSource::English
        } else {
            let path = self
                .stoplist
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STOPLIST_PATH));
            StoplistSource::File(path)
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    perplexity: f64,
    topics: &'a [TopicSummary],
    diagnostics: &'a Diagnostics,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lda_topics=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => train(args),
    }
}

fn train(args: TrainArgs) -> Result<()> {
    if args.input.is_none() && args.statements.is_empty() {
        anyhow::bail!("Nothing to train on: pass --input and/or --statement");
    }

    let stoplist = args.stoplist_source();

    let mut builder = TopicModel::builder(args.topics);
    builder
        .alpha_sum(args.alpha_sum)
        .beta(args.beta)
        .num_threads(args.threads)
        .num_iterations(args.iterations)
        .show_topics_interval(args.show_interval)
        .stoplist(stoplist);
    if let Some(seed) = args.seed {
        builder.seed(seed);
    }
    let mut model = builder.build().context("Failed to set up topic model")?;

    if let Some(input) = &args.input {
        model
            .add_data_from_file(input)
            .with_context(|| format!("Failed to load {}", input.display()))?;
    }
    if !args.statements.is_empty() {
        model.add_data_from_statements(&args.statements);
    }

    model.train_model().context("Training failed")?;
    let lda = model.model()?;
    let perplexity = lda.perplexity();
    let diagnostics = lda.topic_diagnostics(args.diagnostics_words);
    info!(
        perplexity,
        coherence = diagnostics.means.coherence,
        eff_num_words = diagnostics.means.eff_num_words,
        exclusivity = diagnostics.means.exclusivity,
        "Training finished"
    );

    if let Some(path) = &args.topic_keys {
        write_file(path, |out| lda.write_topic_keys(out, args.words))?;
        info!(path = %path.display(), "Wrote topic keys");
    }
    if let Some(path) = &args.doc_topics {
        write_file(path, |out| lda.write_doc_topics(out))?;
        info!(path = %path.display(), "Wrote document topics");
    }

    let summary = lda.summary(args.words)?;
    if args.json {
        let report = Report {
            perplexity,
            topics: &summary,
            diagnostics: &diagnostics,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for topic in &summary {
            println!("{}", topic);
        }
    }

    Ok(())
}

fn write_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write(&mut out)
        .and_then(|_| out.flush())
        .with_context(|| format!("Failed to write {}", path.display()))
}
