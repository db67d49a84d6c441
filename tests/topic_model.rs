// Integration tests for the TopicModel front end: loading paths, stoplists,
// failure cases and reproducibility.

use std::path::PathBuf;

use lda_topics::{Error, StoplistSource, TopicModel};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn model(topics: usize) -> TopicModel {
    TopicModel::builder(topics)
        .stoplist(StoplistSource::File(fixture("stoplist.txt")))
        .num_iterations(150)
        .seed(11)
        .build()
        .unwrap()
}

// ============================================================
// Loading documents
// ============================================================

#[test]
fn file_and_statements_produce_identical_features() {
    let mut from_file = model(2);
    let added = from_file.add_data_from_file(fixture("brocolli.txt")).unwrap();
    assert_eq!(added, 5);

    let texts: Vec<String> = std::fs::read_to_string(fixture("brocolli.txt"))
        .unwrap()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.splitn(3, ' ').nth(2).unwrap().to_string())
        .collect();
    let mut from_memory = model(2);
    assert_eq!(from_memory.add_data_from_statements(&texts), 5);

    let a = from_file.instances();
    let b = from_memory.instances();
    assert_eq!(a.alphabet(), b.alphabet());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.data, y.data);
    }
}

#[test]
fn file_metadata_is_kept() {
    let mut model = model(2);
    model.add_data_from_file(fixture("brocolli.txt")).unwrap();

    let first = &model.instances().instances()[0];
    assert_eq!(first.name, "d1");
    assert_eq!(first.label, "food");
    // the label is metadata only
    assert!(model.instances().alphabet().lookup_index("food").is_none());
}

#[test]
fn statements_are_named_by_position() {
    let mut model = model(2);
    model.add_data_from_statements(&["brocolli mother", "brother health"]);
    model.add_data_from_statements(&["pressure school"]);

    let names: Vec<&str> = model
        .instances()
        .iter()
        .map(|inst| inst.name.as_str())
        .collect();
    assert_eq!(names, vec!["0", "1", "2"]);
}

#[test]
fn stoplist_file_words_are_removed() {
    let mut model = model(2);
    model.add_data_from_statements(&["The brocolli AND the mother, but not your brother"]);

    let alphabet = model.instances().alphabet();
    let words: Vec<&str> = alphabet.iter().collect();
    assert_eq!(words, vec!["brocolli", "mother", "brother"]);
}

#[test]
fn default_stoplist_is_read_from_the_repository() {
    let mut model = TopicModel::new(3).unwrap();
    model.add_data_from_statements(&["the brocolli which was eaten"]);
    let words: Vec<&str> = model.instances().alphabet().iter().collect();
    assert_eq!(words, vec!["brocolli", "eaten"]);
}

#[test]
fn missing_input_file_reports_the_path() {
    let mut model = model(2);
    match model.add_data_from_file("no/such/corpus.txt") {
        Err(Error::Io { path, .. }) => assert_eq!(path, PathBuf::from("no/such/corpus.txt")),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[test]
fn missing_stoplist_fails_at_construction() {
    let result = TopicModel::builder(2)
        .stoplist(StoplistSource::File(PathBuf::from("no/such/stoplist.txt")))
        .build();
    assert!(matches!(result, Err(Error::Stoplist { .. })));
}

// ============================================================
// Training and results
// ============================================================

#[test]
fn empty_corpus_fails_to_train() {
    let mut model = model(2);
    assert!(matches!(model.train_model(), Err(Error::EmptyCorpus)));

    model.add_data_from_statements(&["the and but", "", "to be or"]);
    assert!(matches!(model.train_model(), Err(Error::EmptyCorpus)));
    assert!(!model.is_trained());
}

#[test]
fn results_need_a_trained_model() {
    let mut model = model(2);
    model.add_data_from_file(fixture("brocolli.txt")).unwrap();
    assert!(matches!(model.top_words(0, 5), Err(Error::NotTrained)));

    model.train_model().unwrap();
    assert!(model.top_words(0, 5).is_ok());
    assert!(matches!(
        model.top_words(2, 5),
        Err(Error::TopicOutOfRange { topic: 2, num_topics: 2 })
    ));
}

#[test]
fn more_words_than_vocabulary_is_not_an_error() {
    let mut model = model(2);
    model.add_data_from_file(fixture("brocolli.txt")).unwrap();
    model.train_model().unwrap();

    let vocab = model.instances().alphabet().len();
    let total: usize = (0..2)
        .map(|topic| {
            let words = model.top_words(topic, vocab * 10).unwrap();
            assert!(words.len() <= vocab);
            words.len()
        })
        .sum();
    // every type shows up in at least one topic
    assert!(total >= vocab);
}

#[test]
fn fixed_seed_gives_identical_top_words() {
    let run = |threads: usize| {
        let mut model = TopicModel::builder(3)
            .stoplist(StoplistSource::File(fixture("stoplist.txt")))
            .num_iterations(100)
            .num_threads(threads)
            .seed(2024)
            .build()
            .unwrap();
        model.add_data_from_file(fixture("brocolli.txt")).unwrap();
        model.train_model().unwrap();
        (0..3)
            .map(|topic| model.top_words(topic, 8).unwrap())
            .collect::<Vec<_>>()
    };

    assert_eq!(run(1), run(1));
    assert_eq!(run(2), run(2));
    assert_eq!(run(4), run(4));
}

#[test]
fn retraining_picks_up_new_documents() {
    let mut model = model(2);
    model.add_data_from_file(fixture("brocolli.txt")).unwrap();
    model.train_model().unwrap();
    let before = model.model().unwrap().num_documents();

    model.add_data_from_statements(&["baseball practice after school"]);
    model.train_model().unwrap();
    assert_eq!(model.model().unwrap().num_documents(), before + 1);
}

#[test]
fn summary_serialises_to_json() {
    let mut model = model(2);
    model.add_data_from_file(fixture("brocolli.txt")).unwrap();
    model.train_model().unwrap();

    let summary = model.model().unwrap().summary(3).unwrap();
    assert_eq!(summary.len(), 2);
    let tokens: u32 = summary.iter().map(|t| t.tokens).sum();
    assert_eq!(tokens as usize, model.instances().num_tokens());

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json[0]["index"], 0);
    assert!(json[1]["words"].as_array().unwrap().len() <= 3);
}
