// tests/ranking.rs
mod common;

use common::{day, row_numbers};
use draw_ranker::analyze::{
    build_frequency, rank, select_topk, Classifier, ClassifierError, FeatureMatrix,
    FrequencyTable, ProbabilityFileClassifier, RankParams, SignalSource,
};
use draw_ranker::ingest::merge::merge;
use draw_ranker::{Dataset, DrawRecord};
use rand::Rng;

fn history(rows: usize, domain_max: u8) -> Dataset {
    let recs = (0..rows)
        .map(|i| {
            let n: Vec<u32> = row_numbers(i, domain_max).iter().map(|&x| x.into()).collect();
            DrawRecord::new(day(2025, 12, 31) - chrono::Duration::days(i as i64), &n, domain_max, "t")
                .unwrap()
        })
        .collect();
    merge(vec![recs], 1_000).0
}

fn random_history(rng: &mut impl Rng, rows: usize, domain_max: u8) -> Dataset {
    let recs = (0..rows)
        .map(|i| {
            let mut n: Vec<u32> = Vec::with_capacity(6);
            while n.len() < 6 {
                let x = rng.random_range(1..=u32::from(domain_max));
                if !n.contains(&x) {
                    n.push(x);
                }
            }
            DrawRecord::new(day(2025, 12, 31) - chrono::Duration::days(i as i64), &n, domain_max, "r")
                .unwrap()
        })
        .collect();
    merge(vec![recs], 1_000).0
}

/// Favours the highest numbers regardless of features.
struct HighNumbers;

impl Classifier for HighNumbers {
    fn score_all(&self, f: &FeatureMatrix) -> Result<Vec<f64>, ClassifierError> {
        let d = f64::from(f.domain_max);
        Ok((1..=f.domain_max).map(|n| f64::from(n) / d).collect())
    }
}

struct Broken;

impl Classifier for Broken {
    fn score_all(&self, _: &FeatureMatrix) -> Result<Vec<f64>, ClassifierError> {
        Err(ClassifierError::Unavailable("model not trained".into()))
    }
}

#[test]
fn empty_history_without_classifier_is_one_to_six() {
    let r = select_topk(Some(&FrequencyTable::empty(45)), None, 6, 45).unwrap();
    assert_eq!(r.numbers, vec![1, 2, 3, 4, 5, 6]);

    let out = rank(&Dataset::empty(), None, None, &RankParams::default()).unwrap();
    assert_eq!(out.ranking.numbers, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(out.ranking.source, SignalSource::Degraded);
    assert_eq!(out.window_used, 0);
}

#[test]
fn rankings_hold_their_invariants_on_random_histories() {
    let mut rng = rand::rng();
    for _ in 0..50 {
        let domain_max: u8 = if rng.random_bool(0.5) { 45 } else { 55 };
        let rows = rng.random_range(0..120);
        let k = rng.random_range(1..=usize::from(domain_max));
        let ds = random_history(&mut rng, rows, domain_max);
        let params = RankParams {
            window: rng.random_range(1..80),
            top_k: k,
            domain_max,
            ..RankParams::default()
        };

        let out = rank(&ds, None, None, &params).unwrap();
        let n = &out.ranking.numbers;
        assert_eq!(n.len(), k);
        assert!(n.windows(2).all(|w| w[0] < w[1]));
        assert!(n.iter().all(|&x| (1..=domain_max).contains(&x)));
        assert_eq!(out.window_used, rows.min(params.window));

        // same input, same output
        assert_eq!(rank(&ds, None, None, &params).unwrap().ranking, out.ranking);
    }
}

#[test]
fn window_limits_what_is_counted() {
    let ds = history(60, 45);
    let t10 = build_frequency(&ds, 10, 45);
    let t60 = build_frequency(&ds, 60, 45);
    assert_eq!(t10.window_used(), 10);
    assert_eq!(t10.iter().map(|(_, c)| c).sum::<u32>(), 60);
    assert_eq!(t60.iter().map(|(_, c)| c).sum::<u32>(), 360);
}

#[test]
fn classifier_needs_enough_history() {
    let short = history(10, 45);
    let params = RankParams::default();
    let out = rank(&short, None, Some(&HighNumbers), &params).unwrap();
    assert_eq!(out.ranking.source, SignalSource::Frequency);
    assert!(out.classifier_note.unwrap().contains("insufficient history"));

    let long = history(80, 45);
    let out = rank(&long, None, Some(&HighNumbers), &params).unwrap();
    assert_eq!(out.ranking.source, SignalSource::Combined);
    assert!(out.classifier_note.is_none());
}

#[test]
fn failing_classifier_falls_back_to_frequency() {
    let ds = history(80, 45);
    let params = RankParams::default();
    let with = rank(&ds, None, Some(&Broken), &params).unwrap();
    let without = rank(&ds, None, None, &params).unwrap();
    assert_eq!(with.ranking, without.ranking);
    assert!(with.classifier_note.unwrap().contains("model not trained"));
}

#[test]
fn probability_file_classifier_drives_the_ranking() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("probs.json");
    // Strong belief in 40..45; the 45-number game has no history to compete with it.
    std::fs::write(
        &p,
        r#"{"probabilities": {"40": 0.9, "41": 0.9, "42": 0.9, "43": 0.9, "44": 0.9, "45": 0.9}}"#,
    )
    .unwrap();
    let clf = ProbabilityFileClassifier::new(&p);
    let params = RankParams {
        min_history: 0,
        ..RankParams::default()
    };
    let out = rank(&Dataset::empty(), None, Some(&clf), &params).unwrap();
    assert_eq!(out.ranking.source, SignalSource::Classifier);
    assert_eq!(out.ranking.numbers, vec![40, 41, 42, 43, 44, 45]);
}

#[test]
fn companion_game_shapes_features_only() {
    let mega = history(60, 45);
    let power = history(60, 55);
    let params = RankParams::default();
    // No classifier: the companion has no say in the ranking.
    let a = rank(&mega, Some(&power), None, &params).unwrap();
    let b = rank(&mega, None, None, &params).unwrap();
    assert_eq!(a.ranking, b.ranking);
}
