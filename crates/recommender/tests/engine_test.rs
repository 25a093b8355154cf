//! Integration tests for the factorization engine.
//!
//! These train the built-in ALS solver on a small synthetic log and check
//! the properties every trained engine must hold, whatever the numbers.

use data_loader::{Interaction, SyntheticConfig, generate_synthetic};
use recommender::{
    COLD_START_SCORE, EXPLANATION_NEIGHBORS, Explanation, FactorizationEngine, Hyperparameters,
    Preprocessed, Preprocessor, Recommend,
};
use std::collections::HashSet;
use std::sync::Arc;

fn create_test_setup() -> (Vec<Interaction>, FactorizationEngine) {
    let log = generate_synthetic(
        &SyntheticConfig::default()
            .with_users(40)
            .with_items(120)
            .with_interactions(600)
            .with_seed(7),
    )
    .unwrap();

    let Preprocessed { matrix, catalog } = Preprocessor::new().preprocess(&log).unwrap();
    let params = Hyperparameters::default()
        .with_factors(8)
        .with_iterations(5)
        .with_regularization(0.1);
    let mut engine = FactorizationEngine::new(Arc::new(catalog), params);
    engine.train(matrix).unwrap();

    (log, engine)
}

#[test]
fn test_history_is_never_recommended() {
    let (log, engine) = create_test_setup();

    for user_id in engine.catalog().users.external_ids() {
        let history: HashSet<&str> = log
            .iter()
            .filter(|i| i.user_id == user_id)
            .map(|i| i.item_id.as_str())
            .collect();

        let recs = engine.recommend(user_id, 20).unwrap();
        assert!(recs.len() <= 20);
        assert!(
            recs.iter().all(|r| !history.contains(r.item_id.as_str())),
            "user {} was recommended an item from their history",
            user_id
        );
        assert!(recs.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn test_recommendations_fill_up_to_eligible_items() {
    let (log, engine) = create_test_setup();
    let num_items = engine.catalog().items.len();

    let user_id = log[0].user_id.as_str();
    let seen = log.iter().filter(|i| i.user_id == user_id).count();

    let recs = engine.recommend(user_id, num_items + 10).unwrap();
    assert_eq!(recs.len(), num_items - seen);
}

#[test]
fn test_similar_items_never_include_query() {
    let (_, engine) = create_test_setup();

    let expected = 10.min(engine.catalog().items.len() - 1);

    for item_id in engine.catalog().items.external_ids() {
        let similar = engine.similar_items(item_id, 10).unwrap();
        assert_eq!(similar.len(), expected);
        assert!(similar.iter().all(|s| s.item_id != item_id));
        assert!(similar.iter().all(|s| s.similarity <= 1.0 + 1e-5));
    }
}

#[test]
fn test_cold_start_is_deterministic() {
    let (_, engine) = create_test_setup();
    let popular = &engine.catalog().popular_items;

    for n in [0, 1, popular.len() / 2, popular.len()] {
        let recs = engine.recommend("never-seen-user", n).unwrap();
        assert_eq!(recs.len(), n);
        for (rec, expected) in recs.iter().zip(popular.iter()) {
            assert_eq!(&rec.item_id, expected);
            assert_eq!(rec.score, COLD_START_SCORE);
        }
    }
}

#[test]
fn test_ghost_user_gets_top_three_popular() {
    let log = vec![
        Interaction::new("u1", "i1", 5.0),
        Interaction::new("u1", "i2", 1.0),
        Interaction::new("u2", "i2", 3.0),
        Interaction::new("u3", "i3", 2.0),
        Interaction::new("u3", "i4", 0.5),
    ];
    let Preprocessed { matrix, catalog } = Preprocessor::new().preprocess(&log).unwrap();
    let mut engine = FactorizationEngine::new(
        Arc::new(catalog),
        Hyperparameters::default().with_factors(2).with_iterations(3),
    );
    engine.train(matrix).unwrap();

    let recs = engine.recommend("ghost", 3).unwrap();
    let ids: Vec<&str> = recs.iter().map(|r| r.item_id.as_str()).collect();
    assert_eq!(ids, vec!["i1", "i2", "i3"]);
    assert!(recs.iter().all(|r| r.score == 1.0));
}

#[test]
fn test_explain_known_and_unknown() {
    let (log, engine) = create_test_setup();
    let user_id = log[0].user_id.as_str();
    let item_id = engine.recommend(user_id, 1).unwrap()[0].item_id.clone();

    match engine.explain(user_id, &item_id).unwrap() {
        Explanation::SimilarityBased { similar_items } => {
            let expected = EXPLANATION_NEIGHBORS.min(engine.catalog().items.len() - 1);
            assert_eq!(similar_items.len(), expected);
        }
        other => panic!("expected similarity explanation, got {:?}", other),
    }
    assert!(engine.explain(user_id, "no-such-item").unwrap().is_cold_start());
}

#[test]
fn test_concurrent_readers() {
    let (log, engine) = create_test_setup();
    let engine = Arc::new(engine);
    let user_id = log[0].user_id.clone();
    let expected = engine.recommend(&user_id, 5).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let user_id = user_id.clone();
            std::thread::spawn(move || Recommend::recommend(engine.as_ref(), &user_id, 5).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_unregularized_training_on_a_tiny_catalog() {
    let log = vec![
        Interaction::new("u1", "i1", 5.0),
        Interaction::new("u1", "i2", 1.0),
        Interaction::new("u2", "i2", 3.0),
        Interaction::new("u3", "i3", 2.0),
    ];
    let Preprocessed { matrix, catalog } = Preprocessor::new().preprocess(&log).unwrap();
    let params = Hyperparameters::default()
        .with_factors(8)
        .with_regularization(0.0);
    let mut engine = FactorizationEngine::new(Arc::new(catalog), params);

    engine.train(matrix).unwrap();
    let recs = engine.recommend("u2", 2).unwrap();
    assert_eq!(recs.len(), 2);
    assert!(recs.iter().all(|r| r.score.is_finite()));
}
