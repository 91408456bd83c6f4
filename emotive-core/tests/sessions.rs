use std::sync::Arc;

use emotive_core::prelude::*;

fn rules() -> RuleSet {
    RuleSet::new(vec![
        ModifierRule::new("Patience", "please", 0.01),
        ModifierRule::new("Patience", "now", -0.01),
    ])
}

#[test]
fn test_concurrent_increments_are_not_lost() {
    let registry = Arc::new(SessionRegistry::default());
    let engine = Arc::new(ModifierEngine::with_multiplier(rules(), 1.0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            let engine = engine.clone();
            std::thread::spawn(move || {
                for _ in 0..25 {
                    registry
                        .default_session()
                        .with_affect(|state| engine.apply(state, "please"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // 200 increments of 0.01 from 0.0, clamped at 1.0
    let patience = registry.default_session().snapshot().emotion(PATIENCE).unwrap();
    assert_eq!(patience, 1.0);
}

#[test]
fn test_concurrent_mixed_updates_stay_in_range() {
    let registry = Arc::new(SessionRegistry::default());
    let engine = Arc::new(ModifierEngine::with_multiplier(rules(), 50.0));

    let handles: Vec<_> = ["please please", "now now now", "please now"]
        .into_iter()
        .map(|text| {
            let registry = registry.clone();
            let engine = engine.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    let value = registry.get_or_create("shared").with_affect(|state| {
                        engine.apply(state, text);
                        state.emotion(PATIENCE).unwrap()
                    });
                    assert!((-1.0..=1.0).contains(&value));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_sessions_do_not_share_state() {
    let registry = Arc::new(SessionRegistry::default());
    let engine = Arc::new(ModifierEngine::with_multiplier(rules(), 10.0));

    let mut tasks = Vec::new();
    for (id, text) in [("polite", "please"), ("rude", "now")] {
        let registry = registry.clone();
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..5 {
                registry.get_or_create(id).with_affect(|state| engine.apply(state, text));
                tokio::task::yield_now().await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let polite = registry.get("polite").unwrap().snapshot().emotion(PATIENCE).unwrap();
    let rude = registry.get("rude").unwrap().snapshot().emotion(PATIENCE).unwrap();
    assert!((polite - 0.5).abs() < 1e-5);
    assert!((rude + 0.5).abs() < 1e-5);

    let mut ids = registry.ids();
    ids.sort();
    assert_eq!(ids, vec!["polite".to_string(), "rude".to_string()]);
}
