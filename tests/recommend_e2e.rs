use recipe_knn::{
    build, deserialize, parse_feed, recommend, recommend_batch, serialize, EncodedCorpus,
    RecommendError, Recommender,
};

const FEED: &str = r#"[
    {"id": 1, "ingredients": ["egg", "flour"]},
    {"id": 2, "ingredients": ["egg", "flour", "sugar"]},
    {"id": 3, "ingredients": ["beef", "onion"]}
]"#;

fn corpus() -> EncodedCorpus {
    build(&parse_feed(FEED).unwrap()).unwrap()
}

#[test]
fn test_vocabulary_of_feed() {
    let corpus = corpus();
    let vocabulary: Vec<&str> = corpus.vocabulary().iter().collect();

    assert_eq!(corpus.dimension(), 5);
    assert_eq!(vocabulary, vec!["egg", "flour", "sugar", "beef", "onion"]);
}

#[test]
fn test_recommend_examples() {
    let corpus = corpus();

    // recipe 2 shares both of recipe 1's ingredients, recipe 3 shares none
    assert_eq!(recommend(&corpus, 1, 1).unwrap(), vec![2]);
    assert_eq!(recommend(&corpus, 1, 2).unwrap(), vec![2, 3]);
}

#[test]
fn test_batch_example() {
    let corpus = corpus();
    let results = recommend_batch(&corpus, &[1, 3], 1).unwrap();

    let entries: Vec<(i64, Vec<i64>)> = results.into_iter().collect();
    // recipe 3 differs from recipe 1 in 4 ingredients and from recipe 2 in 5
    assert_eq!(entries, vec![(1, vec![2]), (3, vec![1])]);
}

#[test]
fn test_batch_matches_single_queries() {
    let corpus = corpus();
    let session = Recommender::new(&corpus).unwrap();
    let batch = session.recommend_batch(&[3, 2, 1], 2).unwrap();

    for (id, recommendations) in &batch {
        assert_eq!(recommendations, &session.recommend(*id, 2).unwrap());
    }
}

#[test]
fn test_errors() {
    let corpus = corpus();

    assert!(matches!(build(&[]), Err(RecommendError::EmptyCorpus)));
    assert!(matches!(recommend(&corpus, 4, 1), Err(RecommendError::UnknownRecipe(4))));
    assert!(matches!(recommend(&corpus, 1, 0), Err(RecommendError::InvalidArgument(_))));
    assert!(matches!(
        parse_feed(r#"[{"id": 1, "ingredients": "egg"}]"#),
        Err(RecommendError::InvalidArgument(_))
    ));
}

#[test]
fn test_round_trip_then_recommend() {
    let corpus = corpus();
    let restored = deserialize(&serialize(&corpus).unwrap()).unwrap();

    assert_eq!(restored, corpus);
    assert_eq!(recommend(&restored, 1, 2).unwrap(), vec![2, 3]);
}

#[test]
fn test_independent_sessions() {
    let desserts = corpus();
    let salads = build(&parse_feed(
        r#"[{"id": 1, "ingredients": ["lettuce"]}, {"id": 7, "ingredients": ["lettuce", "tomato"]}]"#,
    ).unwrap()).unwrap();

    let first = Recommender::new(&desserts).unwrap();
    let second = Recommender::new(&salads).unwrap();

    assert_eq!(first.recommend(1, 1).unwrap(), vec![2]);
    assert_eq!(second.recommend(1, 1).unwrap(), vec![7]);
}
