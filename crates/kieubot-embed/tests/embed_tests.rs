use kieubot_embed::{load_embedder, Embedder as _, EMBEDDING_DIM, QUERY_PREFIX};

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Force fake embedder to avoid loading the real model
    std::env::set_var("KIEU_USE_FAKE_EMBEDDINGS", "1");

    let embedder = load_embedder("intfloat/multilingual-e5-base", None).expect("embedder");
    let query = format!("{QUERY_PREFIX}Truyện Kiều là gì?");
    let texts = vec![query.clone(), query];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), EMBEDDING_DIM, "embedding dim is {EMBEDDING_DIM}");
    assert_eq!(embedder.dim(), EMBEDDING_DIM);

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn fake_embedder_distinguishes_texts() {
    std::env::set_var("KIEU_USE_FAKE_EMBEDDINGS", "1");

    let embedder = load_embedder("intfloat/multilingual-e5-base", None).expect("embedder");
    let embs = embedder
        .embed_batch(&["Nguyễn Du sinh năm nào?".to_string(), "thể thơ lục bát".to_string()])
        .expect("embed_batch");
    let dot: f32 = embs[0].iter().zip(embs[1].iter()).map(|(a, b)| a * b).sum();
    assert!(dot < 0.99, "different texts should not collapse to one vector (dot={dot})");
}
