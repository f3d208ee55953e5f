use futures_util::StreamExt;
use genlang_core::retriever::{self, ChunkSeed, RetrieverError};
use genlang_core::types::retriever::ChunkState;
use memory_retriever::{FIXED_RELEVANCE, MemoryRetriever};
use serde_json::{Map, Value, json};

fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("test payloads are objects"),
    }
}

#[tokio::test]
async fn async_lifecycle_matches_blocking() {
    let mut service = MemoryRetriever::new();

    let corpus = retriever::create_corpus_async(&mut service, Some("demo"), Some("Demo"))
        .await
        .unwrap();
    assert_eq!(corpus.name, "corpora/demo");

    let document = corpus
        .create_document_async(&mut service, Some("doc-1"), None, Vec::new())
        .await
        .unwrap();
    let chunk = document
        .create_chunk_async(&mut service, "hello", Some("k1"), Vec::new())
        .await
        .unwrap();
    assert_eq!(chunk.state, ChunkState::Active);

    let fetched = document.get_chunk_async(&mut service, "k1").await.unwrap();
    assert_eq!(fetched, chunk);

    document.delete_chunk_async(&mut service, "k1").await.unwrap();
    corpus
        .delete_document_async(&mut service, "doc-1", false)
        .await
        .unwrap();
    retriever::delete_corpus_async(&mut service, "demo", false)
        .await
        .unwrap();
}

#[tokio::test]
async fn async_listings_stream() {
    let mut service = MemoryRetriever::new();
    retriever::create_corpus_async(&mut service, Some("one"), None)
        .await
        .unwrap();
    retriever::create_corpus_async(&mut service, Some("two"), None)
        .await
        .unwrap();

    let mut stream = retriever::list_corpora_async(&mut service, None)
        .await
        .unwrap();
    let mut names = Vec::new();
    while let Some(corpus) = stream.next().await {
        names.push(corpus.unwrap().name);
    }
    drop(stream);
    assert_eq!(names, ["corpora/one", "corpora/two"]);
}

#[tokio::test]
async fn async_query_and_batches() {
    let mut service = MemoryRetriever::new();
    let corpus = retriever::create_corpus_async(&mut service, Some("demo"), None)
        .await
        .unwrap();
    let document = corpus
        .create_document_async(&mut service, Some("doc-1"), None, Vec::new())
        .await
        .unwrap();

    let created = document
        .batch_create_chunks_async(&mut service, vec![ChunkSeed::from("a"), ChunkSeed::from("b")])
        .await
        .unwrap();
    assert_eq!(created.len(), 2);

    let relevant = corpus
        .query_async(&mut service, "anything", Vec::new(), None)
        .await
        .unwrap();
    assert_eq!(relevant.len(), 2);
    assert_eq!(relevant[0].chunk_relevance_score, FIXED_RELEVANCE);

    let updated = document
        .batch_update_chunks_async(
            &mut service,
            vec![(
                "0".to_string(),
                payload(json!({ "data": { "string_value": "patched" } })),
            )],
        )
        .await
        .unwrap();
    assert_eq!(updated[0].data.string_value, "patched");

    document
        .batch_delete_chunks_async(&mut service, ["0", "1"])
        .await
        .unwrap();
}

#[tokio::test]
async fn async_update_validation_is_atomic() {
    let mut service = MemoryRetriever::new();
    let mut corpus = retriever::create_corpus_async(&mut service, Some("demo"), Some("Before"))
        .await
        .unwrap();

    let err = corpus
        .update_async(
            &mut service,
            payload(json!({ "display_name": "After", "name": "corpora/nope" })),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RetrieverError::Update(_)));
    assert_eq!(corpus.display_name, "Before");

    corpus
        .update_async(&mut service, payload(json!({ "display_name": "After" })))
        .await
        .unwrap();
    assert_eq!(corpus.display_name, "After");
}
