use genlang_core::retriever::{self, ChunkSeed, RetrieverError};
use genlang_core::types::permission::{GranteeType, Role};
use genlang_core::types::retriever::ChunkState;
use memory_retriever::{FIXED_RELEVANCE, MemoryRetriever};
use serde_json::{Map, Value, json};

fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("test payloads are objects"),
    }
}

#[test]
fn corpus_document_chunk_lifecycle() {
    let mut service = MemoryRetriever::new();

    let corpus = retriever::create_corpus(&mut service, Some("demo"), Some("Demo")).unwrap();
    assert_eq!(corpus.name, "corpora/demo");
    assert_eq!(corpus.display_name, "Demo");
    assert!(corpus.create_time.is_some());

    let document = corpus
        .create_document(&mut service, Some("doc-1"), Some("Doc"), Vec::new())
        .unwrap();
    assert_eq!(document.name, "corpora/demo/documents/doc-1");

    let chunk = document
        .create_chunk(&mut service, "hello world", Some("k1"), Vec::new())
        .unwrap();
    assert_eq!(chunk.name, "corpora/demo/documents/doc-1/chunks/k1");
    assert_eq!(chunk.data.string_value, "hello world");
    assert_eq!(chunk.state, ChunkState::Active);

    // Bare ids resolve through get the same as full names.
    let fetched = document.get_chunk(&mut service, "k1").unwrap();
    assert_eq!(fetched, chunk);
    let refetched = corpus.get_document(&mut service, "doc-1").unwrap();
    assert_eq!(refetched.name, document.name);

    document.delete_chunk(&mut service, "k1").unwrap();
    corpus.delete_document(&mut service, "doc-1", false).unwrap();
    retriever::delete_corpus(&mut service, "demo", false).unwrap();

    let err = retriever::get_corpus(&mut service, "demo").unwrap_err();
    assert!(matches!(err, RetrieverError::Rpc(_)));
}

#[test]
fn listings_decode_lazily() {
    let mut service = MemoryRetriever::new();
    retriever::create_corpus(&mut service, Some("one"), None).unwrap();
    retriever::create_corpus(&mut service, Some("two"), None).unwrap();

    let names: Vec<String> = retriever::list_corpora(&mut service, None)
        .unwrap()
        .map(|corpus| corpus.unwrap().name)
        .collect();
    assert_eq!(names, ["corpora/one", "corpora/two"]);

    let corpus = retriever::get_corpus(&mut service, "one").unwrap();
    corpus
        .create_document(&mut service, Some("d1"), None, Vec::new())
        .unwrap();
    corpus
        .create_document(&mut service, Some("d2"), None, Vec::new())
        .unwrap();
    let documents: Vec<_> = corpus
        .list_documents(&mut service, Some(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(documents.len(), 2);
}

#[test]
fn updates_apply_locally_and_remotely() {
    let mut service = MemoryRetriever::new();
    let mut corpus = retriever::create_corpus(&mut service, Some("demo"), Some("Before")).unwrap();

    corpus
        .update(&mut service, payload(json!({ "display_name": "After" })))
        .unwrap();
    assert_eq!(corpus.display_name, "After");
    let fetched = retriever::get_corpus(&mut service, "demo").unwrap();
    assert_eq!(fetched.display_name, "After");

    let err = corpus
        .update(&mut service, payload(json!({ "name": "corpora/other" })))
        .unwrap_err();
    assert!(matches!(err, RetrieverError::Update(_)));
    assert_eq!(corpus.name, "corpora/demo");

    let document = corpus
        .create_document(&mut service, Some("doc-1"), None, Vec::new())
        .unwrap();
    let mut chunk = document
        .create_chunk(&mut service, "old", Some("k1"), Vec::new())
        .unwrap();
    chunk
        .update(
            &mut service,
            payload(json!({ "data": { "string_value": "new" } })),
        )
        .unwrap();
    assert_eq!(chunk.data.string_value, "new");
    assert_eq!(
        document
            .get_chunk(&mut service, "k1")
            .unwrap()
            .data
            .string_value,
        "new"
    );
}

#[test]
fn queries_return_relevant_chunks() {
    let mut service = MemoryRetriever::new();
    let corpus = retriever::create_corpus(&mut service, Some("demo"), None).unwrap();
    let document = corpus
        .create_document(&mut service, Some("doc-1"), None, Vec::new())
        .unwrap();
    for i in 0..3 {
        document
            .create_chunk(&mut service, format!("text {i}"), None, Vec::new())
            .unwrap();
    }

    let all = corpus.query(&mut service, "text", Vec::new(), None).unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|rc| rc.chunk_relevance_score == FIXED_RELEVANCE));

    let limited = document
        .query(&mut service, "text", Vec::new(), Some(2))
        .unwrap();
    assert_eq!(limited.len(), 2);

    let err = corpus
        .query(&mut service, "text", Vec::new(), Some(101))
        .unwrap_err();
    assert!(matches!(err, RetrieverError::ResultsCountOutOfRange(101)));
}

#[test]
fn batch_chunk_operations() {
    let mut service = MemoryRetriever::new();
    let corpus = retriever::create_corpus(&mut service, Some("demo"), None).unwrap();
    let document = corpus
        .create_document(&mut service, Some("doc-1"), None, Vec::new())
        .unwrap();

    let created = document
        .batch_create_chunks(
            &mut service,
            vec![ChunkSeed::from("first"), ChunkSeed::from(("named", "second"))],
        )
        .unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].name, "corpora/demo/documents/doc-1/chunks/0");
    assert_eq!(created[1].name, "corpora/demo/documents/doc-1/chunks/named");

    let updated = document
        .batch_update_chunks(
            &mut service,
            vec![(
                "named".to_string(),
                payload(json!({ "data": { "string_value": "patched" } })),
            )],
        )
        .unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].data.string_value, "patched");

    document
        .batch_delete_chunks(&mut service, ["0", "named"])
        .unwrap();
    let remaining: Vec<_> = document
        .list_chunks(&mut service, None)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert!(remaining.is_empty());
}

#[test]
fn permissions_enforce_grantee_rules() {
    let mut service = MemoryRetriever::new();
    let corpus = retriever::create_corpus(&mut service, Some("demo"), None).unwrap();

    let everyone = corpus
        .create_permission(&mut service, Role::Reader, GranteeType::Everyone, None)
        .unwrap();
    assert_eq!(everyone.role, Role::Reader);
    assert_eq!(everyone.grantee_type, GranteeType::Everyone);

    corpus
        .create_permission(
            &mut service,
            Role::Writer,
            GranteeType::User,
            Some("dev@example.com"),
        )
        .unwrap();

    let err = corpus
        .create_permission(
            &mut service,
            Role::Reader,
            GranteeType::Everyone,
            Some("dev@example.com"),
        )
        .unwrap_err();
    assert!(matches!(err, RetrieverError::EmailForEveryone(_)));

    let listed: Vec<_> = corpus
        .list_permissions(&mut service, None)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(listed.len(), 2);
}

#[test]
fn invalid_ids_fail_before_any_request() {
    let mut service = MemoryRetriever::new();
    let corpus = retriever::create_corpus(&mut service, Some("demo"), None).unwrap();

    let err = corpus
        .create_document(&mut service, Some("Bad Id"), None, Vec::new())
        .unwrap_err();
    assert!(matches!(err, RetrieverError::InvalidName { .. }));

    // Nothing was created.
    let documents: Vec<_> = corpus
        .list_documents(&mut service, None)
        .unwrap()
        .collect();
    assert!(documents.is_empty());
}
