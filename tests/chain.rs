//! Retrieval chain behavior with offline embedder/generator doubles.

mod common;

use common::{test_config, MockEmbedder, MockGenerator};
use pdfchat::chain::RetrievalChain;
use pdfchat::error::ChatError;
use pdfchat::index::VectorIndex;
use pdfchat::models::{Chunk, ChatTurn};
use tempfile::TempDir;

fn chunk(i: usize, text: &str) -> Chunk {
    Chunk {
        text: text.to_string(),
        source: "contract.pdf".to_string(),
        chunk_index: i,
        hash: format!("{:064x}", i),
    }
}

/// Save a small index under `index_dir/<name>` for the chain to load.
fn save_index(index_dir: &std::path::Path, name: &str, entries: Vec<(Chunk, Vec<f32>)>) {
    VectorIndex::build(entries)
        .unwrap()
        .save(&index_dir.join(name))
        .unwrap();
}

#[tokio::test]
async fn empty_history_skips_the_condense_call() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), tmp.path());
    save_index(
        tmp.path(),
        "contract",
        vec![(chunk(0, "termination requires 30 days notice"), vec![1.0, 0.0, 0.0])],
    );

    let embedder = MockEmbedder::new(3);
    let generator = MockGenerator::new("unused", "The notice period is 30 days.");
    let chain = RetrievalChain::new(&config, &embedder, &generator);

    let response = chain
        .answer("contract", "What is the termination clause?", &[])
        .await
        .unwrap();

    assert_eq!(response.text, "The notice period is 30 days.");
    // Only the QA prompt; no condense round-trip.
    assert_eq!(generator.prompt_count(), 1);
    // The raw question was embedded verbatim.
    let seen = embedder.seen.lock().unwrap();
    assert_eq!(seen.as_slice(), ["What is the termination clause?"]);
}

#[tokio::test]
async fn history_condenses_before_retrieval() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), tmp.path());
    save_index(
        tmp.path(),
        "contract",
        vec![(chunk(0, "section 2 covers termination"), vec![1.0, 0.0, 0.0])],
    );

    let embedder = MockEmbedder::new(3);
    let generator = MockGenerator::new(
        "What does section 2 of the contract say about termination?",
        "Section 2 requires written notice.",
    );
    let chain = RetrievalChain::new(&config, &embedder, &generator);

    let history = vec![ChatTurn::new(
        "What is the termination clause?",
        "It is in section 2.",
    )];
    let response = chain
        .answer("contract", "What about section 2?", &history)
        .await
        .unwrap();

    assert_eq!(response.text, "Section 2 requires written notice.");
    assert_eq!(generator.prompt_count(), 2);

    let prompts = generator.prompts.lock().unwrap();
    // Condense prompt carries the prior turns and the follow-up.
    assert!(prompts[0].contains("Human: What is the termination clause?"));
    assert!(prompts[0].contains("Follow Up Input: What about section 2?"));
    // QA prompt grounds on retrieved context and the ORIGINAL question.
    assert!(prompts[1].contains("section 2 covers termination"));
    assert!(prompts[1].contains("Question: What about section 2?"));

    // The condensed query, not the raw follow-up, was embedded.
    let seen = embedder.seen.lock().unwrap();
    assert_eq!(
        seen.as_slice(),
        ["What does section 2 of the contract say about termination?"]
    );
}

#[tokio::test]
async fn single_chunk_index_cites_its_only_chunk() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), tmp.path());
    save_index(
        tmp.path(),
        "onepager",
        vec![(chunk(0, "the quarterly revenue was 4.2 million"), vec![0.5, 0.5, 0.0])],
    );

    let embedder = MockEmbedder::new(3);
    let generator = MockGenerator::new("unused", "Revenue was 4.2 million.");
    let chain = RetrievalChain::new(&config, &embedder, &generator);

    let response = chain
        .answer("onepager", "What was the revenue?", &[])
        .await
        .unwrap();

    assert_eq!(response.source_documents.len(), 1);
    assert_eq!(
        response.source_documents[0].text,
        "the quarterly revenue was 4.2 million"
    );
}

#[tokio::test]
async fn source_documents_preserve_rank_order() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), tmp.path());
    save_index(
        tmp.path(),
        "contract",
        vec![
            (chunk(0, "far away"), vec![0.0, 1.0, 0.0]),
            (chunk(1, "closest"), vec![1.0, 0.0, 0.0]),
            (chunk(2, "second"), vec![0.9, 0.4, 0.0]),
        ],
    );

    let embedder = MockEmbedder::new(3).with_fixed("pinpoint", vec![1.0, 0.0, 0.0]);
    let generator = MockGenerator::new("unused", "answer");
    let chain = RetrievalChain::new(&config, &embedder, &generator);

    let response = chain.answer("contract", "pinpoint", &[]).await.unwrap();
    let texts: Vec<&str> = response
        .source_documents
        .iter()
        .map(|c| c.text.as_str())
        .collect();
    assert_eq!(texts, vec!["closest", "second", "far away"]);
}

#[tokio::test]
async fn missing_resource_is_resource_not_found() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), tmp.path());

    let embedder = MockEmbedder::new(3);
    let generator = MockGenerator::new("unused", "answer");
    let chain = RetrievalChain::new(&config, &embedder, &generator);

    let err = chain.answer("ghost", "anything", &[]).await.unwrap_err();
    assert!(matches!(err, ChatError::ResourceNotFound(name) if name == "ghost"));
    // Short-circuit: no embedding or generation calls were made.
    assert_eq!(embedder.call_count(), 0);
    assert_eq!(generator.prompt_count(), 0);
}

#[tokio::test]
async fn blank_question_is_invalid_request() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), tmp.path());

    let embedder = MockEmbedder::new(3);
    let generator = MockGenerator::new("unused", "answer");
    let chain = RetrievalChain::new(&config, &embedder, &generator);

    let err = chain.answer("contract", "   \n ", &[]).await.unwrap_err();
    assert!(matches!(err, ChatError::InvalidRequest(_)));
}
