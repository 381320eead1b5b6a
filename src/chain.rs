//! Conversational retrieval chain: condense → retrieve → generate → cite.
//!
//! One call, one pass, no persisted state. The caller supplies the chat
//! history; the chain never stores or mutates it. Any step failure fails
//! the whole call — an ungrounded answer is never returned disguised as a
//! grounded one.

use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::{ChatError, Result};
use crate::generation::Generator;
use crate::index::VectorIndex;
use crate::models::{ChatResponse, ChatTurn};

/// Prompt for rewriting a follow-up question into a standalone query using
/// the prior turns as context.
const CONDENSE_PROMPT: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question.\n\n\
Chat History:\n{chat_history}\n\
Follow Up Input: {question}\n\
Standalone question:";

/// Grounding prompt: the model answers only from the retrieved context.
const QA_PROMPT: &str = "You are a helpful AI assistant. Use the following pieces of context \
to answer the question at the end.\n\
If you don't know the answer, just say you don't know. DO NOT try to make up an answer.\n\
If the question is not related to the context, politely respond that you are tuned to only \
answer questions that are related to the context.\n\n\
{context}\n\n\
Question: {question}\n\
Helpful answer:";

/// The retrieval-augmented chat pipeline over one resource's index.
pub struct RetrievalChain<'a> {
    config: &'a Config,
    embedder: &'a dyn Embedder,
    generator: &'a dyn Generator,
}

impl<'a> RetrievalChain<'a> {
    pub fn new(config: &'a Config, embedder: &'a dyn Embedder, generator: &'a dyn Generator) -> Self {
        Self {
            config,
            embedder,
            generator,
        }
    }

    /// Answer `question` against the named resource, using `history` only
    /// to reformulate follow-ups into standalone queries.
    pub async fn answer(
        &self,
        resource_name: &str,
        question: &str,
        history: &[ChatTurn],
    ) -> Result<ChatResponse> {
        let question = sanitize_question(question);
        if question.is_empty() {
            return Err(ChatError::InvalidRequest(
                "No question in the request".to_string(),
            ));
        }
        let resource_name = validate_resource_name(resource_name)?;

        // Load. The index is read-only from here on.
        let index = VectorIndex::load(&self.config.paths.index_dir.join(&resource_name))?;

        // Condense. An empty history means the question already stands alone
        // and no generation call is spent.
        let standalone = if history.is_empty() {
            question.clone()
        } else {
            let prompt = CONDENSE_PROMPT
                .replace("{chat_history}", &format_history(history))
                .replace("{question}", &question);
            let condensed = self.generator.complete(&prompt).await?;
            let condensed = condensed.trim();
            if condensed.is_empty() {
                question.clone()
            } else {
                condensed.to_string()
            }
        };

        // Retrieve.
        let query_vector = self.embedder.embed_query(&standalone).await?;
        let results = index.search(&query_vector, self.config.retrieval.top_k)?;

        // Generate, grounding on the retrieved chunks and the original
        // question (not the condensed one).
        let context = results
            .iter()
            .map(|(chunk, _)| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = QA_PROMPT
            .replace("{context}", &context)
            .replace("{question}", &question);
        let text = self.generator.complete(&prompt).await?;

        Ok(ChatResponse {
            text,
            source_documents: results.into_iter().map(|(chunk, _)| chunk).collect(),
        })
    }
}

/// Trim and collapse newlines to spaces; embedding services behave better
/// on single-line queries.
fn sanitize_question(question: &str) -> String {
    question.trim().replace(['\n', '\r'], " ")
}

/// Resource names come from the request body; reject anything that could
/// escape the index directory.
fn validate_resource_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ChatError::InvalidRequest(
            "No resource_name in the request".to_string(),
        ));
    }
    if name.contains(['/', '\\']) || name.contains("..") {
        return Err(ChatError::InvalidRequest(format!(
            "invalid resource name: {}",
            name
        )));
    }
    Ok(name.to_string())
}

fn format_history(history: &[ChatTurn]) -> String {
    let mut out = String::new();
    for turn in history {
        out.push_str("Human: ");
        out.push_str(&turn.question);
        out.push('\n');
        out.push_str("Assistant: ");
        out.push_str(&turn.answer);
        out.push('\n');
    }
    out
}
