use std::path::Path;

use async_trait::async_trait;
use color_eyre::eyre::WrapErr as _;
use color_eyre::Result;
use openai::OpenAiConfig;

use super::KnowledgeBase;

const MAX_CHUNK_CHARS: usize = 1_200;
const EMBEDDING_BATCH: usize = 64;

/// Used when no embeddings key or knowledge directory is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKnowledge;

#[async_trait]
impl KnowledgeBase for NoKnowledge {
    async fn similar(&self, _query: &str, _limit: usize) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone)]
struct Passage {
    text: String,
    embedding: Vec<f32>,
}

/// Cooking notes embedded once at startup and searched by cosine similarity.
#[derive(Debug, Clone)]
pub struct EmbeddedNotes {
    config: OpenAiConfig,
    model: String,
    passages: Vec<Passage>,
}

impl EmbeddedNotes {
    /// Reads every `.md` and `.txt` file directly inside `dir`.
    #[tracing::instrument(skip(config), err)]
    pub async fn load(config: OpenAiConfig, model: String, dir: &Path) -> Result<Self> {
        let mut texts = Vec::new();

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .wrap_err_with(|| format!("Couldn't read knowledge dir {}", dir.display()))?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_note = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e, "md" | "txt"));
            if is_note {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .wrap_err_with(|| format!("Couldn't read {}", path.display()))?;
            texts.extend(chunk(&contents, MAX_CHUNK_CHARS));
        }

        let mut passages = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBEDDING_BATCH) {
            let embeddings = openai::embed(&config, &model, batch).await?;
            passages.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(embeddings)
                    .map(|(text, embedding)| Passage { text, embedding }),
            );
        }

        tracing::info!(passages = passages.len(), "Knowledge base loaded");

        Ok(Self {
            config,
            model,
            passages,
        })
    }
}

#[async_trait]
impl KnowledgeBase for EmbeddedNotes {
    async fn similar(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        if self.passages.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let query = openai::embed(&self.config, &self.model, &[query.to_string()])
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        Ok(top_matches(&self.passages, &query, limit))
    }
}

fn top_matches(passages: &[Passage], query: &[f32], limit: usize) -> Vec<String> {
    let mut scored = passages
        .iter()
        .map(|p| (cosine_similarity(&p.embedding, query), p))
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .take(limit)
        .map(|(_, p)| p.text.clone())
        .collect()
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Splits on blank lines and packs paragraphs into chunks of at most
/// `max_chars`. A single longer paragraph becomes its own chunk.
pub(crate) fn chunk(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        if !current.is_empty() && current.len() + paragraph.len() + 2 > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
