use std::sync::Arc;
use tracing::info;

use texrag_core::config::PromptSettings;
use texrag_core::traits::Generator;
use texrag_core::types::ChunkRecord;
use texrag_core::Result;

use crate::prompt::{build_prompt, ContextLimits, KeywordRouter, Prompt, PromptMode};
use crate::retriever::Retriever;

#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub mode: PromptMode,
    pub chunks: Vec<ChunkRecord>,
}

/// Retrieval, prompt assembly and one generator call.
pub struct RagEngine {
    retriever: Arc<Retriever>,
    generator: Arc<dyn Generator>,
    router: KeywordRouter,
    limits: ContextLimits,
}

impl RagEngine {
    pub fn new(retriever: Arc<Retriever>, generator: Arc<dyn Generator>) -> Self {
        Self {
            retriever,
            generator,
            router: KeywordRouter::default(),
            limits: ContextLimits::default(),
        }
    }

    pub fn with_prompt_settings(mut self, settings: &PromptSettings) -> Self {
        self.router = KeywordRouter::new(settings.keyword_groups.clone());
        self.limits = ContextLimits::from(settings);
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Retrieves context and builds the prompt without calling the generator.
    /// `mode: None` routes by keywords.
    pub fn prepare(
        &self,
        query: &str,
        k: usize,
        mode: Option<PromptMode>,
    ) -> Result<(PromptMode, Vec<ChunkRecord>, Prompt)> {
        let chunks = self.retriever.retrieve(query, k)?;
        let mode = mode.unwrap_or_else(|| self.router.route(query, &chunks));
        let prompt = build_prompt(query, &chunks, mode, &self.limits);
        Ok((mode, chunks, prompt))
    }

    pub fn answer(&self, query: &str, k: usize, mode: Option<PromptMode>) -> Result<Answer> {
        let (mode, chunks, prompt) = self.prepare(query, k, mode)?;
        info!(%mode, chunks = chunks.len(), "generating answer");
        let text = self.generator.generate(&prompt.system, &prompt.user)?;
        Ok(Answer { text, mode, chunks })
    }
}
