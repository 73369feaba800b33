//! Context rendering and prompt selection for the generator boundary.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use texrag_core::config::{KeywordGroup, PromptSettings};
use texrag_core::types::ChunkRecord;
use texrag_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLimits {
    pub max_chunks: usize,
    /// Per-chunk cap, in characters.
    pub max_chars: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            max_chunks: 10,
            max_chars: 900,
        }
    }
}

impl From<&PromptSettings> for ContextLimits {
    fn from(s: &PromptSettings) -> Self {
        Self {
            max_chunks: s.max_chunks,
            max_chars: s.max_chars,
        }
    }
}

/// Renders chunks as `--- [type=.. | tags=..]` blocks separated by a blank line.
pub fn build_context(chunks: &[ChunkRecord], limits: &ContextLimits) -> String {
    chunks
        .iter()
        .take(limits.max_chunks)
        .map(|ch| {
            let text = ch.text.trim();
            let text = match text.char_indices().nth(limits.max_chars) {
                Some((cut, _)) => format!("{}...", &text[..cut]),
                None => text.to_string(),
            };
            let mut meta = vec![format!("type={}", ch.doc_type)];
            if !ch.tags.is_empty() {
                meta.push(format!("tags={}", ch.tags.join(",")));
            }
            format!("--- [{}]\n{}", meta.join(" | "), text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PromptMode {
    #[default]
    Generic,
    ProblemSet,
    CheatSheet,
    Manual,
    Resume,
}

impl PromptMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptMode::Generic => "generic",
            PromptMode::ProblemSet => "problem_set",
            PromptMode::CheatSheet => "cheat_sheet",
            PromptMode::Manual => "manual",
            PromptMode::Resume => "resume",
        }
    }

    /// Mode selected by a keyword group name, if the name is known.
    pub fn for_group(name: &str) -> Option<Self> {
        match name {
            "hw" | "pset" | "problem_set" => Some(PromptMode::ProblemSet),
            "cheat_sheet" => Some(PromptMode::CheatSheet),
            "manual" => Some(PromptMode::Manual),
            "resume" => Some(PromptMode::Resume),
            _ => None,
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            PromptMode::Generic => "Use context to answer the user's question.",
            PromptMode::ProblemSet => {
                "You write problem sets in strict LaTeX.\n\nRules:\n\
                 - Output ONLY raw LaTeX (no markdown).\n\
                 - Start with \\documentclass{article}.\n\
                 - Use a title, author, \\maketitle and sections.\n\
                 - Provide 3-5 problems with subparts.\n\
                 - NO solutions."
            }
            PromptMode::CheatSheet => {
                "You write compact cheat sheets in LaTeX.\nOutput ONLY raw LaTeX."
            }
            PromptMode::Manual => {
                "You write structured manuals from the provided context.\n\
                 Use short sections and numbered steps. \
                 Do not invent procedures absent from the context."
            }
            PromptMode::Resume => {
                "You draft resume and cover letter material.\n\
                 Use only facts present in the context and keep each bullet to one line."
            }
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "generic" {
            return Ok(PromptMode::Generic);
        }
        PromptMode::for_group(&s)
            .or(match s.as_str() {
                "cheatsheet" => Some(PromptMode::CheatSheet),
                _ => None,
            })
            .ok_or_else(|| Error::InvalidConfig(format!("unknown prompt mode '{}'", s)))
    }
}

/// Chooses a [`PromptMode`] from configured keyword groups.
#[derive(Debug, Clone)]
pub struct KeywordRouter {
    groups: Vec<KeywordGroup>,
}

impl Default for KeywordRouter {
    fn default() -> Self {
        Self::new(PromptSettings::default().keyword_groups)
    }
}

impl KeywordRouter {
    pub fn new(groups: Vec<KeywordGroup>) -> Self {
        Self { groups }
    }

    /// Query triggers first, then chunk tags, each in group order.
    pub fn route(&self, query: &str, chunks: &[ChunkRecord]) -> PromptMode {
        let q = query.to_lowercase();
        let by_query = self
            .groups
            .iter()
            .filter(|g| g.triggers.iter().any(|t| q.contains(&t.to_lowercase())))
            .find_map(|g| PromptMode::for_group(&g.name));
        if let Some(mode) = by_query {
            return mode;
        }
        let tags: BTreeSet<String> = chunks
            .iter()
            .flat_map(|c| c.tags.iter().map(|t| t.to_lowercase()))
            .collect();
        self.groups
            .iter()
            .filter(|g| tags.contains(&g.name.to_lowercase()))
            .find_map(|g| PromptMode::for_group(&g.name))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub fn build_prompt(
    query: &str,
    chunks: &[ChunkRecord],
    mode: PromptMode,
    limits: &ContextLimits,
) -> Prompt {
    let context = build_context(chunks, limits);
    let user = match mode {
        PromptMode::Generic => format!("Query: {}\n\nContext:\n{}", query, context),
        _ => format!("{}\n\nContext:\n{}", query, context),
    };
    Prompt {
        system: mode.system_prompt().to_string(),
        user,
    }
}
