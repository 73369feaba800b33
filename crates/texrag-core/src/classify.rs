//! Heuristic document classification and tagging.
//!
//! Labels only drive prompt routing, so the rules aim for determinism, not
//! accuracy. All matching is lower-case substring matching.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::DocType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRule {
    pub keywords: Vec<String>,
    pub doc_type: DocType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    pub tag: String,
    pub keywords: Vec<String>,
}

/// Ordered rule tables. Earlier rules win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRules {
    pub filename: Vec<TypeRule>,
    pub content: Vec<TypeRule>,
    pub tags: Vec<TagRule>,
}

fn type_rule(keywords: &[&str], doc_type: DocType) -> TypeRule {
    TypeRule {
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        doc_type,
    }
}

fn tag_rule(tag: &str, keywords: &[&str]) -> TagRule {
    TagRule {
        tag: tag.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

impl Default for ClassifierRules {
    fn default() -> Self {
        let filename = vec![
            type_rule(&["cheat", "godsheet", "exam_master", "exam master"], DocType::CheatSheet),
            type_rule(&["outline", "master_outline", "study_outline"], DocType::CheatSheet),
            type_rule(&["homework", "hw", "pset"], DocType::Pset),
            type_rule(&["practice_midterm", "practice midterm"], DocType::Pset),
            type_rule(&["midterm", "quiz", "exam"], DocType::Pset),
            type_rule(&["manual", "guide", "handbook"], DocType::Manual),
            type_rule(&["resume", "cv", "coverletter"], DocType::Resume),
            type_rule(&["gan_", "slingshot", "ij_", "research"], DocType::Research),
            type_rule(&["notes"], DocType::CourseNotes),
        ];
        let content = vec![
            type_rule(&["generative adversarial network", "gan"], DocType::Research),
            type_rule(&["hypothesis testing", "confidence interval"], DocType::CourseStatistics),
        ];
        let mut tags: Vec<TagRule> = ["cis320", "cis5210", "cis5450", "stat431", "wharton3010"]
            .iter()
            .map(|&course| tag_rule(course, &[course]))
            .collect();
        tags.extend([
            tag_rule("resume", &["resume", "cv"]),
            tag_rule("manual", &["manual", "guide", "handbook"]),
            tag_rule("hw", &["homework", "hw", "pset"]),
            tag_rule("cheat_sheet", &["cheat", "godsheet", "exam master", "study_outline"]),
            tag_rule("trading", &["trading", "quant"]),
        ]);
        Self {
            filename,
            content,
            tags,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: ClassifierRules,
}

impl Classifier {
    pub fn new(rules: ClassifierRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    /// Filename rules first, then content rules, else [`DocType::Unknown`].
    pub fn classify(&self, filename: &str, plain_text: &str) -> DocType {
        let name = filename.to_lowercase();
        if let Some(t) = first_match(&self.rules.filename, &name) {
            return t;
        }
        let text = plain_text.to_lowercase();
        first_match(&self.rules.content, &text).unwrap_or_default()
    }

    /// Filename-derived tags; always contains the doc type itself.
    pub fn infer_tags(&self, filename: &str, doc_type: DocType) -> BTreeSet<String> {
        let name = filename.to_lowercase();
        let mut tags = BTreeSet::from([doc_type.to_string()]);
        for rule in &self.rules.tags {
            if rule.keywords.iter().any(|k| name.contains(k.as_str())) {
                tags.insert(rule.tag.clone());
            }
        }
        tags
    }
}

fn first_match(rules: &[TypeRule], haystack: &str) -> Option<DocType> {
    rules
        .iter()
        .find(|r| r.keywords.iter().any(|k| haystack.contains(k.as_str())))
        .map(|r| r.doc_type)
}
