use std::collections::BTreeSet;

use texrag_core::classify::{Classifier, ClassifierRules, TagRule, TypeRule};
use texrag_core::types::DocType;

fn tags(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn filename_rules_come_first() {
    let c = Classifier::default();
    assert_eq!(c.classify("CIS320_HW3.tex", "generative adversarial network"), DocType::Pset);
    assert_eq!(c.classify("stat431_cheat_sheet.tex", ""), DocType::CheatSheet);
    assert_eq!(c.classify("Trading_Manual.tex", ""), DocType::Manual);
    assert_eq!(c.classify("resume_2024.tex", ""), DocType::Resume);
    assert_eq!(c.classify("slingshot_draft.tex", ""), DocType::Research);
    assert_eq!(c.classify("lecture_notes.tex", ""), DocType::CourseNotes);
}

#[test]
fn earlier_rules_win_over_later_ones() {
    let c = Classifier::default();
    // contains both "exam_master" (cheat sheet) and "notes" (course notes)
    assert_eq!(c.classify("exam_master_notes.tex", ""), DocType::CheatSheet);
    // "midterm" (pset) beats "guide" (manual)
    assert_eq!(c.classify("midterm_guide.tex", ""), DocType::Pset);
}

#[test]
fn content_rules_are_the_fallback() {
    let c = Classifier::default();
    assert_eq!(
        c.classify("lecture.tex", "We study Hypothesis Testing today"),
        DocType::CourseStatistics
    );
    assert_eq!(c.classify("paper.tex", "A Generative Adversarial Network"), DocType::Research);
    assert_eq!(c.classify("misc.tex", "plain words"), DocType::Unknown);
}

#[test]
fn tags_always_include_the_doc_type() {
    let c = Classifier::default();
    assert_eq!(c.infer_tags("misc.tex", DocType::Unknown), tags(&["unknown"]));
    assert_eq!(c.infer_tags("CIS320_HW3.tex", DocType::Pset), tags(&["cis320", "hw", "pset"]));
    assert_eq!(
        c.infer_tags("stat431_cheat_sheet.tex", DocType::CheatSheet),
        tags(&["cheat_sheet", "stat431"])
    );
    assert_eq!(
        c.infer_tags("Quant_Trading_Manual.tex", DocType::Manual),
        tags(&["manual", "trading"])
    );
}

#[test]
fn injected_rules_replace_the_defaults() {
    let rules = ClassifierRules {
        filename: vec![TypeRule {
            keywords: vec!["alpha".to_string()],
            doc_type: DocType::Manual,
        }],
        content: vec![TypeRule {
            keywords: vec!["omega".to_string()],
            doc_type: DocType::Research,
        }],
        tags: vec![TagRule {
            tag: "greek".to_string(),
            keywords: vec!["alpha".to_string(), "beta".to_string()],
        }],
    };
    let c = Classifier::new(rules);
    assert_eq!(c.classify("ALPHA.tex", ""), DocType::Manual);
    assert_eq!(c.classify("beta.tex", "omega point"), DocType::Research);
    assert_eq!(c.classify("hw1.tex", ""), DocType::Unknown);
    assert_eq!(c.infer_tags("beta.tex", DocType::Unknown), tags(&["greek", "unknown"]));
}

#[test]
fn classification_is_deterministic() {
    let c = Classifier::default();
    for name in ["a.tex", "cv.tex", "godsheet.tex", "quiz1.tex"] {
        assert_eq!(c.classify(name, "text"), c.classify(name, "text"));
        assert_eq!(c.infer_tags(name, DocType::Unknown), c.infer_tags(name, DocType::Unknown));
    }
}
