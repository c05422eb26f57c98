use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::models::{Platform, TestTally};

/// Whole-text `N / M`, as LeetCode renders its score span.
static SCORE_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\s*/\s*\d+\s*$").expect("score regex"));

/// `N / M` anywhere in the text.
static TALLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*/\s*(\d+)").expect("tally regex"));

const NEETCODE_LABEL: &str = "Passed test cases:";

/// Read-only view of the page the detector runs in.
pub trait PageView: Send + Sync {
    /// Text content of every element with tag `tag`, in document order.
    fn texts(&self, tag: &str) -> Vec<String>;
}

/// Per-platform capability: locate the pass/fail readout and read it.
pub trait ReadoutProbe: Send + Sync {
    fn find_readout(&self) -> Option<String>;
    fn parse_result(&self, text: &str) -> Option<TestTally>;
}

/// Parses the first `passed / total` pair out of `text`.
pub fn parse_tally(text: &str) -> Option<TestTally> {
    let captures = TALLY.captures(text)?;
    let passed = captures.get(1)?.as_str().parse().ok()?;
    let total = captures.get(2)?.as_str().parse().ok()?;
    Some(TestTally { passed, total })
}

/// LeetCode shows a bare `23 / 23` span once the judge finishes.
pub struct LeetCodeReadout {
    page: Arc<dyn PageView>,
}

impl LeetCodeReadout {
    pub fn new(page: Arc<dyn PageView>) -> Self {
        Self { page }
    }
}

impl ReadoutProbe for LeetCodeReadout {
    fn find_readout(&self) -> Option<String> {
        self.page
            .texts("span")
            .into_iter()
            .map(|text| text.trim().to_string())
            .find(|text| SCORE_ONLY.is_match(text))
    }

    fn parse_result(&self, text: &str) -> Option<TestTally> {
        parse_tally(text)
    }
}

/// NeetCode renders `Passed test cases: 23 / 23` in a paragraph.
pub struct NeetCodeReadout {
    page: Arc<dyn PageView>,
}

impl NeetCodeReadout {
    pub fn new(page: Arc<dyn PageView>) -> Self {
        Self { page }
    }
}

impl ReadoutProbe for NeetCodeReadout {
    fn find_readout(&self) -> Option<String> {
        self.page
            .texts("p")
            .into_iter()
            .map(|text| text.trim().to_string())
            .find(|text| text.contains(NEETCODE_LABEL))
    }

    fn parse_result(&self, text: &str) -> Option<TestTally> {
        let (_, counts) = text.split_once(NEETCODE_LABEL)?;
        parse_tally(counts)
    }
}

pub fn probe_for(platform: Platform, page: Arc<dyn PageView>) -> Arc<dyn ReadoutProbe> {
    match platform {
        Platform::LeetCode => Arc::new(LeetCodeReadout::new(page)),
        Platform::NeetCode => Arc::new(NeetCodeReadout::new(page)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StaticPage(HashMap<&'static str, Vec<String>>);

    impl PageView for StaticPage {
        fn texts(&self, tag: &str) -> Vec<String> {
            self.0.get(tag).cloned().unwrap_or_default()
        }
    }

    fn page(tag: &'static str, texts: &[&str]) -> Arc<dyn PageView> {
        Arc::new(StaticPage(HashMap::from([(
            tag,
            texts.iter().map(|text| text.to_string()).collect(),
        )])))
    }

    #[test]
    fn tally_is_found_inside_surrounding_words() {
        assert_eq!(parse_tally("Passed 12/15 cases"), Some(TestTally { passed: 12, total: 15 }));
        assert_eq!(parse_tally("  7 /  7 "), Some(TestTally { passed: 7, total: 7 }));
        assert_eq!(parse_tally("Runtime Error"), None);
        assert_eq!(parse_tally("-- / 23"), None);
    }

    #[test]
    fn leetcode_takes_first_bare_score_span() {
        let probe = LeetCodeReadout::new(page("span", &["Accepted", "Runtime 3 ms", " 58 / 58 ", "1 / 2"]));
        let readout = probe.find_readout().unwrap();
        assert_eq!(readout, "58 / 58");
        assert_eq!(probe.parse_result(&readout), Some(TestTally { passed: 58, total: 58 }));
    }

    #[test]
    fn leetcode_ignores_scores_embedded_in_text() {
        let probe = LeetCodeReadout::new(page("span", &["Beats 3/4 of users"]));
        assert_eq!(probe.find_readout(), None);
    }

    #[test]
    fn neetcode_reads_labelled_paragraph() {
        let probe = NeetCodeReadout::new(page("p", &["Output", "Passed test cases: 21 / 23"]));
        let readout = probe.find_readout().unwrap();
        assert_eq!(probe.parse_result(&readout), Some(TestTally { passed: 21, total: 23 }));
    }

    #[test]
    fn neetcode_label_without_counts_is_ambiguous() {
        let probe = NeetCodeReadout::new(page("p", &["Passed test cases: pending"]));
        let readout = probe.find_readout().unwrap();
        assert_eq!(probe.parse_result(&readout), None);
    }
}
