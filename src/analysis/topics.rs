//! Keyword extraction and keyword-based topic classification.
//!
//! Both work on the source text and are reported next to the analysis
//! results, never inside them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

static RE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
        "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
        "amongst", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
        "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
        "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below",
        "beside", "besides", "between", "beyond", "both", "bottom", "but", "by", "can",
        "cannot", "could", "do", "done", "down", "due", "during", "each", "eg", "either",
        "else", "elsewhere", "enough", "etc", "even", "ever", "every", "everyone",
        "everything", "everywhere", "except", "few", "first", "for", "former", "formerly",
        "from", "further", "get", "give", "go", "had", "has", "have", "he", "hence", "her",
        "here", "hereafter", "hereby", "herein", "hers", "herself", "him", "himself", "his",
        "how", "however", "ie", "if", "in", "indeed", "into", "is", "it", "its", "itself",
        "last", "latter", "least", "less", "made", "many", "may", "me", "meanwhile", "might",
        "more", "moreover", "most", "mostly", "much", "must", "my", "myself", "namely",
        "neither", "never", "nevertheless", "next", "no", "nobody", "none", "nor", "not",
        "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only",
        "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out",
        "over", "own", "per", "perhaps", "please", "put", "rather", "re", "same", "see",
        "seem", "seemed", "seeming", "seems", "several", "she", "should", "since", "so",
        "some", "somehow", "someone", "something", "sometime", "sometimes", "somewhere",
        "still", "such", "than", "that", "the", "their", "them", "themselves", "then",
        "thence", "there", "thereafter", "thereby", "therefore", "therein", "thereupon",
        "these", "they", "this", "those", "though", "through", "throughout", "thru", "thus",
        "to", "together", "too", "toward", "towards", "under", "until", "up", "upon", "us",
        "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
        "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon",
        "wherever", "whether", "which", "while", "who", "whoever", "whole", "whom", "whose",
        "why", "will", "with", "within", "without", "would", "yet", "you", "your", "yours",
        "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

/// The `top_n` most frequent non-stop-word terms of `text`, alphabetically.
///
/// Over a single document every term has the same inverse document
/// frequency, so TF-IDF ranking reduces to term frequency. Ties are broken
/// alphabetically.
pub fn extract_keywords(text: &str, top_n: usize) -> Vec<String> {
    if top_n == 0 {
        return Vec::new();
    }

    let lowered = text.to_lowercase();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for m in RE_TOKEN.find_iter(&lowered) {
        let term = m.as_str();
        if !STOP_WORDS.contains(term) {
            *counts.entry(term).or_default() += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(top_n);

    let mut keywords: Vec<String> = ranked.into_iter().map(|(t, _)| t.to_string()).collect();
    keywords.sort();
    keywords
}

/// Coarse subject area of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "Artificial Intelligence")]
    ArtificialIntelligence,
    Finance,
    #[serde(rename = "Biology/Health")]
    BiologyHealth,
    General,
}

impl Topic {
    pub fn label(&self) -> &'static str {
        match self {
            Topic::ArtificialIntelligence => "Artificial Intelligence",
            Topic::Finance => "Finance",
            Topic::BiologyHealth => "Biology/Health",
            Topic::General => "General",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// First matching substring rule wins; plain substring, so "ai" also
/// matches inside longer words.
pub fn classify_topic(text: &str) -> Topic {
    let text = text.to_lowercase();
    if text.contains("machine learning") || text.contains("ai") {
        Topic::ArtificialIntelligence
    } else if text.contains("finance") || text.contains("economy") {
        Topic::Finance
    } else if text.contains("biology") || text.contains("health") {
        Topic::BiologyHealth
    } else {
        Topic::General
    }
}
