use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matching::lexical::token_set;

/// Reference vocabulary of technical skills detected in resumes.
pub const DEFAULT_SKILLS: &[&str] = &[
    "python",
    "java",
    "c++",
    "flask",
    "django",
    "react",
    "angular",
    "node",
    "sql",
    "html",
    "css",
    "javascript",
    "git",
    "github",
    "docker",
    "kubernetes",
    "aws",
    "azure",
];

/// How a vocabulary entry must appear in the resume to count as present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillMatchMode {
    /// Plain substring containment. Permits hits like `java` inside `javascript`.
    #[default]
    Substring,
    /// The skill must not be flanked by letters or digits.
    WordBoundary,
}

impl FromStr for SkillMatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(Self::Substring),
            "word" | "word_boundary" => Ok(Self::WordBoundary),
            other => Err(format!(
                "unknown skill match mode '{other}' (expected 'substring' or 'word')"
            )),
        }
    }
}

#[derive(Debug, Clone)]
struct SkillPattern {
    /// Lower-cased lookup key.
    key: String,
    /// Title-cased form reported to callers.
    display: String,
    boundary: Option<Regex>,
}

/// Fixed, read-only skill vocabulary shared by every batch.
#[derive(Debug, Clone)]
pub struct SkillVocabulary {
    patterns: Vec<SkillPattern>,
    mode: SkillMatchMode,
}

impl SkillVocabulary {
    pub fn new<I, S>(skills: I, mode: SkillMatchMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns: Vec<SkillPattern> = Vec::new();
        for skill in skills {
            let key = skill.as_ref().trim().to_lowercase();
            if key.is_empty() || patterns.iter().any(|p| p.key == key) {
                continue;
            }
            let boundary = match mode {
                SkillMatchMode::Substring => None,
                SkillMatchMode::WordBoundary => Regex::new(&format!(
                    r"(?:^|[^\p{{L}}\p{{N}}]){}(?:$|[^\p{{L}}\p{{N}}])",
                    regex::escape(&key)
                ))
                .ok(),
            };
            patterns.push(SkillPattern {
                display: title_case(&key),
                key,
                boundary,
            });
        }
        Self { patterns, mode }
    }

    pub fn with_mode(mode: SkillMatchMode) -> Self {
        Self::new(DEFAULT_SKILLS.iter().copied(), mode)
    }

    pub fn mode(&self) -> SkillMatchMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Title-cased vocabulary entries found in `text`, in vocabulary order.
    pub fn extract_skills(&self, text: &str) -> Vec<String> {
        let text_lower = text.to_lowercase();
        self.patterns
            .iter()
            .filter(|p| match &p.boundary {
                Some(re) => re.is_match(&text_lower),
                None => text_lower.contains(&p.key),
            })
            .map(|p| p.display.clone())
            .collect()
    }
}

impl Default for SkillVocabulary {
    fn default() -> Self {
        Self::with_mode(SkillMatchMode::default())
    }
}

/// Skills whose lower-cased form is one of the job description's whitespace tokens.
pub fn matched_skills(skills: &[String], job_text: &str) -> Vec<String> {
    let job_words = token_set(job_text);
    skills
        .iter()
        .filter(|s| job_words.contains(&s.to_lowercase()))
        .cloned()
        .collect()
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest
/// (`c++` → `C++`, `github` → `Github`, `node.js` → `Node.Js`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
