//! Heuristic classification of a pre/post content pair

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Size-delta ratio above which an edit counts as intent evolution.
/// Contract value, not tunable.
const SIZE_DELTA_THRESHOLD: f64 = 0.20;

static BUG_FIX_RES: OnceLock<Vec<Regex>> = OnceLock::new();
static BLOCK_COMMENT_RE: OnceLock<Regex> = OnceLock::new();

/// Category of a recorded mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationClass {
    AstRefactor,
    IntentEvolution,
    BugFix,
    Documentation,
}

impl MutationClass {
    /// Wire name as written to the ledger.
    pub fn as_str(self) -> &'static str {
        match self {
            MutationClass::AstRefactor => "AST_REFACTOR",
            MutationClass::IntentEvolution => "INTENT_EVOLUTION",
            MutationClass::BugFix => "BUG_FIX",
            MutationClass::Documentation => "DOCUMENTATION",
        }
    }

    /// Parse a wire name; unknown names yield `None`.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "AST_REFACTOR" => Some(MutationClass::AstRefactor),
            "INTENT_EVOLUTION" => Some(MutationClass::IntentEvolution),
            "BUG_FIX" => Some(MutationClass::BugFix),
            "DOCUMENTATION" => Some(MutationClass::Documentation),
            _ => None,
        }
    }
}

/// Classify the change from `old` to `new`.
///
/// Rules apply in a frozen order: identical content and comment-only edits
/// are documentation, bug-phrase matches in the line diff are bug fixes,
/// a size delta above 20% is intent evolution, anything else a refactor.
pub fn classify(old: &str, new: &str) -> MutationClass {
    if old == new {
        return MutationClass::Documentation;
    }

    if strip_comments(old) == strip_comments(new) {
        return MutationClass::Documentation;
    }

    let diff = line_diff(old, new);
    let bug_res = BUG_FIX_RES.get_or_init(|| {
        [
            r"(?i)fix(e[ds])?|bug|issue|repair|patch",
            r"(?i)undefined|null|error|exception|crash",
            r"(?i)should|expected|actual|assert",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("bug-fix pattern is valid"))
        .collect()
    });
    if bug_res.iter().any(|re| re.is_match(&diff)) {
        return MutationClass::BugFix;
    }

    let delta = (new.len() as f64 - old.len() as f64).abs() / (old.len().max(1) as f64);
    if delta > SIZE_DELTA_THRESHOLD {
        return MutationClass::IntentEvolution;
    }

    MutationClass::AstRefactor
}

/// Resolve the class to record: a valid explicit wire name wins, then the
/// heuristic over the previous content, then the first-write default.
pub fn resolve(explicit: Option<&str>, old: Option<&str>, new: &str) -> MutationClass {
    if let Some(class) = explicit.and_then(MutationClass::from_wire) {
        return class;
    }
    match old {
        Some(old) => classify(old, new),
        None => MutationClass::AstRefactor,
    }
}

/// Strip line comments, block comments and doc-block asterisk prefixes,
/// then collapse to the remaining non-empty trimmed lines.
fn strip_comments(content: &str) -> String {
    let block_re = BLOCK_COMMENT_RE
        .get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment pattern is valid"));
    let without_blocks = block_re.replace_all(content, "");

    without_blocks
        .lines()
        .map(|line| {
            let mut line = line.trim();
            line = line.strip_prefix('*').map(str::trim).unwrap_or(line);
            let code = line
                .split_once("//")
                .map(|(code, _)| code)
                .unwrap_or(line);
            code.split_once('#').map(|(code, _)| code).unwrap_or(code).trim()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the `+added\n-removed` text the bug-fix patterns run against.
/// Added and removed are multiset line differences, order ignored.
fn line_diff(old: &str, new: &str) -> String {
    let old_counts = line_counts(old);
    let new_counts = line_counts(new);

    let added: Vec<&str> = new
        .lines()
        .filter(|line| new_counts[*line] > old_counts.get(*line).copied().unwrap_or(0))
        .collect();
    let removed: Vec<&str> = old
        .lines()
        .filter(|line| old_counts[*line] > new_counts.get(*line).copied().unwrap_or(0))
        .collect();

    format!("+{}\n-{}", added.join("\n"), removed.join("\n"))
}

fn line_counts(content: &str) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for line in content.lines() {
        *counts.entry(line).or_insert(0) += 1;
    }
    counts
}
