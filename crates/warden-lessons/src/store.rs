//! Append-only lessons document under `.orchestration/CLAUDE.md`

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use tracing::warn;
use warden_core::WardenResult;
use warden_trace::{OrchestrationPaths, PathLocks};

/// How many most-recent sections the duplicate check inspects. An older
/// lesson may be re-recorded once it falls out of this window.
const DEDUP_WINDOW: usize = 5;

const LESSONS_HEADER: &str =
    "# Shared Lessons\n\nKnowledge captured by agents working in this workspace. Append-only.\n";

static HEADING_RE: OnceLock<Regex> = OnceLock::new();

fn heading_re() -> &'static Regex {
    HEADING_RE.get_or_init(|| {
        Regex::new(r"^## \[([A-Z_]+)\] (\d{4}-\d{2}-\d{2} \d{2}:\d{2})$")
            .expect("lesson heading pattern is valid")
    })
}

/// Closed set of lesson categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonCategory {
    Architecture,
    Testing,
    Linter,
    Build,
    UserFeedback,
    Style,
    Performance,
    Security,
    General,
}

impl LessonCategory {
    pub const ALL: [LessonCategory; 9] = [
        LessonCategory::Architecture,
        LessonCategory::Testing,
        LessonCategory::Linter,
        LessonCategory::Build,
        LessonCategory::UserFeedback,
        LessonCategory::Style,
        LessonCategory::Performance,
        LessonCategory::Security,
        LessonCategory::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LessonCategory::Architecture => "ARCHITECTURE",
            LessonCategory::Testing => "TESTING",
            LessonCategory::Linter => "LINTER",
            LessonCategory::Build => "BUILD",
            LessonCategory::UserFeedback => "USER_FEEDBACK",
            LessonCategory::Style => "STYLE",
            LessonCategory::Performance => "PERFORMANCE",
            LessonCategory::Security => "SECURITY",
            LessonCategory::General => "GENERAL",
        }
    }
}

impl FromStr for LessonCategory {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let upper = raw.trim().to_uppercase();
        LessonCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == upper)
            .ok_or_else(|| format!("unknown lesson category '{raw}'"))
    }
}

/// One parsed lesson section.
#[derive(Debug, Clone)]
pub struct Lesson {
    pub category: LessonCategory,
    pub recorded_at: DateTime<Utc>,
    pub body: String,
}

/// Append-only store over the shared lessons document.
pub struct LessonStore {
    locks: PathLocks,
    now: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl LessonStore {
    pub fn new() -> Self {
        Self {
            locks: PathLocks::new(),
            now: Arc::new(Utc::now),
        }
    }

    /// Store with an injected clock, for deterministic timestamps in tests.
    pub fn with_now(now: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            locks: PathLocks::new(),
            now: Arc::new(now),
        }
    }

    /// Record a lesson unless its body already appears in the most recent
    /// sections. Returns whether anything was written.
    pub fn record(
        &self,
        workspace_root: &Path,
        category: LessonCategory,
        body: &str,
    ) -> WardenResult<bool> {
        let paths = OrchestrationPaths::new(workspace_root);
        paths.ensure_dir()?;
        let lessons_file = paths.lessons_file();

        let lock = self.locks.lock_for(workspace_root);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let existing = match std::fs::read_to_string(&lessons_file) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err.into()),
        };

        let trimmed_body = body.trim();
        let recent: Vec<&str> = existing
            .split("---")
            .filter(|section| !section.trim().is_empty())
            .collect();
        let window_start = recent.len().saturating_sub(DEDUP_WINDOW);
        if recent[window_start..]
            .iter()
            .any(|section| section.contains(trimmed_body))
        {
            return Ok(false);
        }

        let timestamp = (self.now)().format("%Y-%m-%d %H:%M");
        let mut section = String::new();
        if existing.is_empty() {
            section.push_str(LESSONS_HEADER);
        }
        section.push_str(&format!(
            "\n## [{}] {}\n{}\n---\n",
            category.as_str(),
            timestamp,
            trimmed_body
        ));

        let mut file = OpenOptions::new().create(true).append(true).open(&lessons_file)?;
        file.write_all(section.as_bytes())?;
        Ok(true)
    }

    /// Parse every lesson section in file order, skipping malformed ones.
    pub fn list(&self, workspace_root: &Path) -> WardenResult<Vec<Lesson>> {
        let lessons_file = OrchestrationPaths::new(workspace_root).lessons_file();
        let content = match std::fs::read_to_string(&lessons_file) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut lessons = Vec::new();
        let mut heading: Option<(LessonCategory, DateTime<Utc>)> = None;
        let mut body_lines: Vec<&str> = Vec::new();

        for line in content.lines() {
            if let Some(caps) = heading_re().captures(line.trim_end()) {
                let category = caps[1].parse::<LessonCategory>();
                let recorded_at = NaiveDateTime::parse_from_str(&caps[2], "%Y-%m-%d %H:%M")
                    .map(|naive| naive.and_utc());
                match (category, recorded_at) {
                    (Ok(category), Ok(recorded_at)) => {
                        heading = Some((category, recorded_at));
                        body_lines.clear();
                    }
                    _ => {
                        warn!(line, "skipping lesson with unparsable heading");
                        heading = None;
                    }
                }
            } else if line.trim() == "---" {
                if let Some((category, recorded_at)) = heading.take() {
                    lessons.push(Lesson {
                        category,
                        recorded_at,
                        body: body_lines.join("\n").trim().to_string(),
                    });
                }
                body_lines.clear();
            } else if heading.is_some() {
                body_lines.push(line);
            }
        }

        Ok(lessons)
    }

    pub fn list_by_category(
        &self,
        workspace_root: &Path,
        category: LessonCategory,
    ) -> WardenResult<Vec<Lesson>> {
        Ok(self
            .list(workspace_root)?
            .into_iter()
            .filter(|lesson| lesson.category == category)
            .collect())
    }

    /// Lessons matching at least one keyword, ordered by the count of
    /// distinct keywords matched, descending. Ties keep file order.
    pub fn search(&self, workspace_root: &Path, keywords: &[&str]) -> WardenResult<Vec<Lesson>> {
        let lowered: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let mut scored: Vec<(usize, Lesson)> = self
            .list(workspace_root)?
            .into_iter()
            .filter_map(|lesson| {
                let haystack = lesson.body.to_lowercase();
                let score = lowered.iter().filter(|k| haystack.contains(k.as_str())).count();
                (score > 0).then_some((score, lesson))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().map(|(_, lesson)| lesson).collect())
    }
}

impl Default for LessonStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_store() -> LessonStore {
        LessonStore::with_now(|| Utc.with_ymd_and_hms(2026, 8, 2, 10, 30, 0).unwrap())
    }

    #[test]
    fn test_record_then_duplicate_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = fixed_store();

        assert!(store
            .record(dir.path(), LessonCategory::Testing, "auth requires mock JWT")
            .unwrap());
        assert!(!store
            .record(dir.path(), LessonCategory::Testing, "auth requires mock JWT")
            .unwrap());

        let lessons = store.list(dir.path()).unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].body, "auth requires mock JWT");
        assert_eq!(lessons[0].category, LessonCategory::Testing);
    }

    #[test]
    fn test_section_format() {
        let dir = tempfile::tempdir().unwrap();
        let store = fixed_store();
        store
            .record(dir.path(), LessonCategory::Build, "cargo features gate the fuzzer")
            .unwrap();

        let content =
            std::fs::read_to_string(OrchestrationPaths::new(dir.path()).lessons_file()).unwrap();
        assert!(content.starts_with("# Shared Lessons\n"));
        assert!(content.contains("## [BUILD] 2026-08-02 10:30\ncargo features gate the fuzzer\n---\n"));
    }

    #[test]
    fn test_duplicate_outside_window_is_rerecorded() {
        let dir = tempfile::tempdir().unwrap();
        let store = fixed_store();

        store.record(dir.path(), LessonCategory::General, "remember the flag").unwrap();
        for i in 0..5 {
            store
                .record(dir.path(), LessonCategory::General, &format!("filler lesson {i}"))
                .unwrap();
        }

        // The original has fallen out of the five-section window.
        assert!(store
            .record(dir.path(), LessonCategory::General, "remember the flag")
            .unwrap());
        assert_eq!(store.list(dir.path()).unwrap().len(), 7);
    }

    #[test]
    fn test_list_by_category() {
        let dir = tempfile::tempdir().unwrap();
        let store = fixed_store();
        store.record(dir.path(), LessonCategory::Style, "prefer early returns").unwrap();
        store.record(dir.path(), LessonCategory::Security, "never log tokens").unwrap();

        let security = store.list_by_category(dir.path(), LessonCategory::Security).unwrap();
        assert_eq!(security.len(), 1);
        assert_eq!(security[0].body, "never log tokens");
    }

    #[test]
    fn test_search_scores_distinct_keywords() {
        let dir = tempfile::tempdir().unwrap();
        let store = fixed_store();
        store
            .record(dir.path(), LessonCategory::Testing, "mock the JWT signer in auth tests")
            .unwrap();
        store
            .record(dir.path(), LessonCategory::Testing, "auth middleware needs a mock clock and mock JWT")
            .unwrap();
        store
            .record(dir.path(), LessonCategory::Build, "unrelated build note")
            .unwrap();

        let results = store.search(dir.path(), &["mock", "jwt", "clock"]).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].body.contains("mock clock"));
        assert!(results[1].body.contains("signer"));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let store = fixed_store();
        store.record(dir.path(), LessonCategory::Linter, "Clippy wants iterators").unwrap();

        assert_eq!(store.search(dir.path(), &["CLIPPY"]).unwrap().len(), 1);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("testing".parse::<LessonCategory>().unwrap(), LessonCategory::Testing);
        assert_eq!(
            "USER_FEEDBACK".parse::<LessonCategory>().unwrap(),
            LessonCategory::UserFeedback
        );
        assert!("NONSENSE".parse::<LessonCategory>().is_err());
    }

    #[test]
    fn test_missing_document_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(fixed_store().list(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_timestamps_monotone_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let minute = Arc::new(std::sync::Mutex::new(0u32));
        let handle = Arc::clone(&minute);
        let store = LessonStore::with_now(move || {
            Utc.with_ymd_and_hms(2026, 8, 2, 10, *handle.lock().unwrap(), 0).unwrap()
        });

        for i in 0..4 {
            *minute.lock().unwrap() = i * 10;
            store
                .record(dir.path(), LessonCategory::General, &format!("note {i}"))
                .unwrap();
        }

        let lessons = store.list(dir.path()).unwrap();
        assert_eq!(lessons.len(), 4);
        for pair in lessons.windows(2) {
            assert!(pair[0].recorded_at <= pair[1].recorded_at);
        }
    }
}
