use std::path::Path;

use warden_lessons::{LessonCategory, LessonStore};

pub fn run(workspace_root: &Path, category: &str, lesson: &str) -> anyhow::Result<()> {
    let category: LessonCategory = category.parse().map_err(anyhow::Error::msg)?;

    if lesson.trim().is_empty() {
        anyhow::bail!("lesson body must not be empty");
    }

    let recorded = LessonStore::new().record(workspace_root, category, lesson)?;
    if recorded {
        println!("Lesson recorded in CLAUDE.md under [{}]", category.as_str());
    } else {
        println!("Lesson skipped (duplicate detected)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), "TESTING", "auth requires mock JWT").unwrap();
        // Second call succeeds but reports the duplicate path; the document
        // keeps a single section either way.
        run(dir.path(), "testing", "auth requires mock JWT").unwrap();

        let lessons = LessonStore::new().list(dir.path()).unwrap();
        assert_eq!(lessons.len(), 1);
    }

    #[test]
    fn test_unknown_category_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), "NONSENSE", "body").is_err());
    }

    #[test]
    fn test_empty_lesson_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), "GENERAL", "   ").is_err());
    }
}
