use std::path::Path;

use warden_lessons::{Lesson, LessonCategory, LessonStore};

pub fn run(
    workspace_root: &Path,
    category: Option<&str>,
    search: Option<&str>,
) -> anyhow::Result<()> {
    let store = LessonStore::new();

    let lessons: Vec<Lesson> = match (category, search) {
        (_, Some(query)) => {
            let keywords: Vec<&str> = query.split_whitespace().collect();
            store.search(workspace_root, &keywords)?
        }
        (Some(raw), None) => {
            let category: LessonCategory = raw.parse().map_err(anyhow::Error::msg)?;
            store.list_by_category(workspace_root, category)?
        }
        (None, None) => store.list(workspace_root)?,
    };

    if lessons.is_empty() {
        println!("No lessons recorded.");
        return Ok(());
    }

    for lesson in &lessons {
        println!(
            "[{}] {}\n{}\n",
            lesson.category.as_str(),
            lesson.recorded_at.format("%Y-%m-%d %H:%M"),
            lesson.body
        );
    }
    println!("{} lesson(s)", lessons.len());
    Ok(())
}
