//! Turn a notes directory or a JSON export into [`Document`] values.

use std::path::Path;

use globset::Glob;
use rayon::prelude::*;

use crate::{
    document::{Document, DocumentType, Metadata},
    error::{Error, Result},
    walker::{self, DiscoveredFile},
};

/// Words per minute used for the reading-time estimate.
const WORDS_PER_MINUTE: usize = 200;

/// Load documents from `source`: a directory of notes, or a JSON file
/// holding an array of documents.
pub fn load_source(
    source: &Path,
    include: Option<&str>,
) -> Result<Vec<Document>> {
    if source.is_dir() {
        load_directory(source, include)
    } else if source.is_file() {
        load_json(source)
    } else {
        Err(Error::NotFound {
            kind: "source",
            name: source.display().to_string(),
        })
    }
}

/// Read every note under `root`. Files that cannot be read as UTF-8 are
/// skipped with a warning.
pub fn load_directory(
    root: &Path,
    include: Option<&str>,
) -> Result<Vec<Document>> {
    let matcher = include
        .map(|pattern| {
            Glob::new(pattern)
                .map(|glob| glob.compile_matcher())
                .map_err(|e| {
                    Error::Config(format!("invalid glob pattern: {e}"))
                })
        })
        .transpose()?;

    let files = walker::discover_files(root, matcher.as_ref())?;
    let documents: Vec<Document> = files
        .par_iter()
        .filter_map(|file| {
            match std::fs::read_to_string(&file.absolute_path) {
                Ok(content) => Some(note_document(file, content)),
                Err(e) => {
                    tracing::warn!(
                        path = %file.absolute_path.display(),
                        "skipping unreadable note: {e}"
                    );
                    None
                }
            }
        })
        .collect();

    tracing::debug!(
        root = %root.display(),
        documents = documents.len(),
        "loaded notes directory"
    );
    Ok(documents)
}

/// Parse a JSON array of documents. Missing word counts and reading times
/// are derived from the content.
pub fn load_json(path: &Path) -> Result<Vec<Document>> {
    let raw = std::fs::read_to_string(path)?;
    let mut documents: Vec<Document> = serde_json::from_str(&raw)?;
    for doc in &mut documents {
        if doc.metadata.word_count == 0 {
            doc.metadata.word_count = word_count(&doc.content);
        }
        if doc.metadata.reading_time == 0 {
            doc.metadata.reading_time = reading_time(doc.metadata.word_count);
        }
    }
    Ok(documents)
}

fn note_document(file: &DiscoveredFile, content: String) -> Document {
    let relative = file.relative_path.to_string_lossy().to_string();
    let words = word_count(&content);
    let extension = file.relative_path.extension().and_then(|e| e.to_str());
    let doc_type = match extension {
        Some("md") => DocumentType::Note,
        _ => DocumentType::Document,
    };
    let category = file
        .relative_path
        .parent()
        .and_then(|p| p.components().next())
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .unwrap_or_default();

    Document {
        title: extract_title(&content, &file.relative_path),
        tags: extract_tags(&content),
        doc_type,
        metadata: Metadata {
            created_at: file.created_at,
            modified_at: file.modified_at,
            word_count: words,
            reading_time: reading_time(words),
            category,
            ..Metadata::default()
        },
        content,
        id: relative,
        embedding: None,
    }
}

/// First `# ` heading, else the file stem.
fn extract_title(content: &str, file_path: &Path) -> String {
    content
        .lines()
        .filter_map(|line| line.trim().strip_prefix("# "))
        .map(str::trim)
        .find(|title| !title.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            file_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("untitled")
                .to_string()
        })
}

/// Inline `#tag` markers, lowercased, in first-seen order.
fn extract_tags(content: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for word in content.split_whitespace() {
        let Some(tag) = word.strip_prefix('#') else {
            continue;
        };
        let tag = tag
            .chars()
            .take_while(|c| is_tag_char(*c))
            .collect::<String>()
            .to_lowercase();
        if !tag.is_empty()
            && tag.chars().any(char::is_alphabetic)
            && !tags.contains(&tag)
        {
            tags.push(tag);
        }
    }
    tags
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '/')
}

fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

fn reading_time(words: usize) -> u32 {
    words.div_ceil(WORDS_PER_MINUTE).try_into().unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_title_from_heading() {
        let content = "# My Document\n\nSome body text.";
        assert_eq!(extract_title(content, Path::new("file.md")), "My Document");
    }

    #[test]
    fn extract_title_skips_empty_heading() {
        let content = "# \n\nSome text with no real heading.";
        assert_eq!(extract_title(content, Path::new("notes.md")), "notes");
    }

    #[test]
    fn tags_from_hashtags() {
        let content =
            "# Title\nIdeas for #rust and #Async-IO, see #rust again. #42";
        assert_eq!(extract_tags(content), vec!["rust", "async-io"]);
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time(0), 0);
        assert_eq!(reading_time(1), 1);
        assert_eq!(reading_time(200), 1);
        assert_eq!(reading_time(201), 2);
    }

    #[test]
    fn loads_directory_notes() {
        let tmp = tempfile::tempdir().unwrap();
        let projects = tmp.path().join("projects");
        std::fs::create_dir(&projects).unwrap();
        std::fs::write(
            projects.join("roadmap.md"),
            "# Product Roadmap\n\nShip search in Q3. #planning",
        )
        .unwrap();
        std::fs::write(tmp.path().join("todo.txt"), "buy milk").unwrap();

        let mut docs = load_source(tmp.path(), None).unwrap();
        docs.sort_by(|a, b| a.id.cmp(&b.id));

        assert_eq!(docs.len(), 2);
        let roadmap = &docs[0];
        assert_eq!(roadmap.id, "projects/roadmap.md");
        assert_eq!(roadmap.title, "Product Roadmap");
        assert_eq!(roadmap.doc_type, DocumentType::Note);
        assert_eq!(roadmap.tags, vec!["planning"]);
        assert_eq!(roadmap.metadata.category, "projects");
        assert_eq!(roadmap.metadata.reading_time, 1);

        let todo = &docs[1];
        assert_eq!(todo.title, "todo");
        assert_eq!(todo.doc_type, DocumentType::Document);
        assert_eq!(todo.metadata.word_count, 2);
        assert!(todo.metadata.category.is_empty());
    }

    #[test]
    fn include_pattern_applies() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.md"), "a").unwrap();
        std::fs::write(tmp.path().join("b.txt"), "b").unwrap();

        let docs = load_source(tmp.path(), Some("*.md")).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "a.md");
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_source(tmp.path(), Some("[")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn loads_json_array() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("docs.json");
        std::fs::write(
            &path,
            r#"[{"id": "1", "title": "Intro", "content": "one two three",
                 "type": "page", "metadata": {"priority": "critical"}}]"#,
        )
        .unwrap();

        let docs = load_source(&path, None).unwrap();
        assert_eq!(docs[0].doc_type, DocumentType::Page);
        assert_eq!(docs[0].metadata.word_count, 3);
        assert_eq!(docs[0].metadata.reading_time, 1);
    }

    #[test]
    fn missing_source_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(
            load_source(&missing, None),
            Err(Error::NotFound { kind: "source", .. })
        ));
    }
}
