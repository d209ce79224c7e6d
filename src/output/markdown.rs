//! Markdown report generation
//!
//! Renders a finished task as a short summary followed by an indented
//! outline of its site tree.

use crate::orchestrator::CrawlTask;
use crate::output::OutputResult;
use crate::tree::{SiteTree, SiteTreeNode};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report of a task to `output_path`
///
/// # Arguments
///
/// * `task` - The task to report on
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_task_report(task: &CrawlTask, output_path: &Path) -> OutputResult<()> {
    let markdown = format_task_report(task);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a task as markdown
///
/// # Arguments
///
/// * `task` - The task to report on
///
/// # Returns
///
/// A formatted markdown string
pub fn format_task_report(task: &CrawlTask) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Site Atlas: {}\n\n", task.target_url));

    md.push_str("## Task Information\n\n");
    md.push_str(&format!("- **Task ID**: {}\n", task.id));
    md.push_str(&format!("- **Owner**: {}\n", task.owner));
    md.push_str(&format!("- **Status**: {}\n", task.status));
    md.push_str(&format!("- **Attempts**: {}\n", task.attempts));
    md.push_str(&format!("- **Created**: {}\n", task.created_at.to_rfc3339()));
    md.push_str(&format!("- **Updated**: {}\n", task.updated_at.to_rfc3339()));
    if let Some(error) = &task.error {
        md.push_str(&format!("- **Error**: {}\n", error));
    }
    md.push('\n');

    if let Some(tree) = &task.result {
        md.push_str("## Site Tree\n\n");
        md.push_str(&format!("- **Pages**: {}\n\n", tree.page_count()));
        md.push_str(&format_outline(tree));
    }

    md
}

fn format_outline(tree: &SiteTree) -> String {
    let mut md = String::new();

    match &tree.top.page {
        Some(page) => md.push_str(&format!(
            "- [{}]({})\n",
            display_title(&page.title, "top"),
            page.url
        )),
        None => md.push_str("- top\n"),
    }

    for (segment, node) in &tree.top.children {
        push_node(&mut md, segment, node, 1);
    }

    md
}

fn push_node(md: &mut String, segment: &str, node: &SiteTreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        SiteTreeNode::Leaf { url, title, .. } => {
            md.push_str(&format!("{}- [{}]({})\n", indent, display_title(title, segment), url));
        }
        SiteTreeNode::Interior { .. } => {
            md.push_str(&format!("{}- {}/\n", indent, segment));
        }
    }

    for (child_segment, child) in node.children() {
        push_node(md, child_segment, child, depth + 1);
    }
}

fn display_title<'a>(title: &'a str, fallback: &'a str) -> &'a str {
    if title.trim().is_empty() {
        fallback
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::PageRecord;
    use crate::tree::build_site_tree;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_task() -> CrawlTask {
        let now = Utc::now();
        let mut task = CrawlTask::new(
            "task-1".to_string(),
            "user-1".to_string(),
            "https://ex.com/".to_string(),
            now,
        );
        task.start_attempt(now);
        let tree = build_site_tree(
            "https://ex.com/",
            &[
                PageRecord::new("https://ex.com/", "Home", "top.html"),
                PageRecord::new("https://ex.com/en", "English", "en.html"),
                PageRecord::new("https://ex.com/en/about", "", "en-about.html"),
                PageRecord::new("https://ex.com/docs/intro", "Intro", "docs-intro.html"),
            ],
        );
        task.complete(tree, now);
        task
    }

    #[test]
    fn test_report_header() {
        let markdown = format_task_report(&create_test_task());

        assert!(markdown.contains("# Site Atlas: https://ex.com/"));
        assert!(markdown.contains("- **Task ID**: task-1"));
        assert!(markdown.contains("- **Status**: completed"));
        assert!(markdown.contains("- **Attempts**: 1"));
        assert!(markdown.contains("- **Pages**: 4"));
        assert!(!markdown.contains("**Error**"));
    }

    #[test]
    fn test_outline_nesting() {
        let markdown = format_task_report(&create_test_task());

        let expected = "- [Home](https://ex.com/)\n\
                        \x20 - docs/\n\
                        \x20   - [Intro](https://ex.com/docs/intro)\n\
                        \x20 - [English](https://ex.com/en)\n\
                        \x20   - [about](https://ex.com/en/about)\n";
        assert!(markdown.ends_with(expected), "got:\n{}", markdown);
    }

    #[test]
    fn test_failed_task_has_error_and_no_outline() {
        let now = Utc::now();
        let mut task = CrawlTask::new(
            "task-2".to_string(),
            "user-1".to_string(),
            "https://ex.com/".to_string(),
            now,
        );
        task.start_attempt(now);
        task.fail("Navigation to https://ex.com/ failed: HTTP 500", now);

        let markdown = format_task_report(&task);
        assert!(markdown.contains("- **Status**: error"));
        assert!(markdown.contains("- **Error**: Navigation to https://ex.com/ failed: HTTP 500"));
        assert!(!markdown.contains("## Site Tree"));
    }

    #[test]
    fn test_write_task_report() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.md");

        write_task_report(&create_test_task(), &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# Site Atlas"));
    }
}
