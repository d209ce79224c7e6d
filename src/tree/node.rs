//! Site tree node types
//!
//! The tree serializes as a nested key-value structure whose only top-level
//! key is `"top"`. Children are kept in `BTreeMap`s so that serializing the
//! same tree always yields the same bytes.

use crate::crawler::PageRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the root container in the serialized tree
pub const ROOT_KEY: &str = "top";

/// Child nodes of a container, keyed by path segment
pub type Children = BTreeMap<String, SiteTreeNode>;

/// Metadata of a crawled page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub url: String,
    pub title: String,
    pub thumbnail_ref: String,
}

impl From<&PageRecord> for PageEntry {
    fn from(record: &PageRecord) -> Self {
        Self {
            url: record.url.clone(),
            title: record.title.clone(),
            thumbnail_ref: record.thumbnail_ref.clone(),
        }
    }
}

/// The root container of a site tree
///
/// The root is never a path segment of its own. The page whose path is empty
/// (the site's home page) is stored in `page` instead of replacing the
/// container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRoot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageEntry>,

    #[serde(default)]
    pub children: Children,
}

/// A node below the root
///
/// `Leaf` nodes are crawled pages. `Interior` nodes are synthetic containers
/// for a path segment that had no page of its own when it was first needed.
/// Both can hold children: a page at `/en` keeps `/en/about` below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SiteTreeNode {
    Leaf {
        url: String,
        title: String,
        thumbnail_ref: String,
        /// Number of segments below the root
        level: i32,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        children: Children,
    },
    Interior {
        /// The path segment itself
        title: String,
        /// Segments from the root through this one, joined with `/`
        url: String,
        /// Depth of the page that caused this container to be created, minus one
        level: i32,
        #[serde(default)]
        children: Children,
    },
}

impl SiteTreeNode {
    /// Creates a leaf for a crawled page
    pub fn leaf(record: &PageRecord, level: i32) -> Self {
        Self::Leaf {
            url: record.url.clone(),
            title: record.title.clone(),
            thumbnail_ref: record.thumbnail_ref.clone(),
            level,
            children: Children::new(),
        }
    }

    /// Creates a synthetic container for a path segment
    pub fn interior(segment: &str, url: String, level: i32) -> Self {
        Self::Interior {
            title: segment.to_string(),
            url,
            level,
            children: Children::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Leaf { title, .. } | Self::Interior { title, .. } => title,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Leaf { url, .. } | Self::Interior { url, .. } => url,
        }
    }

    pub fn level(&self) -> i32 {
        match self {
            Self::Leaf { level, .. } | Self::Interior { level, .. } => *level,
        }
    }

    pub fn children(&self) -> &Children {
        match self {
            Self::Leaf { children, .. } | Self::Interior { children, .. } => children,
        }
    }

    pub fn children_mut(&mut self) -> &mut Children {
        match self {
            Self::Leaf { children, .. } | Self::Interior { children, .. } => children,
        }
    }

    fn first_thumbnail_ref(&self) -> Option<&str> {
        if let Self::Leaf { thumbnail_ref, .. } = self {
            if !thumbnail_ref.is_empty() {
                return Some(thumbnail_ref);
            }
        }
        self.children()
            .values()
            .find_map(SiteTreeNode::first_thumbnail_ref)
    }

    fn count_pages(&self) -> usize {
        let own = usize::from(self.is_leaf());
        own + self
            .children()
            .values()
            .map(SiteTreeNode::count_pages)
            .sum::<usize>()
    }
}

/// A hierarchical site map rebuilt from crawled page records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteTree {
    #[serde(rename = "top")]
    pub top: SiteRoot,
}

impl SiteTree {
    /// Looks up a node by its path segments below the root
    pub fn get(&self, segments: &[&str]) -> Option<&SiteTreeNode> {
        let (first, rest) = segments.split_first()?;
        let mut node = self.top.children.get(*first)?;
        for segment in rest {
            node = node.children().get(*segment)?;
        }
        Some(node)
    }

    /// Returns the first non-empty thumbnail reference, depth first
    ///
    /// The home page is checked first, then children in key order.
    pub fn first_thumbnail_ref(&self) -> Option<&str> {
        if let Some(page) = &self.top.page {
            if !page.thumbnail_ref.is_empty() {
                return Some(&page.thumbnail_ref);
            }
        }
        self.top
            .children
            .values()
            .find_map(SiteTreeNode::first_thumbnail_ref)
    }

    /// Number of crawled pages in the tree
    pub fn page_count(&self) -> usize {
        usize::from(self.top.page.is_some())
            + self
                .top
                .children
                .values()
                .map(SiteTreeNode::count_pages)
                .sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.top.page.is_none() && self.top.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, title: &str, thumb: &str) -> PageRecord {
        PageRecord::new(url, title, thumb)
    }

    #[test]
    fn test_empty_tree_serializes_with_single_root_key() {
        let tree = SiteTree::default();
        let value = serde_json::to_value(&tree).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert!(object.contains_key(ROOT_KEY));
    }

    #[test]
    fn test_leaf_serialization_shape() {
        let leaf = SiteTreeNode::leaf(&record("https://ex.com/a", "A", "snap/a.html"), 1);
        let value = serde_json::to_value(&leaf).unwrap();
        assert_eq!(value["kind"], "leaf");
        assert_eq!(value["url"], "https://ex.com/a");
        assert_eq!(value["thumbnail_ref"], "snap/a.html");
        assert_eq!(value["level"], 1);
        assert!(value.get("children").is_none());
    }

    #[test]
    fn test_interior_serialization_shape() {
        let node = SiteTreeNode::interior("docs", "top/docs".to_string(), 0);
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["kind"], "interior");
        assert_eq!(value["title"], "docs");
        assert_eq!(value["url"], "top/docs");
        assert!(value["children"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_tree_deserializes_back() {
        let mut tree = SiteTree::default();
        let mut docs = SiteTreeNode::interior("docs", "top/docs".to_string(), 0);
        docs.children_mut().insert(
            "intro".to_string(),
            SiteTreeNode::leaf(&record("https://ex.com/docs/intro", "Intro", "i.html"), 2),
        );
        tree.top.children.insert("docs".to_string(), docs);

        let json = serde_json::to_string(&tree).unwrap();
        let parsed: SiteTree = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn test_first_thumbnail_prefers_home_page() {
        let mut tree = SiteTree::default();
        tree.top.page = Some(PageEntry::from(&record("https://ex.com/", "Home", "top.html")));
        tree.top.children.insert(
            "a".to_string(),
            SiteTreeNode::leaf(&record("https://ex.com/a", "A", "a.html"), 1),
        );
        assert_eq!(tree.first_thumbnail_ref(), Some("top.html"));
    }

    #[test]
    fn test_first_thumbnail_descends_into_interiors() {
        let mut tree = SiteTree::default();
        let mut docs = SiteTreeNode::interior("docs", "top/docs".to_string(), 0);
        docs.children_mut().insert(
            "intro".to_string(),
            SiteTreeNode::leaf(&record("https://ex.com/docs/intro", "Intro", "intro.html"), 2),
        );
        tree.top.children.insert("docs".to_string(), docs);
        assert_eq!(tree.first_thumbnail_ref(), Some("intro.html"));
        assert_eq!(SiteTree::default().first_thumbnail_ref(), None);
    }

    #[test]
    fn test_page_count_skips_interiors() {
        let mut tree = SiteTree::default();
        let mut docs = SiteTreeNode::interior("docs", "top/docs".to_string(), 0);
        docs.children_mut().insert(
            "intro".to_string(),
            SiteTreeNode::leaf(&record("https://ex.com/docs/intro", "Intro", ""), 2),
        );
        tree.top.children.insert("docs".to_string(), docs);
        tree.top.page = Some(PageEntry::from(&record("https://ex.com/", "Home", "")));
        assert_eq!(tree.page_count(), 2);
        assert!(tree.get(&["docs", "intro"]).unwrap().is_leaf());
        assert!(tree.get(&["missing"]).is_none());
    }
}
