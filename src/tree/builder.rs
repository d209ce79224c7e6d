use super::node::{PageEntry, SiteTree, SiteTreeNode};
use super::path::{canonical_path, path_parts, url_segment_count};
use crate::crawler::PageRecord;
use std::collections::HashSet;

/// Rebuilds a hierarchical site tree from flat page records
///
/// # Arguments
///
/// * `base_url` - Prefix stripped from every record URL before splitting
/// * `records` - Crawled pages in any order, possibly with duplicate URLs
///
/// # Returns
///
/// A tree whose only top-level key is `"top"`. The function is pure: the same
/// records always produce the same tree, and shallower pages are always placed
/// before deeper ones regardless of input order.
///
/// # Algorithm
///
/// 1. Keep the first record for each URL
/// 2. Stable sort by URL length, then stable sort by `/`-delimited piece count
///    so the second key dominates
/// 3. Split each URL into path segments anchored at the root
/// 4. Walk the segments from the root, creating a leaf for the final segment
///    and an interior container for any missing intermediate one. Existing
///    nodes are never replaced.
pub fn build_site_tree(base_url: &str, records: &[PageRecord]) -> SiteTree {
    let mut seen = HashSet::new();
    let mut ordered: Vec<&PageRecord> = records
        .iter()
        .filter(|record| seen.insert(record.url.as_str()))
        .collect();

    ordered.sort_by_key(|record| record.url.len());
    ordered.sort_by_key(|record| url_segment_count(&record.url));

    let mut tree = SiteTree::default();
    for record in ordered {
        let path = canonical_path(path_parts(base_url, &record.url));
        insert_record(&mut tree, &path, record);
    }

    tracing::debug!(
        "Built site tree for {} from {} records ({} pages)",
        base_url,
        records.len(),
        tree.page_count()
    );

    tree
}

fn insert_record(tree: &mut SiteTree, path: &[String], record: &PageRecord) {
    if path.len() == 1 {
        if tree.top.page.is_none() {
            tree.top.page = Some(PageEntry::from(record));
        }
        return;
    }

    let depth = path.len() as i32;
    let last = path.len() - 1;
    let mut children = &mut tree.top.children;

    for (index, segment) in path.iter().enumerate().skip(1) {
        let node = children.entry(segment.clone()).or_insert_with(|| {
            if index == last {
                SiteTreeNode::leaf(record, depth - 1)
            } else {
                SiteTreeNode::interior(segment, path[..=index].join("/"), depth - 2)
            }
        });
        children = node.children_mut();
    }
}
