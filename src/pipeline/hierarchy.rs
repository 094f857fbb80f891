//! Category forest: validation and tree building.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::Category;

/// What validation had to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyReport {
    /// Nodes detached from their parent to break a cycle
    pub cycles_broken: Vec<String>,
    /// Nodes whose parent does not exist
    pub orphans_promoted: Vec<String>,
}

impl HierarchyReport {
    pub fn is_clean(&self) -> bool {
        self.cycles_broken.is_empty() && self.orphans_promoted.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Make the parent links a forest. Unresolvable parents are dropped; every
/// cycle is broken at the node whose parent link closes it. Afterwards
/// `is_top_level` holds exactly for parentless nodes.
pub fn validate(categories: &mut BTreeMap<String, Category>) -> HierarchyReport {
    let mut report = HierarchyReport::default();

    let ids: Vec<String> = categories.keys().cloned().collect();
    for id in &ids {
        let orphaned = categories[id]
            .parent
            .as_ref()
            .is_some_and(|p| !categories.contains_key(p));
        if orphaned {
            log::warn!("Category {} has an unknown parent, promoting to top level", id);
            if let Some(category) = categories.get_mut(id) {
                category.parent = None;
            }
            report.orphans_promoted.push(id.clone());
        }
    }

    let mut state: HashMap<String, Visit> = HashMap::new();
    for start in &ids {
        let mut path: Vec<String> = Vec::new();
        let mut current = Some(start.clone());

        while let Some(id) = current {
            match state.get(&id) {
                Some(Visit::Done) => break,
                Some(Visit::InProgress) => {
                    // The last node walked points back into the path.
                    if let Some(closing) = path.last() {
                        log::warn!("Category cycle through {}, detaching {}", id, closing);
                        if let Some(category) = categories.get_mut(closing) {
                            category.parent = None;
                        }
                        report.cycles_broken.push(closing.clone());
                    }
                    break;
                }
                None => {
                    state.insert(id.clone(), Visit::InProgress);
                    current = categories.get(&id).and_then(|c| c.parent.clone());
                    path.push(id);
                }
            }
        }

        for id in path {
            state.insert(id, Visit::Done);
        }
    }

    for category in categories.values_mut() {
        category.is_top_level = category.parent.is_none();
    }
    report
}

/// One node of the rendered hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryNode {
    pub id: String,
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

fn sort_key(category: &Category) -> (i64, &str) {
    (category.display_order, category.name.as_str())
}

/// Build the forest from validated categories. Roots and siblings are
/// ordered by display order, then name.
pub fn build_tree(categories: &BTreeMap<String, Category>) -> Vec<CategoryNode> {
    let mut children: HashMap<Option<&str>, Vec<&String>> = HashMap::new();
    for (id, category) in categories {
        let parent = category
            .parent
            .as_deref()
            .filter(|p| categories.contains_key(*p));
        children.entry(parent).or_default().push(id);
    }
    for ids in children.values_mut() {
        ids.sort_by(|a, b| sort_key(&categories[*a]).cmp(&sort_key(&categories[*b])).then(a.cmp(b)));
    }

    fn build(
        id: &str,
        categories: &BTreeMap<String, Category>,
        children: &HashMap<Option<&str>, Vec<&String>>,
    ) -> Option<CategoryNode> {
        let category = categories.get(id)?.clone();
        let kids = children
            .get(&Some(id))
            .map(|ids| {
                ids.iter()
                    .filter_map(|c| build(c, categories, children))
                    .collect()
            })
            .unwrap_or_default();
        Some(CategoryNode {
            id: id.to_string(),
            category,
            children: kids,
        })
    }

    children
        .get(&None)
        .map(|roots| {
            roots
                .iter()
                .filter_map(|id| build(id, categories, &children))
                .collect()
        })
        .unwrap_or_default()
}
