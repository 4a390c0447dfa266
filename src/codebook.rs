//! Model layer for the category/code tree.
//! Views keep a [CodebookSnapshot] and send mutations through the functions
//! here; every mutation returns a [MutationOutcome] the caller can show to
//! the user instead of panicking or silently doing nothing.

use crate::colors;
use crate::store::CodebookStore;
use crate::types::{current_date_string, Category, Code};

/// Structured result of a codebook mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    /// Another category/code already carries this name.
    DuplicateName,
    /// The referenced row no longer exists.
    Missing,
    /// A category cannot be placed under a code.
    TargetIsCode,
    /// A category cannot be placed under itself.
    IntoItself,
    /// Dropping a code onto another code means merging them; the caller
    /// should confirm and call [merge_codes].
    WouldMerge {
        code_id: i64,
        onto_code_id: i64,
    },
}

/// Where a tree item was dropped during a reparent drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    TopLevel,
    Category(i64),
    Code(i64),
}

/// A view's private copy of the codebook, re-pulled on refresh broadcasts.
#[derive(Debug, Default)]
pub struct CodebookSnapshot {
    pub categories: Vec<Category>,
    pub codes: Vec<Code>,
    /// Counts reloads, for diagnostics.
    pub version: u64,
}

impl CodebookSnapshot {
    pub fn reload(&mut self, store: &dyn CodebookStore) {
        self.categories = store.list_categories();
        self.codes = store.list_codes();
        self.version += 1;
    }

    pub fn code(&self, id: i64) -> Option<&Code> {
        self.codes.iter().find(|c| c.id == id)
    }

    pub fn category(&self, id: i64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }
}

pub fn add_code(store: &mut dyn CodebookStore, name: &str, owner: &str) -> MutationOutcome {
    if store.list_codes().iter().any(|c| c.name == name) {
        return MutationOutcome::DuplicateName;
    }
    let code = Code {
        id: 0,
        name: name.to_string(),
        category_id: None,
        color: colors::random_code_color(),
        owner: owner.to_string(),
        date: current_date_string(),
        memo: String::new(),
    };
    store.insert_code(code);
    println!("Code added: {name}");
    MutationOutcome::Applied
}

pub fn add_category(store: &mut dyn CodebookStore, name: &str, owner: &str) -> MutationOutcome {
    if store.list_categories().iter().any(|c| c.name == name) {
        return MutationOutcome::DuplicateName;
    }
    let category = Category {
        id: 0,
        name: name.to_string(),
        parent_id: None,
        owner: owner.to_string(),
        date: current_date_string(),
        memo: String::new(),
    };
    store.insert_category(category);
    println!("Category added: {name}");
    MutationOutcome::Applied
}

pub fn rename_code(store: &mut dyn CodebookStore, id: i64, new_name: &str) -> MutationOutcome {
    if store.list_codes().iter().any(|c| c.name == new_name) {
        return MutationOutcome::DuplicateName;
    }
    if store.rename_code(id, new_name) {
        println!("Code renamed: {new_name}");
        MutationOutcome::Applied
    } else {
        MutationOutcome::Missing
    }
}

pub fn rename_category(store: &mut dyn CodebookStore, id: i64, new_name: &str) -> MutationOutcome {
    if store.list_categories().iter().any(|c| c.name == new_name) {
        return MutationOutcome::DuplicateName;
    }
    if store.rename_category(id, new_name) {
        println!("Category renamed: {new_name}");
        MutationOutcome::Applied
    } else {
        MutationOutcome::Missing
    }
}

pub fn set_code_color(store: &mut dyn CodebookStore, id: i64, color: &str) -> MutationOutcome {
    if store.set_code_color(id, color) {
        MutationOutcome::Applied
    } else {
        MutationOutcome::Missing
    }
}

pub fn set_code_memo(store: &mut dyn CodebookStore, id: i64, memo: &str) -> MutationOutcome {
    if store.set_code_memo(id, memo) {
        MutationOutcome::Applied
    } else {
        MutationOutcome::Missing
    }
}

pub fn set_category_memo(store: &mut dyn CodebookStore, id: i64, memo: &str) -> MutationOutcome {
    if store.set_category_memo(id, memo) {
        MutationOutcome::Applied
    } else {
        MutationOutcome::Missing
    }
}

/// Move a category under another category or to the top level.
/// A category can never sit under a code or under itself.
pub fn reparent_category(
    store: &mut dyn CodebookStore,
    id: i64,
    target: DropTarget,
) -> MutationOutcome {
    let parent = match target {
        DropTarget::TopLevel => None,
        DropTarget::Code(_) => return MutationOutcome::TargetIsCode,
        DropTarget::Category(target_id) => {
            if target_id == id {
                return MutationOutcome::IntoItself;
            }
            Some(target_id)
        }
    };
    if store.set_category_parent(id, parent) {
        MutationOutcome::Applied
    } else {
        MutationOutcome::Missing
    }
}

/// Move a code under a category or to the top level. Dropping a code onto
/// another code is reported as a merge request, not applied here.
pub fn reparent_code(store: &mut dyn CodebookStore, id: i64, target: DropTarget) -> MutationOutcome {
    let category = match target {
        DropTarget::TopLevel => None,
        DropTarget::Code(onto_code_id) => {
            return MutationOutcome::WouldMerge {
                code_id: id,
                onto_code_id,
            }
        }
        DropTarget::Category(target_id) => Some(target_id),
    };
    if store.set_code_category(id, category) {
        MutationOutcome::Applied
    } else {
        MutationOutcome::Missing
    }
}

/// Merge one code into another: segments and coded text move to the
/// surviving code, then the merged code row is removed.
pub fn merge_codes(
    store: &mut dyn CodebookStore,
    code_id: i64,
    onto_code_id: i64,
) -> MutationOutcome {
    if store.list_codes().iter().all(|c| c.id != onto_code_id) {
        return MutationOutcome::Missing;
    }
    store.retarget_code(code_id, onto_code_id);
    if store.delete_code(code_id) {
        println!("Merged code {code_id} into {onto_code_id}");
        MutationOutcome::Applied
    } else {
        MutationOutcome::Missing
    }
}

/// Delete a code together with its segments and coded text.
pub fn delete_code(store: &mut dyn CodebookStore, id: i64) -> MutationOutcome {
    if !store.delete_code(id) {
        return MutationOutcome::Missing;
    }
    store.delete_segments_for_code(id);
    store.delete_coded_text_for_code(id);
    println!("Code deleted: {id}");
    MutationOutcome::Applied
}

/// Delete a category. Its child categories and codes move to the top level,
/// nothing else is removed.
pub fn delete_category(store: &mut dyn CodebookStore, id: i64) -> MutationOutcome {
    if store.list_categories().iter().all(|c| c.id != id) {
        return MutationOutcome::Missing;
    }
    store.orphan_children_of_category(id);
    store.delete_category(id);
    println!("Category deleted: {id}");
    MutationOutcome::Applied
}

/// One row of the flattened codebook tree shown in the side panel.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub item: TreeItem,
    pub name: String,
    /// Hex color for codes, `None` for categories.
    pub color: Option<String>,
    pub level: u32,
    pub has_memo: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeItem {
    Category(i64),
    Code(i64),
}

// Attaching child categories runs in passes so a malformed parent chain can
// never loop forever.
const MAX_TREE_PASSES: usize = 10;

/// Flatten categories and codes into display order: top level categories
/// first with their subtrees, then uncategorized codes, and codes appended
/// under their categories. Categories whose parent cannot be found are kept
/// at the top level rather than dropped.
pub fn display_tree(categories: &[Category], codes: &[Code]) -> Vec<TreeRow> {
    let mut rows: Vec<TreeRow> = Vec::new();
    let mut placed: Vec<bool> = vec![false; categories.len()];

    for (i, category) in categories.iter().enumerate() {
        if category.parent_id.is_none() {
            rows.push(category_row(category, 0));
            placed[i] = true;
        }
    }

    for _ in 0..MAX_TREE_PASSES {
        let mut changed = false;
        for (i, category) in categories.iter().enumerate() {
            if placed[i] {
                continue;
            }
            let Some(parent_id) = category.parent_id else {
                continue;
            };
            let parent_pos = rows
                .iter()
                .position(|r| r.item == TreeItem::Category(parent_id));
            if let Some(pos) = parent_pos {
                let level = rows[pos].level + 1;
                let insert_at = end_of_subtree(&rows, pos);
                rows.insert(insert_at, category_row(category, level));
                placed[i] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // Orphaned categories (parent missing or cyclic) stay visible at the top.
    for (i, category) in categories.iter().enumerate() {
        if !placed[i] {
            rows.push(category_row(category, 0));
        }
    }

    for code in codes {
        let parent_pos = code.category_id.and_then(|cat_id| {
            rows.iter()
                .position(|r| r.item == TreeItem::Category(cat_id))
        });
        match parent_pos {
            Some(pos) => {
                let level = rows[pos].level + 1;
                let insert_at = end_of_subtree(&rows, pos);
                rows.insert(insert_at, code_row(code, level));
            }
            None => rows.push(code_row(code, 0)),
        }
    }

    rows
}

fn end_of_subtree(rows: &[TreeRow], parent_pos: usize) -> usize {
    let parent_level = rows[parent_pos].level;
    let mut at = parent_pos + 1;
    while at < rows.len() && rows[at].level > parent_level {
        at += 1;
    }
    at
}

fn category_row(category: &Category, level: u32) -> TreeRow {
    TreeRow {
        item: TreeItem::Category(category.id),
        name: category.name.clone(),
        color: None,
        level,
        has_memo: !category.memo.is_empty(),
    }
}

fn code_row(code: &Code, level: u32) -> TreeRow {
    TreeRow {
        item: TreeItem::Code(code.id),
        name: code.name.clone(),
        color: Some(code.color.clone()),
        level,
        has_memo: !code.memo.is_empty(),
    }
}
