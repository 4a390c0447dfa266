//! Persistence seam for the codebook and coded data.
//! [CodebookStore] mirrors the statements the views issue against the project
//! database; [MemoryStore] is the in-process implementation the app and tests
//! run on. Rows come back in insertion order, which keeps derived things like
//! segment lanes stable between reloads.

use crate::types::{Annotation, Category, Code, CodedText, Msecs, Segment};

/// Result of inserting a row that carries a uniqueness rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Added(i64),
    /// Same code, file, span and owner already present. Surfaced to the user
    /// as "already coded", never silently inserted twice.
    AlreadyExists,
}

pub trait CodebookStore {
    fn list_categories(&self) -> Vec<Category>;
    fn list_codes(&self) -> Vec<Code>;
    fn list_segments(&self, file_id: i64, owner: &str) -> Vec<Segment>;
    fn list_coded_text(&self, file_id: i64, owner: &str) -> Vec<CodedText>;
    fn list_annotations(&self, file_id: i64, owner: &str) -> Vec<Annotation>;

    /// Insert with `id` ignored; the store assigns the row id and returns it.
    fn insert_category(&mut self, category: Category) -> i64;
    fn insert_code(&mut self, code: Code) -> i64;
    fn insert_segment(&mut self, segment: Segment) -> i64;
    fn insert_annotation(&mut self, annotation: Annotation) -> i64;
    /// Duplicate check on (code, file, start, end, owner).
    fn insert_coded_text(&mut self, coded: CodedText) -> InsertOutcome;

    fn rename_category(&mut self, id: i64, name: &str) -> bool;
    fn rename_code(&mut self, id: i64, name: &str) -> bool;
    fn set_category_memo(&mut self, id: i64, memo: &str) -> bool;
    fn set_code_memo(&mut self, id: i64, memo: &str) -> bool;
    fn set_code_color(&mut self, id: i64, color: &str) -> bool;
    fn set_category_parent(&mut self, id: i64, parent: Option<i64>) -> bool;
    fn set_code_category(&mut self, id: i64, category: Option<i64>) -> bool;

    fn update_segment_start(&mut self, id: i64, start_ms: Msecs) -> bool;
    fn update_segment_end(&mut self, id: i64, end_ms: Msecs) -> bool;
    fn update_segment_memo(&mut self, id: i64, memo: &str, date: &str) -> bool;

    fn delete_category(&mut self, id: i64) -> bool;
    fn delete_code(&mut self, id: i64) -> bool;
    fn delete_segment(&mut self, id: i64) -> bool;
    fn delete_annotation_at(&mut self, file_id: i64, start: usize) -> bool;
    fn delete_coded_text(&mut self, code_id: i64, start: usize, end: usize, owner: &str) -> bool;

    /// Point children of a deleted category at the top level.
    fn orphan_children_of_category(&mut self, category_id: i64);
    /// Move every segment and coded text row from one code to another.
    /// Used when merging codes.
    fn retarget_code(&mut self, old_code_id: i64, new_code_id: i64);
    fn delete_segments_for_code(&mut self, code_id: i64);
    fn delete_coded_text_for_code(&mut self, code_id: i64);
    /// Null out segment links on coded text when the segment goes away.
    fn detach_text_links(&mut self, segment_id: i64);
}

#[derive(Debug)]
pub struct MemoryStore {
    categories: Vec<Category>,
    codes: Vec<Code>,
    segments: Vec<Segment>,
    coded_text: Vec<CodedText>,
    annotations: Vec<Annotation>,
    next_id: i64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            categories: Vec::new(),
            codes: Vec::new(),
            segments: Vec::new(),
            coded_text: Vec::new(),
            annotations: Vec::new(),
            next_id: 1,
        }
    }

    fn assign_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl CodebookStore for MemoryStore {
    fn list_categories(&self) -> Vec<Category> {
        self.categories.clone()
    }

    fn list_codes(&self) -> Vec<Code> {
        self.codes.clone()
    }

    fn list_segments(&self, file_id: i64, owner: &str) -> Vec<Segment> {
        self.segments
            .iter()
            .filter(|s| s.file_id == file_id && s.owner == owner)
            .cloned()
            .collect()
    }

    fn list_coded_text(&self, file_id: i64, owner: &str) -> Vec<CodedText> {
        self.coded_text
            .iter()
            .filter(|c| c.file_id == file_id && c.owner == owner)
            .cloned()
            .collect()
    }

    fn list_annotations(&self, file_id: i64, owner: &str) -> Vec<Annotation> {
        self.annotations
            .iter()
            .filter(|a| a.file_id == file_id && a.owner == owner)
            .cloned()
            .collect()
    }

    fn insert_category(&mut self, mut category: Category) -> i64 {
        category.id = self.assign_id();
        let id = category.id;
        self.categories.push(category);
        id
    }

    fn insert_code(&mut self, mut code: Code) -> i64 {
        code.id = self.assign_id();
        let id = code.id;
        self.codes.push(code);
        id
    }

    fn insert_segment(&mut self, mut segment: Segment) -> i64 {
        segment.id = self.assign_id();
        let id = segment.id;
        self.segments.push(segment);
        id
    }

    fn insert_annotation(&mut self, mut annotation: Annotation) -> i64 {
        annotation.id = self.assign_id();
        let id = annotation.id;
        self.annotations.push(annotation);
        id
    }

    fn insert_coded_text(&mut self, mut coded: CodedText) -> InsertOutcome {
        let duplicate = self.coded_text.iter().any(|c| {
            c.code_id == coded.code_id
                && c.file_id == coded.file_id
                && c.start == coded.start
                && c.end == coded.end
                && c.owner == coded.owner
        });
        if duplicate {
            return InsertOutcome::AlreadyExists;
        }
        coded.id = self.assign_id();
        let id = coded.id;
        self.coded_text.push(coded);
        InsertOutcome::Added(id)
    }

    fn rename_category(&mut self, id: i64, name: &str) -> bool {
        match self.categories.iter_mut().find(|c| c.id == id) {
            Some(category) => {
                category.name = name.to_string();
                true
            }
            None => false,
        }
    }

    fn rename_code(&mut self, id: i64, name: &str) -> bool {
        match self.codes.iter_mut().find(|c| c.id == id) {
            Some(code) => {
                code.name = name.to_string();
                true
            }
            None => false,
        }
    }

    fn set_category_memo(&mut self, id: i64, memo: &str) -> bool {
        match self.categories.iter_mut().find(|c| c.id == id) {
            Some(category) => {
                category.memo = memo.to_string();
                true
            }
            None => false,
        }
    }

    fn set_code_memo(&mut self, id: i64, memo: &str) -> bool {
        match self.codes.iter_mut().find(|c| c.id == id) {
            Some(code) => {
                code.memo = memo.to_string();
                true
            }
            None => false,
        }
    }

    fn set_code_color(&mut self, id: i64, color: &str) -> bool {
        match self.codes.iter_mut().find(|c| c.id == id) {
            Some(code) => {
                code.color = color.to_string();
                true
            }
            None => false,
        }
    }

    fn set_category_parent(&mut self, id: i64, parent: Option<i64>) -> bool {
        match self.categories.iter_mut().find(|c| c.id == id) {
            Some(category) => {
                category.parent_id = parent;
                true
            }
            None => false,
        }
    }

    fn set_code_category(&mut self, id: i64, category: Option<i64>) -> bool {
        match self.codes.iter_mut().find(|c| c.id == id) {
            Some(code) => {
                code.category_id = category;
                true
            }
            None => false,
        }
    }

    fn update_segment_start(&mut self, id: i64, start_ms: Msecs) -> bool {
        match self.segments.iter_mut().find(|s| s.id == id) {
            Some(segment) => {
                segment.start_ms = start_ms;
                true
            }
            None => false,
        }
    }

    fn update_segment_end(&mut self, id: i64, end_ms: Msecs) -> bool {
        match self.segments.iter_mut().find(|s| s.id == id) {
            Some(segment) => {
                segment.end_ms = end_ms;
                true
            }
            None => false,
        }
    }

    fn update_segment_memo(&mut self, id: i64, memo: &str, date: &str) -> bool {
        match self.segments.iter_mut().find(|s| s.id == id) {
            Some(segment) => {
                segment.memo = memo.to_string();
                segment.date = date.to_string();
                true
            }
            None => false,
        }
    }

    fn delete_category(&mut self, id: i64) -> bool {
        let before = self.categories.len();
        self.categories.retain(|c| c.id != id);
        self.categories.len() != before
    }

    fn delete_code(&mut self, id: i64) -> bool {
        let before = self.codes.len();
        self.codes.retain(|c| c.id != id);
        self.codes.len() != before
    }

    fn delete_segment(&mut self, id: i64) -> bool {
        let before = self.segments.len();
        self.segments.retain(|s| s.id != id);
        self.segments.len() != before
    }

    fn delete_annotation_at(&mut self, file_id: i64, start: usize) -> bool {
        let before = self.annotations.len();
        self.annotations
            .retain(|a| !(a.file_id == file_id && a.start == start));
        self.annotations.len() != before
    }

    fn delete_coded_text(&mut self, code_id: i64, start: usize, end: usize, owner: &str) -> bool {
        let before = self.coded_text.len();
        self.coded_text.retain(|c| {
            !(c.code_id == code_id && c.start == start && c.end == end && c.owner == owner)
        });
        self.coded_text.len() != before
    }

    fn orphan_children_of_category(&mut self, category_id: i64) {
        for code in self.codes.iter_mut() {
            if code.category_id == Some(category_id) {
                code.category_id = None;
            }
        }
        for category in self.categories.iter_mut() {
            if category.parent_id == Some(category_id) {
                category.parent_id = None;
            }
        }
    }

    fn retarget_code(&mut self, old_code_id: i64, new_code_id: i64) {
        for segment in self.segments.iter_mut() {
            if segment.code_id == old_code_id {
                segment.code_id = new_code_id;
            }
        }
        for coded in self.coded_text.iter_mut() {
            if coded.code_id == old_code_id {
                coded.code_id = new_code_id;
            }
        }
    }

    fn delete_segments_for_code(&mut self, code_id: i64) {
        self.segments.retain(|s| s.code_id != code_id);
    }

    fn delete_coded_text_for_code(&mut self, code_id: i64) {
        self.coded_text.retain(|c| c.code_id != code_id);
    }

    fn detach_text_links(&mut self, segment_id: i64) {
        for coded in self.coded_text.iter_mut() {
            if coded.segment_id == Some(segment_id) {
                coded.segment_id = None;
            }
        }
    }
}
