mod test_helpers;

use qoda::codebook::{
    self, display_tree, CodebookSnapshot, DropTarget, MutationOutcome, TreeItem,
};
use qoda::refresh::RefreshBus;
use qoda::store::{CodebookStore, InsertOutcome, MemoryStore};
use qoda::types::CodedText;
use test_helpers::*;

fn coded(code_id: i64, start: usize, end: usize) -> CodedText {
    CodedText {
        id: 0,
        code_id,
        file_id: 1,
        selected: "quoted words".to_string(),
        start,
        end,
        owner: OWNER.to_string(),
        memo: String::new(),
        date: String::new(),
        segment_id: None,
    }
}

#[test]
fn test_add_code_rejects_duplicate_names() {
    let mut store = MemoryStore::new();
    assert_eq!(codebook::add_code(&mut store, "cost", OWNER), MutationOutcome::Applied);
    assert_eq!(
        codebook::add_code(&mut store, "cost", OWNER),
        MutationOutcome::DuplicateName
    );

    // Codes and categories live in separate name spaces.
    assert_eq!(
        codebook::add_category(&mut store, "cost", OWNER),
        MutationOutcome::Applied
    );
    assert_eq!(
        codebook::add_category(&mut store, "cost", OWNER),
        MutationOutcome::DuplicateName
    );

    let code = &store.list_codes()[0];
    assert_eq!(code.category_id, None);
    assert!(code.color.starts_with('#'), "a new code gets a palette color");
}

#[test]
fn test_rename_checks_names_first() {
    let mut store = MemoryStore::new();
    let trust = seed_code(&mut store, "trust", None);
    seed_code(&mut store, "cost", None);

    assert_eq!(
        codebook::rename_code(&mut store, trust, "doubt"),
        MutationOutcome::Applied
    );
    assert_eq!(store.list_codes()[0].name, "doubt");
    assert_eq!(
        codebook::rename_code(&mut store, trust, "cost"),
        MutationOutcome::DuplicateName
    );

    // Renaming to the current name collides with itself.
    assert_eq!(
        codebook::rename_code(&mut store, trust, "doubt"),
        MutationOutcome::DuplicateName
    );

    // The name check runs before the row lookup.
    assert_eq!(
        codebook::rename_code(&mut store, 99, "fresh"),
        MutationOutcome::Missing
    );
}

#[test]
fn test_reparent_category() {
    let mut store = MemoryStore::new();
    let research = seed_category(&mut store, "research", None);
    let adoption = seed_category(&mut store, "adoption", None);
    let cost = seed_code(&mut store, "cost", None);

    assert_eq!(
        codebook::reparent_category(&mut store, adoption, DropTarget::Category(research)),
        MutationOutcome::Applied
    );
    assert_eq!(store.list_categories()[1].parent_id, Some(research));

    assert_eq!(
        codebook::reparent_category(&mut store, adoption, DropTarget::Code(cost)),
        MutationOutcome::TargetIsCode
    );
    assert_eq!(
        codebook::reparent_category(&mut store, adoption, DropTarget::Category(adoption)),
        MutationOutcome::IntoItself
    );
    assert_eq!(
        codebook::reparent_category(&mut store, 99, DropTarget::TopLevel),
        MutationOutcome::Missing
    );

    assert_eq!(
        codebook::reparent_category(&mut store, adoption, DropTarget::TopLevel),
        MutationOutcome::Applied
    );
    assert_eq!(store.list_categories()[1].parent_id, None);
}

#[test]
fn test_reparent_code_reports_merges() {
    let mut store = MemoryStore::new();
    let research = seed_category(&mut store, "research", None);
    let cost = seed_code(&mut store, "cost", None);
    let trust = seed_code(&mut store, "trust", None);

    assert_eq!(
        codebook::reparent_code(&mut store, cost, DropTarget::Category(research)),
        MutationOutcome::Applied
    );
    assert_eq!(store.list_codes()[0].category_id, Some(research));

    // Dropping a code onto a code is only reported; nothing moves until the
    // merge is confirmed.
    assert_eq!(
        codebook::reparent_code(&mut store, cost, DropTarget::Code(trust)),
        MutationOutcome::WouldMerge {
            code_id: cost,
            onto_code_id: trust,
        }
    );
    assert_eq!(store.list_codes().len(), 2);
    assert_eq!(store.list_codes()[0].category_id, Some(research));
}

#[test]
fn test_merge_codes_moves_work_to_survivor() {
    let mut store = MemoryStore::new();
    let cost = seed_code(&mut store, "cost", None);
    let price = seed_code(&mut store, "price", None);
    seed_segment(&mut store, 1, 0, 5_000, price);
    store.insert_coded_text(coded(price, 3, 9));

    assert_eq!(
        codebook::merge_codes(&mut store, price, cost),
        MutationOutcome::Applied
    );
    let codes = store.list_codes();
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0].name, "cost");
    assert_eq!(store.list_segments(1, OWNER)[0].code_id, cost);
    assert_eq!(store.list_coded_text(1, OWNER)[0].code_id, cost);

    // Merging onto a vanished code changes nothing.
    seed_segment(&mut store, 1, 6_000, 7_000, cost);
    assert_eq!(
        codebook::merge_codes(&mut store, cost, 99),
        MutationOutcome::Missing
    );
    assert_eq!(store.list_codes().len(), 1);
    assert_eq!(store.list_segments(1, OWNER).len(), 2);
}

#[test]
fn test_delete_code_cascades() {
    let mut store = MemoryStore::new();
    let cost = seed_code(&mut store, "cost", None);
    let trust = seed_code(&mut store, "trust", None);
    seed_segment(&mut store, 1, 0, 5_000, cost);
    seed_segment(&mut store, 1, 6_000, 9_000, trust);
    store.insert_coded_text(coded(cost, 3, 9));

    assert_eq!(codebook::delete_code(&mut store, cost), MutationOutcome::Applied);
    assert_eq!(store.list_codes().len(), 1);
    let remaining = store.list_segments(1, OWNER);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].code_id, trust);
    assert!(store.list_coded_text(1, OWNER).is_empty());

    assert_eq!(codebook::delete_code(&mut store, cost), MutationOutcome::Missing);
}

#[test]
fn test_delete_category_orphans_children() {
    let mut store = MemoryStore::new();
    let research = seed_category(&mut store, "research", None);
    let adoption = seed_category(&mut store, "adoption", Some(research));
    let cost = seed_code(&mut store, "cost", Some(research));

    assert_eq!(
        codebook::delete_category(&mut store, research),
        MutationOutcome::Applied
    );
    let categories = store.list_categories();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].id, adoption);
    assert_eq!(categories[0].parent_id, None);
    assert_eq!(store.list_codes()[0].id, cost);
    assert_eq!(store.list_codes()[0].category_id, None);

    assert_eq!(
        codebook::delete_category(&mut store, research),
        MutationOutcome::Missing
    );
}

#[test]
fn test_coded_text_duplicates_rejected() {
    let mut store = MemoryStore::new();
    let cost = seed_code(&mut store, "cost", None);

    assert!(matches!(
        store.insert_coded_text(coded(cost, 3, 9)),
        InsertOutcome::Added(_)
    ));
    assert_eq!(
        store.insert_coded_text(coded(cost, 3, 9)),
        InsertOutcome::AlreadyExists
    );

    // A different span of the same code is fine.
    assert!(matches!(
        store.insert_coded_text(coded(cost, 4, 9)),
        InsertOutcome::Added(_)
    ));
}

#[test]
fn test_detach_text_links_keeps_rows() {
    let mut store = MemoryStore::new();
    let cost = seed_code(&mut store, "cost", None);
    let mut row = coded(cost, 3, 9);
    row.segment_id = Some(44);
    store.insert_coded_text(row);

    store.detach_text_links(44);
    let rows = store.list_coded_text(1, OWNER);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].segment_id, None);
}

#[test]
fn test_display_tree_order_and_levels() {
    let categories = vec![
        create_test_category(1, "research", None),
        create_test_category(2, "adoption", Some(1)),
    ];
    let mut beta = create_test_code(11, "beta", Some(1), "#F8E0E0");
    beta.memo = "needs a second look".to_string();
    let codes = vec![
        create_test_code(10, "alpha", Some(2), "#F8E0E0"),
        beta,
        create_test_code(12, "gamma", None, "#F8E0E0"),
    ];

    let rows = display_tree(&categories, &codes);
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    let levels: Vec<u32> = rows.iter().map(|r| r.level).collect();

    // Codes sit at the end of their category's subtree; uncategorized codes
    // trail at the top level.
    assert_eq!(names, vec!["research", "adoption", "alpha", "beta", "gamma"]);
    assert_eq!(levels, vec![0, 1, 2, 1, 0]);

    assert_eq!(rows[0].item, TreeItem::Category(1));
    assert_eq!(rows[0].color, None);
    assert_eq!(rows[2].item, TreeItem::Code(10));
    assert_eq!(rows[2].color.as_deref(), Some("#F8E0E0"));
    assert!(rows[3].has_memo);
    assert!(!rows[2].has_memo);
}

#[test]
fn test_display_tree_keeps_orphans_visible() {
    // A missing parent and a parent cycle both park the rows at the top
    // level instead of dropping them.
    let categories = vec![
        create_test_category(1, "stray", Some(99)),
        create_test_category(2, "chicken", Some(3)),
        create_test_category(3, "egg", Some(2)),
    ];
    let rows = display_tree(&categories, &[]);
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["stray", "chicken", "egg"]);
    assert!(rows.iter().all(|r| r.level == 0));
}

#[test]
fn test_snapshot_reload_counts_versions() {
    let mut store = MemoryStore::new();
    let research = seed_category(&mut store, "research", None);
    let cost = seed_code(&mut store, "cost", Some(research));

    let mut snapshot = CodebookSnapshot::default();
    assert_eq!(snapshot.version, 0);
    snapshot.reload(&store);
    assert_eq!(snapshot.version, 1);
    assert_eq!(snapshot.categories.len(), 1);
    assert_eq!(snapshot.code(cost).map(|c| c.name.as_str()), Some("cost"));
    assert_eq!(
        snapshot.category(research).map(|c| c.name.as_str()),
        Some("research")
    );
    assert_eq!(snapshot.code(99), None);

    snapshot.reload(&store);
    assert_eq!(snapshot.version, 2);
}

#[test]
fn test_refresh_bus_marks_each_view_once() {
    let mut bus = RefreshBus::default();
    let coding = bus.register("coding view");
    let graph = bus.register("graph view");
    assert_eq!(bus.registered_names(), vec!["coding view", "graph view"]);

    // Nothing to do until a broadcast.
    assert!(!bus.needs_refresh(coding));

    bus.broadcast();
    assert_eq!(bus.version(), 1);
    assert!(bus.needs_refresh(coding));
    assert!(!bus.needs_refresh(coding), "a refresh is reported once");
    assert!(bus.needs_refresh(graph));

    // A view registered after the broadcast starts clean.
    let late = bus.register("report view");
    assert!(!bus.needs_refresh(late));

    bus.unregister(graph);
    bus.broadcast();
    assert!(!bus.needs_refresh(graph), "unknown tokens never refresh");
    assert!(bus.needs_refresh(coding));
}
