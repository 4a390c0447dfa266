use qoda::player::MediaPlayer;
use qoda::store::{CodebookStore, MemoryStore};
use qoda::types::{Category, Code, Msecs, Segment};

#[allow(dead_code)]
pub const OWNER: &str = "default";

/// Helper to create a category row with fixed id, as the graph layout takes
/// them (no store involved)
#[allow(dead_code)]
pub fn create_test_category(id: i64, name: &str, parent_id: Option<i64>) -> Category {
    Category {
        id,
        name: name.to_string(),
        parent_id,
        owner: OWNER.to_string(),
        date: String::new(),
        memo: String::new(),
    }
}

/// Helper to create a code row with fixed id and color
#[allow(dead_code)]
pub fn create_test_code(id: i64, name: &str, category_id: Option<i64>, color: &str) -> Code {
    Code {
        id,
        name: name.to_string(),
        category_id,
        color: color.to_string(),
        owner: OWNER.to_string(),
        date: String::new(),
        memo: String::new(),
    }
}

/// Helper to create a segment row with fixed id
#[allow(dead_code)]
pub fn create_test_segment(
    id: i64,
    file_id: i64,
    start_ms: Msecs,
    end_ms: Msecs,
    code_id: i64,
) -> Segment {
    Segment {
        id,
        file_id,
        start_ms,
        end_ms,
        code_id,
        owner: OWNER.to_string(),
        memo: String::new(),
        date: String::new(),
    }
}

/// Helper to insert a category into a store and get its assigned id
#[allow(dead_code)]
pub fn seed_category(store: &mut MemoryStore, name: &str, parent_id: Option<i64>) -> i64 {
    store.insert_category(create_test_category(0, name, parent_id))
}

/// Helper to insert a code into a store and get its assigned id
#[allow(dead_code)]
pub fn seed_code(store: &mut MemoryStore, name: &str, category_id: Option<i64>) -> i64 {
    store.insert_code(create_test_code(0, name, category_id, "#F8E0E0"))
}

/// Helper to insert a segment into a store and get its assigned id
#[allow(dead_code)]
pub fn seed_segment(
    store: &mut MemoryStore,
    file_id: i64,
    start_ms: Msecs,
    end_ms: Msecs,
    code_id: i64,
) -> i64 {
    store.insert_segment(create_test_segment(0, file_id, start_ms, end_ms, code_id))
}

/// Player double with a position the test sets by hand, so controller tests
/// never depend on wall-clock timing
#[allow(dead_code)]
pub struct ScriptedPlayer {
    pub position_ms: Msecs,
    pub duration_ms: Msecs,
    pub playing: bool,
}

#[allow(dead_code)]
impl ScriptedPlayer {
    pub fn new(duration_ms: Msecs) -> Self {
        ScriptedPlayer {
            position_ms: 0,
            duration_ms,
            playing: false,
        }
    }
}

impl MediaPlayer for ScriptedPlayer {
    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.position_ms = 0;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn position_ms(&self) -> Msecs {
        self.position_ms
    }

    fn duration_ms(&self) -> Msecs {
        self.duration_ms
    }

    fn seek_fraction(&mut self, fraction: f32) {
        self.position_ms = (fraction as f64 * self.duration_ms as f64) as Msecs;
    }
}
