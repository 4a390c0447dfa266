//! Core record types shared by the codebook, graph and audio/video coding views.
//! Records are plain values; views keep their own snapshots and the store owns
//! the authoritative rows.

/// Milliseconds of media time.
pub type Msecs = i64;

/// A category groups codes (and other categories) into a tree.
/// `parent_id` of `None` means the category sits at the top level.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub owner: String,
    pub date: String,
    pub memo: String,
}

/// A code is a leaf in the codebook tree. It never has children.
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub id: i64,
    pub name: String,
    /// Owning category, `None` for an uncategorized code.
    pub category_id: Option<i64>,
    /// Hex color like "#F8E0E0", used for stripes and text highlights.
    pub color: String,
    pub owner: String,
    pub date: String,
    pub memo: String,
}

/// A coded span of media time in one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: i64,
    pub file_id: i64,
    pub start_ms: Msecs,
    pub end_ms: Msecs,
    pub code_id: i64,
    pub owner: String,
    pub memo: String,
    pub date: String,
}

/// A code applied to a span of transcript text.
/// `segment_id` is set when the coded text is linked to a media segment.
#[derive(Debug, Clone, PartialEq)]
pub struct CodedText {
    pub id: i64,
    pub code_id: i64,
    pub file_id: i64,
    pub selected: String,
    /// Character offsets into the transcript.
    pub start: usize,
    pub end: usize,
    pub owner: String,
    pub memo: String,
    pub date: String,
    pub segment_id: Option<i64>,
}

/// A coder's note on a span of transcript text, independent of any code.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id: i64,
    pub file_id: i64,
    pub start: usize,
    pub end: usize,
    pub memo: String,
    pub owner: String,
    pub date: String,
}

/// A timestamp found in transcript text: the character span of the stamp
/// and the media time it denotes. Recomputed whenever the text changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeMarker {
    pub text_start: usize,
    pub text_end: usize,
    pub msecs: Msecs,
}

/// Convert milliseconds to a "minutes.seconds" label, seconds zero-padded.
/// Minutes are not broken into hours, so long media shows e.g. "75.03".
pub fn msecs_to_time_label(msecs: Msecs) -> String {
    let secs = msecs / 1000;
    let mins = secs / 60;
    let remainder_secs = secs - mins * 60;
    format!("{}.{:02}", mins, remainder_secs)
}

/// Local wall-clock time in the format stored on record rows.
pub fn current_date_string() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
