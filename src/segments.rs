//! Coded segments on the media timeline: lane assignment, the two-click
//! segment under construction, and the handshake that links a segment to a
//! span of transcript text.

use crate::types::{current_date_string, Code, CodedText, Msecs, Segment};

/// A segment joined with its code's name and color, plus the lane it is
/// drawn on.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentDisplay {
    pub segment: Segment,
    pub code_name: String,
    pub color: String,
    pub lane: u32,
}

/// Join segment rows with their codes and spread overlapping segments over
/// lanes. Rows whose code is gone are dropped.
pub fn build_displays(segments: &[Segment], codes: &[Code]) -> Vec<SegmentDisplay> {
    let mut displays: Vec<SegmentDisplay> = segments
        .iter()
        .filter_map(|segment| {
            let code = codes.iter().find(|c| c.id == segment.code_id)?;
            Some(SegmentDisplay {
                segment: segment.clone(),
                code_name: code.name.clone(),
                color: code.color.clone(),
                lane: 0,
            })
        })
        .collect();
    assign_lanes(&mut displays);
    displays
}

/// Bump a segment to the next lane whenever it overlaps an earlier segment
/// sitting on the same lane. The sweep is order dependent, and the store
/// hands segments back in insertion order, so the same data always lands on
/// the same lanes.
pub fn assign_lanes(displays: &mut [SegmentDisplay]) {
    for i in 0..displays.len() {
        for j in (i + 1)..displays.len() {
            let overlaps = (displays[j].segment.start_ms >= displays[i].segment.start_ms
                && displays[j].segment.start_ms <= displays[i].segment.end_ms)
                || (displays[j].segment.start_ms <= displays[i].segment.start_ms
                    && displays[j].segment.end_ms >= displays[i].segment.start_ms);
            if overlaps && displays[j].lane == displays[i].lane {
                displays[j].lane += 1;
            }
        }
    }
}

/// Vertical offset of a lane's stripe below the timeline.
pub fn lane_y(lane: u32) -> f32 {
    10.0 + 10.0 * lane as f32
}

/// Millisecond range a segment's start may be edited to.
pub fn start_edit_range(segment: &Segment) -> (Msecs, Msecs) {
    (1, segment.end_ms - 1)
}

/// Millisecond range a segment's end may be edited to.
pub fn end_edit_range(segment: &Segment, duration_ms: Msecs) -> (Msecs, Msecs) {
    (segment.start_ms + 1, duration_ms - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingPhase {
    Empty,
    StartSet,
    Complete,
}

/// The segment being built with the start/end button. One press records the
/// start, the next the end, a third press clears it. Assigning the finished
/// segment to a code also clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingSegment {
    pub start_ms: Option<Msecs>,
    pub end_ms: Option<Msecs>,
    pub start_label: String,
    pub end_label: String,
}

impl PendingSegment {
    pub fn phase(&self) -> PendingPhase {
        match (self.start_ms, self.end_ms) {
            (None, _) => PendingPhase::Empty,
            (Some(_), None) => PendingPhase::StartSet,
            (Some(_), Some(_)) => PendingPhase::Complete,
        }
    }

    pub fn button_label(&self) -> &'static str {
        match self.phase() {
            PendingPhase::Empty => "Start segment",
            PendingPhase::StartSet => "End segment",
            PendingPhase::Complete => "Clear segment",
        }
    }

    /// Advance the two-click protocol at the given playback position. When
    /// the second click lands before the first, start and end swap, labels
    /// included.
    pub fn mark(&mut self, position_ms: Msecs, label: String) {
        match self.phase() {
            PendingPhase::Complete => self.clear(),
            PendingPhase::Empty => {
                self.start_ms = Some(position_ms);
                self.start_label = label;
            }
            PendingPhase::StartSet => {
                self.end_ms = Some(position_ms);
                self.end_label = label;
                if let (Some(start), Some(end)) = (self.start_ms, self.end_ms) {
                    if end < start {
                        self.start_ms = Some(end);
                        self.end_ms = Some(start);
                        std::mem::swap(&mut self.start_label, &mut self.end_label);
                    }
                }
            }
        }
    }

    pub fn clear(&mut self) {
        *self = PendingSegment::default();
    }

    /// Start and end of the finished segment, `None` until both are set.
    pub fn bounds(&self) -> Option<(Msecs, Msecs)> {
        Some((self.start_ms?, self.end_ms?))
    }
}

/// A span of transcript text marked for linking.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSelection {
    pub file_id: i64,
    /// Char offsets into the transcript.
    pub start: usize,
    pub end: usize,
    pub selected: String,
}

/// Two-sided handshake between a marked text span and a chosen segment.
/// Either side can be armed first; the commit from the other side produces
/// the coded text row and disarms both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkHandshake {
    armed_text: Option<TextSelection>,
    armed_segment: Option<i64>,
}

impl LinkHandshake {
    /// Remember a text span for a later link. An empty span is ignored.
    pub fn arm_text(&mut self, selection: TextSelection) -> bool {
        if selection.start == selection.end {
            return false;
        }
        self.armed_text = Some(selection);
        true
    }

    pub fn arm_segment(&mut self, segment_id: i64) {
        self.armed_segment = Some(segment_id);
    }

    pub fn armed_text(&self) -> Option<&TextSelection> {
        self.armed_text.as_ref()
    }

    pub fn armed_segment(&self) -> Option<i64> {
        self.armed_segment
    }

    /// Link the armed text span to the given segment. Returns `None` and
    /// leaves the state alone when no text is armed.
    pub fn commit_armed_text(&mut self, segment: &Segment, owner: &str) -> Option<CodedText> {
        let selection = self.armed_text.take()?;
        self.armed_segment = None;
        Some(link_row(segment, &selection, owner))
    }

    /// Link the armed segment to a fresh text selection. Returns `None` and
    /// leaves the state alone when the given segment is not the armed one or
    /// the selection is empty.
    pub fn commit_armed_segment(
        &mut self,
        segment: &Segment,
        selection: &TextSelection,
        owner: &str,
    ) -> Option<CodedText> {
        if self.armed_segment != Some(segment.id) {
            return None;
        }
        if selection.start == selection.end {
            return None;
        }
        self.armed_segment = None;
        self.armed_text = None;
        Some(link_row(segment, selection, owner))
    }

    pub fn disarm(&mut self) {
        self.armed_text = None;
        self.armed_segment = None;
    }
}

fn link_row(segment: &Segment, selection: &TextSelection, owner: &str) -> CodedText {
    CodedText {
        id: 0,
        code_id: segment.code_id,
        file_id: selection.file_id,
        selected: selection.selected.clone(),
        start: selection.start,
        end: selection.end,
        owner: owner.to_string(),
        memo: String::new(),
        date: current_date_string(),
        segment_id: Some(segment.id),
    }
}
