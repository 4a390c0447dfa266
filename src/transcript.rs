//! Timestamp extraction from transcript text and the mapping between
//! media time and text positions.
//!
//! Transcripts carry timestamps in several conventions, picked up with one
//! pattern per convention. Markers are appended pattern by pattern, so the
//! returned list is in text order within a convention but not across them;
//! [scroll_target_for_time] sorts its own copy before searching.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{Msecs, TimeMarker};

static BRACKET_M_SS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[0-9]?[0-9]:[0-9][0-9]\]").unwrap());
static BRACKET_HH_MM_SS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[0-9][0-9]:[0-9][0-9]:[0-9][0-9]\]").unwrap());
static BRACKET_M_SS_DOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[0-9]?[0-9]\.[0-9][0-9]\]").unwrap());
static BRACKET_HH_MM_SS_DOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[0-9][0-9]\.[0-9][0-9]\.[0-9][0-9]\]").unwrap());
static HASH_HH_MM_SS_FRACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[0-9][0-9]:[0-9][0-9]:[0-9][0-9]\.[0-9]{1,3}#").unwrap());
static SRT_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[0-9][0-9]:[0-9][0-9]:[0-9][0-9],[0-9][0-9][0-9]\s-->\s[0-9][0-9]:[0-9][0-9]:[0-9][0-9],[0-9][0-9][0-9]",
    )
    .unwrap()
});

const MAX_SPEAKERS: usize = 8;

/// Scan the transcript for timestamps in every supported convention.
/// A match whose digits do not parse is skipped without complaint.
pub fn extract_timestamps(text: &str) -> Vec<TimeMarker> {
    let mut markers = Vec::new();

    for m in BRACKET_M_SS.find_iter(text) {
        let inner = m.as_str().trim_matches(['[', ']']);
        let Some(msecs) = parse_two_part(inner, ':') else {
            continue;
        };
        push_marker(&mut markers, text, m.start(), m.end(), msecs);
    }
    for m in BRACKET_HH_MM_SS.find_iter(text) {
        let inner = m.as_str().trim_matches(['[', ']']);
        let Some(msecs) = parse_three_part(inner, ':') else {
            continue;
        };
        push_marker(&mut markers, text, m.start(), m.end(), msecs);
    }
    for m in BRACKET_M_SS_DOT.find_iter(text) {
        let inner = m.as_str().trim_matches(['[', ']']);
        let Some(msecs) = parse_two_part(inner, '.') else {
            continue;
        };
        push_marker(&mut markers, text, m.start(), m.end(), msecs);
    }
    for m in BRACKET_HH_MM_SS_DOT.find_iter(text) {
        let inner = m.as_str().trim_matches(['[', ']']);
        let Some(msecs) = parse_three_part(inner, '.') else {
            continue;
        };
        push_marker(&mut markers, text, m.start(), m.end(), msecs);
    }
    for m in HASH_HH_MM_SS_FRACTION.find_iter(text) {
        let inner = m.as_str().trim_matches('#');
        let Some((clock, fraction)) = inner.split_once('.') else {
            continue;
        };
        let Some(base) = parse_three_part(clock, ':') else {
            continue;
        };
        // The fraction may carry one to three digits and means milliseconds.
        let mut padded = fraction.to_string();
        if padded.len() == 1 {
            padded.push_str("00");
        } else if padded.len() == 2 {
            padded.push('0');
        }
        let Ok(millis) = padded.parse::<i64>() else {
            continue;
        };
        push_marker(&mut markers, text, m.start(), m.end(), base + millis);
    }
    for m in SRT_RANGE.find_iter(text) {
        // Only the start stamp of the range matters, "hh:mm:ss,mmm".
        let Some(stamp) = m.as_str().get(..12) else {
            continue;
        };
        let Some((clock, millis_str)) = stamp.split_once(',') else {
            continue;
        };
        let Some(base) = parse_three_part(clock, ':') else {
            continue;
        };
        let Ok(millis) = millis_str.parse::<i64>() else {
            continue;
        };
        push_marker(&mut markers, text, m.start(), m.end(), base + millis);
    }

    markers
}

/// Text position the transcript should scroll to while the media plays.
/// Picks the marker whose predecessor's time has been reached but whose own
/// time has not, so the view always shows the upcoming timestamp.
pub fn scroll_target_for_time(markers: &[TimeMarker], msecs: Msecs) -> Option<usize> {
    let mut sorted: Vec<TimeMarker> = markers.to_vec();
    sorted.sort_by_key(|m| m.text_start);
    for pair in sorted.windows(2) {
        if msecs >= pair[0].msecs && msecs < pair[1].msecs {
            return Some(pair[1].text_start);
        }
    }
    None
}

/// Media time of the timestamp under the cursor, if the cursor sits on one.
pub fn time_at_offset(markers: &[TimeMarker], offset: usize) -> Option<Msecs> {
    markers
        .iter()
        .find(|m| m.text_start <= offset && offset <= m.text_end)
        .map(|m| m.msecs)
}

/// Names found in square brackets that do not look like timestamps. At most
/// eight are returned, in order of first appearance, for the quick-insert
/// shortcuts.
pub fn speaker_names(text: &str) -> Vec<String> {
    let mut collected = String::new();
    let mut inside = false;
    for c in text.chars() {
        if c == '[' {
            inside = true;
        }
        if c == ']' {
            inside = false;
        }
        if inside {
            collected.push(c);
        }
    }

    let mut names: Vec<String> = Vec::new();
    for entry in collected.split('[') {
        let name = entry.trim();
        if name.is_empty() || name.contains('.') || name.contains(':') {
            continue;
        }
        if names.iter().any(|n| n == name) {
            continue;
        }
        names.push(name.to_string());
        if names.len() == MAX_SPEAKERS {
            break;
        }
    }
    names
}

/// Timestamp inserted into the transcript at the current playback position,
/// on its own line. Hours and seconds are zero padded, minutes are not.
pub fn insertion_timestamp(msecs: Msecs) -> String {
    let total_secs = msecs / 1000;
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("\n[{hours:02}.{mins}.{secs:02}]")
}

// Cursor offsets in the text editor count chars, the regex reports bytes.
fn char_offset(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count()
}

fn push_marker(
    markers: &mut Vec<TimeMarker>,
    text: &str,
    byte_start: usize,
    byte_end: usize,
    msecs: Msecs,
) {
    markers.push(TimeMarker {
        text_start: char_offset(text, byte_start),
        text_end: char_offset(text, byte_end),
        msecs,
    });
}

fn parse_two_part(inner: &str, sep: char) -> Option<Msecs> {
    let (mins, secs) = inner.split_once(sep)?;
    let mins: i64 = mins.parse().ok()?;
    let secs: i64 = secs.parse().ok()?;
    Some((mins * 60 + secs) * 1000)
}

fn parse_three_part(inner: &str, sep: char) -> Option<Msecs> {
    let mut parts = inner.split(sep);
    let hours: i64 = parts.next()?.parse().ok()?;
    let mins: i64 = parts.next()?.parse().ok()?;
    let secs: i64 = parts.next()?.parse().ok()?;
    Some((hours * 3600 + mins * 60 + secs) * 1000)
}
