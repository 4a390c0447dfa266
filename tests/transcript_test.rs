use qoda::transcript::{
    extract_timestamps, insertion_timestamp, scroll_target_for_time, speaker_names, time_at_offset,
};
use qoda::types::{msecs_to_time_label, TimeMarker};

#[test]
fn test_bracket_minute_second_markers() {
    let markers = extract_timestamps("[01:02] hello [02:03] world");
    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0].text_start, 0);
    assert_eq!(markers[0].text_end, 7);
    assert_eq!(markers[0].msecs, 62_000);
    assert_eq!(markers[1].text_start, 14);
    assert_eq!(markers[1].text_end, 21);
    assert_eq!(markers[1].msecs, 123_000);

    // Minutes may be a single digit.
    let markers = extract_timestamps("[5:30]");
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].msecs, 330_000);
}

#[test]
fn test_hour_clock_markers() {
    let markers = extract_timestamps("[00:01:02]");
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].text_start, 0);
    assert_eq!(markers[0].text_end, 10);
    assert_eq!(markers[0].msecs, 62_000);

    // Dot separated variants, with and without hours.
    let markers = extract_timestamps("[00.11.15]");
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].msecs, 675_000);
    let markers = extract_timestamps("[7.05]");
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].msecs, 425_000);
}

#[test]
fn test_fraction_clock_markers() {
    // The fraction carries one to three digits of milliseconds.
    for text in ["#00:01:02.5#", "#00:01:02.50#", "#00:01:02.500#"] {
        let markers = extract_timestamps(text);
        assert_eq!(markers.len(), 1, "no marker in {text:?}");
        assert_eq!(markers[0].msecs, 62_500, "wrong time for {text:?}");
    }
}

#[test]
fn test_srt_markers() {
    // Only the start stamp of an SRT range counts, the span covers the
    // whole range.
    let markers = extract_timestamps("00:01:02,500 --> 00:01:04,000");
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].text_start, 0);
    assert_eq!(markers[0].text_end, 29);
    assert_eq!(markers[0].msecs, 62_500);
}

#[test]
fn test_marker_offsets_count_chars() {
    // The regex reports byte offsets; markers carry char offsets, matching
    // the text editor's cursor.
    let markers = extract_timestamps("café [01:02]");
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].text_start, 5);
    assert_eq!(markers[0].text_end, 12);
}

#[test]
fn test_markers_grouped_by_convention() {
    // Markers come back convention by convention, not in text order; the
    // colon form is scanned before the dot form.
    let markers = extract_timestamps("[00.11.15] and [01:02]");
    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0].msecs, 62_000);
    assert_eq!(markers[0].text_start, 15);
    assert_eq!(markers[1].msecs, 675_000);
    assert_eq!(markers[1].text_start, 0);
}

#[test]
fn test_scroll_target_for_time() {
    let markers = extract_timestamps("[01:02] hello [02:03] world");

    // Before the first stamp nothing brackets the position.
    assert_eq!(scroll_target_for_time(&markers, 0), None);
    assert_eq!(scroll_target_for_time(&markers, 61_999), None);

    // Between the stamps the view scrolls to the upcoming one.
    assert_eq!(scroll_target_for_time(&markers, 62_000), Some(14));
    assert_eq!(scroll_target_for_time(&markers, 122_999), Some(14));

    // Past the last stamp there is nowhere further to scroll.
    assert_eq!(scroll_target_for_time(&markers, 123_000), None);

    // A single marker never forms a bracketing pair.
    let one = extract_timestamps("[01:02]");
    assert_eq!(scroll_target_for_time(&one, 62_000), None);
}

#[test]
fn test_scroll_target_sorts_markers() {
    // The marker list mixes conventions and is not text ordered; the search
    // sorts its own copy.
    let markers = vec![
        TimeMarker {
            text_start: 20,
            text_end: 27,
            msecs: 120_000,
        },
        TimeMarker {
            text_start: 0,
            text_end: 7,
            msecs: 60_000,
        },
    ];
    assert_eq!(scroll_target_for_time(&markers, 90_000), Some(20));
}

#[test]
fn test_time_at_offset() {
    let markers = extract_timestamps("[01:02] hello [02:03] world");

    // Both ends of the stamp's span count as on it.
    assert_eq!(time_at_offset(&markers, 0), Some(62_000));
    assert_eq!(time_at_offset(&markers, 7), Some(62_000));
    assert_eq!(time_at_offset(&markers, 8), None);
    assert_eq!(time_at_offset(&markers, 14), Some(123_000));
    assert_eq!(time_at_offset(&markers, 21), Some(123_000));
    assert_eq!(time_at_offset(&markers, 25), None);
}

#[test]
fn test_speaker_names() {
    let names = speaker_names("[Alice] hi [01:02] yes [Bob] right [Alice] so");
    assert_eq!(names, vec!["Alice", "Bob"]);

    // Bracketed text with a dot or colon is a timestamp, not a speaker, and
    // surrounding whitespace is trimmed.
    let names = speaker_names("[ Carol ] said [Dr. Smith] nothing [] at [00.11.15] all");
    assert_eq!(names, vec!["Carol"]);
}

#[test]
fn test_speaker_names_capped_at_eight() {
    let text: String = (1..=10).map(|i| format!("[speaker {i}] ")).collect();
    let names = speaker_names(&text);
    assert_eq!(names.len(), 8);
    assert_eq!(names[0], "speaker 1");
    assert_eq!(names[7], "speaker 8");
}

#[test]
fn test_insertion_timestamp() {
    // Hours and seconds are padded, minutes are not.
    assert_eq!(insertion_timestamp(3_723_000), "\n[01.2.03]");
    assert_eq!(insertion_timestamp(0), "\n[00.0.00]");

    // With two-digit minutes the inserted stamp scans back out again.
    let stamp = insertion_timestamp(675_000);
    assert_eq!(stamp, "\n[00.11.15]");
    let markers = extract_timestamps(&stamp);
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].msecs, 675_000);
}

#[test]
fn test_msecs_to_time_label() {
    assert_eq!(msecs_to_time_label(0), "0.00");
    assert_eq!(msecs_to_time_label(62_000), "1.02");
    assert_eq!(msecs_to_time_label(59_999), "0.59");

    // Minutes pass sixty rather than rolling into hours.
    assert_eq!(msecs_to_time_label(4_503_000), "75.03");
}
