mod test_helpers;

use std::thread::sleep;
use std::time::Duration;

use qoda::player::{MediaPlayer, PlaybackController, SimulatedPlayer};
use qoda::types::TimeMarker;
use test_helpers::*;

// The controller samples at most every 100ms; waiting a little longer
// guarantees the next poll goes through.
const PAST_POLL_GATE: Duration = Duration::from_millis(110);

#[test]
fn test_play_segment_watches_for_end() {
    let mut player = ScriptedPlayer::new(64_000);
    let mut controller = PlaybackController::default();
    let segment = create_test_segment(1, 1, 16_000, 32_000, 7);

    controller.play_segment(&mut player, &segment);
    assert!(player.playing);
    assert_eq!(player.position_ms, 16_000);

    let outcome = controller.poll(&mut player, &[]).unwrap();
    assert_eq!(outcome.position_ms, 16_000);
    assert!(!outcome.segment_ended);
    assert_eq!(controller.position_ms(), 16_000);

    // Crossing the watched end pauses playback and reports it once.
    player.position_ms = 32_001;
    sleep(PAST_POLL_GATE);
    let outcome = controller.poll(&mut player, &[]).unwrap();
    assert!(outcome.segment_ended);
    assert!(!player.playing);

    sleep(PAST_POLL_GATE);
    let outcome = controller.poll(&mut player, &[]).unwrap();
    assert!(!outcome.segment_ended);
}

#[test]
fn test_poll_is_rate_limited() {
    let mut player = ScriptedPlayer::new(64_000);
    let mut controller = PlaybackController::default();

    assert!(controller.poll(&mut player, &[]).is_some());
    assert!(controller.poll(&mut player, &[]).is_none());
}

#[test]
fn test_scroll_target_only_while_playing() {
    let markers = [
        TimeMarker {
            text_start: 0,
            text_end: 7,
            msecs: 62_000,
        },
        TimeMarker {
            text_start: 40,
            text_end: 47,
            msecs: 123_000,
        },
    ];
    let mut player = ScriptedPlayer::new(256_000);
    player.position_ms = 70_000;
    player.playing = true;

    let mut controller = PlaybackController::default();
    let outcome = controller.poll(&mut player, &markers).unwrap();
    assert_eq!(outcome.scroll_to, Some(40));

    // Paused playback keeps the view where the user put it.
    player.playing = false;
    let mut controller = PlaybackController::default();
    let outcome = controller.poll(&mut player, &markers).unwrap();
    assert_eq!(outcome.scroll_to, None);
}

#[test]
fn test_play_pause_abandons_watch() {
    let mut player = ScriptedPlayer::new(64_000);
    let mut controller = PlaybackController::default();
    let segment = create_test_segment(1, 1, 16_000, 32_000, 7);

    controller.play_segment(&mut player, &segment);
    controller.play_pause(&mut player);
    assert!(!player.playing);

    // Past the old end no segment end is reported.
    player.position_ms = 40_000;
    let outcome = controller.poll(&mut player, &[]).unwrap();
    assert!(!outcome.segment_ended);

    controller.play_pause(&mut player);
    assert!(player.playing);
}

#[test]
fn test_stop_resets_sampled_position() {
    let mut player = ScriptedPlayer::new(64_000);
    let mut controller = PlaybackController::default();
    let segment = create_test_segment(1, 1, 16_000, 32_000, 7);

    controller.play_segment(&mut player, &segment);
    controller.poll(&mut player, &[]);
    assert_eq!(controller.position_ms(), 16_000);

    controller.stop(&mut player);
    assert!(!player.playing);
    assert_eq!(player.position_ms, 0);
    assert_eq!(controller.position_ms(), 0);
}

#[test]
fn test_rewind_steps_back_and_clamps() {
    let mut player = ScriptedPlayer::new(64_000);
    let mut controller = PlaybackController::default();

    player.position_ms = 50_000;
    controller.rewind(&mut player);
    assert_eq!(player.position_ms, 47_000);

    player.position_ms = 2_000;
    controller.rewind(&mut player);
    assert_eq!(player.position_ms, 0);
}

#[test]
fn test_play_segment_needs_a_duration() {
    let mut player = ScriptedPlayer::new(0);
    let mut controller = PlaybackController::default();
    let segment = create_test_segment(1, 1, 16_000, 32_000, 7);

    controller.play_segment(&mut player, &segment);
    assert!(!player.playing, "nothing to play without media");
}

#[test]
fn test_simulated_player_clamps_seeks() {
    let mut player = SimulatedPlayer::new(5_000);
    assert!(!player.is_playing());
    assert_eq!(player.position_ms(), 0);
    assert_eq!(player.duration_ms(), 5_000);

    // While paused the position holds still at the seek target.
    player.seek_fraction(0.5);
    assert_eq!(player.position_ms(), 2_500);
    player.seek_fraction(2.0);
    assert_eq!(player.position_ms(), 5_000);
    player.seek_fraction(-1.0);
    assert_eq!(player.position_ms(), 0);

    player.play();
    assert!(player.is_playing());
    player.stop();
    assert!(!player.is_playing());
    assert_eq!(player.position_ms(), 0);
}
