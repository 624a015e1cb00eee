//! Decode loop integration tests
//!
//! Each test runs the loop on its own thread against real track files and
//! drives it only through the state register, the way the controller does.


use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tapedeck_audio::{DecoderFactory, MemorySink, Mp3DecoderFactory, OutputSink};
use tapedeck_core::{PlaybackState, TrackList};
use tapedeck_playback::{DecodeLoop, DecodeLoopConfig, EndOfTrack, LoopStats, StateRegister};
use test_helpers::*;

// ===== Helpers =====

fn config(end_of_track: EndOfTrack) -> DecodeLoopConfig {
    DecodeLoopConfig {
        write_timeout: Duration::from_millis(20),
        idle_poll: Duration::from_millis(10),
        end_of_track,
    }
}

fn spawn_loop(
    register: &Arc<StateRegister>,
    tracks: Arc<TrackList>,
    decoders: Arc<dyn DecoderFactory>,
    sink: impl OutputSink + 'static,
    config: DecodeLoopConfig,
) -> JoinHandle<LoopStats> {
    let decode_loop = DecodeLoop::new(Arc::clone(register), tracks, decoders, Box::new(sink), config);
    thread::spawn(move || decode_loop.run())
}

fn stop(register: &StateRegister, handle: JoinHandle<LoopStats>) -> LoopStats {
    register.shutdown();
    handle.join().unwrap()
}

fn playing(index: u16) -> Arc<StateRegister> {
    Arc::new(StateRegister::new(PlaybackState::Playing, index))
}

// ===== Track playback =====

#[test]
fn plays_tagged_track_to_the_end() {
    let dir = TrackDir::new();
    let mut bytes = id3_tag(40);
    bytes.extend_from_slice(&[0x00, 0x01, 0x02]);
    bytes.extend(toy_track(0, 5, 4));
    let tracks = track_list(vec![dir.track("a.toy", &bytes)]);

    let register = playing(0);
    let sink = MemorySink::new();
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        sink.clone(),
        config(EndOfTrack::Stop),
    );

    let end = wait_for(&register, |s| s.state == PlaybackState::Stopped);
    let stats = stop(&register, handle);

    assert_eq!(end.index, 0);
    assert_eq!(stats.tracks_started, 1);
    assert_eq!(stats.frames_decoded, 5);
    assert_eq!(stats.track_failures, 0);

    let recording = sink.recording();
    assert_eq!(recording.configs, vec![(44_100, 16, 1)]);
    assert_eq!(recording.blocks.len(), 5);
    assert_eq!(recording.blocks[1], vec![1, 2, 3, 4]);
    assert!(recording.flushes >= 2, "sink silenced at start and release");
}

#[test]
fn advance_policy_walks_the_list_and_reconfigures_on_rate_change() {
    let dir = TrackDir::new();
    let tracks = track_list(vec![
        dir.track("44k.toy", &toy_track(0, 3, 2)),
        dir.track("48k.toy", &toy_track(1, 2, 2)),
        dir.missing("gone.toy"),
    ]);

    let register = playing(0);
    let sink = MemorySink::new();
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        sink.clone(),
        config(EndOfTrack::Advance),
    );

    // The missing third track parks the deck
    let end = wait_for(&register, |s| s.state == PlaybackState::Stopped);
    let stats = stop(&register, handle);

    assert_eq!(end.index, 2);
    assert_eq!(stats.tracks_started, 2);
    assert_eq!(stats.frames_decoded, 5);
    assert_eq!(stats.track_failures, 1);
    assert_eq!(
        sink.recording().configs,
        vec![(44_100, 16, 1), (48_000, 16, 1)]
    );
}

#[test]
fn advance_wraps_from_last_track_to_first() {
    let dir = TrackDir::new();
    let tracks = track_list(vec![
        dir.missing("first.toy"),
        dir.track("last.toy", &toy_track(0, 2, 2)),
    ]);

    let register = playing(1);
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        MemorySink::new(),
        config(EndOfTrack::Advance),
    );

    let end = wait_for(&register, |s| s.state == PlaybackState::Stopped);
    stop(&register, handle);
    assert_eq!(end.index, 0);
}

#[test]
fn repeat_policy_replays_the_track() {
    let dir = TrackDir::new();
    let tracks = track_list(vec![dir.track("loop.toy", &toy_track(0, 3, 2))]);

    let register = playing(0);
    let sink = MemorySink::new();
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        sink.clone(),
        config(EndOfTrack::Repeat),
    );

    wait_until("three passes", || sink.recording().blocks.len() >= 9);
    register.update(|_| (PlaybackState::HardStopped, 0));
    let stats = stop(&register, handle);

    assert!(stats.tracks_started >= 3);
    assert_eq!(stats.track_failures, 0);
}

// ===== Failures =====

#[test]
fn decode_error_with_advance_skips_to_next_track() {
    let dir = TrackDir::new();
    let mut broken = toy_track(0, 2, 2);
    broken.push(CORRUPT);
    broken.extend(toy_track(0, 5, 2));

    let tracks = track_list(vec![
        dir.track("broken.toy", &broken),
        dir.track("fine.toy", &toy_track(0, 3, 2)),
        dir.missing("gone.toy"),
    ]);

    let register = playing(0);
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        MemorySink::new(),
        config(EndOfTrack::Advance),
    );

    let end = wait_for(&register, |s| s.state == PlaybackState::Stopped);
    let stats = stop(&register, handle);

    assert_eq!(end.index, 2);
    assert_eq!(stats.frames_decoded, 5);
    assert_eq!(stats.track_failures, 2);
}

#[test]
fn decode_error_with_repeat_goes_idle() {
    let dir = TrackDir::new();
    let mut broken = toy_track(0, 2, 2);
    broken.push(CORRUPT);
    let tracks = track_list(vec![dir.track("broken.toy", &broken)]);

    let register = playing(0);
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        MemorySink::new(),
        config(EndOfTrack::Repeat),
    );

    let end = wait_for(&register, |s| s.state == PlaybackState::Stopped);
    let stats = stop(&register, handle);

    assert_eq!(end.index, 0);
    assert_eq!(stats.tracks_started, 1);
    assert_eq!(stats.frames_decoded, 2);
}

#[test]
fn broken_first_frame_with_advance_goes_idle() {
    let dir = TrackDir::new();
    let tracks = track_list(vec![dir.track("broken.toy", &[CORRUPT, 0, 0, 0])]);

    let register = playing(0);
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        MemorySink::new(),
        config(EndOfTrack::Advance),
    );

    let end = wait_for(&register, |s| s.state == PlaybackState::Stopped);
    thread::sleep(Duration::from_millis(50));
    let stats = stop(&register, handle);

    assert_eq!(end.index, 0);
    assert_eq!(register.load().state, PlaybackState::Stopped);
    assert_eq!(stats.tracks_started, 1);
    assert_eq!(stats.track_failures, 1);
}

#[test]
fn all_broken_tracks_with_advance_stop_at_first_failure() {
    let dir = TrackDir::new();
    let tracks = track_list(vec![
        dir.track("a.toy", &[CORRUPT, 1]),
        dir.track("b.toy", &[CORRUPT, 2]),
        dir.track("c.toy", &[CORRUPT, 3]),
    ]);

    let register = playing(1);
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        MemorySink::new(),
        config(EndOfTrack::Advance),
    );

    let end = wait_for(&register, |s| s.state == PlaybackState::Stopped);
    thread::sleep(Duration::from_millis(50));
    let stats = stop(&register, handle);

    assert_eq!(end.index, 1);
    assert_eq!(stats.tracks_started, 1);
}

#[test]
fn track_without_frames_goes_idle() {
    let dir = TrackDir::new();
    let tracks = track_list(vec![dir.track("noise.toy", &[0x01; 5000])]);

    let register = playing(0);
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        MemorySink::new(),
        config(EndOfTrack::Advance),
    );

    wait_for(&register, |s| s.state == PlaybackState::Stopped);
    let stats = stop(&register, handle);
    assert_eq!(stats.frames_decoded, 0);
    assert_eq!(stats.track_failures, 1);
}

#[test]
fn sink_timeouts_drop_blocks_without_stopping() {
    let dir = TrackDir::new();
    let tracks = track_list(vec![dir.track("a.toy", &toy_track(0, 4, 2))]);

    let register = playing(0);
    let sink = MemorySink::new();
    sink.reject_writes(true);
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        sink.clone(),
        config(EndOfTrack::Stop),
    );

    wait_for(&register, |s| s.state == PlaybackState::Stopped);
    let stats = stop(&register, handle);

    assert_eq!(stats.frames_decoded, 4);
    assert_eq!(stats.blocks_dropped, 4);
    assert_eq!(sink.recording().timeouts, 4);
}

// ===== Output format =====

#[test]
fn refused_configure_is_retried_on_next_frame() {
    let dir = TrackDir::new();
    let tracks = track_list(vec![dir.track("a.toy", &toy_track(0, 3, 2))]);

    let register = playing(0);
    let sink = RefusingSink::new(1);
    let recorded = sink.clone();
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        sink,
        config(EndOfTrack::Stop),
    );

    wait_for(&register, |s| s.state == PlaybackState::Stopped);
    stop(&register, handle);

    assert_eq!(recorded.attempts.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(recorded.inner.recording().configs, vec![(44_100, 16, 1)]);
}

#[test]
fn every_track_start_configures_the_sink() {
    let dir = TrackDir::new();
    let tracks = track_list(vec![dir.track("loop.toy", &toy_track(0, 2, 2))]);

    let register = playing(0);
    let sink = MemorySink::new();
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        sink.clone(),
        config(EndOfTrack::Repeat),
    );

    wait_until("two passes", || sink.recording().blocks.len() >= 4);
    register.update(|_| (PlaybackState::HardStopped, 0));
    stop(&register, handle);

    let configs = sink.recording().configs;
    assert!(configs.len() >= 2, "configured once per pass: {configs:?}");
    assert!(configs.iter().all(|c| *c == (44_100, 16, 1)));
}

// ===== Commands at frame boundaries =====

#[test]
fn pause_holds_position_and_resumes_in_place() {
    let dir = TrackDir::new();
    let tracks = track_list(vec![dir.track("long.toy", &toy_track(0, 200, 2))]);

    let register = playing(0);
    let sink = SlowSink::new(Duration::from_millis(1));
    let recorded = sink.inner.clone();
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        sink,
        config(EndOfTrack::Stop),
    );

    wait_until("playback", || recorded.samples_written() > 0);
    register.update(|s| (PlaybackState::Stopped, s.index));

    thread::sleep(Duration::from_millis(50));
    let paused_at = recorded.samples_written();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(recorded.samples_written(), paused_at, "no output while paused");
    assert!(paused_at < 400, "paused before the end");

    register.update(|s| (PlaybackState::Playing, s.index));
    wait_until("track end", || recorded.samples_written() == 400);
    wait_for(&register, |s| s.state == PlaybackState::Stopped);
    let stats = stop(&register, handle);

    assert_eq!(stats.tracks_started, 1);
    assert_eq!(stats.frames_decoded, 200);
}

#[test]
fn hard_stop_releases_track_and_idles() {
    let dir = TrackDir::new();
    let tracks = track_list(vec![
        dir.track("a.toy", &toy_track(0, 500, 2)),
        dir.track("b.toy", &toy_track(0, 500, 2)),
    ]);

    let register = playing(1);
    let sink = SlowSink::new(Duration::from_millis(1));
    let recorded = sink.inner.clone();
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        sink,
        config(EndOfTrack::Advance),
    );

    wait_until("playback", || recorded.samples_written() > 0);
    register.update(|_| (PlaybackState::HardStopped, 0));

    thread::sleep(Duration::from_millis(50));
    let stopped_at = recorded.samples_written();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(recorded.samples_written(), stopped_at);

    let stats = stop(&register, handle);
    assert_eq!(stats.tracks_started, 1);
    assert!(stats.frames_decoded < 500);
    assert_eq!(register.load().state, PlaybackState::HardStopped);
}

#[test]
fn advance_request_restarts_on_new_index() {
    let dir = TrackDir::new();
    let tracks = track_list(vec![
        dir.track("long.toy", &toy_track(0, 500, 2)),
        dir.track("short.toy", &toy_track(0, 3, 2)),
    ]);

    let register = playing(0);
    let sink = SlowSink::new(Duration::from_millis(1));
    let recorded = sink.inner.clone();
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        sink,
        config(EndOfTrack::Stop),
    );

    wait_until("playback", || recorded.samples_written() > 0);
    register.update(|_| (PlaybackState::AdvanceNext, 1));

    let end = wait_for(&register, |s| s.state == PlaybackState::Stopped);
    let stats = stop(&register, handle);

    assert_eq!(end.index, 1);
    assert_eq!(stats.tracks_started, 2);
}

#[test]
fn idle_loop_wakes_on_toggle_and_exits_on_shutdown() {
    let dir = TrackDir::new();
    let tracks = track_list(vec![dir.track("a.toy", &toy_track(0, 2, 2))]);

    let register = Arc::new(StateRegister::new(PlaybackState::Stopped, 0));
    let sink = MemorySink::new();
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(ToyDecoderFactory),
        sink.clone(),
        config(EndOfTrack::Stop),
    );

    // Idle flushes keep coming while nothing plays
    wait_until("idle flushes", || sink.recording().flushes >= 3);
    assert!(sink.recording().blocks.is_empty());

    register.update(|s| (PlaybackState::Playing, s.index));
    wait_until("playback", || sink.recording().blocks.len() == 2);
    wait_for(&register, |s| s.state == PlaybackState::Stopped);

    let stats = stop(&register, handle);
    assert_eq!(stats.tracks_started, 1);
}

// ===== Real MP3 =====

#[test]
fn plays_mp3_frames_through_symphonia() {
    let dir = TrackDir::new();
    let mut bytes = id3_tag(100);
    for _ in 0..3 {
        let mut frame = vec![0xFF, 0xFB, 0x90, 0x64];
        frame.resize(417, 0);
        bytes.extend(frame);
    }
    let tracks = track_list(vec![dir.track("silence.mp3", &bytes)]);

    let register = playing(0);
    let sink = MemorySink::new();
    let handle = spawn_loop(
        &register,
        tracks,
        Arc::new(Mp3DecoderFactory),
        sink.clone(),
        config(EndOfTrack::Stop),
    );

    wait_for(&register, |s| s.state == PlaybackState::Stopped);
    let stats = stop(&register, handle);

    assert_eq!(stats.frames_decoded, 3);
    let recording = sink.recording();
    assert_eq!(recording.configs, vec![(44_100, 16, 2)]);
    assert_eq!(recording.blocks.len(), 3);
    assert!(recording.blocks.iter().all(|b| b.len() == 2304));
}
