// Scheduler driven end to end from parsed scores

use notation_playback::playback::{Clock, Command, CommandBuffer, ManualClock, PlaybackState, Tick, VoicePool};
use notation_playback::{parse_smf, parse_text_notation, Scheduler, SchedulerConfig};

fn note_on_times(commands: &[Command]) -> Vec<f64> {
    commands
        .iter()
        .filter_map(|c| match c {
            Command::NoteOn { at_time, .. } => Some(*at_time),
            _ => None,
        })
        .collect()
}

#[test]
fn test_voice_ceiling_steals_earliest() {
    let mom = parse_text_notation("X:1\nL:1/4\nK:C\n[CEGce]|\n").mom;
    let clock = ManualClock::new(0.0);
    let config = SchedulerConfig { max_voices: 3, ..SchedulerConfig::default() };
    let mut pool = VoicePool::new(config.max_voices);
    let mut scheduler = Scheduler::new(config, clock.clone());
    scheduler.load(&mom, 120.0);

    let first_two: Vec<String> = scheduler.events().iter().take(2).map(|e| e.id.clone()).collect();

    let mut highlighter = CommandBuffer::default();
    scheduler.start().unwrap();
    scheduler.run_until_end(&mut pool, &mut highlighter, |delay| clock.advance(delay.as_secs_f64()));

    assert_eq!(pool.peak(), 3);
    assert_eq!(pool.stolen(), first_two.as_slice());
    assert_eq!(pool.pitches_at(0.0), vec![67, 72, 76]);
}

#[test]
fn test_pause_excludes_paused_interval() {
    let mom = parse_text_notation("X:1\nL:1\nK:C\nC D E|\n").mom;
    let clock = ManualClock::new(10.0);
    let mut scheduler = Scheduler::new(SchedulerConfig::default(), clock.clone());
    scheduler.load(&mom, 60.0);

    let mut engine = CommandBuffer::default();
    let mut highlighter = CommandBuffer::default();
    scheduler.start().unwrap();
    scheduler.tick(&mut engine, &mut highlighter);

    clock.set(10.5);
    scheduler.pause().unwrap();
    clock.set(30.5);
    scheduler.resume().unwrap();

    let ticks = scheduler.run_until_end(&mut engine, &mut highlighter, |delay| clock.advance(delay.as_secs_f64()));
    assert!(ticks > 1);
    assert_eq!(scheduler.state(), PlaybackState::Idle);

    let times = note_on_times(engine.commands());
    assert_eq!(times, vec![10.0, 31.0, 32.0]);
    assert_eq!(times[2] - times[1], 1.0);
    // Finished three beats of playback after a 20 second pause
    assert!(clock.now() >= 33.0);
    assert!(clock.now() < 33.1);
}

#[test]
fn test_reload_invalidates_previous_generation() {
    let clock = ManualClock::new(0.0);
    let mut scheduler = Scheduler::new(SchedulerConfig::default(), clock);
    let first = scheduler.load(&parse_text_notation("K:C\nC|\n").mom, 120.0);
    let second = scheduler.load(&parse_text_notation("K:C\nD|\n").mom, 120.0);
    assert!(!scheduler.is_current(first));
    assert!(scheduler.is_current(second));
}

#[test]
fn test_midi_notes_play_at_their_file_times() {
    // One quarter note at tick 480, 480 ticks per quarter, default tempo
    let mut bytes = b"MThd".to_vec();
    bytes.extend_from_slice(&[0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0]);
    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&[0, 0, 0, 13]);
    bytes.extend_from_slice(&[0x83, 0x60, 0x90, 60, 100]);
    bytes.extend_from_slice(&[0x83, 0x60, 60, 0]);
    bytes.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
    let parsed = parse_smf(&bytes).unwrap();

    let clock = ManualClock::new(0.0);
    let mut scheduler = Scheduler::new(SchedulerConfig::default(), clock.clone());
    scheduler.load_resolved(&parsed.notes, parsed.tempo_map.initial_bpm());

    let mut engine = CommandBuffer::default();
    let mut highlighter = CommandBuffer::default();
    scheduler.start().unwrap();
    assert!(matches!(scheduler.tick(&mut engine, &mut highlighter), Tick::Rearm(_)));
    assert!(engine.is_empty());

    clock.set(0.45);
    scheduler.tick(&mut engine, &mut highlighter);
    assert_eq!(note_on_times(engine.commands()), vec![0.5]);
}
