// MusicXML → MOM → scheduler

use notation_playback::playback::{flatten, CommandBuffer, ManualClock, VoicePool};
use notation_playback::{parse_musicxml, Clef, Element, Scheduler, SchedulerConfig};

const DUET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!DOCTYPE score-partwise PUBLIC "-//Recordare//DTD MusicXML 3.1 Partwise//EN" "http://www.musicxml.org/dtds/partwise.dtd">
<score-partwise version="3.1">
  <work><work-title>Duet</work-title></work>
  <identification><creator type="composer">Anon.</creator></identification>
  <part-list>
    <score-part id="P1"><part-name>Violin</part-name><part-abbreviation>Vln.</part-abbreviation></score-part>
    <score-part id="P2"><part-name>Cello</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes>
        <divisions>2</divisions>
        <key><fifths>1</fifths><mode>major</mode></key>
        <time><beats>2</beats><beat-type>4</beat-type></time>
        <clef><sign>G</sign><line>2</line></clef>
      </attributes>
      <direction placement="below"><direction-type><dynamics><p/></dynamics></direction-type><sound tempo="90"/></direction>
      <note><pitch><step>G</step><octave>4</octave></pitch><duration>2</duration><type>quarter</type></note>
      <note><pitch><step>F</step><alter>1</alter><octave>4</octave></pitch><duration>1</duration><type>eighth</type></note>
      <note><rest/><duration>1</duration></note>
    </measure>
    <measure number="2">
      <note><pitch><step>G</step><octave>4</octave></pitch><duration>4</duration></note>
      <barline location="right"><bar-style>light-heavy</bar-style></barline>
    </measure>
  </part>
  <part id="P2">
    <measure number="1">
      <attributes><divisions>1</divisions><clef><sign>F</sign><line>4</line></clef></attributes>
      <note><pitch><step>G</step><octave>2</octave></pitch><duration>2</duration></note>
    </measure>
    <measure number="2">
      <note><pitch><step>D</step><octave>3</octave></pitch><duration>1</duration></note>
      <note><chord/><pitch><step>G</step><octave>3</octave></pitch><duration>1</duration></note>
      <note><pitch><step>G</step><octave>2</octave></pitch><duration>1</duration></note>
    </measure>
  </part>
</score-partwise>"#;

#[test]
fn test_duet_header() {
    let outcome = parse_musicxml(DUET);
    assert!(outcome.is_ok(), "errors: {:?}", outcome.errors);
    let header = &outcome.mom.header;
    assert_eq!(header.title, "Duet");
    assert_eq!(header.composer.as_deref(), Some("Anon."));
    assert_eq!(header.key, "G");
    assert_eq!(header.meter, "2/4");
    assert_eq!(header.tempo_bpm(), Some(90.0));
    assert_eq!(header.voice("P1").and_then(|v| v.short_name.as_deref()), Some("Vln."));
    assert_eq!(header.voice("P2").map(|v| v.clef), Some(Clef::Bass));
}

#[test]
fn test_duet_measures() {
    let mom = parse_musicxml(DUET).mom;
    assert_eq!(mom.measures.len(), 2);
    assert_eq!(mom.measures[0].duration, 2.0);
    assert_eq!(mom.measures[1].start, 2.0);
    assert_eq!(mom.total_duration, 4.0);

    let violin: Vec<f64> = mom.voice_elements("P1").map(Element::start).collect();
    assert_eq!(violin, vec![0.0, 1.0, 1.5, 2.0]);

    let f_sharp = mom.voice_elements("P1").nth(1).and_then(|e| e.notes().first()).map(|n| n.midi);
    assert_eq!(f_sharp, Some(66));

    let velocities: Vec<f64> = mom.voice_elements("P1").flat_map(|e| e.notes()).map(|n| n.velocity).collect();
    assert!(velocities.iter().all(|v| (*v - velocities[0]).abs() < 1e-12));
    assert!(velocities[0] < 0.8);
}

#[test]
fn test_duet_plays_through_voice_pool() {
    let mom = parse_musicxml(DUET).mom;
    let events = flatten(&mom);
    assert_eq!(events.len(), 7);

    let clock = ManualClock::new(0.0);
    let mut scheduler = Scheduler::new(SchedulerConfig::default(), clock.clone());
    scheduler.load(&mom, mom.header.tempo_bpm().unwrap_or(120.0));

    let mut pool = VoicePool::new(2);
    let mut highlighter = CommandBuffer::default();
    scheduler.start().unwrap();
    scheduler.run_until_end(&mut pool, &mut highlighter, |delay| clock.advance(delay.as_secs_f64()));

    assert!(pool.peak() <= 2);
    // The cello chord on beat 2 overlaps the violin's G
    assert!(!pool.stolen().is_empty());
}
