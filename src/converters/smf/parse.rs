//! Chunk walk, event decoding and note pairing

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::reader::Cursor;
use super::tempo_map::{TempoChange, TempoMap};
use super::{Result, SmfError};

const HEADER_TAG: &[u8; 4] = b"MThd";
const TRACK_TAG: &[u8; 4] = b"MTrk";
const HEADER_LENGTH: u32 = 6;

/// Status bytes below this are data (running status)
const STATUS_THRESHOLD: u8 = 0x80;

const META_END_OF_TRACK: u8 = 0x2F;
const META_TEMPO: u8 = 0x51;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SmfHeader {
    pub format: u16,
    pub tracks: u16,
    /// Ticks per quarter note
    pub division: u16,
    /// Division declared as timecode (top bit set)
    pub timecode: bool,
}

/// A paired note-on/note-off with times in seconds
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResolvedNote {
    pub track: usize,
    pub channel: u8,
    pub key: u8,
    /// Velocity of the opening note-on (1..=127)
    pub velocity: u8,
    pub start_tick: u64,
    pub end_tick: u64,
    pub start: f64,
    pub duration: f64,
}

impl ResolvedNote {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SmfParse {
    pub header: SmfHeader,
    pub tempo_map: TempoMap,
    pub notes: Vec<ResolvedNote>,
}

/// A note paired in ticks, before the tempo map is known
struct TickNote {
    track: usize,
    channel: u8,
    key: u8,
    velocity: u8,
    start_tick: u64,
    end_tick: u64,
}

#[derive(Default)]
struct TrackEvents {
    notes: Vec<TickNote>,
    tempos: Vec<TempoChange>,
}

/// Resolved notes only, sorted by start time
pub fn parse_smf_notes(bytes: &[u8]) -> Result<Vec<ResolvedNote>> {
    parse_smf(bytes).map(|parsed| parsed.notes)
}

/// Parse SMF bytes into header info, tempo map and resolved notes
pub fn parse_smf(bytes: &[u8]) -> Result<SmfParse> {
    let mut cursor = Cursor::new(bytes);
    let header = read_header(&mut cursor)?;

    let mut notes = Vec::new();
    let mut tempos = Vec::new();
    let mut track_index = 0;

    while !cursor.is_empty() && track_index < header.tracks as usize {
        let tag = cursor.tag("chunk signature")?;
        let length = cursor.u32("chunk length")? as usize;
        let mut chunk = cursor.take(length, "chunk body")?;

        if &tag != TRACK_TAG {
            log::debug!("skipping {} byte chunk {:?}", length, String::from_utf8_lossy(&tag));
            continue;
        }

        let events = decode_track(&mut chunk, track_index)?;
        log::debug!(
            "track {}: {} notes, {} tempo changes",
            track_index,
            events.notes.len(),
            events.tempos.len()
        );
        notes.extend(events.notes);
        tempos.extend(events.tempos);
        track_index += 1;
    }

    if track_index < header.tracks as usize {
        log::warn!("header declares {} tracks, found {}", header.tracks, track_index);
    }
    if !cursor.is_empty() {
        log::debug!("ignoring {} bytes after the last declared track", cursor.remaining());
    }

    let tempo_map = TempoMap::new(header.division, tempos);
    let mut resolved: Vec<ResolvedNote> = notes
        .into_iter()
        .map(|note| {
            // Both ends go through the same conversion so durations are exact
            let start = tempo_map.seconds_at(note.start_tick);
            let end = tempo_map.seconds_at(note.end_tick);
            ResolvedNote {
                track: note.track,
                channel: note.channel,
                key: note.key,
                velocity: note.velocity,
                start_tick: note.start_tick,
                end_tick: note.end_tick,
                start,
                duration: end - start,
            }
        })
        .collect();
    resolved.sort_by(|a, b| a.start.total_cmp(&b.start));

    log::info!("parsed SMF: {} tracks, {} notes", track_index, resolved.len());
    Ok(SmfParse { header, tempo_map, notes: resolved })
}

fn read_header(cursor: &mut Cursor) -> Result<SmfHeader> {
    let tag = cursor.tag("header signature").map_err(|_| SmfError::MissingHeader)?;
    if &tag != HEADER_TAG {
        return Err(SmfError::MissingHeader);
    }
    let length = cursor.u32("header length")?;
    if length != HEADER_LENGTH {
        return Err(SmfError::BadHeaderLength(length));
    }

    let format = cursor.u16("format")?;
    let tracks = cursor.u16("track count")?;
    let raw_division = cursor.u16("division")?;

    let timecode = raw_division & 0x8000 != 0;
    if timecode {
        log::warn!("timecode division {:#06x} is not interpreted; using it as ticks per quarter", raw_division);
    }
    let division = raw_division & 0x7FFF;
    if division == 0 {
        return Err(SmfError::ZeroDivision);
    }

    Ok(SmfHeader { format, tracks, division, timecode })
}

fn decode_track(cursor: &mut Cursor, track: usize) -> Result<TrackEvents> {
    let mut events = TrackEvents::default();
    let mut open: HashMap<(u8, u8), (u64, u8)> = HashMap::new();
    let mut running_status: Option<u8> = None;
    let mut tick: u64 = 0;

    while !cursor.is_empty() {
        tick += cursor.vlq("delta time")? as u64;

        let mut status = cursor.u8("status")?;
        if status < STATUS_THRESHOLD {
            status = running_status.ok_or(SmfError::NoRunningStatus { offset: cursor.position() - 1 })?;
            cursor.step_back();
        }

        match status {
            0x80..=0xEF => {
                running_status = Some(status);
                let channel = status & 0x0F;
                match status & 0xF0 {
                    0x80 => {
                        let key = cursor.u8("note number")? & 0x7F;
                        cursor.u8("release velocity")?;
                        close_note(&mut open, &mut events, track, channel, key, tick);
                    }
                    0x90 => {
                        let key = cursor.u8("note number")? & 0x7F;
                        let velocity = cursor.u8("velocity")? & 0x7F;
                        if velocity == 0 {
                            close_note(&mut open, &mut events, track, channel, key, tick);
                        } else {
                            open.insert((channel, key), (tick, velocity));
                        }
                    }
                    // Program change, channel pressure
                    0xC0 | 0xD0 => cursor.skip(1, "channel message")?,
                    // Aftertouch, control change, pitch bend
                    _ => cursor.skip(2, "channel message")?,
                }
            }
            0xFF => {
                let kind = cursor.u8("meta type")?;
                let length = cursor.vlq("meta length")? as usize;
                if kind == META_TEMPO && length == 3 {
                    let micros_per_quarter = cursor.u24("tempo")?;
                    events.tempos.push(TempoChange { tick, micros_per_quarter });
                } else {
                    cursor.skip(length, "meta payload")?;
                }
                if kind == META_END_OF_TRACK {
                    break;
                }
            }
            0xF0 | 0xF7 => {
                let length = cursor.vlq("sysex length")? as usize;
                cursor.skip(length, "sysex payload")?;
            }
            other => log::debug!("track {}: ignoring system status {:#04x}", track, other),
        }
    }

    if !open.is_empty() {
        log::debug!("track {}: dropping {} unterminated notes", track, open.len());
    }
    Ok(events)
}

fn close_note(
    open: &mut HashMap<(u8, u8), (u64, u8)>,
    events: &mut TrackEvents,
    track: usize,
    channel: u8,
    key: u8,
    tick: u64,
) {
    if let Some((start_tick, velocity)) = open.remove(&(channel, key)) {
        events.notes.push(TickNote { track, channel, key, velocity, start_tick, end_tick: tick });
    }
}
