//! Sonant-x song JSON.
//!
//! Songs are stored as one object with the row length, song length and an
//! instrument array. Each instrument carries its synth parameters as flat
//! numeric fields, a sequence `p` of 1-based pattern indices and the
//! pattern pool `c`, where every pattern is `{ "n": [32 notes] }`.

use serde::Deserialize;
use sx_ir::{
    Delay, Envelope, Filter, FilterKind, Instrument, Lfo, Oscillator, Panning, Pattern, Song, Waveform,
    DEFAULT_ROW_LEN, PATTERN_ROWS, SAMPLE_RATE,
};

use crate::FormatError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SongJson {
    #[serde(default)]
    row_len: u32,
    end_pattern: u32,
    #[serde(default)]
    song_len: Option<f64>,
    song_data: Vec<InstrumentJson>,
}

#[derive(Debug, Deserialize)]
struct InstrumentJson {
    osc1_oct: u8,
    osc1_det: u8,
    osc1_detune: u8,
    osc1_xenv: u8,
    osc1_vol: u8,
    osc1_waveform: u8,
    osc2_oct: u8,
    osc2_det: u8,
    osc2_detune: u8,
    osc2_xenv: u8,
    osc2_vol: u8,
    osc2_waveform: u8,
    noise_fader: u8,
    env_attack: u32,
    env_sustain: u32,
    env_release: u32,
    env_master: u8,
    fx_filter: u8,
    fx_freq: u32,
    fx_resonance: u8,
    fx_delay_time: u8,
    fx_delay_amt: u8,
    fx_pan_freq: u8,
    fx_pan_amt: u8,
    lfo_osc1_freq: u8,
    lfo_fx_freq: u8,
    lfo_freq: u8,
    lfo_amt: u8,
    lfo_waveform: u8,
    #[serde(default)]
    p: Vec<u8>,
    #[serde(default)]
    c: Vec<PatternJson>,
}

#[derive(Debug, Deserialize)]
struct PatternJson {
    n: Vec<u8>,
}

/// Parse a sonant-x song.
///
/// A missing or zero `rowLen` falls back to the default tempo, and a
/// missing `songLen` is taken from the sequenced length. References to
/// patterns that don't exist are kept (they play as silence) and logged
/// as warnings along with any other song issues.
pub fn load_song_json(json: &str) -> Result<Song, FormatError> {
    let raw: SongJson = serde_json::from_str(json)?;

    let mut song = Song::new("");
    song.row_len = if raw.row_len == 0 { DEFAULT_ROW_LEN } else { raw.row_len };
    song.end_pattern = raw.end_pattern;
    for (index, inst) in raw.song_data.into_iter().enumerate() {
        song.instruments.push(convert_instrument(index, inst)?);
    }
    song.song_len = match raw.song_len {
        Some(len) => len,
        None => song.music_frames() as f64 / SAMPLE_RATE as f64,
    };

    log::debug!(
        "loaded song: {} instruments, {} measures, row length {}",
        song.instruments.len(),
        song.measures(),
        song.row_len
    );
    for issue in song.issues(SAMPLE_RATE) {
        log::warn!("{}", issue);
    }
    Ok(song)
}

fn convert_instrument(index: usize, raw: InstrumentJson) -> Result<Instrument, FormatError> {
    let waveform = |field: &'static str, value: u8| {
        Waveform::from_index(value).ok_or(FormatError::InvalidWaveform { instrument: index, field, value })
    };

    let mut inst = Instrument::new(&format!("instrument {}", index));

    inst.osc1 = Oscillator {
        waveform: waveform("osc1_waveform", raw.osc1_waveform)?,
        octave: raw.osc1_oct,
        semitone: raw.osc1_det,
        detune: raw.osc1_detune,
        volume: raw.osc1_vol,
        envelope_follow: raw.osc1_xenv != 0,
    };
    inst.osc2 = Oscillator {
        waveform: waveform("osc2_waveform", raw.osc2_waveform)?,
        octave: raw.osc2_oct,
        semitone: raw.osc2_det,
        detune: raw.osc2_detune,
        volume: raw.osc2_vol,
        envelope_follow: raw.osc2_xenv != 0,
    };
    inst.noise_fader = raw.noise_fader;
    inst.envelope = Envelope {
        attack: raw.env_attack,
        sustain: raw.env_sustain,
        release: raw.env_release,
        master: raw.env_master,
    };
    inst.filter = Filter {
        kind: FilterKind::from_index(raw.fx_filter)
            .ok_or(FormatError::InvalidFilter { instrument: index, value: raw.fx_filter })?,
        cutoff: raw.fx_freq,
        resonance: raw.fx_resonance,
    };
    inst.lfo = Lfo {
        waveform: waveform("lfo_waveform", raw.lfo_waveform)?,
        freq: raw.lfo_freq,
        amount: raw.lfo_amt,
        modulate_osc1: raw.lfo_osc1_freq != 0,
        modulate_filter: raw.lfo_fx_freq != 0,
    };
    inst.delay = Delay { time: raw.fx_delay_time, amount: raw.fx_delay_amt };
    inst.pan = Panning { freq: raw.fx_pan_freq, amount: raw.fx_pan_amt };

    inst.sequence = raw.p;
    for (pattern, pat) in raw.c.into_iter().enumerate() {
        let notes: [u8; PATTERN_ROWS] = pat.n.as_slice().try_into().map_err(|_| FormatError::PatternLength {
            instrument: index,
            pattern,
            len: pat.n.len(),
        })?;
        inst.patterns.push(Pattern::from_notes(notes));
    }
    Ok(inst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument_json(p: &str, c: &str) -> String {
        format!(
            r#"{{
                "osc1_oct": 7, "osc1_det": 0, "osc1_detune": 0, "osc1_xenv": 1, "osc1_vol": 255, "osc1_waveform": 0,
                "osc2_oct": 8, "osc2_det": 3, "osc2_detune": 10, "osc2_xenv": 0, "osc2_vol": 100, "osc2_waveform": 2,
                "noise_fader": 4,
                "env_attack": 50, "env_sustain": 150, "env_release": 4800, "env_master": 200,
                "fx_filter": 2, "fx_freq": 600, "fx_resonance": 254,
                "fx_delay_time": 4, "fx_delay_amt": 30,
                "fx_pan_freq": 3, "fx_pan_amt": 47,
                "lfo_osc1_freq": 0, "lfo_fx_freq": 1, "lfo_freq": 7, "lfo_amt": 64, "lfo_waveform": 3,
                "p": {p},
                "c": {c}
            }}"#
        )
    }

    fn pattern_json(notes: &[(usize, u8)]) -> String {
        let mut n = [0u8; 32];
        for &(row, note) in notes {
            n[row] = note;
        }
        format!(r#"{{ "n": {:?} }}"#, n)
    }

    fn song_json(row_len: u32, instruments: &[String]) -> String {
        format!(
            r#"{{ "rowLen": {}, "endPattern": 3, "songLen": 4.5, "songData": [{}] }}"#,
            row_len,
            instruments.join(",")
        )
    }

    #[test]
    fn loads_instrument_fields() {
        let json = song_json(2242, &[instrument_json("[1, 0]", &format!("[{}]", pattern_json(&[(0, 147)])))]);
        let song = load_song_json(&json).unwrap();

        assert_eq!(song.row_len, 2242);
        assert_eq!(song.end_pattern, 3);
        assert_eq!(song.song_len, 4.5);
        assert_eq!(song.instruments.len(), 1);

        let inst = &song.instruments[0];
        assert_eq!(inst.osc1.waveform, Waveform::Sine);
        assert_eq!(inst.osc1.octave, 7);
        assert!(inst.osc1.envelope_follow);
        assert_eq!(inst.osc2.waveform, Waveform::Saw);
        assert_eq!(inst.osc2.semitone, 3);
        assert_eq!(inst.osc2.detune, 10);
        assert!(!inst.osc2.envelope_follow);
        assert_eq!(inst.noise_fader, 4);
        assert_eq!(inst.envelope, Envelope { attack: 50, sustain: 150, release: 4800, master: 200 });
        assert_eq!(inst.filter, Filter { kind: FilterKind::LowPass, cutoff: 600, resonance: 254 });
        assert_eq!(inst.lfo.waveform, Waveform::Triangle);
        assert!(inst.lfo.modulate_filter);
        assert!(!inst.lfo.modulate_osc1);
        assert_eq!(inst.delay, Delay { time: 4, amount: 30 });
        assert_eq!(inst.pan, Panning { freq: 3, amount: 47 });
        assert_eq!(inst.sequence, vec![1, 0]);
        assert_eq!(inst.note_at(0, 0), Some(147));
        assert_eq!(inst.note_at(1, 0), None);
    }

    #[test]
    fn zero_row_len_uses_default() {
        let json = song_json(0, &[]);
        assert_eq!(load_song_json(&json).unwrap().row_len, DEFAULT_ROW_LEN);
    }

    #[test]
    fn missing_song_len_covers_the_sequence() {
        let json = r#"{ "rowLen": 4410, "endPattern": 3, "songData": [] }"#;
        let song = load_song_json(json).unwrap();
        // 2 measures of 32 rows at 0.1s each
        assert!((song.song_len - 6.4).abs() < 1e-9);
    }

    #[test]
    fn dangling_pattern_reference_is_kept() {
        let json = song_json(2242, &[instrument_json("[1, 5]", &format!("[{}]", pattern_json(&[])))]);
        let song = load_song_json(&json).unwrap();
        assert_eq!(song.instruments[0].sequence, vec![1, 5]);
        assert!(song.instruments[0].pattern_at(1).is_none());
    }

    #[test]
    fn short_pattern_rejected() {
        let json = song_json(2242, &[instrument_json("[1]", r#"[{ "n": [1, 2, 3] }]"#)]);
        match load_song_json(&json) {
            Err(FormatError::PatternLength { instrument: 0, pattern: 0, len: 3 }) => {}
            other => panic!("expected PatternLength, got {:?}", other),
        }
    }

    #[test]
    fn bad_waveform_rejected() {
        let json = song_json(2242, &[instrument_json("[]", "[]").replace(r#""lfo_waveform": 3"#, r#""lfo_waveform": 9"#)]);
        match load_song_json(&json) {
            Err(FormatError::InvalidWaveform { field: "lfo_waveform", value: 9, .. }) => {}
            other => panic!("expected InvalidWaveform, got {:?}", other),
        }
    }

    #[test]
    fn bad_filter_rejected() {
        let json = song_json(2242, &[instrument_json("[]", "[]").replace(r#""fx_filter": 2"#, r#""fx_filter": 5"#)]);
        assert!(matches!(load_song_json(&json), Err(FormatError::InvalidFilter { value: 5, .. })));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(load_song_json("{ \"rowLen\": 1"), Err(FormatError::Json(_))));
        assert!(matches!(load_song_json(r#"{ "rowLen": 1, "songData": [] }"#), Err(FormatError::Json(_))));
    }
}
