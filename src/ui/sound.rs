//! Sound engine: procedural cue sounds via rodio.
//!
//! Every cue is synthesized into an in-memory WAV buffer at init time and
//! played fire-and-forget on a detached Sink. Voice cues have no speech
//! synthesis behind them: they play an announcement chime and the renderer
//! shows their text as a subtitle.
//!
//! Build without the "sound" feature (or pass `--mute`) to disable audio;
//! the stub engine then ignores every cue.

use crate::sim::event::GameEvent;

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const SAMPLE_RATE: u32 = 22050;

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::debug;

    use super::{gen_announce, gen_tone, gen_triumph, make_wav, Wave};
    use crate::sim::event::GameEvent;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        volume: f32,
        sfx_hover: Arc<Vec<u8>>,
        sfx_click: Arc<Vec<u8>>,
        sfx_snap: Arc<Vec<u8>>,
        sfx_wrong: Arc<Vec<u8>>,
        sfx_typing: Arc<Vec<u8>>,
        sfx_triumph: Arc<Vec<u8>>,
        sfx_announce: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        /// `None` when no output device is available.
        pub fn new(volume: f32) -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    debug!(error = %e, "no audio output, cues disabled");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                volume,
                sfx_hover: Arc::new(make_wav(&gen_tone(Wave::Sine, 200.0, 0.1, 0.2))),
                sfx_click: Arc::new(make_wav(&gen_tone(Wave::Triangle, 800.0, 0.08, 0.3))),
                sfx_snap: Arc::new(make_wav(&gen_tone(Wave::Sine, 1200.0, 0.05, 0.4))),
                sfx_wrong: Arc::new(make_wav(&gen_tone(Wave::Saw, 150.0, 0.2, 0.3))),
                sfx_typing: Arc::new(make_wav(&gen_tone(Wave::Triangle, 440.0, 0.03, 0.05))),
                sfx_triumph: Arc::new(make_wav(&gen_triumph())),
                sfx_announce: Arc::new(make_wav(&gen_announce())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.set_volume(self.volume);
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_event(&self, event: &GameEvent) {
            match event {
                GameEvent::Hover => self.play(&self.sfx_hover),
                GameEvent::Click => self.play(&self.sfx_click),
                GameEvent::Snap => self.play(&self.sfx_snap),
                GameEvent::Wrong => self.play(&self.sfx_wrong),
                GameEvent::Typing => self.play(&self.sfx_typing),
                GameEvent::Triumph => self.play(&self.sfx_triumph),
                GameEvent::Welcome { .. }
                | GameEvent::Success { .. }
                | GameEvent::FinalCompletion { .. } => self.play(&self.sfx_announce),
                GameEvent::LevelCompleted { .. } => {}
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Waveform generators: mono f32 samples
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
#[derive(Clone, Copy, Debug)]
enum Wave {
    Sine,
    Triangle,
    Saw,
}

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn oscillate(wave: Wave, phase: f32) -> f32 {
    let frac = phase.fract();
    match wave {
        Wave::Sine => (phase * 2.0 * std::f32::consts::PI).sin(),
        Wave::Triangle => 1.0 - 4.0 * (frac - 0.5).abs(),
        Wave::Saw => 2.0 * frac - 1.0,
    }
}

/// One tone with an exponential decay to near silence over `duration`.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn gen_tone(wave: Wave, freq: f32, duration: f32, volume: f32) -> Vec<f32> {
    let n = (SAMPLE_RATE as f32 * duration) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 0.001_f32.powf(i as f32 / n as f32);
            oscillate(wave, t * freq) * env * volume
        })
        .collect()
}

/// C5, E5, G5, C6 arpeggio, 0.1 s per note.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn gen_triumph() -> Vec<f32> {
    [523.25_f32, 659.25, 783.99, 1046.5]
        .iter()
        .flat_map(|&f| gen_tone(Wave::Triangle, f, 0.1, 0.3))
        .collect()
}

/// Two-note chime played under a spoken line.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn gen_announce() -> Vec<f32> {
    let mut samples = gen_tone(Wave::Sine, 659.25, 0.12, 0.25);
    samples.extend(gen_tone(Wave::Sine, 987.77, 0.25, 0.25));
    samples
}

// ════════════════════════════════════════════════════════════
//  WAV encoder: wraps f32 samples into a 16-bit PCM buffer
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn make_wav(samples: &[f32]) -> Vec<u8> {
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
    let block_align = num_channels * bits_per_sample / 8;
    let data_size = samples.len() as u32 * 2;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&num_channels.to_le_bytes());
    buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &s in samples {
        let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        buf.extend_from_slice(&val.to_le_bytes());
    }
    buf
}

// ════════════════════════════════════════════════════════════
//  Public API: silent when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_volume: f32) -> Option<Self> { Some(SoundEngine) }
    pub fn play_event(&self, _event: &GameEvent) {}
}

/// Play the cue for every drained event. A missing engine is silence.
pub fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    if let Some(engine) = sound {
        for event in events {
            engine.play_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_is_well_formed() {
        let samples = gen_tone(Wave::Sine, 440.0, 0.01, 0.5);
        let wav = make_wav(&samples);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + samples.len() * 2);
    }

    #[test]
    fn tone_length_and_decay() {
        let samples = gen_tone(Wave::Saw, 150.0, 0.2, 0.3);
        assert_eq!(samples.len(), (SAMPLE_RATE as f32 * 0.2) as usize);
        assert!(samples.iter().all(|s| s.abs() <= 0.3 + f32::EPSILON));
        let tail = samples[samples.len() - 10..].iter().map(|s| s.abs()).fold(0.0, f32::max);
        assert!(tail < 0.01);
    }

    #[test]
    fn triumph_is_four_notes() {
        let note = gen_tone(Wave::Triangle, 523.25, 0.1, 0.3).len();
        assert_eq!(gen_triumph().len(), note * 4);
    }

    #[test]
    fn waves_stay_in_range() {
        for wave in [Wave::Sine, Wave::Triangle, Wave::Saw] {
            for i in 0..100 {
                let v = oscillate(wave, i as f32 * 0.037);
                assert!((-1.0..=1.0).contains(&v), "{wave:?} out of range: {v}");
            }
        }
    }

    #[test]
    fn missing_engine_is_silent() {
        process_sound_events(None, &[GameEvent::Click, GameEvent::Triumph]);
    }
}
