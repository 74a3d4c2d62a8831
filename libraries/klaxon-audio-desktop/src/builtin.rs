//! Built-in alert sounds, synthesized at the output rate
//!
//! `builtin:flip-flap` is the default alert sound: a short burst of
//! mechanical clacks like a split-flap display turning over.

use crate::decode::{DecodedSound, CHANNELS};
use crate::error::{AudioError, Result};
use std::f32::consts::TAU;

/// Names accepted after the `builtin:` scheme
pub const BUILTIN_SOUNDS: [&str; 2] = ["flip-flap", "beep"];

/// Name of the default alert sound
pub const DEFAULT_SOUND: &str = "flip-flap";

/// Flaps per burst
const FLAPS: usize = 8;
/// Seconds between flaps
const FLAP_INTERVAL: f32 = 0.07;
/// Audible length of a single flap
const FLAP_LENGTH: f32 = 0.035;

/// Render built-in sound `name` at `sample_rate`.
pub fn synthesize(name: &str, sample_rate: u32) -> Result<DecodedSound> {
    if sample_rate == 0 {
        return Err(AudioError::DeviceError("output sample rate is zero".into()));
    }
    let samples = match name {
        "flip-flap" => flip_flap(sample_rate),
        "beep" => beep(sample_rate),
        other => return Err(AudioError::UnknownBuiltin(other.to_string())),
    };
    Ok(DecodedSound::new(samples, sample_rate))
}

fn flip_flap(sample_rate: u32) -> Vec<f32> {
    let rate = sample_rate as f32;
    let total = ((FLAPS as f32 * FLAP_INTERVAL + FLAP_LENGTH) * rate) as usize;
    let mut samples = vec![0.0; total * CHANNELS];

    for flap in 0..FLAPS {
        let start = (flap as f32 * FLAP_INTERVAL * rate) as usize;
        let length = (FLAP_LENGTH * rate) as usize;
        // Alternate pitch and pan slightly so the clacks don't sound identical
        let pitch = if flap % 2 == 0 { 1.0 } else { 1.12 };
        let (left_gain, right_gain) = if flap % 2 == 0 { (1.0, 0.8) } else { (0.8, 1.0) };

        for i in 0..length {
            let t = i as f32 / rate;
            let envelope = (-t * 140.0).exp();
            let body = (TAU * 1_750.0 * pitch * t).sin() + 0.6 * (TAU * 3_100.0 * pitch * t).sin();
            let thump = 0.8 * (TAU * 180.0 * t).sin() * (-t * 60.0).exp();
            let value = 0.35 * envelope * body + 0.25 * thump;

            let frame = (start + i) * CHANNELS;
            if frame + 1 >= samples.len() {
                break;
            }
            samples[frame] += value * left_gain;
            samples[frame + 1] += value * right_gain;
        }
    }

    for sample in &mut samples {
        *sample = sample.clamp(-1.0, 1.0);
    }
    samples
}

fn beep(sample_rate: u32) -> Vec<f32> {
    let rate = sample_rate as f32;
    let frames = (0.4 * rate) as usize;
    let fade = (0.01 * rate).max(1.0);

    let mut samples = Vec::with_capacity(frames * CHANNELS);
    for i in 0..frames {
        let t = i as f32 / rate;
        let edge = (i as f32 / fade)
            .min((frames - i) as f32 / fade)
            .min(1.0);
        let value = 0.5 * edge * (TAU * 880.0 * t).sin();
        samples.push(value);
        samples.push(value);
    }
    samples
}
