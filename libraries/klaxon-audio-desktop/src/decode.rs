//! Sound decoding
//!
//! Every sound is decoded up front into interleaved stereo f32 at the output
//! device rate. Alert sounds are short, so there is no streaming decoder.
//!
//! Sample formats are normalized per Symphonia buffer type and then go through
//! one shared interleaving routine (mono is duplicated, extra channels dropped).

use crate::error::{AudioError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

/// Output channel layout of every decoded sound
pub const CHANNELS: usize = 2;

/// Fully decoded sound, interleaved stereo f32
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSound {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl DecodedSound {
    /// Wrap interleaved stereo samples. A trailing half frame is dropped.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32) -> Self {
        samples.truncate(samples.len() - samples.len() % CHANNELS);
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / CHANNELS
    }

    /// Length in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Convert to `target_rate`. Returns `self` unchanged when rates match.
    pub fn resampled(self, target_rate: u32) -> Result<Self> {
        if self.sample_rate == target_rate || self.frames() == 0 {
            return Ok(self);
        }

        let frames = self.frames();
        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let mut resampler = SincFixedIn::<f32>::new(
            f64::from(target_rate) / f64::from(self.sample_rate),
            2.0,
            params,
            frames,
            CHANNELS,
        )
        .map_err(|e| AudioError::ResampleError(e.to_string()))?;

        // Deinterleave for rubato
        let mut deinterleaved = vec![Vec::with_capacity(frames); CHANNELS];
        for frame in self.samples.chunks_exact(CHANNELS) {
            for (channel, sample) in deinterleaved.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }

        let resampled = resampler
            .process(&deinterleaved, None)
            .map_err(|e| AudioError::ResampleError(e.to_string()))?;

        let output_frames = resampled[0].len();
        let mut interleaved = Vec::with_capacity(output_frames * CHANNELS);
        for frame_idx in 0..output_frames {
            for channel in resampled.iter().take(CHANNELS) {
                interleaved.push(channel[frame_idx]);
            }
        }

        debug!(
            from = self.sample_rate,
            to = target_rate,
            frames_in = frames,
            frames_out = output_frames,
            "Resampled sound"
        );
        Ok(Self::new(interleaved, target_rate))
    }
}

/// Decode an in-memory encoded sound. `extension` helps format detection.
pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedSound> {
    decode_source(Box::new(Cursor::new(bytes)), extension)
}

/// Decode a sound file from disk.
pub fn decode_file(path: &Path) -> Result<DecodedSound> {
    let file = File::open(path)?;
    let extension = path.extension().and_then(|e| e.to_str());
    decode_source(Box::new(file), extension)
}

/// Decode a base64 `data:` reference such as `data:audio/wav;base64,UklGR...`.
pub fn decode_data_uri(uri: &str) -> Result<DecodedSound> {
    let rest = uri
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .and_then(|_| uri.get(5..))
        .ok_or_else(|| AudioError::InvalidDataUri("missing data: scheme".into()))?;

    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AudioError::InvalidDataUri("missing ',' separator".into()))?;

    let mut params = meta.split(';');
    let mime = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(AudioError::InvalidDataUri(
            "audio payload must be base64-encoded".into(),
        ));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| AudioError::InvalidDataUri(e.to_string()))?;

    decode_bytes(bytes, extension_for_mime(&mime))
}

/// File extension hint for a MIME type.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/wav" | "audio/wave" | "audio/x-wav" | "audio/vnd.wave" => Some("wav"),
        "audio/ogg" | "application/ogg" => Some("ogg"),
        "audio/flac" | "audio/x-flac" => Some("flac"),
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => Some("m4a"),
        "audio/aac" => Some("aac"),
        _ => None,
    }
}

/// File extension of a URL or path, ignoring query and fragment.
pub fn extension_of(location: &str) -> Option<&str> {
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or(location);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (_, extension) = file_name.rsplit_once('.')?;
    (!extension.is_empty()).then_some(extension)
}

fn decode_source(source: Box<dyn MediaSource>, extension: Option<&str>) -> Result<DecodedSound> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(&ext.to_ascii_lowercase());
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;

    let mut reader = probed.format;
    let track = reader
        .default_track()
        .ok_or_else(|| AudioError::UnsupportedFormat("no audio track found".into()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;

    let mut samples = Vec::new();
    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AudioError::DecodeError(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if sample_rate.is_none() {
                    sample_rate = Some(decoded.spec().rate);
                }
                samples.extend(convert_to_f32_interleaved(decoded));
            }
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(error = %e, "Skipping undecodable packet");
            }
            Err(e) => return Err(AudioError::DecodeError(e.to_string())),
        }
    }

    if samples.is_empty() {
        return Err(AudioError::DecodeError("no audio decoded".into()));
    }

    let sound = DecodedSound::new(samples, sample_rate.unwrap_or(44_100));
    debug!(
        sample_rate = sound.sample_rate(),
        frames = sound.frames(),
        "Decoded sound"
    );
    Ok(sound)
}

/// Interleave a planar buffer to stereo f32 using `normalize` per sample.
fn interleave_to_stereo_f32<T, F>(buf: &AudioBuffer<T>, normalize: F) -> Vec<f32>
where
    T: Sample,
    F: Fn(T) -> f32,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    let mut output = Vec::with_capacity(frames * CHANNELS);

    let left = buf.chan(0);
    let right = if channels > 1 { buf.chan(1) } else { left };
    for (l, r) in left.iter().zip(right) {
        output.push(normalize(*l));
        output.push(normalize(*r));
    }

    output
}

/// Normalize any Symphonia sample format to [-1.0, 1.0] stereo.
fn convert_to_f32_interleaved(decoded: AudioBufferRef) -> Vec<f32> {
    match decoded {
        AudioBufferRef::F32(buf) => interleave_to_stereo_f32(&buf, |s| s),
        AudioBufferRef::F64(buf) => interleave_to_stereo_f32(&buf, |s| s as f32),

        AudioBufferRef::S8(buf) => interleave_to_stereo_f32(&buf, |s| s as f32 / i8::MAX as f32),
        AudioBufferRef::S16(buf) => {
            interleave_to_stereo_f32(&buf, |s| s as f32 / i16::MAX as f32)
        }
        AudioBufferRef::S24(buf) => {
            interleave_to_stereo_f32(&buf, |s| s.inner() as f32 / 8388607.0)
        }
        AudioBufferRef::S32(buf) => {
            interleave_to_stereo_f32(&buf, |s| s as f32 / i32::MAX as f32)
        }

        AudioBufferRef::U8(buf) => {
            interleave_to_stereo_f32(&buf, |s| (s as f32 / u8::MAX as f32) * 2.0 - 1.0)
        }
        AudioBufferRef::U16(buf) => {
            interleave_to_stereo_f32(&buf, |s| (s as f32 / u16::MAX as f32) * 2.0 - 1.0)
        }
        AudioBufferRef::U24(buf) => {
            interleave_to_stereo_f32(&buf, |s| (s.inner() as f32 / 16777215.0) * 2.0 - 1.0)
        }
        AudioBufferRef::U32(buf) => {
            interleave_to_stereo_f32(&buf, |s| (s as f32 / u32::MAX as f32) * 2.0 - 1.0)
        }
    }
}
