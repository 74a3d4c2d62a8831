/// CPAL-based alert sound output (one audio thread per handle)
use crate::builtin;
use crate::decode::{self, DecodedSound, CHANNELS};
use crate::error::{AudioError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use klaxon_playback::{AudioBackend, AudioHandle, EventSink, HandleEvent};
use klaxon_source::{PlayableSource, ResolvedSource};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// No seek pending
const NO_SEEK: usize = usize::MAX;

/// Commands sent to the audio thread
enum AudioCommand {
    /// Build the stream if needed and start playing
    Play,
    /// Pause playback (position retained)
    Pause,
    /// Drop the stream and exit
    Shutdown,
}

/// State shared between a handle, its audio thread and the stream callback
pub(crate) struct Voice {
    sound: DecodedSound,
    /// Current frame
    position: AtomicUsize,
    /// Frame to jump to on the next callback, or `NO_SEEK`
    pending_seek: AtomicUsize,
    playing: AtomicBool,
    /// f32 bits
    volume: AtomicU32,
    looping: AtomicBool,
}

impl Voice {
    pub(crate) fn new(sound: DecodedSound) -> Self {
        Self {
            sound,
            position: AtomicUsize::new(0),
            pending_seek: AtomicUsize::new(NO_SEEK),
            playing: AtomicBool::new(false),
            volume: AtomicU32::new(1.0f32.to_bits()),
            looping: AtomicBool::new(false),
        }
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    fn set_volume(&self, volume: f32) {
        self.volume
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    /// Request a jump to `seconds`, clamped to the sound length.
    fn seek(&self, seconds: f64) {
        let frame = (seconds.max(0.0) * f64::from(self.sound.sample_rate())) as usize;
        self.pending_seek
            .store(frame.min(self.sound.frames()), Ordering::Release);
    }

    /// Frame the next callback will render from.
    pub(crate) fn frame(&self) -> usize {
        match self.pending_seek.load(Ordering::Acquire) {
            NO_SEEK => self.position.load(Ordering::Relaxed),
            frame => frame,
        }
    }

    /// Mark as playing, rewinding first when a previous run reached the end.
    /// Returns `false` if it was already playing.
    fn begin(&self) -> bool {
        if self.frame() >= self.sound.frames() {
            self.pending_seek.store(0, Ordering::Release);
        }
        !self.playing.swap(true, Ordering::AcqRel)
    }

    /// Returns `true` if it was playing.
    fn halt(&self) -> bool {
        self.playing.swap(false, Ordering::AcqRel)
    }
}

/// Fill `output` from `voice` (runs in the real-time audio callback).
///
/// Emits [`HandleEvent::Ended`] once when a non-looping sound runs out.
pub(crate) fn render(output: &mut [f32], channels: usize, voice: &Voice, events: &EventSink) {
    output.fill(0.0);

    let seek = voice.pending_seek.swap(NO_SEEK, Ordering::AcqRel);
    if seek != NO_SEEK {
        voice.position.store(seek, Ordering::Relaxed);
    }

    if channels == 0 || !voice.playing.load(Ordering::Acquire) {
        return;
    }

    let samples = voice.sound.samples();
    let frames = voice.sound.frames();
    let volume = voice.volume();
    let looping = voice.looping.load(Ordering::Relaxed);
    let mut pos = voice.position.load(Ordering::Relaxed);

    for out in output.chunks_mut(channels) {
        if pos >= frames {
            if looping && frames > 0 {
                pos = 0;
            } else {
                break;
            }
        }

        let left = samples[pos * CHANNELS] * volume;
        let right = samples[pos * CHANNELS + 1] * volume;
        if let [only] = out {
            *only = (left + right) * 0.5;
        } else {
            out[0] = left;
            out[1] = right;
        }
        pos += 1;
    }

    voice.position.store(pos, Ordering::Relaxed);

    if pos >= frames && !voice.looping.load(Ordering::Relaxed) && voice.halt() {
        events.emit(HandleEvent::Ended);
    }
}

/// Desktop [`AudioBackend`] on the default CPAL output device.
///
/// Sounds are decoded fully and converted to the device rate when a handle is
/// opened. Each handle plays through its own stream, owned by a dedicated
/// audio thread, because CPAL streams are not `Send` on every platform.
pub struct CpalBackend {
    config: StreamConfig,
    sample_rate: u32,
    asset_root: Option<PathBuf>,
}

impl CpalBackend {
    /// Create a backend for the default output device.
    ///
    /// # Errors
    /// Returns an error if no audio device is found or it cannot be queried.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::DeviceNotFound)?;

        let config = device.default_output_config()?;
        let sample_rate = config.sample_rate();
        let config = config.config();

        info!(
            sample_rate,
            channels = config.channels,
            "Using default audio output device"
        );

        Ok(Self {
            config,
            sample_rate,
            asset_root: None,
        })
    }

    /// Resolve relative file locations against `root`.
    #[must_use]
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    /// Output device sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Decode a resolved source at the device rate.
    pub fn load(&self, source: &ResolvedSource) -> Result<DecodedSound> {
        load_playable(
            &source.playable,
            &source.location,
            self.asset_root.as_deref(),
            self.sample_rate,
        )
    }
}

/// Decode `playable` and convert it to `sample_rate`.
pub fn load_playable(
    playable: &PlayableSource,
    location: &str,
    asset_root: Option<&Path>,
    sample_rate: u32,
) -> Result<DecodedSound> {
    let sound = match playable {
        PlayableSource::Builtin(name) => return builtin::synthesize(name, sample_rate),
        PlayableSource::File(path) => {
            let path = match asset_root {
                Some(root) if path.is_relative() => root.join(path),
                _ => path.clone(),
            };
            decode::decode_file(&path)?
        }
        PlayableSource::Data(uri) => decode::decode_data_uri(uri)?,
        PlayableSource::Buffer { url, bytes } => {
            debug!(buffer = %url, bytes = bytes.len(), "Decoding fetched sound");
            decode::decode_bytes(bytes.to_vec(), decode::extension_of(location))?
        }
    };
    sound.resampled(sample_rate)
}

impl AudioBackend for CpalBackend {
    fn open(
        &self,
        source: &ResolvedSource,
        events: EventSink,
    ) -> klaxon_playback::Result<Box<dyn AudioHandle>> {
        let sound = self.load(source)?;
        debug!(
            location = %source.location,
            seconds = sound.duration_secs(),
            "Opening audio handle"
        );
        let handle = CpalHandle::spawn(sound, self.config.clone(), events)?;
        Ok(Box::new(handle))
    }
}

/// A single decoded sound on its own output stream.
pub struct CpalHandle {
    voice: Arc<Voice>,
    command_tx: Sender<AudioCommand>,
    _audio_thread: Option<JoinHandle<()>>,
}

impl CpalHandle {
    fn spawn(sound: DecodedSound, config: StreamConfig, events: EventSink) -> Result<Self> {
        let voice = Arc::new(Voice::new(sound));
        let (command_tx, command_rx) = bounded::<AudioCommand>(32);

        let thread_voice = Arc::clone(&voice);
        let audio_thread = thread::Builder::new()
            .name("klaxon-audio".into())
            .spawn(move || audio_thread_run(config, thread_voice, events, command_rx))
            .map_err(|e| AudioError::AudioThread(e.to_string()))?;

        Ok(Self {
            voice,
            command_tx,
            _audio_thread: Some(audio_thread),
        })
    }

    fn send(&self, command: AudioCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| AudioError::AudioThread("audio thread has stopped".into()))
    }
}

impl AudioHandle for CpalHandle {
    fn start(&mut self) -> klaxon_playback::Result<()> {
        self.send(AudioCommand::Play)?;
        Ok(())
    }

    fn pause(&mut self) {
        if let Err(e) = self.send(AudioCommand::Pause) {
            warn!(error = %e, "Failed to pause audio");
        }
    }

    fn set_position(&mut self, seconds: f64) {
        self.voice.seek(seconds);
    }

    fn set_volume(&mut self, volume: f32) {
        self.voice.set_volume(volume);
    }

    fn set_looping(&mut self, looping: bool) {
        self.voice.looping.store(looping, Ordering::Relaxed);
    }

    fn release(&mut self) {
        self.voice.halt();
        // Thread may already be gone
        let _ = self.command_tx.send(AudioCommand::Shutdown);
    }
}

impl Drop for CpalHandle {
    fn drop(&mut self) {
        let _ = self.command_tx.send(AudioCommand::Shutdown);
    }
}

/// Audio thread main loop
///
/// Owns the CPAL stream. The stream is only built on the first `Play`, so an
/// opened but never played sound holds no device resources.
fn audio_thread_run(
    config: StreamConfig,
    voice: Arc<Voice>,
    events: EventSink,
    command_rx: Receiver<AudioCommand>,
) {
    let mut stream: Option<Stream> = None;

    while let Ok(cmd) = command_rx.recv() {
        match cmd {
            AudioCommand::Play => {
                if stream.is_none() {
                    match build_stream(&config, &voice, &events) {
                        Ok(s) => stream = Some(s),
                        Err(e) => {
                            error!(error = %e, "Failed to build output stream");
                            events.emit(HandleEvent::StartFailed {
                                message: e.to_string(),
                            });
                            continue;
                        }
                    }
                }

                let was_idle = voice.begin();
                if let Some(s) = &stream {
                    if let Err(e) = s.play() {
                        voice.halt();
                        events.emit(HandleEvent::StartFailed {
                            message: AudioError::from(e).to_string(),
                        });
                        continue;
                    }
                }
                if was_idle {
                    events.emit(HandleEvent::Playing);
                }
            }
            AudioCommand::Pause => {
                if voice.halt() {
                    events.emit(HandleEvent::Paused);
                }
                if let Some(s) = &stream {
                    if let Err(e) = s.pause() {
                        // Callback renders silence while not playing anyway
                        let e = AudioError::from(e);
                        debug!(error = %e, "Stream pause not supported");
                    }
                }
            }
            AudioCommand::Shutdown => break,
        }
    }

    drop(stream);
    debug!("Audio thread exiting");
}

fn build_stream(config: &StreamConfig, voice: &Arc<Voice>, events: &EventSink) -> Result<Stream> {
    let device = cpal::default_host()
        .default_output_device()
        .ok_or(AudioError::DeviceNotFound)?;

    let channels = usize::from(config.channels);
    let callback_voice = Arc::clone(voice);
    let callback_events = events.clone();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            render(data, channels, &callback_voice, &callback_events);
        },
        |err| error!(error = %err, "Audio stream error"),
        None,
    )?;
    Ok(stream)
}
