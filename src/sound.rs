use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SoundError {
    #[error("no audio output device available")]
    NoDevice,
    #[error(transparent)]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error(transparent)]
    Build(#[from] cpal::BuildStreamError),
    #[error(transparent)]
    Play(#[from] cpal::PlayStreamError),
    #[error(transparent)]
    Pause(#[from] cpal::PauseStreamError),
    #[error("unsupported sample format {0}")]
    UnsupportedFormat(cpal::SampleFormat),
}

/// Buzzer adapter: a 440 Hz sine stream held paused until the machine's
/// sound timer is live.
pub struct Buzzer {
    stream: cpal::Stream,
    playing: bool,
}

impl Buzzer {
    pub fn new() -> Result<Self, SoundError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(SoundError::NoDevice)?;
        let config = device.default_output_config()?;
        let stream = match config.sample_format() {
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config.into())?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config.into())?,
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config.into())?,
            other => return Err(SoundError::UnsupportedFormat(other)),
        };
        stream.pause()?;
        Ok(Self {
            stream,
            playing: false,
        })
    }

    /// Start or stop the tone to match the machine's sound timer.
    pub fn set_active(&mut self, on: bool) -> Result<(), SoundError> {
        if on == self.playing {
            return Ok(());
        }
        if on {
            self.stream.play()?;
        } else {
            self.stream.pause()?;
        }
        self.playing = on;
        Ok(())
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
) -> Result<cpal::Stream, SoundError>
where
    T: SizedSample + FromSample<f32>,
{
    let sample_rate = config.sample_rate.0 as f32;
    let channels = config.channels as usize;

    let mut sample_clock = 0f32;
    let mut next_value = move || {
        sample_clock = (sample_clock + 1.0) % sample_rate;
        (sample_clock * 440.0 * 2.0 * std::f32::consts::PI / sample_rate).sin()
    };

    let err_fn = |err| log::error!("audio stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(channels) {
                let value: T = T::from_sample(next_value());
                for sample in frame.iter_mut() {
                    *sample = value;
                }
            }
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}
