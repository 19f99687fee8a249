use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use portaudio::stream::{
    Duplex, DuplexCallbackArgs, DuplexSettings, NonBlocking, Parameters, Stream,
};
use portaudio::{Continue, PortAudio};

use crate::ring::SampleRing;

/// Loopback plays the microphone back this far behind real time.
pub const LOOPBACK_DELAY_SECS: f64 = 2.0;

pub struct CaptureOptions {
    pub device: Option<String>,
    pub sample_rate: Option<f64>,
    pub period: u32,
}

/// One live capture stream: the callback feeds the shared sample ring and
/// drives the delayed loopback path. Dropping the stream stops capture, so
/// it is held for the life of the session.
pub struct Capture {
    #[allow(dead_code)]
    stream: Stream<NonBlocking, Duplex<f32, f32>>,
    pub samples: Arc<Mutex<SampleRing>>,
    loopback: Arc<AtomicBool>,
}

impl Capture {
    /// Set the loopback gain path to unity (true) or zero (false).
    pub fn set_gain(&self, on: bool) {
        self.loopback.store(on, Ordering::Relaxed);
    }
}

/// Fixed-length delay used for the audible feedback path.
pub struct DelayLine {
    buf: Vec<f32>,
    pos: usize,
}

impl DelayLine {
    pub fn new(len: usize) -> DelayLine {
        DelayLine {
            buf: vec![0.0; len.max(1)],
            pos: 0,
        }
    }

    pub fn feed(&mut self, samp: f32) -> f32 {
        let out = self.buf[self.pos];
        self.buf[self.pos] = samp;
        self.pos = (self.pos + 1) % self.buf.len();
        out
    }
}

/// Open and start the one capture stream of the process. The input side is
/// mono and unprocessed; the output side carries the delayed loopback.
pub fn open(pa: &PortAudio, opts: &CaptureOptions, window: usize) -> Result<Capture> {
    let input = match &opts.device {
        Some(name) => {
            pa.devices()
                .context("listing devices")?
                .filter_map(Result::ok)
                .find(|(_, info)| info.name == name.as_str())
                .map(|(idx, _)| idx)
                .ok_or_else(|| anyhow!("no capture device named {:?}", name))?
        }
        None => pa
            .default_input_device()
            .context("getting default input device")?,
    };
    let output = pa
        .default_output_device()
        .context("getting default output device")?;
    let info = pa.device_info(input).context("getting device info")?;

    let rate = opts.sample_rate.unwrap_or(info.default_sample_rate);
    let in_params = Parameters::<f32>::new(input, 1, true, 0.0);
    let out_params = Parameters::<f32>::new(output, 2, true, 0.0);
    let settings = DuplexSettings::new(in_params, out_params, rate, opts.period);
    log::info!(
        "capturing {:?} at {} Hz, period {}",
        info.name,
        rate,
        opts.period
    );

    let samples = Arc::new(Mutex::new(SampleRing::new(window)));
    let loopback = Arc::new(AtomicBool::new(false));
    let mut delay = DelayLine::new((LOOPBACK_DELAY_SECS * rate) as usize);

    let mut stream = pa
        .open_non_blocking_stream(settings, {
            let samples = samples.clone();
            let loopback = loopback.clone();
            move |DuplexCallbackArgs {
                      in_buffer,
                      out_buffer,
                      frames,
                      ..
                  }| {
                assert_eq!(in_buffer.len(), frames);
                samples.lock().unwrap().push(in_buffer);

                let live = loopback.load(Ordering::Relaxed);
                for (&samp, out) in in_buffer.iter().zip(out_buffer.chunks_mut(2)) {
                    let fed = delay.feed(samp);
                    let fed = if live { fed } else { 0.0 };
                    for chan in out {
                        *chan = fed;
                    }
                }
                Continue
            }
        })
        .context("opening capture stream")?;
    stream.start().context("starting capture stream")?;

    Ok(Capture {
        stream,
        samples,
        loopback,
    })
}
