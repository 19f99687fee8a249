#[macro_use]
extern crate clap;

mod analyzer;
mod capture;
mod heatmap;
mod ring;
mod spectrum;
mod surface;
mod view;
mod window;

use std::{thread, time::{Duration, Instant}};

use anyhow::{anyhow, ensure, Context, Result};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::messagebox::{show_simple_message_box, MessageBoxFlag};

use capture::CaptureOptions;
use heatmap::Rgba;
use spectrum::SpectrumSource;
use view::{waterfall::Waterfall, Info, View};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let parser_yaml = load_yaml!("args.yml");
    let parser = clap::App::from_yaml(parser_yaml);
    let matches = parser.get_matches();

    let windows = window::windows();
    // Take care of listing options first
    if matches.is_present("list-win") {
        for name in windows.keys() {
            println!("{}", name);
        }
        return Ok(());
    }

    let pa = portaudio::PortAudio::new().context("initializing PortAudio")?;
    if matches.is_present("list-dev") {
        for dev in pa.devices().context("listing devices")? {
            if let Ok((idx, info)) = dev {
                // Only input devices
                if info.max_input_channels == 0 {
                    continue;
                }
                println!(
                    "{:?}: {} (default {} Hz, up to {} channels)",
                    idx, info.name, info.default_sample_rate, info.max_input_channels
                );
            } else {
                eprintln!("(error enumerating device)");
            }
        }
        return Ok(());
    }

    let init_width: u32 = matches
        .value_of("width")
        .unwrap_or("800")
        .parse()
        .context("parsing initial width")?;
    let init_height: u32 = matches
        .value_of("height")
        .unwrap_or("600")
        .parse()
        .context("parsing initial height")?;
    let gfx_rate: f64 = matches
        .value_of("gfx-rate")
        .unwrap_or("60")
        .parse()
        .context("parsing frame rate")?;
    ensure!(gfx_rate > 0.0, "frame rate must be positive");

    let win_name = matches.value_of("fft-win").unwrap_or("blackman");
    let window_fn = *windows
        .get(win_name)
        .ok_or_else(|| anyhow!("unknown window function {:?}", win_name))?;

    let opts = CaptureOptions {
        device: matches.value_of("aud-dev").map(String::from),
        sample_rate: matches
            .value_of("aud-rate")
            .map(|rate| rate.parse().context("parsing sample rate"))
            .transpose()?,
        period: matches
            .value_of("aud-period")
            .unwrap_or("256")
            .parse()
            .context("parsing audio period")?,
    };

    let sdl = sdl2::init().map_err(anyhow::Error::msg)?;
    let sdl_video = sdl.video().map_err(anyhow::Error::msg)?;
    let spec_win = sdl_video
        .window("specfall", init_width, init_height)
        .position_centered()
        .resizable()
        .build()
        .context("creating window")?;
    let spec_can = spec_win.into_canvas().build().context("creating canvas")?;

    // Capture denial is terminal: report it once, then keep the window
    // alive with the pipeline dark.
    let mut source = match SpectrumSource::initialize(&pa, &opts, window_fn) {
        Ok(source) => Some(source),
        Err(err) => {
            log::error!("audio capture unavailable: {:#}", err);
            let notice = format!("Audio capture unavailable:\n{:#}", err);
            if let Err(box_err) = show_simple_message_box(
                MessageBoxFlag::ERROR,
                "specfall",
                &notice,
                spec_can.window(),
            ) {
                log::warn!("showing capture failure notice: {}", box_err);
            }
            None
        }
    };

    let mut waterfall = Waterfall::new(spec_can);
    let mut eloop = sdl.event_pump().map_err(anyhow::Error::msg)?;
    let rate = Duration::new(1, 0).div_f64(gfx_rate);
    let mut column: Vec<Rgba> = Vec::new();
    let mut muted = true;

    'main: loop {
        let deadline = Instant::now() + rate;

        for event in eloop.poll_iter() {
            match event {
                Event::Quit { .. } => break 'main,
                Event::KeyDown {
                    keycode: Some(Keycode::M),
                    repeat: false,
                    ..
                } => {
                    muted = !muted;
                    log::info!("loopback {}", if muted { "muted" } else { "unmuted" });
                }
                _ => (),
            }
        }

        if let Some(src) = source.as_mut() {
            src.set_mute(muted);
            src.set_target_resolution(waterfall.requested_height());

            let frame = src.pull();
            column.clear();
            column.extend(frame.iter().map(|&m| heatmap::map(m)));
            waterfall.render(&Info {
                column: Some(&column),
            });
        } else {
            // Not ready: no analysis or compositing, but resizes are still
            // serviced and the surface keeps presenting.
            waterfall.render(&Info { column: None });
        }

        let wait = deadline.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            thread::sleep(wait);
        }
    }

    Ok(())
}
