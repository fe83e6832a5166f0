mod config;
mod control;
mod display;
mod fireworks;
mod math3d;
mod sky;
mod sprite;
mod util;
mod water;

use config::{SceneConfig, DEFAULT_CONFIG_PATH};
use control::{ControlMessage, Controller};
use display::{Display, InputEvent, MouseButtonKind, PixelBuffer, RenderTarget, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use fireworks::{BurstScheduler, SpawnRequest};
use log::{info, warn};
use math3d::Vec3;
use sdl2::keyboard::Keycode;
use sky::{Atmosphere, SkyParams};
use sprite::SpritePalette;
use util::FpsCounter;
use water::WaterSurface;

/// Water plane height below the camera
const WATER_LEVEL: f32 = -3.0;

struct Args {
    width: u32,
    height: u32,
    vsync: bool,
    seed: u64,
    config_path: String,
    mqtt_host: Option<String>,
    mqtt_topic: String,
}

/// Parse command line arguments
fn parse_args() -> Args {
    let argv: Vec<String> = std::env::args().collect();
    let mut args = Args {
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
        vsync: true,
        seed: 0x5EAF19E,
        config_path: DEFAULT_CONFIG_PATH.to_string(),
        mqtt_host: None,
        mqtt_topic: control::DEFAULT_TOPIC.to_string(),
    };

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--no-vsync" => args.vsync = false,
            "--width" | "-w" => {
                if i + 1 < argv.len() {
                    if let Ok(w) = argv[i + 1].parse::<u32>() {
                        args.width = w;
                    }
                    i += 1;
                }
            },
            "--height" | "-h" => {
                if i + 1 < argv.len() {
                    if let Ok(h) = argv[i + 1].parse::<u32>() {
                        args.height = h;
                    }
                    i += 1;
                }
            },
            "--resolution" | "-r" => {
                if i + 1 < argv.len() {
                    // Parse WxH format (e.g., 1920x1080)
                    let parts: Vec<&str> = argv[i + 1].split('x').collect();
                    if parts.len() == 2 {
                        if let (Ok(w), Ok(h)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>()) {
                            args.width = w;
                            args.height = h;
                        }
                    }
                    i += 1;
                }
            },
            "--seed" => {
                if i + 1 < argv.len() {
                    if let Ok(s) = argv[i + 1].parse::<u64>() {
                        args.seed = s;
                    }
                    i += 1;
                }
            },
            "--config" => {
                if i + 1 < argv.len() {
                    args.config_path = argv[i + 1].clone();
                    i += 1;
                }
            },
            "--mqtt-host" => {
                if i + 1 < argv.len() {
                    args.mqtt_host = Some(argv[i + 1].clone());
                    i += 1;
                }
            },
            "--mqtt-topic" => {
                if i + 1 < argv.len() {
                    args.mqtt_topic = argv[i + 1].clone();
                    i += 1;
                }
            },
            "--help" => {
                println!("Usage: seafire [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --width W, -w W           Set window width (default: {})", DEFAULT_WIDTH);
                println!("  --height H, -h H          Set window height (default: {})", DEFAULT_HEIGHT);
                println!("  --resolution WxH, -r WxH  Set resolution (e.g., 1920x1080)");
                println!("  --no-vsync                Disable VSync for uncapped framerate");
                println!("  --seed N                  Seed for the burst RNG");
                println!("  --config PATH             Scene config file (default: {})", DEFAULT_CONFIG_PATH);
                println!("  --mqtt-host HOST          Enable MQTT remote control");
                println!("  --mqtt-topic TOPIC        MQTT topic (default: {})", control::DEFAULT_TOPIC);
                println!("  --help                    Show this help message");
                std::process::exit(0);
            },
            _ => {},
        }
        i += 1;
    }

    args
}

fn adjust_sky(atmosphere: &mut Atmosphere, edit: impl FnOnce(&mut SkyParams)) {
    let mut params = atmosphere.params();
    edit(&mut params);
    atmosphere.set_params(params);
}

fn main() -> Result<(), String> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args = parse_args();

    let (mut display, texture_creator) =
        Display::with_options("seafire", args.width, args.height, args.vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, args.width, args.height)?;
    let mut buffer = PixelBuffer::with_size(args.width, args.height);

    // Load scene config or fall back to defaults
    let scene_config = SceneConfig::load(&args.config_path).unwrap_or_default();

    let mut atmosphere = Atmosphere::new(scene_config.sky);
    let mut water =
        WaterSurface::new(scene_config.water, WATER_LEVEL).map_err(|e| e.to_string())?;
    let mut scheduler = BurstScheduler::new(args.seed, scene_config.bursts);
    let palette = SpritePalette::new();

    let controller = match &args.mqtt_host {
        Some(host) => match Controller::new(host, &args.mqtt_topic) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("control channel unavailable: {}", e);
                None
            },
        },
        None => None,
    };

    // Opening burst: same shape every run
    if let Err(e) = scheduler.spawn(SpawnRequest {
        count: 100,
        origin: Vec3::new(0.0, 2.0, 40.0),
        base_size: 0.5,
        radius: 1.0,
        sprite_index: 7,
        color: (138, 255, 255),
    }) {
        warn!("opening burst failed: {}", e);
    }

    println!("=== seafire ===");
    println!("Resolution: {}x{}", args.width, args.height);
    if args.vsync {
        println!("VSync: ON (60fps locked). Use --no-vsync for uncapped.");
    } else {
        println!("VSync: OFF (uncapped framerate)");
    }
    println!("Use --help for command line options.");
    println!("Controls:");
    println!("  Click      - Launch a firework at the pointer");
    println!("  Space      - Launch a random firework");
    println!("  Up/Down    - Sun elevation");
    println!("  Left/Right - Sun azimuth");
    println!("  E / R      - Exposure down / up");
    println!("  T / Y      - Turbidity down / up");
    println!("  F          - Toggle FPS readout in the title bar");
    println!("  S          - Save scene config");
    println!("  L          - Load scene config");
    println!("  Escape     - Quit");

    // FPS counter with 60 sample rolling average
    let mut fps_counter = FpsCounter::new(60);
    let mut show_fps = false;
    let mut frame: u64 = 0;

    let fov = args.height as f32;
    let cx = args.width as f32 * 0.5;
    let cy = args.height as f32 * 0.5;

    'main: loop {
        let (dt, avg_fps) = fps_counter.tick();

        // Handle input
        for event in display.poll_events() {
            match event {
                InputEvent::Quit => break 'main,
                InputEvent::KeyDown(key) => match key {
                    Keycode::Escape => break 'main,
                    Keycode::Space => {
                        if let Err(e) = scheduler.spawn_autonomous() {
                            warn!("spawn failed: {}", e);
                        }
                    },
                    Keycode::F => show_fps = !show_fps,
                    Keycode::S => {
                        let snapshot = SceneConfig {
                            sky: atmosphere.params(),
                            water: *water.params(),
                            bursts: *scheduler.tuning(),
                        };
                        match snapshot.save(&args.config_path) {
                            Ok(()) => info!("config saved to {}", args.config_path),
                            Err(e) => warn!("failed to save config: {}", e),
                        }
                    },
                    Keycode::L => match SceneConfig::load(&args.config_path) {
                        Ok(loaded) => {
                            atmosphere.set_params(loaded.sky);
                            if let Err(e) = water.set_params(loaded.water) {
                                warn!("water config rejected: {}", e);
                            }
                            if let Err(e) = scheduler.set_tuning(loaded.bursts) {
                                warn!("burst config rejected: {}", e);
                            }
                            info!("config loaded from {}", args.config_path);
                        },
                        Err(e) => warn!("failed to load config: {}", e),
                    },
                    Keycode::Up => adjust_sky(&mut atmosphere, |p| {
                        p.elevation = (p.elevation + 2.0).min(90.0);
                    }),
                    Keycode::Down => adjust_sky(&mut atmosphere, |p| {
                        p.elevation = (p.elevation - 2.0).max(-10.0);
                    }),
                    Keycode::Left => adjust_sky(&mut atmosphere, |p| {
                        p.azimuth -= 5.0;
                    }),
                    Keycode::Right => adjust_sky(&mut atmosphere, |p| {
                        p.azimuth += 5.0;
                    }),
                    Keycode::E => adjust_sky(&mut atmosphere, |p| {
                        p.exposure = (p.exposure - 0.05).max(0.0);
                    }),
                    Keycode::R => adjust_sky(&mut atmosphere, |p| {
                        p.exposure += 0.05;
                    }),
                    Keycode::T => adjust_sky(&mut atmosphere, |p| {
                        p.turbidity = (p.turbidity - 1.0).max(0.0);
                    }),
                    Keycode::Y => adjust_sky(&mut atmosphere, |p| {
                        p.turbidity = (p.turbidity + 1.0).min(20.0);
                    }),
                    _ => {},
                },
                InputEvent::Click {
                    norm_x,
                    norm_y,
                    button: MouseButtonKind::Left,
                    ..
                } => {
                    if let Err(e) = scheduler.spawn_at_screen(norm_x, norm_y) {
                        warn!("click spawn failed: {}", e);
                    }
                },
                InputEvent::Click { .. } => {},
            }
        }

        // Apply remote control messages at the frame boundary
        if let Some(ctrl) = &controller {
            for msg in ctrl.poll() {
                match msg {
                    ControlMessage::Burst { x, y } => {
                        let result = match (x, y) {
                            (Some(x), Some(y)) => scheduler.spawn_at_screen(x, y),
                            _ => scheduler.spawn_autonomous(),
                        };
                        if let Err(e) = result {
                            warn!("remote spawn failed: {}", e);
                        }
                    },
                    ControlMessage::Sky { patch } => {
                        adjust_sky(&mut atmosphere, |p| patch.apply(p));
                    },
                    ControlMessage::Water { patch } => {
                        let mut params = *water.params();
                        patch.apply(&mut params);
                        if let Err(e) = water.set_params(params) {
                            warn!("water patch rejected: {}", e);
                        }
                    },
                    ControlMessage::Bursts { patch } => {
                        let mut tuning = *scheduler.tuning();
                        patch.apply(&mut tuning);
                        if let Err(e) = scheduler.set_tuning(tuning) {
                            warn!("burst patch rejected: {}", e);
                        }
                    },
                }
            }
        }

        // Simulation: animate and retire bursts, fire spawn timers, advance
        // the water clock
        scheduler.update(dt);
        water.advance(dt);

        // Render back to front: sky dome, water surface, then the bursts
        atmosphere.render(&mut buffer, fov);
        water.render(
            &mut buffer,
            atmosphere.sun_direction(),
            atmosphere.sun_color(),
            atmosphere.exposure(),
            fov,
        );
        for burst in scheduler.bursts() {
            burst.render(&mut buffer, &palette, fov, cx, cy);
        }

        frame += 1;
        if show_fps && frame % 30 == 0 {
            display.set_title(&format!(
                "seafire - {:.0} fps ({:.1} ms) - {} bursts",
                avg_fps,
                fps_counter.avg_frame_time_ms(),
                scheduler.active_count()
            ));
        }

        // Present
        display.present(&mut target, &buffer)?;
    }

    // Teardown: dispose every live burst and cancel pending completions
    scheduler.clear();

    Ok(())
}
