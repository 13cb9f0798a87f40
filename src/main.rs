use std::env;
use std::fs;

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3};
use log::info;

use viewer_scene::{
    Drawable, InputBinding, InputState, RecordingBackend, SceneDescription, Screen,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let xml = fs::read_to_string(&options.path)
        .with_context(|| format!("failed to read scene {}", options.path))?;
    let scene = SceneDescription::from_xml(&xml).context("failed to parse scene XML")?;

    println!(
        "Loaded scene with {} models in {} shader(s) ({} lights)",
        scene.model_count(),
        scene.shaders.len(),
        scene.lights.len()
    );
    for shader in &scene.shaders {
        let names: Vec<_> = shader.models.iter().map(|model| model.name()).collect();
        println!(" - {}: {}", shader.name, names.join(", "));
    }

    let mut screen = scene.build()?;
    screen.setup(|backend| {
        backend.clear(Vec3::new(0.1, 0.1, 0.12));
        backend.set_depth_test(true);
        backend.set_blending(true);
    });

    let input = InputState::new();
    for binding in &options.held {
        match binding {
            InputBinding::Key(key) => input.set_key_down(*key),
            InputBinding::Mouse(button) => input.set_mouse_button_down(*button),
        }
    }
    input.set_pointer(options.pointer);

    let mut backend = RecordingBackend::new();
    for frame in 0..options.frames {
        backend.reset();
        screen.update(options.dt, &input);
        screen.draw(&mut backend);
        info!("frame {frame}: {} backend calls", backend.commands().len());
    }

    println!("Ran {} frame(s)", options.frames);
    print_final_state(&screen);
    if options.frames > 0 {
        println!("Draw order: {}", backend.draw_labels().join(", "));
    }
    Ok(())
}

fn print_final_state(screen: &Screen) {
    match screen.camera() {
        Some(camera) => {
            let position = camera.position();
            println!(
                "Camera pos=({:.2}, {:.2}, {:.2}) yaw={:.2} pitch={:.2}",
                position.x,
                position.y,
                position.z,
                camera.yaw(),
                camera.pitch()
            );
        }
        None => println!("No camera"),
    }
    match (screen.closest_drawable(), screen.closest_drawable_distance()) {
        (Some(drawable), Some(distance)) => {
            println!("Closest drawable: {} ({distance:.2})", drawable.name());
        }
        _ => println!("Closest drawable: none"),
    }
}

struct CliOptions {
    path: String,
    frames: u32,
    dt: f32,
    held: Vec<InputBinding>,
    pointer: Vec2,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: viewer-scene <scene.xml> [--frames N] [--dt SECONDS] [--hold KEY]... [--pointer X,Y]"
            ));
        };
        let mut options = Self {
            path,
            frames: 1,
            dt: 1.0 / 60.0,
            held: Vec::new(),
            pointer: Vec2::ZERO,
        };
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} expects a value"))
            };
            match arg.as_str() {
                "--frames" => {
                    options.frames = value("--frames")?
                        .parse()
                        .context("--frames expects a whole number")?;
                }
                "--dt" => {
                    options.dt = value("--dt")?
                        .parse()
                        .context("--dt expects seconds")?;
                }
                "--hold" => {
                    let name = value("--hold")?;
                    let binding = InputBinding::from_name(&name)
                        .ok_or_else(|| anyhow!("unknown key or button `{name}`"))?;
                    options.held.push(binding);
                }
                "--pointer" => {
                    options.pointer = parse_pointer(&value("--pointer")?)?;
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --frames, --dt, --hold or --pointer"
                    ));
                }
            }
        }
        Ok(options)
    }
}

fn parse_pointer(value: &str) -> Result<Vec2> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| anyhow!("--pointer expects X,Y"))?;
    let x = x.trim().parse::<f32>().context("invalid pointer x")?;
    let y = y.trim().parse::<f32>().context("invalid pointer y")?;
    Ok(Vec2::new(x, y))
}
