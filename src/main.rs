use std::path::PathBuf;

use clap::Parser;
use freekick::{AppConfig, SceneConfig, StepPolicy, TriggerMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
enum Preset {
    /// Daylight stadium under a skybox.
    #[default]
    Stadium,
    /// Night match lit by a single bright floodlight.
    Floodlit,
}

/// Kick a football around a stadium.
#[derive(Parser, Debug)]
#[command(name = "freekick", version, about)]
struct Args {
    /// Scene setup to load.
    #[arg(long, default_value = "stadium", value_enum)]
    preset: Preset,

    /// Directory holding `Models/` and `Textures/`.
    #[arg(long, default_value = ".")]
    assets: PathBuf,

    /// Directory of .wgsl files overriding the built-in shaders.
    #[arg(long)]
    shaders: Option<PathBuf>,

    /// Cap each simulation step at this many seconds.
    #[arg(long)]
    max_step: Option<f32>,

    /// Kick and reset fire once per key press instead of every held frame.
    #[arg(long)]
    edge_trigger: bool,

    /// Window width in pixels.
    #[arg(long, default_value = "1366")]
    width: u32,

    /// Window height in pixels.
    #[arg(long, default_value = "768")]
    height: u32,

    /// Present as fast as possible instead of waiting for vsync.
    #[arg(long)]
    no_vsync: bool,
}

impl Args {
    fn scene(&self) -> SceneConfig {
        let scene = match self.preset {
            Preset::Stadium => SceneConfig::stadium(),
            Preset::Floodlit => SceneConfig::floodlit(),
        };
        scene
            .asset_root(&self.assets)
            .shader_dir(self.shaders.clone())
            .step_policy(match self.max_step {
                Some(max) => StepPolicy::Clamped(max),
                None => StepPolicy::Unbounded,
            })
            .trigger(if self.edge_trigger {
                TriggerMode::Edge
            } else {
                TriggerMode::Level
            })
    }

    fn app(&self) -> AppConfig {
        AppConfig::new()
            .size(self.width, self.height)
            .vsync(!self.no_vsync)
    }
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,freekick=info"),
    )
    .init();

    let args = Args::parse();
    if let Err(err) = freekick::run(args.app(), args.scene()) {
        log::error!("{err}");
        std::process::exit(1);
    }
}
