use packgen::{calculate_results, default_cases, drive, tabulate};
use packgen::{Packing, ParametersConfig, SceneWriter};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::path::{Path, PathBuf};
use std::process::Command as Process;

#[derive(Parser, Debug)]
#[command(
    name = "packgen",
    version,
    about = "Generate prism packings for an external physics engine"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the mixture, place particles and write the scene
    Generate {
        /// Parameter file (YAML, or JSON with a .json extension)
        #[arg(default_value = "parameters.yaml")]
        file_name: PathBuf,

        /// Directory for the scene and snapshot files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Also write the resolved parameters, seed included
        #[arg(long)]
        save_parameters: bool,

        /// Abort when rounded populations miss the requested mixture
        #[arg(long)]
        strict: bool,

        /// Engine executable to run on the written scene
        #[arg(long, requires = "engine_script")]
        engine: Option<PathBuf>,

        /// Script the engine executes to replay the scene
        #[arg(long)]
        engine_script: Option<PathBuf>,
    },
    /// Print number ratios for the reference two-species packings
    Summary,
}

// fall back to the bundled scenarios directory for bare file names
fn locate_parameters(file_name: &Path) -> PathBuf {
    if file_name.exists() {
        return file_name.to_path_buf();
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
}

fn params_suffix(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "parameters".to_string())
}

fn launch_engine(engine: &Path, script: &Path, scene: &Path) -> Result<()> {
    info!(engine = %engine.display(), scene = %scene.display(), "launching physics engine");
    let status = Process::new(engine)
        .arg("-P")
        .arg(script)
        .arg("--")
        .arg(scene)
        .status()
        .with_context(|| format!("failed to start {}", engine.display()))?;
    if !status.success() {
        bail!("physics engine exited with {status}");
    }
    Ok(())
}

fn generate(
    file_name: &Path,
    output_dir: &Path,
    save_parameters: bool,
    strict: bool,
    engine: Option<&Path>,
    engine_script: Option<&Path>,
) -> Result<()> {
    let config_path = locate_parameters(file_name);
    let cfg = ParametersConfig::from_path(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?
        .with_resolved_seed();

    let packing = Packing::build_packing(&cfg)?;
    if strict {
        packing.mixture.clone().strict()?;
    }

    let suffix = params_suffix(&config_path);
    if save_parameters {
        let snapshot = output_dir.join(format!("packing_{suffix}.parameters.yaml"));
        cfg.save(&snapshot)?;
        info!(path = %snapshot.display(), "parameters saved");
    }

    let scene_path = output_dir.join(format!("packing_{suffix}.json"));
    let mut writer = SceneWriter::new(packing.seed);
    drive(&packing, &mut writer, &scene_path)?;

    if let (Some(engine), Some(script)) = (engine, engine_script) {
        launch_engine(engine, script, &scene_path)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}=info", env!("CARGO_PKG_NAME")))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    match args.command {
        Command::Generate {
            file_name,
            output_dir,
            save_parameters,
            strict,
            engine,
            engine_script,
        } => generate(
            &file_name,
            &output_dir,
            save_parameters,
            strict,
            engine.as_deref(),
            engine_script.as_deref(),
        ),
        Command::Summary => {
            let rows = calculate_results(&default_cases())?;
            print!("{}", tabulate(&rows));
            Ok(())
        }
    }
}
