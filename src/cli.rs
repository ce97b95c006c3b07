use crate::config::{Config, load_config};
use crate::model::parse_dashboard;
use crate::scale::{NoColumnMetadata, Viewport, scale_dashboard};
use crate::scale_dump::{ScaleDump, write_scale_dump};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "vsscale",
    version,
    about = "Scale a dashboard layout onto a viewport and print the resulting geometry"
)]
pub struct Args {
    /// Dashboard document (JSON or JSON5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the JSON dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file (scale allowances and viewport defaults)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Viewport width
    #[arg(short = 'w', long = "width")]
    pub width: Option<i32>,

    /// Viewport height; 0 leaves the height open
    #[arg(short = 'H', long = "height")]
    pub height: Option<i32>,

    /// Use mobile scrollbar and edge allowances
    #[arg(long = "mobile")]
    pub mobile: bool,

    /// Browser user agent; mobile agents imply --mobile
    #[arg(long = "user-agent")]
    pub user_agent: Option<String>,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let viewport = viewport_for(&args, &config);

    let input = read_input(args.input.as_deref())?;
    let dashboard = parse_dashboard(&input)?;
    let output = scale_dashboard(&dashboard, &viewport, &config.scale, &NoColumnMetadata);
    let dump = ScaleDump::from_output(&dashboard, &viewport, &output);
    write_scale_dump(args.output.as_deref(), &dump)
}

/// Command line flags win over the config file's viewport section.
fn viewport_for(args: &Args, config: &Config) -> Viewport {
    let mut viewport = Viewport::from(&config.viewport);
    if let Some(width) = args.width {
        viewport.width = width;
    }
    match args.height {
        Some(0) => viewport.height = None,
        Some(height) => viewport.height = Some(height),
        None => {}
    }
    if args.mobile {
        viewport.mobile = true;
    }
    if let Some(user_agent) = &args.user_agent {
        viewport.user_agent = Some(user_agent.clone());
    }
    viewport
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path.filter(|path| *path != Path::new("-")) {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading dashboard {}", path.display()));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
