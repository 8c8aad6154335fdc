mod app;
mod deps;
mod session;
mod view;

use std::io::{self, Write as _};
use std::path::PathBuf;

use anyhow::{Context as _, Result, anyhow};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::deps::{ContainmentRule, ExternalImports, ModelOptions};
use crate::view::Geometry;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON array of `{ "id": ..., "imports": [...] }` records; `-` reads stdin.
    input: PathBuf,

    /// Path segment separator inside module ids.
    #[arg(long, default_value = ".")]
    separator: String,

    /// Group to expand on startup. Repeatable.
    #[arg(long = "expand", value_name = "ID")]
    expand: Vec<String>,

    /// Only treat whole-segment prefixes as containment instead of any substring.
    #[arg(long)]
    strict_containment: bool,

    /// Skip imports of modules that have no record instead of failing.
    #[arg(long)]
    drop_external_imports: bool,

    /// Print the model or the initial particle tree as JSON and exit.
    #[arg(long, value_enum)]
    dump: Option<Dump>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Dump {
    Model,
    View,
}

impl Args {
    fn load_source(&self) -> app::LoadSource {
        app::LoadSource {
            input: self.input.clone(),
            options: ModelOptions {
                separator: self.separator.clone(),
                containment: if self.strict_containment {
                    ContainmentRule::PathPrefix
                } else {
                    ContainmentRule::Substring
                },
                external_imports: if self.drop_external_imports {
                    ExternalImports::Drop
                } else {
                    ExternalImports::Reject
                },
            },
            expansions: self.expand.clone(),
            geometry: Geometry::default(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let source = args.load_source();

    if let Some(dump) = args.dump {
        return dump_json(&source, dump);
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "depocon",
        options,
        Box::new(move |cc| Ok(Box::new(app::DepoconApp::new(cc, source)))),
    )
    .map_err(|error| anyhow!("failed to start the viewer: {error}"))
}

fn dump_json(source: &app::LoadSource, dump: Dump) -> Result<()> {
    let session = app::load_session(source)?;
    let json = match dump {
        Dump::Model => serde_json::to_string_pretty(session.model()),
        Dump::View => serde_json::to_string_pretty(session.field()),
    }
    .context("failed to serialize output")?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}").context("failed to write to stdout")?;
    Ok(())
}
