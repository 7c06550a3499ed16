use clap::{Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use stackgraph::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Keep infrastructure diagrams and Compose manifests in step from the command line
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Optional settings JSON file; STACKGRAPH_* variables override it
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Optional node-type library JSON file
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a manifest and write the resulting project document
    Import {
        manifest: PathBuf,
        /// Where to write the project document (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Project name (defaults to the manifest file stem)
        #[arg(long)]
        name: Option<String>,
        /// An existing project whose node keys and positions should be kept
        #[arg(long)]
        previous: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = FormatCli::Auto)]
        format: FormatCli,
    },
    /// Print the generation payload of a project document
    Export { project: PathBuf },
    /// Render a manifest through the generation service
    Generate {
        /// A project document (`.json` with a `data` field) or a manifest
        input: PathBuf,
        #[arg(long, value_enum)]
        dialect: Option<DialectCli>,
        /// Overrides the generator URL from settings
        #[arg(long)]
        url: Option<String>,
    },
    /// Show the nodes and connections a manifest turns into
    Inspect {
        manifest: PathBuf,
        #[arg(short, long, value_enum, default_value_t = FormatCli::Auto)]
        format: FormatCli,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatCli {
    Auto,
    Yaml,
    Json,
}

impl From<FormatCli> for ManifestFormat {
    fn from(format: FormatCli) -> Self {
        match format {
            FormatCli::Auto => ManifestFormat::Auto,
            FormatCli::Yaml => ManifestFormat::Yaml,
            FormatCli::Json => ManifestFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DialectCli {
    Compose,
    Kubernetes,
}

impl From<DialectCli> for ManifestDialect {
    fn from(dialect: DialectCli) -> Self {
        match dialect {
            DialectCli::Compose => ManifestDialect::DockerCompose,
            DialectCli::Kubernetes => ManifestDialect::Kubernetes,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        exit_with_error(&e.to_string());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.settings {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    }
    .apply_env()?;
    let library = match &cli.library {
        Some(path) => NodeLibrary::from_json(&fs::read_to_string(path)?)?,
        None => NodeLibrary::default(),
    };

    match cli.command {
        Command::Import {
            manifest,
            output,
            name,
            previous,
            format,
        } => {
            let existing = match &previous {
                Some(path) => ProjectDocument::from_json(&fs::read_to_string(path)?)?
                    .hydrate(&library)
                    .0,
                None => Graph::new(),
            };
            let started = Instant::now();
            let imported = Importer::new(&library)
                .with_layout(settings.layout)
                .import_str(&fs::read_to_string(&manifest)?, format.into(), &existing)?;
            info!(elapsed = ?started.elapsed(), "Import finished");

            let name = name.unwrap_or_else(|| file_stem(&manifest));
            let document = ProjectDocument::new(name)
                .with_dialect(settings.dialect)
                .with_graph(&imported.graph, imported.version);
            let json = document.to_json()?;
            match output {
                Some(path) => {
                    fs::write(&path, json)?;
                    println!("Wrote project to '{}'", path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Export { project } => {
            let document = ProjectDocument::from_json(&fs::read_to_string(&project)?)?;
            let (graph, version) = document.hydrate(&library);
            let payload = export(&graph, version);
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Generate {
            input,
            dialect,
            url,
        } => {
            let (graph, version, project_dialect) = load_graph(&input, &library, &settings)?;
            let dialect = dialect.map(ManifestDialect::from).unwrap_or(project_dialect);
            let base_url = url.unwrap_or_else(|| settings.generator_url.clone());
            let service = Arc::new(HttpGenerationService::new(
                base_url,
                settings.request_timeout(),
            )?);

            // A single snapshot through the pipeline, flushed immediately on shutdown.
            let (notifications, mut inbox) = notification::channel();
            let pipeline = RegenerationPipeline::spawn(
                service,
                PipelineOptions::default().with_dialect(dialect),
                Some(notifications),
            );
            pipeline.notify(Snapshot { graph, version });
            let rendered = pipeline.shutdown().await;

            if let Ok(notification) = inbox.try_recv() {
                return Err(notification.message.into());
            }
            print!("{}", rendered.text);
        }
        Command::Inspect { manifest, format } => {
            let imported = Importer::new(&library)
                .with_layout(settings.layout)
                .import_str(&fs::read_to_string(&manifest)?, format.into(), &Graph::new())?;
            print_summary(&imported);
        }
    }
    Ok(())
}

/// Accepts either a saved project or a manifest.
fn load_graph(
    path: &Path,
    library: &NodeLibrary,
    settings: &Settings,
) -> Result<(Graph, ComposeVersion, ManifestDialect)> {
    let text = fs::read_to_string(path)?;
    if let Ok(document) = ProjectDocument::from_json(&text) {
        if !document.data.canvas.nodes.is_empty() || !document.data.canvas.networks.is_empty() {
            let (graph, version) = document.hydrate(library);
            return Ok((graph, version, document.dialect()));
        }
    }
    let imported = Importer::new(library)
        .with_layout(settings.layout)
        .import_str(&text, ManifestFormat::Auto, &Graph::new())?;
    Ok((imported.graph, imported.version, settings.dialect))
}

fn print_summary(imported: &ImportedGraph) {
    let graph = &imported.graph;
    println!("Compose version: {}", imported.version);

    println!("\n--- Nodes ({}) ---", graph.nodes().len());
    for node in graph.nodes().values() {
        println!(
            "  {:<8} {:<24} key={} at ({}, {})",
            node.node_type().as_str(),
            node.name(),
            node.key,
            node.position.left,
            node.position.top
        );
    }

    if !graph.networks().is_empty() {
        println!("\n--- Networks ({}) ---", graph.networks().len());
        println!(
            "  {}",
            graph.networks().values().map(|network| network.name()).join(", ")
        );
    }

    println!("\n--- Connections ({}) ---", graph.connections().len());
    for (connection, style) in graph
        .connection_styles()
        .into_iter()
        .sorted_by_key(|(connection, _)| connection.clone())
    {
        println!(
            "  {} -> {} [{:?}]",
            display_name(graph, connection.source()),
            display_name(graph, connection.target()),
            style
        );
    }
}

fn display_name<'a>(graph: &'a Graph, key: &'a str) -> &'a str {
    graph.node(key).map(Node::name).unwrap_or(key)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string())
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
