use clap::{Parser, ValueEnum};
use rand::rngs::ThreadRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde_json::{Map, Value, json};
use std::fs;

/// A CLI tool to generate synthetic Compose manifests for import testing
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated manifest to
    #[arg(short, long, default_value = "generated-compose.yml")]
    output: String,

    /// Number of services
    #[arg(long, default_value_t = 12)]
    services: usize,

    /// Number of named volumes
    #[arg(long, default_value_t = 4)]
    volumes: usize,

    /// Number of networks
    #[arg(long, default_value_t = 2)]
    networks: usize,

    /// Upper bound of dependencies per service
    #[arg(long, default_value_t = 3)]
    max_dependencies: usize,

    /// Write the legacy v1 layout (services at the top level)
    #[arg(long)]
    legacy: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

const IMAGES: &[&str] = &[
    "nginx:1.27",
    "postgres:16",
    "redis:7",
    "rabbitmq:3-management",
    "grafana/grafana",
    "node:22-alpine",
    "python:3.12-slim",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.services == 0 {
        eprintln!("Error: --services must be at least 1");
        std::process::exit(1);
    }

    println!(
        "Generating manifest ({} services, {} volumes, {} networks)...",
        cli.services, cli.volumes, cli.networks
    );

    let volume_names: Vec<String> = (0..cli.volumes).map(|i| format!("data-{i}")).collect();
    let network_names: Vec<String> = (0..cli.networks).map(|i| format!("net-{i}")).collect();
    let services = generate_services(&mut rng, &cli, &volume_names, &network_names);

    let document = if cli.legacy {
        Value::Object(services)
    } else {
        let mut root = Map::new();
        root.insert("version".to_string(), json!("3.8"));
        root.insert("services".to_string(), Value::Object(services));
        root.insert("volumes".to_string(), named_section(&volume_names));
        root.insert("networks".to_string(), named_section(&network_names));
        root.insert("x-generated".to_string(), json!({ "by": "manifest-gen" }));
        Value::Object(root)
    };

    let text = match cli.format {
        OutputFormat::Yaml => serde_yaml::to_string(&document)?,
        OutputFormat::Json => serde_json::to_string_pretty(&document)?,
    };
    fs::write(&cli.output, text)?;

    println!("Successfully wrote manifest to '{}'", cli.output);
    Ok(())
}

/// Services only depend on earlier services, so the dependency graph stays acyclic.
fn generate_services(
    rng: &mut ThreadRng,
    cli: &Cli,
    volumes: &[String],
    networks: &[String],
) -> Map<String, Value> {
    let mut services = Map::new();
    let names: Vec<String> = (0..cli.services).map(|i| format!("svc-{i}")).collect();

    for (index, name) in names.iter().enumerate() {
        let mut service = Map::new();
        service.insert(
            "image".to_string(),
            json!(IMAGES.choose(rng).copied().unwrap_or("busybox")),
        );

        let count = rng.random_range(0..=cli.max_dependencies.min(index));
        let dependencies: Vec<&String> = names[..index].choose_multiple(rng, count).collect();
        if !dependencies.is_empty() {
            service.insert("depends_on".to_string(), depends_on(rng, &dependencies));
        }

        if !volumes.is_empty() && rng.random_bool(0.5) {
            service.insert("volumes".to_string(), mounts(rng, name, volumes));
        }

        if rng.random_bool(0.6) {
            service.insert("ports".to_string(), ports(rng));
        }

        if rng.random_bool(0.5) {
            service.insert("environment".to_string(), environment(rng, name));
        }

        if !networks.is_empty() {
            let picked: Vec<&String> = networks.choose_multiple(rng, 1).collect();
            service.insert("networks".to_string(), json!(picked));
        }

        services.insert(name.clone(), Value::Object(service));
    }
    services
}

/// Alternates between the list and the mapping shape.
fn depends_on(rng: &mut ThreadRng, dependencies: &[&String]) -> Value {
    if rng.random_bool(0.5) {
        json!(dependencies)
    } else {
        let conditions: Map<String, Value> = dependencies
            .iter()
            .map(|name| (name.to_string(), json!({ "condition": "service_started" })))
            .collect();
        Value::Object(conditions)
    }
}

/// Mixes short-form, long-form and bind mounts.
fn mounts(rng: &mut ThreadRng, service: &str, volumes: &[String]) -> Value {
    let volume = volumes.choose(rng).cloned().unwrap_or_default();
    let named = if rng.random_bool(0.5) {
        json!(format!("{volume}:/var/lib/{service}"))
    } else {
        json!({ "type": "volume", "source": volume, "target": format!("/var/lib/{service}") })
    };
    let mut list = vec![named];
    if rng.random_bool(0.3) {
        list.push(json!(format!("./config/{service}:/etc/{service}:ro")));
    }
    Value::Array(list)
}

fn ports(rng: &mut ThreadRng) -> Value {
    let host = rng.random_range(8000..9000);
    let container = *[80, 443, 5432, 6379, 8080].choose(rng).unwrap_or(&80);
    if rng.random_bool(0.5) {
        json!([format!("{host}:{container}")])
    } else {
        let protocol = if rng.random_bool(0.8) { "tcp" } else { "udp" };
        json!([{ "target": container, "published": host, "protocol": protocol }])
    }
}

fn environment(rng: &mut ThreadRng, service: &str) -> Value {
    let level = *["debug", "info", "warn"].choose(rng).unwrap_or(&"info");
    if rng.random_bool(0.5) {
        json!([format!("SERVICE_NAME={service}"), format!("LOG_LEVEL={level}")])
    } else {
        json!({ "SERVICE_NAME": service, "LOG_LEVEL": level })
    }
}

fn named_section(names: &[String]) -> Value {
    let entries: Map<String, Value> = names
        .iter()
        .map(|name| (name.clone(), json!({})))
        .collect();
    Value::Object(entries)
}
