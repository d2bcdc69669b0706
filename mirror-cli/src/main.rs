// mirror-cli: inspect the demo registry, dump instances and query the
// editor protocol through an in-process server.

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};

use mirror::demo::{self, demo_registry, demo_scene};
use mirror::ipc::{Client, LoopbackHub, Server};
use mirror::{MessageType, MirrorConfig, MirrorError, MirrorResult, Registry};

#[derive(Parser)]
#[command(name = "mirror", about = "mirror CLI: reflection and editor protocol tools")]
struct Cli {
    /// Path to mirror.config.toml (defaults to ./mirror.config.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered type names.
    Types,
    /// Show the size and fields of a type.
    Info {
        /// Registered type name.
        type_name: String,
    },
    /// Serialize a default instance of a type to JSON.
    Dump {
        /// Registered type name.
        type_name: String,
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Send one request to a server hosting the demo scene and print the response.
    Query {
        /// Message type name (e.g. GetTypeInfo) or numeric tag.
        #[arg(value_parser = parse_message_type)]
        message: MessageType,
        /// Request payload.
        #[arg(long, default_value = "")]
        payload: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match MirrorConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    init_logger(&config);

    if let Err(e) = run(cli.command, &config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Level from config, overridable by `RUST_LOG`.
fn init_logger(config: &MirrorConfig) {
    let level = config.log.level_filter().unwrap_or_else(|e| {
        eprintln!("Warning: {e}, using info");
        log::LevelFilter::Info
    });
    env_logger::Builder::new().filter_level(level).parse_default_env().init();
}

fn run(command: Commands, config: &MirrorConfig) -> MirrorResult<()> {
    let registry = demo_registry();
    match command {
        Commands::Types => {
            for name in registry.list_type_names() {
                println!("{name}");
            }
        }
        Commands::Info { type_name } => print_info(&registry, &type_name)?,
        Commands::Dump { type_name, out } => {
            let instance =
                demo::default_instance(&type_name).ok_or_else(|| MirrorError::TypeNotFound(type_name.clone()))?;
            match out {
                Some(path) => {
                    mirror::json::save_to_file(&registry, &type_name, &*instance, &path)?;
                    println!("Wrote {}", path.display());
                }
                None => {
                    let instance: &dyn Any = &*instance;
                    println!("{}", mirror::json::serialize(&registry, &type_name, Some(instance)));
                }
            }
        }
        Commands::Query { message, payload } => {
            let response = query(registry, config, message, &payload)?;
            // Pretty-print JSON responses, pass anything else through.
            match serde_json::from_str::<serde_json::Value>(&response) {
                Ok(value) => println!("{}", serde_json::to_string_pretty(&value).unwrap_or(response)),
                Err(_) => println!("{response}"),
            }
        }
    }
    Ok(())
}

fn print_info(registry: &Registry, type_name: &str) -> MirrorResult<()> {
    let desc = registry
        .get_type(type_name)
        .ok_or_else(|| MirrorError::TypeNotFound(type_name.to_string()))?;
    println!("{} ({} bytes)", desc.name(), desc.size_bytes());
    for field in desc.fields() {
        let access = if field.has_accessor() { "" } else { " (opaque)" };
        println!(
            "  {:<16} {:<8} @ {}{access}",
            field.name(),
            field.kind().name(),
            field.byte_offset()
        );
    }
    Ok(())
}

/// Host the demo scene on a loopback server polled by a worker thread and
/// send one request to it.
fn query(registry: Registry, config: &MirrorConfig, message: MessageType, payload: &str) -> MirrorResult<String> {
    let registry = Arc::new(registry);
    let hub = LoopbackHub::new();
    let endpoint = config.ipc.endpoint.as_str();

    let mut server = Server::new(Arc::clone(&registry), Box::new(hub.server_transport()));
    server.attach_objects(demo_scene(registry)?);
    server.start(endpoint)?;

    let stop = Arc::new(AtomicBool::new(false));
    let worker = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                server.update();
                thread::sleep(Duration::from_millis(1));
            }
            server.stop();
        })
    };

    let mut client = Client::new(Box::new(hub.client_transport())).with_timeout(config.ipc.request_timeout());
    let response = client.connect(endpoint).and_then(|()| client.request(message, payload));
    client.disconnect();

    stop.store(true, Ordering::Relaxed);
    if worker.join().is_err() {
        log::warn!("server thread panicked");
    }
    response
}

fn parse_message_type(s: &str) -> Result<MessageType, String> {
    if let Ok(raw) = s.parse::<u32>() {
        return MessageType::from_raw(raw).ok_or_else(|| format!("unknown message tag {raw}"));
    }
    MessageType::from_name(s).ok_or_else(|| format!("unknown message type '{s}'"))
}
