use anyhow::Result;
use clap::{Parser, Subcommand};
use image2sfx::admission::AdmissionGate;
use image2sfx::models::{BackendKind, Config, ImageReference};
use image2sfx::pipeline::Pipeline;
use image2sfx::server::{create_router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "image2sfx")]
#[command(about = "Generate sound effects from an image caption")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve {
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Run one generation from the command line.
    Generate {
        /// Image file path or http(s) URL.
        image: String,
        /// Generation backend to use.
        #[arg(long, value_enum, default_value_t = BackendKind::Magnet)]
        backend: BackendKind,
        /// Run every backend and report each result.
        #[arg(long, conflicts_with = "backend")]
        compare: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image2sfx=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let config = Config::from_env()?;
    let pipeline = Pipeline::from_config(&config)?;

    let outcome = match args.command {
        Command::Serve { port } => serve(pipeline, &config, port).await,
        Command::Generate {
            image,
            backend,
            compare,
        } => generate(pipeline, &image, backend, compare).await,
    };

    if let Err(e) = outcome {
        error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn serve(pipeline: Pipeline, config: &Config, port: u16) -> Result<()> {
    let state = AppState {
        pipeline: Arc::new(pipeline),
        gate: Arc::new(AdmissionGate::new(
            config.max_concurrent_requests,
            config.max_queued_requests,
        )),
        work_dir: config.work_dir.clone(),
    };
    let router = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

async fn generate(
    pipeline: Pipeline,
    image: &str,
    backend: BackendKind,
    compare: bool,
) -> Result<()> {
    let image = ImageReference::parse(image);

    if compare {
        let comparison = pipeline.run_all(&image).await?;
        info!("Caption: {}", comparison.caption);
        for (kind, outcome) in &comparison.results {
            match outcome {
                Ok(artifact) => println!("{}\t{}", kind, artifact.location),
                Err(e) => error!("[{}] {}", kind, e),
            }
        }
    } else {
        let artifact = pipeline.run(&image, backend).await?;
        info!("[{}] Generated artifact", backend);
        println!("{}", artifact.location);
    }
    Ok(())
}
