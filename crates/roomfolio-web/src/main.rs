//! Roomfolio native viewer - Main entry point
//!
//! Opens the room in a desktop window; the browser build uses the library's
//! WASM entry instead.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use anyhow::Result;
    use clap::Parser;
    use roomfolio_core::RoomConfig;
    use std::path::PathBuf;
    use tracing::info;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    #[derive(Parser, Debug)]
    #[command(name = "roomfolio")]
    #[command(about = "Interactive 3D portfolio room")]
    #[command(version)]
    struct Args {
        /// Room description to load instead of the built-in room
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Log filter used when RUST_LOG is not set
        #[arg(short, long, default_value = "info")]
        log_level: String,
    }

    pub fn main() -> Result<()> {
        let args = Args::parse();

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;

        info!("Roomfolio v{}", env!("CARGO_PKG_VERSION"));

        let config = match &args.config {
            Some(path) => {
                info!(path = %path.display(), "Loading room description");
                RoomConfig::load(path)?
            }
            None => RoomConfig::builtin()?,
        };

        info!(
            objects = config.objects.len(),
            hotspots = config.hotspots.len(),
            "Configuration loaded"
        );

        roomfolio_web::app::run(config);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::main()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
