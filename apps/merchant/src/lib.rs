//! # Aliados Merchant Library
//!
//! The merchant side of the Aliados loyalty portal: redeem offers and
//! register loyalty cards, typed in or read from a QR code.
//!
//! ## Module Organization
//! ```text
//! aliados_merchant/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── console.rs      ◄─── Line-oriented user surface
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── forms.rs    ◄─── Redemption / registration forms
//! │   └── session.rs  ◄─── Stored business id
//! ├── commands/
//! │   ├── mod.rs      ◄─── View binding, SubmitOutcome
//! │   ├── redeem.rs   ◄─── Offer selector and redemption
//! │   ├── register.rs ◄─── Card registration
//! │   └── scan.rs     ◄─── Camera and image decoding
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod console;
pub mod error;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use aliados_core::MerchantSession;
use aliados_gateway::{
    AppConfig, FileSessionStore, Gateway, HttpGateway, MemorySessionStore, SessionStore,
};
use aliados_scan::{FolderCameraProvider, RqrrDecoder, Scanner};
use tracing::info;
use tracing_subscriber::EnvFilter;

use console::Console;
use error::ApiError;
use state::SessionState;

/// Runs the merchant console.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Initialize Logging (stderr, RUST_LOG or info,aliados=debug)         │
/// │  2. Load AppConfig (--config <path>, else the platform config dir)      │
/// │  3. Build HttpGateway from [gateway]                                    │
/// │  4. Open the session store (ALIADOS_BUSINESS_ID wins over the file)     │
/// │  5. Build the Scanner over the folder cameras in [scanner]              │
/// │  6. Load the offer selector, then read commands until quit              │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> Result<(), ApiError> {
    init_tracing();

    info!("Starting Aliados merchant console");

    let config = AppConfig::load_or_default(config_path_from_args(std::env::args()));

    let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::new(&config.gateway)?);
    let session = SessionState::new(session_store(&config)?);

    let camera_root = config
        .camera_root()
        .ok_or_else(|| ApiError::internal("Could not determine the camera folder"))?;
    info!(?camera_root, "Folder cameras");
    let scanner = Scanner::new(
        Arc::new(FolderCameraProvider::new(
            camera_root,
            config.scanner.frame_interval(),
        )),
        Arc::new(RqrrDecoder::new()),
        config.scanner.origin.clone(),
    );

    Console::new(gateway, session, scanner)
        .run()
        .await
        .map_err(|e| ApiError::internal(format!("Console I/O failed: {}", e)))
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so they never interleave with console output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=aliados_scan=trace` - Include per-frame decode noise
/// - Default: `info,aliados=debug`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,aliados=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Picks `--config <path>` out of the command line.
fn config_path_from_args(args: impl IntoIterator<Item = String>) -> Option<PathBuf> {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

/// A fixed business id from the environment, else the session file.
fn session_store(config: &AppConfig) -> Result<Arc<dyn SessionStore>, ApiError> {
    if let Some(id) = config.session.business_id.as_deref() {
        info!("Using business id from ALIADOS_BUSINESS_ID");
        return Ok(Arc::new(MemorySessionStore::new(
            MerchantSession::from_stored(Some(id)),
        )));
    }

    let path = config
        .session_path()
        .ok_or_else(|| ApiError::internal("Could not determine the session file path"))?;
    info!(?path, "Session file");
    Ok(Arc::new(FileSessionStore::new(path)))
}
