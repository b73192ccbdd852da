//! # Aliados Merchant Entry Point
//!
//! ```text
//! aliados-merchant [--config <path>]
//! ```
//!
//! The actual setup is in `lib.rs`.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match aliados_merchant::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.message);
            ExitCode::FAILURE
        }
    }
}
