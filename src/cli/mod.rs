pub mod commands;
pub mod context;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

/// Report a fatal command error and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({ "error": format!("{err:#}") });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    }
    eprintln!("Error: {err:#}");
    std::process::exit(1)
}
