use anyhow::Context;
use serde::Serialize;
use sundora_core::Alert;
use sundora_session::Notice;

/// Initialize tracing for the CLI. Events go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

pub fn format_alert(alert: &Alert) -> String {
    format!("{}: {}", alert.title, alert.message)
}

/// One-line rendering of a notice for the terminal.
pub fn notice_message(notice: &Notice) -> String {
    match notice {
        Notice::UploadSucceeded => "Success: File uploaded successfully!".to_string(),
        Notice::ImageSaved { path } => {
            format!("Success: Image saved to gallery! ({})", path.display())
        }
        Notice::Alert(alert) => format_alert(alert),
    }
}
