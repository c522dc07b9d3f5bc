// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use clap::Parser;

#[derive(Parser)]
#[command(name = "corementis", about = "CoreMentis learning dashboard")]
struct Cli {
    /// Run without GUI (API server only)
    #[arg(long)]
    headless: bool,

    /// API server port
    #[arg(long, default_value = "9851")]
    port: u16,

    /// Custom data directory
    #[arg(long)]
    data_dir: Option<String>,

    /// Engagement analyzer API root
    #[arg(long, default_value = corementis_lib::DEFAULT_ANALYZER_URL)]
    analyzer_url: String,
}

fn main() {
    let cli = Cli::parse();

    if cli.headless {
        let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
        rt.block_on(corementis_lib::run_headless(
            cli.data_dir.as_deref(),
            cli.port,
            &cli.analyzer_url,
        ));
    } else {
        corementis_lib::run_with_opts(cli.data_dir.as_deref(), cli.port, &cli.analyzer_url);
    }
}
