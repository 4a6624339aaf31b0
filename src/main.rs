use anyhow::{anyhow, Result};

use regpanel::cli::{self, actions, config::ClientConfig};

fn init_logging(config: &ClientConfig, tui_mode: bool) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    // The TUI owns the terminal, so its logs always go to a file.
    let log_path = if tui_mode {
        Some(config.tui_log_file())
    } else {
        config.log_file.clone()
    };
    if let Some(path) = log_path {
        let file = std::fs::File::create(&path)
            .map_err(|err| anyhow!("Failed to open log file {}: {err}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

fn run() -> Result<()> {
    let matches = cli::parse_args();
    let config = ClientConfig::from_matches(&matches)?;

    let one_shot = matches.get_flag("list-ports")
        || matches.contains_id("read")
        || matches.contains_id("submit");
    init_logging(&config, !one_shot)?;

    if actions::run_one_shot_actions(&matches, &config)? {
        return Ok(());
    }

    log::info!("No one-shot action requested, launching TUI mode");
    regpanel::tui::start(&config)
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
