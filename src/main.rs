use anyhow::Result;
use logdash::cli::CliCommand;
use logdash::settings::SettingsClient;
use logdash::{CliOptions, Config, HttpFetcher, PaginationController, run};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log.rust_log);

    let options = match CliOptions::from_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}\n\n{}", logdash::cli::USAGE);
            std::process::exit(2);
        }
    };

    tracing::info!("Starting logdash against {}", config.api.base_url);

    match options.command {
        CliCommand::Help => {
            println!("{}", logdash::cli::USAGE);
            Ok(())
        }
        CliCommand::ShowSettings => run::run_settings(&SettingsClient::new(&config.api), None).await,
        CliCommand::SetLogPath(path) => {
            run::run_settings(&SettingsClient::new(&config.api), Some(&path)).await
        }
        CliCommand::Browse => {
            let mut paging = config.paging.clone();
            if let Some(page_size) = options.page_size {
                paging.page_size = page_size;
            }

            let controller =
                PaginationController::from_config(HttpFetcher::new(&config.api), &paging);
            run::run_session(controller, options.filters, options.format).await
        }
    }
}

fn init_tracing(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
