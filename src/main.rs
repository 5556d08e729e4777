use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use unicode_width::UnicodeWidthStr;

mod cli;

use ccafinder::{
    client::EligibilityClient,
    config::Config,
    directory::ZipDirectory,
    eligibility::Matcher,
    finder::{EntryLink, FinderView, ResultsPanel},
    ingest, server,
    storage::Storage,
    tui,
};
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "ccafinder=info");
    }

    // Log to stderr and a file; the TUI gets the file only
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let file_appender = tracing_appender::rolling::never(".", "ccafinder.log");
    let stderr_layer = (!cli.command.is_interactive()).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(EnvFilter::from_default_env())
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();

    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Serve { bind, database, cities } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(database) = database {
                config.database_path = database.into();
            }
            if let Some(cities) = cities {
                config.cities_csv = cities.into();
            }
            config.validate()?;

            let storage = Storage::new(config.database_path_str()).await?;
            let directory = ZipDirectory::load_or_empty(&config.cities_csv)?;
            let state = server::AppState::new(storage, directory, Matcher::new(&config.matching));
            server::serve(&config.bind_addr, state).await?;
        }

        Commands::Ingest { csv, reset, database } => {
            if let Some(database) = database {
                config.database_path = database.into();
            }
            config.validate()?;

            let storage = Storage::new(config.database_path_str()).await?;
            match ingest::ingest_csv(&storage, Path::new(&csv), reset).await {
                Ok(report) => println!(
                    "Ingestion complete: {} programs, {} area rules ({} rows skipped)",
                    report.programs, report.area_rules, report.skipped_rows
                ),
                Err(e) => {
                    error!("Ingestion failed: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Search { address, api_url } => {
            if let Some(api_url) = api_url {
                config.api_url = api_url;
            }
            let client = EligibilityClient::from_config(&config)?;

            let mut view = FinderView::new();
            view.set_address(address);
            if !view.search(&client).await {
                eprintln!("Error: enter an address, city, or zip");
                std::process::exit(2);
            }
            print_view(&view);
            if view.error().is_some() {
                std::process::exit(1);
            }
        }

        Commands::Tui { api_url } => {
            if let Some(api_url) = api_url {
                config.api_url = api_url;
            }
            let client = EligibilityClient::from_config(&config)?;

            match tui::run_tui(Arc::new(client)).await {
                Ok(_) => info!("TUI exited successfully"),
                Err(e) => {
                    error!("TUI failed: {}", e);
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Stats { database } => {
            if let Some(database) = database {
                config.database_path = database.into();
            }
            let storage = Storage::new(config.database_path_str()).await?;
            let stats = storage.stats().await?;

            println!("Catalog: {}", config.database_path.display());
            println!("  Programs:          {}", stats.programs);
            println!("  With signup link:  {}", stats.with_signup_link);
            println!("  County rules:      {}", stats.county_rules);
            println!("  City rules:        {}", stats.city_rules);
            println!("  ZIP rules:         {}", stats.zip_rules);
            match stats.last_ingested_at {
                Some(ts) => println!("  Last ingested:     {}", ts),
                None => println!("  Last ingested:     never"),
            }
        }
    }

    Ok(())
}

/// Print the view the way the TUI would show it
fn print_view(view: &FinderView) {
    let display = view.display();

    if let Some(error) = display.error {
        eprintln!("{}", error);
    }

    match display.results {
        ResultsPanel::Hidden => {}
        ResultsPanel::Empty(notice) => println!("{}", notice),
        ResultsPanel::Entries(entries) => {
            println!("Eligible CCAs for: {}", view.address());
            println!();
            println!("{} {}", pad("Program", 40), "Signup link");
            println!("{}", "-".repeat(80));
            for entry in &entries {
                let link = match entry.link {
                    EntryLink::Signup(url) => url,
                    EntryLink::Missing(placeholder) => placeholder,
                };
                println!("{} {}", pad(&truncate_string(entry.name, 38), 40), link);
            }
            println!();
            println!("Total: {} programs", entries.len());
        }
    }
}

/// Truncate string to a display width with ellipsis
fn truncate_string(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut out = String::new();
    for c in s.chars() {
        if out.width() + c.to_string().width() + 3 > max_width {
            break;
        }
        out.push(c);
    }
    format!("{}...", out)
}

fn pad(s: &str, width: usize) -> String {
    format!("{}{}", s, " ".repeat(width.saturating_sub(s.width())))
}
