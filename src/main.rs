use clap::Parser;
use dropwatch::cli::{Cli, Command};
use dropwatch::config::Config;
use dropwatch::monitor;
use dropwatch::notify::telegram::TelegramNotifier;
use dropwatch::scrape::HttpListingProvider;
use dropwatch::store::diff::{Event, Reconciliation};
use dropwatch::store::snapshot::{Snapshot, SnapshotStore};
use tracing_subscriber::EnvFilter;

fn print_events(outcome: &Reconciliation) {
    if outcome.events.is_empty() {
        println!("No changes detected.");
        return;
    }

    let new: Vec<_> = outcome
        .events
        .iter()
        .filter(|e| matches!(e, Event::New(_)))
        .collect();
    let changed: Vec<_> = outcome
        .events
        .iter()
        .filter(|e| matches!(e, Event::PriceChanged { .. }))
        .collect();
    let removed: Vec<_> = outcome
        .events
        .iter()
        .filter(|e| matches!(e, Event::Removed(_)))
        .collect();

    for event in new {
        if let Event::New(record) = event {
            println!("  [new] {} ({})", record.name, record.price);
        }
    }

    for event in changed {
        if let Event::PriceChanged { record, old_price } = event {
            println!("  [price] {} {} -> {}", record.name, old_price, record.price);
        }
    }

    for event in removed {
        if let Event::Removed(record) = event {
            println!("  [gone] {} (was {})", record.name, record.price);
        }
    }

    println!(
        "\n{} change(s) against {} product(s) now on the page.",
        outcome.events.len(),
        outcome.current.len()
    );
}

fn print_snapshot(snapshot: &Snapshot, store: &SnapshotStore) {
    if snapshot.is_empty() {
        println!("No snapshot found. Run 'dropwatch check' to create one.");
        return;
    }

    println!("{:<42} {:<16} Link", "Name", "Price");
    println!("{}", "-".repeat(100));

    for record in snapshot.to_records() {
        println!("{:<42} {:<16} {}", record.name, record.price, record.link);
    }

    let updated = std::fs::metadata(store.path())
        .and_then(|m| m.modified())
        .ok()
        .map(|t| {
            let dt: chrono::DateTime<chrono::Local> = t.into();
            dt.format("%Y-%m-%d %H:%M:%S").to_string()
        })
        .unwrap_or_else(|| "unknown".to_string());

    println!(
        "\n{} product(s), saved {} ({updated})",
        snapshot.len(),
        store.path().display()
    );
}

fn open_store(config: &Config) -> SnapshotStore {
    match &config.store_path {
        Some(path) => SnapshotStore::at(path),
        None => match SnapshotStore::open_default() {
            Ok(store) => store,
            Err(e) => {
                eprintln!("Error opening snapshot store: {e}");
                std::process::exit(1);
            }
        },
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    };

    let store = open_store(&config);

    match cli.command {
        Command::Watch => {
            let provider = match HttpListingProvider::new(&config.page, &config.selectors) {
                Ok(provider) => provider,
                Err(e) => {
                    eprintln!("Error building listing provider: {e}");
                    std::process::exit(1);
                }
            };

            let notifier = match TelegramNotifier::new(&config.telegram) {
                Ok(notifier) => notifier,
                Err(e) => {
                    eprintln!("Error building telegram notifier: {e}");
                    std::process::exit(1);
                }
            };

            monitor::run_loop(&provider, &notifier, &store, &config.schedule).await;
        }
        Command::Check(args) => {
            let provider = match HttpListingProvider::new(&config.page, &config.selectors) {
                Ok(provider) => provider,
                Err(e) => {
                    eprintln!("Error building listing provider: {e}");
                    std::process::exit(1);
                }
            };

            if args.dry_run {
                match monitor::preview_pass(&provider, &store).await {
                    Ok(outcome) => print_events(&outcome),
                    Err(e) => {
                        eprintln!("Pass failed: {e}");
                        std::process::exit(1);
                    }
                }
            } else {
                let notifier = match TelegramNotifier::new(&config.telegram) {
                    Ok(notifier) => notifier,
                    Err(e) => {
                        eprintln!("Error building telegram notifier: {e}");
                        std::process::exit(1);
                    }
                };

                match monitor::run_pass(
                    &provider,
                    &notifier,
                    &store,
                    config.schedule.notify_delay,
                )
                .await
                {
                    Ok(summary) => {
                        println!(
                            "{} observed, {} new, {} price change(s), {} removed, {} notification failure(s)",
                            summary.observed,
                            summary.new_products,
                            summary.price_changes,
                            summary.removed,
                            summary.notify_failures
                        );
                        if !summary.persisted {
                            eprintln!("warning: snapshot was not persisted");
                        }
                    }
                    Err(e) => {
                        eprintln!("Pass failed: {e}");
                        std::process::exit(1);
                    }
                }
            }
        }
        Command::Show(args) => {
            let snapshot = store.load();

            if args.json {
                match serde_json::to_string_pretty(&snapshot.to_records()) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("Error rendering snapshot: {e}");
                        std::process::exit(1);
                    }
                }
            } else {
                print_snapshot(&snapshot, &store);
            }
        }
    }
}
