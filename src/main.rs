use clap::Parser;
use quotebook::application::transfer::export_filename;
use quotebook::application::{
    init::init, manage_config::ConfigService, Notice, NoticeLevel, Outcome, QuoteWidget,
    SyncAgent, Trigger, UserPreferences,
};
use quotebook::cli::output::{
    format_filter, format_import_report, format_notice, format_sync_report,
};
use quotebook::cli::{
    format_category_list, format_pick, format_quote_list, Cli, Commands, FilterArgs,
};
use quotebook::domain::{FilterSpec, QuoteDraft};
use quotebook::error::QuoteError;
use quotebook::infrastructure::{
    logging, Config, FileSystemRepository, HttpRemote, QuotebookRepository,
};
use std::fs;
use std::path::Path;
use std::time::Duration;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(&logging::resolve_level(cli.log_level.as_deref()));

    match run(cli) {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e.display_with_suggestions());
            std::process::exit(e.exit_code());
        }
    }
}

fn run(cli: Cli) -> Result<(), QuoteError> {
    match cli.command {
        Some(Commands::Init { path, endpoint }) => {
            let count = init(&path, endpoint.as_deref())?;
            println!(
                "Initialized quotebook in {} with {} quotes",
                path.display(),
                count
            );
            Ok(())
        }
        Some(Commands::Config { key, value, list }) => {
            let repo = FileSystemRepository::discover()?;
            let service = ConfigService::new(repo);

            if list {
                for (key, value) in service.list()?.entries() {
                    println!("{} = {}", key, value);
                }
            } else if let Some(k) = key {
                if let Some(v) = value {
                    service.set(&k, &v)?;
                    println!("Set {} = {}", k, v);
                } else {
                    println!("{}", service.get(&k)?);
                }
            } else {
                let keys: Vec<&str> = Config::new().entries().into_iter().map(|(k, _)| k).collect();
                println!("Usage: quotebook config [--list | <key> [<value>]]");
                println!("Valid keys: {}", keys.join(", "));
            }
            Ok(())
        }
        command => {
            let repo = FileSystemRepository::discover()?;
            let config = repo.load_config()?;
            let freshness = config.freshness()?;
            let widget = QuoteWidget::open(repo.storage(), repo.session_storage(), freshness);

            let command = command.unwrap_or(Commands::Show {
                filter: FilterArgs::default(),
                fresh: false,
            });
            run_widget(widget, &config, command)
        }
    }
}

fn filter_from(args: &FilterArgs, base: &FilterSpec) -> Result<FilterSpec, QuoteError> {
    args.apply_to(base).map_err(QuoteError::Config)
}

fn run_widget(mut widget: QuoteWidget, config: &Config, command: Commands) -> Result<(), QuoteError> {
    match command {
        Commands::Show { filter, fresh } => {
            let trigger = if !filter.is_empty() {
                Trigger::ApplyFilter(filter_from(&filter, widget.filter())?)
            } else if fresh {
                Trigger::ShowAnother
            } else {
                Trigger::Resume
            };
            let outcome = widget.dispatch(trigger)?;
            print_outcome(&widget, &outcome);
        }
        Commands::List { filter } => {
            let spec = filter_from(&filter, widget.filter())?;
            println!("{}", format_quote_list(&widget.preview(&spec)).trim_end());
        }
        Commands::Categories => {
            println!(
                "{}",
                format_category_list(&widget.store().categories()).trim_end()
            );
        }
        Commands::Add {
            text,
            category,
            favorite,
        } => {
            let draft = QuoteDraft::new(text, category).with_favorite(favorite);
            if let Outcome::Added(quote) = widget.dispatch(Trigger::AddQuote(draft))? {
                println!("Added quote {} to '{}'", quote.id, quote.category);
            }
        }
        Commands::Favorite { id } => {
            if let Outcome::Favorite { favorite, .. } = widget.dispatch(Trigger::ToggleFavorite(id))? {
                match favorite {
                    Some(true) => println!("Quote {} marked as favorite", id),
                    Some(false) => println!("Quote {} is no longer a favorite", id),
                    None => return Err(QuoteError::QuoteNotFound(id)),
                }
            }
        }
        Commands::Filter { filter, reset } => {
            if reset {
                widget.dispatch(Trigger::ApplyFilter(FilterSpec::default()))?;
            } else if !filter.is_empty() {
                let spec = filter_from(&filter, widget.filter())?;
                widget.dispatch(Trigger::ApplyFilter(spec))?;
            }
            println!("{}", format_filter(widget.filter()));
        }
        Commands::Export { output } => {
            if let Outcome::Exported(document) = widget.dispatch(Trigger::Export)? {
                let json = document.to_json()?;
                match output.as_deref() {
                    Some(path) if path == Path::new("-") => println!("{}", json),
                    Some(path) => write_export(path, &json, document.total_quotes)?,
                    None => {
                        let name = export_filename(chrono::Utc::now().date_naive());
                        write_export(Path::new(&name), &json, document.total_quotes)?
                    }
                }
            }
        }
        Commands::Import { path } => {
            let contents = fs::read_to_string(&path)?;
            if let Outcome::Imported(report) = widget.dispatch(Trigger::Import(contents))? {
                println!("{}", format_import_report(&report));
            }
        }
        Commands::Clear => {
            widget.dispatch(Trigger::ClearStorage)?;
            println!(
                "Storage cleared; {} default quotes restored",
                widget.store().len()
            );
        }
        Commands::Sync { watch, ticks } => {
            let remote = HttpRemote::new(
                &config.sync.endpoint,
                Duration::from_secs(config.sync.timeout_secs),
            )?;
            let agent = SyncAgent::new(
                Box::new(remote),
                config.sync.policy,
                Duration::from_secs(config.sync.interval_secs),
            );
            let mut widget = widget.with_sync(agent);

            if watch {
                let prefs = widget.preferences();
                widget.run_sync(ticks, |outcome| print_sync_outcome(outcome, prefs));
            } else {
                let outcome = widget.dispatch(Trigger::SyncTick)?;
                print_sync_outcome(&outcome, widget.preferences());
            }
        }
        Commands::Prefs { show_category } => {
            if let Some(show) = show_category {
                widget.dispatch(Trigger::SetShowCategory(show))?;
            }
            println!("show_category = {}", widget.preferences().show_category);
        }
        Commands::Init { .. } | Commands::Config { .. } => {}
    }
    Ok(())
}

fn write_export(path: &Path, json: &str, total: usize) -> Result<(), QuoteError> {
    fs::write(path, json)?;
    println!("Exported {} quotes to {}", total, path.display());
    Ok(())
}

fn print_outcome(widget: &QuoteWidget, outcome: &Outcome) {
    match outcome {
        Outcome::Shown(pick) => println!("{}", format_pick(pick, widget.preferences()).trim_end()),
        Outcome::Notice(notice) => print_notice(notice),
        _ => {}
    }
}

fn print_sync_outcome(outcome: &Outcome, prefs: UserPreferences) {
    match outcome {
        Outcome::Synced { report, pick } => {
            println!("{}", format_sync_report(report));
            println!("{}", format_pick(pick, prefs).trim_end());
        }
        Outcome::Notice(notice) => print_notice(notice),
        _ => {}
    }
}

fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => println!("{}", format_notice(notice)),
        NoticeLevel::Warning => eprintln!("{}", format_notice(notice)),
    }
}
