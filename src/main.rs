mod cli;

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use notify_manager::api::client::HubClient;
use notify_manager::app::AppConfig;
use notify_manager::error::ConfigError;
use notify_manager::manager::collection::DeleteOutcome;
use notify_manager::manager::composer;
use notify_manager::ports::{DeviceDirectory, LocalCache};
use notify_manager::storage::{MemoryCache, SqliteCache};
use notify_manager::utils::{normalize_url, RUNTIME};
use notify_manager::{NotifyManager, Result, SendOutcome};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, GroupAction, SendArgs, TemplateAction};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match RUNTIME.block_on(run(cli.command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

// `RUST_LOG` wins over the flag. Records from the `log` facade are bridged.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("notify_manager=debug,warn")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

async fn run(command: Command) -> Result<()> {
    if let Command::Login { url, token } = command {
        return login(&url, &token).await;
    }

    let config = AppConfig::load();
    if !config.is_configured() {
        return Err(ConfigError::NotConfigured.into());
    }
    let client = Arc::new(HubClient::new(&config.base_url, &config.token));

    if let Command::Devices = command {
        for device in client.devices().await? {
            println!("{device}");
        }
        return Ok(());
    }

    let nm = NotifyManager::new(client.clone(), client.clone(), client, open_cache(&config));
    nm.load().await;

    match command {
        Command::Templates { action } => templates(&nm, action).await,
        Command::Groups { action } => groups(&nm, action).await,
        Command::Send(args) => send(&nm, args).await,
        Command::Login { .. } | Command::Devices => Ok(()),
    }
}

fn open_cache(config: &AppConfig) -> Arc<dyn LocalCache> {
    let opened = match &config.cache_path {
        Some(path) => SqliteCache::open(path),
        None => SqliteCache::open_default(),
    };
    match opened {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            eprintln!("Local cache unavailable, changes will only reach the hub: {e}");
            Arc::new(MemoryCache::new())
        }
    }
}

async fn login(url: &str, token: &str) -> Result<()> {
    let url = normalize_url(url);
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(notify_manager::error::RemoteError::from)?;
    let client = HubClient::new(&url, token).with_http(http);

    // Credentials are stored even when the hub cannot be reached right now.
    let message = match client.ping().await {
        Ok(status) if (200..300).contains(&status) => "Connected".to_string(),
        Ok(status) => format!("Saved (hub answered HTTP {status})"),
        Err(_) => "Saved (hub unreachable)".to_string(),
    };
    let config = AppConfig {
        base_url: url,
        token: token.to_string(),
        ..AppConfig::load()
    };
    config.save()?;
    println!("{message}");
    Ok(())
}

fn assume_yes(_: &str) -> bool {
    true
}

fn confirm_on_stdin(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    let _ = io::stdout().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim(), "y" | "Y" | "yes")
}

fn report_delete(outcome: DeleteOutcome) {
    match outcome {
        DeleteOutcome::Removed => println!("Deleted."),
        DeleteOutcome::NotFound => println!("Nothing to delete."),
        DeleteOutcome::Declined => println!("Kept."),
    }
}

fn preview(text: &str) -> String {
    let short: String = text.chars().take(40).collect();
    if text.chars().count() > 40 { format!("{short}...") } else { short }
}

async fn templates(nm: &NotifyManager, action: TemplateAction) -> Result<()> {
    match action {
        TemplateAction::List => {
            for t in nm.templates().await {
                println!("{}  {}", t.id, t.name);
                println!("    {}: {}", t.title, preview(&t.message));
                println!("    type: {:?} | priority: {}", t.kind, t.priority.as_str());
            }
        }
        TemplateAction::Delete { id, yes } => {
            let confirm: fn(&str) -> bool = if yes { assume_yes } else { confirm_on_stdin };
            report_delete(nm.delete_template(&id, &confirm).await);
        }
    }
    Ok(())
}

async fn groups(nm: &NotifyManager, action: GroupAction) -> Result<()> {
    match action {
        GroupAction::List => {
            for g in nm.groups().await {
                let devices: Vec<&str> = g.devices.iter().map(String::as_str).collect();
                println!("{}  {} ({} devices): {}", g.id, g.name, devices.len(), devices.join(", "));
            }
        }
        GroupAction::Create { name, devices } => {
            let group = devices
                .iter()
                .fold(notify_manager::api::models::Group::new(name), |g, d| {
                    if g.contains(d) { g } else { g.toggled(d) }
                });
            let saved = nm.save_group(group).await?;
            println!("{}", saved.id);
        }
        GroupAction::Toggle { group, device } => {
            let updated = nm.toggle_group_membership(&group, &device).await?;
            let state = if updated.contains(&device) { "added to" } else { "removed from" };
            println!("{device} {state} {}", updated.name);
        }
        GroupAction::Delete { id, yes } => {
            let confirm: fn(&str) -> bool = if yes { assume_yes } else { confirm_on_stdin };
            report_delete(nm.delete_group(&id, &confirm).await);
        }
    }
    Ok(())
}

async fn send(nm: &NotifyManager, args: SendArgs) -> Result<()> {
    if let Some(id) = &args.template {
        if !nm.apply_template(id).await {
            eprintln!("No template with id {id}");
        }
    }
    nm.update_draft(|mut d| {
        if let Some(title) = &args.title {
            d = composer::set_title(d, title);
        }
        if let Some(message) = &args.message {
            d = composer::set_message(d, message);
        }
        if let Some(kind) = args.kind {
            d = composer::set_type(d, kind);
        }
        if let Some(priority) = args.priority {
            d = composer::set_priority(d, priority);
        }
        if let Some(preset) = &args.buttons {
            d = composer::apply_button_preset(d, preset);
        }
        if let Some(camera) = &args.camera {
            d = composer::set_camera(d, camera);
        }
        if let Some(click_action) = &args.click_action {
            d = composer::set_click_action(d, click_action);
        }
        if let Some(group) = &args.group {
            d = composer::select_group(d, group);
        }
        if !args.device.is_empty() {
            d = composer::select_devices(d, args.device.iter().map(String::as_str));
        }
        d
    });

    if let Some(name) = &args.save_as {
        let saved = nm.save_draft_as_template(name).await?;
        println!("Template {} saved", saved.id);
    }

    match nm.send().await? {
        SendOutcome::Sent => {
            if let Some(status) = nm.status() {
                println!("{status}");
            }
        }
        SendOutcome::EmptyMessage => eprintln!("Nothing sent: the message is empty."),
        SendOutcome::Busy => eprintln!("A notification is already being sent."),
    }
    Ok(())
}
