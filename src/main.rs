// Hide console window on Windows release builds
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::sync::{Arc, mpsc};
use webnest::app::{AppContext, AppOptions};
use webnest::cli::{Cli, Commands, ProfileCommand};
use webnest::ipc::server;
use webnest::notify::{DialogNotifier, LogNotifier, dialog_channel};
use webnest_config::ProfileId;
use webnest_update::Notifier;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI flag or RUST_LOG for now; the config level is applied once loaded.
    let cli_level = cli.log_level.map(|l| l.to_level_filter());
    webnest::debug::init_log_bridge(webnest::debug::resolve_level(
        cli_level,
        log::LevelFilter::Info,
    ));
    log::info!("Starting webnest {}", webnest::VERSION);

    // Clean up leftover .old binary from a previous self-update (Windows)
    webnest_update::install::cleanup_old_binary();

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let code = if cli.command() == Commands::Serve {
        // Dialogs are shown here on the main thread while the app runs on the runtime.
        let (notifier, dialogs) = dialog_channel();
        let (done_tx, done_rx) = mpsc::channel();
        runtime.spawn(async move {
            let _ = done_tx.send(run(cli, cli_level, Arc::new(notifier)).await);
        });
        dialogs
            .run_until(&DialogNotifier, &done_rx)
            .unwrap_or_else(|| Err(anyhow!("Application task ended unexpectedly")))
    } else {
        runtime.block_on(run(cli, cli_level, Arc::new(LogNotifier)))
    };
    runtime.shutdown_timeout(std::time::Duration::from_secs(2));

    match code {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("webnest: error: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run(
    cli: Cli,
    cli_level: Option<log::LevelFilter>,
    notifier: Arc<dyn Notifier>,
) -> Result<i32> {
    let command = cli.command();
    let options = AppOptions {
        config_path: cli.config.clone(),
        ephemeral: cli.ephemeral,
        check_updates: cli.check_updates,
        profile: cli.profile.clone(),
    };

    let mut app = AppContext::build(options, notifier)?;
    webnest::debug::init_log_bridge(webnest::debug::resolve_level(
        cli_level,
        app.config.log_level.to_level_filter(),
    ));
    app.prime().await?;

    match command {
        Commands::Serve => {
            app.start_updates()?;
            let handler = app.ipc_handler();
            server::serve_stdio(&handler).await?;
        }
        Commands::Profiles { action } => profiles(&app, action).await?,
        Commands::Logout => {
            app.session.clear_active_profile_storage().await?;
            println!("Logged out");
        }
        Commands::Relaunch { args } => {
            // Only returns when the new process could not be started.
            let outcome = app.relaunch.relaunch_with_args(&args);
            bail!("Relaunch did not complete: {outcome:?}");
        }
    }
    Ok(0)
}

async fn profiles(app: &AppContext, action: ProfileCommand) -> Result<()> {
    match action {
        ProfileCommand::List => {
            let active = app.session.get_active_profile();
            match app.session.get_all_profiles().await? {
                None => println!("No profiles"),
                Some(profiles) if profiles.is_empty() => println!("No profiles"),
                Some(profiles) => {
                    for profile in profiles.values() {
                        let marker = if active.as_ref() == Some(&profile.id) {
                            "*"
                        } else {
                            " "
                        };
                        println!("{} {}  {}  {}", marker, profile.id, profile.color, profile.name);
                    }
                }
            }
        }
        ProfileCommand::Create { id, name } => {
            let result = app
                .session
                .create_profile(ProfileId::new(id), name)
                .await?;
            println!("Created profile {} ({})", result.id, result.name);
        }
        ProfileCommand::Delete { id } => {
            let id = ProfileId::new(id);
            if app.session.delete_profile(&id).await? {
                println!("Deleted profile {id}");
            } else {
                println!("No profile {id}");
            }
        }
        ProfileCommand::Use { id } => {
            let id = ProfileId::new(id);
            if app.session.get_profile(&id).await?.is_none() {
                bail!("Profile '{id}' does not exist");
            }
            app.session.set_active_profile(Some(id.clone())).await?;
            println!("Active profile: {id}");
        }
    }
    Ok(())
}
