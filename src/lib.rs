pub mod bridge;
mod commands;
pub mod dashboard;
pub mod models;
pub mod monitor;
pub mod settings;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::{self, MissedTickBehavior},
};

use bridge::MonitoringBridge;
use commands::{Command, HELP};
use dashboard::{render_text, DashboardView};
use monitor::MonitorService;
use settings::{MonitorSettings, SettingsStore};

/// Entry point of the `deskwatch` binary.
pub fn run() -> Result<()> {
    utils::logging::init();

    log::info!("deskwatch starting up...");

    let store = SettingsStore::new(SettingsStore::default_path()?)?;
    log::info!("settings: {}", store.path().display());
    let settings = store.monitor().clone();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("deskwatch-rt")
        .build()
        .context("failed to start the tokio runtime")?;

    runtime.block_on(run_dashboard(settings))
}

async fn run_dashboard(settings: MonitorSettings) -> Result<()> {
    let sources = monitor::platform::default_sources(&settings)?;
    let service = MonitorService::spawn(sources, settings.service_config());
    let bridge: Arc<dyn MonitoringBridge> = Arc::new(service.bridge());
    let view = DashboardView::mount(bridge, settings.dashboard_config());

    if settings.auto_start {
        view.start_monitoring();
    }

    println!("{HELP}");
    println!("{}", render_text(&view.render()));

    let mut revisions = view.subscribe();
    let mut rendered = *revisions.borrow_and_update();
    let mut render_tick = time::interval(settings.render_interval());
    render_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            result = &mut interrupted => {
                if let Err(err) = result {
                    log::warn!("failed to listen for Ctrl-C: {err}");
                }
                log::info!("interrupted, shutting down");
                break;
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match Command::parse(&line) {
                    Some(Command::Start) => view.start_monitoring(),
                    Some(Command::Stop) => view.stop_monitoring(),
                    Some(Command::Help) => println!("{HELP}"),
                    Some(Command::Quit) => break,
                    None if line.trim().is_empty() => {}
                    None => println!("unknown command `{}`; {HELP}", line.trim()),
                },
                // Detached from a terminal: keep monitoring until interrupted.
                Ok(None) => stdin_open = false,
                Err(err) => {
                    log::warn!("failed to read stdin: {err}");
                    stdin_open = false;
                }
            },
            _ = render_tick.tick() => {
                let current = *revisions.borrow_and_update();
                if current != rendered {
                    rendered = current;
                    println!("{}", render_text(&view.render()));
                }
            }
        }
    }

    view.unmount().await;
    service.shutdown().await?;
    log::info!("deskwatch stopped");
    Ok(())
}
