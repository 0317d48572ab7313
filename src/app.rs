use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::{
    alerts::bus::{self, AlertBus},
    alerts::model::Notification,
    config::{ConfigManager, Settings},
    contacts::router::{LogTransport, NotificationRouter},
    coordinator::{Coordinator, Sample},
    error::{MonitorError, Result},
    inbox::Inbox,
};

const CONFIG_DIR_ENV: &str = "CARE_WATCH_CONFIG_DIR";

/// Reads NDJSON samples from stdin until EOF and runs the periodic idle check.
pub fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Initialize Config
    let config_dir = std::env::var_os(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let config_manager = ConfigManager::new(config_dir);
    let settings = config_manager.load();
    log::info!("Loaded settings from {:?}", config_manager.path());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(monitor(settings))
}

async fn monitor(settings: Settings) -> Result<()> {
    let router = NotificationRouter::new(settings.contacts.clone(), Arc::new(LogTransport));
    let alert_bus = AlertBus::for_current_runtime(router)?.with_triggers(settings.triggers.clone());
    let alert_bus = bus::install_global(alert_bus)?;

    let permission = alert_bus.request_permission();
    log::info!("Push permission: {:?}", permission);

    let inbox = Arc::new(Mutex::new(Inbox::with_capacity(settings.inbox_capacity)));
    let _inbox_subscription = Inbox::attach(&inbox, &alert_bus);
    let _log_subscription = alert_bus.subscribe(|n: &Notification| {
        log::info!(
            "{} [{}] {}: {}",
            n.severity().indicator(),
            n.kind().as_str(),
            n.title(),
            n.message()
        );
    });

    let mut coordinator = Coordinator::new(Arc::clone(&alert_bus), &settings);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut idle_check =
        tokio::time::interval(Duration::from_secs(settings.inactivity_check_seconds.max(1)));
    // First tick fires immediately
    idle_check.tick().await;

    log::info!("Monitoring started. Reading samples from stdin");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match parse_sample(&line) {
                        Ok(sample) => {
                            coordinator.handle(sample);
                        }
                        Err(e) => log::warn!("Skipping sample {:?}: {}", line, e),
                    },
                    None => break,
                }
            }
            _ = idle_check.tick() => {
                coordinator.check_idle();
            }
        }
    }

    {
        let inbox = inbox.lock().unwrap_or_else(PoisonError::into_inner);
        log::info!(
            "Input closed. {} recent notifications kept, {} unread",
            inbox.len(),
            inbox.unread_count()
        );
    }

    alert_bus.flush().await;
    bus::uninstall_global();
    Ok(())
}

fn parse_sample(line: &str) -> std::result::Result<Sample, MonitorError> {
    Ok(serde_json::from_str(line)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample() {
        assert_eq!(
            parse_sample(r#"{"sample":"position","lat":1.5,"lng":-2.0}"#).unwrap(),
            Sample::Position { lat: 1.5, lng: -2.0 }
        );
        assert!(matches!(
            parse_sample(r#"{"sample":"teleport"}"#),
            Err(MonitorError::Json(_))
        ));
    }
}
