use std::error::Error;
use std::io::BufRead;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use sonos_driver::{
    init_logging_from_env, DriverConfig, LoggingBus, PlayerCommand, Reactor, SonosConnector,
    SonosDriver, SsdpDiscovery,
};

fn main() -> Result<(), Box<dyn Error>> {
    init_logging_from_env()?;

    let config = DriverConfig::from_env()?;
    config.validate()?;

    let (mut reactor, notifications) = Reactor::start(config.callback_port_range)?;
    let connector = SonosConnector::for_reactor(&reactor, &config)?;
    let transport = SsdpDiscovery::new(config.discovery_timeout)?;
    let bus = Arc::new(LoggingBus::new());

    let mut driver = SonosDriver::new(
        config,
        Arc::new(transport),
        Arc::new(connector),
        bus.clone(),
        notifications,
    );
    driver.start()?;

    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    thread::Builder::new()
        .name("sonos-console".to_string())
        .spawn(move || run_console(&bus))?;

    tracing::info!("running, enter `<zone id> <command>` to control a zone, Ctrl+C to stop");
    let _ = stop_rx.recv();

    driver.stop();
    reactor.shutdown();
    Ok(())
}

/// Read `<zone id> <command>` lines from stdin and send them over the bus
fn run_console(bus: &LoggingBus) {
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(error = %e, "console closed");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((zone_id, command)) = line.split_once(char::is_whitespace) else {
            tracing::warn!(zones = ?bus.zone_ids(), "expected `<zone id> <command>`");
            continue;
        };

        let result = command
            .parse::<PlayerCommand>()
            .and_then(|command| bus.dispatch(zone_id, &command));
        if let Err(e) = result {
            tracing::warn!(zone = %zone_id, error = %e, "command failed");
        }
    }
}
