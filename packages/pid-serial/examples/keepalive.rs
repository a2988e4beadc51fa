use std::time::Duration;

use log::{info, warn};
use pid_serial::{serial, SessionError};
use tokio::time::interval;

#[tokio::main]
async fn main() -> Result<(), SessionError> {
    // Initialize the logger
    simplelog::TermLogger::init(
        log::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Always,
    )
    .unwrap();

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let text = args
        .next()
        .unwrap_or_else(|| "V0^OPEN_FOR BUSINESS|H20^~12:34".to_string());

    let mut session = serial::open_session(&path)?;
    session.send(&text).await?;
    info!("Showing {text:?} on {path}");

    // Displays clear themselves after about a minute without traffic.
    let mut keepalive = interval(Duration::from_secs(10));
    keepalive.tick().await;

    for _ in 0..30 {
        keepalive.tick().await;
        match session.ping().await {
            Ok(()) => info!("Pinged display."),
            Err(e) if e.is_transport() => warn!("Ping failed, trying again next tick: {e}"),
            Err(e) => {
                session.close().await?;
                return Err(e);
            }
        }
    }

    session.close().await
}
