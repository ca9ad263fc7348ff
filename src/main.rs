use anyhow::Result;
use giiker_cube::app;
use giiker_cube::domain::coloring;
use giiker_cube::domain::models::CubeEvent;
use giiker_cube::domain::session::{CubeSession, MoveDispatch};
use giiker_cube::domain::settings::SettingsService;
use giiker_cube::infrastructure::bluetooth::replay::ReplayTransport;
use giiker_cube::infrastructure::dispatcher::Dispatcher;
use giiker_cube::infrastructure::logging;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const USAGE: &str = "usage: giiker_cube [--replay <file|->]";

/// Log every event and print the coloring after each state change
async fn report(mut events: mpsc::UnboundedReceiver<CubeEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            CubeEvent::Move(m) => info!("Move: {}", m.notation),
            CubeEvent::StateChanged(state) => match coloring::coloring(&state) {
                Ok(coloring) => match serde_json::to_string(&coloring) {
                    Ok(json) => println!("{}", json),
                    Err(e) => error!("Failed to serialize coloring: {}", e),
                },
                Err(e) => warn!("Cannot project colors: {}", e),
            },
            CubeEvent::BatteryChanged { level } => info!("Battery: {}%", level),
            CubeEvent::DecodeFailed(e) => error!("Decode error: {}", e),
            CubeEvent::Disconnected => warn!("Cube disconnected"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings_service = SettingsService::new()?;
    let settings = settings_service.get().clone();
    let _logging_guard = logging::init_logger(&settings.log_settings)
        .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
        .ok();

    info!("Starting Giiker Cube decoder");

    let move_dispatch = if settings.dispatch_move_history {
        MoveDispatch::All
    } else {
        MoveDispatch::Latest
    };
    let mut session = CubeSession::new(move_dispatch);
    let mut dispatcher = Dispatcher::new();
    let (_, events) = dispatcher.subscribe();
    let reporter = tokio::spawn(report(events));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [flag, source] if flag == "--replay" => {
            if source == "-" {
                let mut transport = ReplayTransport::new(BufReader::new(tokio::io::stdin()));
                app::run(&mut transport, &mut session, &mut dispatcher).await?;
            } else {
                let file = tokio::fs::File::open(source).await?;
                let mut transport = ReplayTransport::new(BufReader::new(file));
                app::run(&mut transport, &mut session, &mut dispatcher).await?;
            }
        }
        [] => run_bluetooth(settings_service, &mut session, &mut dispatcher).await?,
        _ => anyhow::bail!(USAGE),
    }

    drop(dispatcher);
    if let Err(e) = reporter.await {
        error!("Reporter task failed: {}", e);
    }
    Ok(())
}

#[cfg(windows)]
async fn run_bluetooth(
    mut settings_service: SettingsService,
    session: &mut CubeSession,
    dispatcher: &mut Dispatcher,
) -> Result<()> {
    use giiker_cube::infrastructure::bluetooth::{connection::ConnectionConfig, BluetoothService};
    use std::time::Duration;

    let settings = settings_service.get().clone();
    let mut service = BluetoothService::new(ConnectionConfig::from(&settings));

    let address = match settings.last_connected_address {
        Some(address) => address,
        None => {
            service
                .discover(Duration::from_millis(settings.scan_timeout_ms))
                .await?
                .address
        }
    };

    service.connect(address).await?;
    if let Err(e) = settings_service.set_last_connected(address) {
        warn!("Failed to save settings: {}", e);
    }

    app::run(&mut service, session, dispatcher).await
}

#[cfg(not(windows))]
async fn run_bluetooth(
    _settings_service: SettingsService,
    _session: &mut CubeSession,
    _dispatcher: &mut Dispatcher,
) -> Result<()> {
    anyhow::bail!("Bluetooth is only supported on Windows; {}", USAGE)
}
