use shift_roster_backend::telemetry::setup_tracing;
use shift_roster_backend::{AppError, RosterController};
use shift_roster_client::HttpRosterClient;
use shift_roster_config::get_config;
use tracing::{error, info};

// roster [--json]
#[tokio::main]
async fn main() -> Result<(), AppError> {
    setup_tracing();

    let json = std::env::args().skip(1).any(|arg| arg == "--json");
    let config = get_config()?;
    let client = HttpRosterClient::from_config(&config)?;

    info!("loading project {}", client.project_id());
    let project = client.fetch_project().await?;
    let mut controller =
        RosterController::with_fallback_start(project, config.start_date, config.offset)?;

    if let Err(err) = controller.load(&client).await {
        // the view still gets printed, it carries the retry affordance
        error!("{err}");
    }

    let view = controller.view();
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{view}");
    }
    Ok(())
}
