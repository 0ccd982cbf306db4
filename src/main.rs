//! src/main.rs

use newsletter_signup::configurations::get_configuration;
use newsletter_signup::startup::Application;
use newsletter_signup::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("newsletter_signup".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration()?;
    let application = Application::build(configuration).await?;
    tracing::info!(port = application.port(), "Listening for subscribe requests");
    application.run_until_stopped().await?;
    Ok(())
}
