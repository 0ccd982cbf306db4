use clap::Parser;

use newsletter_signup::configurations::get_configuration;
use newsletter_signup::startup::get_connection_pool;
use newsletter_signup::store::{PostgresSubscriberStore, SubscriberStore};
use newsletter_signup::telemetry::{get_subscriber, init_subscriber};

#[derive(Parser, Debug)]
#[command(
    name = "warmup_db",
    about = "Open a database connection and run the checks the server relies on"
)]
struct Args {
    /// Apply pending migrations before running the checks.
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let subscriber = get_subscriber("warmup_db".into(), "info".into(), std::io::stderr);
    init_subscriber(subscriber);

    let configuration = get_configuration()?;
    let pool = get_connection_pool(&configuration.database);

    if args.migrate {
        sqlx::migrate!("./migrations").run(&pool).await?;
        println!("✓ Migrations applied");
    }

    let store = PostgresSubscriberStore::new(pool);
    store.warm_up().await?;
    println!("✓ Database connection test passed");

    let count = store.count().await?;
    println!("✓ Model access test passed: {count} subscriptions found");
    println!("Database warmup completed successfully!");
    Ok(())
}
