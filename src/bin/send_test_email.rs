use clap::Parser;

use newsletter_signup::configurations::get_configuration;
use newsletter_signup::domain::SubscriberEmail;
use newsletter_signup::notifier::{ConfirmationNotifier, ConfirmationTemplate, Notifier};
use newsletter_signup::telemetry::{get_subscriber, init_subscriber};

#[derive(Parser, Debug)]
#[command(
    name = "send_test_email",
    about = "Send a confirmation email to verify the email configuration"
)]
struct Args {
    /// Address that receives the test email.
    email: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let subscriber = get_subscriber("send_test_email".into(), "info".into(), std::io::stderr);
    init_subscriber(subscriber);

    let recipient = SubscriberEmail::parse(args.email)
        .map_err(|e| anyhow::anyhow!("Refusing to send a test email: {e}"))?;

    println!("Step 1: Checking email configuration...");
    let configuration = get_configuration()?;
    let email_client = configuration.email_client.client()?;
    println!(
        "✓ Email API at {} will send as {}",
        email_client.base_url(),
        email_client.sender()
    );

    println!("Step 2: Sending test email to {recipient}...");
    let notifier = ConfirmationNotifier::new(
        email_client,
        ConfirmationTemplate::new(configuration.branding),
    );
    if notifier.notify(&recipient).await {
        println!("✓ Test email sent successfully to {recipient}");
        println!("Please check the inbox (and spam folder) for the test email.");
        Ok(())
    } else {
        anyhow::bail!("Failed to send test email to {recipient}, check the logs above for details")
    }
}
