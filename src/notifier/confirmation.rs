//! src/notifier/confirmation.rs

use async_trait::async_trait;
use htmlescape::encode_minimal;

use super::Notifier;
use crate::configurations::{BrandingSettings, Rendering};
use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::routes::error_chain_fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
}

/// Renders the welcome message from static branding settings.
#[derive(Debug, Clone)]
pub struct ConfirmationTemplate {
    branding: BrandingSettings,
}

impl ConfirmationTemplate {
    pub fn new(branding: BrandingSettings) -> Self {
        Self { branding }
    }

    pub fn render(&self, recipient: &SubscriberEmail) -> RenderedEmail {
        let subject = format!("{}Welcome to our newsletter!", self.branding.subject_prefix);
        let (html, text) = match self.branding.rendering {
            Rendering::Html => (Some(self.html_body(recipient)), None),
            Rendering::Text => (None, Some(self.text_body(recipient))),
            Rendering::Multipart => (
                Some(self.html_body(recipient)),
                Some(self.text_body(recipient)),
            ),
        };
        RenderedEmail {
            subject,
            html,
            text,
        }
    }

    fn text_body(&self, recipient: &SubscriberEmail) -> String {
        let branding = &self.branding;
        let mut body = format!(
            "Welcome to the {company} newsletter!\n\n\
            {email} is now subscribed. You will hear from us when there is something worth reading.\n\n\
            Questions? Reach us at {support}.\n",
            company = branding.company_name,
            email = recipient,
            support = branding.support_email,
        );
        if let Some(website) = &branding.website_url {
            body.push_str(&format!("\n{}\n", website));
        }
        if let Some(address) = &branding.company_address {
            body.push_str(&format!("{}\n", address));
        }
        body
    }

    fn html_body(&self, recipient: &SubscriberEmail) -> String {
        let branding = &self.branding;
        let company = encode_minimal(&branding.company_name);
        let logo = branding
            .logo_url
            .as_deref()
            .map(|url| {
                format!(
                    "<img src=\"{}\" alt=\"{}\" style=\"max-width:160px\" /><br />",
                    encode_minimal(url),
                    company
                )
            })
            .unwrap_or_default();
        let website = branding
            .website_url
            .as_deref()
            .map(|url| {
                let url = encode_minimal(url);
                format!("<p><a href=\"{url}\">{url}</a></p>")
            })
            .unwrap_or_default();
        let address = branding
            .company_address
            .as_deref()
            .map(|address| format!("<p><small>{}</small></p>", encode_minimal(address)))
            .unwrap_or_default();

        format!(
            "{logo}<h1>Welcome to the {company} newsletter!</h1>\
            <p><b>{email}</b> is now subscribed. \
            You will hear from us when there is something worth reading.</p>\
            <p>Questions? Reach us at \
            <a href=\"mailto:{support}\">{support}</a>.</p>\
            {website}{address}",
            email = encode_minimal(recipient.as_ref()),
            support = encode_minimal(&branding.support_email),
        )
    }
}

pub struct ConfirmationNotifier {
    email_client: EmailClient,
    template: ConfirmationTemplate,
}

impl ConfirmationNotifier {
    pub fn new(email_client: EmailClient, template: ConfirmationTemplate) -> Self {
        Self {
            email_client,
            template,
        }
    }
}

struct SendConfirmationError(reqwest::Error);

impl std::fmt::Display for SendConfirmationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to send a confirmation email.")
    }
}

impl std::fmt::Debug for SendConfirmationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl std::error::Error for SendConfirmationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

#[async_trait]
impl Notifier for ConfirmationNotifier {
    #[tracing::instrument(
        name = "Sending new subscriber a confirmation email",
        skip(self, recipient),
        fields(subscriber_email = %recipient)
    )]
    async fn notify(&self, recipient: &SubscriberEmail) -> bool {
        let message = self.template.render(recipient);
        let outcome = self
            .email_client
            .send_email(
                recipient,
                &message.subject,
                message.html.as_deref(),
                message.text.as_deref(),
            )
            .await;
        match outcome {
            Ok(()) => true,
            Err(e) => {
                let e = SendConfirmationError(e);
                tracing::error!(error.cause_chain = ?e, "Failed to send a confirmation email");
                false
            }
        }
    }
}
