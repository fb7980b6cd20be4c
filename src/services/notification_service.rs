use crate::config::EmailConfig;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, instrument, warn};

/// Best-effort outcome email. Every failure here is logged and swallowed;
/// nothing in the reconciliation path waits on or rolls back over a mail
/// problem.
pub struct NotificationService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: String,
}

impl NotificationService {
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| anyhow::anyhow!("Failed to create SMTP transport: {}", e))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        })
    }

    /// Tell the user how their training ended. Fire-and-forget.
    #[instrument(skip(self))]
    pub async fn notify_training_outcome(
        &self,
        to_email: &str,
        to_name: Option<&str>,
        model_name: &str,
        status_text: &str,
    ) {
        let subject = format!("Model training {}", status_text);
        let message = if status_text == "succeeded" {
            format!(
                "Your model \"{}\" has finished training and is ready to use.",
                model_name
            )
        } else {
            format!("Your model \"{}\" training has {}.", model_name, status_text)
        };

        if let Err(e) = self.send(to_email, to_name, &subject, &message).await {
            warn!(
                "Failed to send training outcome email to {}: {}",
                to_email, e
            );
        } else {
            info!("Sent training {} email to {}", status_text, to_email);
        }
    }

    async fn send(
        &self,
        to_email: &str,
        to_name: Option<&str>,
        subject: &str,
        message: &str,
    ) -> anyhow::Result<()> {
        let from = format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| anyhow::anyhow!("parse from address: {}", e))?;

        let to = match to_name {
            Some(name) => format!("{} <{}>", name, to_email),
            None => to_email.to_string(),
        }
        .parse::<Mailbox>()
        .map_err(|e| anyhow::anyhow!("parse to address: {}", e))?;

        let body = outcome_body(to_name, message);

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| anyhow::anyhow!("build message: {}", e))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| anyhow::anyhow!("send email: {}", e))?;

        Ok(())
    }
}

fn outcome_body(to_name: Option<&str>, message: &str) -> String {
    let greeting = match to_name {
        Some(name) => format!("Hello {},", name),
        None => "Hello,".to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <p>{greeting}</p>
        <p>{message}</p>
        <p style="margin-top: 30px; font-size: 12px; color: #666;">
            This is an automated message, please do not reply to this email.
        </p>
    </div>
</body>
</html>"#
    )
}
