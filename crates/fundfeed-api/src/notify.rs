//! Email notification on contact-request creation, with a time-window
//! throttle so a burst of requests from the same developer to the same
//! investor produces one email. Failures never reach the caller; the
//! request itself has already committed.

use anyhow::Result;
use chrono::{Duration, Utc};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error, info};

use fundfeed_db::models::ContactRequestRow;

use crate::AppState;

/// Repeat requests on the same (developer, investor) pair inside this
/// window suppress the email.
const THROTTLE_WINDOW_MINUTES: i64 = 30;

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn new(host: &str, username: &str, password: &str, from: &str) -> Result<Self> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid from address '{}': {}", from, e))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        Ok(Self { transport, from })
    }

    async fn send(&self, to: Mailbox, subject: String, body: String) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .body(body)?;
        self.transport.send(email).await?;
        Ok(())
    }
}

/// Fire-and-forget entry point called after a request row commits.
pub async fn contact_request_created(state: &AppState, request: &ContactRequestRow) {
    if let Err(e) = try_notify(state, request).await {
        error!("contact request notification failed: {:#}", e);
    }
}

async fn try_notify(state: &AppState, request: &ContactRequestRow) -> Result<()> {
    let since = (Utc::now() - Duration::minutes(THROTTLE_WINDOW_MINUTES)).to_rfc3339();
    let recent = state.db.count_recent_requests(
        &request.developer_id,
        &request.investor_id,
        &since,
        &request.id,
    )?;

    let developer = state
        .db
        .get_user_by_id(&request.developer_id)?
        .ok_or_else(|| anyhow::anyhow!("developer {} missing", request.developer_id))?;
    let investor = state
        .db
        .get_user_by_id(&request.investor_id)?
        .ok_or_else(|| anyhow::anyhow!("investor {} missing", request.investor_id))?;

    if recent > 0 {
        info!(
            "Notification throttled: {} -> {} (recent request exists)",
            developer.email, investor.email
        );
        return Ok(());
    }

    let Some(mailer) = &state.mailer else {
        debug!("SMTP not configured; skipping contact request notification");
        return Ok(());
    };

    let sender_name = if developer.username.is_empty() {
        developer.email.clone()
    } else {
        developer.username.clone()
    };
    let (subject, body) = notification_email(&sender_name, &request.message);

    let to: Mailbox = investor
        .email
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid recipient address '{}': {}", investor.email, e))?;

    mailer.send(to, subject, body).await?;
    info!("Notification email sent to {}", investor.email);
    Ok(())
}

fn notification_email(sender_name: &str, message: &str) -> (String, String) {
    let subject = format!("New Contact Request from {} on FundFeed", sender_name);
    let body = format!(
        "Hello,\n\n\
         You have received a new contact request from {}.\n\n\
         Message:\n{}\n\n\
         Log in to FundFeed to view more details and respond.\n\n\
         Best regards,\nThe FundFeed Team",
        sender_name, message
    );
    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_template_carries_sender_and_message() {
        let (subject, body) = notification_email("ada", "Let's talk about your round.");
        assert_eq!(subject, "New Contact Request from ada on FundFeed");
        assert!(body.contains("from ada"));
        assert!(body.contains("Let's talk about your round."));
    }
}
