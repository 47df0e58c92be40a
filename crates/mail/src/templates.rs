//! Message bodies for the authentication emails.

use crate::OutgoingEmail;

/// Subject and bodies of a rendered template, not yet addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl EmailTemplate {
    pub fn to(self, recipient: impl Into<String>) -> OutgoingEmail {
        OutgoingEmail {
            to: recipient.into(),
            subject: self.subject,
            text: self.text,
            html: self.html,
        }
    }
}

pub fn verify_email(url: &str) -> EmailTemplate {
    EmailTemplate {
        subject: "Verify your email address".to_string(),
        text: format!("Click on the link below to verify your email address:\n{url}"),
        html: layout(
            "Verify your email",
            "Thanks for signing up! Click the button below to confirm your email address.",
            "Verify email",
            url,
        ),
    }
}

pub fn password_reset(url: &str) -> EmailTemplate {
    EmailTemplate {
        subject: "Password reset request".to_string(),
        text: format!(
            "You requested a password reset. Click on the link to reset your password:\n{url}\n\
             The link expires in one hour. If you did not ask for this, ignore this email."
        ),
        html: layout(
            "Reset your password",
            "We received a request to reset your password. The link expires in one hour.",
            "Reset password",
            url,
        ),
    }
}

fn layout(heading: &str, lead: &str, action: &str, url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; color: #1f2933; max-width: 560px; margin: 0 auto; padding: 24px;">
    <h1 style="font-size: 22px;">{heading}</h1>
    <p>{lead}</p>
    <p><a href="{url}" style="display: inline-block; padding: 10px 18px; background: #2563eb; color: #ffffff; text-decoration: none; border-radius: 4px;">{action}</a></p>
    <p style="font-size: 12px; color: #6b7280;">If the button does not work, paste this link into your browser:<br>{url}</p>
  </body>
</html>"#
    )
}
