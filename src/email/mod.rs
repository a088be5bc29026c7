//! Outbound account email.
//!
//! [`EmailSender`] abstracts delivery. [`smtp::SmtpEmailSender`] sends real
//! mail; [`LogEmailSender`] logs the payload instead, for local dev and
//! tests. Delivery is best-effort everywhere: callers log failures and move
//! on, the surrounding operation never fails because of email.

pub mod smtp;

use anyhow::Result;
use tracing::info;

pub const WELCOME_SUBJECT: &str = "Welcome to RideAware";
pub const RESET_SUBJECT: &str = "Reset Your RideAware Password";

/// Email delivery abstraction.
pub trait EmailSender: Send + Sync {
    /// Deliver the post-signup welcome message.
    ///
    /// # Errors
    ///
    /// Returns an error when delivery fails; callers treat it as
    /// best-effort.
    fn send_welcome_email(&self, to_email: &str, display_name: &str) -> Result<()>;

    /// Deliver a password-reset link.
    ///
    /// # Errors
    ///
    /// Returns an error when delivery fails; callers treat it as
    /// best-effort.
    fn send_password_reset_email(
        &self,
        to_email: &str,
        display_name: &str,
        reset_link: &str,
    ) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send_welcome_email(&self, to_email: &str, display_name: &str) -> Result<()> {
        info!(
            to_email = %to_email,
            display_name = %display_name,
            "welcome email send stub"
        );
        Ok(())
    }

    fn send_password_reset_email(
        &self,
        to_email: &str,
        display_name: &str,
        reset_link: &str,
    ) -> Result<()> {
        info!(
            to_email = %to_email,
            display_name = %display_name,
            reset_link = %reset_link,
            "password reset email send stub"
        );
        Ok(())
    }
}

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
    .container { max-width: 600px; margin: 0 auto; padding: 20px; }
    .header { background: linear-gradient(135deg, #1e4e9c 0%, #337cf2 100%); color: white; padding: 20px; border-radius: 8px; }
    .content { padding: 20px; background: #f9f9f9; margin: 20px 0; border-radius: 8px; }
    .button { background: linear-gradient(135deg, #1e4e9c 0%, #337cf2 100%); color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; display: inline-block; margin: 20px 0; }
    .footer { text-align: center; color: #666; font-size: 12px; margin-top: 20px; }
"#;

#[must_use]
pub fn welcome_email_html(display_name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><style>{STYLE}</style></head>
<body>
  <div class="container">
    <div class="header"><h2>Welcome to RideAware</h2></div>
    <div class="content">
      <p>Hi {display_name},</p>
      <p>Your account has been created successfully!</p>
      <p>You're now ready to:</p>
      <ul>
        <li>Track your cycling performance</li>
        <li>Manage your equipment</li>
        <li>Create custom training zones</li>
        <li>Plan structured workouts</li>
      </ul>
      <p>Get started by logging in to your account and setting up your profile.</p>
      <p><a href="https://rideaware.app" class="button">Go to RideAware</a></p>
    </div>
    <div class="footer"><p>&copy; RideAware. All rights reserved.</p></div>
  </div>
</body>
</html>"#
    )
}

#[must_use]
pub fn reset_email_html(display_name: &str, reset_link: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><style>{STYLE}</style></head>
<body>
  <div class="container">
    <div class="header"><h2>Password Reset Request</h2></div>
    <div class="content">
      <p>Hi {display_name},</p>
      <p>We received a request to reset your password. Click the button below to create a new password:</p>
      <p><a href="{reset_link}" class="button">Reset Password</a></p>
      <p><strong>Note:</strong> This link will expire in 1 hour.</p>
      <p>If you didn't request this, you can safely ignore this email.</p>
    </div>
    <div class="footer"><p>&copy; RideAware. All rights reserved.</p></div>
  </div>
</body>
</html>"#
    )
}
