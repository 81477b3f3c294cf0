//! 待发送邮件
//!
//! 不直接投递，只记录到日志。

use tracing::info;

use crate::config::AppConfig;

/// 一封待发送的邮件
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingMail {
    pub fn verification(to: &str, token: &str) -> Self {
        let system_name = &AppConfig::get().app.system_name;
        Self {
            to: to.to_string(),
            subject: format!("Verify your email for {system_name}"),
            body: format!("Use this token to verify your email address: {token}"),
        }
    }

    pub fn password_reset(to: &str, token: &str, valid_minutes: i64) -> Self {
        let system_name = &AppConfig::get().app.system_name;
        Self {
            to: to.to_string(),
            subject: format!("Reset your {system_name} password"),
            body: format!(
                "Use this token to reset your password within {valid_minutes} minutes: {token}"
            ),
        }
    }

    pub fn log(&self) {
        let smtp = &AppConfig::get().smtp;
        info!(
            to = %self.to,
            from = %smtp.from,
            smtp_enabled = smtp.enabled,
            subject = %self.subject,
            "Outgoing mail: {}",
            self.body
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mail_contains_token() {
        let mail = OutgoingMail::password_reset("a@example.com", "tok123", 60);
        assert_eq!(mail.to, "a@example.com");
        assert!(mail.body.contains("tok123"));
        assert!(mail.body.contains("60 minutes"));

        let mail = OutgoingMail::verification("b@example.com", "v-1");
        assert!(mail.body.ends_with("v-1"));
    }
}
