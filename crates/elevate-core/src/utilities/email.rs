use super::{require_text, SinglePurpose};
use crate::errors::ElevateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailKind {
    Personal,
    Professional,
    Marketing,
}

impl EmailKind {
    fn template_id(&self) -> &'static str {
        match self {
            EmailKind::Personal => "email_personal",
            EmailKind::Professional => "email_professional",
            EmailKind::Marketing => "email_marketing",
        }
    }
}

impl FromStr for EmailKind {
    type Err = ElevateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "personal" => Ok(EmailKind::Personal),
            "professional" => Ok(EmailKind::Professional),
            "marketing" => Ok(EmailKind::Marketing),
            other => Err(ElevateError::Validation(format!(
                "Invalid email type '{}'. Expected personal, professional or marketing",
                other
            ))),
        }
    }
}

impl fmt::Display for EmailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EmailKind::Personal => "personal",
            EmailKind::Professional => "professional",
            EmailKind::Marketing => "marketing",
        };
        f.write_str(name)
    }
}

pub struct OnlyEmail {
    inner: SinglePurpose,
}

impl OnlyEmail {
    pub fn new(inner: SinglePurpose) -> Self {
        Self { inner }
    }

    pub async fn generate_email(&self, message: &str, kind: EmailKind) -> Result<String, ElevateError> {
        require_text("message", message)?;
        log::info!("Generating {} email", kind);
        self.inner.run(kind.template_id(), &[], message, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::recording_llm::RecordingLlm;
    use crate::utilities::testing::single_purpose;

    #[test]
    fn test_parse_email_kind() {
        assert_eq!("Professional".parse::<EmailKind>().unwrap(), EmailKind::Professional);
        assert_eq!(" marketing ".parse::<EmailKind>().unwrap(), EmailKind::Marketing);
        let err = "angry".parse::<EmailKind>().unwrap_err();
        assert!(matches!(err, ElevateError::Validation(msg) if msg.contains("angry")));
    }

    #[tokio::test]
    async fn test_kind_selects_template() {
        let llm = RecordingLlm::replying("Subject: Launch\n\nHi all");
        let email = OnlyEmail::new(single_purpose(&llm));

        email.generate_email("Launch next week", EmailKind::Marketing).await.unwrap();
        assert!(llm.last_system_prompt().contains("marketing emails"));

        email.generate_email("Thanks for dinner", EmailKind::Personal).await.unwrap();
        assert!(llm.last_system_prompt().contains("personal emails"));
        assert_eq!(llm.last_user_message(), "Thanks for dinner");
    }
}
