/// 발신 메일 알림
/// 상태 변경이 커밋된 뒤에만 호출되며, 실패는 로그만 남기고 재시도하지 않는다.
// region:    --- Imports
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;
// endregion: --- Imports

// region:    --- Notifier Trait
/// 알림 발송 트레이트
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}
// endregion: --- Notifier Trait

// region:    --- Mailer Client
/// HTTP 메일 릴레이 클라이언트
pub struct MailerClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl MailerClient {
    pub fn new() -> Self {
        let endpoint =
            std::env::var("MAILER_URL").unwrap_or_else(|_| "http://localhost:8025/api/send".to_string());
        let api_key = std::env::var("MAILER_API_KEY").ok();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Mailer client creation error");

        MailerClient {
            client,
            endpoint,
            api_key,
        }
    }
}

impl Default for MailerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for MailerClient {
    /// 메일 발송
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        info!(
            "{:<12} --> 메일 발송: to={}, subject={}",
            "Notifier", to, subject
        );

        let mut request = self.client.post(&self.endpoint).json(&serde_json::json!({
            "to": to,
            "subject": subject,
            "body": body
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("Error sending mail: {:?}", e))?;

        if !response.status().is_success() {
            return Err(format!("Mail relay returned {}", response.status()));
        }
        Ok(())
    }
}
// endregion: --- Mailer Client
