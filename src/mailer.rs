use async_trait::async_trait;

/// Outbound email seam. Delivery itself belongs to an external provider.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, to: &str, link: &str) -> anyhow::Result<()>;
}

/// Writes verification links to the log. Used when no provider is wired in.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(&self, to: &str, link: &str) -> anyhow::Result<()> {
        tracing::info!(to, link, "verification email");
        Ok(())
    }
}

pub fn verification_link(public_base_url: &str, token: &str) -> String {
    format!(
        "{}/api/auth/verify-email?token={}",
        public_base_url.trim_end_matches('/'),
        token
    )
}

#[cfg(test)]
mod tests {
    use super::verification_link;

    #[test]
    fn link_ignores_trailing_slash() {
        assert_eq!(
            verification_link("https://shop.test/", "abc"),
            "https://shop.test/api/auth/verify-email?token=abc"
        );
    }
}
