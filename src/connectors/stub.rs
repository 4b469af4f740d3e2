use async_trait::async_trait;
use tracing::info;

use super::{Connector, FetchContext};

/// Placeholder for sources with no public content to crawl. Returns immediately.
#[derive(Debug, Clone)]
pub struct StubConnector {
    name: String,
}

impl StubConnector {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Connector for StubConnector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, ctx: &mut FetchContext<'_>) -> anyhow::Result<()> {
        info!(
            platform = %ctx.platform(),
            reason = "blocked_or_no_public_content",
            "platform stub, nothing to crawl"
        );
        Ok(())
    }
}
