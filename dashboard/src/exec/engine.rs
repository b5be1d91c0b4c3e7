use super::types::*;
use crate::debug_hooks;
use botdash_client::{Ack, BotId, LaunchAck, LaunchRequest, TradingApi};
use std::sync::Arc;

/// Issues launch/stop commands against the service.
///
/// Validation happens before any request leaves; a rejected command never
/// touches view-state. Invalidation of the bot registry is the caller's job.
#[derive(Clone)]
pub struct CommandClient {
    api: Arc<dyn TradingApi>,
}

impl CommandClient {
    pub fn new(api: Arc<dyn TradingApi>) -> Self {
        Self { api }
    }

    /// Checks the form and builds the request. Nothing is sent.
    pub fn prepare_launch(&self, form: &LaunchForm) -> Result<LaunchRequest, CommandError> {
        let request = form.validate().inspect_err(|e| {
            debug_hooks::log_command("launch", format!("invalid: {e}"));
        })?;
        Ok(request)
    }

    pub async fn launch(&self, request: &LaunchRequest) -> Result<LaunchAck, CommandError> {
        match self.api.start_bot(request).await {
            Ok(ack) => {
                debug_hooks::log_command(
                    "launch",
                    format!(
                        "ok {} {} {} bot_id={}",
                        request.symbol,
                        request.interval,
                        request.strategy,
                        ack.bot_id.as_ref().map(BotId::as_str).unwrap_or("?")
                    ),
                );
                Ok(ack)
            }
            Err(source) => {
                debug_hooks::log_command("launch", format!("rejected: {source}"));
                Err(CommandError::Rejected {
                    action: "launch",
                    source,
                })
            }
        }
    }

    pub async fn stop(&self, id: &BotId) -> Result<Ack, CommandError> {
        match self.api.stop_bot(id).await {
            Ok(ack) => {
                debug_hooks::log_command("stop", format!("ok {id}"));
                Ok(ack)
            }
            Err(source) => {
                debug_hooks::log_command("stop", format!("{id} rejected: {source}"));
                Err(CommandError::Rejected { action: "stop", source })
            }
        }
    }
}
