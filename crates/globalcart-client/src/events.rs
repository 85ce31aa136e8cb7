//! Funnel analytics beacon.

use globalcart_core::model::{FunnelEvent, FunnelStage, FunnelStep};
use serde_json::Value;
use tracing::debug;

use crate::{ApiClient, RequestOptions, Result};

const FUNNEL: &str = "/api/events/funnel";

impl ApiClient {
  /// Build the full beacon for `step` from the stored session and customer.
  pub fn funnel_event(&self, step: FunnelStep) -> FunnelEvent {
    let persistence = self.persistence();
    FunnelEvent {
      session_id:     persistence.session_id(),
      stage:          step.stage,
      channel:        self.config().channel.clone(),
      device:         self.config().device,
      customer_id:    persistence.customer().map(|c| c.customer_id),
      product_id:     step.product_id,
      order_id:       step.order_id,
      failure_reason: step.failure_reason,
    }
  }

  /// Send a funnel beacon and report the outcome.
  pub async fn send_funnel_event(&self, step: FunnelStep) -> Result<()> {
    let event = self.funnel_event(step);
    let _: Value = self.post(FUNNEL, &event, RequestOptions::new()).await?;
    Ok(())
  }

  /// Fire-and-forget variant: failures are logged at debug and dropped.
  pub async fn track(&self, step: FunnelStep) {
    let stage: FunnelStage = step.stage;
    if let Err(e) = self.send_funnel_event(step).await {
      debug!(%stage, error = %e, "funnel beacon dropped");
    }
  }
}
