//! Running cost ledger with budget alerts

use std::collections::HashMap;
use std::sync::Mutex;

use log::{debug, warn};
use serde::Serialize;

use crate::request::StandardResponse;
use crate::Provider;

/// Totals for one provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProviderUsage
{   pub calls: u64
  , pub input_tokens: u64
  , pub output_tokens: u64
  , pub cost: f64
}

/// Raised once when spending first reaches a threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetAlert
{   pub threshold: f64
  , pub total_cost: f64
  , pub remaining: f64
  , pub calls: u64
}

#[derive(Debug, Default)]
struct LedgerState
{   total_cost: f64
  , calls: u64
  , fallback_calls: u64
  , last_alert: f64
  , by_provider: HashMap<Provider, ProviderUsage>
}

/// Caller-owned record of what each call cost
#[derive(Debug)]
pub struct UsageLedger
{   budget: f64
  , alert_step: f64
  , state: Mutex<LedgerState>
}

impl UsageLedger
{   /// Ledger alerting every $5 up to `budget`
    pub fn new(budget: f64) -> Self
    {   UsageLedger::with_alert_step(budget, 5.0)
    }

    pub fn with_alert_step(budget: f64, alert_step: f64) -> Self
    {   UsageLedger
        {   budget
          , alert_step
          , state: Mutex::new(LedgerState::default())
        }
    }

    /// Add one call; returns an alert if a new threshold was crossed
    pub fn record(
      &self
    , response: &StandardResponse
    , cost: f64
    ) -> Option<BudgetAlert>
    {   let mut state = self.lock();
        state.total_cost += cost;
        state.calls += 1;
        if response.used_fallback
        {   state.fallback_calls += 1;
        }
        let entry = state.by_provider
          .entry(response.provider)
          .or_default();
        entry.calls += 1;
        entry.input_tokens = entry.input_tokens
          .saturating_add(response.tokens_used.input);
        entry.output_tokens = entry.output_tokens
          .saturating_add(response.tokens_used.output);
        entry.cost += cost;

        let avg = state.total_cost / state.calls as f64;
        debug!(
          "Call {}: ${:.4} on {} (total ${:.2}, avg/call ${:.4})",
          state.calls, cost, response.provider, state.total_cost, avg
        );

        let crossed = self.next_threshold(state.last_alert, state.total_cost)?;
        state.last_alert = crossed;
        let alert = BudgetAlert
        {   threshold: crossed
          , total_cost: state.total_cost
          , remaining: self.budget - state.total_cost
          , calls: state.calls
        };
        warn!(
          "Budget alert: reached ${:.2} (total ${:.2}, remaining ${:.2}, {} calls)",
          alert.threshold, alert.total_cost, alert.remaining, alert.calls
        );
        Some(alert)
    }

    /// Lowest threshold above `last_alert` that is reached and within budget
    fn next_threshold(&self, last_alert: f64, total: f64) -> Option<f64>
    {   if self.alert_step <= 0.0
        {   return None;
        }
        let rounded = (total * 100.0).round() / 100.0;
        let ceiling = rounded.min(self.budget);
        let threshold
          = ((last_alert / self.alert_step).floor() + 1.0) * self.alert_step;
        (threshold <= ceiling).then_some(threshold)
    }

    pub fn total_cost(&self) -> f64
    {   self.lock().total_cost
    }

    pub fn calls(&self) -> u64
    {   self.lock().calls
    }

    pub fn fallback_calls(&self) -> u64
    {   self.lock().fallback_calls
    }

    pub fn provider_usage(&self, provider: Provider) -> ProviderUsage
    {   self.lock().by_provider
          .get(&provider)
          .copied()
          .unwrap_or_default()
    }

    /// One-line spend summary
    pub fn summary(&self) -> String
    {   let state = self.lock();
        let avg = if state.calls > 0
        {   state.total_cost / state.calls as f64
        } else
        {   0.0
        };
        format!(
          "Total Cost: ${:.2} / ${:.2} (${:.2} left) | Calls: {} ({} via fallback) | Avg: ${:.4}/call",
          state.total_cost,
          self.budget,
          self.budget - state.total_cost,
          state.calls,
          state.fallback_calls,
          avg
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState>
    {   self.state.lock()
          .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
