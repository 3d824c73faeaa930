//! Which primary failures are handed to the fallback provider

use std::collections::HashSet;

use log::debug;

use crate::error::{Error, FailureKind};

/// Failure kinds that trigger the single fallback attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy
{   kinds: HashSet<FailureKind>
}

impl FallbackPolicy
{   /// Policy that falls back on exactly these kinds
    pub fn on(kinds: impl IntoIterator<Item = FailureKind>) -> Self
    {   FallbackPolicy
        {   kinds: kinds.into_iter().collect()
        }
    }

    /// Never fall back
    pub fn disabled() -> Self
    {   FallbackPolicy
        {   kinds: HashSet::new()
        }
    }

    pub fn triggers_on(&self, kind: FailureKind) -> bool
    {   self.kinds.contains(&kind)
    }

    /// Whether `error` from the primary should go to the fallback.
    /// Only provider request failures qualify; format and
    /// configuration errors never do.
    pub fn should_fall_back(&self, error: &Error) -> bool
    {   let decision = error.failure_kind()
          .map(|kind| self.triggers_on(kind))
          .unwrap_or(false);
        debug!("Fallback decision for [{}]: {}", error, decision);
        decision
    }
}

impl Default for FallbackPolicy
{   fn default() -> Self
    {   FallbackPolicy::on([
          FailureKind::RateLimited
        , FailureKind::Unavailable
        , FailureKind::Timeout
        , FailureKind::ConnectionRefused
        ])
    }
}
