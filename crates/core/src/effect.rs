// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Side effects the lifecycle engine asks the executor to perform.

use crate::event::Event;
use crate::id::BusToken;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Signal used when escalating a close on a native process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KillSignal {
    /// Graceful termination request.
    Term,
    /// Forced kill after the escalation timer fires.
    Kill,
}

/// Effects executed by the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Feed an event back into the engine loop.
    Emit { event: Event },

    /// Reply to an inbound bus message.
    Respond { token: BusToken, payload: Value },

    /// Push a payload to every subscriber registered on a key.
    SubscriptionReply { key: String, payload: Value },

    /// Cancel an outstanding outbound call.
    CancelCall { token: BusToken },

    /// Signal a native app's whole process group.
    KillProcessGroup { pid: String, signal: KillSignal },

    /// Arm a named timer; it fires as `Event::TimerFired`.
    SetTimer {
        id: String,
        #[serde(with = "duration_ms")]
        duration: Duration,
    },

    /// Disarm a named timer.
    CancelTimer { id: String },
}

impl Effect {
    /// Effect name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Emit { .. } => "emit",
            Effect::Respond { .. } => "respond",
            Effect::SubscriptionReply { .. } => "subscription_reply",
            Effect::CancelCall { .. } => "cancel_call",
            Effect::KillProcessGroup { .. } => "kill_process_group",
            Effect::SetTimer { .. } => "set_timer",
            Effect::CancelTimer { .. } => "cancel_timer",
        }
    }

    /// Key-value pairs for structured logging.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::Emit { event } => vec![("event", event.log_summary())],
            Effect::Respond { token, .. } => vec![("token", token.to_string())],
            Effect::SubscriptionReply { key, .. } => vec![("key", key.clone())],
            Effect::CancelCall { token } => vec![("token", token.to_string())],
            Effect::KillProcessGroup { pid, signal } => {
                vec![("pid", pid.clone()), ("signal", format!("{signal:?}"))]
            }
            Effect::SetTimer { id, duration } => vec![
                ("timer_id", id.clone()),
                ("duration_ms", duration.as_millis().to_string()),
            ],
            Effect::CancelTimer { id } => vec![("timer_id", id.clone())],
        }
    }

    /// Whether the effect deserves a full started/completed log pair.
    /// Frequent signaling effects log a single compact line.
    pub fn verbose(&self) -> bool {
        !matches!(
            self,
            Effect::Emit { .. }
                | Effect::SetTimer { .. }
                | Effect::CancelTimer { .. }
                | Effect::SubscriptionReply { .. }
        )
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        duration.as_millis().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}
