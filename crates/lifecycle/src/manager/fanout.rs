// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription payload construction.
//!
//! Translates internal signals into replies on the well-known keys. JSON is
//! built here, at the bus boundary, and nowhere deeper.

use crate::error::LifecycleError;
use crate::manager::{keys, Manager};
use crate::process::ProcessAdapter;
use sam_bus::BusClient;
use sam_core::{
    life_event_of, project_props, AppId, ChangeKind, Clock, Effect, Event, LifeEvent, LifeStatus,
    RosterChange,
};
use serde_json::{json, Value};

impl<B, P, C> Manager<B, P, C>
where
    B: BusClient,
    P: ProcessAdapter,
    C: Clock,
{
    /// `running` / `dev_running` payload.
    fn running_payload(&self, dev_only: bool) -> Value {
        let roster = self.roster.lock();
        let running = self.running.lock();
        let list: Vec<Value> = running
            .list()
            .into_iter()
            .filter_map(|info| {
                let package = roster.get(info.app_id.as_str());
                if dev_only && !package.is_some_and(|p| p.is_dev()) {
                    return None;
                }
                Some(json!({
                    "id": info.app_id,
                    "processid": info.pid,
                    "webprocessid": info.web_pid,
                    "defaultWindowType":
                        package.map(|p| p.default_window_type.clone()).unwrap_or_default(),
                    "appType": package.map(|p| p.app_type.as_str()).unwrap_or("unknown"),
                    "displayId": info.display,
                }))
            })
            .collect();
        json!({ "returnValue": true, "running": list })
    }

    pub(crate) fn running_effects(&self) -> Vec<Effect> {
        vec![
            Effect::SubscriptionReply {
                key: keys::RUNNING.to_string(),
                payload: self.running_payload(false),
            },
            Effect::SubscriptionReply {
                key: keys::DEV_RUNNING.to_string(),
                payload: self.running_payload(true),
            },
        ]
    }

    /// Current `running` snapshot, for the method's direct reply.
    pub fn running_snapshot(&self, dev_only: bool) -> Value {
        self.running_payload(dev_only)
    }

    /// Life-event and life-status pushes for one applied transition.
    pub(crate) fn life_status_effects(
        &self,
        app_id: &AppId,
        status: LifeStatus,
        pid: &str,
    ) -> Vec<Effect> {
        let event = life_event_of(status);

        let mut event_payload = json!({
            "returnValue": true,
            "appId": app_id,
            "event": event.as_str(),
        });
        let mut status_payload = json!({
            "returnValue": true,
            "appId": app_id,
            "status": status.as_str(),
        });
        if !pid.is_empty() {
            event_payload["processId"] = Value::String(pid.to_string());
            status_payload["processId"] = Value::String(pid.to_string());
        }

        let mut effects = vec![
            Effect::SubscriptionReply {
                key: keys::LIFE_EVENTS.to_string(),
                payload: event_payload,
            },
            Effect::SubscriptionReply {
                key: keys::LIFE_STATUS.to_string(),
                payload: status_payload.clone(),
            },
            Effect::SubscriptionReply {
                key: keys::app_status(app_id.as_str(), false),
                payload: status_payload.clone(),
            },
        ];

        let with_info = {
            let roster = self.roster.lock();
            roster.get(app_id.as_str()).map(|package| {
                let mut payload = status_payload;
                payload["appInfo"] = package.to_json();
                payload
            })
        };
        if let Some(payload) = with_info {
            effects.push(Effect::SubscriptionReply {
                key: keys::app_status(app_id.as_str(), true),
                payload,
            });
        }
        effects
    }

    /// One-off life event with no status change (splash).
    pub(crate) fn life_event_effect(&self, app_id: &AppId, event: LifeEvent) -> Effect {
        Effect::SubscriptionReply {
            key: keys::LIFE_EVENTS.to_string(),
            payload: json!({
                "returnValue": true,
                "appId": app_id,
                "event": event.as_str(),
            }),
        }
    }

    /// `foregroundAppInfo` / `foregroundAppInfoEx` pushes.
    pub(crate) fn foreground_effects(&self) -> Vec<Effect> {
        vec![
            Effect::SubscriptionReply {
                key: keys::FOREGROUND.to_string(),
                payload: self.foreground_snapshot(false),
            },
            Effect::SubscriptionReply {
                key: keys::FOREGROUND_EX.to_string(),
                payload: self.foreground_snapshot(true),
            },
        ]
    }

    /// Current foreground facts, plain or extended.
    pub fn foreground_snapshot(&self, extra: bool) -> Value {
        let running = self.running.lock();
        if extra {
            let list: Vec<Value> = running
                .foreground()
                .apps()
                .iter()
                .map(|app_id| {
                    let info = running.get_app(app_id);
                    json!({
                        "appId": app_id,
                        "windowId": "",
                        "processId": info.map(|i| i.pid.clone()).unwrap_or_default(),
                        "displayId":
                            info.map(|i| i.display.to_string())
                                .unwrap_or_else(|| "default".to_string()),
                    })
                })
                .collect();
            json!({ "returnValue": true, "foregroundAppInfo": list })
        } else {
            let current = running.foreground().current();
            let pid = current
                .and_then(|app_id| running.get_app(app_id))
                .map(|info| info.pid.clone())
                .unwrap_or_default();
            json!({
                "returnValue": true,
                "appId": current.map(|id| id.to_string()).unwrap_or_default(),
                "windowId": "",
                "processId": pid,
            })
        }
    }

    /// Full `listApps` payload.
    pub fn list_apps_payload(&self) -> Value {
        let roster = self.roster.lock();
        let mut apps: Vec<&sam_core::AppPackage> = roster.all().values().collect();
        apps.sort_by(|a, b| a.app_id.cmp(&b.app_id));
        let apps: Vec<Value> = apps.into_iter().map(|package| package.to_json()).collect();
        json!({ "returnValue": true, "apps": apps })
    }

    /// Fan roster deltas out to `listApps` and `listAppsCompact`, and flag
    /// removed-but-running instances for deferred cleanup.
    pub(crate) async fn on_roster_updated(
        &self,
        changes: &[RosterChange],
    ) -> Result<Vec<Event>, LifecycleError> {
        if changes.is_empty() {
            return Ok(vec![]);
        }

        {
            let mut running = self.running.lock();
            for change in changes {
                if change.change == ChangeKind::Removed {
                    if let Some(entry) = running.get_app_mut(&change.app_id) {
                        tracing::info!(app_id = %change.app_id,
                                       "app removed while running, deferring cleanup to stop");
                        entry.removal_flag = true;
                    }
                }
            }
        }

        let mut effects = Vec::new();

        let full_payload = if let [only] = changes {
            let app = {
                let roster = self.roster.lock();
                roster.get(only.app_id.as_str()).map(|package| package.to_json())
            };
            json!({
                "returnValue": true,
                "change": only.change.as_str(),
                "changeReason": only.reason,
                "appId": only.app_id,
                "app": app.unwrap_or(Value::Null),
            })
        } else {
            self.list_apps_payload()
        };
        effects.push(Effect::SubscriptionReply {
            key: keys::LIST_APPS.to_string(),
            payload: full_payload,
        });

        // Compact subscribers each get their own projection.
        let projections: Vec<(sam_core::BusToken, Value)> = {
            let roster = self.roster.lock();
            let compact = self.compact_props.lock();
            compact
                .iter()
                .map(|(token, properties)| {
                    let mut apps: Vec<&sam_core::AppPackage> = roster.all().values().collect();
                    apps.sort_by(|a, b| a.app_id.cmp(&b.app_id));
                    let apps: Vec<Value> = apps
                        .into_iter()
                        .map(|package| project_props(&package.to_json(), properties))
                        .collect();
                    (*token, json!({ "returnValue": true, "apps": apps }))
                })
                .collect()
        };
        for (token, payload) in projections {
            effects.push(Effect::Respond { token, payload });
        }

        self.executor.execute_all(effects).await?;
        Ok(vec![])
    }
}
