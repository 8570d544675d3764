//! Mention notifications, delivered through the backend's tag endpoint.
//!
//! Send-time flow: plan one payload per unique member email, dispatch them
//! all, and record outcomes. Failures log; the composer never sees them.

use anyhow::{anyhow, Result};
use serde::Serialize;
use shared::discussion::MentionRef;
use shared::outcome::{DeliveryOutcome, SkipReason};
use shared::team::TeamMember;

use crate::tracker::TrackerClient;

/// Payload for `POST /notify/tag`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagNotification {
    pub email: String,
    pub tagged_user: String,
    pub tagged_by: String,
    pub message: String,
    pub context: String,
}

/// A payload paired with the member it targets.
#[derive(Debug, Clone)]
pub struct PlannedDelivery {
    pub member: String,
    pub payload: TagNotification,
}

/// Work out who actually gets notified: taggable mentions only (the
/// broadcast entry is excluded), resolved against the roster, one delivery
/// per unique email (case-insensitive). Skips come back as outcomes so
/// nothing disappears without a trace.
pub fn plan_notifications(
    mentions: &[MentionRef],
    roster: &[TeamMember],
    message: &str,
) -> (Vec<PlannedDelivery>, Vec<DeliveryOutcome>) {
    let mut planned = Vec::new();
    let mut skipped = Vec::new();
    let mut seen_emails: Vec<String> = Vec::new();

    for mention in mentions.iter().filter(|m| m.is_taggable()) {
        let member = match roster.iter().find(|m| m.id.to_string() == mention.id) {
            Some(member) => member,
            None => {
                skipped.push(DeliveryOutcome::Skipped {
                    member: mention.label.trim_start_matches('@').to_string(),
                    reason: SkipReason::NotInRoster,
                });
                continue;
            }
        };

        let email = member.email.trim().to_string();
        if email.is_empty() {
            skipped.push(DeliveryOutcome::Skipped {
                member: member.name.clone(),
                reason: SkipReason::NoEmail,
            });
            continue;
        }

        let folded = email.to_lowercase();
        if seen_emails.contains(&folded) {
            skipped.push(DeliveryOutcome::Skipped {
                member: member.name.clone(),
                reason: SkipReason::DuplicateEmail,
            });
            continue;
        }
        seen_emails.push(folded);

        let mut tagged_user = member.name.trim().to_string();
        if tagged_user.is_empty() {
            tagged_user = mention.label.trim_start_matches('@').to_string();
        }
        if tagged_user.is_empty() {
            tagged_user = "User".to_string();
        }

        planned.push(PlannedDelivery {
            member: member.name.clone(),
            payload: TagNotification {
                email,
                tagged_user,
                tagged_by: "You".to_string(),
                message: message.to_string(),
                context: "Discussion Panel".to_string(),
            },
        });
    }

    (planned, skipped)
}

/// POST one notification. Non-2xx is an error carrying status and body.
pub async fn send_notification(base_url: &str, payload: &TagNotification) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/notify/tag", base_url.trim_end_matches('/')))
        .json(payload)
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(anyhow!("notify error: {} - {}", status, body))
    }
}

/// Dispatch every planned delivery, settle-all: each one runs to completion
/// and reports an outcome; a failure never cancels the rest. Each success
/// also files a best-effort tracker card.
pub async fn dispatch_all(
    base_url: &str,
    tracker: &TrackerClient,
    planned: Vec<PlannedDelivery>,
) -> Vec<DeliveryOutcome> {
    let outcomes = futures::future::join_all(planned.into_iter().map(|delivery| async move {
        match send_notification(base_url, &delivery.payload).await {
            Ok(()) => {
                let title = format!("Mention: {}", delivery.payload.tagged_user);
                match tracker.create_card(&title, &delivery.payload.message).await {
                    Ok(true) => tracing::info!("filed mention card for {}", delivery.member),
                    Ok(false) => {}
                    Err(e) => tracing::warn!("mention card failed: {}", e),
                }
                DeliveryOutcome::Sent {
                    member: delivery.member,
                    email: delivery.payload.email,
                }
            }
            Err(e) => DeliveryOutcome::Failed {
                member: delivery.member,
                email: delivery.payload.email,
                error: e.to_string(),
            },
        }
    }))
    .await;

    let sent: Vec<&str> = outcomes
        .iter()
        .filter(|o| o.is_sent())
        .map(|o| o.member())
        .collect();
    if !sent.is_empty() {
        tracing::info!("notified: {}", sent.join(", "));
    }
    let failed = outcomes
        .iter()
        .filter(|o| matches!(o, DeliveryOutcome::Failed { .. }))
        .count();
    if failed > 0 {
        tracing::warn!("{} notification(s) failed", failed);
    }

    outcomes
}
