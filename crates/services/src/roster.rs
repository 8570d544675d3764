//! Team roster store with exclusive-lead enforcement.

use crate::store::{KeyValueStore, TEAM_KEY};
use shared::team::TeamMember;
use std::sync::Arc;
use uuid::Uuid;

pub struct Roster {
    store: Arc<dyn KeyValueStore>,
}

impl Roster {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Members in insertion order. A corrupt slot reads as empty.
    pub fn members(&self) -> Vec<TeamMember> {
        let raw = match self.store.get(TEAM_KEY) {
            Ok(Some(raw)) => raw,
            _ => return Vec::new(),
        };
        match serde_json::from_str::<Vec<TeamMember>>(&raw) {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!("discarding corrupt roster slot: {}", e);
                Vec::new()
            }
        }
    }

    /// Appends a member. Adding a lead demotes everyone else first.
    pub fn add(&self, member: TeamMember) -> Vec<TeamMember> {
        let mut members = self.members();
        if member.is_lead {
            for m in &mut members {
                m.is_lead = false;
            }
        }
        members.push(member);
        self.persist(&members);
        members
    }

    /// Makes `id` the sole lead. An unknown id clears the flag everywhere.
    pub fn set_lead(&self, id: Uuid) -> Vec<TeamMember> {
        let mut members = self.members();
        for m in &mut members {
            m.is_lead = m.id == id;
        }
        self.persist(&members);
        members
    }

    pub fn remove(&self, id: Uuid) -> Vec<TeamMember> {
        let members: Vec<TeamMember> = self
            .members()
            .into_iter()
            .filter(|m| m.id != id)
            .collect();
        self.persist(&members);
        members
    }

    /// The current lead, if any.
    pub fn lead(&self) -> Option<TeamMember> {
        self.members().into_iter().find(|m| m.is_lead)
    }

    fn persist(&self, members: &[TeamMember]) {
        if let Ok(json) = serde_json::to_string(members) {
            let _ = self.store.set(TEAM_KEY, &json);
        }
    }
}
