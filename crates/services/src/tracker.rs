//! Task-tracker REST client and the pure helpers that shape its cards into
//! the tasks board.
//!
//! The API is Trello-style: query-string key/token auth, member and card
//! reads, card creation on a configured list.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use shared::settings::TrackerSettings;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.trello.com/1";

/// Board sections refuse to grow past this many cards.
pub const MAX_CARDS_PER_SECTION: usize = 30;

/// Board snapshots stay fresh this long unless a refresh is forced.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackerMember {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub initials: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerCard {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub due_complete: bool,
    #[serde(default)]
    pub date_last_activity: Option<String>,
    #[serde(default)]
    pub id_members: Vec<String>,
    #[serde(default)]
    pub id_member_creator: Option<String>,
    /// Member summaries, present when the cards query asks for them.
    #[serde(default)]
    pub members: Vec<TrackerMember>,
    #[serde(default)]
    pub member_creator: Option<TrackerMember>,
}

pub struct TrackerClient {
    settings: TrackerSettings,
    base_url: String,
}

impl TrackerClient {
    pub fn new(settings: TrackerSettings) -> Self {
        Self {
            settings,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different endpoint (mirrors, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_configured()
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (
            self.settings.api_key.as_deref(),
            self.settings.token.as_deref(),
        ) {
            (Some(key), Some(token)) => Ok((key, token)),
            _ => Err(anyhow!("tracker credentials not configured")),
        }
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let (key, token) = self.credentials()?;
        let mut url = Url::parse(&format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path
        ))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params {
                pairs.append_pair(name, value);
            }
            pairs.append_pair("key", key);
            pairs.append_pair("token", token);
        }
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let client = reqwest::Client::new();
        let response = client.get(url).send().await?;
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(anyhow!("tracker request failed ({}): {}", status, body))
        }
    }

    /// Profile of the authenticated user.
    pub async fn fetch_current_member(&self) -> Result<TrackerMember> {
        let url = self.endpoint(
            "members/me",
            &[("fields", "id,username,fullName,initials,avatarUrl")],
        )?;
        self.get_json(url).await
    }

    /// Every card visible to the authenticated user, with member summaries.
    pub async fn fetch_member_cards(&self) -> Result<Vec<TrackerCard>> {
        let url = self.endpoint(
            "members/me/cards",
            &[
                (
                    "fields",
                    "id,name,desc,closed,due,dueComplete,dateLastActivity,idMembers,idMemberCreator",
                ),
                ("filter", "all"),
                ("limit", "500"),
                ("members", "true"),
                ("member_fields", "fullName,initials,username,avatarUrl"),
                ("memberCreator", "true"),
                ("memberCreator_fields", "fullName,initials,username,avatarUrl"),
                ("attachments", "false"),
                ("checklists", "none"),
            ],
        )?;
        self.get_json(url).await
    }

    /// File a card on the configured mention list. Returns false without
    /// sending when credentials or the list are missing.
    pub async fn create_card(&self, name: &str, desc: &str) -> Result<bool> {
        let list_id = match self.settings.mention_list_id.as_deref() {
            Some(id) if self.is_configured() => id.to_string(),
            _ => return Ok(false),
        };
        let url = self.endpoint(
            "cards",
            &[("idList", list_id.as_str()), ("name", name), ("desc", desc)],
        )?;
        let client = reqwest::Client::new();
        let response = client.post(url).send().await?;
        if response.status().is_success() {
            Ok(true)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(anyhow!("tracker request failed ({}): {}", status, body))
        }
    }
}

/// Cards grouped for the tasks view.
#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    /// Open cards I sit on.
    pub assigned_to_me: Vec<TrackerCard>,
    /// Open cards I handed to someone.
    pub assigned_by_me_open: Vec<TrackerCard>,
    /// Closed cards I handed to someone.
    pub assigned_by_me_done: Vec<TrackerCard>,
}

fn activity_ms(card: &TrackerCard) -> i64 {
    card.date_last_activity
        .as_deref()
        .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

/// Sort newest activity first; cards without a parseable timestamp sink.
pub fn sort_by_activity(cards: &mut [TrackerCard]) {
    cards.sort_by_key(|c| std::cmp::Reverse(activity_ms(c)));
}

/// Whether `member_id` handed this card off: they created it, or they sit
/// on it together with at least one other member.
pub fn is_assigned_by(card: &TrackerCard, member_id: &str) -> bool {
    if card.id_member_creator.as_deref() == Some(member_id) {
        return true;
    }
    card.id_members.iter().any(|id| id == member_id)
        && card.members.iter().any(|m| m.id != member_id)
}

/// Split a card dump into the three board sections, each sorted by
/// activity. A card can appear in more than one section.
pub fn build_board(cards: &[TrackerCard], member_id: &str) -> TaskBoard {
    let mut board = TaskBoard::default();
    for card in cards {
        if !card.closed && card.id_members.iter().any(|id| id == member_id) {
            board.assigned_to_me.push(card.clone());
        }
        if is_assigned_by(card, member_id) {
            if card.closed {
                board.assigned_by_me_done.push(card.clone());
            } else {
                board.assigned_by_me_open.push(card.clone());
            }
        }
    }
    sort_by_activity(&mut board.assigned_to_me);
    sort_by_activity(&mut board.assigned_by_me_open);
    sort_by_activity(&mut board.assigned_by_me_done);
    board
}
