//! Friend data cache
//!
//! Friend documents are fetched once per friend and replayed afterwards.
//! Missing documents mean "nothing to share", never an error.

use std::sync::Arc;

use crate::domain::{CompletionBook, DomainResult, Roster, TaskFilter, UserSettings, UserTask};
use crate::engine::FriendData;
use crate::repository::{ReadCache, Repository};

pub struct FriendCache {
    tasks: Arc<dyn Repository<UserTask>>,
    rosters: Arc<dyn Repository<Roster>>,
    completion: Arc<dyn Repository<CompletionBook>>,
    settings: Arc<dyn Repository<UserSettings>>,
    cache: ReadCache<FriendData>,
}

impl FriendCache {
    pub fn new(
        tasks: Arc<dyn Repository<UserTask>>,
        rosters: Arc<dyn Repository<Roster>>,
        completion: Arc<dyn Repository<CompletionBook>>,
        settings: Arc<dyn Repository<UserSettings>>,
    ) -> Self {
        Self {
            tasks,
            rosters,
            completion,
            settings,
            cache: ReadCache::new(),
        }
    }

    pub async fn friend(&self, friend_id: &str) -> DomainResult<FriendData> {
        self.cache
            .get_or_load(friend_id, || self.load(friend_id))
            .await
    }

    /// Every friend that could be loaded; failures are logged and skipped
    pub async fn friends(&self, friend_ids: &[String]) -> Vec<FriendData> {
        let mut loaded = Vec::with_capacity(friend_ids.len());
        for id in friend_ids {
            match self.friend(id).await {
                Ok(friend) => loaded.push(friend),
                Err(e) => log::warn!("skipping friend {}: {}", id, e),
            }
        }
        loaded
    }

    async fn load(&self, friend_id: &str) -> DomainResult<FriendData> {
        let roster = self.rosters.find_by_id(friend_id).await?;
        let completion = self.completion.find_by_id(friend_id).await?;
        let settings = self.settings.find_by_id(friend_id).await?;
        let tasks = self.tasks.query(&TaskFilter::Author(friend_id.to_string())).await?;

        Ok(FriendData {
            friend_id: friend_id.to_string(),
            roster: roster.unwrap_or_else(|| Roster::new(friend_id, Vec::new())),
            completion: completion.unwrap_or_else(|| CompletionBook::new(friend_id)),
            lazy_tracking: settings.map(|s| s.lazy_tracking).unwrap_or_default(),
            tasks,
        })
    }
}
