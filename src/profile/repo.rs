use std::sync::Arc;

use tokio::sync::Mutex;

use super::dto::{DietaryPreferences, Profile};
use super::services::{toggle_preference, ProfileError};
use crate::storage::{Document, KeyValueStore};

pub const PROFILE_KEY: &str = "profile";
pub const PREFERENCES_KEY: &str = "preferences";

#[derive(Clone)]
pub struct ProfileRepo {
    profile: Document<Profile>,
    preferences: Document<DietaryPreferences>,
    /// Held by every save and read-modify-write.
    writes: Arc<Mutex<()>>,
}

impl ProfileRepo {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            profile: Document::new(store.clone(), PROFILE_KEY),
            preferences: Document::new(store, PREFERENCES_KEY),
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub async fn load_profile(&self) -> Profile {
        self.profile.load().await.unwrap_or_default()
    }

    pub async fn save_profile(&self, profile: &Profile) -> anyhow::Result<()> {
        let _w = self.writes.lock().await;
        self.profile.save(profile).await
    }

    pub async fn load_preferences(&self) -> DietaryPreferences {
        self.preferences.load().await.unwrap_or_default()
    }

    pub async fn save_preferences(&self, prefs: &DietaryPreferences) -> anyhow::Result<()> {
        let _w = self.writes.lock().await;
        self.preferences.save(prefs).await
    }

    /// Flips one preference and stores the result. The outer error is a
    /// storage failure, the inner one an unknown preference name.
    pub async fn toggle(
        &self,
        name: &str,
    ) -> anyhow::Result<Result<DietaryPreferences, ProfileError>> {
        let _w = self.writes.lock().await;
        let mut prefs = self.load_preferences().await;
        if let Err(e) = toggle_preference(&mut prefs, name) {
            return Ok(Err(e));
        }
        self.preferences.save(&prefs).await?;
        Ok(Ok(prefs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStore;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_toggles_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path()).await.unwrap());
        let repo = ProfileRepo::new(store);

        let toggles: Vec<_> = (0..9)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.toggle("vegan").await })
            })
            .collect();
        for t in toggles {
            t.await.unwrap().unwrap().unwrap();
        }
        // odd number of flips from the default
        assert!(repo.load_preferences().await.vegan);
    }

    #[tokio::test]
    async fn unknown_toggle_leaves_preferences_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ProfileRepo::new(Arc::new(FileStore::new(dir.path()).await.unwrap()));
        let outcome = repo.toggle("paleo").await.unwrap();
        assert_eq!(outcome, Err(ProfileError::UnknownPreference("paleo".into())));
        assert!(!dir.path().join("preferences.json").exists());
    }
}
