//! Wiring of the client core for one CLI invocation.

use crate::output::{OutputFormat, TerminalNotices};
use loop_auth::{AuthProvider, Authenticator, RouteTable, SessionGuard, SessionTracker, SupabaseAuth};
use loop_config::{Config, DataMode, Paths};
use loop_interactions::{NoticeSink, OptimisticMutator};
use loop_social::fixtures;
use loop_social::{SocialActions, SocialRepository, SupabaseTables, TableStore};
use loop_storage::{FileStore, KeyValueStore, SessionLifecycle};
use std::sync::Arc;
use tracing::info;

pub struct Client {
    pub mode: DataMode,
    pub lifecycle: Arc<SessionLifecycle>,
    /// The GoTrue provider in live mode, for token refresh.
    pub supabase: Option<Arc<SupabaseAuth>>,
    pub guard: SessionGuard,
    pub authenticator: Authenticator,
    pub repository: SocialRepository,
    pub actions: SocialActions,
}

impl Client {
    /// Build the core over the persisted store and the configured backend.
    pub fn open(config: &Config, paths: &Paths, format: OutputFormat) -> anyhow::Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(paths.store_file())?);
        let lifecycle = Arc::new(SessionLifecycle::new(store.clone()));

        let mut supabase = None;
        let (provider, tables): (Arc<dyn AuthProvider>, Arc<dyn TableStore>) = match config.data_mode
        {
            DataMode::Live => {
                let base_url = config.supabase_base_url()?;
                let auth = Arc::new(SupabaseAuth::new(
                    store.clone(),
                    &base_url,
                    &config.supabase_anon_key,
                )?);
                let tables = SupabaseTables::new(base_url, &config.supabase_anon_key, store)?;
                supabase = Some(auth.clone());
                (auth, Arc::new(tables))
            }
            DataMode::Demo => {
                // Demo data lives only for this process; the cached actor is
                // treated as signed in with the demo provider too.
                let mut auth = fixtures::demo_auth();
                if let Some(user_id) = lifecycle.current().user_id() {
                    auth = auth.with_session(user_id);
                }
                (Arc::new(auth), Arc::new(fixtures::demo_tables()))
            }
        };
        info!(mode = %config.data_mode, "Client core ready");

        let tracker = Arc::new(SessionTracker::new());
        let notices: Arc<dyn NoticeSink> = Arc::new(TerminalNotices::new(format));
        let repository = SocialRepository::new(tables);

        let authenticator = Authenticator::new(provider.clone(), lifecycle.clone(), tracker.clone())
            .with_profile_writer(Arc::new(repository.clone()));
        let guard = SessionGuard::new(lifecycle.clone(), provider, tracker, RouteTable::default());
        let actions = SocialActions::new(
            lifecycle.clone(),
            repository.clone(),
            OptimisticMutator::new(notices.clone()),
            notices,
        );

        Ok(Self {
            mode: config.data_mode,
            lifecycle,
            supabase,
            guard,
            authenticator,
            repository,
            actions,
        })
    }

    /// Signed-in user id, or `None` for the anonymous actor.
    pub fn user_id(&self) -> Option<String> {
        self.lifecycle.current().user_id().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loop_interactions::{TargetId, ToggleOutcome};
    use tempfile::tempdir;

    fn demo_config() -> Config {
        Config {
            data_mode: DataMode::Demo,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_demo_session_carries_across_invocations() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let config = demo_config();

        {
            let client = Client::open(&config, &paths, OutputFormat::Text).unwrap();
            client
                .authenticator
                .sign_in(fixtures::DEMO_EMAIL, fixtures::DEMO_PASSWORD)
                .await
                .unwrap();
        }

        let client = Client::open(&config, &paths, OutputFormat::Text).unwrap();
        assert!(client.supabase.is_none());
        assert_eq!(client.user_id().as_deref(), Some(fixtures::DEMO_USER_ID));
        assert!(client.guard.authorize("/feed").await.is_allow());

        let (_, groups) = client
            .repository
            .load_group_targets(Some(fixtures::DEMO_USER_ID))
            .await
            .unwrap();
        let pending = client
            .actions
            .toggle_membership(&groups, &TargetId::from_string("5"))
            .unwrap();
        assert_eq!(pending.settled().await, ToggleOutcome::Committed { flag: true });
    }

    #[tokio::test]
    async fn test_live_mode_rejects_bad_url() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let config = Config {
            supabase_url: "not a url".to_string(),
            ..Config::default()
        };

        assert!(Client::open(&config, &paths, OutputFormat::Text).is_err());
    }
}
