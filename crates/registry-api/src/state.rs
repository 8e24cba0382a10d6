use std::sync::Arc;

use registry_core::repositories::UserRepository;
use registry_core::services::UserService;
use registry_shared::config::AppConfig;

/// Shared handler state. Mutations go through the engine; listing and search
/// query the repository directly.
pub struct AppState<R: UserRepository> {
    pub users: Arc<UserService<R>>,
    pub repo: Arc<R>,
    pub config: AppConfig,
}

impl<R: UserRepository> AppState<R> {
    pub fn new(repo: Arc<R>, config: AppConfig) -> Self {
        let users = Arc::new(UserService::new(
            repo.clone(),
            config.logging.hash_secret.clone(),
        ));
        Self {
            users,
            repo,
            config,
        }
    }
}

impl<R: UserRepository> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }
}
