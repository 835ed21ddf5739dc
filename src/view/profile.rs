use crate::{
    error::AppError,
    models::{UpdateProfile, UserProfile},
    view::ProfileSource,
};

/// State of the profile page.
pub struct ProfileView<S> {
    source: S,
    user: Option<UserProfile>,
    loading: bool,
    error: Option<String>,
}

impl<S: ProfileSource> ProfileView<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            user: None,
            loading: false,
            error: None,
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn fetch(&mut self) {
        self.loading = true;
        self.error = None;

        match self.source.fetch_profile().await {
            Ok(user) => self.user = Some(user),
            Err(e) => {
                tracing::warn!("Profile fetch failed: {}", e);
                self.error = Some(e.user_message());
            }
        }

        self.loading = false;
    }

    /// On failure the previously loaded profile is kept.
    pub async fn update(&mut self, changes: &UpdateProfile) -> Result<&UserProfile, AppError> {
        match self.source.update_profile(changes).await {
            Ok(user) => {
                self.error = None;
                Ok(self.user.insert(user))
            }
            Err(e) => {
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }
}
