/// Accessor for the current session token. Injected instead of read from
/// ambient storage so the gateway never couples to a login implementation.
pub trait AuthTokenProvider: Send + Sync {
    /// None means no session; the remote system will answer 401 and the
    /// run surfaces the distinguished session-expired error.
    fn token(&self) -> Option<String>;
}

/// Fixed-token provider, useful for tests and long-lived service accounts.
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

impl AuthTokenProvider for StaticTokenProvider {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}
