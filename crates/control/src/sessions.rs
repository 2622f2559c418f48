use dashmap::DashMap;

/// Where the admin is in the broadcast dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminState {
    #[default]
    Idle,
    WaitingBroadcastText,
    ConfirmingBroadcast,
    SelectingNetworkChats,
}

#[derive(Debug, Clone, Default)]
pub struct AdminSession {
    pub state: AdminState,
    pub broadcast_text: Option<String>,
}

/// Dialog state per user id.
#[derive(Default)]
pub struct AdminSessions {
    sessions: DashMap<i64, AdminSession>,
}

impl AdminSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, user_id: i64) -> AdminState {
        self.sessions
            .get(&user_id)
            .map(|s| s.state)
            .unwrap_or_default()
    }

    pub fn set_state(&self, user_id: i64, state: AdminState) {
        self.sessions.entry(user_id).or_default().state = state;
    }

    pub fn set_text(&self, user_id: i64, text: impl Into<String>) {
        self.sessions.entry(user_id).or_default().broadcast_text = Some(text.into());
    }

    pub fn text(&self, user_id: i64) -> Option<String> {
        self.sessions
            .get(&user_id)
            .and_then(|s| s.broadcast_text.clone())
    }

    /// Drops state and pending text.
    pub fn clear(&self, user_id: i64) {
        self.sessions.remove(&user_id);
    }
}
