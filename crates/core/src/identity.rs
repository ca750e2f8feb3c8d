use serde::{Deserialize, Serialize};

/// A roster member as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerIdentity {
    pub id: String,
    pub name: String,
    /// Comma-separated role string, e.g. `"Duelist, IGL"`.
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Account linked to this profile; used for "own profile" checks.
    #[serde(default, alias = "userId")]
    pub account_id: Option<String>,
}

/// Who is looking at which subject, and whether they asked for advanced detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationContext {
    /// Comma-separated role tags of the viewer, e.g. `"Manager, Player"`.
    pub viewer_role: String,
    pub viewer_id: Option<String>,
    pub subject_owner_id: Option<String>,
    pub advanced_requested: bool,
}

impl AuthorizationContext {
    pub fn viewer(role: impl Into<String>, id: Option<String>) -> Self {
        Self {
            viewer_role: role.into(),
            viewer_id: id,
            ..Self::default()
        }
    }

    pub fn subject_owner(mut self, owner: Option<String>) -> Self {
        self.subject_owner_id = owner;
        self
    }

    /// Set the owner from a roster entry's linked account.
    pub fn viewing(self, subject: &PlayerIdentity) -> Self {
        self.subject_owner(subject.account_id.clone())
    }

    pub fn advanced(mut self, requested: bool) -> Self {
        self.advanced_requested = requested;
        self
    }

    /// Viewer role split on commas, trimmed, empty tags dropped.
    pub fn role_tags(&self) -> impl Iterator<Item = &str> {
        self.viewer_role
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_tags_are_trimmed() {
        let ctx = AuthorizationContext::viewer(" Manager , Player,,", None);
        let tags: Vec<&str> = ctx.role_tags().collect();
        assert_eq!(tags, vec!["Manager", "Player"]);
    }

    #[test]
    fn viewing_copies_linked_account() {
        let player = PlayerIdentity {
            id: "p1".into(),
            name: "Nova".into(),
            role: "Duelist".into(),
            avatar: None,
            account_id: Some("u9".into()),
        };
        let ctx = AuthorizationContext::viewer("Player", Some("u9".into()))
            .viewing(&player)
            .advanced(true);
        assert_eq!(ctx.subject_owner_id.as_deref(), Some("u9"));
        assert!(ctx.advanced_requested);
    }

    #[test]
    fn identity_accepts_user_id_alias() {
        let json = r#"{"id":"p2","name":"Kite","userId":"u2"}"#;
        let player: PlayerIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(player.account_id.as_deref(), Some("u2"));
        assert_eq!(player.role, "");
    }
}
