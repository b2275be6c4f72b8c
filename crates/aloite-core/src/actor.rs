use uuid::Uuid;

/// Who is performing an action. Resolved by the request layer from its
/// session state and passed into every core call.
///
/// An anonymous actor is never an admin; the constructors are the only way to
/// build one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActorContext {
    user_id: Option<Uuid>,
    is_admin: bool,
}

impl ActorContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            is_admin: false,
        }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            is_admin: true,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn is(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }
}
