use crate::{
    error::ApiError,
    jwt::SessionData,
    schema::{Id, UserRole},
};

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnLists,
            ActionType::ManageSubscriptions,
            ActionType::ManageOwnAccount,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnLists,
            ActionType::ManageSubscriptions,
            ActionType::ManageOwnAccount,
            ActionType::ManageAllRecipes,
            ActionType::ManageCatalog,
        ],
    ),
];

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    Read,

    CreateRecipes,
    ManageOwnRecipes,
    ManageOwnLists,
    ManageSubscriptions,
    ManageOwnAccount,

    ManageAllRecipes,
    ManageCatalog,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        if self == ActionType::Read {
            return true;
        }

        ACTION_TABLE
            .iter()
            .find(|(role, _)| *role == session.role)
            .map(|(_, actions)| actions.contains(&self))
            .unwrap_or(false)
    }
}

/// What an action is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Collection,
    Recipe { author_id: Id },
}

#[derive(Debug)]
pub enum Policy {
    Allow,
    Deny(ApiError),
}

impl Policy {
    pub fn into_result(self) -> Result<(), ApiError> {
        match self {
            Policy::Allow => Ok(()),
            Policy::Deny(e) => Err(e),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Policy::Allow)
    }
}

/// Single decision point for every request: anonymous actors may only read, recipes are
/// writable by their author or by staff.
pub fn authorize(actor: Option<&SessionData>, action: ActionType, resource: Resource) -> Policy {
    let session = match (actor, action) {
        (_, ActionType::Read) => return Policy::Allow,
        (None, _) => return Policy::Deny(ApiError::Unauthorized),
        (Some(session), _) => session,
    };

    match (action, resource) {
        (ActionType::ManageOwnRecipes, Resource::Recipe { author_id }) => {
            if ActionType::ManageAllRecipes.authenticate(session) {
                return Policy::Allow;
            }
            if author_id == session.user_id && action.authenticate(session) {
                Policy::Allow
            } else {
                Policy::Deny(ApiError::Forbidden)
            }
        }
        _ => match session.authenticate(action) {
            Ok(()) => Policy::Allow,
            Err(e) => Policy::Deny(e),
        },
    }
}
