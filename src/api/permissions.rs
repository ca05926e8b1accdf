//! Role-based access rules.
//!
//! Every guarded route names the [`Action`] it performs; [`authorize`] looks the
//! caller up in a single table and fails closed. Anonymous callers are told to
//! authenticate (401), authenticated callers lacking the role are refused (403).

use crate::api::error::AppError;
use crate::entities::users::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Reading the catalog and public profiles.
    Read,
    /// Anything done on one's own account: profile, follows, logout.
    UseAccount,
    /// Creating, updating and deleting catalog entries.
    ManageCatalog,
    /// Reading private user records of other people.
    ViewUserDirectory,
    /// Reassigning another user's role.
    AssignRoles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Authenticated(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    Unauthenticated,
    Forbidden,
}

impl From<AccessDenied> for AppError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::Unauthenticated => {
                AppError::Unauthorized("Authentication credentials were not provided.".to_string())
            }
            AccessDenied::Forbidden => AppError::Forbidden(
                "You do not have permission to perform this action.".to_string(),
            ),
        }
    }
}

const ANONYMOUS: &[Action] = &[Action::Read];
const USER: &[Action] = &[Action::Read, Action::UseAccount];
const STAFF: &[Action] = &[
    Action::Read,
    Action::UseAccount,
    Action::ManageCatalog,
    Action::ViewUserDirectory,
];
const ADMIN: &[Action] = &[
    Action::Read,
    Action::UseAccount,
    Action::ManageCatalog,
    Action::ViewUserDirectory,
    Action::AssignRoles,
];

pub fn allowed_actions(caller: Caller) -> &'static [Action] {
    match caller {
        Caller::Anonymous => ANONYMOUS,
        Caller::Authenticated(Role::User) => USER,
        Caller::Authenticated(Role::Staff) => STAFF,
        Caller::Authenticated(Role::Admin) => ADMIN,
    }
}

pub fn authorize(caller: Caller, action: Action) -> Result<(), AccessDenied> {
    if allowed_actions(caller).contains(&action) {
        Ok(())
    } else if caller == Caller::Anonymous {
        Err(AccessDenied::Unauthenticated)
    } else {
        Err(AccessDenied::Forbidden)
    }
}

pub fn is_admin(caller: Caller) -> bool {
    caller == Caller::Authenticated(Role::Admin)
}

pub fn is_staff(caller: Caller) -> bool {
    caller == Caller::Authenticated(Role::Staff)
}

pub fn is_admin_or_staff(caller: Caller) -> bool {
    is_admin(caller) || is_staff(caller)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Action; 5] = [
        Action::Read,
        Action::UseAccount,
        Action::ManageCatalog,
        Action::ViewUserDirectory,
        Action::AssignRoles,
    ];

    #[test]
    fn test_anonymous_may_only_read() {
        assert!(authorize(Caller::Anonymous, Action::Read).is_ok());
        for action in &ALL[1..] {
            assert_eq!(
                authorize(Caller::Anonymous, *action),
                Err(AccessDenied::Unauthenticated)
            );
        }
    }

    #[test]
    fn test_user_cannot_manage_catalog() {
        let caller = Caller::Authenticated(Role::User);
        assert!(authorize(caller, Action::UseAccount).is_ok());
        assert_eq!(
            authorize(caller, Action::ManageCatalog),
            Err(AccessDenied::Forbidden)
        );
    }

    #[test]
    fn test_staff_manages_catalog_but_not_roles() {
        let caller = Caller::Authenticated(Role::Staff);
        assert!(authorize(caller, Action::ManageCatalog).is_ok());
        assert!(authorize(caller, Action::ViewUserDirectory).is_ok());
        assert_eq!(
            authorize(caller, Action::AssignRoles),
            Err(AccessDenied::Forbidden)
        );
    }

    #[test]
    fn test_admin_may_do_everything() {
        let caller = Caller::Authenticated(Role::Admin);
        for action in ALL {
            assert!(authorize(caller, action).is_ok());
        }
    }

    #[test]
    fn test_named_predicates_match_table() {
        for caller in [
            Caller::Anonymous,
            Caller::Authenticated(Role::User),
            Caller::Authenticated(Role::Staff),
            Caller::Authenticated(Role::Admin),
        ] {
            assert_eq!(
                is_admin_or_staff(caller),
                authorize(caller, Action::ManageCatalog).is_ok()
            );
            assert_eq!(is_admin(caller), authorize(caller, Action::AssignRoles).is_ok());
        }
        assert!(is_staff(Caller::Authenticated(Role::Staff)));
        assert!(!is_staff(Caller::Authenticated(Role::Admin)));
    }
}
