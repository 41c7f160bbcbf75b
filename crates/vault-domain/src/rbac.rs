//! Built-in permission and role catalogue.
//!
//! These are the names route guards check against and the rows the RBAC seed
//! migration inserts. Roles created at runtime may bundle any subset of the
//! permissions below, but no runtime path creates new permissions.

/// Permission name constants, `<resource>.<action>`.
pub mod permissions {
    /// Create generation logs.
    pub const LOG_CREATE: &str = "log.create";
    /// Edit generation log metadata.
    pub const LOG_EDIT: &str = "log.edit";
    /// Delete generation logs.
    pub const LOG_DELETE: &str = "log.delete";

    /// View the user directory and user statistics.
    pub const USER_VIEW: &str = "user.view";
    /// Enable or disable user accounts.
    pub const USER_EDIT: &str = "user.edit";
    /// Delete user accounts.
    pub const USER_DELETE: &str = "user.delete";
    /// Replace the role set of a user.
    pub const USER_MANAGE_ROLES: &str = "user.manage_roles";

    /// View roles and the permission catalogue.
    pub const ROLE_VIEW: &str = "role.view";
    /// Create roles.
    pub const ROLE_CREATE: &str = "role.create";
    /// Edit non-system roles.
    pub const ROLE_EDIT: &str = "role.edit";
    /// Delete non-system roles.
    pub const ROLE_DELETE: &str = "role.delete";
}

/// Built-in role names.
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const USER: &str = "user";
    pub const EDITOR: &str = "editor";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSpec {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSpec {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub is_system: bool,
    pub permissions: &'static [&'static str],
}

const fn perm(
    name: &'static str,
    display_name: &'static str,
    description: &'static str,
    category: &'static str,
) -> PermissionSpec {
    PermissionSpec {
        name,
        display_name,
        description,
        category,
    }
}

pub const BUILTIN_PERMISSIONS: &[PermissionSpec] = &[
    perm(permissions::LOG_CREATE, "Create logs", "Create generation logs", "log"),
    perm(permissions::LOG_EDIT, "Edit logs", "Edit generation log metadata", "log"),
    perm(permissions::LOG_DELETE, "Delete logs", "Delete generation logs", "log"),
    perm(permissions::USER_VIEW, "View users", "View user accounts", "user"),
    perm(permissions::USER_EDIT, "Edit users", "Enable or disable user accounts", "user"),
    perm(permissions::USER_DELETE, "Delete users", "Delete user accounts", "user"),
    perm(
        permissions::USER_MANAGE_ROLES,
        "Manage user roles",
        "Assign roles to user accounts",
        "user",
    ),
    perm(permissions::ROLE_VIEW, "View roles", "View roles and permissions", "role"),
    perm(permissions::ROLE_CREATE, "Create roles", "Create custom roles", "role"),
    perm(permissions::ROLE_EDIT, "Edit roles", "Edit custom roles", "role"),
    perm(permissions::ROLE_DELETE, "Delete roles", "Delete custom roles", "role"),
];

pub const BUILTIN_ROLES: &[RoleSpec] = &[
    RoleSpec {
        name: roles::ADMIN,
        display_name: "Administrator",
        description: "Full access to every resource",
        is_system: true,
        permissions: &[
            permissions::LOG_CREATE,
            permissions::LOG_EDIT,
            permissions::LOG_DELETE,
            permissions::USER_VIEW,
            permissions::USER_EDIT,
            permissions::USER_DELETE,
            permissions::USER_MANAGE_ROLES,
            permissions::ROLE_VIEW,
            permissions::ROLE_CREATE,
            permissions::ROLE_EDIT,
            permissions::ROLE_DELETE,
        ],
    },
    RoleSpec {
        name: roles::USER,
        display_name: "User",
        description: "Baseline role granted at registration",
        is_system: true,
        permissions: &[],
    },
    RoleSpec {
        name: roles::EDITOR,
        display_name: "Editor",
        description: "Manages generation logs",
        is_system: false,
        permissions: &[
            permissions::LOG_CREATE,
            permissions::LOG_EDIT,
            permissions::LOG_DELETE,
        ],
    },
];

/// Role assigned to every self-registered account.
pub const DEFAULT_ROLE: &str = roles::USER;

/// Maximum length of a role name.
pub const ROLE_NAME_MAX_LEN: usize = 50;
