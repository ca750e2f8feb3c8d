//! Visibility of advanced (team-management level) detail.
//!
//! A denial is not an error: callers simply get no advanced section.

use roster_core::AuthorizationContext;

/// Role tags allowed to see advanced detail for any subject (case-insensitive).
pub const PRIVILEGED_ROLES: [&str; 4] = ["manager", "coach", "admin", "ceo"];

pub fn is_privileged(ctx: &AuthorizationContext) -> bool {
    ctx.role_tags()
        .any(|tag| PRIVILEGED_ROLES.iter().any(|p| tag.eq_ignore_ascii_case(p)))
}

/// The viewer owns the subject. Two unknown ids never match.
pub fn is_owner(ctx: &AuthorizationContext) -> bool {
    matches!(
        (&ctx.viewer_id, &ctx.subject_owner_id),
        (Some(viewer), Some(owner)) if viewer == owner
    )
}

pub fn can_view_advanced(ctx: &AuthorizationContext) -> bool {
    ctx.advanced_requested && (is_owner(ctx) || is_privileged(ctx))
}

/// Build the advanced section only when the viewer may see it.
pub fn gate<T>(ctx: &AuthorizationContext, build: impl FnOnce() -> T) -> Option<T> {
    can_view_advanced(ctx).then(build)
}
