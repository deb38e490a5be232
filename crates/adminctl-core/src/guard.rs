// ABOUTME: Route guard chain: decides per navigation whether to render, redirect, or deny.
// ABOUTME: Pure function over guard flags and a session snapshot; row order is load-bearing.

use tracing::warn;

use crate::session::AccountState;

/// Access flags a route declares. `public`, `admin`, and `superuser` are
/// mutually exclusive; setting more than one is a configuration error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardFlags {
    pub public: bool,
    pub admin: bool,
    pub superuser: bool,
}

impl GuardFlags {
    pub fn public() -> Self {
        Self {
            public: true,
            ..Self::default()
        }
    }

    pub fn admin() -> Self {
        Self {
            admin: true,
            ..Self::default()
        }
    }

    pub fn superuser() -> Self {
        Self {
            superuser: true,
            ..Self::default()
        }
    }
}

/// Snapshot of session state the guard evaluates against.
#[derive(Debug, Clone)]
pub struct GuardCtx<'a> {
    pub authenticated: bool,
    pub account: &'a AccountState,
    /// Current path, preserved in the login redirect.
    pub path: &'a str,
}

/// What the caller should do with the route element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// More than one exclusivity flag was set; render nothing.
    ConfigError,
    /// Account load still in flight; show a spinner.
    Loading,
    RedirectToLogin { redirect: String },
    /// Public route reached while authenticated; go home.
    RedirectHome,
    /// Redirect side effect already in flight; render nothing.
    RenderNothing,
    /// Authenticated but lacking the required privilege; render a 403 page.
    Forbidden,
    /// All checks passed; render the children.
    Render,
}

/// Evaluate the guard table top to bottom. Later rows assume earlier ones
/// passed, so the ordering here must not be rearranged.
pub fn evaluate(flags: GuardFlags, ctx: &GuardCtx<'_>) -> GuardOutcome {
    let exclusive = [flags.public, flags.admin, flags.superuser]
        .iter()
        .filter(|f| **f)
        .count();
    if exclusive > 1 {
        warn!(?flags, "route guard misconfigured: exclusive flags overlap");
        return GuardOutcome::ConfigError;
    }

    if ctx.account.is_loading() {
        return GuardOutcome::Loading;
    }

    if ctx.account.is_failed() {
        return GuardOutcome::RedirectToLogin {
            redirect: login_redirect(ctx.path),
        };
    }

    if !flags.public && !ctx.authenticated {
        return GuardOutcome::RedirectToLogin {
            redirect: login_redirect(ctx.path),
        };
    }

    if flags.public && ctx.authenticated {
        return GuardOutcome::RedirectHome;
    }

    // Unreachable after the redirect row above; kept so the table reads the
    // same as the render-time original, where the redirect is an effect and
    // this row covers the frame it is in flight.
    if !flags.public && !ctx.authenticated {
        return GuardOutcome::RenderNothing;
    }

    if flags.admin && !ctx.account.is_admin() {
        return GuardOutcome::Forbidden;
    }

    if flags.superuser && !ctx.account.is_super_admin() {
        return GuardOutcome::Forbidden;
    }

    GuardOutcome::Render
}

fn login_redirect(path: &str) -> String {
    format!("/login?redirect={path}")
}
