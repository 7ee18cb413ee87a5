//! Route group mount table.
//!
//! # Responsibilities
//! - Hold one router per `/api` route group
//! - Nest each group under its fixed prefix
//! - Map a request path back to its group for metrics labels
//!
//! # Design Decisions
//! - Groups are supplied by the embedding crate; an unset group mounts empty
//! - Prefixes are fixed at compile time
//! - Statistics is merged at the bare `/api` prefix, after the named groups

use axum::Router;

use crate::http::AppState;

/// Prefixes of the named route groups, in mount order.
pub const GROUP_PREFIXES: [(&str, &str); 6] = [
    ("auth", "/api/auth"),
    ("nutrition", "/api/nutrition"),
    ("user", "/api/user"),
    ("devices", "/api/devices"),
    ("calendar", "/api/calendar"),
    ("meal_plans", "/api/meal-plans"),
];

/// Prefix shared by the statistics group.
pub const STATISTICS_PREFIX: &str = "/api";

/// The seven `/api` route groups.
#[derive(Default)]
pub struct ApiRoutes {
    pub auth: Router<AppState>,
    pub nutrition: Router<AppState>,
    pub user: Router<AppState>,
    pub devices: Router<AppState>,
    pub calendar: Router<AppState>,
    pub meal_plans: Router<AppState>,
    pub statistics: Router<AppState>,
}

impl ApiRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auth(mut self, router: Router<AppState>) -> Self {
        self.auth = router;
        self
    }

    pub fn nutrition(mut self, router: Router<AppState>) -> Self {
        self.nutrition = router;
        self
    }

    pub fn user(mut self, router: Router<AppState>) -> Self {
        self.user = router;
        self
    }

    pub fn devices(mut self, router: Router<AppState>) -> Self {
        self.devices = router;
        self
    }

    pub fn calendar(mut self, router: Router<AppState>) -> Self {
        self.calendar = router;
        self
    }

    pub fn meal_plans(mut self, router: Router<AppState>) -> Self {
        self.meal_plans = router;
        self
    }

    pub fn statistics(mut self, router: Router<AppState>) -> Self {
        self.statistics = router;
        self
    }

    /// Nest every group under its prefix.
    pub fn mount(self) -> Router<AppState> {
        let ApiRoutes {
            auth,
            nutrition,
            user,
            devices,
            calendar,
            meal_plans,
            statistics,
        } = self;

        let named = [auth, nutrition, user, devices, calendar, meal_plans];
        let mut router = Router::new();
        for ((_, prefix), group) in GROUP_PREFIXES.iter().zip(named) {
            router = router.nest(prefix, group);
        }

        // Statistics routes sit directly under `/api` (e.g. `/api/stats/weekly`).
        router.nest(STATISTICS_PREFIX, statistics)
    }
}

/// Metrics label for the group owning `path`.
pub fn group_for_path(path: &str) -> &'static str {
    for (name, prefix) in GROUP_PREFIXES {
        if path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/')) {
            return name;
        }
    }
    match path {
        "/health" => "health",
        "/test" => "test",
        p if p == STATISTICS_PREFIX || p.starts_with("/api/") => "statistics",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_map_to_groups() {
        assert_eq!(group_for_path("/api/auth/login"), "auth");
        assert_eq!(group_for_path("/api/meal-plans"), "meal_plans");
        assert_eq!(group_for_path("/api/meal-plans/3/days"), "meal_plans");
        assert_eq!(group_for_path("/api/stats/weekly"), "statistics");
        assert_eq!(group_for_path("/api/authority"), "statistics");
        assert_eq!(group_for_path("/health"), "health");
        assert_eq!(group_for_path("/favicon.ico"), "other");
    }
}
