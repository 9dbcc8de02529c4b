//! Route classification for the session guard.

/// Outcome of a navigation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Navigate to the given path instead, replacing the current entry.
    Redirect(String),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Which paths the guard leaves open and where it sends people.
#[derive(Debug, Clone)]
pub struct RouteTable {
    pub login_path: String,
    /// Where an authenticated actor lands from `/`.
    pub home_path: String,
    /// Where a freshly signed-up actor goes to finish their profile.
    pub onboarding_path: String,
    pub public_paths: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            home_path: "/feed".to_string(),
            onboarding_path: "/profile/edit".to_string(),
            public_paths: vec!["/login".to_string()],
        }
    }
}

impl RouteTable {
    /// Whether `path` may be shown without a session.
    ///
    /// Query strings, fragments and a trailing slash are ignored.
    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize(path);
        self.login_path == path || self.public_paths.iter().any(|p| normalize(p) == path)
    }

    pub fn redirect_to_login(&self) -> Decision {
        Decision::Redirect(self.login_path.clone())
    }
}

fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_is_public() {
        let routes = RouteTable::default();
        assert!(routes.is_public("/login"));
        assert!(routes.is_public("/login/"));
        assert!(routes.is_public("/login?next=%2Ffeed"));
        assert!(!routes.is_public("/feed"));
        assert!(!routes.is_public("/"));
        assert!(!routes.is_public("/loginx"));
    }

    #[test]
    fn test_extra_public_paths() {
        let routes = RouteTable {
            public_paths: vec!["/about".to_string()],
            ..RouteTable::default()
        };
        assert!(routes.is_public("/about#team"));
        assert!(routes.is_public("/login"));
        assert_eq!(
            routes.redirect_to_login(),
            Decision::Redirect("/login".to_string())
        );
    }

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("//"), "/");
        assert_eq!(normalize("/groups/"), "/groups");
    }
}
