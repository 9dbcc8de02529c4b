//! Storage key constants.

/// Keys used in the local store.
pub struct StorageKeys;

impl StorageKeys {
    /// Actor session mirror (JSON). One key, so a commit is a single write.
    pub const ACTOR_SESSION: &'static str = "actor_session";

    /// Supabase access token
    pub const SUPABASE_ACCESS_TOKEN: &'static str = "supabase_access_token";

    /// Supabase refresh token
    pub const SUPABASE_REFRESH_TOKEN: &'static str = "supabase_refresh_token";

    /// Supabase token metadata (JSON: user id, email, expiry)
    pub const SUPABASE_SESSION_META: &'static str = "supabase_session_meta";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_storage_keys_unique() {
        let keys = [
            StorageKeys::ACTOR_SESSION,
            StorageKeys::SUPABASE_ACCESS_TOKEN,
            StorageKeys::SUPABASE_REFRESH_TOKEN,
            StorageKeys::SUPABASE_SESSION_META,
        ];
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len(), "Storage keys must be unique");
        assert!(keys.iter().all(|k| !k.is_empty()));
    }
}
