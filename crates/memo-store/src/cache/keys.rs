//! Cache keys and values.
//!
//! Keys render to the textual conventions prefix invalidation relies on:
//!
//! - `memo:{id}`
//! - `sent:{user}:{limit}:{offset}` / `received:{user}:{limit}:{offset}`
//! - `users:all`

use std::fmt;
use std::sync::Arc;

use memo_core::{Direction, Memo, Page};

/// Key of a cache entry. The variant fixes the shape of the value stored under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A single memo by id.
    Memo(String),
    /// One page of a user's sent or received list.
    List {
        direction: Direction,
        user: String,
        page: Page,
    },
    /// The user directory.
    Users,
}

impl CacheKey {
    pub fn memo(id: impl Into<String>) -> Self {
        Self::Memo(id.into())
    }

    pub fn list(direction: Direction, user: impl Into<String>, page: Page) -> Self {
        Self::List {
            direction,
            user: user.into(),
            page,
        }
    }

    /// Prefix shared by every page of `user`'s list in `direction`.
    ///
    /// # Examples
    ///
    /// ```
    /// use memo_core::{Direction, Page};
    /// use memo_store::cache::CacheKey;
    ///
    /// let key = CacheKey::list(Direction::Sent, "ann@example.com", Page::new(20, 40));
    /// assert_eq!(key.to_string(), "sent:ann@example.com:20:40");
    /// assert!(key.to_string().starts_with(&CacheKey::user_list_prefix(Direction::Sent, "ann@example.com")));
    /// ```
    pub fn user_list_prefix(direction: Direction, user: &str) -> String {
        format!("{}:{}:", direction, user)
    }

    /// Prefix shared by every list page in `direction`, for all users.
    pub fn direction_prefix(direction: Direction) -> String {
        format!("{}:", direction)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memo(id) => write!(f, "memo:{}", id),
            Self::List {
                direction,
                user,
                page,
            } => write!(
                f,
                "{}:{}:{}:{}",
                direction,
                user,
                page.limit(),
                page.offset()
            ),
            Self::Users => f.write_str("users:all"),
        }
    }
}

/// Value of a cache entry.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Memo(Arc<Memo>),
    List(Arc<Vec<Memo>>),
    Users(Arc<Vec<String>>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_rendering() {
        assert_eq!(CacheKey::memo("m1").to_string(), "memo:m1");
        assert_eq!(
            CacheKey::list(Direction::Received, "bob", Page::new(10, 0)).to_string(),
            "received:bob:10:0"
        );
        assert_eq!(CacheKey::Users.to_string(), "users:all");
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(CacheKey::user_list_prefix(Direction::Sent, "bob"), "sent:bob:");
        assert_eq!(CacheKey::direction_prefix(Direction::Received), "received:");
    }

    #[test]
    fn test_key_hash_distinguishes_pages() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(CacheKey::list(Direction::Sent, "bob", Page::new(20, 0)));
        set.insert(CacheKey::list(Direction::Sent, "bob", Page::new(20, 20)));
        set.insert(CacheKey::list(Direction::Received, "bob", Page::new(20, 0)));

        assert_eq!(set.len(), 3);
    }
}
