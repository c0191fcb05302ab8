use std::fmt;

/// Identifies one pool: (group, host, port). Pure value type; two requests
/// differing only in path, query, or body map to the same key and therefore
/// share a pool and its capacity limits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub group: String,
    pub host: String,
    pub port: u16,
}

impl PoolKey {
    pub fn new(group: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self { group: group.into(), host: host.into(), port }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.group, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &PoolKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn key_is_a_pure_function_of_its_fields() {
        let a = PoolKey::new("default", "example.com", 80);
        let b = PoolKey::new("default", "example.com", 80);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        assert_ne!(a, PoolKey::new("uploads", "example.com", 80));
        assert_ne!(a, PoolKey::new("default", "example.org", 80));
        assert_ne!(a, PoolKey::new("default", "example.com", 8080));
    }

    #[test]
    fn display_names_the_group_host_and_port() {
        let key = PoolKey::new("default", "example.com", 8080);
        assert_eq!(key.to_string(), "default@example.com:8080");
    }
}
