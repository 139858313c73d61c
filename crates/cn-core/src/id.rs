use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Global string interner for element and connection ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Per-process nonce mixed into generated ids so two sessions editing the
/// same stored canvas never mint the same id.
static SESSION_NONCE: LazyLock<String> = LazyLock::new(fresh_nonce);

/// Eight hex digits of a random v4 uuid. Uses the host's random source
/// (`crypto.getRandomValues` in the browser), never process APIs.
fn fresh_nonce() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    uuid[..8].to_string()
}

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn generate(prefix: &str) -> Spur {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    INTERNER.get_or_intern(format!("{prefix}-{}-{n}", *SESSION_NONCE))
}

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern an existing id string (e.g. one loaded from the store).
            pub fn intern(s: &str) -> Self {
                Self(INTERNER.get_or_intern(s))
            }

            /// Mint a fresh id that has never been handed out before.
            pub fn generate() -> Self {
                Self(generate($prefix))
            }

            pub fn as_str(self) -> &'static str {
                INTERNER.resolve(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Identifier of a diagram element. 4 bytes, `Copy`, O(1) compare.
    ElementId,
    "el"
);

interned_id!(
    /// Identifier of a connection between two elements.
    ConnectionId,
    "conn"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = ElementId::intern("el-login");
        let b = ElementId::intern("el-login");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "el-login");
    }

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let a = ElementId::generate();
        let b = ElementId::generate();
        let c = ConnectionId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("el-"));
        assert!(c.as_str().starts_with("conn-"));
    }

    #[test]
    fn nonce_is_random_hex() {
        let a = fresh_nonce();
        let b = fresh_nonce();
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn generated_id_embeds_session_nonce() {
        let id = ElementId::generate();
        let nonce = id.as_str().split('-').nth(1).unwrap_or_default();
        assert_eq!(nonce, SESSION_NONCE.as_str());
    }

    #[test]
    fn as_str_outlives_the_id_value() {
        let names: Vec<&'static str> = [ElementId::intern("el-a"), ElementId::intern("el-b")]
            .iter()
            .map(|id| id.as_str())
            .collect();
        assert_eq!(names, ["el-a", "el-b"]);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ElementId::intern("el-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"el-42\"");
        let back: ElementId = serde_json::from_str("\"el-42\"").unwrap();
        assert_eq!(back, id);
    }
}
