use crate::entities::OwnerKind;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A resolved currency owner. The session layer upstream authenticates the
/// caller and hands the resolved owner to every ledger/gacha call; the core
/// never authenticates by itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Owner {
    pub kind: OwnerKind,
    pub id: i64,
}

impl Owner {
    pub fn user(id: i64) -> Self {
        Self {
            kind: OwnerKind::User,
            id,
        }
    }

    pub fn circle(id: i64) -> Self {
        Self {
            kind: OwnerKind::Circle,
            id,
        }
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_display() {
        assert_eq!(Owner::user(7).to_string(), "user:7");
        assert_eq!(Owner::circle(3).to_string(), "circle:3");
    }

    #[test]
    fn test_owner_namespaces_are_distinct() {
        // Same numeric id, different currency namespace
        assert_ne!(Owner::user(1), Owner::circle(1));
    }
}
