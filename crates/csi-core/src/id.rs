//! Identifier helpers shared across the import engine.

use uuid::Uuid;

/// Generates a new server-assigned identifier.
#[must_use]
pub fn generate_id() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_is_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
    }
}
