//! Random numbers and identifiers.

use crate::core::error::{ToolkitError, ToolkitResult};
use rand::Rng;
use uuid::Uuid;

/// Uniform integer in `1..=n`
pub fn rand(n: u64) -> ToolkitResult<u64> {
    if n == 0 {
        return Err(ToolkitError::invalid_input("rand bound must be positive"));
    }
    Ok(::rand::thread_rng().gen_range(1..=n))
}

/// `x + ((y & 1) * n) / 2` with `x` and `y` drawn from `rand(n / 2)`.
///
/// Requires `n >= 2`.
pub fn rand_distribution(n: u64) -> ToolkitResult<u64> {
    let half = n / 2;
    if half == 0 {
        return Err(ToolkitError::invalid_input(
            "rand_distribution bound must be at least 2",
        ));
    }
    let x = rand(half)?;
    let y = rand(half)?;
    Ok(x + ((y & 1) * n) / 2)
}

/// Random (v4) UUID in hyphenated form
pub fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rand_bounds() {
        for _ in 0..1000 {
            let v = rand(6).unwrap();
            assert!((1..=6).contains(&v));
        }
        assert_eq!(rand(1).unwrap(), 1);
        assert!(matches!(rand(0), Err(ToolkitError::InvalidInput { .. })));
    }

    #[test]
    fn test_rand_distribution_range() {
        for _ in 0..1000 {
            let v = rand_distribution(10).unwrap();
            assert!((1..=10).contains(&v), "out of range: {}", v);
        }
        assert!(rand_distribution(1).is_err());
    }

    #[test]
    fn test_new_uuid() {
        let id = new_uuid();
        assert_eq!(id.len(), 36);
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(id, new_uuid());
    }
}
