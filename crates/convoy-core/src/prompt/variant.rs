//! Deterministic experiment variant assignment.
//!
//! Bucketing hashes `"{experiment}:{key}"` with FNV-1a-64 and takes the
//! result modulo the variant count. FNV is used instead of the stdlib's
//! `DefaultHasher` because its output is stable across processes and Rust
//! releases, which the bucketing contract requires.
//!
//! Known weakness: modulo bucketing over a small variant count is stable but
//! not necessarily uniform. That matches the intended behavior; do not
//! replace the scheme without revisiting existing assignments.

use convoy_types::error::PromptError;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Deterministically assign `key` to one of `variants` for `experiment`.
///
/// A pure function: the same (experiment, key) pair always yields the same
/// variant, with no persisted assignment state. Fails with
/// `EmptyVariantList` when no variants are given.
pub fn choose_variant<'a>(
    experiment: &str,
    variants: &'a [String],
    key: &str,
) -> Result<&'a str, PromptError> {
    if variants.is_empty() {
        return Err(PromptError::EmptyVariantList(experiment.to_string()));
    }
    let hash = fnv1a_64(format!("{experiment}:{key}").as_bytes());
    let index = (hash % variants.len() as u64) as usize;
    Ok(&variants[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_choose_variant_is_deterministic() {
        let vs = variants(&["control", "treatment"]);
        let first = choose_variant("onboarding", &vs, "user-42").unwrap().to_string();
        for _ in 0..100 {
            assert_eq!(choose_variant("onboarding", &vs, "user-42").unwrap(), first);
        }
    }

    #[test]
    fn test_experiment_name_changes_assignment_space() {
        let vs = variants(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        // Different experiments must be able to assign the same key
        // differently; over many keys at least one must diverge.
        let diverges = (0..64).any(|i| {
            let key = format!("user-{i}");
            choose_variant("exp-one", &vs, &key).unwrap()
                != choose_variant("exp-two", &vs, &key).unwrap()
        });
        assert!(diverges);
    }

    #[test]
    fn test_all_variants_reachable() {
        let vs = variants(&["a", "b", "c"]);
        let mut seen = std::collections::BTreeSet::new();
        for i in 0..200 {
            seen.insert(
                choose_variant("reach", &vs, &format!("key-{i}"))
                    .unwrap()
                    .to_string(),
            );
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_single_variant_always_wins() {
        let vs = variants(&["only"]);
        assert_eq!(choose_variant("e", &vs, "anyone").unwrap(), "only");
    }

    #[test]
    fn test_empty_variant_list_fails() {
        let result = choose_variant("e", &[], "key");
        assert!(matches!(result, Err(PromptError::EmptyVariantList(_))));
    }

    #[test]
    fn test_fnv_reference_value() {
        // FNV-1a 64 of "a" per the reference implementation.
        assert_eq!(fnv1a_64(b"a"), 0xaf63_dc4c_8601_ec8c);
    }
}
