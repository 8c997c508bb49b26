use xxhash_rust::xxh3::Xxh3;

/// Separates the family name and the individual label values in the hash
/// input, so that `("ab", [])` and `("a", ["b"])` produce distinct digests.
const SEPARATOR: u8 = 0xff;

/// Computes the 64-bit identity of a (family name, label set) pair.
///
/// `label_values` must be supplied in label-name-sorted order; the caller
/// sorts before hashing so that the identity is independent of the order in
/// which a producer happens to pass its labels. Only the label values enter
/// the digest, matching the stored metric identity.
pub(super) fn identity<'a>(
    family_name: &str,
    label_values: impl Iterator<Item = &'a str>,
) -> u64 {
    let mut hasher = Xxh3::new();
    hasher.update(family_name.as_bytes());
    hasher.update(&[SEPARATOR]);
    for value in label_values {
        hasher.update(value.as_bytes());
        hasher.update(&[SEPARATOR]);
    }
    hasher.digest()
}
