//! Proptest generators for property-based testing.

use proptest::prelude::*;

use rolodex_core::ContactRecord;

/// Generate a valid username.
pub fn username() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]{2,15}"
}

/// Generate a valid contact name: one to three capitalized words, joined by
/// a space, hyphen or apostrophe.
pub fn name() -> impl Strategy<Value = String> {
    let word = "[A-Z][a-z]{1,10}";
    let joiner = prop_oneof![Just(" "), Just("-"), Just("'")];
    (word, prop::collection::vec((joiner, word), 0..=2)).prop_map(|(first, rest)| {
        rest.into_iter().fold(first, |mut acc, (joiner, word)| {
            acc.push_str(joiner);
            acc.push_str(&word);
            acc
        })
    })
}

/// Generate a canonical 10-digit phone number.
pub fn phone() -> impl Strategy<Value = String> {
    "[6-9][0-9]{9}"
}

/// Generate one of the ways a user might type `canonical`.
pub fn phone_variant(canonical: String) -> impl Strategy<Value = String> {
    let (area, rest) = canonical.split_at(3);
    let (mid, tail) = rest.split_at(3);
    prop_oneof![
        Just(canonical.clone()),
        Just(format!("+91{canonical}")),
        Just(format!("+91 {canonical}")),
        Just(format!("91{canonical}")),
        Just(format!("{} {}", &canonical[..5], &canonical[5..])),
        Just(format!("({area}) {mid}-{tail}")),
        Just(format!("+91-{area}-{mid}-{tail}")),
        Just(format!("  {canonical}  ")),
    ]
}

/// Generate a valid email address.
pub fn email() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9._]{0,10}@[a-z]{2,10}\\.(com|org|in|net)"
}

/// Generate a timestamp in Unix milliseconds.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=4_102_444_800_000
}

/// Generate a valid exported contact record.
pub fn contact_record() -> impl Strategy<Value = ContactRecord> {
    (name(), phone(), prop::option::of(email()), timestamp()).prop_map(
        |(name, phone, email, date_added)| ContactRecord {
            name,
            phone,
            email,
            date_added,
        },
    )
}
