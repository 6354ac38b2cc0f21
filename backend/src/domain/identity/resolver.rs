//! Pure lookups over a directory snapshot.

use crate::domain::entities::Member;

/// Canonical form used to compare secrets with national ids.
///
/// # Examples
/// ```
/// use membership_sync::domain::identity::normalise_secret;
///
/// assert_eq!(normalise_secret("  12345678a "), "12345678A");
/// ```
pub fn normalise_secret(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Find the member whose national id matches `secret`.
pub fn find_member_for_secret<'a>(members: &'a [Member], secret: &str) -> Option<&'a Member> {
    let wanted = normalise_secret(secret);
    members.iter().find(|member| {
        member
            .national_id
            .as_deref()
            .is_some_and(|national_id| normalise_secret(national_id) == wanted)
    })
}

/// Members directly associated with `member_id`.
///
/// Association is one level deep: members associated with an associated
/// member are not included.
pub fn resolve_associated(members: &[Member], member_id: i64) -> Vec<Member> {
    members
        .iter()
        .filter(|member| member.parent_member_id == Some(member_id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn directory() -> Vec<Member> {
        vec![
            Member::new(1, "Titular").with_national_id("12345678A"),
            Member::new(2, "Asociada").with_national_id("87654321B").associated_with(1),
            Member::new(3, "Nieta").with_national_id("11111111C").associated_with(2),
            Member::new(4, "Sin DNI").associated_with(1),
        ]
    }

    #[rstest]
    #[case("12345678a")]
    #[case(" 12345678A  ")]
    #[case("12345678A")]
    fn secret_matches_case_and_whitespace_insensitively(
        directory: Vec<Member>,
        #[case] secret: &str,
    ) {
        let member = find_member_for_secret(&directory, secret).expect("member found");
        assert_eq!(member.id, 1);
    }

    #[rstest]
    fn unknown_secret_matches_nobody(directory: Vec<Member>) {
        assert!(find_member_for_secret(&directory, "00000000Z").is_none());
    }

    #[rstest]
    fn lowercase_secret_resolves_associated_member(directory: Vec<Member>) {
        let owner = find_member_for_secret(&directory, "12345678a").expect("owner");
        let associated: Vec<i64> = resolve_associated(&directory, owner.id)
            .into_iter()
            .map(|member| member.id)
            .collect();
        assert_eq!(associated, vec![2, 4]);
    }

    #[rstest]
    fn association_is_not_transitive(directory: Vec<Member>) {
        let associated = resolve_associated(&directory, 1);
        assert!(associated.iter().all(|member| member.id != 3));
    }
}
