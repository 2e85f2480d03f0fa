//! Likely-duplicate detection for customer records.
//!
//! Two customers are considered likely duplicates when their normalized email
//! addresses match, or when both their normalized first and last names match.
//! The relation is symmetric and reflexive but deliberately not transitive:
//! A may match B by email and B match C by name without A matching C.

use crate::domain::customer::Customer;
use crate::errors::DomainError;

/// Normalize an email address for equality comparison.
///
/// For some providers the result is a different but still deliverable
/// address. Assumes the input is a syntactically valid email; an input
/// without `@` is rejected.
pub fn normalize_email(email: &str) -> Result<String, DomainError> {
    let at = email
        .find('@')
        .ok_or_else(|| DomainError::InvalidEmail { email: email.to_string() })?;
    let raw_local = &email[..at];
    let domain = &email[at + 1..];

    // Periods in the local part are meaningless to GMail.
    let stripped: String = raw_local.chars().filter(|&c| c != '.').collect();

    // Cut off anything following '+' or '-' (GMail uses '+' for tags, some
    // providers use '-'). The cut position is located in the period-stripped
    // local but applied to the raw input; stored normalized-email columns
    // depend on that exact slicing, pinned by test vectors below.
    let local = match stripped.chars().position(|c| c == '+' || c == '-') {
        Some(position) if position > 0 => email.chars().take(position).collect(),
        _ => stripped,
    };

    let local = local.to_lowercase();
    let domain = domain.to_lowercase();
    Ok(format!("{}@{}", local.trim(), domain.trim()))
}

/// Normalize a name for equality comparison, propagating absence.
/// Internal whitespace is preserved; only case and outer whitespace fold.
pub fn normalize_name(name: Option<&str>) -> Option<String> {
    name.map(|value| value.to_lowercase().trim().to_string())
}

/// Whether two email addresses normalize to the same comparison key.
/// An address that fails to normalize never compares equal.
pub fn emails_likely_duplicates(email_a: &str, email_b: &str) -> bool {
    match (normalize_email(email_a), normalize_email(email_b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Whether two names normalize to the same comparison key.
pub fn names_likely_duplicates(name_a: Option<&str>, name_b: Option<&str>) -> bool {
    normalize_name(name_a) == normalize_name(name_b)
}

/// Whether two customer records likely describe the same person.
///
/// Flags either of the following:
/// 1. emails are exact or approximate matches,
/// 2. first AND last names are exact or approximate matches.
pub fn are_customers_likely_duplicates(a: &Customer, b: &Customer) -> bool {
    if emails_likely_duplicates(&a.email, &b.email) {
        return true;
    }

    names_likely_duplicates(Some(&a.first_name), Some(&b.first_name))
        && names_likely_duplicates(Some(&a.last_name), Some(&b.last_name))
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::domain::customer::Customer;

    use super::{
        are_customers_likely_duplicates, emails_likely_duplicates, names_likely_duplicates,
        normalize_email, normalize_name,
    };

    const NIMOY_EMAIL_FORMS: &[&str] = &[
        "leonard.s.nimoy@gmail.com",
        "leonardsnimoy@gmail.com",
        "LeonardSNimoy+autograph@gmail.com",
        "LeonardSNimoy-spam@gmail.com",
    ];

    fn customer(email: &str, first_name: &str, last_name: &str) -> Customer {
        Customer::new(email, first_name, last_name).expect("valid customer")
    }

    #[test]
    fn nimoy_email_forms_share_one_normalized_key() {
        for form in NIMOY_EMAIL_FORMS {
            assert_eq!(
                normalize_email(form).expect("valid email"),
                "leonardsnimoy@gmail.com",
                "input: {form}"
            );
        }
    }

    #[test]
    fn periods_are_removed_from_local_part_only() {
        assert_eq!(
            normalize_email("l.nimoy@mail.example.com").unwrap(),
            "lnimoy@mail.example.com"
        );
    }

    #[test]
    fn lowercases_and_trims_both_parts() {
        assert_eq!(
            normalize_email("  Leonard.S.Nimoy@GMAIL.COM  ").unwrap(),
            "leonardsnimoy@gmail.com"
        );
    }

    #[test]
    fn tag_cut_is_applied_to_the_raw_input() {
        // The '+' sits at position 2 of the stripped local ("ls+tag"), so the
        // raw input is cut after two characters and a period survives.
        assert_eq!(normalize_email("l.s+tag@x.com").unwrap(), "l.@x.com");
    }

    #[test]
    fn leading_tag_characters_are_not_cut() {
        assert_eq!(normalize_email("+tag@x.com").unwrap(), "+tag@x.com");
        assert_eq!(normalize_email("-minus@x.com").unwrap(), "-minus@x.com");
    }

    #[test]
    fn email_without_at_is_rejected() {
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("").is_err());
    }

    #[test]
    fn normalization_is_idempotent_on_the_sample_corpus() {
        let corpus = [
            "leonard.s.nimoy@gmail.com",
            "LeonardSNimoy+autograph@gmail.com",
            "LeonardSNimoy-spam@gmail.com",
            "  FDR@WhiteHouse.GOV ",
            "geraldo@foxnews.com",
            "l.s+tag@x.com",
        ];
        for input in corpus {
            let once = normalize_email(input).unwrap();
            let twice = normalize_email(&once).unwrap();
            assert_eq!(once, twice, "input: {input}");
        }
    }

    #[test]
    fn normalized_output_shape_holds_on_the_sample_corpus() {
        let corpus = ["leonard.s.nimoy@gmail.com", " NPH@Gmail.Com", "teddy@whitehouse.gov"];
        for input in corpus {
            let normalized = normalize_email(input).unwrap();
            assert_eq!(normalized.matches('@').count(), 1, "input: {input}");
            assert_eq!(normalized, normalized.to_lowercase(), "input: {input}");
            assert_eq!(normalized, normalized.trim(), "input: {input}");
            let local = &normalized[..normalized.find('@').unwrap()];
            assert!(!local.contains('.'), "input: {input}");
        }
    }

    #[test]
    fn name_normalization_folds_case_and_outer_whitespace() {
        assert_eq!(normalize_name(None), None);
        assert_eq!(normalize_name(Some("  Leonard  ")), Some("leonard".to_string()));
        assert_eq!(normalize_name(Some("LEONARD")), Some("leonard".to_string()));
        assert_eq!(normalize_name(Some("Neal  Patrick")), Some("neal  patrick".to_string()));
        assert_eq!(normalize_name(Some("")), Some(String::new()));
    }

    #[test]
    fn matching_emails_are_duplicates() {
        let customers = [
            customer("leonard.s.nimoy@gmail.com", "L", "Nimoy"),
            customer("leonardsnimoy@gmail.com", "Leo", "Nimoy"),
            customer("LeonardSNimoy+autograph@gmail.com", "Lenny", "Nimoy"),
            customer("LeonardSNimoy-spam@gmail.com", "Leonard", "Nimoy"),
        ];
        assert_all_match(&customers);
    }

    #[test]
    fn matching_names_are_duplicates() {
        let customers = [
            customer("l.nimoy.1@gmail.com", "Leonard", "Nimoy"),
            customer("l.nimoy.2@gmail.com", "LEONARD", "Nimoy"),
            customer("l.nimoy.3@gmail.com", "LEONARD", "NIMOY"),
            customer("l.nimoy.4@gmail.com", "  Leonard  ", "  Nimoy  "),
        ];
        assert_all_match(&customers);
    }

    #[test]
    fn distinct_names_and_emails_are_not_duplicates() {
        let customers = [
            customer("l.nimoy@gmail.com", "L.", "Nimoy"),
            customer("geraldo@foxnews.com", "Geraldo", ""),
            customer("nph@gmail.com", "Neal Patrick", "Harris"),
        ];
        for a in &customers {
            for b in &customers {
                if !std::ptr::eq(a, b) {
                    assert!(!are_customers_likely_duplicates(a, b));
                }
            }
        }
    }

    #[test]
    fn matcher_is_reflexive() {
        let leonard = customer("l.nimoy@gmail.com", "Leonard", "Nimoy");
        assert!(are_customers_likely_duplicates(&leonard, &leonard));
    }

    #[test]
    fn matcher_is_symmetric_over_a_randomized_sweep() {
        let mut rng = StdRng::seed_from_u64(7);
        let locals = ["leonard", "leonard.s", "geraldo", "nph", "teddy+sub"];
        let domains = ["gmail.com", "foxnews.com", "whitehouse.gov"];
        let firsts = ["Leonard", "LEONARD", "Geraldo", "Neal Patrick", ""];
        let lasts = ["Nimoy", " Nimoy ", "Harris", ""];

        let mut pool = Vec::new();
        for _ in 0..64 {
            let email = format!(
                "{}@{}",
                locals[rng.gen_range(0..locals.len())],
                domains[rng.gen_range(0..domains.len())]
            );
            pool.push(customer(
                &email,
                firsts[rng.gen_range(0..firsts.len())],
                lasts[rng.gen_range(0..lasts.len())],
            ));
        }

        for a in &pool {
            for b in &pool {
                assert_eq!(
                    are_customers_likely_duplicates(a, b),
                    are_customers_likely_duplicates(b, a),
                    "a: {}, b: {}",
                    a.email,
                    b.email
                );
            }
        }
    }

    #[test]
    fn matcher_is_not_transitive() {
        // A matches B by email, B matches C by name, A shares neither with C.
        let a = customer("leonard.s.nimoy@gmail.com", "L", "Nimoy");
        let b = customer("leonardsnimoy@gmail.com", "Spock", "Prime");
        let c = customer("science.officer@enterprise.example", "SPOCK", "Prime");

        assert!(are_customers_likely_duplicates(&a, &b));
        assert!(are_customers_likely_duplicates(&b, &c));
        assert!(!are_customers_likely_duplicates(&a, &c));
    }

    #[test]
    fn helper_predicates_agree_with_their_normalizers() {
        assert!(emails_likely_duplicates("a.b@x.com", "ab@x.com"));
        assert!(!emails_likely_duplicates("a@x.com", "a@y.com"));
        assert!(!emails_likely_duplicates("broken", "broken"));
        assert!(names_likely_duplicates(None, None));
        assert!(names_likely_duplicates(Some(" Leonard"), Some("LEONARD ")));
        assert!(!names_likely_duplicates(Some("Leonard"), None));
    }

    fn assert_all_match(customers: &[Customer]) {
        for a in customers {
            for b in customers {
                if !std::ptr::eq(a, b) {
                    assert!(
                        are_customers_likely_duplicates(a, b),
                        "expected match: {} / {}",
                        a.email,
                        b.email
                    );
                }
            }
        }
    }
}
