// ABOUTME: Integration tests for validated identifiers and the concurrency bound.
// ABOUTME: Tests parsing, validation, and serde round-trip properties.

use deckhand::types::*;

mod module_name_tests {
    use super::*;

    #[test]
    fn accepts_directory_style_names() {
        for name in ["orders", "billing-api", "jobs_v2", "Auth.Service"] {
            assert!(ModuleName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_empty_name() {
        assert!(matches!(ModuleName::new(""), Err(ModuleNameError::Empty)));
    }

    #[test]
    fn rejects_path_separators() {
        assert!(matches!(
            ModuleName::new("a/b"),
            Err(ModuleNameError::InvalidChar('/'))
        ));
        assert!(matches!(
            ModuleName::new("a\\b"),
            Err(ModuleNameError::InvalidChar('\\'))
        ));
    }

    #[test]
    fn rejects_dot_entries() {
        assert!(matches!(ModuleName::new("."), Err(ModuleNameError::Reserved)));
        assert!(matches!(ModuleName::new(".."), Err(ModuleNameError::Reserved)));
    }

    #[test]
    fn rejects_whitespace() {
        assert!(ModuleName::new("my module").is_err());
    }

    #[test]
    fn rejects_overlong_name() {
        let long = "a".repeat(129);
        assert!(matches!(ModuleName::new(&long), Err(ModuleNameError::TooLong)));
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<ModuleName, _> = serde_json::from_str(r#""orders""#);
        assert_eq!(ok.unwrap().as_str(), "orders");

        let bad: Result<ModuleName, _> = serde_json::from_str(r#""a/b""#);
        assert!(bad.is_err());
    }
}

mod stage_name_tests {
    use super::*;

    #[test]
    fn accepts_common_stages() {
        for stage in ["dev", "staging", "prod", "qa-2", "feature_x"] {
            assert!(StageName::new(stage).is_ok(), "{stage} should be valid");
        }
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(StageName::new("  dev ").unwrap().as_str(), "dev");
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(StageName::new("   "), Err(StageNameError::Empty)));
    }

    #[test]
    fn must_start_with_a_letter() {
        assert!(matches!(
            StageName::new("1dev"),
            Err(StageNameError::InvalidStart)
        ));
    }

    #[test]
    fn rejects_punctuation() {
        assert!(matches!(
            StageName::new("dev.1"),
            Err(StageNameError::InvalidChar('.'))
        ));
    }

    #[test]
    fn display_matches_input() {
        assert_eq!(StageName::new("prod").unwrap().to_string(), "prod");
    }
}

mod concurrency_tests {
    use super::*;

    #[test]
    fn default_is_two() {
        assert_eq!(Concurrency::default().get(), 2);
    }

    #[test]
    fn accepts_one_through_three() {
        for n in 1..=3 {
            assert_eq!(Concurrency::new(n).unwrap().get(), n);
        }
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(Concurrency::new(0), Err(ConcurrencyError::OutOfRange(0)));
        assert_eq!(Concurrency::new(4), Err(ConcurrencyError::OutOfRange(4)));
    }

    #[test]
    fn parses_from_text() {
        assert_eq!("3".parse::<Concurrency>().unwrap().get(), 3);
        assert_eq!(
            "two".parse::<Concurrency>(),
            Err(ConcurrencyError::NotANumber("two".to_string()))
        );
        assert_eq!(
            "5".parse::<Concurrency>(),
            Err(ConcurrencyError::OutOfRange(5))
        );
    }
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn stage_names_roundtrip(name in "[a-zA-Z][a-zA-Z0-9_-]{0,63}") {
            let stage = StageName::new(&name).unwrap();
            let json = serde_json::to_string(&stage).unwrap();
            let back: StageName = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(stage, back);
        }

        #[test]
        fn concurrency_accepts_only_one_to_three(n in 0usize..100) {
            prop_assert_eq!(Concurrency::new(n).is_ok(), (1..=3).contains(&n));
        }

        #[test]
        fn module_names_without_separators_are_valid(name in "[a-z0-9][a-z0-9._-]{1,40}") {
            prop_assume!(name != "..");
            prop_assert!(ModuleName::new(&name).is_ok());
        }
    }
}
