//! Wildcard matcher behavior across the pattern shapes rules actually use

use rstest::rstest;
use warden::Action;
use warden::wildcard::{best, matches};

#[rstest]
#[case("rm", "rm", true)]
#[case("rm -rf", "rm", false)]
#[case("", "", true)]
#[case("x", "", false)]
#[case("", "*", true)]
#[case("anything at all", "*", true)]
#[case("git status", "git *", true)]
#[case("git", "git *", false)]
#[case("sudo git status", "git *", false)]
#[case("src/main.rs", "src/*", true)]
#[case("src/a/b/c.rs", "src/*", true)]
#[case("lib/main.rs", "src/*", false)]
#[case("src/main.rs", "*.rs", true)]
#[case("src/main.ts", "*.rs", false)]
#[case("git commit -m 'fix'", "git*commit*", true)]
#[case("git log", "git*commit*", false)]
#[case("npm run build", "npm*build", true)]
#[case("npm run build:dev", "npm*build", false)]
fn matches_cases(#[case] value: &str, #[case] pattern: &str, #[case] expected: bool) {
    assert_eq!(matches(value, pattern), expected, "{value:?} vs {pattern:?}");
}

#[test]
fn best_prefers_most_literal_characters() {
    let skills = [
        ("*", Action::Allow),
        ("internal/*", Action::Deny),
        ("internal/review", Action::Ask),
    ];
    assert_eq!(best("code-format", skills), Action::Allow);
    assert_eq!(best("internal/audit", skills), Action::Deny);
    assert_eq!(best("internal/review", skills), Action::Ask);
}

#[test]
fn best_with_no_candidates_is_ask() {
    assert_eq!(best("anything", []), Action::Ask);
}

#[test]
fn best_tie_takes_later_declaration() {
    let candidates = [("a*", Action::Deny), ("*a", Action::Allow)];
    assert_eq!(best("a", candidates), Action::Allow);
}
