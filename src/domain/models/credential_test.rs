use super::Credential;

#[test]
fn it_trims_input() {
    let credential = Credential::parse("  abc123\n").unwrap();
    assert_eq!(credential.expose(), "abc123");
}

#[test]
fn it_rejects_blank_input() {
    assert!(Credential::parse("").is_none());
    assert!(Credential::parse("   \t").is_none());
}

#[test]
fn it_hides_short_credentials() {
    let credential = Credential::parse("abc123").unwrap();
    insta::assert_snapshot!(credential.redacted(), @"****");
}

#[test]
fn it_never_debug_prints_the_secret() {
    let credential = Credential::parse("AIzaSyExampleKey9876").unwrap();
    let printed = format!("{:?}", credential);

    assert!(!printed.contains("AIzaSy"));
    insta::assert_snapshot!(printed, @"Credential(****9876)");
}
