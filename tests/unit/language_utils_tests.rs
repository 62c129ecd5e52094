/*!
 * Tests for language code handling
 */

use linewise::language_utils::{display_name, get_language_name, language_codes_match, normalize_to_part2t};

#[test]
fn test_get_language_name_withCommonCodes_shouldReturnEnglishNames() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("fra").unwrap(), "French");
    assert_eq!(get_language_name("ger").unwrap(), "German");
}

#[test]
fn test_get_language_name_withUnknownCode_shouldFail() {
    assert!(get_language_name("xx").is_err());
    assert!(get_language_name("english").is_err());
}

#[test]
fn test_language_codes_match_acrossCodeForms() {
    assert!(language_codes_match("fr", "fra"));
    assert!(language_codes_match("fre", "FR"));
    assert!(!language_codes_match("fr", "de"));
    assert!(!language_codes_match("xx", "xx"));
}

#[test]
fn test_normalize_withWhitespace_shouldTrim() {
    assert_eq!(normalize_to_part2t(" es ").unwrap(), "spa");
}

#[test]
fn test_display_name_shouldNeverFail() {
    assert_eq!(display_name("auto"), "Auto-detect");
    assert_eq!(display_name("AUTO"), "Auto-detect");
    assert_eq!(display_name("ja"), "Japanese");
    assert_eq!(display_name("klingon"), "klingon");
}
