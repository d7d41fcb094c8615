use super::*;

#[test]
fn canonical_names_round_trip() {
    for &platform in Platform::all() {
        let parsed: Platform = platform.short_name().parse().unwrap();
        assert_eq!(parsed, platform, "round-trip failed for {:?}", platform);
    }
}

#[test]
fn folder_aliases_resolve() {
    let cases = [
        ("genesis", Platform::Genesis),
        ("megadrive", Platform::Genesis),
        ("ps1", Platform::Ps1),
        ("psx", Platform::Ps1),
        ("sfc", Platform::Snes),
        ("gc", Platform::GameCube),
        ("fbneo", Platform::Arcade),
        ("tg16", Platform::PcEngine),
    ];
    for (input, expected) in cases {
        let parsed: Platform = input.parse().unwrap();
        assert_eq!(parsed, expected, "alias '{}'", input);
    }
}

#[test]
fn parsing_ignores_case_and_padding() {
    assert_eq!("SNES".parse::<Platform>().unwrap(), Platform::Snes);
    assert_eq!(" MegaDrive ".parse::<Platform>().unwrap(), Platform::Genesis);
}

#[test]
fn unknown_folder_is_an_error() {
    let err = "ports".parse::<Platform>().unwrap_err();
    assert_eq!(err.to_string(), "unknown system: 'ports'");
}

#[test]
fn short_name_is_first_alias() {
    for &platform in Platform::all() {
        assert_eq!(platform.short_name(), platform.aliases()[0], "{:?}", platform);
    }
}

#[test]
fn every_platform_has_lowercase_extensions() {
    for &platform in Platform::all() {
        assert!(!platform.extensions().is_empty(), "{:?}", platform);
        for ext in platform.extensions() {
            assert_eq!(*ext, ext.to_lowercase());
            assert!(!ext.starts_with('.'));
        }
    }
}

#[test]
fn disc_systems_are_not_hashed() {
    assert!(Platform::Snes.hashable());
    assert!(!Platform::Ps1.hashable());
    assert!(!Platform::Dreamcast.hashable());
}
