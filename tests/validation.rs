use pinconfig::{load, reference_document, Category, ErrorKind, LoadError, LoaderOptions, ValidationErrors};

fn errors(text: &str) -> ValidationErrors {
    match load(text, &LoaderOptions::default()) {
        Err(LoadError::Invalid(errors)) => errors,
        other => panic!("expected validation errors, got {:?}", other),
    }
}

/// The reference document with one line replaced.
fn reference_with(from: &str, to: &str) -> String {
    let text = reference_document().unwrap();
    assert!(text.contains(from), "reference config has no '{}'", from);
    text.replacen(from, to, 1)
}

#[test]
fn broken_autofire_reference() {
    let text = reference_with("coil: c_slingshot_test", "coil: c_slingshot_missing");
    let errors = errors(&text);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.at("autofire_coils.ac_slingshot_test.coil"),
        Some(&ErrorKind::UndefinedReference {
            category: Category::Coils,
            name: "c_slingshot_missing".into()
        })
    );
}

#[test]
fn broken_flipper_reference() {
    let text = reference_with("eos_switch: s_flipper_eos", "eos_switch: s_flipper_end");
    let errors = errors(&text);
    assert!(matches!(
        errors.at("flippers.f_test_hold_eos.eos_switch"),
        Some(ErrorKind::UndefinedReference { .. })
    ));
}

#[test]
fn mismatched_mask_widths() {
    let text = reference_with("hold_pwm_mask: \"10101010\"", "hold_pwm_mask: \"10101010101010101010101010101010\"");
    let errors = errors(&text);
    assert_eq!(
        errors.at("coils.c_pulse_pwm_mask.hold_pwm_mask"),
        Some(&ErrorKind::MaskWidthMismatch { pulse: 8, hold: 32 })
    );
}

#[test]
fn lowercase_switch_type() {
    let text = reference_with("type: NC", "type: nc");
    let errors = errors(&text);
    assert!(matches!(
        errors.at("switches.s_test_nc.type"),
        Some(ErrorKind::InvalidChoice { .. })
    ));
}

#[test]
fn duplicate_switch_name() {
    let text = reference_with("    s_auto_launch:\n", "    s_test:\n");
    let errors = errors(&text);
    assert_eq!(errors.at("switches.s_test"), Some(&ErrorKind::DuplicateName));
}

#[test]
fn unknown_section_and_lenient_loading() {
    let text = reference_with("gis:", "playfield_lights:\n    pl_one:\n        number: 1\n\ngis:");
    let errors = errors(&text);
    assert_eq!(errors.at("playfield_lights"), Some(&ErrorKind::UnknownCategory));

    let options = LoaderOptions {
        strict: false,
        ..Default::default()
    };
    let graph = load(&text, &options).unwrap();
    assert_eq!(graph.count(Category::Gis), 1);
}

#[test]
fn missing_version_marker() {
    let text = reference_with("#config_version=4", "# machine config");
    match load(&text, &LoaderOptions::default()) {
        Err(LoadError::Version { found: 0, required: 4 }) => {}
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn yaml_syntax_error() {
    let text = reference_with("number: 2-23", "number: [2-23");
    match load(&text, &LoaderOptions::default()) {
        Err(LoadError::Syntax { line, .. }) => assert!(line > 1),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn error_messages_name_the_key_path() {
    let text = reference_with("pulse_ms: 23", "pulse_ms: fast");
    let message = load(&text, &LoaderOptions::default()).unwrap_err().to_string();
    assert_eq!(message, "coils.c_test.pulse_ms: expected an integer, found 'fast'");
}

#[test]
fn oversized_matrix_switch() {
    let text = reference_with("number: 1/3", "number: 268435456/0");
    let errors = errors(&text);
    assert_eq!(
        errors.at("switches.s_flipper.number"),
        Some(&ErrorKind::MalformedNumber("268435456/0".into()))
    );
}
