use splash_core::gpu::{inject_keywords, GpuError, Keyword, ProgramKind};

#[test]
fn keywords_become_constants() {
    let source = "fn main() {}\n";
    let out = inject_keywords(
        source,
        &[Keyword::new("SHADING", true), Keyword::new("BLOOM", false)],
    )
    .unwrap();
    assert_eq!(
        out,
        "const SHADING: bool = true;\nconst BLOOM: bool = false;\nfn main() {}\n"
    );
    assert_eq!(inject_keywords(source, &[]).unwrap(), source);
}

#[test]
fn invalid_keyword_is_rejected() {
    let err = inject_keywords("", &[Keyword::new("9LIVES", true)]).unwrap_err();
    assert!(matches!(err, GpuError::InvalidKeyword("9LIVES")));
    assert!(inject_keywords("", &[Keyword::new("A-B", true)]).is_err());
}

#[test]
fn program_input_counts() {
    assert_eq!(ProgramKind::Color.inputs(), 0);
    assert_eq!(ProgramKind::Display.inputs(), 3);
    assert_eq!(ProgramKind::Advection.inputs(), 2);
    assert_eq!(ProgramKind::Splat.inputs(), 1);
    assert_eq!(ProgramKind::GradientSubtract.name(), "gradient_subtract");
}
