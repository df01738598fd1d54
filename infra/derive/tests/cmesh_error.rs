use std::borrow::Cow;

#[cmesh_derive::cmesh_error]
pub enum SampleError {
    #[error("Lookup failed{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Internal fault{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn io_failure() -> Result<(), std::io::Error> {
    Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"))
}

#[test]
fn display_without_context() {
    let err = SampleError::NotFound { message: "KEY-1234".into(), context: None };
    assert_eq!(err.to_string(), "Lookup failed: KEY-1234");
}

#[test]
fn display_with_context() {
    let err = SampleError::NotFound {
        message: "KEY-1234".into(),
        context: Some("join protocol".into()),
    };
    assert_eq!(err.to_string(), "Lookup failed (join protocol): KEY-1234");
}

#[test]
fn context_ext_attaches_to_source_errors() {
    let err: SampleError = io_failure().context("reading snapshot").unwrap_err();
    assert!(matches!(err, SampleError::Io { context: Some(_), .. }));
    assert!(err.to_string().contains("reading snapshot"));
}

#[test]
fn context_ext_rewrites_existing_error() {
    let base: Result<(), SampleError> =
        Err(SampleError::NotFound { message: "KEY-0000".into(), context: None });
    let err = base.context("resume").unwrap_err();
    assert!(matches!(err, SampleError::NotFound { context: Some(_), .. }));
}

#[test]
fn from_source_uses_question_mark() {
    fn run() -> Result<(), SampleError> {
        io_failure()?;
        Ok(())
    }
    assert!(matches!(run().unwrap_err(), SampleError::Io { context: None, .. }));
}

#[test]
fn internal_from_strings() {
    let borrowed: SampleError = "static message".into();
    let owned: SampleError = String::from("owned message").into();
    assert!(matches!(borrowed, SampleError::Internal { .. }));
    assert!(matches!(owned, SampleError::Internal { .. }));
}
