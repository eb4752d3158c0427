use std::error::Error;

/// Iterates over `err` followed by each of its transitive sources.
pub fn error_chain<'a>(
    err: &'a (dyn Error + 'static),
) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(err), |&err| err.source())
}

/// Renders `err` and all of its sources on one line, as `"error: source 1: root error"`.
///
/// Used where an error ends up as the detail of another message rather than being reported on
/// its own.
pub fn error_full_message(err: &(dyn Error + 'static)) -> String {
    error_chain(err)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

#[cfg(test)]
mod tests {
    use snafu::ResultExt;

    use super::*;

    #[test]
    fn test_full_message() {
        let standalone = std::io::Error::other("standalone error");
        assert_eq!(error_full_message(&standalone), "standalone error");

        let chained = Err::<(), _>(std::io::Error::other("root error"))
            .whatever_context::<_, snafu::Whatever>("middleware")
            .whatever_context::<_, snafu::Whatever>("leaf")
            .unwrap_err();
        assert_eq!(error_full_message(&chained), "leaf: middleware: root error");
        assert_eq!(error_chain(&chained).count(), 3);
    }
}
