use std::fmt;

/// Coarse category of a fatal error, for phrasing user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The input is malformed; another file is needed.
    BadFile,
    /// The input is valid but uses a feature that is not handled.
    Unsupported,
    /// The input exceeds what can be decoded, even at reduced resolution.
    TooLarge,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::BadFile => "bad file",
            FailureKind::Unsupported => "unsupported feature",
            FailureKind::TooLarge => "too large",
            FailureKind::Io => "i/o failure",
        };
        f.write_str(label)
    }
}
