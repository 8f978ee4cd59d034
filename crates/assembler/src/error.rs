use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    #[error("undefined label `{0}`")]
    UndefinedLabel(String),

    #[error("label `{0}` defined more than once")]
    DuplicateLabel(String),

    /// A label resolved to an address that does not fit in a word.
    #[error("address {0} does not fit in a word")]
    AddressRange(usize),

    /// Text assembly failure, tagged with its 1-based source line.
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}

impl AsmError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        AsmError::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Source line the error points at, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            AsmError::Syntax { line, .. } => Some(*line),
            _ => None,
        }
    }
}
