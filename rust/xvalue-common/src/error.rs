use thiserror::Error;

/// Error returned by all xvalue operations.
///
/// The kind is boxed so that `Result<T>` stays one pointer wide on the error path.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },

    /// An index file does not have the expected layout.
    #[error("corrupted index file '{file}': {message}")]
    Corrupted { file: String, message: String },

    #[error("I/O error on '{context}': {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("index is closed")]
    IndexClosed,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    #[cold]
    pub fn corrupted(file: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::Corrupted {
            file: file.into(),
            message: message.into(),
        }
        .into()
    }

    #[cold]
    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
        .into()
    }

    #[cold]
    pub fn invalid_operation(message: impl Into<String>) -> Error {
        ErrorKind::InvalidOperation {
            message: message.into(),
        }
        .into()
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        ErrorKind::Io {
            context: context.into(),
            source,
        }
        .into()
    }

    pub fn index_closed() -> Error {
        ErrorKind::IndexClosed.into()
    }

    /// Whether the error was raised by an operation on a closed index.
    pub fn is_index_closed(&self) -> bool {
        matches!(*self.0, ErrorKind::IndexClosed)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::io("<unnamed>", e)
    }
}
