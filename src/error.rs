/// Failure categories shared by the pipeline, the trainer and the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No source files matched a required pattern.
    Configuration,
    /// A required single file is absent from every configured directory.
    MissingFile,
    /// An expected column is missing after normalization/aliasing.
    Schema,
    /// Malformed or out-of-range input.
    Validation,
    /// Entity resolution found nothing.
    NotFound,
    /// File open/read/write failure.
    Io,
    /// Unexpected failure during training or prediction.
    Internal,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Validation | ErrorKind::NotFound => 2,
            ErrorKind::Configuration | ErrorKind::MissingFile | ErrorKind::Schema => 3,
            ErrorKind::Io => 4,
            ErrorKind::Internal => 5,
        }
    }

    /// HTTP status used when the error crosses the service boundary.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Validation | ErrorKind::NotFound => 400,
            _ => 500,
        }
    }

    /// Caller supplied bad input, as opposed to a server-side fault.
    pub fn is_client_error(self) -> bool {
        self.http_status() < 500
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn missing_file(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingFile, message)
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Schema, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
