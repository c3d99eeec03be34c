use std::fmt;
use std::io;

/// Structured code attached to every diagnostic.
///
/// These are stable identifiers: they appear in build results and
/// machine-readable error reports, independent of the display message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    TokenReference,
    CircularReference,
    Validation,
    ColorParse,
    DimensionFormat,
    FileOperation,
    Configuration,
    BasePermutation,
    Modifier,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TokenReference => "TOKEN_REFERENCE",
            Self::CircularReference => "CIRCULAR_REFERENCE",
            Self::Validation => "VALIDATION",
            Self::ColorParse => "COLOR_PARSE",
            Self::DimensionFormat => "DIMENSION_FORMAT",
            Self::FileOperation => "FILE_OPERATION",
            Self::Configuration => "CONFIGURATION",
            Self::BasePermutation => "BASE_PERMUTATION",
            Self::Modifier => "MODIFIER",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All errors that can occur during `tincture` operation.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TinctureError {
    #[error("Unknown token reference '{{{target}}}' in '{token}'")]
    #[diagnostic(code(tincture::token_reference), help("{suggestions}"))]
    TokenReference {
        token: String,
        target: String,
        suggestions: String,
    },

    #[error("Circular reference detected: {chain}")]
    #[diagnostic(code(tincture::circular_reference))]
    CircularReference { chain: String },

    #[error("Invalid token document: {message}")]
    #[diagnostic(code(tincture::validation))]
    Validation { message: String },

    #[error("Reference '{reference}' requires a current document")]
    #[diagnostic(
        code(tincture::reference::no_document),
        help("Fragment-only references (`#/...`) are valid only inside a document")
    )]
    RefNoDocument { reference: String },

    #[error("Reference '{reference}' not found")]
    #[diagnostic(code(tincture::reference::not_found))]
    RefNotFound { reference: String },

    #[error("Malformed color value: {value}")]
    #[diagnostic(
        code(tincture::color_parse),
        help("Expected a hex string (#RRGGBB / #RRGGBBAA) or {{colorSpace, components}}")
    )]
    ColorParse { value: String },

    #[error("Malformed dimension: {value}")]
    #[diagnostic(
        code(tincture::dimension_format),
        help("Expected {{value: number, unit: \"px\" | \"rem\"}}")
    )]
    DimensionFormat { value: String },

    #[error("Failed to read file: {path}")]
    #[diagnostic(
        code(tincture::file::read),
        help("Check that the file exists and is readable")
    )]
    FileRead {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write output: {path}")]
    #[diagnostic(code(tincture::file::write))]
    FileWrite {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse '{path}': {message}")]
    #[diagnostic(code(tincture::file::parse))]
    FileParse { path: String, message: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(tincture::configuration))]
    Configuration { message: String },

    #[error("Failed to construct base permutation: {message}")]
    #[diagnostic(code(tincture::base_permutation))]
    BasePermutation { message: String },

    #[error("Modifier error: {message}")]
    #[diagnostic(code(tincture::modifier), help("{suggestions}"))]
    Modifier { message: String, suggestions: String },

    #[error("Renderer '{renderer}' failed: {message}")]
    #[diagnostic(code(tincture::render))]
    RenderFailed { renderer: String, message: String },

    #[error("{message}")]
    #[diagnostic(code(tincture::unknown))]
    Unknown { message: String },
}

impl TinctureError {
    /// The structured error code for this diagnostic.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::TokenReference { .. } => ErrorCode::TokenReference,
            Self::CircularReference { .. } => ErrorCode::CircularReference,
            Self::Validation { .. } | Self::RefNoDocument { .. } | Self::RefNotFound { .. } => {
                ErrorCode::Validation
            }
            Self::ColorParse { .. } => ErrorCode::ColorParse,
            Self::DimensionFormat { .. } => ErrorCode::DimensionFormat,
            Self::FileRead { .. } | Self::FileWrite { .. } | Self::FileParse { .. } => {
                ErrorCode::FileOperation
            }
            Self::Configuration { .. } => ErrorCode::Configuration,
            Self::BasePermutation { .. } => ErrorCode::BasePermutation,
            Self::Modifier { .. } => ErrorCode::Modifier,
            Self::RenderFailed { .. } | Self::Unknown { .. } => ErrorCode::Unknown,
        }
    }
}
