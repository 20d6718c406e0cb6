use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompareError {
    /// The input contains a construct the comparison model cannot represent.
    #[error("Unsupported construct '{construct}' in {part}")]
    Structural { construct: String, part: String },

    #[error("Nesting exceeds {limit} levels during {stage}")]
    NestingTooDeep { limit: usize, stage: &'static str },

    /// An algorithm invariant was violated. Always a defect, never an input problem.
    #[error("Internal invariant violated at {unit_kind} #{position}: {message}")]
    InternalInvariant {
        unit_kind: String,
        position: usize,
        message: String,
    },

    #[error("Resource '{id}' could not be copied: {message}")]
    Resource { id: String, message: String },

    #[error("Invalid package: {message}")]
    InvalidPackage { message: String },

    #[error("Missing required part '{part_path}'")]
    MissingPart { part_path: String },

    #[error("XML parsing error at {location}: {message}")]
    XmlParse { message: String, location: String },

    #[error("XML serialization error: {0}")]
    XmlWrite(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

impl CompareError {
    pub fn structural(construct: impl Into<String>, part: impl Into<String>) -> Self {
        Self::Structural {
            construct: construct.into(),
            part: part.into(),
        }
    }

    pub fn invariant(
        unit_kind: impl Into<String>,
        position: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::InternalInvariant {
            unit_kind: unit_kind.into(),
            position,
            message: message.into(),
        }
    }

    pub fn resource(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resource {
            id: id.into(),
            message: message.into(),
        }
    }

    /// True for every error in the structural class, including depth overruns.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. } | Self::NestingTooDeep { .. })
    }
}

pub type Result<T> = std::result::Result<T, CompareError>;
