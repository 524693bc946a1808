use serde_json::Value;

/// An error raised by one of the JSON-LD algorithms.
///
/// The variants follow the error codes of the JSON-LD 1.1 API where one exists.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum JsonLdError {
    #[error("Invalid local context: {message}")]
    InvalidLocalContext { message: String },
    #[error("Loading remote context '{iri}' is not supported")]
    LoadingRemoteContextFailed { iri: String },
    #[error("Invalid base IRI '{iri}'")]
    InvalidBaseIri { iri: String },
    #[error("Invalid vocabulary mapping: {value}")]
    InvalidVocabMapping { value: Value },
    #[error("Invalid default language: {value}")]
    InvalidDefaultLanguage { value: Value },
    #[error("Keywords cannot be redefined: '{term}'")]
    KeywordRedefinition { term: String },
    #[error("Invalid term definition for '{term}'")]
    InvalidTermDefinition { term: String },
    #[error("Invalid IRI mapping for term '{term}'")]
    InvalidIriMapping { term: String },
    #[error("Cyclic IRI mapping detected for term '{term}'")]
    CyclicIriMapping { term: String },
    #[error("Invalid type mapping for term '{term}'")]
    InvalidTypeMapping { term: String },
    #[error("Invalid container mapping for term '{term}'")]
    InvalidContainerMapping { term: String },
    #[error("Invalid language mapping for term '{term}'")]
    InvalidLanguageMapping { term: String },
    #[error("Invalid @id value: {value}")]
    InvalidIdValue { value: Value },
    #[error("Invalid type value: {value}")]
    InvalidTypeValue { value: Value },
    #[error("Invalid value object: {value}")]
    InvalidValueObject { value: Value },
    #[error("Invalid language-tagged value: {value}")]
    InvalidLanguageTaggedValue { value: Value },
    #[error("Invalid typed value: {value}")]
    InvalidTypedValue { value: Value },
    #[error("Colliding keywords: '{keyword}' appears more than once")]
    CollidingKeywords { keyword: String },
    #[error("Invalid frame: {message}")]
    InvalidFrame { message: String },
    #[error("The JSON-LD feature '{feature}' is not supported")]
    Unsupported { feature: String },
}

impl JsonLdError {
    pub(crate) fn invalid_frame(message: impl Into<String>) -> Self {
        Self::InvalidFrame {
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, JsonLdError>;
