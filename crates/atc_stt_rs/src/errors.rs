use thiserror::Error;
#[derive(Error, Debug)]
pub enum Error {
    #[error("Std Io Error!")]
    StdIo(#[from] std::io::Error),
    #[error("Serde Json (de)serialization failed!")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Ron deserialization failed!")]
    RonDeserialize(#[from] ron::error::SpannedError),
    #[error("Aviation Helper")]
    AviationHelper(#[from] aviation_helper_rs::errors::Error),
    #[error("Template {template:?}: {reason}")]
    TemplateSyntax { template: String, reason: String },
    #[error("Template {template:?}: unknown type parser {type_id:?}")]
    UnknownTypeParser { template: String, type_id: String },
    #[error("Callsign pattern {template:?}: unknown placeholder {placeholder:?}")]
    UnknownCallsignPlaceholder {
        template: String,
        placeholder: String,
    },
}
