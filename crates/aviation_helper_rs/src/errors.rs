use thiserror::Error;
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid heading: {}",.0)]
    InvalidHeading(i32),
    #[error("Invalid altitude: {}",.0)]
    InvalidAltitude(i32),
    #[error("Invalid command: {:?}",.0)]
    InvalidCommand(String),
    #[error("Invalid addressing form: {}",.0)]
    InvalidAddressingForm(u8),
    #[error("Serde Json (de)serialization failed!")]
    SerdeDeserialize(#[from] serde_json::Error),
    #[error("Std Io Error!")]
    StdIo(#[from] std::io::Error),
}
