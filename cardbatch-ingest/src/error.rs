use std::path::PathBuf;

use thiserror::Error;

/// Why a batch file yielded no transactions.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("<{element}> is missing the `{attribute}` attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("`{field}` is not a valid number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("<CardType identType={card_type:?}> has no <ChargeAmt> fee element")]
    MissingFee { card_type: String },
}
