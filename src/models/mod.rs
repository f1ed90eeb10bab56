pub mod patient;
pub mod tokens;

pub use patient::Patient;
pub use tokens::{
    DepseudonymizationUrlRequest, DepseudonymizationUrlResponse, PseudonymizationUrlRequest,
    PseudonymizationUrlResponse,
};
