pub mod fragmentation;
pub mod size;
pub mod units;

use snafu::Snafu;

#[derive(Debug, Snafu, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum AnalysisError {
    #[snafu(display("Invalid argument: {}", reason))]
    InvalidArgument { reason: String },

    #[snafu(display("No size records were supplied"))]
    EmptyInput,

    #[snafu(display("Grand total is zero bytes; percentages are undefined"))]
    DivisionByZero,
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;

