pub mod budget;
pub mod candidate;
pub mod errors;
pub mod fidelity;

pub use budget::*;
pub use candidate::*;
pub use errors::*;
pub use fidelity::*;
