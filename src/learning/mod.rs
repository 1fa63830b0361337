pub mod batch;
pub mod loss;
pub mod sgd_loss;

// Nice re-exports so callers can `use sgd_dst_loss::learning::*;`
pub use batch::*;
pub use loss::*;
pub use sgd_loss::*;
