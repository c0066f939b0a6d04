/// Error type shared by heads and losses
pub mod error;

/// Network heads and the losses paired with them
pub mod head;

/// Elementwise losses
pub mod loss;

/// Layers used to build heads
pub mod nn;

/// Action spaces as seen by a head
pub mod spaces;

mod util;

pub use error::HeadError;
pub use head::{Head, HeadLoss, QHead, QHeadConfig, QHeadLoss, QHeadLossConfig};
pub use loss::LossType;
pub use spaces::ActionSpace;
