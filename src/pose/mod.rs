pub mod joint;
pub mod phase;

pub use joint::{BBox, JointFrame, JointIndex, Side};
pub use phase::{LabelMap, PhaseLabel, UnknownPhaseLabel};
