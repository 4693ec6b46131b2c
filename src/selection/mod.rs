pub mod raw;
pub mod selector;
pub mod track;

pub use raw::{Detection, RawTrackedOutput};
pub use selector::{select_primary, CandidateSelector, Selection, SelectionStats};
pub use track::{PhaseTrack, PhaseTracks, TrackedFrame};
