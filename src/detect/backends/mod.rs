pub mod centroid;
pub mod replay;
pub mod stub;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use centroid::NearestCentroidClassifier;
pub use replay::ReplayLandmarkSource;
pub use stub::{ScriptedLandmarkSource, SyntheticLandmarkSource, SYNTHETIC_LABELS};

#[cfg(feature = "backend-tract")]
pub use tract::TractClassifier;
