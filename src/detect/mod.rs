mod backend;
pub mod backends;
mod registry;
mod result;

pub use backend::{GestureClassifier, LandmarkSource};
pub use backends::{
    NearestCentroidClassifier, ReplayLandmarkSource, ScriptedLandmarkSource,
    SyntheticLandmarkSource,
};
pub use registry::{BackendRegistry, ClassifierFactory};
pub use result::{ClassifierInput, ClassifierSettings, Readiness};
