pub mod models;
pub mod vec_stream;

pub use models::{
    undecided_classifier, FailingModel, FixedDistributionClassifier, FixedDistributionClusterer,
    RegressionStub, SlotVoteClassifier, UpdateSpyClassifier, UpdateSpyHandle,
};
pub use vec_stream::{VecRowSink, VecRowStream};
