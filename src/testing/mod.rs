pub mod dummies;
pub mod stubs;

pub use dummies::{iris_row_schema, iris_schema};
pub use stubs::{
    undecided_classifier, FailingModel, FixedDistributionClassifier, FixedDistributionClusterer,
    RegressionStub, SlotVoteClassifier, UpdateSpyClassifier, UpdateSpyHandle, VecRowSink,
    VecRowStream,
};
