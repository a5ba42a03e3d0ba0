pub mod gate;
pub mod model;
pub mod reviewers;

pub use gate::*;
pub use model::*;
pub use reviewers::*;
