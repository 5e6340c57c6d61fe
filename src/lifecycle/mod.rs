pub mod controller;
pub mod guard;

pub use controller::{
    LifecycleController, LifecycleError, LifecycleStatus, GENERATED_SECRET_STATUS,
    SUBMITTED_STATUS,
};
pub use guard::{ActionPermit, ActiveActionGuard, LifecycleAction};
