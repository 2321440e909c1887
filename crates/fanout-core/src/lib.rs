pub mod context;
pub mod models;
pub mod outbound;
pub mod redact;
pub mod runner;
pub mod synchronizer;
pub mod telemetry;

pub use context::Context;
pub use outbound::JsonPlaceholderClient;
pub use runner::{Task, TaskArgs, TaskFuture, TaskRunner, task};
pub use synchronizer::{
    InertSynchronizer, Synchronizer, WaitGroup, bind_synchronizer, synchronizer,
    with_synchronizer,
};
