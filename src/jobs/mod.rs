//! Background job definitions.
//!
//! Jobs themselves run on an external trigger platform; this crate only owns
//! the static queue table and the plan → queue mapping.

pub mod queues;

pub use queues::{queue_for_plan, queue_name_for_plan, ConversionQueue, QUEUES};
