pub mod model;
pub mod structural;
pub mod workflow;
