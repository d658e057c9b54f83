//! Background services that run beside the HTTP workers

pub mod maintenance;

pub use maintenance::MaintenanceTasks;
