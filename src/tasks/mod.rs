pub mod session_sweep;
pub mod task_runner;
