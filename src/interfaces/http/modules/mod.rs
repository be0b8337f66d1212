pub mod health;
pub mod history;
pub mod metrics;
pub mod sensors;
pub mod slots;
