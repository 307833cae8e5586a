pub mod attendance;
pub mod notifications;
pub mod progress;
pub mod sections;
pub mod team;
pub mod todos;
