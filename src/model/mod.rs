pub mod attendance;
pub mod progress;
pub mod role;
pub mod team_member;
pub mod todo;
