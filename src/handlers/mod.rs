pub mod assignments;
pub mod roles;
pub mod users;
