pub mod playlist;
pub mod problem;
pub mod problem_in_playlist;
pub mod problem_solved;
pub mod role;
pub mod role_permission;
pub mod submission;
pub mod test_case;
pub mod test_case_result;
pub mod user;
