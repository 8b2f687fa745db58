pub mod password;
pub mod response_handler;
