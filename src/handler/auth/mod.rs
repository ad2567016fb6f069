pub mod password;
pub mod signup;
