pub mod doubts;
pub mod otp_codes;
pub mod solutions;
pub mod users;
