pub mod backup;
pub mod question;
pub mod questionnaire;
pub mod report;
pub mod user;
