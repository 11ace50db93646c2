pub mod answer;
pub mod backup;
pub mod question;
pub mod report;
pub mod user;

pub use answer::{Answer, Query as ResponseQuery, ResponseRecord};
pub use question::{Catalog, Question, QuestionGroup};
pub use user::{Role, User, Users};
