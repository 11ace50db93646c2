use crate::serde::Serialize;

#[derive(Debug, Serialize)]
pub struct List<T> {
    list: Vec<T>,
    total: usize,
}

impl<T> List<T> {
    pub fn new(list: Vec<T>) -> Self {
        List { total: list.len(), list }
    }
}

#[derive(Debug, Serialize)]
pub struct Token {
    pub token: String,
    pub username: String,
    pub role: crate::core::models::Role,
}
