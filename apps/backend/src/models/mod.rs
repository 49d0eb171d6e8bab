pub mod history;
pub mod news;
