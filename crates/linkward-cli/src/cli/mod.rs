pub mod app;
pub mod check;
