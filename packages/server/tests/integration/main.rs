mod common;
mod health;
mod problem;
