pub mod advice;
pub mod advice_nlg;
pub mod database;
pub mod pipeline;
pub mod render;
pub mod stats;
pub mod templates;
pub mod vocab;
