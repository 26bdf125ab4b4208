pub mod compose;
pub mod content;
pub mod prepare;
pub mod run;
pub mod template;
