pub mod completions;
pub mod inspect;
pub mod layout;
pub mod pack;
