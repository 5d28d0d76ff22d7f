pub mod sign_in;
pub mod status_bar;
pub mod tree;
