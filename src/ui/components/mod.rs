pub mod avatar;
pub mod spinner;
pub mod toast;
pub mod top_bar;
