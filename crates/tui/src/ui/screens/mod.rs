pub mod budget;
pub mod entry_form;
