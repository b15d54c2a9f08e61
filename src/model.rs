pub mod locale;
pub mod master_class;
