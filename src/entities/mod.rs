pub mod prelude;

pub mod profiles;
